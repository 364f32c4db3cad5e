//! Module registry, per-chunk `SymRef` redirects, and the import loader.
//!
//! Canonicalization is split into three concrete strategies (builtin / URL /
//! filesystem path) so the two incompatible notions of "canonical" (string
//! rewriting vs. `realpath`) can't be accidentally conflated by a caller.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use ahash::AHashMap;

use crate::diagnostics::{SemaError, SemaErrorKind};
use crate::ids::{ChunkId, ModuleId, NameId, NoneSentinel, NodeId, ResolvedFuncSigId, ResolvedSymId, SymId};
use crate::span::Span;

/// One entry in a module's sym map.
#[derive(Debug, Clone)]
pub enum ModuleEntry {
    /// A runtime-owned value with no chunk/decl of its own.
    Variable,
    /// A native function pointer (opaque to this crate — owned by the VM collaborator).
    NativeFunc1,
    /// Forwards to a single function signature without creating an overload set.
    SymToOneFunc { sig: ResolvedFuncSigId },
    /// More than one signature shares this name; using it as a non-func reference is ambiguous.
    SymToManyFuncs { sigs: Vec<ResolvedFuncSigId> },
    UserVar { chunk: ChunkId, decl: NodeId },
    UserFunc { chunk: ChunkId, decl: NodeId, sig: ResolvedFuncSigId },
    /// A builtin object type with no owning chunk.
    Object,
    UserObject { chunk: ChunkId, decl: NodeId },
}

impl ModuleEntry {
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Variable => "variable",
            Self::NativeFunc1 => "nativeFunc1",
            Self::SymToOneFunc { .. } => "symToOneFunc",
            Self::SymToManyFuncs { .. } => "symToManyFuncs",
            Self::UserVar { .. } => "userVar",
            Self::UserFunc { .. } => "userFunc",
            Self::Object => "object",
            Self::UserObject { .. } => "userObject",
        }
    }
}

/// A loaded (or pending) module.
#[derive(Debug, Default)]
pub struct Module {
    /// `ChunkId::NONE` for builtin modules.
    pub chunk_id: ChunkId,
    pub resolved_root_sym_id: ResolvedSymId,
    pub entries: AHashMap<(NameId, ResolvedFuncSigId), ModuleEntry>,
}

impl Module {
    fn placeholder() -> Self {
        Self {
            chunk_id: ChunkId::NONE,
            resolved_root_sym_id: ResolvedSymId::NONE,
            entries: AHashMap::new(),
        }
    }

    pub fn insert(&mut self, name: NameId, sig: ResolvedFuncSigId, entry: ModuleEntry) {
        self.entries.insert((name, sig), entry);
    }

    #[must_use]
    pub fn lookup(&self, name: NameId, sig: ResolvedFuncSigId) -> Option<&ModuleEntry> {
        self.entries.get(&(name, sig))
    }

    /// Finds any entry under `name`, ignoring the sig component — used by
    /// import-all, which doesn't care what kind of member each name is.
    pub fn names(&self) -> impl Iterator<Item = NameId> + '_ {
        self.entries.keys().map(|(n, _)| *n)
    }

    /// Every entry registered under `name`, across all sigs — the raw
    /// material for converting a module member into a `ResolvedSym`/
    /// `ResolvedFuncSym` on first cross-chunk reference.
    pub fn entries_for(&self, name: NameId) -> impl Iterator<Item = (ResolvedFuncSigId, &ModuleEntry)> {
        self.entries.iter().filter(move |((n, _), _)| *n == name).map(|((_, sig), entry)| (*sig, entry))
    }
}

/// A name→redirect recorded by `import`, `import *`, or a type alias.
#[derive(Debug, Clone, Copy)]
pub enum SymRef {
    /// Redirects a local name to a module's resolved root.
    Module(ModuleId),
    /// The name resolves inside this module (installed by `import *`).
    ModuleMember(ModuleId),
    /// Type alias: forwards to another local sym's resolution.
    Sym(SymId),
}

/// Per-chunk `name -> redirect` table.
#[derive(Debug, Default)]
pub struct SymRefTable {
    refs: AHashMap<NameId, SymRef>,
}

impl SymRefTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, name: NameId) -> Option<SymRef> {
        self.refs.get(&name).copied()
    }

    pub fn insert(&mut self, name: NameId, symref: SymRef) {
        self.refs.insert(name, symref);
    }

    #[must_use]
    pub fn contains(&self, name: NameId) -> bool {
        self.refs.contains_key(&name)
    }
}

/// A canonicalized import target, ready to be interned into the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportSpec {
    Builtin(String),
    Url(String),
    Path(PathBuf),
}

impl ImportSpec {
    /// The string the module registry interns by.
    #[must_use]
    pub fn canonical_key(&self) -> String {
        match self {
            Self::Builtin(name) => name.clone(),
            Self::Url(url) => url.clone(),
            Self::Path(path) => path.to_string_lossy().into_owned(),
        }
    }
}

/// Narrow filesystem seam so tests can supply an in-memory fake instead of
/// touching real paths.
pub trait Filesystem {
    fn realpath(&self, path: &Path) -> io::Result<PathBuf>;
    fn parent_dir_exists(&self, path: &Path) -> bool;
}

/// The only place this crate touches `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFilesystem;

impl Filesystem for RealFilesystem {
    fn realpath(&self, path: &Path) -> io::Result<PathBuf> {
        std::fs::canonicalize(path)
    }

    fn parent_dir_exists(&self, path: &Path) -> bool {
        path.parent().is_some_and(Path::is_dir)
    }
}

/// Rewrites `https://github.com/<user>/<repo>` (exactly two path segments)
/// to `https://raw.githubusercontent.com/<user>/<repo>/master/mod.cys`.
/// Anything with more segments passes through unchanged.
fn rewrite_github_url(url: &str) -> String {
    const PREFIX: &str = "https://github.com/";
    let Some(rest) = url.strip_prefix(PREFIX) else {
        return url.to_string();
    };
    let rest = rest.trim_end_matches('/');
    let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();
    if segments.len() == 2 {
        format!("https://raw.githubusercontent.com/{}/{}/master/mod.cys", segments[0], segments[1])
    } else {
        url.to_string()
    }
}

/// Resolves a spec string into a canonical [`ImportSpec`].
pub fn resolve_spec_temp(
    spec: &str,
    importing_chunk_uri: &Path,
    builtin_loaders: &HashSet<String>,
    fs: &dyn Filesystem,
    span: Span,
) -> Result<ImportSpec, SemaError> {
    if builtin_loaders.contains(spec) {
        return Ok(ImportSpec::Builtin(spec.to_string()));
    }
    if spec.starts_with("http://") || spec.starts_with("https://") {
        return Ok(ImportSpec::Url(rewrite_github_url(spec)));
    }
    let candidate = match importing_chunk_uri.parent() {
        Some(parent) => parent.join(spec),
        None => PathBuf::from(spec),
    };
    if !fs.parent_dir_exists(&candidate) {
        return Err(SemaError::new(
            SemaErrorKind::ImportPathNotFound {
                spec: spec.to_string().into(),
            },
            span,
        ));
    }
    fs.realpath(&candidate)
        .map(ImportSpec::Path)
        .map_err(|_| {
            SemaError::new(
                SemaErrorKind::ImportPathNotFound {
                    spec: spec.to_string().into(),
                },
                span,
            )
        })
}

/// A pending import, enqueued for the driver to service by parsing and
/// analyzing the target chunk. The placeholder `Module` already registered
/// for `mod_id` is what makes cyclic imports terminate.
#[derive(Debug, Clone)]
pub struct ImportTask {
    pub provider_chunk: ChunkId,
    pub node_id: NodeId,
    pub abs_spec: String,
    pub mod_id: ModuleId,
    pub builtin: bool,
}

/// Process-wide module registry plus the FIFO queue of pending import tasks.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: Vec<Module>,
    by_spec: AHashMap<String, ModuleId>,
    pending: std::collections::VecDeque<ImportTask>,
}

impl ModuleRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, id: ModuleId) -> &Module {
        &self.modules[id.index()]
    }

    pub fn get_mut(&mut self, id: ModuleId) -> &mut Module {
        &mut self.modules[id.index()]
    }

    /// Interns `abs_spec`; on a fresh spec, registers an empty placeholder
    /// module and enqueues an [`ImportTask`]. Returns `(id, was_new)`.
    ///
    /// Idempotent: two calls with specs that canonicalize identically return
    /// the same `ModuleId`.
    pub fn get_or_load(
        &mut self,
        abs_spec: String,
        builtin: bool,
        provider_chunk: ChunkId,
        node_id: NodeId,
    ) -> (ModuleId, bool) {
        if let Some(&id) = self.by_spec.get(&abs_spec) {
            return (id, false);
        }
        let id = ModuleId::new(self.modules.len());
        self.modules.push(Module::placeholder());
        self.by_spec.insert(abs_spec.clone(), id);
        self.pending.push_back(ImportTask {
            provider_chunk,
            node_id,
            abs_spec,
            mod_id: id,
            builtin,
        });
        (id, true)
    }

    /// Drains the next pending import task, FIFO.
    pub fn pop_pending(&mut self) -> Option<ImportTask> {
        self.pending.pop_front()
    }

    /// Allocates a fresh module for an entry chunk (one with no importer of
    /// its own, so there's no spec string to intern it under).
    pub fn new_entry_module(&mut self) -> ModuleId {
        let id = ModuleId::new(self.modules.len());
        self.modules.push(Module::placeholder());
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeFs {
        exists: bool,
    }

    impl Filesystem for FakeFs {
        fn realpath(&self, path: &Path) -> io::Result<PathBuf> {
            if self.exists {
                Ok(path.to_path_buf())
            } else {
                Err(io::Error::new(io::ErrorKind::NotFound, "no such file"))
            }
        }

        fn parent_dir_exists(&self, _path: &Path) -> bool {
            self.exists
        }
    }

    fn span() -> Span {
        Span::synthetic(ChunkId::new(0))
    }

    #[test]
    fn github_url_rewrites_two_segments() {
        assert_eq!(
            rewrite_github_url("https://github.com/u/r"),
            "https://raw.githubusercontent.com/u/r/master/mod.cys"
        );
    }

    #[test]
    fn github_url_with_extra_segments_passes_through() {
        let url = "https://github.com/u/r/blob/main/mod.cys";
        assert_eq!(rewrite_github_url(url), url);
    }

    #[test]
    fn import_path_not_found_surfaces_as_diagnostic() {
        let fs = FakeFs { exists: false };
        let result = resolve_spec_temp("missing.cys", Path::new("/tmp/a.cys"), &HashSet::new(), &fs, span());
        assert!(matches!(
            result.unwrap_err().kind,
            SemaErrorKind::ImportPathNotFound { .. }
        ));
    }

    #[test]
    fn get_or_load_is_idempotent_for_equal_specs() {
        let mut registry = ModuleRegistry::new();
        let (a, a_new) = registry.get_or_load("https://x/mod.cys".into(), false, ChunkId::new(0), NodeId::new(0));
        let (b, b_new) = registry.get_or_load("https://x/mod.cys".into(), false, ChunkId::new(1), NodeId::new(1));
        assert_eq!(a, b);
        assert!(a_new);
        assert!(!b_new);
    }
}
