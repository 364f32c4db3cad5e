//! Newtype id helpers shared by every arena-backed table in this crate.
//!
//! Every table in the analyzer (`SymTable`, `ResolvedSymTable`, `ModuleRegistry`, ...)
//! is a flat `Vec` indexed by one of these ids rather than a graph of owned
//! pointers, so that cyclic references (a sym pointing at its resolved sym,
//! a resolved sym pointing back at overloads of itself) can be expressed
//! without `Rc`/`RefCell`.

/// Defines a `Copy` newtype wrapping a `u32` index, with `new`/`index`
/// accessors and the derives every id in this crate needs.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Builds an id from a raw arena index.
            #[inline]
            #[must_use]
            pub fn new(index: usize) -> Self {
                Self(u32::try_from(index).expect("arena id overflowed u32"))
            }

            /// Returns the raw arena index.
            #[inline]
            #[must_use]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

define_id!(
    /// Id of an interned identifier name, stable for the lifetime of a `Compilation`.
    NameId
);
define_id!(
    /// Id of a chunk (one parsed source file's analysis unit).
    ChunkId
);
define_id!(
    /// Id of a local `Sym`, scoped to the chunk that created it.
    SymId
);
define_id!(
    /// Id of a locally-interned `FuncSig` (tuple of local `SymId`s), scoped to one chunk.
    FuncSigId
);
define_id!(
    /// Id of a `ResolvedSym`, process-wide and shared across chunks.
    ResolvedSymId
);
define_id!(
    /// Id of a `ResolvedFuncSig` (tuple of `ResolvedSymId`s), interned process-wide.
    ResolvedFuncSigId
);
define_id!(
    /// Id of one overload of a function, keyed by `(ResolvedSymId, ResolvedFuncSigId)`.
    ResolvedFuncSymId
);
define_id!(
    /// Id of a `Module`, interned by canonical spec string.
    ModuleId
);
define_id!(
    /// Id of a `Block` (one function scope, including the chunk's top-level block).
    BlockId
);
define_id!(
    /// Id of a `SubBlock` (one lexical branch scope within a `Block`).
    SubBlockId
);
define_id!(
    /// Id of a `LocalVar`, scoped to the chunk that created it.
    LocalVarId
);
define_id!(
    /// Id of an AST node, assigned by the (external) parser.
    NodeId
);

/// Sentinel meaning "not yet assigned" for ids that are filled in lazily.
///
/// A reserved value rather than `Option<Id>` at every call site, for when
/// the "not yet known" state is itself meaningful (e.g. `Sym::r_sym_id`
/// before resolution has run).
pub trait NoneSentinel: Sized {
    const NONE: Self;
    fn is_none(self) -> bool;
}

macro_rules! impl_none_sentinel {
    ($name:ident) => {
        impl NoneSentinel for $name {
            const NONE: Self = Self(u32::MAX);
            fn is_none(self) -> bool {
                self.0 == u32::MAX
            }
        }
    };
}

impl_none_sentinel!(NameId);
impl_none_sentinel!(ChunkId);
impl_none_sentinel!(ModuleId);
impl_none_sentinel!(SymId);
impl_none_sentinel!(FuncSigId);
impl_none_sentinel!(ResolvedSymId);
impl_none_sentinel!(ResolvedFuncSigId);
impl_none_sentinel!(ResolvedFuncSymId);
impl_none_sentinel!(LocalVarId);
impl_none_sentinel!(BlockId);
impl_none_sentinel!(SubBlockId);
impl_none_sentinel!(NodeId);
