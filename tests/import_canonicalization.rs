//! Two chunks importing the same spec must share one [`ModuleId`]
//!: `ModuleRegistry::get_or_load` keys on the canonicalized
//! spec string, so a second `import` of an already-seen URL reuses the
//! placeholder module instead of re-registering it. Two different
//! `github.com/<user>/<repo>` URLs that rewrite to the same raw URL count
//! as "the same spec" too.

mod common;

use chunksema::module::SymRef;
use common::Harness;

#[test]
fn two_chunks_importing_the_same_spec_share_one_module() {
    let mut h = Harness::new();

    let chunk_a = h.begin_chunk("a.cys", None);
    let import_a = h.import_stmt(chunk_a, "Shared", "https://example.com/shared.cys");
    h.analyze_chunk(chunk_a, &mut [import_a])
        .expect("importing a URL spec analyzes cleanly");

    let chunk_b = h.begin_chunk("b.cys", None);
    let import_b = h.import_stmt(chunk_b, "Shared", "https://example.com/shared.cys");
    h.analyze_chunk(chunk_b, &mut [import_b])
        .expect("importing the same URL spec from another chunk analyzes cleanly");

    let binding_a = h.intern("Shared");
    let SymRef::Module(mod_a) = h.compilation.chunk(chunk_a).sym_refs.get(binding_a).unwrap() else {
        panic!("expected `Shared` to bind to a module in chunk a");
    };
    let SymRef::Module(mod_b) = h.compilation.chunk(chunk_b).sym_refs.get(binding_a).unwrap() else {
        panic!("expected `Shared` to bind to a module in chunk b");
    };
    assert_eq!(mod_a, mod_b, "importing the same spec from two chunks must share one module id");
}

#[test]
fn github_shorthand_and_raw_url_canonicalize_to_the_same_module() {
    let mut h = Harness::new();

    let chunk_a = h.begin_chunk("a.cys", None);
    let import_a = h.import_stmt(chunk_a, "Repo", "https://github.com/someuser/somerepo");
    h.analyze_chunk(chunk_a, &mut [import_a])
        .expect("importing a github shorthand url analyzes cleanly");

    let chunk_b = h.begin_chunk("b.cys", None);
    let import_b = h.import_stmt(
        chunk_b,
        "Repo",
        "https://raw.githubusercontent.com/someuser/somerepo/master/mod.cys",
    );
    h.analyze_chunk(chunk_b, &mut [import_b])
        .expect("importing the already-raw url analyzes cleanly");

    let binding = h.intern("Repo");
    let SymRef::Module(mod_a) = h.compilation.chunk(chunk_a).sym_refs.get(binding).unwrap() else {
        panic!("expected `Repo` to bind to a module in chunk a");
    };
    let SymRef::Module(mod_b) = h.compilation.chunk(chunk_b).sym_refs.get(binding).unwrap() else {
        panic!("expected `Repo` to bind to a module in chunk b");
    };
    assert_eq!(
        mod_a, mod_b,
        "a github shorthand url and its canonicalized raw equivalent must share one module id"
    );
}
