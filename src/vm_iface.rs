//! The VM/object-model collaborator seam.
//!
//! This crate never allocates runtime objects, field syms, or tag-type
//! records itself — those tables belong to the bytecode generator and VM,
//! which this crate treats as an external collaborator reached only through
//! [`VmCollaborator`]. Ids returned by it are opaque to this crate: it
//! stores them on `ResolvedSym`/`LocalVar` records but never inspects them.

use crate::ids::{ChunkId, NameId, NodeId};

macro_rules! define_opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub u32);
    };
}

define_opaque_id!(
    /// Opaque id of a tag (enum) type, owned by the VM's object-type registry.
    TagTypeId
);
define_opaque_id!(
    /// Opaque id of a tag-literal member sym (`Color#Red`).
    TagLitSymId
);
define_opaque_id!(
    /// Opaque id of an object type, owned by the VM's object-type registry.
    ObjectTypeId
);
define_opaque_id!(
    /// Opaque id of a field sym on an object type.
    FieldSymId
);
define_opaque_id!(
    /// Opaque id of a runtime-owned sym (a var/func sym as the VM sees it).
    RuntimeSymId
);

/// The external collaborator this crate drives to allocate VM-owned records
/// while resolving symbols. Every method is expected to be idempotent for a
/// given name within its owning scope — the driver calls `ensure*` freely
/// without tracking whether it has already asked for a given id.
pub trait VmCollaborator {
    /// Gets-or-creates the `TagTypeId` for a declared tag type.
    fn ensure_tag_type(&mut self, chunk: ChunkId, decl: NodeId, name: NameId) -> TagTypeId;

    /// Gets-or-creates the `TagLitSymId` for one member of a tag type.
    fn ensure_tag_lit_sym(&mut self, tag_type: TagTypeId, member: NameId) -> TagLitSymId;

    /// Installs metadata (ordinal, payload shape) on a previously-allocated
    /// tag-literal sym. Called once per member, after `ensure_tag_lit_sym`.
    fn set_tag_lit_sym(&mut self, sym: TagLitSymId, ordinal: u32);

    /// Gets-or-creates the `ObjectTypeId` for a declared object type.
    fn ensure_object_type(&mut self, chunk: ChunkId, decl: NodeId, name: NameId) -> ObjectTypeId;

    /// Gets-or-creates the `FieldSymId` for a field name on an object type.
    fn ensure_field_sym(&mut self, object_type: ObjectTypeId, name: NameId) -> FieldSymId;

    /// Registers a field declaration (as opposed to a bare reference) on an object type.
    fn add_field_sym(&mut self, object_type: ObjectTypeId, field: FieldSymId);

    /// Gets-or-creates the runtime sym backing a resolved function sym.
    fn ensure_func_sym(&mut self, chunk: ChunkId, decl: NodeId, name: NameId) -> RuntimeSymId;

    /// Gets-or-creates the runtime sym backing a resolved variable sym.
    fn ensure_var_sym(&mut self, chunk: ChunkId, decl: NodeId, name: NameId) -> RuntimeSymId;

    /// Finalizes a function runtime sym once its signature/return type are known.
    fn set_func_sym(&mut self, sym: RuntimeSymId, has_static_initializer: bool);

    /// Finalizes a variable runtime sym once its type is known.
    fn set_var_sym(&mut self, sym: RuntimeSymId, is_rc_candidate: bool);

    /// Notifies the collaborator that this crate is retaining a reference to
    /// `sym` past the current call. Callers must retain ids they intend to
    /// keep past the call that produced them.
    fn retain(&mut self, sym: RuntimeSymId);
}

/// A [`VmCollaborator`] that allocates sequential ids and records nothing
/// else — for unit tests that only need ids to exist, not to mean anything.
#[derive(Debug, Default)]
pub struct NullVmCollaborator {
    next_tag_type: u32,
    next_tag_lit: u32,
    next_object_type: u32,
    next_field: u32,
    next_runtime_sym: u32,
}

impl NullVmCollaborator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl VmCollaborator for NullVmCollaborator {
    fn ensure_tag_type(&mut self, _chunk: ChunkId, _decl: NodeId, _name: NameId) -> TagTypeId {
        let id = TagTypeId(self.next_tag_type);
        self.next_tag_type += 1;
        id
    }

    fn ensure_tag_lit_sym(&mut self, _tag_type: TagTypeId, _member: NameId) -> TagLitSymId {
        let id = TagLitSymId(self.next_tag_lit);
        self.next_tag_lit += 1;
        id
    }

    fn set_tag_lit_sym(&mut self, _sym: TagLitSymId, _ordinal: u32) {}

    fn ensure_object_type(&mut self, _chunk: ChunkId, _decl: NodeId, _name: NameId) -> ObjectTypeId {
        let id = ObjectTypeId(self.next_object_type);
        self.next_object_type += 1;
        id
    }

    fn ensure_field_sym(&mut self, _object_type: ObjectTypeId, _name: NameId) -> FieldSymId {
        let id = FieldSymId(self.next_field);
        self.next_field += 1;
        id
    }

    fn add_field_sym(&mut self, _object_type: ObjectTypeId, _field: FieldSymId) {}

    fn ensure_func_sym(&mut self, _chunk: ChunkId, _decl: NodeId, _name: NameId) -> RuntimeSymId {
        let id = RuntimeSymId(self.next_runtime_sym);
        self.next_runtime_sym += 1;
        id
    }

    fn ensure_var_sym(&mut self, _chunk: ChunkId, _decl: NodeId, _name: NameId) -> RuntimeSymId {
        let id = RuntimeSymId(self.next_runtime_sym);
        self.next_runtime_sym += 1;
        id
    }

    fn set_func_sym(&mut self, _sym: RuntimeSymId, _has_static_initializer: bool) {}

    fn set_var_sym(&mut self, _sym: RuntimeSymId, _is_rc_candidate: bool) {}

    fn retain(&mut self, _sym: RuntimeSymId) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_allocate_sequentially_and_independently() {
        let mut vm = NullVmCollaborator::new();
        let t1 = vm.ensure_tag_type(ChunkId::new(0), NodeId::new(0), NameId::new(0));
        let t2 = vm.ensure_tag_type(ChunkId::new(0), NodeId::new(1), NameId::new(1));
        assert_ne!(t1, t2);
        let f1 = vm.ensure_func_sym(ChunkId::new(0), NodeId::new(2), NameId::new(2));
        let f2 = vm.ensure_var_sym(ChunkId::new(0), NodeId::new(3), NameId::new(3));
        assert_ne!(f1, f2);
    }
}
