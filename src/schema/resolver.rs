//! Union branch resolution
//!
//! The common "optional value" shape, a union of exactly two branches one of
//! which is null, is reduced to its non-null branch. Every other union is a
//! general tagged union and is stored as a serialized blob keyed on the
//! whole union schema.
//!
//! When both branches of a two-branch nullable union have the same kind the
//! first declared branch is chosen. Branch disambiguation from the stored
//! value alone is not attempted, so previously stored data keeps decoding
//! the way it always has.

use super::types::{Schema, SchemaKind};

/// Outcome of resolving a union schema
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnionResolution<'a> {
    /// A nullable two-branch union; decode with this concrete branch.
    Optional(&'a Schema),
    /// A general union; decode as a blob with a decoder for the union itself.
    Tagged,
}

/// Resolve a union's branches.
pub fn resolve_union(branches: &[Schema]) -> UnionResolution<'_> {
    if branches.len() != 2 || !is_nullable(branches) {
        return UnionResolution::Tagged;
    }

    let (first, second) = (&branches[0], &branches[1]);
    if first.kind() == second.kind() {
        return UnionResolution::Optional(first);
    }

    if first.kind() == SchemaKind::Null {
        UnionResolution::Optional(second)
    } else {
        UnionResolution::Optional(first)
    }
}

/// Whether any branch of the union is null
pub fn is_nullable(branches: &[Schema]) -> bool {
    branches.iter().any(|b| b.kind() == SchemaKind::Null)
}
