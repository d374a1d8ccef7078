//! Resource ownership checks.
//!
//! Callers must look the resource up first: a missing resource is `NotFound`,
//! an existing one owned by someone else is `Forbidden`.

use crate::db::{Idea, Principal};

/// A resource with a single owning principal.
pub trait Owned {
    fn owner_id(&self) -> &str;
}

impl Owned for Idea {
    fn owner_id(&self) -> &str {
        &self.owner
    }
}

/// Outcome of an ownership check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allowed,
    Denied,
}

/// Decide whether `principal` may mutate `resource`.
pub fn authorize<R: Owned + ?Sized>(principal: &Principal, resource: &R) -> Access {
    if resource.owner_id() == principal.id {
        Access::Allowed
    } else {
        Access::Denied
    }
}
