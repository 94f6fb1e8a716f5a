//! Caller identity supplied by the external auth layer.
//!
//! The core never establishes identity itself; it only reads the caller
//! through `CallerIdentity` on each guarded call.

use uuid::Uuid;

/// Privilege level of an authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallerRole {
    Admin,
    Agent,
}

/// Authenticated caller as reported by the auth collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    /// For agents this is their `AgentId`.
    pub id: Uuid,
    pub role: CallerRole,
}

impl Caller {
    pub fn admin(id: Uuid) -> Self {
        Self {
            id,
            role: CallerRole::Admin,
        }
    }

    pub fn agent(id: Uuid) -> Self {
        Self {
            id,
            role: CallerRole::Agent,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == CallerRole::Admin
    }

    /// Owner-or-admin rule shared by task reads and writes.
    pub fn may_act_for(&self, owner: Uuid) -> bool {
        self.is_admin() || self.id == owner
    }
}

/// Source of the current caller, queried once per guarded operation.
pub trait CallerIdentity {
    fn current_caller(&self) -> Caller;
}

impl CallerIdentity for Caller {
    fn current_caller(&self) -> Caller {
        *self
    }
}

impl<T: CallerIdentity + ?Sized> CallerIdentity for &T {
    fn current_caller(&self) -> Caller {
        (**self).current_caller()
    }
}
