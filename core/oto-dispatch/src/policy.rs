//! Actor role resolution.

use oto_types::ActorId;
use std::collections::HashSet;

/// Decides whether an actor may perform privileged actions.
pub trait RolePolicy: Send + Sync {
    /// Returns true if `actor` holds the admin role.
    fn is_privileged(&self, actor: ActorId) -> bool;
}

/// Grants the admin role to a fixed set of actors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminAllowList {
    admins: HashSet<ActorId>,
}

impl AdminAllowList {
    /// Creates an allow-list from the configured admin ids.
    pub fn new(admins: impl IntoIterator<Item = ActorId>) -> Self {
        Self {
            admins: admins.into_iter().collect(),
        }
    }

    /// Number of admins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.admins.len()
    }

    /// Returns true if no actor is privileged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.admins.is_empty()
    }
}

impl RolePolicy for AdminAllowList {
    fn is_privileged(&self, actor: ActorId) -> bool {
        self.admins.contains(&actor)
    }
}
