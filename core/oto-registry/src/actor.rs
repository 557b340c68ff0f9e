//! Actors known to the engine.

use chrono::{DateTime, Utc};
use oto_types::ActorId;
use serde::{Deserialize, Serialize};

/// An actor that has contacted the engine at least once.
///
/// Records are never deleted. Role membership is not stored here; it comes
/// from the configured allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Transport account id.
    pub id: ActorId,
    /// Most recent display name.
    pub display_name: String,
    /// First contact.
    pub first_seen: DateTime<Utc>,
}

impl Actor {
    /// Creates a record for an actor seen for the first time.
    pub fn new(id: ActorId, display_name: impl Into<String>, first_seen: DateTime<Utc>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            first_seen,
        }
    }
}
