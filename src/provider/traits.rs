//! Collaborator traits consumed by the push rule engine.
//!
//! These define what the engine reads from the rest of the client. Room and
//! session state live elsewhere; implementations only have to answer the
//! questions below.

use crate::error::ProviderError;
use crate::event::{RoomId, UserId};

use super::power_levels::PowerLevels;

/// Read access to room state.
///
/// Implementations return `Ok(None)` for rooms they do not know about. An
/// `Err` means the provider itself is unusable and fails the whole batch.
pub trait RoomDataProvider: Send + Sync {
    /// Number of joined members in the room.
    fn member_count(&self, room_id: &RoomId) -> Result<Option<u64>, ProviderError>;

    /// Current power levels of the room.
    fn power_levels(&self, room_id: &RoomId) -> Result<Option<PowerLevels>, ProviderError>;
}

/// Identity of the local (logged-in) user.
pub trait IdentityProvider: Send + Sync {
    /// The local user's id.
    fn user_id(&self) -> &UserId;

    /// The local user's display name in `room_id`, if one is set.
    fn display_name(&self, room_id: &RoomId) -> Option<String>;
}
