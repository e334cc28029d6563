//! Collaborators the engine reads room and identity facts from.

mod memory;
mod power_levels;
mod traits;

pub use memory::{InMemoryRoomData, StaticIdentity};
pub use power_levels::{PowerLevels, DEFAULT_NOTIFICATION_LEVEL};
pub use traits::{IdentityProvider, RoomDataProvider};
