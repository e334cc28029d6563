//! In-memory collaborators.
//!
//! Thread-safe implementations of the provider traits for embedded usage and
//! tests. `InMemoryRoomData` can be switched to an unavailable state to
//! exercise batch-level failure handling.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use crate::error::ProviderError;
use crate::event::{RoomId, UserId};

use super::power_levels::PowerLevels;
use super::traits::{IdentityProvider, RoomDataProvider};

fn lock_err(context: &'static str) -> ProviderError {
    ProviderError::PoisonedLock(context)
}

#[derive(Debug, Clone, Default)]
struct RoomState {
    member_count: u64,
    power_levels: Option<PowerLevels>,
}

/// Room data held in memory.
#[derive(Debug, Default)]
pub struct InMemoryRoomData {
    rooms: RwLock<HashMap<RoomId, RoomState>>,
    unavailable: AtomicBool,
}

impl InMemoryRoomData {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a room's member count.
    pub fn set_member_count(&self, room_id: impl Into<RoomId>, count: u64) -> Result<(), ProviderError> {
        let mut rooms = self.rooms.write().map_err(|_| lock_err("rooms"))?;
        rooms.entry(room_id.into()).or_default().member_count = count;
        Ok(())
    }

    /// Inserts or replaces a room's power levels.
    pub fn set_power_levels(
        &self,
        room_id: impl Into<RoomId>,
        levels: PowerLevels,
    ) -> Result<(), ProviderError> {
        let mut rooms = self.rooms.write().map_err(|_| lock_err("rooms"))?;
        rooms.entry(room_id.into()).or_default().power_levels = Some(levels);
        Ok(())
    }

    /// Forgets a room entirely.
    pub fn remove_room(&self, room_id: &RoomId) -> Result<bool, ProviderError> {
        let mut rooms = self.rooms.write().map_err(|_| lock_err("rooms"))?;
        Ok(rooms.remove(room_id).is_some())
    }

    /// Makes every lookup fail with `ProviderError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Release);
    }

    fn check_available(&self) -> Result<(), ProviderError> {
        if self.unavailable.load(Ordering::Acquire) {
            return Err(ProviderError::unavailable("room_data", "in-memory store marked unavailable"));
        }
        Ok(())
    }
}

impl RoomDataProvider for InMemoryRoomData {
    fn member_count(&self, room_id: &RoomId) -> Result<Option<u64>, ProviderError> {
        self.check_available()?;
        let rooms = self.rooms.read().map_err(|_| lock_err("rooms"))?;
        Ok(rooms.get(room_id).map(|r| r.member_count))
    }

    fn power_levels(&self, room_id: &RoomId) -> Result<Option<PowerLevels>, ProviderError> {
        self.check_available()?;
        let rooms = self.rooms.read().map_err(|_| lock_err("rooms"))?;
        Ok(rooms.get(room_id).and_then(|r| r.power_levels.clone()))
    }
}

/// Fixed local identity with an optional global display name and per-room
/// overrides.
#[derive(Debug)]
pub struct StaticIdentity {
    user_id: UserId,
    display_name: RwLock<Option<String>>,
    room_names: RwLock<HashMap<RoomId, String>>,
}

impl StaticIdentity {
    /// Creates an identity without a display name.
    #[must_use]
    pub fn new(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: RwLock::new(None),
            room_names: RwLock::new(HashMap::new()),
        }
    }

    /// Sets the global display name.
    #[must_use]
    pub fn with_display_name(self, name: impl Into<String>) -> Self {
        self.set_display_name(Some(name.into()));
        self
    }

    /// Replaces the global display name.
    pub fn set_display_name(&self, name: Option<String>) {
        if let Ok(mut guard) = self.display_name.write() {
            *guard = name;
        }
    }

    /// Sets a room-specific display name.
    pub fn set_room_display_name(&self, room_id: impl Into<RoomId>, name: impl Into<String>) {
        if let Ok(mut guard) = self.room_names.write() {
            guard.insert(room_id.into(), name.into());
        }
    }
}

impl IdentityProvider for StaticIdentity {
    fn user_id(&self) -> &UserId {
        &self.user_id
    }

    fn display_name(&self, room_id: &RoomId) -> Option<String> {
        if let Some(name) = self.room_names.read().ok().and_then(|m| m.get(room_id).cloned()) {
            return Some(name);
        }
        self.display_name.read().ok().and_then(|g| g.clone())
    }
}
