//! Room power levels as needed for notification permission checks.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::event::UserId;

/// Level required to trigger a notification key when the room does not set one.
pub const DEFAULT_NOTIFICATION_LEVEL: i64 = 50;

/// Power levels of a room (the `m.room.power_levels` state content).
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerLevels {
    #[serde(default)]
    pub users: HashMap<UserId, i64>,
    #[serde(default)]
    pub users_default: i64,
    #[serde(default)]
    pub notifications: HashMap<String, i64>,
}

impl PowerLevels {
    /// Power level of `user`, falling back to `users_default`.
    #[must_use]
    pub fn user_level(&self, user: &UserId) -> i64 {
        self.users.get(user).copied().unwrap_or(self.users_default)
    }

    /// Level required to trigger the notification `key` (e.g. `"room"`).
    ///
    /// Returns `None` for keys the room does not configure, leaving the
    /// fallback to the caller.
    #[must_use]
    pub fn notification_level(&self, key: &str) -> Option<i64> {
        self.notifications.get(key).copied()
    }

    /// Sets a user's level.
    #[must_use]
    pub fn with_user(mut self, user: impl Into<UserId>, level: i64) -> Self {
        self.users.insert(user.into(), level);
        self
    }

    /// Sets a notification key's required level.
    #[must_use]
    pub fn with_notification(mut self, key: impl Into<String>, level: i64) -> Self {
        self.notifications.insert(key.into(), level);
        self
    }
}
