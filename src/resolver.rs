//! Per-event resolution context for condition evaluation.
//!
//! A resolver is bound to exactly one event. It answers the questions
//! conditions ask (member count, power levels, display name) by consulting
//! the injected collaborators, and caches room lookups for the lifetime of
//! that one event only.

use std::cell::OnceCell;

use crate::condition::glob::GlobCache;
use crate::error::ProviderError;
use crate::event::{Event, UserId};
use crate::provider::{IdentityProvider, PowerLevels, RoomDataProvider, DEFAULT_NOTIFICATION_LEVEL};

/// Facts a condition may need about the event under evaluation.
///
/// `Ok(None)` from a room lookup means "room unknown" and makes the asking
/// condition unsatisfied. `Err` is a collaborator failure and aborts the batch.
pub trait ConditionResolver {
    /// The event being evaluated.
    fn event(&self) -> &Event;

    /// The local user's id.
    fn local_user(&self) -> &UserId;

    /// The local user's display name in the event's room.
    fn display_name(&self) -> Option<String>;

    /// Joined member count of the event's room.
    fn member_count(&self) -> Result<Option<u64>, ProviderError>;

    /// Power levels of the event's room.
    fn power_levels(&self) -> Result<Option<&PowerLevels>, ProviderError>;

    /// Level assumed for notification keys the room does not configure.
    fn default_notification_level(&self) -> i64 {
        DEFAULT_NOTIFICATION_LEVEL
    }

    /// Compiled-pattern cache to use, if any. Without one, patterns are
    /// compiled on every evaluation.
    fn globs(&self) -> Option<&GlobCache> {
        None
    }
}

/// Resolver backed by a room-data provider and an identity provider.
pub struct DefaultConditionResolver<'a> {
    event: &'a Event,
    rooms: &'a dyn RoomDataProvider,
    identity: &'a dyn IdentityProvider,
    default_notification_level: i64,
    globs: Option<&'a GlobCache>,
    member_count: OnceCell<Option<u64>>,
    power_levels: OnceCell<Option<PowerLevels>>,
}

impl<'a> DefaultConditionResolver<'a> {
    /// Binds a resolver to `event`.
    #[must_use]
    pub fn new(
        event: &'a Event,
        rooms: &'a dyn RoomDataProvider,
        identity: &'a dyn IdentityProvider,
    ) -> Self {
        Self {
            event,
            rooms,
            identity,
            default_notification_level: DEFAULT_NOTIFICATION_LEVEL,
            globs: None,
            member_count: OnceCell::new(),
            power_levels: OnceCell::new(),
        }
    }

    /// Overrides the fallback notification level.
    #[must_use]
    pub fn with_default_notification_level(mut self, level: i64) -> Self {
        self.default_notification_level = level;
        self
    }

    /// Shares a pattern cache that outlives this event.
    #[must_use]
    pub fn with_glob_cache(mut self, globs: &'a GlobCache) -> Self {
        self.globs = Some(globs);
        self
    }
}

impl ConditionResolver for DefaultConditionResolver<'_> {
    fn event(&self) -> &Event {
        self.event
    }

    fn local_user(&self) -> &UserId {
        self.identity.user_id()
    }

    fn display_name(&self) -> Option<String> {
        self.identity.display_name(&self.event.room_id)
    }

    fn member_count(&self) -> Result<Option<u64>, ProviderError> {
        if let Some(cached) = self.member_count.get() {
            return Ok(*cached);
        }
        let count = self.rooms.member_count(&self.event.room_id)?;
        let _ = self.member_count.set(count);
        Ok(count)
    }

    fn power_levels(&self) -> Result<Option<&PowerLevels>, ProviderError> {
        if self.power_levels.get().is_none() {
            let levels = self.rooms.power_levels(&self.event.room_id)?;
            let _ = self.power_levels.set(levels);
        }
        Ok(self.power_levels.get().and_then(Option::as_ref))
    }

    fn default_notification_level(&self) -> i64 {
        self.default_notification_level
    }

    fn globs(&self) -> Option<&GlobCache> {
        self.globs
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::event::RoomId;
    use crate::provider::StaticIdentity;

    #[derive(Default)]
    struct CountingRooms {
        calls: AtomicUsize,
    }

    impl RoomDataProvider for CountingRooms {
        fn member_count(&self, _room_id: &RoomId) -> Result<Option<u64>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(7))
        }

        fn power_levels(&self, _room_id: &RoomId) -> Result<Option<PowerLevels>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(PowerLevels::default().with_user("@bob:hs", 50)))
        }
    }

    #[test]
    fn lookups_are_cached_per_resolver() {
        let rooms = CountingRooms::default();
        let me = StaticIdentity::new("@alice:hs");
        let ev = Event::text_message("$1", "@bob:hs", "!r:hs", "hi");

        let resolver = DefaultConditionResolver::new(&ev, &rooms, &me);
        assert_eq!(resolver.member_count().unwrap(), Some(7));
        assert_eq!(resolver.member_count().unwrap(), Some(7));
        assert!(resolver.power_levels().unwrap().is_some());
        assert!(resolver.power_levels().unwrap().is_some());
        assert_eq!(rooms.calls.load(Ordering::SeqCst), 2);

        // A fresh resolver for another event does not see the old cache.
        let ev2 = Event::text_message("$2", "@bob:hs", "!r:hs", "hi");
        let resolver2 = DefaultConditionResolver::new(&ev2, &rooms, &me);
        assert_eq!(resolver2.member_count().unwrap(), Some(7));
        assert_eq!(rooms.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn errors_are_not_cached() {
        struct Flaky(AtomicUsize);
        impl RoomDataProvider for Flaky {
            fn member_count(&self, _room_id: &RoomId) -> Result<Option<u64>, ProviderError> {
                if self.0.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(ProviderError::unavailable("room_data", "warming up"))
                } else {
                    Ok(Some(3))
                }
            }
            fn power_levels(&self, _room_id: &RoomId) -> Result<Option<PowerLevels>, ProviderError> {
                Ok(None)
            }
        }

        let rooms = Flaky(AtomicUsize::new(0));
        let me = StaticIdentity::new("@alice:hs");
        let ev = Event::text_message("$1", "@bob:hs", "!r:hs", "hi");
        let resolver = DefaultConditionResolver::new(&ev, &rooms, &me);

        assert!(resolver.member_count().is_err());
        assert_eq!(resolver.member_count().unwrap(), Some(3));
    }

    #[test]
    fn display_name_is_scoped_to_event_room() {
        let rooms = CountingRooms::default();
        let me = StaticIdentity::new("@alice:hs").with_display_name("Alice");
        me.set_room_display_name("!r:hs", "Ally");
        let ev = Event::text_message("$1", "@bob:hs", "!r:hs", "hi");

        let resolver = DefaultConditionResolver::new(&ev, &rooms, &me).with_default_notification_level(30);
        assert_eq!(resolver.display_name().as_deref(), Some("Ally"));
        assert_eq!(resolver.local_user().as_str(), "@alice:hs");
        assert_eq!(resolver.default_notification_level(), 30);
        assert!(resolver.globs().is_none());
    }

    #[test]
    fn glob_cache_is_shared_across_events() {
        use crate::condition::Condition;

        let rooms = CountingRooms::default();
        let me = StaticIdentity::new("@alice:hs").with_display_name("Alice");
        let globs = GlobCache::new();
        let cake = Condition::event_match("content.body", "cake*");

        for (id, body) in [("$1", "cake time"), ("$2", "more cake"), ("$3", "pancake")] {
            let ev = Event::text_message(id, "@bob:hs", "!r:hs", body);
            let resolver = DefaultConditionResolver::new(&ev, &rooms, &me).with_glob_cache(&globs);
            assert_eq!(cake.is_satisfied(&resolver).unwrap(), id != "$3");
            assert!(Condition::ContainsDisplayName.is_satisfied(&resolver).is_ok());
        }
        // One body pattern plus one display-name search.
        assert_eq!(globs.len(), 2);
    }
}
