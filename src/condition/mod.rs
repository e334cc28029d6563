//! Push rule conditions.
//!
//! A condition is one clause of a push rule. Each variant is evaluated by its
//! own function against a [`ConditionResolver`]; every "cannot tell" outcome
//! (unknown room, missing field, malformed parameter, unknown kind) is
//! `Ok(false)`. Only collaborator failures surface as `Err`.

pub mod glob;
mod member_count;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::PushResult;
use crate::resolver::ConditionResolver;

pub use member_count::{Comparison, MemberCountBound};

use self::glob::GlobMode;

/// Field whose `event_match` patterns are matched word-wise.
pub const BODY_KEY: &str = "content.body";

/// A single push rule condition, in its wire shape.
///
/// Parameters are optional on purpose: a condition with a missing parameter
/// deserializes fine and simply never holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    /// Glob match of an event field.
    EventMatch {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pattern: Option<String>,
    },

    /// The body mentions the local user's display name.
    ContainsDisplayName,

    /// The room's member count satisfies `is` (e.g. `>2`).
    RoomMemberCount {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        is: Option<String>,
    },

    /// The sender may trigger the notification named by `key`.
    SenderNotificationPermission {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key: Option<String>,
    },

    /// Any kind this engine does not understand.
    #[serde(other)]
    Unknown,
}

impl Condition {
    /// Builds an `event_match` condition.
    #[must_use]
    pub fn event_match(key: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::EventMatch {
            key: Some(key.into()),
            pattern: Some(pattern.into()),
        }
    }

    /// Builds a `room_member_count` condition.
    #[must_use]
    pub fn member_count(is: impl Into<String>) -> Self {
        Self::RoomMemberCount { is: Some(is.into()) }
    }

    /// Builds a `sender_notification_permission` condition.
    #[must_use]
    pub fn sender_permission(key: impl Into<String>) -> Self {
        Self::SenderNotificationPermission { key: Some(key.into()) }
    }

    /// Wire name of the condition kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::EventMatch { .. } => "event_match",
            Self::ContainsDisplayName => "contains_display_name",
            Self::RoomMemberCount { .. } => "room_member_count",
            Self::SenderNotificationPermission { .. } => "sender_notification_permission",
            Self::Unknown => "unknown",
        }
    }

    /// Evaluates the condition for the resolver's event.
    pub fn is_satisfied(&self, resolver: &dyn ConditionResolver) -> PushResult<bool> {
        let satisfied = match self {
            Self::EventMatch { key, pattern } => {
                event_match(key.as_deref(), pattern.as_deref(), resolver)
            }
            Self::ContainsDisplayName => contains_display_name(resolver),
            Self::RoomMemberCount { is } => room_member_count(is.as_deref(), resolver)?,
            Self::SenderNotificationPermission { key } => {
                sender_notification_permission(key.as_deref(), resolver)?
            }
            Self::Unknown => false,
        };

        trace!(
            event_id = %resolver.event().event_id,
            kind = self.kind(),
            satisfied,
            "condition evaluated"
        );
        Ok(satisfied)
    }
}

fn event_match(key: Option<&str>, pattern: Option<&str>, resolver: &dyn ConditionResolver) -> bool {
    let (Some(key), Some(pattern)) = (key, pattern) else {
        return false;
    };
    let Some(value) = resolver.event().field(key) else {
        return false;
    };

    let mode = if key == BODY_KEY {
        GlobMode::Words
    } else {
        GlobMode::Exact
    };
    match resolver.globs() {
        Some(cache) => cache.matches(pattern, value, mode),
        None => glob::matches(pattern, value, mode),
    }
}

fn contains_display_name(resolver: &dyn ConditionResolver) -> bool {
    let event = resolver.event();
    if &event.sender == resolver.local_user() {
        return false;
    }
    let Some(body) = event.body() else {
        return false;
    };
    let Some(name) = resolver.display_name() else {
        return false;
    };
    match resolver.globs() {
        Some(cache) => cache.contains_word(body, &name),
        None => glob::contains_word(body, &name),
    }
}

fn room_member_count(is: Option<&str>, resolver: &dyn ConditionResolver) -> PushResult<bool> {
    let Some(bound) = is.and_then(|s| s.parse::<MemberCountBound>().ok()) else {
        return Ok(false);
    };
    let Some(count) = resolver.member_count()? else {
        return Ok(false);
    };
    Ok(bound.accepts(count))
}

fn sender_notification_permission(
    key: Option<&str>,
    resolver: &dyn ConditionResolver,
) -> PushResult<bool> {
    let Some(key) = key.map(str::trim).filter(|k| !k.is_empty()) else {
        return Ok(false);
    };
    let Some(levels) = resolver.power_levels()? else {
        return Ok(false);
    };

    let required = levels
        .notification_level(key)
        .unwrap_or_else(|| resolver.default_notification_level());
    Ok(levels.user_level(&resolver.event().sender) >= required)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::event::{Event, UserId};
    use crate::provider::PowerLevels;

    /// Resolver with fixed answers, for condition-level tests.
    pub(crate) struct FixedResolver {
        pub event: Event,
        pub me: UserId,
        pub display_name: Option<String>,
        pub member_count: Option<u64>,
        pub power_levels: Option<PowerLevels>,
        pub fail: bool,
    }

    impl FixedResolver {
        pub(crate) fn new(event: Event) -> Self {
            Self {
                event,
                me: UserId::new("@alice:hs"),
                display_name: Some("Alice".to_string()),
                member_count: Some(2),
                power_levels: None,
                fail: false,
            }
        }
    }

    impl ConditionResolver for FixedResolver {
        fn event(&self) -> &Event {
            &self.event
        }

        fn local_user(&self) -> &UserId {
            &self.me
        }

        fn display_name(&self) -> Option<String> {
            self.display_name.clone()
        }

        fn member_count(&self) -> Result<Option<u64>, ProviderError> {
            if self.fail {
                return Err(ProviderError::unavailable("room_data", "down"));
            }
            Ok(self.member_count)
        }

        fn power_levels(&self) -> Result<Option<&PowerLevels>, ProviderError> {
            if self.fail {
                return Err(ProviderError::unavailable("room_data", "down"));
            }
            Ok(self.power_levels.as_ref())
        }
    }

    fn msg(body: &str) -> Event {
        Event::text_message("$1", "@bob:hs", "!r:hs", body)
    }

    #[test]
    fn event_match_on_body_is_word_wise() {
        let r = FixedResolver::new(msg("I like cake"));
        assert!(Condition::event_match("content.body", "cake").is_satisfied(&r).unwrap());
        assert!(!Condition::event_match("content.body", "cak").is_satisfied(&r).unwrap());
    }

    #[test]
    fn event_match_on_other_keys_is_exact() {
        let r = FixedResolver::new(msg("hi"));
        assert!(Condition::event_match("type", "m.room.message").is_satisfied(&r).unwrap());
        assert!(Condition::event_match("type", "m.room.*").is_satisfied(&r).unwrap());
        assert!(!Condition::event_match("type", "m.room").is_satisfied(&r).unwrap());
        assert!(Condition::event_match("content.msgtype", "M.TEXT").is_satisfied(&r).unwrap());
    }

    #[test]
    fn event_match_missing_parameters_is_false() {
        let r = FixedResolver::new(msg("hi"));
        let no_key = Condition::EventMatch { key: None, pattern: Some("*".to_string()) };
        let no_pattern = Condition::EventMatch { key: Some("type".to_string()), pattern: None };
        assert!(!no_key.is_satisfied(&r).unwrap());
        assert!(!no_pattern.is_satisfied(&r).unwrap());
        assert!(!Condition::event_match("content.nope", "*").is_satisfied(&r).unwrap());
    }

    #[test]
    fn display_name_mention() {
        let hit = FixedResolver::new(msg("hello Alice"));
        let miss = FixedResolver::new(msg("hello Bob"));
        assert!(Condition::ContainsDisplayName.is_satisfied(&hit).unwrap());
        assert!(!Condition::ContainsDisplayName.is_satisfied(&miss).unwrap());

        let mut unnamed = FixedResolver::new(msg("hello Alice"));
        unnamed.display_name = None;
        assert!(!Condition::ContainsDisplayName.is_satisfied(&unnamed).unwrap());
    }

    #[test]
    fn display_name_ignores_own_messages() {
        let own = FixedResolver::new(Event::text_message("$1", "@alice:hs", "!r:hs", "I am Alice"));
        assert!(!Condition::ContainsDisplayName.is_satisfied(&own).unwrap());
    }

    #[test]
    fn member_count_threshold() {
        let r = FixedResolver::new(msg("hi"));
        assert!(!Condition::member_count(">2").is_satisfied(&r).unwrap());
        assert!(Condition::member_count("2").is_satisfied(&r).unwrap());
        assert!(Condition::member_count("<=2").is_satisfied(&r).unwrap());
        assert!(!Condition::member_count("bogus").is_satisfied(&r).unwrap());
        assert!(!Condition::RoomMemberCount { is: None }.is_satisfied(&r).unwrap());
    }

    #[test]
    fn member_count_unknown_room_is_false() {
        let mut r = FixedResolver::new(msg("hi"));
        r.member_count = None;
        assert!(!Condition::member_count("2").is_satisfied(&r).unwrap());
    }

    #[test]
    fn member_count_provider_failure_propagates() {
        let mut r = FixedResolver::new(msg("hi"));
        r.fail = true;
        assert!(Condition::member_count("2").is_satisfied(&r).unwrap_err().is_provider());
        // Malformed bounds short-circuit before the lookup.
        assert!(!Condition::member_count("x").is_satisfied(&r).unwrap());
    }

    #[test]
    fn sender_permission_uses_room_levels() {
        let mut r = FixedResolver::new(msg("@room hi"));
        r.power_levels = Some(PowerLevels::default().with_user("@bob:hs", 50));
        assert!(Condition::sender_permission("room").is_satisfied(&r).unwrap());

        r.power_levels = Some(
            PowerLevels::default()
                .with_user("@bob:hs", 50)
                .with_notification("room", 100),
        );
        assert!(!Condition::sender_permission("room").is_satisfied(&r).unwrap());
    }

    #[test]
    fn sender_permission_degrades_to_false() {
        let mut r = FixedResolver::new(msg("@room hi"));
        assert!(!Condition::sender_permission("room").is_satisfied(&r).unwrap());

        r.power_levels = Some(PowerLevels::default().with_user("@bob:hs", 100));
        assert!(!Condition::SenderNotificationPermission { key: None }.is_satisfied(&r).unwrap());
        assert!(!Condition::sender_permission("  ").is_satisfied(&r).unwrap());
    }

    #[test]
    fn unknown_kind_deserializes_and_never_holds() {
        let c: Condition = serde_json::from_str(r#"{ "kind": "org.example.custom", "x": 1 }"#).unwrap();
        assert_eq!(c, Condition::Unknown);
        assert!(!c.is_satisfied(&FixedResolver::new(msg("hi"))).unwrap());
    }

    #[test]
    fn wire_shape() {
        let c: Condition =
            serde_json::from_str(r#"{ "kind": "event_match", "key": "type", "pattern": "m.room.message" }"#)
                .unwrap();
        assert_eq!(c, Condition::event_match("type", "m.room.message"));

        let c: Condition = serde_json::from_str(r#"{ "kind": "room_member_count", "is": "2" }"#).unwrap();
        assert_eq!(c.kind(), "room_member_count");

        let c: Condition = serde_json::from_str(r#"{ "kind": "contains_display_name" }"#).unwrap();
        assert_eq!(c, Condition::ContainsDisplayName);
    }
}
