//! Push rules and their actions.
//!
//! A rule is a conjunction of conditions plus an action payload. The engine
//! forwards actions untouched; [`PushRule::actions`] is a convenience parser
//! for consumers that want to inspect them.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::condition::{Condition, BODY_KEY};
use crate::error::ValidationError;

/// A single push rule.
///
/// `conditions` distinguishes "absent" (`None`) from "empty" on the wire,
/// but both evaluate the same way; see [`PushRule::effective_conditions`].
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushRule {
    pub rule_id: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub default: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<Condition>>,
    /// Body glob of a content rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default)]
    pub actions: Vec<JsonValue>,
}

const fn default_enabled() -> bool {
    true
}

impl PushRule {
    /// Creates an enabled rule with no conditions and no actions.
    #[must_use]
    pub fn new(rule_id: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.into(),
            enabled: true,
            default: false,
            conditions: None,
            pattern: None,
            actions: Vec::new(),
        }
    }

    /// Appends a condition.
    #[must_use]
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.get_or_insert_with(Vec::new).push(condition);
        self
    }

    /// Sets the content-rule body pattern.
    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Appends a raw action.
    #[must_use]
    pub fn with_action(mut self, action: JsonValue) -> Self {
        self.actions.push(action);
        self
    }

    /// Sets the enabled flag.
    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Checks that the rule can be evaluated at all.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.rule_id.trim().is_empty() {
            return Err(ValidationError::EmptyRuleId);
        }
        Ok(())
    }

    /// The conditions the matcher evaluates.
    ///
    /// Explicit conditions win. A rule without them but with a `pattern`
    /// becomes a body match. Otherwise the list is empty and the rule
    /// matches every event.
    #[must_use]
    pub fn effective_conditions(&self) -> Cow<'_, [Condition]> {
        if let Some(conditions) = &self.conditions {
            return Cow::Borrowed(conditions.as_slice());
        }
        match &self.pattern {
            Some(pattern) => Cow::Owned(vec![Condition::event_match(BODY_KEY, pattern.clone())]),
            None => Cow::Borrowed(&[][..]),
        }
    }

    /// Parses the raw actions.
    #[must_use]
    pub fn actions(&self) -> Vec<Action> {
        self.actions.iter().map(Action::from_json).collect()
    }

    /// True if the actions ask for a notification.
    #[must_use]
    pub fn should_notify(&self) -> bool {
        self.actions()
            .iter()
            .any(|a| matches!(a, Action::Notify | Action::Coalesce))
    }

    /// True if the actions set the `highlight` tweak.
    #[must_use]
    pub fn highlight(&self) -> bool {
        self.actions().iter().any(|a| match a {
            Action::SetTweak { name, value } if name == "highlight" => {
                // A highlight tweak without a value means true.
                value.as_ref().map_or(true, |v| v.as_bool().unwrap_or(false))
            }
            _ => false,
        })
    }
}

/// A parsed push rule action.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Notify the user.
    Notify,
    /// Do not notify.
    DontNotify,
    /// Notify, possibly grouped with other notifications.
    Coalesce,
    /// Set a tweak such as `sound` or `highlight`.
    SetTweak {
        /// Tweak name.
        name: String,
        /// Tweak value, if given.
        value: Option<JsonValue>,
    },
    /// Anything else, kept verbatim.
    Unknown(JsonValue),
}

impl Action {
    /// Parses one raw action.
    #[must_use]
    pub fn from_json(raw: &JsonValue) -> Self {
        match raw {
            JsonValue::String(s) => match s.as_str() {
                "notify" => Self::Notify,
                "dont_notify" => Self::DontNotify,
                "coalesce" => Self::Coalesce,
                _ => Self::Unknown(raw.clone()),
            },
            JsonValue::Object(obj) => match obj.get("set_tweak").and_then(JsonValue::as_str) {
                Some(name) => Self::SetTweak {
                    name: name.to_string(),
                    value: obj.get("value").cloned(),
                },
                None => Self::Unknown(raw.clone()),
            },
            _ => Self::Unknown(raw.clone()),
        }
    }
}
