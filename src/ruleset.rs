//! Rulesets grouped by kind, as stored in account data.
//!
//! The matcher only understands a flat, priority-ordered list. This module
//! produces that list from the grouped layout: override, content, room,
//! sender, underride, each kind keeping its internal order.

use serde::{Deserialize, Serialize};

use crate::condition::Condition;
use crate::rule::PushRule;

/// Push rule kinds in descending priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Highest priority, arbitrary conditions.
    Override,
    /// Body pattern rules.
    Content,
    /// Per-room rules; the rule id is the room id.
    Room,
    /// Per-sender rules; the rule id is the user id.
    Sender,
    /// Lowest priority, arbitrary conditions.
    Underride,
}

impl RuleKind {
    /// All kinds in priority order.
    pub const ALL: [Self; 5] = [
        Self::Override,
        Self::Content,
        Self::Room,
        Self::Sender,
        Self::Underride,
    ];
}

/// A user's push rules grouped by kind.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ruleset {
    #[serde(default, rename = "override")]
    pub override_rules: Vec<PushRule>,
    #[serde(default)]
    pub content: Vec<PushRule>,
    #[serde(default)]
    pub room: Vec<PushRule>,
    #[serde(default)]
    pub sender: Vec<PushRule>,
    #[serde(default)]
    pub underride: Vec<PushRule>,
}

impl Ruleset {
    /// Rules of one kind, in stored order.
    #[must_use]
    pub fn rules(&self, kind: RuleKind) -> &[PushRule] {
        match kind {
            RuleKind::Override => &self.override_rules,
            RuleKind::Content => &self.content,
            RuleKind::Room => &self.room,
            RuleKind::Sender => &self.sender,
            RuleKind::Underride => &self.underride,
        }
    }

    /// Total number of rules across all kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        RuleKind::ALL.iter().map(|k| self.rules(*k).len()).sum()
    }

    /// True if no kind holds any rule.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Looks a rule up by kind and id.
    #[must_use]
    pub fn find(&self, kind: RuleKind, rule_id: &str) -> Option<&PushRule> {
        self.rules(kind).iter().find(|r| r.rule_id == rule_id)
    }

    /// Flattens into the priority order the matcher expects.
    ///
    /// Room and sender rules without explicit conditions are keyed by their
    /// id and get the matching `event_match` condition.
    #[must_use]
    pub fn into_ordered_rules(self) -> Vec<PushRule> {
        let mut out = Vec::with_capacity(self.len());
        out.extend(self.override_rules);
        out.extend(self.content);
        out.extend(self.room.into_iter().map(|r| keyed(r, "room_id")));
        out.extend(self.sender.into_iter().map(|r| keyed(r, "sender")));
        out.extend(self.underride);
        out
    }
}

fn keyed(mut rule: PushRule, key: &str) -> PushRule {
    if rule.conditions.is_none() {
        rule.conditions = Some(vec![Condition::event_match(key, rule.rule_id.clone())]);
    }
    rule
}
