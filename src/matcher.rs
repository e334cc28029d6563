//! Rule matching for a single event.
//!
//! Rules are tried in the order given, which is their priority. The first
//! enabled rule whose conditions all hold wins.

use tracing::{debug, warn};

use crate::error::PushResult;
use crate::resolver::ConditionResolver;
use crate::rule::PushRule;

/// Finds the first matching rule for an event.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleMatcher;

impl RuleMatcher {
    /// Creates a matcher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Returns the first enabled, well-formed rule whose conditions all hold
    /// for the resolver's event.
    ///
    /// # Errors
    /// Only collaborator failures surfaced by the resolver.
    pub fn find_match<'r>(
        &self,
        resolver: &dyn ConditionResolver,
        rules: &'r [PushRule],
    ) -> PushResult<Option<&'r PushRule>> {
        for rule in rules {
            if !rule.enabled {
                continue;
            }
            if let Err(e) = rule.validate() {
                warn!(error = %e, "skipping malformed push rule");
                continue;
            }
            if self.rule_matches(rule, resolver)? {
                debug!(
                    event_id = %resolver.event().event_id,
                    rule_id = %rule.rule_id,
                    "push rule matched"
                );
                return Ok(Some(rule));
            }
        }
        Ok(None)
    }

    /// Conjunction of the rule's conditions; `true` for an empty list.
    ///
    /// Ignores the `enabled` flag.
    pub fn rule_matches(&self, rule: &PushRule, resolver: &dyn ConditionResolver) -> PushResult<bool> {
        for condition in rule.effective_conditions().iter() {
            if !condition.is_satisfied(resolver)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
