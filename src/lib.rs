//! # pushrules - push rule evaluation for chat clients
//!
//! Decides which incoming room events should notify the local user. Given a
//! batch of events and the user's push rules in priority order, the engine
//! finds, per event, the first enabled rule whose conditions all hold and
//! reports it to a notification sink, then signals that the batch finished.
//!
//! ## Core Concepts
//!
//! - **Condition**: one clause of a rule (field glob, display-name mention,
//!   member count, sender permission)
//! - **ConditionResolver**: per-event view of the facts conditions need
//! - **PushRule**: an enable-able conjunction of conditions plus actions
//! - **RuleMatcher**: first-match-wins evaluation over an ordered rule list
//! - **BatchProcessor**: ordered batch driver with one completion signal
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use pushrules::{BatchProcessor, ChannelSink, Condition, Event, InMemoryRoomData, PushRule, StaticIdentity};
//!
//! let (sink, stream) = ChannelSink::new(64);
//! let processor = BatchProcessor::new(
//!     Arc::new(InMemoryRoomData::new()),
//!     Arc::new(StaticIdentity::new("@alice:example.org").with_display_name("Alice")),
//!     Arc::new(sink),
//! );
//!
//! let rules = vec![PushRule::new("contains-name").with_condition(Condition::ContainsDisplayName)];
//! let events = vec![Event::text_message("$1", "@bob:example.org", "!room:example.org", "hello Alice")];
//! processor.process(&events, &rules)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod batch;
pub mod condition;
pub mod config;
pub mod error;
pub mod event;
pub mod matcher;
pub mod provider;
pub mod resolver;
pub mod rule;
pub mod ruleset;

// Re-export primary types at crate root for convenience
pub use batch::{
    BatchHandle, BatchId, BatchProcessor, BatchReport, BatchWorker, CancellationToken, ChannelSink,
    MatchResult, MatchedEvent, Notification, NotificationSink, NotificationStream,
};
pub use condition::{Comparison, Condition, MemberCountBound};
pub use config::ProcessorConfig;
pub use error::{PushError, PushResult, ProviderError, ValidationError};
pub use event::{Event, EventId, RoomId, UserId};
pub use matcher::RuleMatcher;
pub use provider::{
    IdentityProvider, InMemoryRoomData, PowerLevels, RoomDataProvider, StaticIdentity,
    DEFAULT_NOTIFICATION_LEVEL,
};
pub use resolver::{ConditionResolver, DefaultConditionResolver};
pub use rule::{Action, PushRule};
pub use ruleset::{RuleKind, Ruleset};
