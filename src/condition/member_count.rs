//! Member count bounds for `room_member_count` conditions.
//!
//! The wire form is `[op]N`, e.g. `2`, `==2`, `>10`, `<=5`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Comparison applied between the room's member count and the bound.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Eq,
    Lt,
    Gt,
    Le,
    Ge,
}

impl Comparison {
    const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
        }
    }
}

/// A parsed `is` expression.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemberCountBound {
    pub op: Comparison,
    pub count: u64,
}

impl MemberCountBound {
    /// True if `actual` satisfies the bound.
    #[must_use]
    pub const fn accepts(&self, actual: u64) -> bool {
        match self.op {
            Comparison::Eq => actual == self.count,
            Comparison::Lt => actual < self.count,
            Comparison::Gt => actual > self.count,
            Comparison::Le => actual <= self.count,
            Comparison::Ge => actual >= self.count,
        }
    }
}

impl FromStr for MemberCountBound {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let expr = s.trim();
        // Two-character operators must be tried first.
        let (op, rest) = if let Some(rest) = expr.strip_prefix("==") {
            (Comparison::Eq, rest)
        } else if let Some(rest) = expr.strip_prefix("<=") {
            (Comparison::Le, rest)
        } else if let Some(rest) = expr.strip_prefix(">=") {
            (Comparison::Ge, rest)
        } else if let Some(rest) = expr.strip_prefix('<') {
            (Comparison::Lt, rest)
        } else if let Some(rest) = expr.strip_prefix('>') {
            (Comparison::Gt, rest)
        } else {
            (Comparison::Eq, expr)
        };

        let rest = rest.trim();
        if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::InvalidMemberCount { expr: s.to_string() });
        }
        let count = rest
            .parse::<u64>()
            .map_err(|_| ValidationError::InvalidMemberCount { expr: s.to_string() })?;

        Ok(Self { op, count })
    }
}

impl fmt::Display for MemberCountBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op.symbol(), self.count)
    }
}
