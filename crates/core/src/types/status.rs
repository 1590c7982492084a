//! Status enums for orders and users.
//!
//! [`OrderStatus`] is the shipment state machine: a fixed, forward-only
//! sequence `placed → processing → shipped → delivered`. The only transition
//! is [`OrderStatus::next`]; nothing moves backwards or skips a stage.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a status label is not one of the known stages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown order status: {0}")]
pub struct StatusParseError(pub String);

/// Shipment progress of an order.
///
/// Records written by an older checkout used the label `"pending"` for new
/// orders; it is read as [`OrderStatus::Placed`] and never written.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Order has been submitted (initial stage).
    #[default]
    #[serde(alias = "pending")]
    Placed,
    /// Order is being packed.
    Processing,
    /// Order has left the shop.
    Shipped,
    /// Order reached the customer (terminal stage).
    Delivered,
}

impl OrderStatus {
    /// Every stage, in order.
    pub const STAGES: [Self; 4] = [
        Self::Placed,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
    ];

    /// The stage every new order starts in.
    pub const INITIAL: Self = Self::Placed;

    /// The stage after which no advance is possible.
    pub const TERMINAL: Self = Self::Delivered;

    /// The stage immediately following this one, or `None` at the terminal stage.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Placed => Some(Self::Processing),
            Self::Processing => Some(Self::Shipped),
            Self::Shipped => Some(Self::Delivered),
            Self::Delivered => None,
        }
    }

    /// Whether this is the terminal stage.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered)
    }

    /// Zero-based position in [`Self::STAGES`].
    #[must_use]
    pub const fn position(self) -> usize {
        self as usize
    }

    /// Persisted label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Placed => "placed",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
        }
    }

    /// Progress timeline for display: each stage with whether it has been reached.
    #[must_use]
    pub fn timeline(self) -> Vec<TimelineStep> {
        Self::STAGES
            .iter()
            .map(|&stage| TimelineStep {
                stage,
                reached: stage.position() <= self.position(),
            })
            .collect()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = StatusParseError;

    /// Parses one of the four stage labels.
    ///
    /// The legacy `"pending"` label is deliberately rejected here: callers that
    /// pass a status they observed must pass one of the canonical stages.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "placed" => Ok(Self::Placed),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            other => Err(StatusParseError(other.to_owned())),
        }
    }
}

/// One entry of an order's status timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimelineStep {
    /// The stage.
    pub stage: OrderStatus,
    /// Whether the order has reached (or passed) this stage.
    pub reached: bool,
}

/// Role stored on a user profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Customer.
    #[default]
    User,
    /// Back-office operator.
    Admin,
}

impl UserRole {
    /// Whether this role may use the admin back office.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid user role: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_next_is_consecutive() {
        assert_eq!(OrderStatus::Placed.next(), Some(OrderStatus::Processing));
        assert_eq!(OrderStatus::Processing.next(), Some(OrderStatus::Shipped));
        assert_eq!(OrderStatus::Shipped.next(), Some(OrderStatus::Delivered));
        assert_eq!(OrderStatus::Delivered.next(), None);
    }

    #[test]
    fn test_next_never_skips_or_regresses() {
        for stage in OrderStatus::STAGES {
            if let Some(next) = stage.next() {
                assert_eq!(next.position(), stage.position() + 1);
            } else {
                assert!(stage.is_terminal());
            }
        }
    }

    #[test]
    fn test_walk_from_initial_visits_every_stage_once() {
        let mut visited = vec![OrderStatus::INITIAL];
        let mut current = OrderStatus::INITIAL;
        while let Some(next) = current.next() {
            visited.push(next);
            current = next;
        }
        assert_eq!(visited, OrderStatus::STAGES.to_vec());
        assert_eq!(current, OrderStatus::TERMINAL);
    }

    #[test]
    fn test_parse_known_and_unknown() {
        assert_eq!("shipped".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        assert!("pending".parse::<OrderStatus>().is_err());
        assert!("SHIPPED".parse::<OrderStatus>().is_err());
        assert!("".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_serde_labels() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Processing).unwrap(),
            "\"processing\""
        );
        let legacy: OrderStatus = serde_json::from_str("\"pending\"").unwrap();
        assert_eq!(legacy, OrderStatus::Placed);
        assert_eq!(serde_json::to_string(&legacy).unwrap(), "\"placed\"");
    }

    #[test]
    fn test_timeline() {
        let timeline = OrderStatus::Processing.timeline();
        let reached: Vec<bool> = timeline.iter().map(|s| s.reached).collect();
        assert_eq!(reached, vec![true, true, false, false]);
    }

    #[test]
    fn test_user_role_roundtrip() {
        assert_eq!("admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert!("owner".parse::<UserRole>().is_err());
        assert_eq!(UserRole::default(), UserRole::User);
        assert!(UserRole::Admin.is_admin());
    }
}
