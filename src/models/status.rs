use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status shared by service and function records.
///
/// The declaration order is significant: it encodes deployment progress, from
/// failed (`Error`) to fully torn down (`Terminated`). Aggregation takes the
/// minimum of this order, so variants must never be reordered.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Error,
    #[default]
    Null,
    Initializing,
    Inactive,
    Scaling,
    Active,
    Terminated,
}

impl Status {
    /// Every status, in aggregation order.
    pub const ALL: [Status; 7] = [
        Self::Error,
        Self::Null,
        Self::Initializing,
        Self::Inactive,
        Self::Scaling,
        Self::Active,
        Self::Terminated,
    ];

    /// Position in the aggregation order.
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// Identity element of the aggregation (minimum over an empty set).
    pub fn terminal() -> Self {
        Self::Terminated
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Terminated)
    }

    /// Fold a set of statuses into the worst / least complete one.
    pub fn aggregate<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = Status>,
    {
        statuses.into_iter().fold(Self::terminal(), Self::min)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Error => "ERROR",
            Self::Null => "NULL",
            Self::Initializing => "INITIALIZING",
            Self::Inactive => "INACTIVE",
            Self::Scaling => "SCALING",
            Self::Active => "ACTIVE",
            Self::Terminated => "TERMINATED",
        };
        write!(f, "{name}")
    }
}

impl std::str::FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Invalid status: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_is_declaration_order() {
        assert!(Status::Error < Status::Null);
        assert!(Status::Null < Status::Initializing);
        assert!(Status::Scaling < Status::Active);
        assert!(Status::Active < Status::Terminated);
        assert_eq!(Status::Error.ordinal(), 0);
        assert_eq!(Status::Terminated.ordinal(), 6);
    }

    #[test]
    fn test_aggregate_takes_minimum() {
        assert_eq!(Status::aggregate([]), Status::Terminated);
        assert_eq!(
            Status::aggregate([Status::Active, Status::Active, Status::Terminated]),
            Status::Active
        );
        assert_eq!(
            Status::aggregate([Status::Active, Status::Error, Status::Initializing]),
            Status::Error
        );
    }

    #[test]
    fn test_status_string_conversion() {
        assert_eq!(Status::Initializing.to_string(), "INITIALIZING");
        assert_eq!("active".parse::<Status>().unwrap(), Status::Active);
        assert!("RUNNING".parse::<Status>().is_err());

        let json = serde_json::to_string(&Status::Terminated).unwrap();
        assert_eq!(json, "\"TERMINATED\"");
    }
}
