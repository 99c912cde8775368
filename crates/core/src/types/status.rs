//! Status enums for orders and contact messages.

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Stable string form used in the database and the API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether moving an unpaid order into this status marks it paid.
    ///
    /// Card and PayPal orders are charged when fulfilment starts, so
    /// `processing` settles them. Cash orders settle on hand-over, so
    /// `delivered` settles those instead.
    #[must_use]
    pub const fn settles_payment(self, method: PaymentMethod, already_paid: bool) -> bool {
        if already_paid {
            return false;
        }

        match self {
            Self::Processing => !matches!(method, PaymentMethod::Cash),
            Self::Delivered => matches!(method, PaymentMethod::Cash),
            Self::Pending | Self::Shipped | Self::Cancelled => false,
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(UnknownVariant {
                kind: "order status",
                value: other.to_owned(),
            }),
        }
    }
}

/// How an order is paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Paypal,
    Card,
}

impl PaymentMethod {
    /// Stable string form used in the database and the API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Paypal => "paypal",
            Self::Card => "card",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(Self::Cash),
            "paypal" => Ok(Self::Paypal),
            "card" => Ok(Self::Card),
            other => Err(UnknownVariant {
                kind: "payment method",
                value: other.to_owned(),
            }),
        }
    }
}

/// Contact message triage status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
    #[default]
    New,
    Read,
    Responded,
}

impl ContactStatus {
    /// Stable string form used in the database and the API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Read => "read",
            Self::Responded => "responded",
        }
    }
}

impl std::str::FromStr for ContactStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "read" => Ok(Self::Read),
            "responded" => Ok(Self::Responded),
            other => Err(UnknownVariant {
                kind: "contact status",
                value: other.to_owned(),
            }),
        }
    }
}

/// Error returned when parsing a status string the system doesn't know.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    /// Which enum was being parsed.
    pub kind: &'static str,
    /// The offending input.
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settles_payment_processing_non_cash() {
        assert!(OrderStatus::Processing.settles_payment(PaymentMethod::Card, false));
        assert!(OrderStatus::Processing.settles_payment(PaymentMethod::Paypal, false));
        assert!(!OrderStatus::Processing.settles_payment(PaymentMethod::Cash, false));
    }

    #[test]
    fn test_settles_payment_delivered_cash_only() {
        assert!(OrderStatus::Delivered.settles_payment(PaymentMethod::Cash, false));
        assert!(!OrderStatus::Delivered.settles_payment(PaymentMethod::Card, false));
        assert!(!OrderStatus::Delivered.settles_payment(PaymentMethod::Paypal, false));
    }

    #[test]
    fn test_settles_payment_never_twice() {
        assert!(!OrderStatus::Processing.settles_payment(PaymentMethod::Card, true));
        assert!(!OrderStatus::Delivered.settles_payment(PaymentMethod::Cash, true));
    }

    #[test]
    fn test_settles_payment_neutral_statuses() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Shipped,
            OrderStatus::Cancelled,
        ] {
            for method in [
                PaymentMethod::Cash,
                PaymentMethod::Paypal,
                PaymentMethod::Card,
            ] {
                assert!(!status.settles_payment(method, false));
            }
        }
    }

    #[test]
    fn test_status_round_trip() {
        for s in ["pending", "processing", "shipped", "delivered", "cancelled"] {
            let parsed: OrderStatus = s.parse().expect("known status");
            assert_eq!(parsed.as_str(), s);
        }
        assert!("paid".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_serde_uses_lowercase() {
        let json = serde_json::to_string(&OrderStatus::Processing).expect("serialize");
        assert_eq!(json, "\"processing\"");
        let json = serde_json::to_string(&PaymentMethod::Paypal).expect("serialize");
        assert_eq!(json, "\"paypal\"");
        let json = serde_json::to_string(&ContactStatus::New).expect("serialize");
        assert_eq!(json, "\"new\"");
    }
}
