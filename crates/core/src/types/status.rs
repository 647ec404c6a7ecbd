//! Order lifecycle and payment enums.
//!
//! Stored as `TEXT` columns using the `SCREAMING_SNAKE_CASE` names and parsed
//! back with `FromStr` at the repository boundary.
//!
//! ```text
//! PLACED ──► CONFIRMED ──► SHIPPED ──► DELIVERED
//!    │           │
//!    └─────┬─────┘
//!          ▼
//!      CANCELLED
//! ```

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a stored enum value is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value:?}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! text_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// The stored text representation.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(UnknownVariant {
                        kind: $kind,
                        value: s.to_owned(),
                    }),
                }
            }
        }
    };
}

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Placed,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

text_enum!(OrderStatus, "order status", {
    Placed => "PLACED",
    Confirmed => "CONFIRMED",
    Shipped => "SHIPPED",
    Delivered => "DELIVERED",
    Cancelled => "CANCELLED",
});

impl OrderStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Placed,
        Self::Confirmed,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Whether the owning customer may still cancel the order.
    #[must_use]
    pub const fn can_cancel(&self) -> bool {
        matches!(self, Self::Placed | Self::Confirmed)
    }

    /// Whether moving from `self` to `next` follows the lifecycle.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Placed, Self::Confirmed)
                | (Self::Confirmed, Self::Shipped)
                | (Self::Shipped, Self::Delivered)
                | (Self::Placed | Self::Confirmed, Self::Cancelled)
        )
    }

    /// Human-readable label for pages.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Placed => "Placed",
            Self::Confirmed => "Confirmed",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }
}

/// How the customer pays for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Cash on delivery.
    Cod,
    /// Paid through the online payment gateway.
    Online,
}

text_enum!(PaymentMethod, "payment method", {
    Cod => "COD",
    Online => "ONLINE",
});

impl PaymentMethod {
    /// Payment status a freshly placed order starts in.
    ///
    /// Online checkouts are treated as paid once the customer returns from
    /// the gateway; cash on delivery is collected later.
    #[must_use]
    pub const fn initial_payment_status(&self) -> PaymentStatus {
        match self {
            Self::Cod => PaymentStatus::Pending,
            Self::Online => PaymentStatus::Paid,
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Cod => "Cash on Delivery",
            Self::Online => "Online Payment",
        }
    }
}

/// Whether an order has been paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

text_enum!(PaymentStatus, "payment status", {
    Pending => "PENDING",
    Paid => "PAID",
});

/// Order progression performed by shop staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffAction {
    Confirm,
    Ship,
    Deliver,
}

impl StaffAction {
    /// Status the order moves to.
    #[must_use]
    pub const fn target(&self) -> OrderStatus {
        match self {
            Self::Confirm => OrderStatus::Confirmed,
            Self::Ship => OrderStatus::Shipped,
            Self::Deliver => OrderStatus::Delivered,
        }
    }

    /// Past-tense verb used in customer notifications.
    #[must_use]
    pub const fn past_tense(&self) -> &'static str {
        match self {
            Self::Confirm => "confirmed",
            Self::Ship => "shipped",
            Self::Deliver => "delivered",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_can_cancel() {
        assert!(OrderStatus::Placed.can_cancel());
        assert!(OrderStatus::Confirmed.can_cancel());
        assert!(!OrderStatus::Shipped.can_cancel());
        assert!(!OrderStatus::Delivered.can_cancel());
        assert!(!OrderStatus::Cancelled.can_cancel());
    }

    #[test]
    fn test_lifecycle_transitions() {
        use OrderStatus::*;

        assert!(Placed.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Delivered));
        assert!(Placed.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Cancelled));

        assert!(!Placed.can_transition_to(Shipped));
        assert!(!Shipped.can_transition_to(Cancelled));
        assert!(!Delivered.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Confirmed));
        assert!(!Delivered.can_transition_to(Placed));
    }

    #[test]
    fn test_cancellable_states_match_transitions() {
        for status in OrderStatus::ALL {
            assert_eq!(
                status.can_cancel(),
                status.can_transition_to(OrderStatus::Cancelled),
                "{status}"
            );
        }
    }

    #[test]
    fn test_text_roundtrip() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert_eq!("COD".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cod);
        assert_eq!("PAID".parse::<PaymentStatus>().unwrap(), PaymentStatus::Paid);
    }

    #[test]
    fn test_unknown_text() {
        let err = "placed".parse::<OrderStatus>().unwrap_err();
        assert_eq!(err.kind, "order status");
        assert!("CARD".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_initial_payment_status() {
        assert_eq!(
            PaymentMethod::Cod.initial_payment_status(),
            PaymentStatus::Pending
        );
        assert_eq!(
            PaymentMethod::Online.initial_payment_status(),
            PaymentStatus::Paid
        );
    }

    #[test]
    fn test_staff_action_targets() {
        assert_eq!(StaffAction::Confirm.target(), OrderStatus::Confirmed);
        assert_eq!(StaffAction::Ship.target(), OrderStatus::Shipped);
        assert_eq!(StaffAction::Deliver.target(), OrderStatus::Delivered);
    }
}
