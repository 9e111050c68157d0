//! Status vocabularies for orders, payments, returns, and refunds.
//!
//! Each enum carries its legal-transition table as a `can_become` predicate.
//! The server refuses any update that is not a legal edge, so a row can never
//! be driven into a state its history does not support. Setting a status to
//! its current value is not a transition and is handled by callers as a
//! no-op.
//!
//! All statuses persist as lowercase `snake_case` TEXT and round-trip through
//! `Display`/`FromStr`.

use serde::{Deserialize, Serialize};

/// How an order is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash on delivery: payment stays pending until the order is delivered.
    Cod,
    Stripe,
    Razorpay,
}

impl PaymentMethod {
    /// Whether this method settles through an online gateway before shipping.
    #[must_use]
    pub const fn is_online(&self) -> bool {
        matches!(self, Self::Stripe | Self::Razorpay)
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cod => write!(f, "cod"),
            Self::Stripe => write!(f, "stripe"),
            Self::Razorpay => write!(f, "razorpay"),
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accepts the legacy wire spellings ("COD", "Stripe", "Razorpay")
        match s.to_ascii_lowercase().as_str() {
            "cod" => Ok(Self::Cod),
            "stripe" => Ok(Self::Stripe),
            "razorpay" => Ok(Self::Razorpay),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

/// Payment settlement status for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    /// Whether moving to `next` is a legal transition.
    ///
    /// `failed -> completed` is allowed so a customer can retry verification
    /// after a declined attempt. `completed` is terminal.
    #[must_use]
    pub const fn can_become(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Completed | Self::Failed) | (Self::Failed, Self::Completed)
        )
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("invalid payment status: {s}")),
        }
    }
}

/// Fulfillment status for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Whether moving to `next` is a legal transition.
    ///
    /// Cancellation is only possible before the order ships. `delivered` and
    /// `cancelled` are terminal.
    #[must_use]
    pub const fn can_become(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Processing, Self::Shipped | Self::Cancelled) | (Self::Shipped, Self::Delivered)
        )
    }

    /// Whether the order has reached a terminal state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Processing => write!(f, "processing"),
            Self::Shipped => write!(f, "shipped"),
            Self::Delivered => write!(f, "delivered"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// Return-request status for a delivered order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReturnStatus {
    #[default]
    NotRequested,
    Requested,
    Approved,
    Rejected,
}

impl ReturnStatus {
    /// Whether moving to `next` is a legal transition.
    #[must_use]
    pub const fn can_become(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::NotRequested, Self::Requested)
                | (Self::Requested, Self::Approved | Self::Rejected)
        )
    }
}

impl std::fmt::Display for ReturnStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotRequested => write!(f, "not_requested"),
            Self::Requested => write!(f, "requested"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

impl std::str::FromStr for ReturnStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_requested" => Ok(Self::NotRequested),
            "requested" => Ok(Self::Requested),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(format!("invalid return status: {s}")),
        }
    }
}

/// Refund progress for an order whose return was approved (or that was
/// cancelled after payment).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RefundStatus {
    #[default]
    NotInitiated,
    Initiated,
    Completed,
    Failed,
}

impl RefundStatus {
    /// Whether moving to `next` is a legal transition.
    ///
    /// `failed -> initiated` allows retrying a refund that bounced.
    #[must_use]
    pub const fn can_become(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::NotInitiated, Self::Initiated)
                | (Self::Initiated, Self::Completed | Self::Failed)
                | (Self::Failed, Self::Initiated)
        )
    }
}

impl std::fmt::Display for RefundStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotInitiated => write!(f, "not_initiated"),
            Self::Initiated => write!(f, "initiated"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for RefundStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_initiated" => Ok(Self::NotInitiated),
            "initiated" => Ok(Self::Initiated),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("invalid refund status: {s}")),
        }
    }
}

/// Admin role with different permission levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    /// Full access including admin-user management.
    SuperAdmin,
    /// Full access to store management features.
    Admin,
    /// Read-only access to store data.
    Viewer,
}

impl AdminRole {
    /// Whether this role may mutate store data.
    #[must_use]
    pub const fn can_write(&self) -> bool {
        !matches!(self, Self::Viewer)
    }
}

impl std::fmt::Display for AdminRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SuperAdmin => write!(f, "super_admin"),
            Self::Admin => write!(f, "admin"),
            Self::Viewer => write!(f, "viewer"),
        }
    }
}

impl std::str::FromStr for AdminRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "super_admin" => Ok(Self::SuperAdmin),
            "admin" => Ok(Self::Admin),
            "viewer" => Ok(Self::Viewer),
            _ => Err(format!("invalid admin role: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_method_parse_legacy_spellings() {
        assert_eq!("COD".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cod);
        assert_eq!(
            "Stripe".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::Stripe
        );
        assert_eq!(
            "Razorpay".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::Razorpay
        );
        assert!("check".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_payment_method_online() {
        assert!(!PaymentMethod::Cod.is_online());
        assert!(PaymentMethod::Stripe.is_online());
        assert!(PaymentMethod::Razorpay.is_online());
    }

    #[test]
    fn test_payment_status_transitions() {
        use PaymentStatus::{Completed, Failed, Pending};

        assert!(Pending.can_become(Completed));
        assert!(Pending.can_become(Failed));
        assert!(Failed.can_become(Completed));

        // completed is terminal
        assert!(!Completed.can_become(Pending));
        assert!(!Completed.can_become(Failed));
        // no path back to pending
        assert!(!Failed.can_become(Pending));
    }

    #[test]
    fn test_order_status_transitions() {
        use OrderStatus::{Cancelled, Delivered, Processing, Shipped};

        assert!(Processing.can_become(Shipped));
        assert!(Processing.can_become(Cancelled));
        assert!(Shipped.can_become(Delivered));

        // cannot cancel once shipped
        assert!(!Shipped.can_become(Cancelled));
        // cannot skip the shipped step
        assert!(!Processing.can_become(Delivered));
        // terminal states
        for next in [Processing, Shipped, Delivered, Cancelled] {
            assert!(!Delivered.can_become(next));
            assert!(!Cancelled.can_become(next));
        }
        assert!(Delivered.is_terminal());
        assert!(Cancelled.is_terminal());
        assert!(!Processing.is_terminal());
        assert!(!Shipped.is_terminal());
    }

    #[test]
    fn test_return_status_transitions() {
        use ReturnStatus::{Approved, NotRequested, Rejected, Requested};

        assert!(NotRequested.can_become(Requested));
        assert!(Requested.can_become(Approved));
        assert!(Requested.can_become(Rejected));

        assert!(!NotRequested.can_become(Approved));
        assert!(!Approved.can_become(Rejected));
        assert!(!Rejected.can_become(Requested));
    }

    #[test]
    fn test_refund_status_transitions() {
        use RefundStatus::{Completed, Failed, Initiated, NotInitiated};

        assert!(NotInitiated.can_become(Initiated));
        assert!(Initiated.can_become(Completed));
        assert!(Initiated.can_become(Failed));
        assert!(Failed.can_become(Initiated));

        assert!(!NotInitiated.can_become(Completed));
        assert!(!Completed.can_become(Initiated));
    }

    #[test]
    fn test_status_text_round_trips() {
        for status in [
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.to_string().parse::<OrderStatus>().unwrap(), status);
        }
        for status in [
            ReturnStatus::NotRequested,
            ReturnStatus::Requested,
            ReturnStatus::Approved,
            ReturnStatus::Rejected,
        ] {
            assert_eq!(status.to_string().parse::<ReturnStatus>().unwrap(), status);
        }
        for status in [
            RefundStatus::NotInitiated,
            RefundStatus::Initiated,
            RefundStatus::Completed,
            RefundStatus::Failed,
        ] {
            assert_eq!(status.to_string().parse::<RefundStatus>().unwrap(), status);
        }
        for method in [
            PaymentMethod::Cod,
            PaymentMethod::Stripe,
            PaymentMethod::Razorpay,
        ] {
            assert_eq!(method.to_string().parse::<PaymentMethod>().unwrap(), method);
        }
    }

    #[test]
    fn test_admin_role_write_access() {
        assert!(AdminRole::SuperAdmin.can_write());
        assert!(AdminRole::Admin.can_write());
        assert!(!AdminRole::Viewer.can_write());
    }

    #[test]
    fn test_admin_role_round_trip() {
        for role in [AdminRole::SuperAdmin, AdminRole::Admin, AdminRole::Viewer] {
            assert_eq!(role.to_string().parse::<AdminRole>().unwrap(), role);
        }
        assert!("owner".parse::<AdminRole>().is_err());
    }
}
