//! Account and goal shapes the core needs from the backend.
//!
//! Only the fields that feed routing and onboarding live here; everything else
//! (coaching preferences, billing details) stays in the backend.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    PastDue,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: String,
    pub subscription_status: SubscriptionStatus,
    /// Customer id at the payment provider, present once payment setup ran.
    pub payment_customer_id: Option<String>,
}

impl UserAccount {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            subscription_status: SubscriptionStatus::Cancelled,
            payment_customer_id: None,
        }
    }

    pub fn with_subscription(mut self, status: SubscriptionStatus, customer_id: impl Into<String>) -> Self {
        self.subscription_status = status;
        self.payment_customer_id = Some(customer_id.into());
        self
    }

    /// Payment counts only with a customer on file AND an active subscription.
    pub fn has_active_payment(&self) -> bool {
        self.payment_customer_id.is_some() && self.subscription_status == SubscriptionStatus::Active
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Active,
    Completed,
    Abandoned,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub description: String,
    pub is_primary: bool,
    pub status: GoalStatus,
}

impl Goal {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            is_primary: false,
            status: GoalStatus::Active,
        }
    }

    pub fn primary(mut self) -> Self {
        self.is_primary = true;
        self
    }

    pub fn with_status(mut self, status: GoalStatus) -> Self {
        self.status = status;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_payment_needs_customer_and_active_status() {
        assert!(!UserAccount::new("u1").has_active_payment());

        let paid = UserAccount::new("u1").with_subscription(SubscriptionStatus::Active, "cus_1");
        assert!(paid.has_active_payment());

        let late = UserAccount::new("u1").with_subscription(SubscriptionStatus::PastDue, "cus_1");
        assert!(!late.has_active_payment());

        let mut no_customer = paid.clone();
        no_customer.payment_customer_id = None;
        assert!(!no_customer.has_active_payment());
    }

    #[test]
    fn test_status_wire_names() {
        let json = serde_json::to_string(&SubscriptionStatus::PastDue).unwrap();
        assert_eq!(json, "\"past_due\"");
        let g: GoalStatus = serde_json::from_str("\"abandoned\"").unwrap();
        assert_eq!(g, GoalStatus::Abandoned);
    }
}
