//! Fixed-choice slash command parameters mapped onto the entity enums.

use crate::entities::{MembershipTier, OrderStatus, ReturnStatus};

/// Membership tier as a Discord choice.
#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum TierChoice {
    /// Regular customer
    Normal,
    /// Paid membership
    Premium,
    /// Top tier
    Gold,
}

impl From<TierChoice> for MembershipTier {
    fn from(choice: TierChoice) -> Self {
        match choice {
            TierChoice::Normal => Self::Normal,
            TierChoice::Premium => Self::Premium,
            TierChoice::Gold => Self::Gold,
        }
    }
}

/// Order status as a Discord choice.
#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum OrderStatusChoice {
    /// Placed, not yet worked on
    Pending,
    /// Being prepared
    Processing,
    /// Handed to the carrier
    Shipped,
    /// Received by the customer
    Delivered,
    /// Withdrawn or refunded
    Cancelled,
}

impl From<OrderStatusChoice> for OrderStatus {
    fn from(choice: OrderStatusChoice) -> Self {
        match choice {
            OrderStatusChoice::Pending => Self::Pending,
            OrderStatusChoice::Processing => Self::Processing,
            OrderStatusChoice::Shipped => Self::Shipped,
            OrderStatusChoice::Delivered => Self::Delivered,
            OrderStatusChoice::Cancelled => Self::Cancelled,
        }
    }
}

/// Return status as a Discord choice.
#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum ReturnStatusChoice {
    /// Awaiting review
    Pending,
    /// Accepted
    Approved,
    /// Declined
    Rejected,
    /// Refund or replacement handled
    Processed,
}

impl From<ReturnStatusChoice> for ReturnStatus {
    fn from(choice: ReturnStatusChoice) -> Self {
        match choice {
            ReturnStatusChoice::Pending => Self::Pending,
            ReturnStatusChoice::Approved => Self::Approved,
            ReturnStatusChoice::Rejected => Self::Rejected,
            ReturnStatusChoice::Processed => Self::Processed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choices_map_onto_entity_enums() {
        assert_eq!(MembershipTier::from(TierChoice::Gold), MembershipTier::Gold);
        assert_eq!(
            OrderStatus::from(OrderStatusChoice::Shipped),
            OrderStatus::Shipped
        );
        assert_eq!(
            ReturnStatus::from(ReturnStatusChoice::Processed),
            ReturnStatus::Processed
        );
    }
}
