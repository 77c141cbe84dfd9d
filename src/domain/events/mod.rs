//! Domain events
use crate::domain::aggregates::order::OrderStatus;
use crate::domain::value_objects::Money;
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum DomainEvent {
    Product(ProductEvent),
    Order(OrderEvent),
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ProductEvent {
    #[serde(rename_all = "camelCase")]
    Deleted { product_id: Uuid },
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OrderEvent {
    #[serde(rename_all = "camelCase")]
    Placed { order_id: Uuid, user_id: String, total: Money },
    #[serde(rename_all = "camelCase")]
    StatusChanged { order_id: Uuid, from: OrderStatus, to: OrderStatus },
}

impl DomainEvent {
    /// Message-bus subject the event is published on.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Product(ProductEvent::Deleted { .. }) => "storefront.products.deleted",
            Self::Order(OrderEvent::Placed { .. }) => "storefront.orders.placed",
            Self::Order(OrderEvent::StatusChanged { .. }) => "storefront.orders.status_changed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_payload() {
        let event = DomainEvent::Order(OrderEvent::StatusChanged { order_id: Uuid::nil(), from: OrderStatus::Confirmed, to: OrderStatus::Shipped });
        assert_eq!(event.subject(), "storefront.orders.status_changed");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "statusChanged");
        assert_eq!(json["to"], "shipped");
    }
}
