use serde::{Deserialize, Serialize};

/// One simulated order-creation request body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPayload {
    pub customer_id: u32,
    pub items: Vec<LineItem>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub item_id: String,
    pub quantity: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_format() {
        let payload = OrderPayload {
            customer_id: 42,
            items: vec![
                LineItem {
                    item_id: "item-a".to_string(),
                    quantity: 3,
                },
                LineItem {
                    item_id: "item-b".to_string(),
                    quantity: 1,
                },
            ],
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "customer_id": 42,
                "items": [
                    {"item_id": "item-a", "quantity": 3},
                    {"item_id": "item-b", "quantity": 1},
                ]
            })
        );
    }
}
