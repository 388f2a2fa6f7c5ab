use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub cart_item_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub unit_price: f64,
    pub quantity: u32,
    pub total: f64,
    #[serde(default)]
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub cart_id: i64,
    pub member_id: String,
    pub created_date: String,
    #[serde(default)]
    pub cart_items: Vec<CartItem>,
    pub total_quantity: u32,
    pub total_price: f64,
}
