use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn generate() -> Self {
        Self(format!("PROD-{}", Uuid::new_v4().simple()))
    }
}

pub const DEFAULT_UNIT: &str = "m²";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub original_price: Decimal,
    pub promotional_price: Decimal,
    pub unit: String,
    /// Featured products are the ones the bot shows in its catalog message.
    pub featured: bool,
    pub image_url: Option<String>,
    pub stock: i64,
}

impl Product {
    /// One catalog line in the form used by agent reply suggestions.
    pub fn context_line(&self) -> String {
        format!(
            "- {} ({}): R$ {} (De: R$ {})",
            self.name,
            self.category,
            self.promotional_price.normalize(),
            self.original_price.normalize()
        )
    }
}
