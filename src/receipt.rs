//! The receipt generator exposed to the model as `generate_receipt`.
//!
//! Receipts deliberately carry no total: the model has to add up the item
//! prices itself.

use async_trait::async_trait;
use rand::Rng;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::tools::{LocalTool, ToolError};

pub const MIN_ITEMS: u32 = 1;
pub const MAX_ITEMS: u32 = 10;

/// Price bounds in cents, inclusive.
const MIN_PRICE_CENTS: i64 = 100;
const MAX_PRICE_CENTS: i64 = 10_000;

/// System prompt sent with every run unless the caller configures another.
pub const SYSTEM_PROMPT: &str = "When you call the receipt tool it will return item names and prices. \
                                 You must sum those prices yourself and report back the total.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub order_id: String,
    pub num_items: u32,
    pub items: Vec<LineItem>,
}

impl Receipt {
    /// Sum of all item prices. Never serialized.
    pub fn total(&self) -> Decimal {
        self.items.iter().map(|item| item.price).sum()
    }
}

/// Generate a receipt with 1 to 10 items priced between $1.00 and $100.00.
///
/// The shape is fixed; counts and prices are random on every call.
pub fn generate_receipt(order_id: &str) -> Receipt {
    let mut rng = rand::rng();
    let num_items = rng.random_range(MIN_ITEMS..=MAX_ITEMS);
    let items = (1..=num_items)
        .map(|i| LineItem {
            name: format!("item_{i}"),
            price: Decimal::new(rng.random_range(MIN_PRICE_CENTS..=MAX_PRICE_CENTS), 2),
        })
        .collect();

    let receipt = Receipt {
        order_id: order_id.to_string(),
        num_items,
        items,
    };
    debug!("generate_receipt returns: {:?}", receipt);
    receipt
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ReceiptArgs {
    /// The order ID to generate a receipt for.
    pub order_id: String,
}

/// `generate_receipt` as a registrable tool.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReceiptTool;

#[async_trait]
impl LocalTool for ReceiptTool {
    type Input = ReceiptArgs;
    type Output = Receipt;

    fn name(&self) -> &str {
        "generate_receipt"
    }

    fn description(&self) -> &str {
        "Generate a random receipt for the given order_id. \
         Returns the number of items and a list of {name, price}; \
         the model must sum the prices to compute the final total."
    }

    async fn call(&self, input: ReceiptArgs) -> Result<Receipt, ToolError> {
        Ok(generate_receipt(&input.order_id))
    }
}
