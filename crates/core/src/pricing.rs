use serde::{Deserialize, Serialize};

use crate::money::{round2, usd};

/// Components of an order total as submitted by the client.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceInput {
    pub item_price: f64,
    pub tax_amount: f64,
    #[serde(default)]
    pub shipping_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceQuote {
    pub total: f64,
    pub breakdown: String,
    pub components: PriceInput,
}

/// Sums item, tax and shipping into a rounded total with a readable breakdown.
pub fn quote_price(input: PriceInput) -> PriceQuote {
    let total = round2(input.item_price + input.tax_amount + input.shipping_amount);
    let breakdown = format!(
        "Item: {} + Tax: {} + Shipping: {} = {}",
        usd(input.item_price),
        usd(input.tax_amount),
        usd(input.shipping_amount),
        usd(total),
    );

    PriceQuote {
        total,
        breakdown,
        components: input,
    }
}
