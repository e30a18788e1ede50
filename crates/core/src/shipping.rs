use serde::{Deserialize, Serialize};

use crate::money::{round2, usd};
use crate::types::Zone;

pub const DEFAULT_BASE_RATE: f64 = 9.99;

fn default_base_rate() -> f64 {
    DEFAULT_BASE_RATE
}

fn default_zone_label() -> String {
    Zone::Standard.as_str().to_string()
}

/// Shipping inputs; every field is optional on the wire.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ShippingInput {
    #[serde(default = "default_base_rate")]
    pub base_rate: f64,
    #[serde(default)]
    pub weight_surcharge: f64,
    #[serde(default)]
    pub distance_fee: f64,
    #[serde(default = "default_zone_label")]
    pub destination_zone: String,
}

impl Default for ShippingInput {
    fn default() -> Self {
        Self {
            base_rate: DEFAULT_BASE_RATE,
            weight_surcharge: 0.0,
            distance_fee: 0.0,
            destination_zone: default_zone_label(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShippingQuote {
    pub base_rate: f64,
    pub weight_surcharge: f64,
    pub distance_fee: f64,
    /// Echo of the requested label, even when it resolved to the default zone.
    pub destination_zone: String,
    pub zone_multiplier: f64,
    pub shipping_cost: f64,
    pub breakdown: String,
    pub estimated_delivery: &'static str,
}

pub fn quote_shipping(input: ShippingInput) -> ShippingQuote {
    let zone = Zone::parse(&input.destination_zone);
    let multiplier = zone.shipping_multiplier();
    let subtotal = input.base_rate + input.weight_surcharge + input.distance_fee;
    let final_cost = subtotal * multiplier;

    let breakdown = format!(
        "Base Rate: {} + Weight: {} + Distance: {} = {} × {} ({}) = {}",
        usd(input.base_rate),
        usd(input.weight_surcharge),
        usd(input.distance_fee),
        usd(subtotal),
        multiplier,
        input.destination_zone,
        usd(round2(final_cost)),
    );

    ShippingQuote {
        base_rate: input.base_rate,
        weight_surcharge: input.weight_surcharge,
        distance_fee: input.distance_fee,
        zone_multiplier: multiplier,
        shipping_cost: round2(final_cost),
        breakdown,
        estimated_delivery: zone.estimated_delivery(),
        destination_zone: input.destination_zone,
    }
}
