//! Server-side order quote: location, then shipping, then price.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::Catalog;
use crate::inventory::InventoryRegistry;
use crate::money::{round2, usd};
use crate::pricing::{quote_price, PriceInput};
use crate::shipping::{quote_shipping, ShippingInput, DEFAULT_BASE_RATE};
use crate::types::LocationRecord;

/// Weight surcharge added per cart line.
pub const PER_LINE_SURCHARGE: f64 = 2.5;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CartLine {
    pub product_id: u32,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckoutRequest {
    pub items: Vec<CartLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteLine {
    pub product_id: u32,
    pub name: &'static str,
    pub unit_price: f64,
    pub quantity: u32,
    pub line_total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckoutQuote {
    pub customer_ip: String,
    pub location: LocationRecord,
    pub lines: Vec<QuoteLine>,
    pub subtotal: f64,
    pub tax: f64,
    pub shipping: f64,
    pub free_shipping: bool,
    pub total: f64,
    pub estimated_delivery: &'static str,
    pub breakdown: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("cart must contain at least one item")]
    EmptyCart,
    #[error("quantity for product {0} must be at least 1")]
    InvalidQuantity(u32),
    #[error("product {0} not found")]
    ProductNotFound(u32),
    #[error("only {available} units of product {product_id} in stock, {requested} requested")]
    InsufficientStock {
        product_id: u32,
        requested: u64,
        available: i64,
    },
}

/// Prices a cart for a customer at `location`.
///
/// Subtotals strictly above `free_shipping_threshold` ship for free; otherwise
/// shipping is the standard rate plus a per-line surcharge, scaled by the
/// location's zone.
///
/// Quantities for the same product are summed across lines and must not
/// exceed the stock currently held in `inventory`.
pub fn quote_checkout(
    catalog: &Catalog,
    inventory: &InventoryRegistry,
    customer_ip: String,
    location: LocationRecord,
    request: &CheckoutRequest,
    free_shipping_threshold: f64,
) -> Result<CheckoutQuote, CheckoutError> {
    if request.items.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let mut lines = Vec::with_capacity(request.items.len());
    let mut requested: BTreeMap<u32, u64> = BTreeMap::new();
    let mut subtotal = 0.0;
    for line in &request.items {
        if line.quantity == 0 {
            return Err(CheckoutError::InvalidQuantity(line.product_id));
        }
        let product = catalog
            .get(line.product_id)
            .ok_or(CheckoutError::ProductNotFound(line.product_id))?;
        *requested.entry(product.id).or_default() += u64::from(line.quantity);
        let line_total = product.price * f64::from(line.quantity);
        subtotal += line_total;
        lines.push(QuoteLine {
            product_id: product.id,
            name: product.name,
            unit_price: product.price,
            quantity: line.quantity,
            line_total: round2(line_total),
        });
    }

    for (&product_id, &quantity) in &requested {
        let available = inventory.stock_of(product_id).unwrap_or(0);
        if i128::from(quantity) > i128::from(available) {
            return Err(CheckoutError::InsufficientStock {
                product_id,
                requested: quantity,
                available,
            });
        }
    }

    let tax = subtotal * location.tax_rate;
    let zone = location.shipping_zone;
    let free_shipping = subtotal > free_shipping_threshold;
    let shipping = if free_shipping {
        0.0
    } else {
        quote_shipping(ShippingInput {
            base_rate: DEFAULT_BASE_RATE,
            weight_surcharge: PER_LINE_SURCHARGE * lines.len() as f64,
            distance_fee: 0.0,
            destination_zone: zone.as_str().to_string(),
        })
        .shipping_cost
    };

    let price = quote_price(PriceInput {
        item_price: subtotal,
        tax_amount: tax,
        shipping_amount: shipping,
    });
    let breakdown = format!(
        "Subtotal: {} + Tax ({:.2}%): {} + Shipping: {} = Total: {}",
        usd(subtotal),
        location.tax_rate * 100.0,
        usd(tax),
        usd(shipping),
        usd(price.total),
    );

    Ok(CheckoutQuote {
        customer_ip,
        location,
        lines,
        subtotal: round2(subtotal),
        tax: round2(tax),
        shipping,
        free_shipping,
        total: price.total,
        estimated_delivery: zone.estimated_delivery(),
        breakdown,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::{locate, LOOPBACK_ADDR};

    fn cart(lines: &[(u32, u32)]) -> CheckoutRequest {
        CheckoutRequest {
            items: lines
                .iter()
                .map(|&(product_id, quantity)| CartLine {
                    product_id,
                    quantity,
                })
                .collect(),
        }
    }

    #[test]
    fn large_order_ships_free() {
        let quote = quote_checkout(
            &Catalog::seeded(),
            &InventoryRegistry::seeded(),
            LOOPBACK_ADDR.to_string(),
            locate(LOOPBACK_ADDR),
            &cart(&[(1, 1)]),
            100.0,
        )
        .expect("quote");

        assert!(quote.free_shipping);
        assert_eq!(quote.subtotal, 299.99);
        assert_eq!(quote.tax, 26.25);
        assert_eq!(quote.shipping, 0.0);
        assert_eq!(quote.total, 326.24);
        assert_eq!(quote.estimated_delivery, "1-2 business days");
        assert_eq!(
            quote.breakdown,
            "Subtotal: $299.99 + Tax (8.75%): $26.25 + Shipping: $0.00 = Total: $326.24"
        );
    }

    #[test]
    fn small_order_pays_zone_shipping() {
        let quote = quote_checkout(
            &Catalog::seeded(),
            &InventoryRegistry::seeded(),
            "10.0.0.8".to_string(),
            locate("10.0.0.8"),
            &cart(&[(3, 1)]),
            100.0,
        )
        .expect("quote");

        assert!(!quote.free_shipping);
        assert_eq!(quote.tax, 2.0);
        assert_eq!(quote.shipping, 14.99);
        assert_eq!(quote.total, 41.98);
        assert_eq!(quote.estimated_delivery, "2-3 business days");
    }

    #[test]
    fn surcharge_scales_with_line_count() {
        let quote = quote_checkout(
            &Catalog::seeded(),
            &InventoryRegistry::seeded(),
            LOOPBACK_ADDR.to_string(),
            locate(LOOPBACK_ADDR),
            &cart(&[(3, 1), (6, 1)]),
            100.0,
        )
        .expect("quote");

        assert_eq!(quote.subtotal, 74.98);
        assert_eq!(quote.shipping, 14.99);
        assert_eq!(quote.lines.len(), 2);
    }

    #[test]
    fn threshold_is_exclusive() {
        let inventory = InventoryRegistry::seeded();
        let request = cart(&[(3, 4)]);
        let exact_subtotal = 24.99 * 4.0;
        let at_threshold = quote_checkout(
            &Catalog::seeded(),
            &InventoryRegistry::seeded(),
            LOOPBACK_ADDR.to_string(),
            locate(LOOPBACK_ADDR),
            &request,
            exact_subtotal,
        )
        .expect("quote");
        assert!(!at_threshold.free_shipping);
        assert_eq!(at_threshold.subtotal, 99.96);

        let below_threshold = quote_checkout(
            &Catalog::seeded(),
            &InventoryRegistry::seeded(),
            LOOPBACK_ADDR.to_string(),
            locate(LOOPBACK_ADDR),
            &request,
            50.0,
        )
        .expect("quote");
        assert!(below_threshold.free_shipping);
    }

    #[test]
    fn rejects_bad_carts() {
        let catalog = Catalog::seeded();
        let inventory = InventoryRegistry::seeded();
        let quote = |request: &CheckoutRequest| {
            quote_checkout(
                &catalog,
                &inventory,
                LOOPBACK_ADDR.to_string(),
                locate(LOOPBACK_ADDR),
                request,
                100.0,
            )
        };

        assert_eq!(quote(&cart(&[])), Err(CheckoutError::EmptyCart));
        assert_eq!(
            quote(&cart(&[(1, 0)])),
            Err(CheckoutError::InvalidQuantity(1))
        );
        assert_eq!(
            quote(&cart(&[(1, 1), (77, 1)])),
            Err(CheckoutError::ProductNotFound(77))
        );
    }

    #[test]
    fn quantity_beyond_stock_is_rejected() {
        let catalog = Catalog::seeded();
        let inventory = InventoryRegistry::seeded();
        let quote = |request: &CheckoutRequest| {
            quote_checkout(
                &catalog,
                &inventory,
                LOOPBACK_ADDR.to_string(),
                locate(LOOPBACK_ADDR),
                request,
                100.0,
            )
        };

        assert!(quote(&cart(&[(2, 8)])).is_ok());
        assert_eq!(
            quote(&cart(&[(2, 9)])),
            Err(CheckoutError::InsufficientStock {
                product_id: 2,
                requested: 9,
                available: 8,
            })
        );
        // Split lines for one product are summed.
        assert_eq!(
            quote(&cart(&[(2, 5), (2, 4)])),
            Err(CheckoutError::InsufficientStock {
                product_id: 2,
                requested: 9,
                available: 8,
            })
        );
    }

    #[test]
    fn sold_out_product_cannot_be_quoted() {
        use crate::inventory::StockAdjustment;

        let catalog = Catalog::seeded();
        let inventory = InventoryRegistry::seeded();
        inventory
            .adjust(StockAdjustment {
                product_id: 2,
                quantity_to_add: -8,
                warehouse_location: None,
            })
            .expect("adjust");

        let err = quote_checkout(
            &catalog,
            &inventory,
            LOOPBACK_ADDR.to_string(),
            locate(LOOPBACK_ADDR),
            &cart(&[(2, 1)]),
            100.0,
        )
        .expect_err("sold out");
        assert_eq!(
            err,
            CheckoutError::InsufficientStock {
                product_id: 2,
                requested: 1,
                available: 0,
            }
        );
    }
}
