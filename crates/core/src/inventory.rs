use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stock record for a single product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryItem {
    pub id: u32,
    pub name: String,
    pub stock: i64,
    pub warehouse: String,
}

impl InventoryItem {
    fn new(id: u32, name: &str, stock: i64, warehouse: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            stock,
            warehouse: warehouse.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventorySnapshot {
    pub inventory: Vec<InventoryItem>,
    pub total_items: i64,
    /// Distinct warehouse labels in first-seen order.
    pub warehouses: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StockAdjustment {
    pub product_id: u32,
    pub quantity_to_add: i64,
    #[serde(default)]
    pub warehouse_location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockAdjusted {
    pub product_id: u32,
    pub product_name: String,
    pub old_stock: i64,
    pub quantity_added: i64,
    pub new_stock: i64,
    pub warehouse: String,
    pub message: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InventoryError {
    #[error("product {0} not found")]
    ProductNotFound(u32),
}

/// In-memory stock registry. Items are seeded once and never created or removed.
#[derive(Debug)]
pub struct InventoryRegistry {
    items: Mutex<Vec<InventoryItem>>,
}

impl InventoryRegistry {
    pub fn new(items: Vec<InventoryItem>) -> Self {
        Self {
            items: Mutex::new(items),
        }
    }

    pub fn seeded() -> Self {
        Self::new(vec![
            InventoryItem::new(1, "Premium Wireless Headphones", 15, "West Coast"),
            InventoryItem::new(2, "Smart Fitness Watch", 8, "East Coast"),
            InventoryItem::new(3, "Organic Coffee Beans", 42, "Central"),
            InventoryItem::new(4, "Minimalist Desk Lamp", 23, "West Coast"),
            InventoryItem::new(5, "Bluetooth Speaker", 31, "East Coast"),
            InventoryItem::new(6, "Yoga Mat Pro", 19, "Central"),
        ])
    }

    fn lock(&self) -> MutexGuard<'_, Vec<InventoryItem>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current stock for a product, if it is tracked.
    pub fn stock_of(&self, product_id: u32) -> Option<i64> {
        self.lock()
            .iter()
            .find(|item| item.id == product_id)
            .map(|item| item.stock)
    }

    pub fn list(&self) -> InventorySnapshot {
        let items = self.lock();
        let total_items = items.iter().map(|item| item.stock).sum();
        let mut warehouses: Vec<String> = Vec::new();
        for item in items.iter() {
            if !warehouses.contains(&item.warehouse) {
                warehouses.push(item.warehouse.clone());
            }
        }

        InventorySnapshot {
            inventory: items.clone(),
            total_items,
            warehouses,
        }
    }

    /// Adds `quantity_to_add` to the product's stock and optionally moves it.
    ///
    /// Negative quantities are applied as-is; stock is not floored at zero.
    pub fn adjust(&self, adjustment: StockAdjustment) -> Result<StockAdjusted, InventoryError> {
        let mut items = self.lock();
        let item = items
            .iter_mut()
            .find(|item| item.id == adjustment.product_id)
            .ok_or(InventoryError::ProductNotFound(adjustment.product_id))?;

        let old_stock = item.stock;
        item.stock = item.stock.saturating_add(adjustment.quantity_to_add);
        if let Some(location) = adjustment
            .warehouse_location
            .filter(|location| !location.is_empty())
        {
            item.warehouse = location;
        }

        Ok(StockAdjusted {
            product_id: item.id,
            product_name: item.name.clone(),
            old_stock,
            quantity_added: adjustment.quantity_to_add,
            new_stock: item.stock,
            warehouse: item.warehouse.clone(),
            message: format!(
                "Added {} units to {}. Stock updated from {} to {}",
                adjustment.quantity_to_add, item.name, old_stock, item.stock
            ),
        })
    }
}
