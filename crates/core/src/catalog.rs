use serde::Serialize;

use crate::inventory::InventoryRegistry;

/// Category label that disables filtering.
pub const ALL_CATEGORIES: &str = "All";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub id: u32,
    pub name: &'static str,
    pub price: f64,
    pub image: &'static str,
    pub rating: f64,
    pub reviews: u32,
    pub category: &'static str,
}

/// A product as listed, with stock read from the inventory registry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListedProduct {
    #[serde(flatten)]
    pub product: Product,
    pub stock: i64,
}

/// Read-only product listing shown on the storefront.
#[derive(Debug, Clone)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    pub fn seeded() -> Self {
        Self::new(vec![
            Product {
                id: 1,
                name: "Premium Wireless Headphones",
                price: 299.99,
                image: "/premium-wireless-headphones.png",
                rating: 4.8,
                reviews: 124,
                category: "Electronics",
            },
            Product {
                id: 2,
                name: "Smart Fitness Watch",
                price: 199.99,
                image: "/smart-fitness-watch.png",
                rating: 4.6,
                reviews: 89,
                category: "Wearables",
            },
            Product {
                id: 3,
                name: "Organic Coffee Beans",
                price: 24.99,
                image: "/organic-coffee-beans-bag.png",
                rating: 4.9,
                reviews: 256,
                category: "Food",
            },
            Product {
                id: 4,
                name: "Minimalist Desk Lamp",
                price: 89.99,
                image: "/minimalist-desk-lamp.png",
                rating: 4.7,
                reviews: 67,
                category: "Home",
            },
            Product {
                id: 5,
                name: "Bluetooth Speaker",
                price: 79.99,
                image: "/placeholder-3g20u.png",
                rating: 4.5,
                reviews: 143,
                category: "Electronics",
            },
            Product {
                id: 6,
                name: "Yoga Mat Pro",
                price: 49.99,
                image: "/premium-yoga-mat.png",
                rating: 4.8,
                reviews: 198,
                category: "Fitness",
            },
        ])
    }

    pub fn get(&self, id: u32) -> Option<&Product> {
        self.products.iter().find(|product| product.id == id)
    }

    /// `"All"` followed by each distinct category in listing order.
    pub fn categories(&self) -> Vec<&'static str> {
        let mut categories = vec![ALL_CATEGORIES];
        for product in &self.products {
            if !categories.contains(&product.category) {
                categories.push(product.category);
            }
        }
        categories
    }

    /// Products in `category`; `None` or `"All"` returns the full listing.
    pub fn filter(&self, category: Option<&str>) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|product| match category {
                None | Some(ALL_CATEGORIES) => true,
                Some(category) => product.category == category,
            })
            .collect()
    }

    /// Filtered products paired with their live stock. Products the registry
    /// does not track list with zero stock.
    pub fn listing(
        &self,
        category: Option<&str>,
        inventory: &InventoryRegistry,
    ) -> Vec<ListedProduct> {
        self.filter(category)
            .into_iter()
            .map(|product| ListedProduct {
                stock: inventory.stock_of(product.id).unwrap_or(0),
                product: product.clone(),
            })
            .collect()
    }
}
