//! Pure storefront domain: calculators, zone tables and in-memory registries.
//!
//! Nothing in this crate performs I/O. Registries own their maps behind a
//! mutex so the HTTP layer can share them across requests.

pub mod catalog;
pub mod checkout;
pub mod inventory;
pub mod location;
pub mod loyalty;
pub mod money;
pub mod pricing;
pub mod shipping;
pub mod types;
