//! Stand-in for IP geolocation: a fixed two-entry table keyed by client address.

use crate::types::{LocationRecord, Zone};

pub const LOOPBACK_ADDR: &str = "127.0.0.1";

const LOOPBACK_LOCATION: LocationRecord = LocationRecord {
    city: "San Francisco",
    region: "CA",
    country: "US",
    tax_rate: 0.0875,
    shipping_zone: Zone::WestCoast,
};

const DEFAULT_LOCATION: LocationRecord = LocationRecord {
    city: "New York",
    region: "NY",
    country: "US",
    tax_rate: 0.08,
    shipping_zone: Zone::EastCoast,
};

/// Picks the client address from proxy headers.
///
/// The first entry of `X-Forwarded-For` wins, then `X-Real-IP`, then the
/// loopback address.
pub fn client_address(forwarded_for: Option<&str>, real_ip: Option<&str>) -> String {
    forwarded_for
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .or_else(|| real_ip.map(str::trim).filter(|value| !value.is_empty()))
        .unwrap_or(LOOPBACK_ADDR)
        .to_string()
}

/// Looks up the mock location for an address.
pub fn locate(address: &str) -> LocationRecord {
    if address == LOOPBACK_ADDR {
        LOOPBACK_LOCATION
    } else {
        DEFAULT_LOCATION
    }
}
