use std::fmt;

use serde::Serialize;

/// Coarse geographic category used for shipping and loyalty lookups.
///
/// Labels outside the known set parse to [`Zone::Unknown`], which every
/// table maps to its default entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Zone {
    #[serde(rename = "West Coast")]
    WestCoast,
    #[serde(rename = "East Coast")]
    EastCoast,
    Central,
    International,
    Standard,
    Unknown,
}

impl Zone {
    /// Resolves a zone from its display label. Matching is exact.
    pub fn parse(label: &str) -> Self {
        match label {
            "West Coast" => Self::WestCoast,
            "East Coast" => Self::EastCoast,
            "Central" => Self::Central,
            "International" => Self::International,
            "Standard" => Self::Standard,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::WestCoast => "West Coast",
            Self::EastCoast => "East Coast",
            Self::Central => "Central",
            Self::International => "International",
            Self::Standard => "Standard",
            Self::Unknown => "Unknown",
        }
    }

    /// Multiplier applied to the shipping subtotal.
    pub fn shipping_multiplier(self) -> f64 {
        match self {
            Self::WestCoast => 1.0,
            Self::EastCoast => 1.2,
            Self::Central => 1.1,
            Self::International => 2.5,
            Self::Standard | Self::Unknown => 1.0,
        }
    }

    pub fn estimated_delivery(self) -> &'static str {
        match self {
            Self::WestCoast => "1-2 business days",
            Self::EastCoast | Self::Central => "2-3 business days",
            Self::International => "7-14 business days",
            Self::Standard | Self::Unknown => "3-5 business days",
        }
    }

    /// Loyalty multiplier reported back to the customer.
    pub fn loyalty_multiplier(self) -> f64 {
        match self {
            Self::WestCoast => 1.2,
            Self::EastCoast => 1.1,
            Self::Central => 1.15,
            Self::International | Self::Standard | Self::Unknown => 1.0,
        }
    }

    /// Extra loyalty points per hundred base points; `loyalty_multiplier - 1`
    /// kept in integers so the bonus floors exactly.
    pub fn loyalty_bonus_percent(self) -> u64 {
        match self {
            Self::WestCoast => 20,
            Self::EastCoast => 10,
            Self::Central => 15,
            Self::International | Self::Standard | Self::Unknown => 0,
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Loyalty status derived from cumulative points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl Tier {
    pub const SILVER_POINTS: u64 = 500;
    pub const GOLD_POINTS: u64 = 1000;
    pub const PLATINUM_POINTS: u64 = 2000;

    /// Step function from points to tier, checked from the highest threshold down.
    pub fn for_points(points: u64) -> Self {
        if points >= Self::PLATINUM_POINTS {
            Self::Platinum
        } else if points >= Self::GOLD_POINTS {
            Self::Gold
        } else if points >= Self::SILVER_POINTS {
            Self::Silver
        } else {
            Self::Bronze
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bronze => "Bronze",
            Self::Silver => "Silver",
            Self::Gold => "Gold",
            Self::Platinum => "Platinum",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mock geographic location attached to a client address.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationRecord {
    pub city: &'static str,
    pub region: &'static str,
    pub country: &'static str,
    pub tax_rate: f64,
    pub shipping_zone: Zone,
}
