//! Static market reference data: purchase price and rent bands per m² by city.
//!
//! The built-in table covers the main French cities. A JSON override can be
//! loaded from a file (see [`MarketReferenceTable::load_default`]); it is read
//! once and never mutated afterwards.

use std::fs;
use std::path::Path;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::config;
use crate::error::{ImmoError, Result};
use crate::models::Range;

/// Price band used when the city is not in the table (EUR per m²).
pub const FALLBACK_PRICE_PER_SQM: Range = Range {
    min: dec!(3000),
    max: dec!(6000),
};

/// Rent band used when the city is not in the table (EUR per m² per month).
pub const FALLBACK_RENT_PER_SQM: Range = Range {
    min: dec!(12),
    max: dec!(18),
};

/// Accepted price band limits for loaded tables (EUR per m²).
pub const PRICE_PER_SQM_LIMITS: Range = Range {
    min: dec!(1),
    max: dec!(1000000),
};

/// Accepted upper limit for rent bands (EUR per m² per month).
pub const MAX_RENT_PER_SQM: Decimal = dec!(10000);

// ---------------------------------------------------------------------------
// CityMarket
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityMarket {
    pub name: String,
    pub price_per_sqm: Range,
    pub rent_per_sqm: Range,
}

impl CityMarket {
    fn new(name: &str, price: (Decimal, Decimal), rent: (Decimal, Decimal)) -> Self {
        Self {
            name: name.to_string(),
            price_per_sqm: Range::new(price.0, price.1),
            rent_per_sqm: Range::new(rent.0, rent.1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackBands {
    pub price_per_sqm: Range,
    pub rent_per_sqm: Range,
}

impl Default for FallbackBands {
    fn default() -> Self {
        Self {
            price_per_sqm: FALLBACK_PRICE_PER_SQM,
            rent_per_sqm: FALLBACK_RENT_PER_SQM,
        }
    }
}

/// Result of resolving a free-text city against the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketBands {
    /// Name of the matched table entry, `None` for the fallback bands.
    pub city: Option<String>,
    pub price_per_sqm: Range,
    pub rent_per_sqm: Range,
}

// ---------------------------------------------------------------------------
// MarketReferenceTable
// ---------------------------------------------------------------------------

/// Ordered city table plus the documented fallback bands.
///
/// Order matters: [`resolve`](Self::resolve) returns the first matching entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketReferenceTable {
    cities: Vec<CityMarket>,
    #[serde(default)]
    fallback: FallbackBands,
}

impl Default for MarketReferenceTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl MarketReferenceTable {
    /// The built-in 2025 reference bands.
    pub fn builtin() -> Self {
        Self {
            cities: vec![
                CityMarket::new("Paris", (dec!(8000), dec!(15000)), (dec!(30), dec!(45))),
                CityMarket::new("Lyon", (dec!(4500), dec!(7000)), (dec!(14), dec!(20))),
                CityMarket::new("Marseille", (dec!(3000), dec!(5500)), (dec!(12), dec!(18))),
                CityMarket::new("Toulouse", (dec!(3500), dec!(5800)), (dec!(13), dec!(19))),
                CityMarket::new("Nice", (dec!(4800), dec!(8500)), (dec!(16), dec!(24))),
                CityMarket::new("Nantes", (dec!(3800), dec!(6000)), (dec!(12), dec!(18))),
                CityMarket::new("Bordeaux", (dec!(4200), dec!(6800)), (dec!(13), dec!(19))),
                CityMarket::new("Lille", (dec!(2800), dec!(4500)), (dec!(11), dec!(16))),
                CityMarket::new("Montpellier", (dec!(3200), dec!(5200)), (dec!(12), dec!(17))),
            ],
            fallback: FallbackBands::default(),
        }
    }

    /// Build a table from explicit entries, checking every band.
    pub fn new(cities: Vec<CityMarket>, fallback: FallbackBands) -> Result<Self> {
        let table = Self { cities, fallback };
        table.check()?;
        Ok(table)
    }

    /// Parse a JSON override, e.g.
    /// `{"cities": [{"name": "Lyon", "pricePerSqm": {"min": 4500, "max": 7000},
    /// "rentPerSqm": {"min": 14, "max": 20}}]}`.
    ///
    /// `fallback` is optional and defaults to the documented bands.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let table: Self = serde_json::from_str(json)?;
        table.check()?;
        Ok(table)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&contents)
    }

    /// Load `market.json` from `dir`, or the built-in table if the file does not exist.
    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let path = dir.as_ref().join(config::MARKET_FILE);
        if path.exists() {
            log::debug!("Loading market table override from {}", path.display());
            Self::from_json_file(&path)
        } else {
            Ok(Self::builtin())
        }
    }

    /// [`load_from_dir`](Self::load_from_dir) on the platform config directory.
    pub fn load_default() -> Result<Self> {
        Self::load_from_dir(config::default_config_dir())
    }

    pub fn cities(&self) -> &[CityMarket] {
        &self.cities
    }

    pub fn fallback(&self) -> &FallbackBands {
        &self.fallback
    }

    /// Resolve free-text city input against the table.
    ///
    /// Case-insensitive substring match in both directions ("lyon 3e" finds
    /// Lyon, "mont" finds Montpellier), first entry wins. Blank input and
    /// unknown cities get the fallback bands.
    pub fn resolve(&self, city: &str) -> MarketBands {
        let needle = city.trim().to_lowercase();
        let hit = if needle.is_empty() {
            None
        } else {
            self.cities.iter().find(|entry| {
                let key = entry.name.to_lowercase();
                key.contains(&needle) || needle.contains(&key)
            })
        };

        match hit {
            Some(entry) => MarketBands {
                city: Some(entry.name.clone()),
                price_per_sqm: entry.price_per_sqm,
                rent_per_sqm: entry.rent_per_sqm,
            },
            None => {
                log::debug!("City '{}' not in market table, using fallback bands", city.trim());
                MarketBands {
                    city: None,
                    price_per_sqm: self.fallback.price_per_sqm,
                    rent_per_sqm: self.fallback.rent_per_sqm,
                }
            }
        }
    }

    fn check(&self) -> Result<()> {
        check_price_band("fallback", &self.fallback.price_per_sqm)?;
        check_rent_band("fallback", &self.fallback.rent_per_sqm)?;

        let mut seen: Vec<String> = Vec::with_capacity(self.cities.len());
        for entry in &self.cities {
            let key = entry.name.trim().to_lowercase();
            if key.is_empty() {
                return Err(ImmoError::InvalidMarketData("city name cannot be blank".into()));
            }
            if seen.contains(&key) {
                return Err(ImmoError::InvalidMarketData(format!(
                    "duplicate city '{}'",
                    entry.name
                )));
            }
            seen.push(key);
            check_price_band(&entry.name, &entry.price_per_sqm)?;
            check_rent_band(&entry.name, &entry.rent_per_sqm)?;
        }
        Ok(())
    }
}

fn check_price_band(name: &str, band: &Range) -> Result<()> {
    let label = format!("{name} price");
    check_band(&label, band, PRICE_PER_SQM_LIMITS.max)?;
    if band.min < PRICE_PER_SQM_LIMITS.min {
        return Err(ImmoError::InvalidMarketData(format!(
            "{label} band must start at {} or more, got {}",
            PRICE_PER_SQM_LIMITS.min, band.min
        )));
    }
    Ok(())
}

fn check_rent_band(name: &str, band: &Range) -> Result<()> {
    check_band(&format!("{name} rent"), band, MAX_RENT_PER_SQM)
}

// Caps keep every engine product and quotient far from Decimal overflow.
fn check_band(label: &str, band: &Range, cap: Decimal) -> Result<()> {
    if band.min <= Decimal::ZERO {
        return Err(ImmoError::InvalidMarketData(format!(
            "{label} band must be positive, got min {}",
            band.min
        )));
    }
    if !band.is_ordered() {
        return Err(ImmoError::InvalidMarketData(format!(
            "{label} band is inverted ({} > {})",
            band.min, band.max
        )));
    }
    if band.max > cap {
        return Err(ImmoError::InvalidMarketData(format!(
            "{label} band exceeds {cap}, got max {}",
            band.max
        )));
    }
    Ok(())
}
