use std::env;
use std::path::PathBuf;
use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub const API_URL: &str = "https://api.perplexity.ai/chat/completions";
pub const DEFAULT_MODEL: &str = "sonar-deep-research";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 8000;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Pause between benchmark stages. Pacing only, results do not depend on it.
pub const DEFAULT_STAGE_PAUSE: Duration = Duration::from_secs(2);

pub const ENV_API_KEY: &str = "PERPLEXITY_API_KEY";
pub const ENV_API_URL: &str = "PERPLEXITY_API_URL";
pub const ENV_MODEL: &str = "PERPLEXITY_MODEL";

/// Values shipped in sample `.env` files that must not be sent as a real key.
const PLACEHOLDER_KEYS: &[&str] = &["your_key_here", "changeme"];

/// File name of the optional market table override inside the config dir.
pub const MARKET_FILE: &str = "market.json";

// ---------------------------------------------------------------------------
// BudgetBounds
// ---------------------------------------------------------------------------

/// Accepted range for the all-in client budget.
///
/// The lower bound is exclusive when it is zero (`budget > 0` is always
/// required) and inclusive otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetBounds {
    pub min: Decimal,
    pub max: Option<Decimal>,
}

impl BudgetBounds {
    /// Only require a strictly positive budget.
    pub fn positive() -> Self {
        Self {
            min: Decimal::ZERO,
            max: None,
        }
    }

    pub fn new(min: Decimal, max: Decimal) -> Self {
        Self {
            min,
            max: Some(max),
        }
    }

    pub fn contains(&self, budget: Decimal) -> bool {
        if budget <= Decimal::ZERO || budget < self.min {
            return false;
        }
        match self.max {
            Some(max) => budget <= max,
            None => true,
        }
    }
}

impl Default for BudgetBounds {
    fn default() -> Self {
        Self::new(dec!(50000), dec!(2000000))
    }
}

// ---------------------------------------------------------------------------
// Credential / RequesterConfig
// ---------------------------------------------------------------------------

/// API credential for the text-generation service.
///
/// `Missing` is a normal, constructible state: the requester then degrades
/// every call to offline content without touching the network.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    Missing,
    ApiKey(String),
}

impl Credential {
    /// Interpret a raw key value, treating blanks and known placeholders as missing.
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(key) if !key.is_empty() && !PLACEHOLDER_KEYS.contains(&key) => {
                Credential::ApiKey(key.to_string())
            }
            _ => Credential::Missing,
        }
    }

    pub fn is_configured(&self) -> bool {
        matches!(self, Credential::ApiKey(_))
    }
}

// Never print the key itself.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::Missing => write!(f, "Missing"),
            Credential::ApiKey(_) => write!(f, "ApiKey(***)"),
        }
    }
}

/// Settings for the market-commentary requester.
#[derive(Debug, Clone, PartialEq)]
pub struct RequesterConfig {
    pub credential: Credential,
    pub api_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for RequesterConfig {
    fn default() -> Self {
        Self {
            credential: Credential::Missing,
            api_url: API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl RequesterConfig {
    /// Load settings from the process environment, reading `.env` first if present.
    ///
    /// Unset variables keep their defaults; an unset key yields
    /// [`Credential::Missing`].
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build settings from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        config.credential = Credential::from_raw(lookup(ENV_API_KEY).as_deref());
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            config.api_url = url.trim().to_string();
        }
        if let Some(model) = lookup(ENV_MODEL).filter(|v| !v.trim().is_empty()) {
            config.model = model.trim().to_string();
        }
        if !config.credential.is_configured() {
            log::warn!("{ENV_API_KEY} not configured; market commentary will use offline content");
        }
        config
    }
}

/// Platform config directory for this crate (e.g. `~/.config/immo-calc` on Linux).
pub fn default_config_dir() -> PathBuf {
    if let Some(dir) = dirs::config_dir() {
        dir.join("immo-calc")
    } else {
        PathBuf::from(".immo-calc")
    }
}
