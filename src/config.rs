use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::Rate;
use crate::types::Periodicity;

/// env var holding the advisory service credential
pub const API_KEY_ENV: &str = "API_KEY";

/// env var overriding the advisory model
pub const ADVISORY_MODEL_ENV: &str = "ADVISORY_MODEL";

/// route assigned to loans originated from the collector form
pub const MANUAL_ROUTE_ID: &str = "r-manual";

/// suggested terms for a new loan of a given cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanDefaults {
    pub rate: Rate,
    pub installments: u32,
}

impl LoanDefaults {
    pub fn for_periodicity(periodicity: Periodicity) -> Self {
        match periodicity {
            Periodicity::Daily => Self {
                rate: Rate::from_decimal(dec!(0.12)),
                installments: 20,
            },
            Periodicity::Weekly => Self {
                rate: Rate::from_decimal(dec!(0.16)),
                installments: 10,
            },
            Periodicity::Biweekly => Self {
                rate: Rate::from_decimal(dec!(0.20)),
                installments: 6,
            },
            Periodicity::Monthly => Self {
                rate: Rate::from_decimal(dec!(0.25)),
                installments: 4,
            },
        }
    }
}

/// advisory service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-3-flash-preview".to_string(),
            temperature: 0.7,
            max_output_tokens: 500,
        }
    }
}

impl AdvisoryConfig {
    /// Create from environment variables
    /// - API_KEY: service credential; empty or missing disables the advisor
    /// - ADVISORY_MODEL: model name (optional)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty()),
            model: std::env::var(ADVISORY_MODEL_ENV).unwrap_or(defaults.model),
            ..defaults
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }
}
