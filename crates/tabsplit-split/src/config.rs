//! # Split Configuration
//!
//! Configuration management for the split workflow.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TABSPLIT_TOLERANCE_CENTS=5                                         │
//! │     TABSPLIT_REQUIRE_CONFIRMATION=false                                │
//! │     TABSPLIT_IGNORE_POLICY=replace                                     │
//! │     TABSPLIT_CURRENCY=EUR                                              │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/tabsplit/split.toml (Linux)                              │
//! │     ~/Library/Application Support/com.tabsplit.tabsplit/split.toml     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     2-cent tolerance, confirmation required, extend vocabulary, USD    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # split.toml
//! [reconcile]
//! tolerance_cents = 2
//! require_confirmation = true
//!
//! [vocabulary]
//! policy = "extend"  # extend | replace
//! extra_phrases = ["bag fee", "bottle deposit"]
//!
//! [currency]
//! code = "USD"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tabsplit_core::validation::validate_currency;
use tabsplit_core::{IgnorePhrasePolicy, IgnoreVocabulary, Money, NormalizerHints, DEFAULT_TOLERANCE};
use tracing::{debug, info, warn};

use crate::error::{SplitError, SplitResult};

/// Largest tolerance accepted. Anything above a dollar hides real OCR errors.
pub const MAX_TOLERANCE_CENTS: i64 = 100;

// =============================================================================
// Reconcile Settings
// =============================================================================

/// How strictly parsed items must match the receipt totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileSettings {
    /// Differences up to this many cents count as "equal".
    #[serde(default = "default_tolerance_cents")]
    pub tolerance_cents: i64,

    /// When true, a `NeedsAdjustment` receipt is only split after the bill
    /// owner confirms it.
    #[serde(default = "default_true")]
    pub require_confirmation: bool,
}

fn default_tolerance_cents() -> i64 {
    DEFAULT_TOLERANCE.cents()
}

fn default_true() -> bool {
    true
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        ReconcileSettings {
            tolerance_cents: default_tolerance_cents(),
            require_confirmation: true,
        }
    }
}

impl ReconcileSettings {
    pub fn tolerance(&self) -> Money {
        Money::from_cents(self.tolerance_cents)
    }
}

// =============================================================================
// Vocabulary Settings
// =============================================================================

/// Deployment-wide ignore phrases, layered under per-receipt hints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VocabularySettings {
    #[serde(default)]
    pub policy: IgnorePhrasePolicy,

    #[serde(default)]
    pub extra_phrases: Vec<String>,
}

// =============================================================================
// Currency Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencySettings {
    /// ISO 4217 code handed to the parser as a hint.
    #[serde(default = "default_currency")]
    pub code: String,
}

fn default_currency() -> String {
    "USD".to_string()
}

impl Default for CurrencySettings {
    fn default() -> Self {
        CurrencySettings {
            code: default_currency(),
        }
    }
}

// =============================================================================
// Main Split Configuration
// =============================================================================

/// Complete split configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SplitConfig {
    #[serde(default)]
    pub reconcile: ReconcileSettings,

    #[serde(default)]
    pub vocabulary: VocabularySettings,

    #[serde(default)]
    pub currency: CurrencySettings,
}

impl SplitConfig {
    /// Creates a new config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (split.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SplitResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading split config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load split config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SplitResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SplitError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Split config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SplitResult<()> {
        let tolerance = self.reconcile.tolerance_cents;
        if !(0..=MAX_TOLERANCE_CENTS).contains(&tolerance) {
            return Err(SplitError::InvalidConfig(format!(
                "tolerance_cents must be between 0 and {}, got {}",
                MAX_TOLERANCE_CENTS, tolerance
            )));
        }

        validate_currency(&self.currency.code)
            .map_err(|e| SplitError::InvalidConfig(e.to_string()))?;

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var("TABSPLIT_TOLERANCE_CENTS") {
            match value.parse::<i64>() {
                Ok(cents) => {
                    debug!(tolerance_cents = cents, "Overriding tolerance from environment");
                    self.reconcile.tolerance_cents = cents;
                }
                Err(_) => warn!(value = %value, "Ignoring non-numeric TABSPLIT_TOLERANCE_CENTS"),
            }
        }

        if let Ok(value) = std::env::var("TABSPLIT_REQUIRE_CONFIRMATION") {
            match value.to_lowercase().as_str() {
                "1" | "true" | "yes" => self.reconcile.require_confirmation = true,
                "0" | "false" | "no" => self.reconcile.require_confirmation = false,
                _ => warn!(value = %value, "Unknown TABSPLIT_REQUIRE_CONFIRMATION value"),
            }
        }

        if let Ok(value) = std::env::var("TABSPLIT_IGNORE_POLICY") {
            match value.parse::<IgnorePhrasePolicy>() {
                Ok(policy) => {
                    debug!(%policy, "Overriding ignore-phrase policy from environment");
                    self.vocabulary.policy = policy;
                }
                Err(e) => warn!("{}", e),
            }
        }

        if let Ok(code) = std::env::var("TABSPLIT_CURRENCY") {
            self.currency.code = code.trim().to_uppercase();
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "tabsplit", "tabsplit")
            .map(|dirs| dirs.config_dir().join("split.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Reconciliation tolerance as money.
    pub fn tolerance(&self) -> Money {
        self.reconcile.tolerance()
    }

    /// Parser hints seeded from this config.
    ///
    /// Configured extra phrases go into `ignore_phrases`, so the parser
    /// applies them with the configured policy.
    pub fn parser_hints(&self) -> NormalizerHints {
        let hints = NormalizerHints::new(self.currency.code.clone());
        if self.vocabulary.extra_phrases.is_empty() {
            hints
        } else {
            hints.with_ignore_phrases(self.vocabulary.extra_phrases.iter().cloned())
        }
    }

    /// Effective vocabulary for a receipt, with per-receipt hint phrases
    /// layered on top of the configured extras.
    pub fn vocabulary_for(&self, hints: Option<&NormalizerHints>) -> IgnoreVocabulary {
        let mut extra = self.vocabulary.extra_phrases.clone();
        if let Some(phrases) = hints.and_then(|h| h.ignore_phrases.as_ref()) {
            extra.extend(phrases.iter().cloned());
        }
        IgnoreVocabulary::with_phrases(&extra, self.vocabulary.policy)
    }
}
