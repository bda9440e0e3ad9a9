//! # Split Error Types
//!
//! Error types for the split workflow.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Split Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────────┐  ┌─────────────────────┐ │
//! │  │  Configuration  │  │      Workflow       │  │      Wrapped        │ │
//! │  │                 │  │                     │  │                     │ │
//! │  │  InvalidConfig  │  │  ReceiptUnusable    │  │  Core (validation,  │ │
//! │  │  ConfigLoad...  │  │  ConfirmationReq... │  │    allocation)      │ │
//! │  │  ConfigSave...  │  │  UnclaimedItem      │  │  Io, Json           │ │
//! │  └─────────────────┘  └─────────────────────┘  └─────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tabsplit_core::{CoreError, ValidationError};
use thiserror::Error;

/// Result type alias for split operations.
pub type SplitResult<T> = Result<T, SplitError>;

/// Split error type covering config and workflow failures.
#[derive(Debug, Error)]
pub enum SplitError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid split configuration.
    #[error("Invalid split configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Workflow Errors
    // =========================================================================
    /// Reconciliation found no totals to check the items against.
    #[error("Receipt cannot be split: {reason}")]
    ReceiptUnusable { reason: String },

    /// Items and totals disagree and the bill owner has not confirmed.
    #[error("Bill owner must confirm before splitting: {reason}")]
    ConfirmationRequired { reason: String },

    /// An item line has nobody assigned to it, so its cost would vanish.
    #[error("Item {index} ('{description}') is not claimed by any participant")]
    UnclaimedItem { index: usize, description: String },

    // =========================================================================
    // Wrapped Errors
    // =========================================================================
    /// Domain error from tabsplit-core.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// File system error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Request/outcome JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ValidationError> for SplitError {
    fn from(err: ValidationError) -> Self {
        SplitError::Core(CoreError::Validation(err))
    }
}

impl From<toml::de::Error> for SplitError {
    fn from(err: toml::de::Error) -> Self {
        SplitError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SplitError {
    fn from(err: toml::ser::Error) -> Self {
        SplitError::ConfigSaveFailed(err.to_string())
    }
}

impl SplitError {
    /// True for conditions the bill owner can resolve (confirm, fix the
    /// receipt, assign items) as opposed to caller defects.
    pub fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            SplitError::ReceiptUnusable { .. }
                | SplitError::ConfirmationRequired { .. }
                | SplitError::UnclaimedItem { .. }
        )
    }
}
