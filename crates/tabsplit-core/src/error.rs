//! # Error Types
//!
//! Domain-specific error types for tabsplit-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tabsplit-core errors (this file)                                      │
//! │  ├── CoreError        - Business rule failures (fail fast)             │
//! │  └── ValidationError  - Invalid input from the calling layer           │
//! │                                                                         │
//! │  tabsplit-split errors (separate crate)                                │
//! │  └── SplitError       - Config + workflow failures                     │
//! │                                                                         │
//! │  NOT errors (reported as values):                                      │
//! │  ├── ParseStatus::FailedParse      - no usable totals                  │
//! │  ├── ParseStatus::NeedsAdjustment  - items vs baseline mismatch        │
//! │  └── AllocationWarning             - zero-base equal split             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (field, participant id, index)
//! 3. Errors are enum variants, never String
//! 4. Reconciliation conditions are values, only defects in input are errors

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These indicate a defect in the calling layer (bad input, impossible
/// request), never a reconciliation condition of the receipt itself.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A positive amount was asked to be split across nobody.
    #[error("Cannot allocate {amount} across zero participants")]
    NoParticipants { amount: String },

    /// A decimal amount does not fit in integer cents.
    ///
    /// ## When This Occurs
    /// - OCR produced an absurd quantity or price (e.g. `1e30`)
    /// - Quantity × unit price overflows the decimal range
    #[error("{field} is out of representable range: {value}")]
    AmountOutOfRange { field: String, value: String },

    /// A claim or lookup referenced a participant that is not in the split.
    #[error("Unknown participant: {0}")]
    UnknownParticipant(String),

    /// A claim referenced an item line that the receipt does not have.
    #[error("Item index {index} out of range (receipt has {len} items)")]
    ItemIndexOutOfRange { index: usize, len: usize },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Used for early validation before any reconciliation or allocation runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must not be negative.
    #[error("{field} must not be negative (got {value})")]
    Negative { field: String, value: String },

    /// Invalid format (e.g., invalid currency code, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., duplicate participant id).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
