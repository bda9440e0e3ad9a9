//! # Validation Module
//!
//! Input validation for everything that enters the engine.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: API / CLI (deserialization)                                  │
//! │  └── Shape of the request                                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (fail fast)                                      │
//! │  ├── Negative qty / unit price / charges / shares                      │
//! │  ├── Empty or duplicate participant ids                                │
//! │  └── Hints and payment DTO sanity                                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: reconcile() / allocate()                                     │
//! │  └── May assume every input is non-negative                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tabsplit_core::validation::{validate_currency, validate_participant_id};
//!
//! validate_currency("USD").unwrap();
//! assert!(validate_participant_id("  ").is_err());
//! ```

use std::collections::HashSet;

use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{NormalizerHints, ParsedItem, PaymentLink, SetPayment};
use crate::{MAX_NOTE_LENGTH, MAX_PARTICIPANTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Receipt Validators
// =============================================================================

/// Rejects negative quantities and unit prices.
///
/// Zero is allowed for both (voided lines, free items).
pub fn validate_parsed_items(items: &[ParsedItem]) -> ValidationResult<()> {
    for (index, item) in items.iter().enumerate() {
        if item.qty < 0 {
            return Err(ValidationError::Negative {
                field: format!("items[{}].qty", index),
                value: item.qty.to_string(),
            });
        }
        validate_non_negative_decimal(&format!("items[{}].unit_price", index), item.unit_price)?;
    }
    Ok(())
}

/// Validates a decimal amount is not negative.
pub fn validate_non_negative_decimal(field: &str, value: Decimal) -> ValidationResult<()> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::Negative {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Money Validators
// =============================================================================

/// Validates a money amount is not negative.
///
/// ## Example
/// ```rust
/// use tabsplit_core::money::Money;
/// use tabsplit_core::validation::validate_non_negative;
///
/// assert!(validate_non_negative("tax", Money::from_cents(0)).is_ok());
/// assert!(validate_non_negative("tax", Money::from_cents(-1)).is_err());
/// ```
pub fn validate_non_negative(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::Negative {
            field: field.to_string(),
            value: amount.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Participant Validators
// =============================================================================

/// Validates a participant id is present.
pub fn validate_participant_id(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "participant id".to_string(),
        });
    }
    Ok(())
}

/// Validates a participant set: ids present, unique, and within limits.
pub fn validate_participant_ids<'a, I>(ids: I) -> ValidationResult<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    for id in ids {
        validate_participant_id(id)?;
        if !seen.insert(id) {
            return Err(ValidationError::Duplicate {
                field: "participant id".to_string(),
                value: id.to_string(),
            });
        }
    }

    if seen.len() > MAX_PARTICIPANTS {
        return Err(ValidationError::OutOfRange {
            field: "participants".to_string(),
            min: 0,
            max: MAX_PARTICIPANTS as i64,
        });
    }
    Ok(())
}

// =============================================================================
// Hint Validators
// =============================================================================

/// Validates an ISO 4217 currency code ("USD", "EUR", ...).
pub fn validate_currency(code: &str) -> ValidationResult<()> {
    if code.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "currency".to_string(),
        });
    }
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(ValidationError::InvalidFormat {
            field: "currency".to_string(),
            reason: "must be a 3-letter uppercase ISO 4217 code".to_string(),
        });
    }
    Ok(())
}

/// Validates parser hints before they are handed to the parser.
pub fn validate_hints(hints: &NormalizerHints) -> ValidationResult<()> {
    validate_currency(&hints.currency)?;

    let candidates = [
        ("candidate_subtotal", hints.candidate_subtotal),
        ("candidate_tax", hints.candidate_tax),
        ("candidate_tip", hints.candidate_tip),
        ("candidate_total", hints.candidate_total),
    ];
    for (field, value) in candidates {
        if let Some(value) = value {
            validate_non_negative_decimal(field, value)?;
        }
    }

    if let Some(ref datetime) = hints.datetime_iso {
        chrono::DateTime::parse_from_rfc3339(datetime).map_err(|e| {
            ValidationError::InvalidFormat {
                field: "datetime_iso".to_string(),
                reason: e.to_string(),
            }
        })?;
    }

    Ok(())
}

// =============================================================================
// Payment Validators
// =============================================================================

/// Validates a payment link before it is shown to participants.
///
/// ## Rules
/// - Label is required
/// - Instructions-only links need instructions and no URL requirement
/// - Other links need an `http://` or `https://` URL
pub fn validate_payment_link(link: &PaymentLink) -> ValidationResult<()> {
    if link.label.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "label".to_string(),
        });
    }

    if link.is_instructions_only {
        if link.instructions.as_deref().map_or(true, |s| s.trim().is_empty()) {
            return Err(ValidationError::Required {
                field: "instructions".to_string(),
            });
        }
        return Ok(());
    }

    match link.url.as_deref() {
        None => Err(ValidationError::Required {
            field: "url".to_string(),
        }),
        Some(url) if url.starts_with("https://") || url.starts_with("http://") => Ok(()),
        Some(_) => Err(ValidationError::InvalidFormat {
            field: "url".to_string(),
            reason: "must start with http:// or https://".to_string(),
        }),
    }
}

/// Validates a payment-status update.
pub fn validate_set_payment(payment: &SetPayment) -> ValidationResult<()> {
    if let Some(amount) = payment.amount {
        validate_non_negative("amount", amount)?;
    }

    if payment.is_paid
        && payment
            .platform_key
            .as_deref()
            .map_or(true, |k| k.trim().is_empty())
    {
        return Err(ValidationError::Required {
            field: "platform_key".to_string(),
        });
    }

    if let Some(ref note) = payment.note {
        if note.chars().count() > MAX_NOTE_LENGTH {
            return Err(ValidationError::TooLong {
                field: "note".to_string(),
                max: MAX_NOTE_LENGTH,
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
