//! # tabsplit-core: Pure Reconciliation & Allocation for Tabsplit
//!
//! This crate is the **heart** of Tabsplit. It decides whether a parsed
//! receipt adds up, and who owes which cent of the discount, tax and tip.
//! Everything here is a pure function with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tabsplit Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │          External: OCR / text parser, parse-job queue           │   │
//! │  │      image ──► raw text ──► line items ──► ParsedReceipt        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tabsplit-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   money   │  │vocabulary │  │ reconcile │  │allocation │  │   │
//! │  │   │  round2   │  │  ignore   │  │ items vs  │  │  largest  │  │   │
//! │  │   │  Money    │  │  phrases  │  │ baseline  │  │ remainder │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                tabsplit-split (Workflow Layer)                  │   │
//! │  │        config, item claims, confirmation gate, audit trail      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - `round2`, `equals_within`, integer-cent `Money`
//! - [`types`] - Receipt, status and per-participant types
//! - [`vocabulary`] - Ignore-phrase table for item-line filtering
//! - [`reconcile`] - Items-vs-totals reconciliation
//! - [`allocation`] - Cent-exact proration of discount, tax and tip
//! - [`validation`] - Fail-fast input checks
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input = bit-identical output
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: anything reconciled or allocated is in cents (i64)
//! 4. **Conditions vs Errors**: a mismatched receipt is a value, bad input is an error
//!
//! ## Example Usage
//!
//! ```rust
//! use rust_decimal::Decimal;
//! use tabsplit_core::{allocate, reconcile, Charges, Money, MutableTotal, ParsedItem, ParsedReceipt};
//!
//! let mut receipt = ParsedReceipt::default();
//! receipt.items.push(ParsedItem::new("Burger", 1, Decimal::new(1299, 2)));
//! receipt.items.push(ParsedItem::new("Fries", 1, Decimal::new(399, 2)));
//! receipt.totals.subtotal = Some(Decimal::new(1698, 2));
//! assert!(!reconcile(&receipt).unwrap().needs_adjustment);
//!
//! let mut totals = vec![
//!     MutableTotal::new("alice", "Alice").with_items_subtotal(Money::from_cents(1299)),
//!     MutableTotal::new("bob", "Bob").with_items_subtotal(Money::from_cents(399)),
//! ];
//! let charges = Charges { tax: Money::from_cents(136), ..Default::default() };
//! allocate(&mut totals, &charges).unwrap();
//!
//! assert_eq!(totals[0].tax_alloc + totals[1].tax_alloc, Money::from_cents(136));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod allocation;
pub mod error;
pub mod money;
pub mod reconcile;
pub mod types;
pub mod validation;
pub mod vocabulary;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use tabsplit_core::Money` instead of
// `use tabsplit_core::money::Money`

pub use allocation::{
    allocate, prorate, AllocationReport, AllocationWarning, ChargeComponent, Charges,
    ParticipantAllocation, Proration,
};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{equals_within, round2, Money, DEFAULT_TOLERANCE};
pub use reconcile::{reconcile, reconcile_with_tolerance};
pub use types::*;
pub use vocabulary::{IgnorePhrasePolicy, IgnoreVocabulary, DEFAULT_IGNORE_PHRASES};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum participants in a single split.
///
/// ## Business Reason
/// A bill is split at a table, not a stadium. Larger sets usually mean a
/// caller bug (e.g. ids duplicated per item).
pub const MAX_PARTICIPANTS: usize = 100;

/// Maximum length of a payment note.
pub const MAX_NOTE_LENGTH: usize = 500;
