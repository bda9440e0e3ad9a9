//! # Domain Types
//!
//! Core domain types used throughout Tabsplit.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  ParsedReceipt  │   │ ReconcileResult │   │  MutableTotal   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  items[]        │──►│  status         │──►│  participant_id │       │
//! │  │  totals         │   │  items_sum      │   │  items_subtotal │       │
//! │  │  raw_text       │   │  baseline       │   │  discount/tax/  │       │
//! │  └─────────────────┘   │  discrepancy    │   │  tip allocs     │       │
//! │   (from parser)        └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   ParseStatus   │   │ BaselineSource  │   │ NormalizerHints │       │
//! │  │  Parsed         │   │  Subtotal       │   │  (to parser)    │       │
//! │  │  NeedsAdjustment│   │  Total          │   └─────────────────┘       │
//! │  │  FailedParse    │   └─────────────────┘                              │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Parsed values are `Decimal` (whatever the parser read). Everything produced
//! by reconciliation or allocation is [`Money`] in integer cents.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{round2, Money};

/// Identifier of a participant. Opaque to the engine; only equality and
/// ordering matter.
pub type ParticipantId = String;

// =============================================================================
// Parsed Receipt (input from the external parser)
// =============================================================================

/// One line item as read by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ParsedItem {
    pub description: String,
    /// Quantity as printed. Negative values are rejected by validation.
    pub qty: i64,
    /// Unit price as printed; may carry more than 2 fractional digits.
    #[ts(as = "String")]
    pub unit_price: Decimal,
}

impl ParsedItem {
    pub fn new(description: impl Into<String>, qty: i64, unit_price: Decimal) -> Self {
        ParsedItem {
            description: description.into(),
            qty,
            unit_price,
        }
    }

    /// `round2(qty × unit_price)`, or `None` if the product overflows.
    pub fn line_total(&self) -> Option<Decimal> {
        Decimal::from(self.qty)
            .checked_mul(self.unit_price)
            .map(round2)
    }
}

/// The money fields the parser managed to detect. Any of them may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ParsedMoneyTotals {
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub subtotal: Option<Decimal>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub tax: Option<Decimal>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub tip: Option<Decimal>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub total: Option<Decimal>,
}

/// One receipt-parse attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ParsedReceipt {
    pub items: Vec<ParsedItem>,
    #[serde(default)]
    pub totals: ParsedMoneyTotals,
    #[serde(default)]
    pub raw_text: String,
}

// =============================================================================
// Parse Status
// =============================================================================

/// Whether a receipt is usable as-is, usable after correction, or unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ParseStatus {
    /// Items agree with the baseline within tolerance.
    Parsed,
    /// Items and baseline disagree; the owner must confirm or correct.
    NeedsAdjustment,
    /// No usable totals; nothing to reconcile against.
    FailedParse,
}

impl std::fmt::Display for ParseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseStatus::Parsed => write!(f, "parsed"),
            ParseStatus::NeedsAdjustment => write!(f, "needs_adjustment"),
            ParseStatus::FailedParse => write!(f, "failed_parse"),
        }
    }
}

// =============================================================================
// Baseline Source
// =============================================================================

/// Which receipt field the comparison baseline was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BaselineSource {
    /// The printed subtotal, used as-is.
    Subtotal,
    /// The printed total, less tax and tip when present.
    Total,
}

impl std::fmt::Display for BaselineSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BaselineSource::Subtotal => write!(f, "subtotal"),
            BaselineSource::Total => write!(f, "total"),
        }
    }
}

// =============================================================================
// Reconcile Result
// =============================================================================

/// Outcome of comparing parsed items against the receipt's stated totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReconcileResult {
    pub status: ParseStatus,
    /// `round2(Σ line totals)`.
    pub items_sum: Money,
    /// Zero when `status` is `FailedParse`.
    pub baseline_subtotal: Money,
    /// Signed `items_sum - baseline_subtotal`.
    pub discrepancy: Money,
    pub needs_adjustment: bool,
    pub reason: Option<String>,
    /// `None` only when no baseline could be derived (`FailedParse`).
    pub source: Option<BaselineSource>,
}

impl ReconcileResult {
    /// True when a split can go ahead (possibly after owner confirmation).
    pub fn is_usable(&self) -> bool {
        !matches!(self.status, ParseStatus::FailedParse)
    }
}

// =============================================================================
// Mutable Total (per-participant accumulator)
// =============================================================================

/// Per-participant accumulator for one allocation pass.
///
/// ## Lifecycle
/// ```text
/// caller creates (items_subtotal set, allocs zero)
///      │
///      ▼
/// allocate() writes discount_alloc / tax_alloc / tip_alloc
///      │
///      ▼
/// caller persists or hands to payment-link generation
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MutableTotal {
    pub participant_id: ParticipantId,
    pub display_name: String,
    pub items_subtotal: Money,
    pub discount_alloc: Money,
    pub tax_alloc: Money,
    pub tip_alloc: Money,
}

impl MutableTotal {
    pub fn new(participant_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        MutableTotal {
            participant_id: participant_id.into(),
            display_name: display_name.into(),
            items_subtotal: Money::zero(),
            discount_alloc: Money::zero(),
            tax_alloc: Money::zero(),
            tip_alloc: Money::zero(),
        }
    }

    /// Builder-style helper used by callers that already know the subtotal.
    pub fn with_items_subtotal(mut self, items_subtotal: Money) -> Self {
        self.items_subtotal = items_subtotal;
        self
    }

    /// What this participant owes: items - discount + tax + tip.
    pub fn amount_owed(&self) -> Money {
        self.items_subtotal - self.discount_alloc + self.tax_alloc + self.tip_alloc
    }
}

// =============================================================================
// Normalizer Hints (configuration passed to the external parser)
// =============================================================================

/// Hints handed to the external parser.
///
/// The engine does not read these directly, except for `ignore_phrases`,
/// which feeds [`crate::vocabulary::IgnoreVocabulary::from_hints`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NormalizerHints {
    /// ISO 4217 code, e.g. "USD".
    pub currency: String,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub candidate_subtotal: Option<Decimal>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub candidate_tax: Option<Decimal>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub candidate_tip: Option<Decimal>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub candidate_total: Option<Decimal>,
    #[serde(default)]
    pub merchant_name: Option<String>,
    /// RFC 3339 timestamp printed on the receipt.
    #[serde(default)]
    pub datetime_iso: Option<String>,
    #[serde(default)]
    pub ignore_phrases: Option<Vec<String>>,
}

impl NormalizerHints {
    pub fn new(currency: impl Into<String>) -> Self {
        NormalizerHints {
            currency: currency.into(),
            ..Default::default()
        }
    }

    pub fn with_ignore_phrases<I, S>(mut self, phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_phrases = Some(phrases.into_iter().map(Into::into).collect());
        self
    }
}

// =============================================================================
// Downstream Shapes (payment links / payment status)
// =============================================================================

/// A way for a participant to pay the bill owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentLink {
    pub method_id: String,
    pub platform_key: String,
    pub platform_name: String,
    pub label: String,
    pub url: Option<String>,
    pub is_instructions_only: bool,
    pub instructions: Option<String>,
}

/// A request to record a participant's payment status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SetPayment {
    pub is_paid: bool,
    #[serde(default)]
    pub platform_key: Option<String>,
    #[serde(default)]
    pub amount: Option<Money>,
    #[serde(default)]
    pub note: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================
