//! # Reconciliation Calculator
//!
//! Checks that parsed line items add up to what the receipt says they
//! should, before anybody gets billed.
//!
//! ## Baseline Selection
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  totals.subtotal > 0 ?  ── yes ──► baseline = subtotal       (Subtotal) │
//! │          │ no                                                           │
//! │          ▼                                                              │
//! │  totals.total present ? ── yes ──► baseline = total - tax - tip (Total) │
//! │          │ no                       (missing tax / tip count as 0)      │
//! │          ▼                                                              │
//! │  FailedParse: "no totals found"                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Totals that are negative, or too large to express in cents, are treated
//! as if the parser had not found them.

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::error::{CoreError, CoreResult};
use crate::money::{Money, DEFAULT_TOLERANCE};
use crate::types::{BaselineSource, ParseStatus, ParsedMoneyTotals, ParsedReceipt, ReconcileResult};
use crate::validation::validate_parsed_items;

/// Reason reported when no baseline can be derived.
pub const NO_TOTALS_REASON: &str = "no totals found";

/// Reconciles a receipt with the default 2-cent tolerance.
///
/// ## Example
/// ```rust
/// use rust_decimal::Decimal;
/// use tabsplit_core::reconcile::reconcile;
/// use tabsplit_core::types::{ParsedItem, ParsedReceipt, ParseStatus};
///
/// let mut receipt = ParsedReceipt::default();
/// receipt.items.push(ParsedItem::new("Burger", 1, Decimal::new(1299, 2)));
/// receipt.totals.subtotal = Some(Decimal::new(1300, 2));
///
/// let result = reconcile(&receipt).unwrap();
/// assert_eq!(result.status, ParseStatus::Parsed);
/// ```
///
/// ## Errors
/// Only for defective input (negative quantity or unit price, or amounts
/// that overflow). Missing or malformed totals are reported as
/// `ParseStatus::FailedParse`, never as an error.
pub fn reconcile(receipt: &ParsedReceipt) -> CoreResult<ReconcileResult> {
    reconcile_with_tolerance(receipt, DEFAULT_TOLERANCE)
}

/// Reconciles a receipt, treating differences up to `tolerance` as equal.
pub fn reconcile_with_tolerance(
    receipt: &ParsedReceipt,
    tolerance: Money,
) -> CoreResult<ReconcileResult> {
    validate_parsed_items(&receipt.items)?;

    let items_sum = items_sum(receipt)?;

    let usable_baseline = baseline(&receipt.totals).and_then(|(baseline, source)| {
        let discrepancy = items_sum.checked_sub(baseline);
        if discrepancy.is_none() {
            warn!(%items_sum, %baseline, "Discrepancy out of range, ignoring baseline");
        }
        discrepancy.map(|discrepancy| (baseline, source, discrepancy))
    });

    let Some((baseline, source, discrepancy)) = usable_baseline else {
        warn!(
            item_count = receipt.items.len(),
            items_sum = %items_sum,
            "Receipt has no usable totals"
        );
        return Ok(ReconcileResult {
            status: ParseStatus::FailedParse,
            items_sum,
            baseline_subtotal: Money::zero(),
            discrepancy: items_sum,
            needs_adjustment: true,
            reason: Some(NO_TOTALS_REASON.to_string()),
            source: None,
        });
    };

    let needs_adjustment = !items_sum.equals_within(baseline, tolerance);

    debug!(
        %items_sum,
        %baseline,
        %source,
        %discrepancy,
        needs_adjustment,
        "Receipt reconciled"
    );

    let (status, reason) = if needs_adjustment {
        let reason = format!(
            "items sum {} vs {} {}, diff {}",
            items_sum,
            source,
            baseline,
            discrepancy.abs()
        );
        info!(%reason, "Receipt needs adjustment");
        (ParseStatus::NeedsAdjustment, Some(reason))
    } else {
        (ParseStatus::Parsed, None)
    };

    Ok(ReconcileResult {
        status,
        items_sum,
        baseline_subtotal: baseline,
        discrepancy,
        needs_adjustment,
        reason,
        source: Some(source),
    })
}

/// `round2(Σ round2(qty × unit_price))` in cents.
fn items_sum(receipt: &ParsedReceipt) -> CoreResult<Money> {
    let mut sum = Decimal::ZERO;
    for (index, item) in receipt.items.iter().enumerate() {
        let line_total = item
            .line_total()
            .ok_or_else(|| out_of_range(format!("items[{}].line_total", index), item.unit_price))?;
        sum = sum
            .checked_add(line_total)
            .ok_or_else(|| out_of_range("items_sum".to_string(), line_total))?;
    }
    Money::try_from_decimal(sum).ok_or_else(|| out_of_range("items_sum".to_string(), sum))
}

fn out_of_range(field: String, value: Decimal) -> CoreError {
    CoreError::AmountOutOfRange {
        field,
        value: value.to_string(),
    }
}

/// Picks the baseline subtotal and where it came from.
fn baseline(totals: &ParsedMoneyTotals) -> Option<(Money, BaselineSource)> {
    if let Some(subtotal) = usable(totals.subtotal, "subtotal") {
        if subtotal.is_positive() {
            return Some((subtotal, BaselineSource::Subtotal));
        }
    }

    let total = usable(totals.total, "total")?;
    let tax = usable(totals.tax, "tax").unwrap_or_default();
    let tip = usable(totals.tip, "tip").unwrap_or_default();
    match total.checked_sub(tax).and_then(|rest| rest.checked_sub(tip)) {
        Some(baseline) => Some((baseline, BaselineSource::Total)),
        None => {
            warn!(%total, %tax, %tip, "Derived subtotal out of range");
            None
        }
    }
}

/// A parsed total in cents, or `None` if it is missing or malformed.
fn usable(value: Option<Decimal>, field: &'static str) -> Option<Money> {
    let value = value?;
    match Money::try_from_decimal(value) {
        Some(money) if !money.is_negative() => Some(money),
        _ => {
            warn!(field, %value, "Ignoring malformed receipt total");
            None
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
