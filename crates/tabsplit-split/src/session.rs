//! # Split Session
//!
//! Turns a parsed receipt plus "who had what" into final per-participant
//! totals.
//!
//! ## Workflow
//! ```text
//! SplitRequest
//!      │
//!      ├── 1. validate participants (ids present, unique)
//!      │
//!      ├── 2. reconcile items vs totals
//!      │        ├── FailedParse ──────────────────► ReceiptUnusable
//!      │        └── NeedsAdjustment, not confirmed ► ConfirmationRequired
//!      │
//!      ├── 3. order participants by id
//!      │
//!      ├── 4. split each line total across its claimants (equal weights)
//!      │        └── accumulates items_subtotal
//!      │
//!      ├── 5. charges: tax + tip from receipt, discount from request
//!      │
//!      └── 6. allocate ──► SplitOutcome { totals, warnings, audit }
//! ```
//!
//! Every cent of the items, discount, tax and tip lands on exactly one
//! participant, so `Σ amount_owed == items_sum - discount + tax + tip`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tabsplit_core::validation::{validate_hints, validate_participant_ids};
use tabsplit_core::{
    allocate, prorate, reconcile_with_tolerance, round2, AllocationWarning, ChargeComponent,
    Charges, CoreError, Money, MutableTotal, NormalizerHints, ParseStatus, ParsedReceipt,
    ParticipantId, ReconcileResult,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::SplitConfig;
use crate::error::{SplitError, SplitResult};

// =============================================================================
// Request
// =============================================================================

/// A person taking part in the split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantInput {
    pub id: ParticipantId,
    pub display_name: String,
}

impl ParticipantInput {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        ParticipantInput {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

/// "These participants shared item line `item_index`."
///
/// Several claims on the same line are merged; a participant named twice
/// still gets a single share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemClaim {
    pub item_index: usize,
    pub participant_ids: Vec<ParticipantId>,
}

impl ItemClaim {
    pub fn new<I, S>(item_index: usize, participant_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ItemClaim {
            item_index,
            participant_ids: participant_ids.into_iter().map(Into::into).collect(),
        }
    }
}

/// Everything needed to split one receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitRequest {
    /// Generated when the caller does not supply one.
    #[serde(default = "Uuid::new_v4")]
    pub receipt_id: Uuid,
    pub receipt: ParsedReceipt,
    /// Hints the receipt was parsed with, if the caller kept them.
    #[serde(default)]
    pub hints: Option<NormalizerHints>,
    pub participants: Vec<ParticipantInput>,
    pub claims: Vec<ItemClaim>,
    /// Receipt-level discount, shared in proportion to item subtotals.
    #[serde(default)]
    pub discount: Money,
    /// The bill owner has reviewed a receipt flagged for adjustment.
    #[serde(default)]
    pub confirmed: bool,
}

impl SplitRequest {
    pub fn new(receipt: ParsedReceipt) -> Self {
        SplitRequest {
            receipt_id: Uuid::new_v4(),
            receipt,
            hints: None,
            participants: Vec::new(),
            claims: Vec::new(),
            discount: Money::zero(),
            confirmed: false,
        }
    }
}

// =============================================================================
// Outcome
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    /// Which baseline the items were checked against.
    Reconciled,
    /// A mismatch the bill owner accepted (or that needed no confirmation).
    DiscrepancyAccepted,
    /// A receipt total that could not be used as a charge.
    ChargeIgnored,
    /// Raw receipt lines skipped by the ignore vocabulary.
    LinesIgnored,
    /// Forwarded [`AllocationWarning`].
    AllocationWarning,
}

/// One line of the audit trail shown to the bill owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub kind: AuditKind,
    pub message: String,
}

impl AuditEntry {
    fn new(kind: AuditKind, message: impl Into<String>) -> Self {
        AuditEntry {
            kind,
            message: message.into(),
        }
    }
}

/// Final result of a split.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitOutcome {
    pub receipt_id: Uuid,
    pub split_at: DateTime<Utc>,
    pub reconciliation: ReconcileResult,
    /// Ordered by participant id.
    pub totals: Vec<MutableTotal>,
    pub charges: Charges,
    pub warnings: Vec<AllocationWarning>,
    pub audit: Vec<AuditEntry>,
}

impl SplitOutcome {
    pub fn total_for(&self, participant_id: &str) -> Option<&MutableTotal> {
        self.totals
            .iter()
            .find(|t| t.participant_id == participant_id)
    }

    /// Σ amount_owed over all participants.
    pub fn grand_total(&self) -> Money {
        self.totals.iter().map(MutableTotal::amount_owed).sum()
    }
}

// =============================================================================
// Session
// =============================================================================

/// Runs splits under one configuration.
#[derive(Debug, Clone, Default)]
pub struct SplitSession {
    config: SplitConfig,
}

impl SplitSession {
    pub fn new(config: SplitConfig) -> Self {
        SplitSession { config }
    }

    pub fn config(&self) -> &SplitConfig {
        &self.config
    }

    /// Splits one receipt.
    ///
    /// ## Errors
    /// - `Core(Validation)`: bad participant ids, bad hints, negative discount
    /// - `ReceiptUnusable`: no totals on the receipt
    /// - `ConfirmationRequired`: totals disagree and the owner has not confirmed
    /// - `UnclaimedItem`, `Core(UnknownParticipant)`, `Core(ItemIndexOutOfRange)`
    pub fn split(&self, request: &SplitRequest) -> SplitResult<SplitOutcome> {
        info!(
            receipt_id = %request.receipt_id,
            items = request.receipt.items.len(),
            participants = request.participants.len(),
            "Splitting receipt"
        );

        validate_participant_ids(request.participants.iter().map(|p| p.id.as_str()))?;

        let mut audit = Vec::new();

        let hints = self.effective_hints(request)?;
        if let Some(entry) = self.ignored_lines_entry(&request.receipt, &hints) {
            audit.push(entry);
        }

        let reconciliation = self.check_receipt(request, &mut audit)?;

        let mut participants: Vec<&ParticipantInput> = request.participants.iter().collect();
        participants.sort_by(|a, b| a.id.cmp(&b.id));

        let mut totals = self.item_subtotals(&request.receipt, &participants, &request.claims)?;

        let charges = Charges {
            discount: request.discount,
            tax: self.receipt_charge(ChargeComponent::Tax, request.receipt.totals.tax, &mut audit),
            tip: self.receipt_charge(ChargeComponent::Tip, request.receipt.totals.tip, &mut audit),
        };

        let report = allocate(&mut totals, &charges)?;
        for warning in &report.warnings {
            audit.push(AuditEntry::new(AuditKind::AllocationWarning, warning.to_string()));
        }

        let outcome = SplitOutcome {
            receipt_id: request.receipt_id,
            split_at: Utc::now(),
            reconciliation,
            totals,
            charges,
            warnings: report.warnings,
            audit,
        };

        info!(
            receipt_id = %outcome.receipt_id,
            grand_total = %outcome.grand_total(),
            warnings = outcome.warnings.len(),
            "Receipt split"
        );

        Ok(outcome)
    }

    // =========================================================================
    // Steps
    // =========================================================================

    /// Reconciles the receipt and applies the confirmation gate.
    fn check_receipt(
        &self,
        request: &SplitRequest,
        audit: &mut Vec<AuditEntry>,
    ) -> SplitResult<ReconcileResult> {
        let result = reconcile_with_tolerance(&request.receipt, self.config.tolerance())?;
        let reason = result.reason.clone().unwrap_or_default();

        match result.status {
            ParseStatus::FailedParse => {
                return Err(SplitError::ReceiptUnusable { reason });
            }
            ParseStatus::NeedsAdjustment => {
                if self.config.reconcile.require_confirmation && !request.confirmed {
                    info!(receipt_id = %request.receipt_id, %reason, "Waiting for owner confirmation");
                    return Err(SplitError::ConfirmationRequired { reason });
                }
                audit.push(AuditEntry::new(AuditKind::DiscrepancyAccepted, reason));
            }
            ParseStatus::Parsed => {}
        }

        if let Some(source) = result.source {
            audit.push(AuditEntry::new(
                AuditKind::Reconciled,
                format!(
                    "items sum {} checked against {} {}",
                    result.items_sum, source, result.baseline_subtotal
                ),
            ));
        }

        Ok(result)
    }

    /// Builds one `MutableTotal` per participant with its share of the items.
    ///
    /// `participants` must already be in id order; shared lines hand their
    /// odd cents out in that order.
    fn item_subtotals(
        &self,
        receipt: &ParsedReceipt,
        participants: &[&ParticipantInput],
        claims: &[ItemClaim],
    ) -> SplitResult<Vec<MutableTotal>> {
        let len = receipt.items.len();
        let mut claimants: Vec<BTreeSet<&str>> = vec![BTreeSet::new(); len];

        for claim in claims {
            let slot = claimants
                .get_mut(claim.item_index)
                .ok_or(CoreError::ItemIndexOutOfRange {
                    index: claim.item_index,
                    len,
                })?;
            for id in &claim.participant_ids {
                if !participants.iter().any(|p| &p.id == id) {
                    return Err(CoreError::UnknownParticipant(id.clone()).into());
                }
                slot.insert(id.as_str());
            }
        }

        let mut totals: Vec<MutableTotal> = participants
            .iter()
            .map(|p| MutableTotal::new(p.id.clone(), p.display_name.clone()))
            .collect();

        for (index, (item, sharers)) in receipt.items.iter().zip(&claimants).enumerate() {
            if sharers.is_empty() {
                return Err(SplitError::UnclaimedItem {
                    index,
                    description: item.description.clone(),
                });
            }

            let line_total = item
                .line_total()
                .and_then(Money::try_from_decimal)
                .ok_or_else(|| CoreError::AmountOutOfRange {
                    field: format!("items[{}] line total", index),
                    value: format!("{} x {}", item.qty, item.unit_price),
                })?;

            // BTreeSet iterates in id order, matching `totals`.
            let weights = vec![Money::from_cents(1); sharers.len()];
            let shares = prorate(line_total, &weights)?.shares;

            debug!(
                item = %item.description,
                %line_total,
                sharers = sharers.len(),
                "Splitting item line"
            );

            for (id, share) in sharers.iter().zip(shares) {
                if let Some(total) = totals.iter_mut().find(|t| t.participant_id == *id) {
                    total.items_subtotal += share;
                }
            }
        }

        Ok(totals)
    }

    /// Converts a parsed tax/tip into a charge. Absent is zero; negative or
    /// unrepresentable values are dropped and recorded in the audit trail.
    fn receipt_charge(
        &self,
        component: ChargeComponent,
        value: Option<Decimal>,
        audit: &mut Vec<AuditEntry>,
    ) -> Money {
        let Some(value) = value else {
            return Money::zero();
        };

        match Money::try_from_decimal(round2(value)) {
            Some(amount) if !amount.is_negative() => amount,
            _ => {
                warn!(%component, %value, "Ignoring unusable receipt charge");
                audit.push(AuditEntry::new(
                    AuditKind::ChargeIgnored,
                    format!("{} of {} on the receipt was ignored", component, value),
                ));
                Money::zero()
            }
        }
    }

    /// The request's parser hints, or the configured ones when it has none.
    fn effective_hints(&self, request: &SplitRequest) -> SplitResult<NormalizerHints> {
        let mut hints = match &request.hints {
            Some(hints) => hints.clone(),
            None => self.config.parser_hints(),
        };
        if hints.currency.is_empty() {
            hints.currency = self.config.currency.code.clone();
        }
        validate_hints(&hints)?;
        Ok(hints)
    }

    /// Audit entry listing raw lines the ignore vocabulary filtered out.
    fn ignored_lines_entry(
        &self,
        receipt: &ParsedReceipt,
        hints: &NormalizerHints,
    ) -> Option<AuditEntry> {
        let vocabulary = self.config.vocabulary_for(Some(hints));

        let ignored = vocabulary.ignored_lines(&receipt.raw_text);
        if ignored.is_empty() {
            return None;
        }

        Some(AuditEntry::new(
            AuditKind::LinesIgnored,
            format!(
                "{} receipt line(s) not treated as items: {}",
                ignored.len(),
                ignored.join(" | ")
            ),
        ))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tabsplit_core::{CoreError, ParsedItem, ValidationError};

    fn burger_receipt() -> ParsedReceipt {
        let mut receipt = ParsedReceipt::default();
        receipt.items.push(ParsedItem::new("Burger", 1, dec!(12.00)));
        receipt.items.push(ParsedItem::new("Salad", 1, dec!(8.00)));
        receipt.items.push(ParsedItem::new("Nachos", 1, dec!(10.00)));
        receipt.totals.subtotal = Some(dec!(30.00));
        receipt.totals.tax = Some(dec!(2.70));
        receipt.totals.tip = Some(dec!(6.00));
        receipt
    }

    fn request(receipt: ParsedReceipt) -> SplitRequest {
        let mut req = SplitRequest::new(receipt);
        req.participants = vec![
            ParticipantInput::new("bob", "Bob"),
            ParticipantInput::new("alice", "Alice"),
            ParticipantInput::new("carol", "Carol"),
        ];
        req.claims = vec![
            ItemClaim::new(0, ["alice"]),
            ItemClaim::new(1, ["bob"]),
            ItemClaim::new(2, ["alice", "bob", "carol"]),
        ];
        req
    }

    fn session() -> SplitSession {
        SplitSession::new(SplitConfig::default())
    }

    #[test]
    fn test_split_conserves_every_cent() {
        let mut req = request(burger_receipt());
        req.discount = Money::from_cents(300);

        let outcome = session().split(&req).unwrap();

        // 30.00 - 3.00 + 2.70 + 6.00
        assert_eq!(outcome.grand_total(), Money::from_cents(3570));
        assert_eq!(outcome.reconciliation.status, ParseStatus::Parsed);
        assert!(outcome.warnings.is_empty());

        let items: Money = outcome.totals.iter().map(|t| t.items_subtotal).sum();
        assert_eq!(items, Money::from_cents(3000));
        let tax: Money = outcome.totals.iter().map(|t| t.tax_alloc).sum();
        assert_eq!(tax, Money::from_cents(270));
    }

    #[test]
    fn test_shared_item_odd_cents_go_by_id_order() {
        let outcome = session().split(&request(burger_receipt())).unwrap();

        let ids: Vec<&str> = outcome
            .totals
            .iter()
            .map(|t| t.participant_id.as_str())
            .collect();
        assert_eq!(ids, vec!["alice", "bob", "carol"]);

        // Nachos 10.00 / 3 = 3.34 + 3.33 + 3.33, alice first by id.
        assert_eq!(
            outcome.total_for("alice").unwrap().items_subtotal,
            Money::from_cents(1200 + 334)
        );
        assert_eq!(
            outcome.total_for("bob").unwrap().items_subtotal,
            Money::from_cents(800 + 333)
        );
        assert_eq!(
            outcome.total_for("carol").unwrap().items_subtotal,
            Money::from_cents(333)
        );
    }

    #[test]
    fn test_failed_parse_is_unusable() {
        let mut receipt = burger_receipt();
        receipt.totals = Default::default();

        let err = session().split(&request(receipt)).unwrap_err();
        assert!(matches!(err, SplitError::ReceiptUnusable { ref reason } if reason == "no totals found"));
    }

    #[test]
    fn test_mismatch_requires_confirmation() {
        let mut receipt = burger_receipt();
        receipt.totals.subtotal = Some(dec!(31.00));

        let mut req = request(receipt);
        let err = session().split(&req).unwrap_err();
        assert!(matches!(err, SplitError::ConfirmationRequired { .. }));

        req.confirmed = true;
        let outcome = session().split(&req).unwrap();
        assert_eq!(outcome.reconciliation.status, ParseStatus::NeedsAdjustment);
        assert!(outcome
            .audit
            .iter()
            .any(|e| e.kind == AuditKind::DiscrepancyAccepted));
        // Allocations follow the items, not the stated subtotal.
        assert_eq!(outcome.grand_total(), Money::from_cents(3000 + 270 + 600));
    }

    #[test]
    fn test_confirmation_can_be_disabled() {
        let mut receipt = burger_receipt();
        receipt.totals.subtotal = Some(dec!(31.00));

        let mut config = SplitConfig::default();
        config.reconcile.require_confirmation = false;

        let outcome = SplitSession::new(config).split(&request(receipt)).unwrap();
        assert!(outcome.reconciliation.needs_adjustment);
    }

    #[test]
    fn test_wider_tolerance_accepts_small_mismatch() {
        let mut receipt = burger_receipt();
        receipt.totals.subtotal = Some(dec!(30.05));

        assert!(session().split(&request(receipt.clone())).is_err());

        let mut config = SplitConfig::default();
        config.reconcile.tolerance_cents = 5;
        let outcome = SplitSession::new(config).split(&request(receipt)).unwrap();
        assert_eq!(outcome.reconciliation.status, ParseStatus::Parsed);
    }

    #[test]
    fn test_unclaimed_item_rejected() {
        let mut req = request(burger_receipt());
        req.claims.pop();

        let err = session().split(&req).unwrap_err();
        assert!(matches!(err, SplitError::UnclaimedItem { index: 2, .. }));
    }

    #[test]
    fn test_bad_claims_rejected() {
        let mut req = request(burger_receipt());
        req.claims.push(ItemClaim::new(0, ["dave"]));
        assert!(matches!(
            session().split(&req).unwrap_err(),
            SplitError::Core(CoreError::UnknownParticipant(ref id)) if id == "dave"
        ));

        let mut req = request(burger_receipt());
        req.claims.push(ItemClaim::new(9, ["alice"]));
        assert!(matches!(
            session().split(&req).unwrap_err(),
            SplitError::Core(CoreError::ItemIndexOutOfRange { index: 9, len: 3 })
        ));
    }

    #[test]
    fn test_duplicate_participants_rejected() {
        let mut req = request(burger_receipt());
        req.participants.push(ParticipantInput::new("alice", "Alice Again"));

        assert!(matches!(
            session().split(&req).unwrap_err(),
            SplitError::Core(CoreError::Validation(ValidationError::Duplicate { .. }))
        ));
    }

    #[test]
    fn test_repeated_claims_count_once() {
        let mut req = request(burger_receipt());
        req.claims.push(ItemClaim::new(0, ["alice", "alice"]));

        let outcome = session().split(&req).unwrap();
        assert_eq!(
            outcome.total_for("alice").unwrap().items_subtotal,
            Money::from_cents(1534)
        );
    }

    #[test]
    fn test_zero_subtotal_participants_split_equally() {
        let mut receipt = ParsedReceipt::default();
        receipt.items.push(ParsedItem::new("Comp Dessert", 1, dec!(0.00)));
        receipt.totals.subtotal = Some(dec!(0.00));
        receipt.totals.total = Some(dec!(3.00));
        receipt.totals.tip = Some(dec!(3.00));

        let mut req = SplitRequest::new(receipt);
        req.participants = vec![
            ParticipantInput::new("a", "A"),
            ParticipantInput::new("b", "B"),
        ];
        req.claims = vec![ItemClaim::new(0, ["a", "b"])];

        let outcome = session().split(&req).unwrap();
        assert_eq!(outcome.grand_total(), Money::from_cents(300));
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome
            .audit
            .iter()
            .any(|e| e.kind == AuditKind::AllocationWarning));
    }

    #[test]
    fn test_negative_tax_is_ignored_and_audited() {
        let mut receipt = burger_receipt();
        receipt.totals.tax = Some(dec!(-1.00));

        let outcome = session().split(&request(receipt)).unwrap();
        assert!(outcome.charges.tax.is_zero());
        assert!(outcome.audit.iter().any(|e| e.kind == AuditKind::ChargeIgnored));
    }

    #[test]
    fn test_hints_report_ignored_lines() {
        let mut receipt = burger_receipt();
        receipt.raw_text = "BURGER 12.00\nBAG FEE 0.10\nTOTAL 38.70".to_string();

        let mut req = request(receipt);
        req.hints = Some(NormalizerHints::default().with_ignore_phrases(["bag fee"]));

        let outcome = session().split(&req).unwrap();
        let entry = outcome
            .audit
            .iter()
            .find(|e| e.kind == AuditKind::LinesIgnored)
            .unwrap();
        assert!(entry.message.starts_with("2 receipt line(s)"));
    }

    #[test]
    fn test_config_phrases_apply_without_request_hints() {
        let mut receipt = burger_receipt();
        receipt.raw_text = "BURGER 12.00\nBAG FEE 0.10\nNACHOS 10.00".to_string();

        let mut config = SplitConfig::default();
        let outcome = SplitSession::new(config.clone())
            .split(&request(receipt.clone()))
            .unwrap();
        assert!(outcome.audit.iter().all(|e| e.kind != AuditKind::LinesIgnored));

        config.vocabulary.extra_phrases = vec!["bag fee".to_string()];
        let outcome = SplitSession::new(config).split(&request(receipt)).unwrap();
        let entry = outcome
            .audit
            .iter()
            .find(|e| e.kind == AuditKind::LinesIgnored)
            .unwrap();
        assert_eq!(entry.message, "1 receipt line(s) not treated as items: BAG FEE 0.10");
    }

    #[test]
    fn test_invalid_request_hints_rejected() {
        let mut req = request(burger_receipt());
        req.hints = Some(NormalizerHints::new("dollars"));

        assert!(matches!(
            session().split(&req).unwrap_err(),
            SplitError::Core(CoreError::Validation(ValidationError::InvalidFormat { .. }))
        ));
    }

    #[test]
    fn test_request_json_defaults() {
        let json = r#"{
            "receipt": {
                "items": [{"description": "Tea", "qty": 2, "unit_price": "1.50"}],
                "totals": {"subtotal": "3.00"}
            },
            "participants": [{"id": "a", "display_name": "A"}],
            "claims": [{"item_index": 0, "participant_ids": ["a"]}]
        }"#;

        let req: SplitRequest = serde_json::from_str(json).unwrap();
        assert!(req.discount.is_zero());
        assert!(!req.confirmed);

        let outcome = session().split(&req).unwrap();
        assert_eq!(outcome.receipt_id, req.receipt_id);
        assert_eq!(outcome.grand_total(), Money::from_cents(300));
    }
}
