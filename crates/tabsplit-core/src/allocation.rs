//! # Allocation Engine
//!
//! Distributes discount, tax and tip across participants in proportion to
//! their item subtotals, to the exact cent.
//!
//! ## Largest-Remainder Method
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  tax $1.00, three people with $10.00 each (S = $30.00)                 │
//! │                                                                         │
//! │  raw share   r_i = A × s_i / S     0.3333  0.3333  0.3333              │
//! │  rounded     c_i = round2(r_i)     0.33    0.33    0.33   (Σ 0.99)     │
//! │  drift       A - Σ c_i             +0.01                               │
//! │                                                                         │
//! │  drift > 0: largest remainder first, ties by caller order              │
//! │  final                             0.34    0.33    0.33   (Σ 1.00) ✓   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All arithmetic is exact: shares are rationals over the common denominator
//! `S` (in cents), so remainders compare as integers and no float or decimal
//! rounding can leak a cent.
//!
//! ## Zero Base
//! When every participant has a zero subtotal, a positive amount cannot be
//! prorated. It is split equally instead and an [`AllocationWarning`] is
//! returned so the caller can flag it.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{MutableTotal, ParticipantId};
use crate::validation::{validate_non_negative, validate_participant_ids};

// =============================================================================
// Charges
// =============================================================================

/// Which aggregate amount is being allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ChargeComponent {
    Discount,
    Tax,
    Tip,
}

impl ChargeComponent {
    /// Allocation order. Each component is allocated independently.
    pub const ALL: [ChargeComponent; 3] = [
        ChargeComponent::Discount,
        ChargeComponent::Tax,
        ChargeComponent::Tip,
    ];

    fn slot(self, total: &mut MutableTotal) -> &mut Money {
        match self {
            ChargeComponent::Discount => &mut total.discount_alloc,
            ChargeComponent::Tax => &mut total.tax_alloc,
            ChargeComponent::Tip => &mut total.tip_alloc,
        }
    }
}

impl std::fmt::Display for ChargeComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChargeComponent::Discount => write!(f, "discount"),
            ChargeComponent::Tax => write!(f, "tax"),
            ChargeComponent::Tip => write!(f, "tip"),
        }
    }
}

/// Aggregate amounts to distribute. All must be non-negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Charges {
    #[serde(default)]
    pub discount: Money,
    #[serde(default)]
    pub tax: Money,
    #[serde(default)]
    pub tip: Money,
}

impl Charges {
    pub fn get(&self, component: ChargeComponent) -> Money {
        match component {
            ChargeComponent::Discount => self.discount,
            ChargeComponent::Tax => self.tax,
            ChargeComponent::Tip => self.tip,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.discount.is_zero() && self.tax.is_zero() && self.tip.is_zero()
    }
}

// =============================================================================
// Results
// =============================================================================

/// A condition the caller must surface (audit trail), not a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AllocationWarning {
    /// Every subtotal was zero, so `amount` was split equally.
    ZeroBaseEqualSplit {
        component: ChargeComponent,
        amount: Money,
        participants: usize,
    },
}

impl std::fmt::Display for AllocationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AllocationWarning::ZeroBaseEqualSplit {
                component,
                amount,
                participants,
            } => write!(
                f,
                "{} of {} split equally across {} participants (no item subtotals to prorate against)",
                component, amount, participants
            ),
        }
    }
}

/// What one participant received in a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ParticipantAllocation {
    pub participant_id: ParticipantId,
    pub discount_alloc: Money,
    pub tax_alloc: Money,
    pub tip_alloc: Money,
}

/// Result of [`allocate`], in the caller's participant order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AllocationReport {
    pub allocations: Vec<ParticipantAllocation>,
    pub warnings: Vec<AllocationWarning>,
}

impl AllocationReport {
    pub fn get(&self, participant_id: &str) -> Option<&ParticipantAllocation> {
        self.allocations
            .iter()
            .find(|a| a.participant_id == participant_id)
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Output of [`prorate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proration {
    /// One share per weight, same order. Always sums to the amount.
    pub shares: Vec<Money>,
    /// True when all weights were zero and the amount was split equally.
    pub fallback: bool,
}

// =============================================================================
// Proration
// =============================================================================

/// Splits `amount` in proportion to `weights`, exact to the cent.
///
/// ## Example
/// ```rust
/// use tabsplit_core::allocation::prorate;
/// use tabsplit_core::money::Money;
///
/// let weights = [Money::from_cents(1000); 3];
/// let p = prorate(Money::from_cents(100), &weights).unwrap();
/// assert_eq!(p.shares, vec![Money::from_cents(34), Money::from_cents(33), Money::from_cents(33)]);
/// ```
///
/// ## Errors
/// - `Validation` if `amount` or any weight is negative
/// - `NoParticipants` if `weights` is empty and `amount` is positive
pub fn prorate(amount: Money, weights: &[Money]) -> CoreResult<Proration> {
    validate_non_negative("amount", amount)?;
    for (index, weight) in weights.iter().enumerate() {
        validate_non_negative(&format!("weights[{}]", index), *weight)?;
    }

    if weights.is_empty() {
        if amount.is_zero() {
            return Ok(Proration {
                shares: Vec::new(),
                fallback: false,
            });
        }
        return Err(CoreError::NoParticipants {
            amount: amount.to_string(),
        });
    }

    if amount.is_zero() {
        return Ok(Proration {
            shares: vec![Money::zero(); weights.len()],
            fallback: false,
        });
    }

    let total_weight: i128 = weights.iter().map(|w| w.cents() as i128).sum();
    let fallback = total_weight == 0;
    let (weights, base): (Vec<i128>, i128) = if fallback {
        (vec![1; weights.len()], weights.len() as i128)
    } else {
        (weights.iter().map(|w| w.cents() as i128).collect(), total_weight)
    };

    let amount_cents = amount.cents() as i128;
    let mut shares = Vec::with_capacity(weights.len());
    let mut remainders = Vec::with_capacity(weights.len());
    for weight in &weights {
        // r_i = numerator / base; c_i = round half up (inputs are non-negative)
        let numerator = amount_cents * weight;
        let rounded = (2 * numerator + base) / (2 * base);
        shares.push(rounded);
        remainders.push(numerator - rounded * base);
    }

    let drift = amount_cents - shares.iter().sum::<i128>();
    if drift != 0 {
        let mut order: Vec<usize> = (0..shares.len()).collect();
        if drift > 0 {
            order.sort_by(|&a, &b| remainders[b].cmp(&remainders[a]).then(a.cmp(&b)));
        } else {
            order.sort_by(|&a, &b| remainders[a].cmp(&remainders[b]).then(a.cmp(&b)));
        }

        let step = drift.signum();
        for k in 0..drift.unsigned_abs() as usize {
            shares[order[k % order.len()]] += step;
        }

        let drift_cents = drift as i64;
        debug!(
            amount = %amount,
            drift_cents,
            participants = shares.len(),
            "Redistributed rounding drift"
        );
    }

    debug_assert_eq!(shares.iter().sum::<i128>(), amount_cents);

    Ok(Proration {
        shares: shares
            .into_iter()
            .map(|c| Money::from_cents(c as i64))
            .collect(),
        fallback,
    })
}

// =============================================================================
// Allocation
// =============================================================================

/// Allocates discount, tax and tip into each participant's [`MutableTotal`].
///
/// `totals` must be in a stable order (e.g. sorted by participant id): that
/// order breaks ties when leftover cents are handed out.
///
/// ## User Workflow
/// ```text
/// reconcile() → owner confirms → item subtotals per participant
///      │
///      ▼
/// allocate(&mut totals, &charges) ← THIS FUNCTION
///      │
///      ├── Σ discount_alloc == charges.discount
///      ├── Σ tax_alloc      == charges.tax
///      └── Σ tip_alloc      == charges.tip
/// ```
///
/// ## Errors
/// Nothing is written if an error is returned.
/// - `Validation`: empty/duplicate ids, negative subtotal or charge
/// - `NoParticipants`: positive charges with an empty `totals`
/// - `AmountOutOfRange`: items + tax + tip does not fit in cents
pub fn allocate(totals: &mut [MutableTotal], charges: &Charges) -> CoreResult<AllocationReport> {
    validate_participant_ids(totals.iter().map(|t| t.participant_id.as_str()))?;
    for component in ChargeComponent::ALL {
        validate_non_negative(&component.to_string(), charges.get(component))?;
    }
    for total in totals.iter() {
        validate_non_negative(
            &format!("{}.items_subtotal", total.participant_id),
            total.items_subtotal,
        )?;
    }
    if totals.is_empty() && !charges.is_zero() {
        let amount = charges
            .discount
            .checked_add(charges.tax)
            .and_then(|sum| sum.checked_add(charges.tip))
            .map(|sum| sum.to_string())
            .unwrap_or_else(|| {
                format!("{} + {} + {}", charges.discount, charges.tax, charges.tip)
            });
        return Err(CoreError::NoParticipants { amount });
    }

    // Every amount_owed is bounded by items + tax + tip; it must fit in cents.
    let gross: i128 = totals
        .iter()
        .map(|t| t.items_subtotal.cents() as i128)
        .sum::<i128>()
        + charges.tax.cents() as i128
        + charges.tip.cents() as i128;
    if gross > i64::MAX as i128 {
        return Err(CoreError::AmountOutOfRange {
            field: "items + tax + tip".to_string(),
            value: gross.to_string(),
        });
    }

    let weights: Vec<Money> = totals.iter().map(|t| t.items_subtotal).collect();
    let mut warnings = Vec::new();

    for component in ChargeComponent::ALL {
        let amount = charges.get(component);
        let proration = prorate(amount, &weights)?;

        if proration.fallback {
            warn!(
                %component,
                %amount,
                participants = totals.len(),
                "Zero item subtotal, splitting equally"
            );
            warnings.push(AllocationWarning::ZeroBaseEqualSplit {
                component,
                amount,
                participants: totals.len(),
            });
        }

        for (total, share) in totals.iter_mut().zip(proration.shares) {
            *component.slot(total) = share;
        }
    }

    let allocations = totals
        .iter()
        .map(|t| ParticipantAllocation {
            participant_id: t.participant_id.clone(),
            discount_alloc: t.discount_alloc,
            tax_alloc: t.tax_alloc,
            tip_alloc: t.tip_alloc,
        })
        .collect();

    Ok(AllocationReport {
        allocations,
        warnings,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn people(subtotals: &[i64]) -> Vec<MutableTotal> {
        subtotals
            .iter()
            .enumerate()
            .map(|(i, cents)| {
                MutableTotal::new(format!("p{}", i), format!("Person {}", i))
                    .with_items_subtotal(Money::from_cents(*cents))
            })
            .collect()
    }

    fn sum_of(totals: &[MutableTotal], component: ChargeComponent) -> Money {
        totals
            .iter()
            .map(|t| match component {
                ChargeComponent::Discount => t.discount_alloc,
                ChargeComponent::Tax => t.tax_alloc,
                ChargeComponent::Tip => t.tip_alloc,
            })
            .sum()
    }

    #[test]
    fn test_equal_shares_remainder_goes_first() {
        let mut totals = people(&[1000, 1000, 1000]);
        let charges = Charges {
            tax: Money::from_cents(100),
            ..Default::default()
        };
        let report = allocate(&mut totals, &charges).unwrap();

        assert_eq!(totals[0].tax_alloc, Money::from_cents(34));
        assert_eq!(totals[1].tax_alloc, Money::from_cents(33));
        assert_eq!(totals[2].tax_alloc, Money::from_cents(33));
        assert_eq!(sum_of(&totals, ChargeComponent::Tax), Money::from_cents(100));
        assert!(!report.has_warnings());
        assert_eq!(report.get("p0").map(|a| a.tax_alloc), Some(Money::from_cents(34)));
    }

    #[test]
    fn test_zero_base_equal_split_warns() {
        let mut totals = people(&[0, 0]);
        let charges = Charges {
            discount: Money::from_cents(200),
            ..Default::default()
        };
        let report = allocate(&mut totals, &charges).unwrap();

        assert_eq!(totals[0].discount_alloc, Money::from_cents(100));
        assert_eq!(totals[1].discount_alloc, Money::from_cents(100));
        assert_eq!(
            report.warnings,
            vec![AllocationWarning::ZeroBaseEqualSplit {
                component: ChargeComponent::Discount,
                amount: Money::from_cents(200),
                participants: 2,
            }]
        );
    }

    #[test]
    fn test_zero_base_zero_amount_no_warning() {
        let mut totals = people(&[0, 0, 0]);
        let report = allocate(&mut totals, &Charges::default()).unwrap();
        assert!(report.warnings.is_empty());
        assert!(totals.iter().all(|t| t.amount_owed().is_zero()));
    }

    #[test]
    fn test_proportional_split() {
        // $20 / $10 of items, $3.00 tip → 2.00 / 1.00
        let mut totals = people(&[2000, 1000]);
        let charges = Charges {
            tip: Money::from_cents(300),
            ..Default::default()
        };
        allocate(&mut totals, &charges).unwrap();
        assert_eq!(totals[0].tip_alloc, Money::from_cents(200));
        assert_eq!(totals[1].tip_alloc, Money::from_cents(100));
    }

    #[test]
    fn test_negative_drift_takes_from_most_rounded_up() {
        // 5 cents over shares 1:1:1:1 → raw 1.25 each → rounded 1 each, drift +1.
        // 2 cents over 1:1:1 → raw 0.667 → rounded 1 each, drift -1, the
        // first in order gives one back.
        let p = prorate(Money::from_cents(2), &[Money::from_cents(1); 3]).unwrap();
        assert_eq!(
            p.shares,
            vec![Money::from_cents(0), Money::from_cents(1), Money::from_cents(1)]
        );

        let p = prorate(Money::from_cents(5), &[Money::from_cents(1); 4]).unwrap();
        assert_eq!(p.shares.iter().sum::<Money>(), Money::from_cents(5));
        assert_eq!(p.shares[0], Money::from_cents(2));
    }

    #[test]
    fn test_positive_drift_goes_to_largest_remainder() {
        // 1 cent over 3:3:4 → raw 0.3 / 0.3 / 0.4 → rounded 0 / 0 / 0, drift +1.
        // The last participant has the largest remainder and gets the cent.
        let weights = [Money::from_cents(3), Money::from_cents(3), Money::from_cents(4)];
        let p = prorate(Money::from_cents(1), &weights).unwrap();
        assert_eq!(
            p.shares,
            vec![Money::from_cents(0), Money::from_cents(0), Money::from_cents(1)]
        );
    }

    #[test]
    fn test_negative_drift_taken_from_smallest_remainder() {
        // 2 cents over 4:4:3 → raw 0.727 / 0.727 / 0.545 → rounded 1 / 1 / 1,
        // drift -1. The last participant was rounded up the most and gives
        // the cent back, not the first.
        let weights = [Money::from_cents(4), Money::from_cents(4), Money::from_cents(3)];
        let p = prorate(Money::from_cents(2), &weights).unwrap();
        assert_eq!(
            p.shares,
            vec![Money::from_cents(1), Money::from_cents(1), Money::from_cents(0)]
        );

        // 2 cents over 4:3:3 → raw 0.8 / 0.6 / 0.6, drift -1: the tie at 0.6
        // is broken by order, so the middle participant gives back.
        let weights = [Money::from_cents(4), Money::from_cents(3), Money::from_cents(3)];
        let p = prorate(Money::from_cents(2), &weights).unwrap();
        assert_eq!(
            p.shares,
            vec![Money::from_cents(1), Money::from_cents(0), Money::from_cents(1)]
        );
    }

    #[test]
    fn test_largest_remainder_wins_over_order() {
        // weights 1, 2 over 1 cent: raw 0.333 / 0.667 → rounded 0 / 1, no drift.
        let p = prorate(Money::from_cents(1), &[Money::from_cents(1), Money::from_cents(2)]).unwrap();
        assert_eq!(p.shares, vec![Money::from_cents(0), Money::from_cents(1)]);

        // weights 1, 1, 2 over 2 cents: raw 0.5 / 0.5 / 1.0 → rounded 1 / 1 / 1,
        // drift -1: the ties at remainder -0.5 are p0 and p1, p0 gives back.
        let p = prorate(
            Money::from_cents(2),
            &[Money::from_cents(1), Money::from_cents(1), Money::from_cents(2)],
        )
        .unwrap();
        assert_eq!(
            p.shares,
            vec![Money::from_cents(0), Money::from_cents(1), Money::from_cents(1)]
        );
    }

    #[test]
    fn test_conservation_across_shapes() {
        let shapes: &[&[i64]] = &[
            &[1],
            &[1, 1],
            &[333, 333, 334],
            &[1299, 399, 500],
            &[1, 0, 0, 7],
            &[5, 5, 5, 5, 5, 5, 5],
            &[99_999, 1, 12_345, 0, 42],
        ];
        let amounts = [0, 1, 2, 7, 99, 100, 101, 176, 440, 12_345, 1_000_003];

        for shape in shapes {
            for &amount in &amounts {
                let mut totals = people(shape);
                let charges = Charges {
                    discount: Money::from_cents(amount),
                    tax: Money::from_cents(amount / 3),
                    tip: Money::from_cents(amount * 2 + 1),
                };
                allocate(&mut totals, &charges).unwrap();

                for component in ChargeComponent::ALL {
                    assert_eq!(
                        sum_of(&totals, component),
                        charges.get(component),
                        "{} leaked for shape {:?}",
                        component,
                        shape
                    );
                }
                assert!(totals.iter().all(|t| !t.tax_alloc.is_negative()));
            }
        }
    }

    #[test]
    fn test_equal_shares_differ_by_at_most_one_cent() {
        for n in 1..=9 {
            let mut totals = people(&vec![1234; n]);
            for amount in [1, 10, 99, 1000, 9999] {
                let charges = Charges {
                    tip: Money::from_cents(amount),
                    ..Default::default()
                };
                allocate(&mut totals, &charges).unwrap();
                let max = totals.iter().map(|t| t.tip_alloc).max().unwrap();
                let min = totals.iter().map(|t| t.tip_alloc).min().unwrap();
                assert!((max - min).cents() <= 1, "n={} amount={}", n, amount);
            }
        }
    }

    #[test]
    fn test_invalid_input_rejected_without_writing() {
        let mut totals = people(&[1000, -1]);
        let charges = Charges {
            tax: Money::from_cents(100),
            ..Default::default()
        };
        assert!(matches!(
            allocate(&mut totals, &charges),
            Err(CoreError::Validation(_))
        ));
        assert!(totals[0].tax_alloc.is_zero());

        let mut totals = people(&[1000]);
        let negative = Charges {
            tip: Money::from_cents(-5),
            ..Default::default()
        };
        assert!(allocate(&mut totals, &negative).is_err());

        let mut dupes = vec![MutableTotal::new("a", "A"), MutableTotal::new("a", "A again")];
        assert!(allocate(&mut dupes, &Charges::default()).is_err());
    }

    #[test]
    fn test_empty_participants() {
        let mut none: Vec<MutableTotal> = Vec::new();
        assert!(allocate(&mut none, &Charges::default()).unwrap().allocations.is_empty());

        let charges = Charges {
            tax: Money::from_cents(1),
            ..Default::default()
        };
        assert!(matches!(
            allocate(&mut none, &charges),
            Err(CoreError::NoParticipants { .. })
        ));
    }

    #[test]
    fn test_oversized_charges_are_errors() {
        let huge = Money::from_cents(i64::MAX - 10);
        let charges = Charges {
            tax: huge,
            tip: huge,
            ..Default::default()
        };

        let mut none: Vec<MutableTotal> = Vec::new();
        match allocate(&mut none, &charges) {
            Err(CoreError::NoParticipants { amount }) => assert!(amount.contains(" + ")),
            other => panic!("expected NoParticipants, got {:?}", other),
        }

        let mut totals = people(&[100, 200]);
        assert!(matches!(
            allocate(&mut totals, &charges),
            Err(CoreError::AmountOutOfRange { .. })
        ));
        assert!(totals.iter().all(|t| t.tax_alloc.is_zero() && t.tip_alloc.is_zero()));
    }

    #[test]
    fn test_warning_display() {
        let warning = AllocationWarning::ZeroBaseEqualSplit {
            component: ChargeComponent::Tip,
            amount: Money::from_cents(500),
            participants: 2,
        };
        assert_eq!(
            warning.to_string(),
            "tip of $5.00 split equally across 2 participants (no item subtotals to prorate against)"
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_independent_passes_run_concurrently() {
        let handles: Vec<_> = (0..16i64)
            .map(|seed| {
                tokio::spawn(async move {
                    let mut totals = people(&[100 + seed, 200, 300 + seed * 7]);
                    let charges = Charges {
                        discount: Money::from_cents(seed),
                        tax: Money::from_cents(97 + seed),
                        tip: Money::from_cents(1001),
                    };
                    allocate(&mut totals, &charges).unwrap();
                    (charges, totals)
                })
            })
            .collect();

        for handle in handles {
            let (charges, totals) = handle.await.unwrap();
            for component in ChargeComponent::ALL {
                assert_eq!(sum_of(&totals, component), charges.get(component));
            }
        }
    }
}
