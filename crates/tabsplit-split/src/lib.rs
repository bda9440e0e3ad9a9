//! # tabsplit-split: Split Workflow for Tabsplit
//!
//! This crate wires the pure engine in `tabsplit-core` into a complete
//! "split this receipt" operation: configuration, item claims, the owner
//! confirmation gate and an audit trail.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Split Workflow                                  │
//! │                                                                         │
//! │   split.toml + TABSPLIT_* env                                          │
//! │            │                                                            │
//! │            ▼                                                            │
//! │   ┌────────────────┐      ┌──────────────────────────────────────────┐ │
//! │   │  SplitConfig   │─────►│              SplitSession                │ │
//! │   │                │      │                                          │ │
//! │   │ tolerance      │      │  SplitRequest ──► reconcile ──► claims   │ │
//! │   │ confirmation   │      │                        │           │     │ │
//! │   │ vocabulary     │      │                        ▼           ▼     │ │
//! │   │ currency       │      │                 confirmation   allocate  │ │
//! │   └────────────────┘      │                     gate           │     │ │
//! │                           │                                    ▼     │ │
//! │                           │                            SplitOutcome  │ │
//! │                           └──────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//! - [`config`] - TOML/env configuration
//! - [`session`] - The split workflow
//! - [`error`] - Split error types
//!
//! ## Example
//! ```rust
//! use rust_decimal::Decimal;
//! use tabsplit_core::{Money, ParsedItem, ParsedReceipt};
//! use tabsplit_split::{ItemClaim, ParticipantInput, SplitConfig, SplitRequest, SplitSession};
//!
//! let mut receipt = ParsedReceipt::default();
//! receipt.items.push(ParsedItem::new("Pizza", 1, Decimal::new(2000, 2)));
//! receipt.totals.subtotal = Some(Decimal::new(2000, 2));
//! receipt.totals.tax = Some(Decimal::new(180, 2));
//!
//! let mut request = SplitRequest::new(receipt);
//! request.participants = vec![ParticipantInput::new("a", "Ana"), ParticipantInput::new("b", "Ben")];
//! request.claims = vec![ItemClaim::new(0, ["a", "b"])];
//!
//! let outcome = SplitSession::new(SplitConfig::default()).split(&request).unwrap();
//! assert_eq!(outcome.grand_total(), Money::from_cents(2180));
//! ```

pub mod config;
pub mod error;
pub mod session;

pub use config::SplitConfig;
pub use error::{SplitError, SplitResult};
pub use session::{
    AuditEntry, AuditKind, ItemClaim, ParticipantInput, SplitOutcome, SplitRequest, SplitSession,
};
