//! `vestry-finance` — financial domain entities.
//!
//! Offerings (collection income), contributions (pledged giving), outbound
//! payments, and the finance report shape. No ledger arithmetic beyond sums.

pub mod contribution;
pub mod offering;
pub mod payment;
pub mod report;

pub use contribution::{Contribution, ContributionDraft};
pub use offering::{CollectionMethod, Offering, OfferingDraft};
pub use payment::{Payment, PaymentDraft, PaymentStatus};
pub use report::{FinanceReport, FundTotal};
