//! Finance report shape: read-only aggregation over a period.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vestry_core::ParishId;

/// Per-fund contribution total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundTotal {
    pub fund: String,
    pub total_cents: i64,
}

/// Offering and contribution income, completed-payment outgo, and net, for a
/// parish (or all parishes) over an optional period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinanceReport {
    pub parish_id: Option<ParishId>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub offering_total_cents: i64,
    pub contribution_total_cents: i64,
    pub completed_payment_total_cents: i64,
    pub net_cents: i64,
    pub contributions_by_fund: Vec<FundTotal>,
}
