use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{AgingReport, Company, Customer, Invoice, LedgerSummary, Payment, Transaction};

/// How statement lines are ordered for display. Running balances are always
/// computed in ascending order first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayOrder {
    Ascending,
    #[default]
    Descending,
}

impl DisplayOrder {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Some(DisplayOrder::Ascending),
            "desc" | "descending" => Some(DisplayOrder::Descending),
            _ => None,
        }
    }
}

/// A customer's statement for one company and date range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerLedger {
    pub company: Company,
    pub customer: Customer,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub transactions: Vec<Transaction>,
    pub invoices: Vec<Invoice>,
    pub payments: Vec<Payment>,
    pub aging: AgingReport,
    pub summary: LedgerSummary,
}

/// Parameters of a ledger request.
#[derive(Debug, Clone)]
pub struct LedgerQuery {
    pub company_id: String,
    pub customer_id: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    /// Reference date for aging; normally today.
    pub today: NaiveDate,
    pub order: DisplayOrder,
}

/// One customer's line in a company-wide aging list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerAging {
    pub customer: Customer,
    pub aging: AgingReport,
}
