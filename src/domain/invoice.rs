use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Cents;

/// Payment state of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Unpaid,
    PartiallyPaid,
    FullyPaid,
}

impl InvoiceStatus {
    /// Status as a pure function of the invoice total and the amount paid.
    ///
    /// Nothing paid is `Unpaid` even for a zero total, anything short of the
    /// total is `PartiallyPaid`, and reaching or exceeding it is `FullyPaid`.
    pub fn derive(invoice_total: Cents, paid_amount: Cents) -> Self {
        if paid_amount <= 0 {
            InvoiceStatus::Unpaid
        } else if paid_amount < invoice_total {
            InvoiceStatus::PartiallyPaid
        } else {
            InvoiceStatus::FullyPaid
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Unpaid => "unpaid",
            InvoiceStatus::PartiallyPaid => "partially_paid",
            InvoiceStatus::FullyPaid => "fully_paid",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "unpaid" => Some(InvoiceStatus::Unpaid),
            "partially_paid" | "partial" => Some(InvoiceStatus::PartiallyPaid),
            "fully_paid" | "paid" => Some(InvoiceStatus::FullyPaid),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            InvoiceStatus::Unpaid => "Unpaid",
            InvoiceStatus::PartiallyPaid => "Partially Paid",
            InvoiceStatus::FullyPaid => "Fully Paid",
        }
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Where an invoice came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceSource {
    Sale,
    Studio,
}

impl InvoiceSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceSource::Sale => "sale",
            InvoiceSource::Studio => "studio",
        }
    }
}

/// Read-side view of a billable document, with its status recomputed from
/// the amounts rather than trusted from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub invoice_no: String,
    pub source: InvoiceSource,
    pub date: NaiveDate,
    pub invoice_total: Cents,
    pub paid_amount: Cents,
    pub pending_amount: Cents,
    pub status: InvoiceStatus,
}

impl Invoice {
    pub fn new(
        invoice_no: impl Into<String>,
        source: InvoiceSource,
        date: NaiveDate,
        invoice_total: Cents,
        paid_amount: Cents,
    ) -> Self {
        Self {
            invoice_no: invoice_no.into(),
            source,
            date,
            invoice_total,
            paid_amount,
            pending_amount: (invoice_total - paid_amount).max(0),
            status: InvoiceStatus::derive(invoice_total, paid_amount),
        }
    }

    pub fn is_outstanding(&self) -> bool {
        self.pending_amount > 0
    }
}
