use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::{Cents, CompanyId, CustomerId, Invoice, InvoiceSource, InvoiceStatus};

pub type SaleId = Uuid;
pub type StudioProductionId = Uuid;
pub type PaymentId = Uuid;

/// A point-of-sale invoice. `total` is always `subtotal - discount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub id: SaleId,
    pub company_id: CompanyId,
    pub customer_id: CustomerId,
    pub invoice_no: String,
    pub sale_date: NaiveDate,
    pub subtotal: Cents,
    pub discount: Cents,
    pub total: Cents,
    pub paid_amount: Cents,
    /// Written together with `paid_amount`; see [`InvoiceStatus::derive`].
    pub status: InvoiceStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Sale {
    pub fn new(
        company_id: CompanyId,
        customer_id: CustomerId,
        invoice_no: impl Into<String>,
        sale_date: NaiveDate,
        subtotal: Cents,
        discount: Cents,
    ) -> Self {
        let total = subtotal - discount;
        Self {
            id: Uuid::new_v4(),
            company_id,
            customer_id,
            invoice_no: invoice_no.into(),
            sale_date,
            subtotal,
            discount,
            total,
            paid_amount: 0,
            status: InvoiceStatus::derive(total, 0),
            notes: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn pending(&self) -> Cents {
        (self.total - self.paid_amount).max(0)
    }

    pub fn apply_payment(&mut self, amount: Cents) {
        self.paid_amount += amount;
        self.status = InvoiceStatus::derive(self.total, self.paid_amount);
    }

    pub fn to_invoice(&self) -> Invoice {
        Invoice::new(
            self.invoice_no.clone(),
            InvoiceSource::Sale,
            self.sale_date,
            self.total,
            self.paid_amount,
        )
    }
}

/// Production stage of a studio (tailoring/customisation) job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudioStage {
    Draft,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot move studio production from {from} to {to}")]
pub struct StageTransitionError {
    pub from: StudioStage,
    pub to: StudioStage,
}

impl StudioStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            StudioStage::Draft => "draft",
            StudioStage::InProgress => "in_progress",
            StudioStage::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "draft" => Some(StudioStage::Draft),
            "in_progress" => Some(StudioStage::InProgress),
            "completed" => Some(StudioStage::Completed),
            _ => None,
        }
    }

    /// The only stage reachable from this one, if any.
    pub fn next(&self) -> Option<Self> {
        match self {
            StudioStage::Draft => Some(StudioStage::InProgress),
            StudioStage::InProgress => Some(StudioStage::Completed),
            StudioStage::Completed => None,
        }
    }

    pub fn transition_to(&self, to: StudioStage) -> Result<StudioStage, StageTransitionError> {
        if self.next() == Some(to) {
            Ok(to)
        } else {
            Err(StageTransitionError { from: *self, to })
        }
    }

    /// Drafts are quotes and do not bill the customer yet.
    pub fn is_billable(&self) -> bool {
        !matches!(self, StudioStage::Draft)
    }
}

impl std::fmt::Display for StudioStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudioProduction {
    pub id: StudioProductionId,
    pub company_id: CompanyId,
    pub customer_id: CustomerId,
    pub production_no: String,
    pub production_date: NaiveDate,
    pub total_amount: Cents,
    pub paid_amount: Cents,
    pub status: InvoiceStatus,
    pub stage: StudioStage,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl StudioProduction {
    pub fn new(
        company_id: CompanyId,
        customer_id: CustomerId,
        production_no: impl Into<String>,
        production_date: NaiveDate,
        total_amount: Cents,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            company_id,
            customer_id,
            production_no: production_no.into(),
            production_date,
            total_amount,
            paid_amount: 0,
            status: InvoiceStatus::derive(total_amount, 0),
            stage: StudioStage::Draft,
            description: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn pending(&self) -> Cents {
        (self.total_amount - self.paid_amount).max(0)
    }

    pub fn apply_payment(&mut self, amount: Cents) {
        self.paid_amount += amount;
        self.status = InvoiceStatus::derive(self.total_amount, self.paid_amount);
    }

    pub fn to_invoice(&self) -> Invoice {
        Invoice::new(
            self.production_no.clone(),
            InvoiceSource::Studio,
            self.production_date,
            self.total_amount,
            self.paid_amount,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    BankTransfer,
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "cash" => Some(PaymentMethod::Cash),
            "card" => Some(PaymentMethod::Card),
            "bank_transfer" | "bank" => Some(PaymentMethod::BankTransfer),
            "other" => Some(PaymentMethod::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Money received from a customer, optionally allocated to one invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub company_id: CompanyId,
    pub customer_id: CustomerId,
    pub reference_no: String,
    pub payment_date: NaiveDate,
    pub amount: Cents,
    pub method: PaymentMethod,
    pub invoice_no: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    pub fn new(
        company_id: CompanyId,
        customer_id: CustomerId,
        reference_no: impl Into<String>,
        payment_date: NaiveDate,
        amount: Cents,
        method: PaymentMethod,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            company_id,
            customer_id,
            reference_no: reference_no.into(),
            payment_date,
            amount,
            method,
            invoice_no: None,
            notes: None,
            created_at: Utc::now(),
        }
    }

    pub fn allocated_to(mut self, invoice_no: impl Into<String>) -> Self {
        self.invoice_no = Some(invoice_no.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 10).unwrap()
    }

    #[test]
    fn test_sale_total_is_net_of_discount() {
        let sale = Sale::new(Uuid::new_v4(), Uuid::new_v4(), "INV-1", date(), 10_000, 1_500);
        assert_eq!(sale.total, 8_500);
        assert_eq!(sale.pending(), 8_500);
        assert_eq!(sale.status, InvoiceStatus::Unpaid);
    }

    #[test]
    fn test_sale_status_tracks_payments() {
        let mut sale = Sale::new(Uuid::new_v4(), Uuid::new_v4(), "INV-1", date(), 10_000, 0);
        sale.apply_payment(4_000);
        assert_eq!(sale.status, InvoiceStatus::PartiallyPaid);
        assert_eq!(sale.pending(), 6_000);

        sale.apply_payment(6_000);
        assert_eq!(sale.status, InvoiceStatus::FullyPaid);
        assert_eq!(sale.to_invoice().status, sale.status);
    }

    #[test]
    fn test_studio_stage_moves_forward_one_step() {
        assert_eq!(
            StudioStage::Draft.transition_to(StudioStage::InProgress),
            Ok(StudioStage::InProgress)
        );
        assert_eq!(
            StudioStage::InProgress.transition_to(StudioStage::Completed),
            Ok(StudioStage::Completed)
        );
        assert!(StudioStage::Draft.transition_to(StudioStage::Completed).is_err());
        assert!(StudioStage::Completed.transition_to(StudioStage::Draft).is_err());
        assert!(StudioStage::InProgress.transition_to(StudioStage::InProgress).is_err());
    }

    #[test]
    fn test_only_drafts_are_unbilled() {
        assert!(!StudioStage::Draft.is_billable());
        assert!(StudioStage::InProgress.is_billable());
        assert!(StudioStage::Completed.is_billable());
    }

    #[test]
    fn test_payment_method_parsing() {
        assert_eq!(PaymentMethod::from_str("Bank-Transfer"), Some(PaymentMethod::BankTransfer));
        assert_eq!(PaymentMethod::from_str("CASH"), Some(PaymentMethod::Cash));
        assert_eq!(PaymentMethod::from_str("cheque"), None);
    }
}
