use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::{Cents, StageTransitionError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid company id: {0}")]
    InvalidCompany(String),

    #[error("Company already exists: {0}")]
    CompanyAlreadyExists(String),

    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    #[error("Invalid date range: {from} is after {to}")]
    InvalidDateRange { from: NaiveDate, to: NaiveDate },

    #[error("Invoice number already in use: {0}")]
    DuplicateInvoiceNumber(String),

    #[error("Invalid invoice number: '{0}'")]
    InvalidInvoiceNumber(String),

    #[error("Invoice not found: {0}")]
    InvoiceNotFound(String),

    #[error("Invoice {0} is a draft studio production and cannot take payments")]
    InvoiceNotBillable(String),

    #[error("Studio production not found: {0}")]
    StudioProductionNotFound(String),

    #[error(transparent)]
    InvalidStageTransition(#[from] StageTransitionError),

    #[error("Payment of {amount} exceeds pending amount {pending} on invoice {invoice_no}")]
    Overpayment {
        invoice_no: String,
        amount: Cents,
        pending: Cents,
    },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}
