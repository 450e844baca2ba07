use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Cents;

pub type CompanyId = Uuid;
pub type CustomerId = Uuid;

/// A trading company. Every ledger record is scoped to exactly one company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

impl Company {
    pub fn new(name: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            currency: currency.into().to_uppercase(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub company_id: CompanyId,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Balance carried forward from before the first recorded document.
    /// Positive means the customer owes the company.
    pub opening_balance: Cents,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    pub fn new(company_id: CompanyId, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            company_id,
            name: name.into(),
            phone: None,
            email: None,
            opening_balance: 0,
            created_at: Utc::now(),
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_opening_balance(mut self, opening_balance: Cents) -> Self {
        self.opening_balance = opening_balance;
        self
    }

    pub fn belongs_to(&self, company_id: CompanyId) -> bool {
        self.company_id == company_id
    }
}
