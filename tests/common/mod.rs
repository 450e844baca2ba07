// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use boutique_ledger::application::{
    CustomerLedger, DisplayOrder, LedgerQuery, LedgerService, NewPayment, NewSale,
};
use boutique_ledger::domain::{Cents, Company, Customer, PaymentMethod};
use chrono::NaiveDate;
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = LedgerService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Helper to parse a YYYY-MM-DD date
pub fn date(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
}

/// A company with one customer, ready for documents.
pub struct Shop {
    pub company: Company,
    pub customer: Customer,
}

impl Shop {
    pub async fn open(service: &LedgerService) -> Result<Self> {
        Self::open_with_opening_balance(service, 0).await
    }

    pub async fn open_with_opening_balance(
        service: &LedgerService,
        opening_balance: Cents,
    ) -> Result<Self> {
        let company = service.create_company("Atelier Noor", "PKR").await?;
        let customer = service
            .create_customer(
                &company.id.to_string(),
                "Ayesha Khan",
                Some("0300-1234567".into()),
                None,
                opening_balance,
            )
            .await?;
        Ok(Self { company, customer })
    }

    pub fn company_id(&self) -> String {
        self.company.id.to_string()
    }

    pub fn customer_id(&self) -> String {
        self.customer.id.to_string()
    }

    pub async fn sale(
        &self,
        service: &LedgerService,
        invoice_no: &str,
        on: &str,
        subtotal: Cents,
        discount: Cents,
    ) -> Result<()> {
        service
            .record_sale(
                &self.company_id(),
                &self.customer_id(),
                NewSale {
                    invoice_no: invoice_no.into(),
                    date: date(on),
                    subtotal,
                    discount,
                    notes: None,
                },
            )
            .await?;
        Ok(())
    }

    pub async fn pay(
        &self,
        service: &LedgerService,
        on: &str,
        amount: Cents,
        invoice_no: Option<&str>,
    ) -> Result<()> {
        service
            .record_payment(
                &self.company_id(),
                &self.customer_id(),
                NewPayment {
                    reference_no: None,
                    date: date(on),
                    amount,
                    method: PaymentMethod::Cash,
                    invoice_no: invoice_no.map(String::from),
                    notes: None,
                },
            )
            .await?;
        Ok(())
    }

    pub async fn ledger(
        &self,
        service: &LedgerService,
        from: &str,
        to: &str,
        today: &str,
    ) -> Result<CustomerLedger> {
        Ok(service
            .customer_ledger(LedgerQuery {
                company_id: self.company_id(),
                customer_id: self.customer_id(),
                from_date: date(from),
                to_date: date(to),
                today: date(today),
                order: DisplayOrder::Ascending,
            })
            .await?)
    }
}
