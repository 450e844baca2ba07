use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::{
    apply_running_balance, check_allocations, format_amount, normalize, AgingReport, Cents,
    Company, Customer, CustomerId, IntegrityReport, Invoice, LedgerSummary, Payment,
    PaymentMethod, Sale, StageTransitionError, StudioProduction, StudioStage, MAX_AMOUNT,
};
use crate::storage::{PaymentOutcome, Repository};

use super::{AppError, CustomerAging, CustomerLedger, DisplayOrder, LedgerQuery};

/// Application service for recording ledger documents and building customer
/// statements. This is the interface every client (CLI, tests) goes through.
pub struct LedgerService {
    repo: Repository,
}

/// Input for [`LedgerService::record_sale`].
#[derive(Debug, Clone)]
pub struct NewSale {
    pub invoice_no: String,
    pub date: NaiveDate,
    pub subtotal: Cents,
    pub discount: Cents,
    pub notes: Option<String>,
}

/// Input for [`LedgerService::record_payment`].
#[derive(Debug, Clone)]
pub struct NewPayment {
    /// Generated when omitted.
    pub reference_no: Option<String>,
    pub date: NaiveDate,
    pub amount: Cents,
    pub method: PaymentMethod,
    pub invoice_no: Option<String>,
    pub notes: Option<String>,
}

/// Result of recording a payment
pub struct PaymentResult {
    pub payment: Payment,
    /// The invoice after allocation, when the payment named one.
    pub invoice: Option<Invoice>,
}

impl LedgerService {
    /// Create a new ledger service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        info!(database = database_path, "initialized ledger database");
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    // ========================
    // Companies and customers
    // ========================

    pub async fn create_company(&self, name: &str, currency: &str) -> Result<Company, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidCompany("name must not be empty".into()));
        }
        if self.repo.get_company_by_name(name).await?.is_some() {
            return Err(AppError::CompanyAlreadyExists(name.to_string()));
        }

        let company = Company::new(name, currency);
        self.repo.save_company(&company).await?;
        info!(company_id = %company.id, name = %company.name, "created company");
        Ok(company)
    }

    pub async fn list_companies(&self) -> Result<Vec<Company>, AppError> {
        Ok(self.repo.list_companies().await?)
    }

    /// Resolve a company id. A missing, malformed or unknown id is rejected
    /// before any ledger data is read.
    pub async fn get_company(&self, company_id: &str) -> Result<Company, AppError> {
        let trimmed = company_id.trim();
        if trimmed.is_empty() {
            return Err(AppError::InvalidCompany("company id is required".into()));
        }
        let id = Uuid::parse_str(trimmed)
            .map_err(|_| AppError::InvalidCompany(company_id.to_string()))?;

        self.repo
            .get_company(id)
            .await?
            .ok_or_else(|| AppError::InvalidCompany(company_id.to_string()))
    }

    pub async fn create_customer(
        &self,
        company_id: &str,
        name: &str,
        phone: Option<String>,
        email: Option<String>,
        opening_balance: Cents,
    ) -> Result<Customer, AppError> {
        ensure_within_limit("Opening balance", opening_balance.saturating_abs())?;
        let company = self.get_company(company_id).await?;

        let mut customer = Customer::new(company.id, name.trim()).with_opening_balance(opening_balance);
        if let Some(phone) = phone {
            customer = customer.with_phone(phone);
        }
        if let Some(email) = email {
            customer = customer.with_email(email);
        }

        self.repo.save_customer(&customer).await?;
        info!(company_id = %company.id, customer_id = %customer.id, "created customer");
        Ok(customer)
    }

    pub async fn list_customers(&self, company_id: &str) -> Result<Vec<Customer>, AppError> {
        let company = self.get_company(company_id).await?;
        Ok(self.repo.list_customers(company.id).await?)
    }

    /// Get a customer, requiring it to belong to `company`.
    pub async fn get_customer(
        &self,
        company: &Company,
        customer_id: &str,
    ) -> Result<Customer, AppError> {
        let id = Uuid::parse_str(customer_id.trim())
            .map_err(|_| AppError::CustomerNotFound(customer_id.to_string()))?;

        match self.repo.get_customer(id).await? {
            Some(customer) if customer.belongs_to(company.id) => Ok(customer),
            _ => Err(AppError::CustomerNotFound(customer_id.to_string())),
        }
    }

    async fn resolve(
        &self,
        company_id: &str,
        customer_id: &str,
    ) -> Result<(Company, Customer), AppError> {
        let company = self.get_company(company_id).await?;
        let customer = self.get_customer(&company, customer_id).await?;
        Ok((company, customer))
    }

    // ========================
    // Billable documents
    // ========================

    pub async fn record_sale(
        &self,
        company_id: &str,
        customer_id: &str,
        sale: NewSale,
    ) -> Result<Sale, AppError> {
        if sale.subtotal <= 0 {
            return Err(AppError::InvalidAmount("Subtotal must be positive".into()));
        }
        ensure_within_limit("Subtotal", sale.subtotal)?;
        if sale.discount < 0 || sale.discount > sale.subtotal {
            return Err(AppError::InvalidAmount(
                "Discount must be between zero and the subtotal".into(),
            ));
        }

        let (company, customer) = self.resolve(company_id, customer_id).await?;
        self.ensure_number_free(&company, &sale.invoice_no).await?;

        let mut record = Sale::new(
            company.id,
            customer.id,
            sale.invoice_no,
            sale.date,
            sale.subtotal,
            sale.discount,
        );
        if let Some(notes) = sale.notes {
            record = record.with_notes(notes);
        }

        self.repo.save_sale(&record).await?;
        info!(invoice_no = %record.invoice_no, total = record.total, "recorded sale");
        Ok(record)
    }

    pub async fn record_studio_production(
        &self,
        company_id: &str,
        customer_id: &str,
        production_no: &str,
        date: NaiveDate,
        total_amount: Cents,
        description: Option<String>,
    ) -> Result<StudioProduction, AppError> {
        if total_amount <= 0 {
            return Err(AppError::InvalidAmount("Total must be positive".into()));
        }
        ensure_within_limit("Total", total_amount)?;

        let (company, customer) = self.resolve(company_id, customer_id).await?;
        self.ensure_number_free(&company, production_no).await?;

        let mut production =
            StudioProduction::new(company.id, customer.id, production_no, date, total_amount);
        if let Some(description) = description {
            production = production.with_description(description);
        }

        self.repo.save_studio_production(&production).await?;
        info!(production_no, total = total_amount, "recorded studio production");
        Ok(production)
    }

    /// Move a studio production one stage forward.
    pub async fn advance_studio_stage(
        &self,
        company_id: &str,
        production_no: &str,
        stage: StudioStage,
    ) -> Result<StudioProduction, AppError> {
        let company = self.get_company(company_id).await?;
        let mut production = self
            .repo
            .get_studio_production(company.id, production_no)
            .await?
            .ok_or_else(|| AppError::StudioProductionNotFound(production_no.to_string()))?;

        let current = production.stage;
        let next = current.transition_to(stage)?;

        if !self
            .repo
            .update_studio_stage(production.id, current, next)
            .await?
        {
            // Someone else moved it between our read and write.
            let latest = self
                .repo
                .get_studio_production(company.id, production_no)
                .await?
                .map(|p| p.stage)
                .unwrap_or(current);
            return Err(StageTransitionError {
                from: latest,
                to: stage,
            }
            .into());
        }

        production.stage = next;
        info!(production_no, from = %current, to = %next, "advanced studio production");
        Ok(production)
    }

    async fn ensure_number_free(&self, company: &Company, number: &str) -> Result<(), AppError> {
        if number.trim().is_empty() {
            return Err(AppError::InvalidInvoiceNumber(number.to_string()));
        }
        if self.repo.invoice_number_exists(company.id, number).await? {
            return Err(AppError::DuplicateInvoiceNumber(number.to_string()));
        }
        Ok(())
    }

    // ========================
    // Payments
    // ========================

    pub async fn record_payment(
        &self,
        company_id: &str,
        customer_id: &str,
        request: NewPayment,
    ) -> Result<PaymentResult, AppError> {
        if request.amount <= 0 {
            return Err(AppError::InvalidAmount("Amount must be positive".into()));
        }
        ensure_within_limit("Amount", request.amount)?;

        let (company, customer) = self.resolve(company_id, customer_id).await?;

        let reference_no = match request.reference_no {
            Some(reference) if !reference.trim().is_empty() => reference,
            _ => self.repo.next_payment_reference().await?,
        };

        let mut payment = Payment::new(
            company.id,
            customer.id,
            reference_no,
            request.date,
            request.amount,
            request.method,
        );
        if let Some(invoice_no) = request.invoice_no {
            payment = payment.allocated_to(invoice_no);
        }
        if let Some(notes) = request.notes {
            payment = payment.with_notes(notes);
        }

        match self.repo.record_payment(&payment).await? {
            PaymentOutcome::Recorded { invoice } => {
                info!(
                    reference_no = %payment.reference_no,
                    amount = payment.amount,
                    invoice_no = payment.invoice_no.as_deref().unwrap_or("-"),
                    "recorded payment"
                );
                Ok(PaymentResult { payment, invoice })
            }
            PaymentOutcome::UnknownInvoice(invoice_no) => Err(AppError::InvoiceNotFound(invoice_no)),
            PaymentOutcome::NotBillable(invoice_no) => Err(AppError::InvoiceNotBillable(invoice_no)),
            PaymentOutcome::Overpayment {
                invoice_no,
                pending,
            } => Err(AppError::Overpayment {
                invoice_no,
                amount: payment.amount,
                pending,
            }),
        }
    }

    pub async fn list_payments(
        &self,
        company_id: &str,
        customer_id: Option<&str>,
    ) -> Result<Vec<Payment>, AppError> {
        let (company, customer) = self.resolve_optional(company_id, customer_id).await?;
        Ok(self.repo.list_payments(company.id, customer).await?)
    }

    // ========================
    // Reporting
    // ========================

    /// All billable invoices of a company (optionally one customer), oldest first.
    pub async fn list_invoices(
        &self,
        company_id: &str,
        customer_id: Option<&str>,
    ) -> Result<Vec<Invoice>, AppError> {
        let (company, customer) = self.resolve_optional(company_id, customer_id).await?;
        let sales = self.repo.list_sales(company.id, customer).await?;
        let productions = self.repo.list_studio_productions(company.id, customer).await?;
        Ok(collect_invoices(&sales, &productions))
    }

    /// Build a customer's statement: running-balance transactions, invoices,
    /// payments, aging and totals, all from one consistent read.
    pub async fn customer_ledger(&self, query: LedgerQuery) -> Result<CustomerLedger, AppError> {
        let company = self.get_company(&query.company_id).await?;
        if query.from_date > query.to_date {
            return Err(AppError::InvalidDateRange {
                from: query.from_date,
                to: query.to_date,
            });
        }
        let customer = self.get_customer(&company, &query.customer_id).await?;

        let snapshot = self
            .repo
            .load_ledger_snapshot(company.id, customer.id, query.from_date, query.to_date)
            .await?;

        let opening_balance = customer.opening_balance + snapshot.prior_movement;

        let mut transactions = normalize(&snapshot.sales, &snapshot.productions, &snapshot.payments);
        let closing = apply_running_balance(opening_balance, &mut transactions);

        let invoices = collect_invoices(&snapshot.sales, &snapshot.productions);
        let aging = AgingReport::build(&snapshot.outstanding, query.today);
        let summary =
            LedgerSummary::build(opening_balance, &transactions, &invoices, &snapshot.payments);
        debug_assert_eq!(summary.closing_balance, closing);

        if query.order == DisplayOrder::Descending {
            transactions.reverse();
        }

        debug!(
            customer_id = %customer.id,
            transactions = transactions.len(),
            opening_balance,
            closing_balance = closing,
            "built customer ledger"
        );

        Ok(CustomerLedger {
            company,
            customer,
            from_date: query.from_date,
            to_date: query.to_date,
            transactions,
            invoices,
            payments: snapshot.payments,
            aging,
            summary,
        })
    }

    /// Aging snapshot for one customer as of `today`.
    pub async fn customer_aging(
        &self,
        company_id: &str,
        customer_id: &str,
        today: NaiveDate,
    ) -> Result<CustomerAging, AppError> {
        let (company, customer) = self.resolve(company_id, customer_id).await?;
        let sales = self.repo.list_sales(company.id, Some(customer.id)).await?;
        let productions = self
            .repo
            .list_studio_productions(company.id, Some(customer.id))
            .await?;

        let aging = AgingReport::build(&collect_invoices(&sales, &productions), today);
        Ok(CustomerAging { customer, aging })
    }

    /// Aging per customer for a whole company, skipping customers who owe nothing.
    pub async fn company_aging(
        &self,
        company_id: &str,
        today: NaiveDate,
    ) -> Result<Vec<CustomerAging>, AppError> {
        let company = self.get_company(company_id).await?;
        let customers = self.repo.list_customers(company.id).await?;
        let sales = self.repo.list_sales(company.id, None).await?;
        let productions = self.repo.list_studio_productions(company.id, None).await?;

        let mut by_customer: BTreeMap<CustomerId, Vec<Invoice>> = BTreeMap::new();
        for sale in &sales {
            by_customer
                .entry(sale.customer_id)
                .or_default()
                .push(sale.to_invoice());
        }
        for production in productions.iter().filter(|p| p.stage.is_billable()) {
            by_customer
                .entry(production.customer_id)
                .or_default()
                .push(production.to_invoice());
        }

        Ok(customers
            .into_iter()
            .filter_map(|customer| {
                let invoices = by_customer.remove(&customer.id).unwrap_or_default();
                let aging = AgingReport::build(&invoices, today);
                (aging.total > 0).then_some(CustomerAging { customer, aging })
            })
            .collect())
    }

    // ========================
    // Integrity
    // ========================

    /// Cross-check stored invoice amounts and statuses against payments.
    pub async fn check_integrity(&self, company_id: &str) -> Result<IntegrityReport, AppError> {
        let company = self.get_company(company_id).await?;
        let sales = self.repo.list_sales(company.id, None).await?;
        let productions = self.repo.list_studio_productions(company.id, None).await?;
        let payments = self.repo.list_payments(company.id, None).await?;

        let report = check_allocations(&sales, &productions, &payments);
        for issue in &report.issues {
            warn!(company_id = %company.id, %issue, "ledger integrity issue");
        }
        Ok(report)
    }

    async fn resolve_optional(
        &self,
        company_id: &str,
        customer_id: Option<&str>,
    ) -> Result<(Company, Option<CustomerId>), AppError> {
        let company = self.get_company(company_id).await?;
        let customer = match customer_id {
            Some(id) => Some(self.get_customer(&company, id).await?.id),
            None => None,
        };
        Ok((company, customer))
    }
}

fn ensure_within_limit(label: &str, amount: Cents) -> Result<(), AppError> {
    if amount > MAX_AMOUNT {
        return Err(AppError::InvalidAmount(format!(
            "{} exceeds the maximum of {}",
            label,
            format_amount(MAX_AMOUNT)
        )));
    }
    Ok(())
}

/// Invoice views for sales and billable studio productions, ordered by date
/// then number.
fn collect_invoices(sales: &[Sale], productions: &[StudioProduction]) -> Vec<Invoice> {
    let mut invoices: Vec<Invoice> = sales
        .iter()
        .map(Sale::to_invoice)
        .chain(
            productions
                .iter()
                .filter(|p| p.stage.is_billable())
                .map(StudioProduction::to_invoice),
        )
        .collect();
    invoices.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.invoice_no.cmp(&b.invoice_no)));
    invoices
}
