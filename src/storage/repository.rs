use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::domain::{
    Cents, Company, CompanyId, Customer, CustomerId, Invoice, InvoiceStatus, Payment,
    PaymentMethod, Sale, StudioProduction, StudioProductionId, StudioStage,
};

use super::MIGRATION_001_INITIAL;

const DATE_FORMAT: &str = "%Y-%m-%d";

const SALE_COLUMNS: &str = "id, company_id, customer_id, invoice_no, sale_date, subtotal, discount, total, paid_amount, status, notes, created_at";
const STUDIO_COLUMNS: &str = "id, company_id, customer_id, production_no, production_date, total_amount, paid_amount, status, stage, description, created_at";
const PAYMENT_COLUMNS: &str = "id, company_id, customer_id, reference_no, payment_date, amount, method, invoice_no, notes, created_at";

/// Everything the customer ledger needs, read inside one transaction so the
/// lists agree with each other.
#[derive(Debug, Clone, Default)]
pub struct LedgerSnapshot {
    /// Net of all documents dated before the range start (excludes the
    /// customer's carried-forward opening balance).
    pub prior_movement: Cents,
    pub sales: Vec<Sale>,
    pub productions: Vec<StudioProduction>,
    pub payments: Vec<Payment>,
    /// Every invoice of the customer with a pending amount, regardless of date.
    pub outstanding: Vec<Invoice>,
}

/// Result of trying to record a payment against an invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    Recorded { invoice: Option<Invoice> },
    UnknownInvoice(String),
    /// The invoice number belongs to a studio production still in draft.
    NotBillable(String),
    Overpayment { invoice_no: String, pending: Cents },
}

/// Repository for persisting and querying ledger documents.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    // ========================
    // Companies and customers
    // ========================

    pub async fn save_company(&self, company: &Company) -> Result<()> {
        sqlx::query("INSERT INTO companies (id, name, currency, created_at) VALUES (?, ?, ?, ?)")
            .bind(company.id.to_string())
            .bind(&company.name)
            .bind(&company.currency)
            .bind(company.created_at.to_rfc3339())
            .execute(&self.pool)
            .await
            .context("Failed to save company")?;
        Ok(())
    }

    pub async fn get_company(&self, id: CompanyId) -> Result<Option<Company>> {
        let row = sqlx::query("SELECT id, name, currency, created_at FROM companies WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch company")?;

        row.as_ref().map(Self::row_to_company).transpose()
    }

    pub async fn get_company_by_name(&self, name: &str) -> Result<Option<Company>> {
        let row = sqlx::query("SELECT id, name, currency, created_at FROM companies WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch company by name")?;

        row.as_ref().map(Self::row_to_company).transpose()
    }

    pub async fn list_companies(&self) -> Result<Vec<Company>> {
        let rows = sqlx::query("SELECT id, name, currency, created_at FROM companies ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list companies")?;

        rows.iter().map(Self::row_to_company).collect()
    }

    pub async fn save_customer(&self, customer: &Customer) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO customers (id, company_id, name, phone, email, opening_balance, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(customer.id.to_string())
        .bind(customer.company_id.to_string())
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(customer.opening_balance)
        .bind(customer.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save customer")?;
        Ok(())
    }

    pub async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>> {
        let row = sqlx::query(
            "SELECT id, company_id, name, phone, email, opening_balance, created_at FROM customers WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch customer")?;

        row.as_ref().map(Self::row_to_customer).transpose()
    }

    pub async fn list_customers(&self, company_id: CompanyId) -> Result<Vec<Customer>> {
        let rows = sqlx::query(
            "SELECT id, company_id, name, phone, email, opening_balance, created_at FROM customers WHERE company_id = ? ORDER BY name",
        )
        .bind(company_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list customers")?;

        rows.iter().map(Self::row_to_customer).collect()
    }

    // ========================
    // Billable documents
    // ========================

    /// True if a sale or studio production already uses this number.
    pub async fn invoice_number_exists(&self, company_id: CompanyId, number: &str) -> Result<bool> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM sales WHERE company_id = ? AND invoice_no = ?) +
                (SELECT COUNT(*) FROM studio_productions WHERE company_id = ? AND production_no = ?) as count
            "#,
        )
        .bind(company_id.to_string())
        .bind(number)
        .bind(company_id.to_string())
        .bind(number)
        .fetch_one(&self.pool)
        .await
        .context("Failed to check invoice number")?;

        Ok(row.get::<i64, _>("count") > 0)
    }

    pub async fn save_sale(&self, sale: &Sale) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO sales (id, company_id, customer_id, invoice_no, sale_date, subtotal, discount, total, paid_amount, status, notes, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(sale.id.to_string())
        .bind(sale.company_id.to_string())
        .bind(sale.customer_id.to_string())
        .bind(&sale.invoice_no)
        .bind(sale.sale_date.format(DATE_FORMAT).to_string())
        .bind(sale.subtotal)
        .bind(sale.discount)
        .bind(sale.total)
        .bind(sale.paid_amount)
        .bind(sale.status.as_str())
        .bind(&sale.notes)
        .bind(sale.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save sale")?;
        Ok(())
    }

    pub async fn list_sales(
        &self,
        company_id: CompanyId,
        customer_id: Option<CustomerId>,
    ) -> Result<Vec<Sale>> {
        let mut query = format!("SELECT {} FROM sales WHERE company_id = ?", SALE_COLUMNS);
        if customer_id.is_some() {
            query.push_str(" AND customer_id = ?");
        }
        query.push_str(" ORDER BY sale_date, invoice_no");

        let mut sql_query = sqlx::query(&query).bind(company_id.to_string());
        if let Some(customer_id) = customer_id {
            sql_query = sql_query.bind(customer_id.to_string());
        }

        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .context("Failed to list sales")?;

        rows.iter().map(Self::row_to_sale).collect()
    }

    pub async fn save_studio_production(&self, production: &StudioProduction) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO studio_productions (id, company_id, customer_id, production_no, production_date, total_amount, paid_amount, status, stage, description, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(production.id.to_string())
        .bind(production.company_id.to_string())
        .bind(production.customer_id.to_string())
        .bind(&production.production_no)
        .bind(production.production_date.format(DATE_FORMAT).to_string())
        .bind(production.total_amount)
        .bind(production.paid_amount)
        .bind(production.status.as_str())
        .bind(production.stage.as_str())
        .bind(&production.description)
        .bind(production.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save studio production")?;
        Ok(())
    }

    pub async fn get_studio_production(
        &self,
        company_id: CompanyId,
        production_no: &str,
    ) -> Result<Option<StudioProduction>> {
        let query = format!(
            "SELECT {} FROM studio_productions WHERE company_id = ? AND production_no = ?",
            STUDIO_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(company_id.to_string())
            .bind(production_no)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch studio production")?;

        row.as_ref().map(Self::row_to_studio).transpose()
    }

    /// Move a production to `stage`, only if it is still at `expected`.
    /// Returns false when another writer got there first.
    pub async fn update_studio_stage(
        &self,
        id: StudioProductionId,
        expected: StudioStage,
        stage: StudioStage,
    ) -> Result<bool> {
        let result =
            sqlx::query("UPDATE studio_productions SET stage = ? WHERE id = ? AND stage = ?")
                .bind(stage.as_str())
                .bind(id.to_string())
                .bind(expected.as_str())
                .execute(&self.pool)
                .await
                .context("Failed to update studio stage")?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn list_studio_productions(
        &self,
        company_id: CompanyId,
        customer_id: Option<CustomerId>,
    ) -> Result<Vec<StudioProduction>> {
        let mut query = format!(
            "SELECT {} FROM studio_productions WHERE company_id = ?",
            STUDIO_COLUMNS
        );
        if customer_id.is_some() {
            query.push_str(" AND customer_id = ?");
        }
        query.push_str(" ORDER BY production_date, production_no");

        let mut sql_query = sqlx::query(&query).bind(company_id.to_string());
        if let Some(customer_id) = customer_id {
            sql_query = sql_query.bind(customer_id.to_string());
        }

        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .context("Failed to list studio productions")?;

        rows.iter().map(Self::row_to_studio).collect()
    }

    // ========================
    // Payments
    // ========================

    /// Next generated payment reference, e.g. `PAY-000042`.
    pub async fn next_payment_reference(&self) -> Result<String> {
        let row = sqlx::query(
            r#"
            UPDATE sequence_counter
            SET value = value + 1
            WHERE name = 'payment_reference'
            RETURNING value
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .context("Failed to get next payment reference")?;

        let value: i64 = row.get("value");
        Ok(format!("PAY-{:06}", value))
    }

    /// Save a payment and, when it names an invoice, add it to that invoice's
    /// paid amount and rewrite its status in the same transaction.
    ///
    /// Nothing is written unless the outcome is `Recorded`.
    pub async fn record_payment(&self, payment: &Payment) -> Result<PaymentOutcome> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let invoice = match &payment.invoice_no {
            None => None,
            Some(invoice_no) => {
                let sale = Self::fetch_sale(&mut tx, payment, invoice_no).await?;
                let studio = match sale {
                    Some(_) => None,
                    None => Self::fetch_studio(&mut tx, payment, invoice_no).await?,
                };

                match (sale, studio) {
                    (Some(mut sale), _) => {
                        if payment.amount > sale.pending() {
                            return Ok(PaymentOutcome::Overpayment {
                                invoice_no: invoice_no.clone(),
                                pending: sale.pending(),
                            });
                        }
                        sale.apply_payment(payment.amount);
                        sqlx::query("UPDATE sales SET paid_amount = ?, status = ? WHERE id = ?")
                            .bind(sale.paid_amount)
                            .bind(sale.status.as_str())
                            .bind(sale.id.to_string())
                            .execute(&mut *tx)
                            .await
                            .context("Failed to allocate payment to sale")?;
                        Some(sale.to_invoice())
                    }
                    (None, Some(production)) if !production.stage.is_billable() => {
                        return Ok(PaymentOutcome::NotBillable(invoice_no.clone()));
                    }
                    (None, Some(mut production)) => {
                        if payment.amount > production.pending() {
                            return Ok(PaymentOutcome::Overpayment {
                                invoice_no: invoice_no.clone(),
                                pending: production.pending(),
                            });
                        }
                        production.apply_payment(payment.amount);
                        sqlx::query(
                            "UPDATE studio_productions SET paid_amount = ?, status = ? WHERE id = ?",
                        )
                        .bind(production.paid_amount)
                        .bind(production.status.as_str())
                        .bind(production.id.to_string())
                        .execute(&mut *tx)
                        .await
                        .context("Failed to allocate payment to studio production")?;
                        Some(production.to_invoice())
                    }
                    (None, None) => {
                        return Ok(PaymentOutcome::UnknownInvoice(invoice_no.clone()));
                    }
                }
            }
        };

        sqlx::query(
            r#"
            INSERT INTO payments (id, company_id, customer_id, reference_no, payment_date, amount, method, invoice_no, notes, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(payment.id.to_string())
        .bind(payment.company_id.to_string())
        .bind(payment.customer_id.to_string())
        .bind(&payment.reference_no)
        .bind(payment.payment_date.format(DATE_FORMAT).to_string())
        .bind(payment.amount)
        .bind(payment.method.as_str())
        .bind(&payment.invoice_no)
        .bind(&payment.notes)
        .bind(payment.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await
        .context("Failed to save payment")?;

        tx.commit().await.context("Failed to commit payment")?;
        Ok(PaymentOutcome::Recorded { invoice })
    }

    async fn fetch_sale(
        conn: &mut SqliteConnection,
        payment: &Payment,
        invoice_no: &str,
    ) -> Result<Option<Sale>> {
        let query = format!(
            "SELECT {} FROM sales WHERE company_id = ? AND customer_id = ? AND invoice_no = ?",
            SALE_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(payment.company_id.to_string())
            .bind(payment.customer_id.to_string())
            .bind(invoice_no)
            .fetch_optional(&mut *conn)
            .await
            .context("Failed to fetch sale")?;

        row.as_ref().map(Self::row_to_sale).transpose()
    }

    async fn fetch_studio(
        conn: &mut SqliteConnection,
        payment: &Payment,
        production_no: &str,
    ) -> Result<Option<StudioProduction>> {
        let query = format!(
            "SELECT {} FROM studio_productions WHERE company_id = ? AND customer_id = ? AND production_no = ?",
            STUDIO_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(payment.company_id.to_string())
            .bind(payment.customer_id.to_string())
            .bind(production_no)
            .fetch_optional(&mut *conn)
            .await
            .context("Failed to fetch studio production")?;

        row.as_ref().map(Self::row_to_studio).transpose()
    }

    pub async fn list_payments(
        &self,
        company_id: CompanyId,
        customer_id: Option<CustomerId>,
    ) -> Result<Vec<Payment>> {
        let mut query = format!("SELECT {} FROM payments WHERE company_id = ?", PAYMENT_COLUMNS);
        if customer_id.is_some() {
            query.push_str(" AND customer_id = ?");
        }
        query.push_str(" ORDER BY payment_date, reference_no");

        let mut sql_query = sqlx::query(&query).bind(company_id.to_string());
        if let Some(customer_id) = customer_id {
            sql_query = sql_query.bind(customer_id.to_string());
        }

        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .context("Failed to list payments")?;

        rows.iter().map(Self::row_to_payment).collect()
    }

    // ========================
    // Ledger snapshot
    // ========================

    /// Read a customer's documents for `[from_date, to_date]` plus the prior
    /// movement and outstanding invoices, all within one read transaction.
    pub async fn load_ledger_snapshot(
        &self,
        company_id: CompanyId,
        customer_id: CustomerId,
        from_date: NaiveDate,
        to_date: NaiveDate,
    ) -> Result<LedgerSnapshot> {
        let company = company_id.to_string();
        let customer = customer_id.to_string();
        let from = from_date.format(DATE_FORMAT).to_string();
        let to = to_date.format(DATE_FORMAT).to_string();

        let mut tx = self.pool.begin().await.context("Failed to begin read transaction")?;

        let prior_movement: Cents = sqlx::query(
            r#"
            SELECT
                (SELECT COALESCE(SUM(total), 0) FROM sales
                    WHERE company_id = ? AND customer_id = ? AND sale_date < ?) +
                (SELECT COALESCE(SUM(total_amount), 0) FROM studio_productions
                    WHERE company_id = ? AND customer_id = ? AND production_date < ? AND stage != 'draft') -
                (SELECT COALESCE(SUM(amount), 0) FROM payments
                    WHERE company_id = ? AND customer_id = ? AND payment_date < ?) as movement
            "#,
        )
        .bind(&company)
        .bind(&customer)
        .bind(&from)
        .bind(&company)
        .bind(&customer)
        .bind(&from)
        .bind(&company)
        .bind(&customer)
        .bind(&from)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to compute prior movement")?
        .get("movement");

        let sales_query = format!(
            "SELECT {} FROM sales WHERE company_id = ? AND customer_id = ? AND sale_date >= ? AND sale_date <= ? ORDER BY sale_date, invoice_no",
            SALE_COLUMNS
        );
        let sales = sqlx::query(&sales_query)
            .bind(&company)
            .bind(&customer)
            .bind(&from)
            .bind(&to)
            .fetch_all(&mut *tx)
            .await
            .context("Failed to load sales")?
            .iter()
            .map(Self::row_to_sale)
            .collect::<Result<Vec<_>>>()?;

        let studio_query = format!(
            "SELECT {} FROM studio_productions WHERE company_id = ? AND customer_id = ? AND production_date >= ? AND production_date <= ? ORDER BY production_date, production_no",
            STUDIO_COLUMNS
        );
        let productions = sqlx::query(&studio_query)
            .bind(&company)
            .bind(&customer)
            .bind(&from)
            .bind(&to)
            .fetch_all(&mut *tx)
            .await
            .context("Failed to load studio productions")?
            .iter()
            .map(Self::row_to_studio)
            .collect::<Result<Vec<_>>>()?;

        let payments_query = format!(
            "SELECT {} FROM payments WHERE company_id = ? AND customer_id = ? AND payment_date >= ? AND payment_date <= ? ORDER BY payment_date, reference_no",
            PAYMENT_COLUMNS
        );
        let payments = sqlx::query(&payments_query)
            .bind(&company)
            .bind(&customer)
            .bind(&from)
            .bind(&to)
            .fetch_all(&mut *tx)
            .await
            .context("Failed to load payments")?
            .iter()
            .map(Self::row_to_payment)
            .collect::<Result<Vec<_>>>()?;

        let outstanding_sales_query = format!(
            "SELECT {} FROM sales WHERE company_id = ? AND customer_id = ? AND paid_amount < total",
            SALE_COLUMNS
        );
        let outstanding_studio_query = format!(
            "SELECT {} FROM studio_productions WHERE company_id = ? AND customer_id = ? AND paid_amount < total_amount AND stage != 'draft'",
            STUDIO_COLUMNS
        );

        let mut outstanding: Vec<Invoice> = sqlx::query(&outstanding_sales_query)
            .bind(&company)
            .bind(&customer)
            .fetch_all(&mut *tx)
            .await
            .context("Failed to load outstanding sales")?
            .iter()
            .map(|row| Self::row_to_sale(row).map(|s| s.to_invoice()))
            .collect::<Result<Vec<_>>>()?;

        for row in sqlx::query(&outstanding_studio_query)
            .bind(&company)
            .bind(&customer)
            .fetch_all(&mut *tx)
            .await
            .context("Failed to load outstanding studio productions")?
        {
            outstanding.push(Self::row_to_studio(&row)?.to_invoice());
        }

        tx.commit().await.context("Failed to close read transaction")?;

        debug!(
            %company_id,
            %customer_id,
            sales = sales.len(),
            productions = productions.len(),
            payments = payments.len(),
            outstanding = outstanding.len(),
            "loaded ledger snapshot"
        );

        Ok(LedgerSnapshot {
            prior_movement,
            sales,
            productions,
            payments,
            outstanding,
        })
    }

    // ========================
    // Row mapping
    // ========================

    fn row_to_company(row: &SqliteRow) -> Result<Company> {
        let id_str: String = row.get("id");
        let created_at_str: String = row.get("created_at");

        Ok(Company {
            id: Uuid::parse_str(&id_str).context("Invalid company ID")?,
            name: row.get("name"),
            currency: row.get("currency"),
            created_at: parse_timestamp(&created_at_str)?,
        })
    }

    fn row_to_customer(row: &SqliteRow) -> Result<Customer> {
        let id_str: String = row.get("id");
        let company_id_str: String = row.get("company_id");
        let created_at_str: String = row.get("created_at");

        Ok(Customer {
            id: Uuid::parse_str(&id_str).context("Invalid customer ID")?,
            company_id: Uuid::parse_str(&company_id_str).context("Invalid company ID")?,
            name: row.get("name"),
            phone: row.get("phone"),
            email: row.get("email"),
            opening_balance: row.get("opening_balance"),
            created_at: parse_timestamp(&created_at_str)?,
        })
    }

    fn row_to_sale(row: &SqliteRow) -> Result<Sale> {
        let id_str: String = row.get("id");
        let company_id_str: String = row.get("company_id");
        let customer_id_str: String = row.get("customer_id");
        let date_str: String = row.get("sale_date");
        let status_str: String = row.get("status");
        let created_at_str: String = row.get("created_at");

        Ok(Sale {
            id: Uuid::parse_str(&id_str).context("Invalid sale ID")?,
            company_id: Uuid::parse_str(&company_id_str).context("Invalid company ID")?,
            customer_id: Uuid::parse_str(&customer_id_str).context("Invalid customer ID")?,
            invoice_no: row.get("invoice_no"),
            sale_date: parse_date(&date_str)?,
            subtotal: row.get("subtotal"),
            discount: row.get("discount"),
            total: row.get("total"),
            paid_amount: row.get("paid_amount"),
            status: InvoiceStatus::from_str(&status_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid invoice status: {}", status_str))?,
            notes: row.get("notes"),
            created_at: parse_timestamp(&created_at_str)?,
        })
    }

    fn row_to_studio(row: &SqliteRow) -> Result<StudioProduction> {
        let id_str: String = row.get("id");
        let company_id_str: String = row.get("company_id");
        let customer_id_str: String = row.get("customer_id");
        let date_str: String = row.get("production_date");
        let status_str: String = row.get("status");
        let stage_str: String = row.get("stage");
        let created_at_str: String = row.get("created_at");

        Ok(StudioProduction {
            id: Uuid::parse_str(&id_str).context("Invalid studio production ID")?,
            company_id: Uuid::parse_str(&company_id_str).context("Invalid company ID")?,
            customer_id: Uuid::parse_str(&customer_id_str).context("Invalid customer ID")?,
            production_no: row.get("production_no"),
            production_date: parse_date(&date_str)?,
            total_amount: row.get("total_amount"),
            paid_amount: row.get("paid_amount"),
            status: InvoiceStatus::from_str(&status_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid invoice status: {}", status_str))?,
            stage: StudioStage::from_str(&stage_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid studio stage: {}", stage_str))?,
            description: row.get("description"),
            created_at: parse_timestamp(&created_at_str)?,
        })
    }

    fn row_to_payment(row: &SqliteRow) -> Result<Payment> {
        let id_str: String = row.get("id");
        let company_id_str: String = row.get("company_id");
        let customer_id_str: String = row.get("customer_id");
        let date_str: String = row.get("payment_date");
        let method_str: String = row.get("method");
        let created_at_str: String = row.get("created_at");

        Ok(Payment {
            id: Uuid::parse_str(&id_str).context("Invalid payment ID")?,
            company_id: Uuid::parse_str(&company_id_str).context("Invalid company ID")?,
            customer_id: Uuid::parse_str(&customer_id_str).context("Invalid customer ID")?,
            reference_no: row.get("reference_no"),
            payment_date: parse_date(&date_str)?,
            amount: row.get("amount"),
            method: PaymentMethod::from_str(&method_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid payment method: {}", method_str))?,
            invoice_no: row.get("invoice_no"),
            notes: row.get("notes"),
            created_at: parse_timestamp(&created_at_str)?,
        })
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).with_context(|| format!("Invalid date: {}", s))
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("Invalid timestamp: {}", s))?
        .with_timezone(&Utc))
}
