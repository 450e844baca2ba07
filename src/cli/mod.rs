use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};

use crate::application::{CustomerLedger, DisplayOrder, LedgerQuery, LedgerService, NewPayment, NewSale};
use crate::domain::{format_amount, parse_amount, AgingReport, Invoice, Payment, PaymentMethod, StudioStage};

/// Boutique Ledger - customer statements, invoices and aging
#[derive(Parser)]
#[command(name = "boutique-ledger")]
#[command(about = "Customer ledger statements, invoice status and aging for boutique retail")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "BOUTIQUE_LEDGER_DB", default_value = "boutique-ledger.db", global = true)]
    pub database: String,

    /// Company id every command is scoped to
    #[arg(long, env = "BOUTIQUE_LEDGER_COMPANY", global = true)]
    pub company: Option<String>,

    /// Enable verbose (debug) logging; RUST_LOG overrides
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Company management commands
    #[command(subcommand)]
    Company(CompanyCommands),

    /// Customer management commands
    #[command(subcommand)]
    Customer(CustomerCommands),

    /// Record a sale invoice
    Sale {
        /// Invoice number (unique per company)
        invoice_no: String,

        /// Customer id
        #[arg(long)]
        customer: String,

        /// Gross amount before discount (e.g., "1,500.00")
        #[arg(long)]
        subtotal: String,

        /// Discount amount
        #[arg(long, default_value = "0")]
        discount: String,

        /// Sale date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Notes shown on the statement
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Studio production commands
    #[command(subcommand)]
    Studio(StudioCommands),

    /// Record a payment received from a customer
    Payment {
        /// Amount received (e.g., "500" or "500.00")
        amount: String,

        /// Customer id
        #[arg(long)]
        customer: String,

        /// Invoice or production number to allocate the payment to
        #[arg(short, long)]
        invoice: Option<String>,

        /// Payment method: cash, card, bank_transfer, other
        #[arg(short, long, default_value = "cash")]
        method: String,

        /// Payment reference (generated when omitted)
        #[arg(short, long)]
        reference: Option<String>,

        /// Payment date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Notes shown on the statement
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Show a customer's ledger statement
    Ledger {
        /// Customer id
        #[arg(long)]
        customer: String,

        #[command(flatten)]
        range: DateRangeArgs,

        /// Line order: asc, desc
        #[arg(long, default_value = "desc")]
        order: String,

        /// Output format
        #[arg(long, value_enum, default_value_t = StatementFormat::Table)]
        format: StatementFormat,
    },

    /// List invoices with payment status
    Invoices {
        /// Filter by customer id
        #[arg(long)]
        customer: Option<String>,

        /// Only invoices with a pending amount
        #[arg(long)]
        outstanding: bool,

        /// Output format
        #[arg(long, value_enum, default_value_t = ListFormat::Table)]
        format: ListFormat,
    },

    /// List payments
    Payments {
        /// Filter by customer id
        #[arg(long)]
        customer: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = ListFormat::Table)]
        format: ListFormat,
    },

    /// Aging of unpaid invoices
    Aging {
        /// One customer (omit for every customer that owes money)
        #[arg(long)]
        customer: Option<String>,

        /// Reference date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        as_of: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = ListFormat::Table)]
        format: ListFormat,
    },

    /// Export a customer's ledger
    Export {
        /// What to export: statement, invoices, ledger
        export_type: String,

        /// Customer id
        #[arg(long)]
        customer: String,

        #[command(flatten)]
        range: DateRangeArgs,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Verify invoice amounts and statuses against payments
    Check,
}

#[derive(clap::Args)]
pub struct DateRangeArgs {
    /// Start date (YYYY-MM-DD, defaults to start of current year)
    #[arg(long)]
    pub from: Option<String>,

    /// End date (YYYY-MM-DD, defaults to today)
    #[arg(long)]
    pub to: Option<String>,
}

#[derive(Subcommand)]
pub enum CompanyCommands {
    /// Create a new company
    Create {
        /// Company name (must be unique)
        name: String,

        /// Currency code (e.g., PKR, USD)
        #[arg(short, long, default_value = "PKR")]
        currency: String,
    },

    /// List all companies
    List,
}

#[derive(Subcommand)]
pub enum CustomerCommands {
    /// Create a new customer
    Create {
        /// Customer name
        name: String,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        email: Option<String>,

        /// Balance carried forward from before this ledger
        #[arg(long, default_value = "0")]
        opening_balance: String,
    },

    /// List customers of the company
    List,
}

#[derive(Subcommand)]
pub enum StudioCommands {
    /// Record a studio production (starts as draft)
    Create {
        /// Production number (unique per company, shares the invoice number space)
        production_no: String,

        /// Customer id
        #[arg(long)]
        customer: String,

        /// Total amount
        #[arg(short, long)]
        amount: String,

        /// Production date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Description shown on the statement
        #[arg(long)]
        description: Option<String>,
    },

    /// Move a production to its next stage: in_progress, completed
    Advance {
        production_no: String,

        /// Target stage
        stage: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StatementFormat {
    Table,
    Json,
    Csv,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ListFormat {
    Table,
    Json,
}

impl Cli {
    fn company(&self) -> &str {
        self.company.as_deref().unwrap_or("")
    }

    pub async fn run(self) -> Result<()> {
        // Migrations are idempotent, so init on an existing file is harmless.
        let service = if matches!(self.command, Commands::Init) {
            LedgerService::init(&self.database).await?
        } else {
            LedgerService::connect(&self.database).await?
        };
        let company = self.company().to_string();

        match self.command {
            Commands::Init => println!("Database initialized: {}", self.database),

            Commands::Company(cmd) => run_company_command(&service, cmd).await?,

            Commands::Customer(cmd) => run_customer_command(&service, &company, cmd).await?,

            Commands::Sale {
                invoice_no,
                customer,
                subtotal,
                discount,
                date,
                notes,
            } => {
                let sale = NewSale {
                    invoice_no,
                    date: parse_optional_date(date)?,
                    subtotal: parse_amount(&subtotal).context("Invalid subtotal")?,
                    discount: parse_amount(&discount).context("Invalid discount")?,
                    notes,
                };
                let sale = service.record_sale(&company, &customer, sale).await?;
                println!(
                    "Recorded sale {}: {} (discount {}) on {}",
                    sale.invoice_no,
                    format_amount(sale.total),
                    format_amount(sale.discount),
                    sale.sale_date
                );
            }

            Commands::Studio(cmd) => run_studio_command(&service, &company, cmd).await?,

            Commands::Payment {
                amount,
                customer,
                invoice,
                method,
                reference,
                date,
                notes,
            } => {
                let method = PaymentMethod::from_str(&method).ok_or_else(|| {
                    anyhow::anyhow!(
                        "Invalid payment method '{}'. Valid: cash, card, bank_transfer, other",
                        method
                    )
                })?;
                let request = NewPayment {
                    reference_no: reference,
                    date: parse_optional_date(date)?,
                    amount: parse_amount(&amount).context("Invalid amount")?,
                    method,
                    invoice_no: invoice,
                    notes,
                };
                let result = service.record_payment(&company, &customer, request).await?;
                println!(
                    "Recorded payment {}: {} ({})",
                    result.payment.reference_no,
                    format_amount(result.payment.amount),
                    result.payment.method
                );
                if let Some(invoice) = result.invoice {
                    println!(
                        "  {} now {} - pending {}",
                        invoice.invoice_no,
                        invoice.status,
                        format_amount(invoice.pending_amount)
                    );
                }
            }

            Commands::Ledger {
                customer,
                range,
                order,
                format,
            } => {
                let order = DisplayOrder::from_str(&order)
                    .ok_or_else(|| anyhow::anyhow!("Invalid order '{}'. Valid: asc, desc", order))?;
                let ledger = load_ledger(&service, &company, &customer, range, order).await?;
                print_ledger(&ledger, format)?;
            }

            Commands::Invoices {
                customer,
                outstanding,
                format,
            } => {
                let mut invoices = service.list_invoices(&company, customer.as_deref()).await?;
                if outstanding {
                    invoices.retain(Invoice::is_outstanding);
                }
                match format {
                    ListFormat::Json => println!("{}", serde_json::to_string_pretty(&invoices)?),
                    ListFormat::Table => print_invoices(&invoices),
                }
            }

            Commands::Payments { customer, format } => {
                let payments = service.list_payments(&company, customer.as_deref()).await?;
                match format {
                    ListFormat::Json => println!("{}", serde_json::to_string_pretty(&payments)?),
                    ListFormat::Table => print_payments(&payments),
                }
            }

            Commands::Aging {
                customer,
                as_of,
                format,
            } => {
                let today = parse_optional_date(as_of)?;
                run_aging_command(&service, &company, customer, today, format).await?;
            }

            Commands::Export {
                export_type,
                customer,
                range,
                output,
            } => {
                let ledger =
                    load_ledger(&service, &company, &customer, range, DisplayOrder::Ascending).await?;
                run_export_command(&ledger, &export_type, output.as_deref())?;
            }

            Commands::Check => run_check_command(&service, &company).await?,
        }

        Ok(())
    }
}

async fn run_company_command(service: &LedgerService, cmd: CompanyCommands) -> Result<()> {
    match cmd {
        CompanyCommands::Create { name, currency } => {
            let company = service.create_company(&name, &currency).await?;
            println!("Created company: {} ({})", company.name, company.currency);
            println!("  id: {}", company.id);
        }
        CompanyCommands::List => {
            let companies = service.list_companies().await?;
            if companies.is_empty() {
                println!("No companies found.");
                return Ok(());
            }
            println!("{:<38} {:<30} {:<8}", "ID", "NAME", "CURRENCY");
            println!("{}", "-".repeat(78));
            for company in companies {
                println!(
                    "{:<38} {:<30} {:<8}",
                    company.id,
                    truncate(&company.name, 30),
                    company.currency
                );
            }
        }
    }
    Ok(())
}

async fn run_customer_command(
    service: &LedgerService,
    company: &str,
    cmd: CustomerCommands,
) -> Result<()> {
    match cmd {
        CustomerCommands::Create {
            name,
            phone,
            email,
            opening_balance,
        } => {
            let opening = parse_amount(&opening_balance).context("Invalid opening balance")?;
            let customer = service
                .create_customer(company, &name, phone, email, opening)
                .await?;
            println!("Created customer: {}", customer.name);
            println!("  id: {}", customer.id);
        }
        CustomerCommands::List => {
            let customers = service.list_customers(company).await?;
            if customers.is_empty() {
                println!("No customers found.");
                return Ok(());
            }
            println!("{:<38} {:<24} {:<16} {:>14}", "ID", "NAME", "PHONE", "OPENING");
            println!("{}", "-".repeat(95));
            for customer in customers {
                println!(
                    "{:<38} {:<24} {:<16} {:>14}",
                    customer.id,
                    truncate(&customer.name, 24),
                    customer.phone.as_deref().unwrap_or("-"),
                    format_amount(customer.opening_balance)
                );
            }
        }
    }
    Ok(())
}

async fn run_studio_command(
    service: &LedgerService,
    company: &str,
    cmd: StudioCommands,
) -> Result<()> {
    match cmd {
        StudioCommands::Create {
            production_no,
            customer,
            amount,
            date,
            description,
        } => {
            let total = parse_amount(&amount).context("Invalid amount")?;
            let production = service
                .record_studio_production(
                    company,
                    &customer,
                    &production_no,
                    parse_optional_date(date)?,
                    total,
                    description,
                )
                .await?;
            println!(
                "Recorded studio production {}: {} ({})",
                production.production_no,
                format_amount(production.total_amount),
                production.stage
            );
        }
        StudioCommands::Advance {
            production_no,
            stage,
        } => {
            let stage = StudioStage::from_str(&stage).ok_or_else(|| {
                anyhow::anyhow!("Invalid stage '{}'. Valid: in_progress, completed", stage)
            })?;
            let production = service
                .advance_studio_stage(company, &production_no, stage)
                .await?;
            println!(
                "Studio production {} is now {}",
                production.production_no, production.stage
            );
        }
    }
    Ok(())
}

async fn load_ledger(
    service: &LedgerService,
    company: &str,
    customer: &str,
    range: DateRangeArgs,
    order: DisplayOrder,
) -> Result<CustomerLedger> {
    let today = Utc::now().date_naive();
    let (from_date, to_date) = parse_date_range(range.from, range.to, today)?;

    let ledger = service
        .customer_ledger(LedgerQuery {
            company_id: company.to_string(),
            customer_id: customer.to_string(),
            from_date,
            to_date,
            today,
            order,
        })
        .await?;
    Ok(ledger)
}

fn print_ledger(ledger: &CustomerLedger, format: StatementFormat) -> Result<()> {
    match format {
        StatementFormat::Json => println!("{}", serde_json::to_string_pretty(ledger)?),
        StatementFormat::Csv => {
            crate::io::export_statement_csv(ledger, std::io::stdout())?;
        }
        StatementFormat::Table => {
            let summary = &ledger.summary;
            println!(
                "Customer Ledger: {} ({})",
                ledger.customer.name, ledger.company.name
            );
            println!("Period: {} to {}", ledger.from_date, ledger.to_date);
            println!();
            println!("Opening balance: {:>15}", format_amount(summary.opening_balance));
            println!("Total debit:     {:>15}", format_amount(summary.total_debit));
            println!("Total credit:    {:>15}", format_amount(summary.total_credit));
            println!("Closing balance: {:>15}", format_amount(summary.closing_balance));
            println!();

            if ledger.transactions.is_empty() {
                println!("No transactions in this period.");
            } else {
                println!(
                    "{:<10} {:<12} {:<9} {:<28} {:>12} {:>12} {:>14}",
                    "DATE", "REFERENCE", "TYPE", "DESCRIPTION", "DEBIT", "CREDIT", "BALANCE"
                );
                println!("{}", "-".repeat(103));
                for tx in &ledger.transactions {
                    println!(
                        "{:<10} {:<12} {:<9} {:<28} {:>12} {:>12} {:>14}",
                        tx.date,
                        truncate(&tx.reference_no, 12),
                        tx.document_type,
                        truncate(&tx.description, 28),
                        amount_or_blank(tx.debit),
                        amount_or_blank(tx.credit),
                        format_amount(tx.running_balance)
                    );
                }
            }

            println!();
            println!(
                "Invoices: {}  Invoiced: {}  Paid: {}  Pending: {}",
                summary.invoice_count,
                format_amount(summary.total_invoiced),
                format_amount(summary.total_paid),
                format_amount(summary.total_pending)
            );
            println!();
            print_aging(&ledger.aging);
        }
    }
    Ok(())
}

fn print_invoices(invoices: &[Invoice]) {
    if invoices.is_empty() {
        println!("No invoices found.");
        return;
    }
    println!(
        "{:<14} {:<7} {:<10} {:>12} {:>12} {:>12} {:<15}",
        "INVOICE", "SOURCE", "DATE", "TOTAL", "PAID", "PENDING", "STATUS"
    );
    println!("{}", "-".repeat(88));
    for invoice in invoices {
        println!(
            "{:<14} {:<7} {:<10} {:>12} {:>12} {:>12} {:<15}",
            truncate(&invoice.invoice_no, 14),
            invoice.source.as_str(),
            invoice.date,
            format_amount(invoice.invoice_total),
            format_amount(invoice.paid_amount),
            format_amount(invoice.pending_amount),
            invoice.status
        );
    }
}

fn print_payments(payments: &[Payment]) {
    if payments.is_empty() {
        println!("No payments found.");
        return;
    }
    println!(
        "{:<12} {:<10} {:<14} {:<14} {:>12}",
        "REFERENCE", "DATE", "METHOD", "INVOICE", "AMOUNT"
    );
    println!("{}", "-".repeat(66));
    for payment in payments {
        println!(
            "{:<12} {:<10} {:<14} {:<14} {:>12}",
            truncate(&payment.reference_no, 12),
            payment.payment_date,
            payment.method,
            payment.invoice_no.as_deref().unwrap_or("-"),
            format_amount(payment.amount)
        );
    }
}

fn print_aging(aging: &AgingReport) {
    println!("Aging{}", aging.as_of.map(|d| format!(" as of {}", d)).unwrap_or_default());
    for (bucket, amount) in aging.buckets() {
        println!("  {:<12} {:>15}", bucket.label(), format_amount(amount));
    }
    println!("  {:<12} {:>15}", "Total", format_amount(aging.total));
}

async fn run_aging_command(
    service: &LedgerService,
    company: &str,
    customer: Option<String>,
    today: NaiveDate,
    format: ListFormat,
) -> Result<()> {
    match customer {
        Some(customer) => {
            let row = service.customer_aging(company, &customer, today).await?;
            match format {
                ListFormat::Json => println!("{}", serde_json::to_string_pretty(&row)?),
                ListFormat::Table => {
                    println!("{}", row.customer.name);
                    print_aging(&row.aging);
                }
            }
        }
        None => {
            let rows = service.company_aging(company, today).await?;
            match format {
                ListFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
                ListFormat::Table => {
                    if rows.is_empty() {
                        println!("Nothing outstanding as of {}.", today);
                        return Ok(());
                    }
                    println!(
                        "{:<24} {:>12} {:>12} {:>12} {:>12} {:>12} {:>14}",
                        "CUSTOMER", "CURRENT", "1-30", "31-60", "61-90", "90+", "TOTAL"
                    );
                    println!("{}", "-".repeat(104));
                    for row in &rows {
                        let a = &row.aging;
                        println!(
                            "{:<24} {:>12} {:>12} {:>12} {:>12} {:>12} {:>14}",
                            truncate(&row.customer.name, 24),
                            format_amount(a.current),
                            format_amount(a.days_1_to_30),
                            format_amount(a.days_31_to_60),
                            format_amount(a.days_61_to_90),
                            format_amount(a.days_90_plus),
                            format_amount(a.total)
                        );
                    }
                }
            }
        }
    }
    Ok(())
}

fn run_export_command(ledger: &CustomerLedger, export_type: &str, output: Option<&str>) -> Result<()> {
    use crate::io::{export_invoices_csv, export_ledger_json, export_statement_csv};
    use std::fs::File;
    use std::io::{stdout, Write};

    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    match export_type {
        "statement" => {
            let count = export_statement_csv(ledger, writer)?;
            if output.is_some() {
                eprintln!("Exported {} statement lines", count);
            }
        }
        "invoices" => {
            let count = export_invoices_csv(ledger, writer)?;
            if output.is_some() {
                eprintln!("Exported {} invoices", count);
            }
        }
        "ledger" => {
            export_ledger_json(ledger, writer)?;
            if output.is_some() {
                eprintln!(
                    "Exported ledger: {} transactions, {} invoices, {} payments",
                    ledger.transactions.len(),
                    ledger.invoices.len(),
                    ledger.payments.len()
                );
            }
        }
        _ => {
            anyhow::bail!(
                "Invalid export type '{}'. Valid types: statement, invoices, ledger",
                export_type
            );
        }
    }

    Ok(())
}

async fn run_check_command(service: &LedgerService, company: &str) -> Result<()> {
    let report = service.check_integrity(company).await?;

    println!("Ledger Integrity Check");
    println!("  Invoices checked: {}", report.invoices_checked);
    println!("  Payments checked: {}", report.payments_checked);

    if report.is_ok() {
        println!("\nAll checks passed.");
        Ok(())
    } else {
        println!("\nIssues found:");
        for issue in &report.issues {
            println!("  - {}", issue);
        }
        anyhow::bail!("{} integrity issue(s) found", report.issues.len())
    }
}

fn amount_or_blank(cents: i64) -> String {
    if cents == 0 {
        String::new()
    } else {
        format_amount(cents)
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn parse_date(date_str: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}'. Use YYYY-MM-DD", date_str))
}

fn parse_optional_date(date: Option<String>) -> Result<NaiveDate> {
    match date {
        Some(date_str) => parse_date(&date_str),
        None => Ok(Utc::now().date_naive()),
    }
}

/// Defaults: from the start of the current year to today.
fn parse_date_range(
    from: Option<String>,
    to: Option<String>,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate)> {
    let to_date = match to {
        Some(date_str) => parse_date(&date_str)?,
        None => today,
    };

    let from_date = match from {
        Some(date_str) => parse_date(&date_str)?,
        None => NaiveDate::from_ymd_opt(today.year(), 1, 1)
            .ok_or_else(|| anyhow::anyhow!("Invalid start of year for {}", today))?,
    };

    Ok((from_date, to_date))
}
