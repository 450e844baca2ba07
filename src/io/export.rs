use anyhow::Result;
use std::io::Write;

use crate::application::CustomerLedger;
use crate::domain::format_plain;

/// Write the statement lines of a ledger as CSV, in the ledger's display order.
/// Amounts are plain decimals (`1234.50`) so spreadsheets read them as numbers.
pub fn export_statement_csv<W: Write>(ledger: &CustomerLedger, writer: W) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record([
        "date",
        "reference_no",
        "document_type",
        "description",
        "debit",
        "credit",
        "running_balance",
    ])?;

    for tx in &ledger.transactions {
        csv_writer.write_record([
            tx.date.to_string(),
            tx.reference_no.clone(),
            tx.document_type.as_str().to_string(),
            tx.description.clone(),
            format_plain(tx.debit),
            format_plain(tx.credit),
            format_plain(tx.running_balance),
        ])?;
    }

    csv_writer.flush()?;
    Ok(ledger.transactions.len())
}

pub fn export_invoices_csv<W: Write>(ledger: &CustomerLedger, writer: W) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record([
        "invoice_no",
        "source",
        "date",
        "invoice_total",
        "paid_amount",
        "pending_amount",
        "status",
    ])?;

    for invoice in &ledger.invoices {
        csv_writer.write_record([
            invoice.invoice_no.clone(),
            invoice.source.as_str().to_string(),
            invoice.date.to_string(),
            format_plain(invoice.invoice_total),
            format_plain(invoice.paid_amount),
            format_plain(invoice.pending_amount),
            invoice.status.label().to_string(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(ledger.invoices.len())
}

/// The whole ledger as pretty-printed JSON. Amounts stay in integer cents.
pub fn export_ledger_json<W: Write>(ledger: &CustomerLedger, mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, ledger)?;
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::application::CustomerLedger;
    use crate::domain::{
        apply_running_balance, normalize, AgingReport, Company, Customer, LedgerSummary,
        PaymentMethod, Payment, Sale,
    };

    fn sample_ledger() -> CustomerLedger {
        let company = Company::new("Atelier Noor", "PKR");
        let customer = Customer::new(company.id, "Sana, \"VIP\"");
        let date = NaiveDate::from_ymd_opt(2026, 7, 1).unwrap();

        let mut sale = Sale::new(company.id, customer.id, "INV-100", date, 150_000, 10_000);
        sale.apply_payment(50_000);
        let payment = Payment::new(company.id, customer.id, "PAY-1", date, 50_000, PaymentMethod::Cash)
            .allocated_to("INV-100");

        let mut transactions = normalize(
            std::slice::from_ref(&sale),
            &[],
            std::slice::from_ref(&payment),
        );
        apply_running_balance(0, &mut transactions);
        let invoices = vec![sale.to_invoice()];
        let summary = LedgerSummary::build(0, &transactions, &invoices, std::slice::from_ref(&payment));

        CustomerLedger {
            company,
            customer,
            from_date: date,
            to_date: date,
            transactions,
            invoices,
            payments: vec![payment],
            aging: AgingReport::default(),
            summary,
        }
    }

    #[test]
    fn test_statement_csv_has_running_balance() {
        let ledger = sample_ledger();
        let mut buf = Vec::new();
        let count = export_statement_csv(&ledger, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert_eq!(count, 3);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "date,reference_no,document_type,description,debit,credit,running_balance"
        );
        assert_eq!(lines[1], "2026-07-01,INV-100,sale,Sale INV-100,1500.00,0.00,1500.00");
        assert_eq!(
            lines[2],
            "2026-07-01,INV-100,discount,Discount on INV-100,0.00,100.00,1400.00"
        );
        assert!(lines[3].ends_with(",0.00,500.00,900.00"));
    }

    #[test]
    fn test_invoices_csv_uses_status_labels() {
        let ledger = sample_ledger();
        let mut buf = Vec::new();
        export_invoices_csv(&ledger, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.contains("INV-100,sale,2026-07-01,1400.00,500.00,900.00,Partially Paid"));
    }

    #[test]
    fn test_json_export_is_parseable() {
        let ledger = sample_ledger();
        let mut buf = Vec::new();
        export_ledger_json(&ledger, &mut buf).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["summary"]["closing_balance"], 90_000);
        assert_eq!(value["customer"]["name"], "Sana, \"VIP\"");
        assert_eq!(value["invoices"][0]["status"], "partially_paid");
    }
}
