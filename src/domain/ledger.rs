use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Cents, Invoice, Payment, Sale, StudioProduction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Sale,
    Discount,
    Payment,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Sale => "sale",
            DocumentType::Discount => "discount",
            DocumentType::Payment => "payment",
        }
    }

    /// Same-day ordering: charges before the discounts on them, payments last.
    fn rank(&self) -> u8 {
        match self {
            DocumentType::Sale => 0,
            DocumentType::Discount => 1,
            DocumentType::Payment => 2,
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One line of a customer statement.
///
/// Exactly one of `debit` / `credit` is non-zero. `running_balance` is only
/// meaningful after [`apply_running_balance`] has been called on the sorted
/// list it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub date: NaiveDate,
    pub reference_no: String,
    pub document_type: DocumentType,
    pub debit: Cents,
    pub credit: Cents,
    pub running_balance: Cents,
    pub description: String,
}

impl Transaction {
    pub fn net(&self) -> Cents {
        self.debit - self.credit
    }
}

/// A regular sale charges its gross subtotal; any discount is a separate credit line.
pub fn sale_entries(sale: &Sale) -> Vec<Transaction> {
    let mut entries = vec![Transaction {
        id: sale.id.to_string(),
        date: sale.sale_date,
        reference_no: sale.invoice_no.clone(),
        document_type: DocumentType::Sale,
        debit: sale.subtotal,
        credit: 0,
        running_balance: 0,
        description: sale
            .notes
            .clone()
            .unwrap_or_else(|| format!("Sale {}", sale.invoice_no)),
    }];

    if sale.discount > 0 {
        entries.push(Transaction {
            id: format!("{}-discount", sale.id),
            date: sale.sale_date,
            reference_no: sale.invoice_no.clone(),
            document_type: DocumentType::Discount,
            debit: 0,
            credit: sale.discount,
            running_balance: 0,
            description: format!("Discount on {}", sale.invoice_no),
        });
    }

    entries
}

/// Studio jobs still in draft are quotes and produce no ledger line.
pub fn studio_entry(production: &StudioProduction) -> Option<Transaction> {
    if !production.stage.is_billable() {
        return None;
    }

    Some(Transaction {
        id: production.id.to_string(),
        date: production.production_date,
        reference_no: production.production_no.clone(),
        document_type: DocumentType::Sale,
        debit: production.total_amount,
        credit: 0,
        running_balance: 0,
        description: production
            .description
            .clone()
            .unwrap_or_else(|| format!("Studio production {}", production.production_no)),
    })
}

pub fn payment_entry(payment: &Payment) -> Transaction {
    let description = match (&payment.notes, &payment.invoice_no) {
        (Some(notes), _) => notes.clone(),
        (None, Some(invoice_no)) => format!("Payment ({}) for {}", payment.method, invoice_no),
        (None, None) => format!("Payment ({})", payment.method),
    };

    Transaction {
        id: payment.id.to_string(),
        date: payment.payment_date,
        reference_no: payment.reference_no.clone(),
        document_type: DocumentType::Payment,
        debit: 0,
        credit: payment.amount,
        running_balance: 0,
        description,
    }
}

/// Merge sales, studio productions and payments into one chronologically
/// sorted transaction list.
pub fn normalize(
    sales: &[Sale],
    productions: &[StudioProduction],
    payments: &[Payment],
) -> Vec<Transaction> {
    let mut transactions: Vec<Transaction> = sales
        .iter()
        .flat_map(sale_entries)
        .chain(productions.iter().filter_map(studio_entry))
        .chain(payments.iter().map(payment_entry))
        .collect();

    sort_chronologically(&mut transactions);
    transactions
}

/// Ascending by date; same-day lines order by document type, then reference
/// number, then id, so the order is stable across reads.
pub fn chronological(a: &Transaction, b: &Transaction) -> Ordering {
    a.date
        .cmp(&b.date)
        .then_with(|| a.document_type.rank().cmp(&b.document_type.rank()))
        .then_with(|| a.reference_no.cmp(&b.reference_no))
        .then_with(|| a.id.cmp(&b.id))
}

pub fn sort_chronologically(transactions: &mut [Transaction]) {
    transactions.sort_by(chronological);
}

/// Fill in `running_balance` as a prefix sum over `debit - credit` starting
/// at `opening`. Expects the slice already sorted; returns the closing balance.
pub fn apply_running_balance(opening: Cents, transactions: &mut [Transaction]) -> Cents {
    transactions.iter_mut().fold(opening, |balance, tx| {
        let next = balance + tx.net();
        tx.running_balance = next;
        next
    })
}

/// Totals shown above a customer statement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSummary {
    pub opening_balance: Cents,
    pub total_debit: Cents,
    pub total_credit: Cents,
    pub closing_balance: Cents,
    pub total_invoiced: Cents,
    pub total_paid: Cents,
    pub total_pending: Cents,
    pub invoice_count: usize,
    pub payment_count: usize,
}

impl LedgerSummary {
    pub fn build(
        opening_balance: Cents,
        transactions: &[Transaction],
        invoices: &[Invoice],
        payments: &[Payment],
    ) -> Self {
        let (total_debit, total_credit) = transactions
            .iter()
            .fold((0, 0), |(d, c), tx| (d + tx.debit, c + tx.credit));

        let (total_invoiced, total_paid, total_pending) =
            invoices.iter().fold((0, 0, 0), |(t, p, o), inv| {
                (t + inv.invoice_total, p + inv.paid_amount, o + inv.pending_amount)
            });

        Self {
            opening_balance,
            total_debit,
            total_credit,
            closing_balance: opening_balance + total_debit - total_credit,
            total_invoiced,
            total_paid,
            total_pending,
            invoice_count: invoices.len(),
            payment_count: payments.len(),
        }
    }
}
