use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{Cents, InvoiceStatus, Payment, Sale, StudioProduction};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegrityIssue {
    /// Stored status differs from the one derived from the amounts.
    StatusDrift {
        invoice_no: String,
        stored: InvoiceStatus,
        derived: InvoiceStatus,
    },
    /// Stored paid amount differs from the sum of payments allocated to it.
    PaidAmountMismatch {
        invoice_no: String,
        stored: Cents,
        allocated: Cents,
    },
    Overpaid {
        invoice_no: String,
        total: Cents,
        paid: Cents,
    },
    /// A payment names an invoice that does not exist for its customer.
    UnknownAllocation {
        reference_no: String,
        invoice_no: String,
    },
}

impl std::fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntegrityIssue::StatusDrift {
                invoice_no,
                stored,
                derived,
            } => write!(f, "{}: stored status '{}' but amounts say '{}'", invoice_no, stored, derived),
            IntegrityIssue::PaidAmountMismatch {
                invoice_no,
                stored,
                allocated,
            } => write!(
                f,
                "{}: paid amount {} cents but {} cents allocated by payments",
                invoice_no, stored, allocated
            ),
            IntegrityIssue::Overpaid {
                invoice_no,
                total,
                paid,
            } => write!(f, "{}: paid {} cents on a total of {} cents", invoice_no, paid, total),
            IntegrityIssue::UnknownAllocation {
                reference_no,
                invoice_no,
            } => write!(f, "payment {} allocated to unknown invoice {}", reference_no, invoice_no),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub invoices_checked: usize,
    pub payments_checked: usize,
    pub issues: Vec<IntegrityIssue>,
}

impl IntegrityReport {
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }
}

struct InvoiceFacts<'a> {
    invoice_no: &'a str,
    total: Cents,
    paid: Cents,
    status: InvoiceStatus,
}

/// Cross-check stored invoice amounts and statuses against the payments
/// allocated to them. Invoice numbers are keyed per customer.
pub fn check_allocations(
    sales: &[Sale],
    productions: &[StudioProduction],
    payments: &[Payment],
) -> IntegrityReport {
    let invoices: Vec<(uuid::Uuid, InvoiceFacts)> = sales
        .iter()
        .map(|s| {
            (
                s.customer_id,
                InvoiceFacts {
                    invoice_no: &s.invoice_no,
                    total: s.total,
                    paid: s.paid_amount,
                    status: s.status,
                },
            )
        })
        .chain(productions.iter().map(|p| {
            (
                p.customer_id,
                InvoiceFacts {
                    invoice_no: &p.production_no,
                    total: p.total_amount,
                    paid: p.paid_amount,
                    status: p.status,
                },
            )
        }))
        .collect();

    let mut allocated: HashMap<(uuid::Uuid, &str), Cents> = invoices
        .iter()
        .map(|(customer, facts)| ((*customer, facts.invoice_no), 0))
        .collect();

    let mut issues = Vec::new();

    for payment in payments {
        let Some(invoice_no) = payment.invoice_no.as_deref() else {
            continue;
        };
        match allocated.get_mut(&(payment.customer_id, invoice_no)) {
            Some(sum) => *sum += payment.amount,
            None => issues.push(IntegrityIssue::UnknownAllocation {
                reference_no: payment.reference_no.clone(),
                invoice_no: invoice_no.to_string(),
            }),
        }
    }

    for (customer, facts) in &invoices {
        let derived = InvoiceStatus::derive(facts.total, facts.paid);
        if derived != facts.status {
            issues.push(IntegrityIssue::StatusDrift {
                invoice_no: facts.invoice_no.to_string(),
                stored: facts.status,
                derived,
            });
        }

        let allocated_sum = allocated
            .get(&(*customer, facts.invoice_no))
            .copied()
            .unwrap_or(0);
        if allocated_sum != facts.paid {
            issues.push(IntegrityIssue::PaidAmountMismatch {
                invoice_no: facts.invoice_no.to_string(),
                stored: facts.paid,
                allocated: allocated_sum,
            });
        }

        if facts.paid > facts.total {
            issues.push(IntegrityIssue::Overpaid {
                invoice_no: facts.invoice_no.to_string(),
                total: facts.total,
                paid: facts.paid,
            });
        }
    }

    IntegrityReport {
        invoices_checked: invoices.len(),
        payments_checked: payments.len(),
        issues,
    }
}
