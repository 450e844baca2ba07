use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Cents, Invoice};

/// Collections age of an unpaid amount, measured in whole days from the
/// invoice date to the report date.
///
/// Day 0 (and future-dated invoices) is `Current`. Each later bucket includes
/// its upper bound, so day 30 is `Days1To30` and day 31 is `Days31To60`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgingBucket {
    Current,
    Days1To30,
    Days31To60,
    Days61To90,
    Days90Plus,
}

impl AgingBucket {
    pub fn for_age(days: i64) -> Self {
        match days {
            d if d <= 0 => AgingBucket::Current,
            1..=30 => AgingBucket::Days1To30,
            31..=60 => AgingBucket::Days31To60,
            61..=90 => AgingBucket::Days61To90,
            _ => AgingBucket::Days90Plus,
        }
    }

    pub fn for_date(invoice_date: NaiveDate, today: NaiveDate) -> Self {
        Self::for_age((today - invoice_date).num_days())
    }

    pub fn label(&self) -> &'static str {
        match self {
            AgingBucket::Current => "Current",
            AgingBucket::Days1To30 => "1-30 days",
            AgingBucket::Days31To60 => "31-60 days",
            AgingBucket::Days61To90 => "61-90 days",
            AgingBucket::Days90Plus => "90+ days",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgingReport {
    pub as_of: Option<NaiveDate>,
    pub current: Cents,
    pub days_1_to_30: Cents,
    pub days_31_to_60: Cents,
    pub days_61_to_90: Cents,
    pub days_90_plus: Cents,
    pub total: Cents,
}

impl AgingReport {
    /// Partition the pending amounts of `invoices` by age as of `today`.
    /// Settled invoices contribute nothing.
    pub fn build(invoices: &[Invoice], today: NaiveDate) -> Self {
        let mut report = AgingReport {
            as_of: Some(today),
            ..Default::default()
        };

        for invoice in invoices.iter().filter(|i| i.is_outstanding()) {
            report.add(
                AgingBucket::for_date(invoice.date, today),
                invoice.pending_amount,
            );
        }

        report
    }

    fn add(&mut self, bucket: AgingBucket, amount: Cents) {
        let slot = match bucket {
            AgingBucket::Current => &mut self.current,
            AgingBucket::Days1To30 => &mut self.days_1_to_30,
            AgingBucket::Days31To60 => &mut self.days_31_to_60,
            AgingBucket::Days61To90 => &mut self.days_61_to_90,
            AgingBucket::Days90Plus => &mut self.days_90_plus,
        };
        *slot += amount;
        self.total += amount;
    }

    pub fn buckets(&self) -> [(AgingBucket, Cents); 5] {
        [
            (AgingBucket::Current, self.current),
            (AgingBucket::Days1To30, self.days_1_to_30),
            (AgingBucket::Days31To60, self.days_31_to_60),
            (AgingBucket::Days61To90, self.days_61_to_90),
            (AgingBucket::Days90Plus, self.days_90_plus),
        ]
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::domain::InvoiceSource;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 15).unwrap()
    }

    fn invoice_aged(days: i64, total: Cents, paid: Cents) -> Invoice {
        Invoice::new(
            format!("INV-{}", days),
            InvoiceSource::Sale,
            today() - Duration::days(days),
            total,
            paid,
        )
    }

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(AgingBucket::for_age(-3), AgingBucket::Current);
        assert_eq!(AgingBucket::for_age(0), AgingBucket::Current);
        assert_eq!(AgingBucket::for_age(1), AgingBucket::Days1To30);
        assert_eq!(AgingBucket::for_age(30), AgingBucket::Days1To30);
        assert_eq!(AgingBucket::for_age(31), AgingBucket::Days31To60);
        assert_eq!(AgingBucket::for_age(60), AgingBucket::Days31To60);
        assert_eq!(AgingBucket::for_age(61), AgingBucket::Days61To90);
        assert_eq!(AgingBucket::for_age(90), AgingBucket::Days61To90);
        assert_eq!(AgingBucket::for_age(91), AgingBucket::Days90Plus);
    }

    #[test]
    fn test_unpaid_invoice_45_days_old() {
        let report = AgingReport::build(&[invoice_aged(45, 20_000, 0)], today());
        assert_eq!(report.days_31_to_60, 20_000);
        assert_eq!(report.total, 20_000);
    }

    #[test]
    fn test_only_pending_amounts_are_aged() {
        let invoices = vec![
            invoice_aged(10, 10_000, 4_000),
            invoice_aged(70, 5_000, 5_000),
            invoice_aged(120, 7_500, 0),
        ];
        let report = AgingReport::build(&invoices, today());

        assert_eq!(report.days_1_to_30, 6_000);
        assert_eq!(report.days_61_to_90, 0);
        assert_eq!(report.days_90_plus, 7_500);
        assert_eq!(report.total, 13_500);
    }

    #[test]
    fn test_buckets_sum_to_total() {
        let invoices: Vec<Invoice> = (0..200)
            .map(|i| invoice_aged(i - 5, 1_001 + i * 37, (i * 13) % 900))
            .collect();
        let report = AgingReport::build(&invoices, today());

        let sum: Cents = report.buckets().iter().map(|(_, amount)| amount).sum();
        assert_eq!(sum, report.total);

        let pending: Cents = invoices.iter().map(|i| i.pending_amount).sum();
        assert_eq!(report.total, pending);
    }

    #[test]
    fn test_empty_input_is_all_zero() {
        let report = AgingReport::build(&[], today());
        assert_eq!(report.total, 0);
        assert_eq!(report.as_of, Some(today()));
    }
}
