mod common;

use anyhow::Result;
use boutique_ledger::domain::{AgingBucket, Cents, StudioStage};
use common::{date, test_service, Shop};

#[tokio::test]
async fn test_unpaid_invoice_45_days_old() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let shop = Shop::open(&service).await?;

    // 2026-10-15 minus 45 days
    shop.sale(&service, "INV-001", "2026-08-31", 12_000, 0).await?;

    let ledger = shop.ledger(&service, "2026-08-01", "2026-10-15", "2026-10-15").await?;
    assert_eq!(ledger.aging.days_31_to_60, 12_000);
    assert_eq!(ledger.aging.total, 12_000);
    assert_eq!(ledger.aging.as_of, Some(date("2026-10-15")));

    Ok(())
}

#[tokio::test]
async fn test_aging_covers_invoices_outside_statement_range() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let shop = Shop::open(&service).await?;

    shop.sale(&service, "INV-OLD", "2026-05-01", 40_000, 0).await?;
    shop.pay(&service, "2026-05-10", 10_000, Some("INV-OLD")).await?;
    shop.sale(&service, "INV-NEW", "2026-10-10", 5_000, 0).await?;

    // Statement only covers October, aging still sees the May invoice
    let ledger = shop.ledger(&service, "2026-10-01", "2026-10-31", "2026-10-15").await?;
    assert_eq!(ledger.invoices.len(), 1);
    assert_eq!(ledger.aging.days_90_plus, 30_000);
    assert_eq!(ledger.aging.days_1_to_30, 5_000);
    assert_eq!(ledger.aging.total, 35_000);

    Ok(())
}

#[tokio::test]
async fn test_aging_buckets_sum_to_total() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let shop = Shop::open(&service).await?;

    let dates = [
        "2026-10-15", "2026-10-01", "2026-09-15", "2026-09-14", "2026-08-16", "2026-08-15",
        "2026-07-17", "2026-07-16", "2026-03-01",
    ];
    for (i, on) in dates.iter().enumerate() {
        let invoice_no = format!("INV-{:03}", i);
        shop.sale(&service, &invoice_no, on, 3_333 + i as Cents * 101, i as Cents * 7)
            .await?;
        if i % 3 == 1 {
            shop.pay(&service, on, 1_111, Some(&invoice_no)).await?;
        }
    }

    let ledger = shop.ledger(&service, "2026-01-01", "2026-10-15", "2026-10-15").await?;
    let aging = &ledger.aging;

    let bucket_sum: Cents = aging.buckets().iter().map(|(_, amount)| amount).sum();
    assert_eq!(bucket_sum, aging.total);
    assert_eq!(aging.total, ledger.summary.total_pending);

    // Boundaries: 30 days is still 1-30, 31 days moves on
    assert_eq!(AgingBucket::for_date(date("2026-09-15"), date("2026-10-15")), AgingBucket::Days1To30);
    assert_eq!(AgingBucket::for_date(date("2026-09-14"), date("2026-10-15")), AgingBucket::Days31To60);

    Ok(())
}

#[tokio::test]
async fn test_settled_invoices_do_not_age() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let shop = Shop::open(&service).await?;

    shop.sale(&service, "INV-001", "2026-06-01", 7_000, 0).await?;
    shop.pay(&service, "2026-06-02", 7_000, Some("INV-001")).await?;

    let ledger = shop.ledger(&service, "2026-06-01", "2026-10-15", "2026-10-15").await?;
    assert_eq!(ledger.aging.total, 0);

    Ok(())
}

#[tokio::test]
async fn test_company_aging_lists_customers_who_owe() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let shop = Shop::open(&service).await?;
    let company_id = shop.company_id();

    let paid_up = service
        .create_customer(&company_id, "Zara", None, None, 0)
        .await?;
    let studio_client = service
        .create_customer(&company_id, "Hina", None, None, 0)
        .await?;

    shop.sale(&service, "INV-001", "2026-09-01", 9_000, 0).await?;

    service
        .record_studio_production(
            &company_id,
            &studio_client.id.to_string(),
            "ST-001",
            date("2026-10-01"),
            20_000,
            None,
        )
        .await?;

    let today = date("2026-10-15");
    let rows = service.company_aging(&company_id, today).await?;
    assert_eq!(rows.len(), 1, "draft production is not owed yet");
    assert_eq!(rows[0].customer.id, shop.customer.id);
    assert_eq!(rows[0].aging.days_31_to_60, 9_000);

    service
        .advance_studio_stage(&company_id, "ST-001", StudioStage::InProgress)
        .await?;

    let rows = service.company_aging(&company_id, today).await?;
    let names: Vec<&str> = rows.iter().map(|r| r.customer.name.as_str()).collect();
    assert_eq!(names, vec!["Ayesha Khan", "Hina"]);
    assert!(!names.contains(&paid_up.name.as_str()));

    let single = service
        .customer_aging(&company_id, &studio_client.id.to_string(), today)
        .await?;
    assert_eq!(single.aging.days_1_to_30, 20_000);

    Ok(())
}
