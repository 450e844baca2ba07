mod common;

use anyhow::Result;
use boutique_ledger::application::{AppError, DisplayOrder, LedgerQuery};
use boutique_ledger::domain::{Cents, DocumentType, InvoiceStatus, StudioStage};
use common::{date, test_service, Shop};

#[tokio::test]
async fn test_running_balance_example() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let shop = Shop::open(&service).await?;

    shop.sale(&service, "INV-001", "2026-09-01", 10_000, 0).await?;
    shop.pay(&service, "2026-09-02", 3_000, Some("INV-001")).await?;
    shop.sale(&service, "INV-002", "2026-09-03", 2_000, 0).await?;

    let ledger = shop.ledger(&service, "2026-09-01", "2026-09-30", "2026-09-30").await?;

    let balances: Vec<Cents> = ledger.transactions.iter().map(|t| t.running_balance).collect();
    assert_eq!(balances, vec![10_000, 7_000, 9_000]);
    assert_eq!(ledger.summary.opening_balance, 0);
    assert_eq!(ledger.summary.closing_balance, 9_000);

    Ok(())
}

#[tokio::test]
async fn test_opening_balance_includes_prior_documents() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let shop = Shop::open_with_opening_balance(&service, 1_500).await?;

    // Before the statement range
    shop.sale(&service, "INV-001", "2026-07-10", 20_000, 2_000).await?;
    shop.pay(&service, "2026-07-20", 5_000, Some("INV-001")).await?;

    // Inside the range
    shop.sale(&service, "INV-002", "2026-08-05", 8_000, 0).await?;
    shop.pay(&service, "2026-08-06", 4_000, None).await?;

    let ledger = shop.ledger(&service, "2026-08-01", "2026-08-31", "2026-08-31").await?;

    // 1_500 carried forward + 18_000 net sale - 5_000 paid
    assert_eq!(ledger.summary.opening_balance, 14_500);
    assert_eq!(ledger.transactions.len(), 2);
    assert_eq!(ledger.transactions[0].running_balance, 22_500);
    assert_eq!(ledger.transactions[1].running_balance, 18_500);
    assert_eq!(ledger.summary.closing_balance, 18_500);

    // Only documents inside the range are listed
    assert_eq!(ledger.invoices.len(), 1);
    assert_eq!(ledger.invoices[0].invoice_no, "INV-002");
    assert_eq!(ledger.payments.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_running_balance_prefix_sum_property() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let shop = Shop::open_with_opening_balance(&service, 700).await?;

    for day in 1..=20u32 {
        let on = format!("2026-06-{:02}", day);
        shop.sale(&service, &format!("INV-{:03}", day), &on, 1_000 + day as Cents * 15, day as Cents)
            .await?;
        if day % 4 == 0 {
            shop.pay(&service, &on, 2_500, None).await?;
        }
    }

    let ledger = shop.ledger(&service, "2026-06-01", "2026-06-30", "2026-06-30").await?;
    let opening = ledger.summary.opening_balance;
    assert_eq!(opening, 700);

    let mut expected = opening;
    for tx in &ledger.transactions {
        expected += tx.debit - tx.credit;
        assert_eq!(tx.running_balance, expected);
    }
    assert_eq!(ledger.summary.closing_balance, expected);

    Ok(())
}

#[tokio::test]
async fn test_discount_appears_as_credit_line() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let shop = Shop::open(&service).await?;

    shop.sale(&service, "INV-010", "2026-09-10", 50_000, 5_000).await?;

    let ledger = shop.ledger(&service, "2026-09-01", "2026-09-30", "2026-09-30").await?;

    let kinds: Vec<DocumentType> = ledger.transactions.iter().map(|t| t.document_type).collect();
    assert_eq!(kinds, vec![DocumentType::Sale, DocumentType::Discount]);
    assert_eq!(ledger.transactions[0].debit, 50_000);
    assert_eq!(ledger.transactions[1].credit, 5_000);
    assert_eq!(ledger.summary.closing_balance, 45_000);
    assert_eq!(ledger.invoices[0].invoice_total, 45_000);

    Ok(())
}

#[tokio::test]
async fn test_same_day_sale_before_payment() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let shop = Shop::open(&service).await?;

    // Payment recorded first, but on the same day as the sale it settles
    shop.pay(&service, "2026-09-15", 1_000, None).await?;
    shop.sale(&service, "INV-020", "2026-09-15", 4_000, 0).await?;

    let ledger = shop.ledger(&service, "2026-09-01", "2026-09-30", "2026-09-30").await?;

    assert_eq!(ledger.transactions[0].document_type, DocumentType::Sale);
    assert_eq!(ledger.transactions[0].running_balance, 4_000);
    assert_eq!(ledger.transactions[1].document_type, DocumentType::Payment);
    assert_eq!(ledger.transactions[1].running_balance, 3_000);

    Ok(())
}

#[tokio::test]
async fn test_descending_display_keeps_balances() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let shop = Shop::open(&service).await?;

    shop.sale(&service, "INV-001", "2026-09-01", 10_000, 0).await?;
    shop.pay(&service, "2026-09-05", 2_000, None).await?;

    let ledger = service
        .customer_ledger(LedgerQuery {
            company_id: shop.company_id(),
            customer_id: shop.customer_id(),
            from_date: date("2026-09-01"),
            to_date: date("2026-09-30"),
            today: date("2026-09-30"),
            order: DisplayOrder::Descending,
        })
        .await?;

    assert_eq!(ledger.transactions[0].date, date("2026-09-05"));
    assert_eq!(ledger.transactions[0].running_balance, 8_000);
    assert_eq!(ledger.transactions[1].running_balance, 10_000);

    Ok(())
}

#[tokio::test]
async fn test_studio_productions_join_the_ledger_once_billable() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let shop = Shop::open(&service).await?;

    service
        .record_studio_production(
            &shop.company_id(),
            &shop.customer_id(),
            "ST-001",
            date("2026-09-04"),
            30_000,
            Some("Bridal lehenga".into()),
        )
        .await?;

    let ledger = shop.ledger(&service, "2026-09-01", "2026-09-30", "2026-09-30").await?;
    assert!(ledger.transactions.is_empty(), "drafts are not billed");
    assert!(ledger.invoices.is_empty());

    service
        .advance_studio_stage(&shop.company_id(), "ST-001", StudioStage::InProgress)
        .await?;

    let ledger = shop.ledger(&service, "2026-09-01", "2026-09-30", "2026-09-30").await?;
    assert_eq!(ledger.transactions.len(), 1);
    assert_eq!(ledger.transactions[0].description, "Bridal lehenga");
    assert_eq!(ledger.transactions[0].debit, 30_000);
    assert_eq!(ledger.invoices[0].status, InvoiceStatus::Unpaid);

    Ok(())
}

#[tokio::test]
async fn test_invalid_company_fails_immediately() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let shop = Shop::open(&service).await?;

    for company_id in ["", "not-a-uuid", "00000000-0000-0000-0000-000000000000"] {
        let result = service
            .customer_ledger(LedgerQuery {
                company_id: company_id.to_string(),
                customer_id: shop.customer_id(),
                from_date: date("2026-09-01"),
                to_date: date("2026-09-30"),
                today: date("2026-09-30"),
                order: DisplayOrder::Ascending,
            })
            .await;
        assert!(
            matches!(result, Err(AppError::InvalidCompany(_))),
            "company id '{}' should be rejected",
            company_id
        );
    }

    Ok(())
}

#[tokio::test]
async fn test_customer_of_another_company_is_not_found() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let shop = Shop::open(&service).await?;
    let other = service.create_company("Other Boutique", "PKR").await?;

    let result = service
        .customer_ledger(LedgerQuery {
            company_id: other.id.to_string(),
            customer_id: shop.customer_id(),
            from_date: date("2026-09-01"),
            to_date: date("2026-09-30"),
            today: date("2026-09-30"),
            order: DisplayOrder::Ascending,
        })
        .await;

    assert!(matches!(result, Err(AppError::CustomerNotFound(_))));
    Ok(())
}

#[tokio::test]
async fn test_reversed_date_range_is_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let shop = Shop::open(&service).await?;

    let result = shop.ledger(&service, "2026-09-30", "2026-09-01", "2026-09-30").await;
    let err = result.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<AppError>(),
        Some(AppError::InvalidDateRange { .. })
    ));

    Ok(())
}

#[tokio::test]
async fn test_empty_ledger() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let shop = Shop::open_with_opening_balance(&service, 2_000).await?;

    let ledger = shop.ledger(&service, "2026-09-01", "2026-09-30", "2026-09-30").await?;

    assert!(ledger.transactions.is_empty());
    assert_eq!(ledger.summary.opening_balance, 2_000);
    assert_eq!(ledger.summary.closing_balance, 2_000);
    assert_eq!(ledger.aging.total, 0);

    Ok(())
}
