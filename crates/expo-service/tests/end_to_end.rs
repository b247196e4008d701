//! End-to-end flows through the `BackOffice` boundary.

use chrono::{Duration, Utc};
use expo_core::numbering::PeriodKey;
use expo_core::rates::Usage;
use expo_core::render::{layout_invoice, RenderOptions};
use expo_core::{
    Exhibitor, Invoice, InvoiceItem, InvoiceQuery, InvoiceStatus, NewInvoice, RateUpdate,
};
use expo_db::{Database, DbConfig};
use expo_service::{BackOffice, InvoiceService, InvoiceSettings, ServiceError};
use tempfile::TempDir;

async fn office() -> BackOffice {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    BackOffice::new(db, InvoiceSettings::default())
}

fn booth_invoice(company: &str, amount_cents: i64) -> NewInvoice {
    NewInvoice {
        company: company.to_string(),
        exhibitor_id: None,
        issue_date: None,
        due_date: Utc::now() + Duration::days(30),
        amount_cents,
        items: vec![InvoiceItem::new("Booth", 2, 50_000)],
        notes: None,
        status: None,
    }
}

fn invoice_from(reply: &expo_service::ApiReply) -> Invoice {
    serde_json::from_value(reply.body.data.clone().unwrap()).unwrap()
}

#[tokio::test]
async fn invoice_lifecycle_create_render_pay() {
    let office = office().await;

    // Stored amount is whatever the caller sent, independent of the items.
    let reply = office.create_invoice(booth_invoice("Acme Stands", 123_400)).await;
    assert_eq!(reply.status, 201);
    assert!(reply.is_success());
    assert_eq!(reply.body.message.as_deref(), Some("Invoice created"));

    let created = invoice_from(&reply);
    let prefix = PeriodKey::from_datetime(created.created_at).prefix();
    assert_eq!(created.invoice_number, format!("{prefix}0001"));
    assert_eq!(created.amount_cents, 123_400);
    assert_eq!(created.status, InvoiceStatus::Pending);

    // The rendered total comes from the items: 2 × 500.00
    let layout = layout_invoice(&created, None, &RenderOptions::new(Utc::now())).unwrap();
    assert!(layout.contains_text("Total: INR 1000.00"));

    let attachment = office.invoice_pdf(&created.id).await.unwrap();
    assert_eq!(attachment.filename, format!("{}.pdf", created.invoice_number));
    assert_eq!(attachment.content_type, "application/pdf");
    assert!(attachment.bytes.starts_with(b"%PDF"));

    // First mark-paid records the payment
    let reply = office
        .mark_invoice_paid(&created.id, Some("NEFT-55012".to_string()))
        .await;
    assert_eq!(reply.status, 200);
    let paid = invoice_from(&reply);
    assert_eq!(paid.status, InvoiceStatus::Paid);
    assert!(paid.paid_date.is_some());

    // Second mark-paid is a no-op
    let again = invoice_from(&office.mark_invoice_paid(&created.id, None).await);
    assert_eq!(again.paid_date, paid.paid_date);
    assert_eq!(again.payment_id.as_deref(), Some("NEFT-55012"));
    assert_eq!(again.invoice_number, created.invoice_number);
}

#[tokio::test]
async fn sequential_numbers_and_listing() {
    let office = office().await;

    let mut numbers = Vec::new();
    for company in ["Acme Stands", "Globex Pavilions", "Initech Displays"] {
        let reply = office.create_invoice(booth_invoice(company, 100_000)).await;
        numbers.push(invoice_from(&reply).invoice_number);
    }
    let prefix = PeriodKey::from_datetime(Utc::now()).prefix();
    assert_eq!(
        numbers,
        vec![
            format!("{prefix}0001"),
            format!("{prefix}0002"),
            format!("{prefix}0003")
        ]
    );

    let reply = office
        .list_invoices(InvoiceQuery {
            search: Some("GLOBEX".to_string()),
            ..Default::default()
        })
        .await;
    assert_eq!(reply.status, 200);
    let data = reply.body.data.unwrap();
    assert_eq!(data["pagination"]["total"], 1_i64);
    assert_eq!(data["items"][0]["company"], "Globex Pavilions");

    let reply = office.invoice_stats().await;
    let data = reply.body.data.unwrap();
    assert_eq!(data["pending"]["count"], 3_i64);
    assert_eq!(data["total"]["totalCents"], 300_000_i64);
}

#[tokio::test]
async fn render_includes_linked_exhibitor() {
    let office = office().await;
    let exhibitor = office
        .database()
        .exhibitors()
        .insert(&Exhibitor {
            id: "ex-acme".to_string(),
            company: "Acme Stands".to_string(),
            contact_name: "Asha Rao".to_string(),
            email: Some("billing@acmestands.example".to_string()),
            phone: None,
            created_at: Utc::now(),
        })
        .await
        .unwrap();

    let mut input = booth_invoice("Acme Stands", 100_000);
    input.exhibitor_id = Some(exhibitor.id.clone());
    let created = invoice_from(&office.create_invoice(input).await);

    let layout = layout_invoice(&created, Some(&exhibitor), &RenderOptions::new(Utc::now())).unwrap();
    assert!(layout.contains_text("Asha Rao"));

    assert!(office.invoice_pdf(&created.id).await.is_ok());
}

#[tokio::test]
async fn error_replies_carry_status() {
    let office = office().await;

    let reply = office.get_invoice("no-such-invoice").await;
    assert_eq!(reply.status, 404);
    assert_eq!(
        serde_json::to_value(&reply.body).unwrap()["error"],
        "NOT_FOUND"
    );

    let reply = office.create_invoice(booth_invoice("", 0)).await;
    assert_eq!(reply.status, 400);

    let reply = office.delete_invoice("no-such-invoice").await;
    assert_eq!(reply.status, 404);

    let err = office.invoice_pdf("no-such-invoice").await.unwrap_err();
    assert_eq!(err.status, 404);
}

#[tokio::test]
async fn rates_round_trip() {
    let office = office().await;

    let reply = office
        .update_rate_config(
            "housekeeping",
            RateUpdate {
                rate_cents: Some(240_000),
                shift_hours: None,
            },
        )
        .await;
    assert_eq!(reply.status, 200);

    let reply = office
        .calculate_bulk(
            "housekeeping",
            vec![Usage::Shifts { shifts: 2 }, Usage::Shifts { shifts: 3 }],
        )
        .await;
    let data = reply.body.data.unwrap();
    assert_eq!(data["lines"][0]["totalCents"], 480_000_i64);
    assert_eq!(data["totalCents"], 1_200_000_i64);

    let reply = office
        .calculate_cost("security", Usage::Connections { connections: 1 })
        .await;
    assert_eq!(reply.status, 400);

    office.reset_rate_config("housekeeping").await;
    let reply = office.list_rate_configs().await;
    let data = reply.body.data.unwrap();
    let rates: Vec<i64> = data
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["rateCents"].as_i64().unwrap())
        .collect();
    assert_eq!(rates, vec![200_000, 250_000, 1_500_000]);
}

/// File-backed store with a real multi-connection pool.
async fn shared_store(dir: &TempDir) -> Database {
    Database::new(DbConfig::new(dir.path().join("expo.db")).max_connections(8))
        .await
        .unwrap()
}

async fn create_concurrently(
    service: &InvoiceService,
    creators: usize,
) -> Vec<Result<Invoice, ServiceError>> {
    let handles: Vec<_> = (0..creators)
        .map(|i| {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .create(booth_invoice(&format!("Stand {i:02}"), 100_000))
                    .await
            })
        })
        .collect();

    let mut results = Vec::with_capacity(creators);
    for handle in handles {
        results.push(handle.await.unwrap());
    }
    results
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_with_enough_attempts_all_succeed() {
    let dir = TempDir::new().unwrap();
    let db = shared_store(&dir).await;
    let creators = 16;
    let settings = InvoiceSettings {
        number_retry_attempts: creators as u32,
        ..InvoiceSettings::default()
    };
    let service = InvoiceService::new(db.invoices(), db.exhibitors(), settings);

    let results = create_concurrently(&service, creators).await;

    let mut numbers: Vec<String> = results
        .into_iter()
        .map(|r| r.unwrap().invoice_number)
        .collect();
    numbers.sort();

    let prefix = PeriodKey::from_datetime(Utc::now()).prefix();
    let expected: Vec<String> = (1..=creators).map(|n| format!("{prefix}{n:04}")).collect();
    assert_eq!(numbers, expected);
    assert_eq!(db.invoices().count().await.unwrap(), creators as i64);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_only_fail_with_conflict() {
    let dir = TempDir::new().unwrap();
    let db = shared_store(&dir).await;
    let service = InvoiceService::new(db.invoices(), db.exhibitors(), InvoiceSettings::default());

    let results = create_concurrently(&service, 16).await;

    let mut numbers = Vec::new();
    for result in results {
        match result {
            Ok(invoice) => numbers.push(invoice.invoice_number),
            Err(ServiceError::Conflict(_)) => {}
            Err(other) => panic!("unexpected error under contention: {other}"),
        }
    }

    assert!(!numbers.is_empty());
    let stored = db.invoices().count().await.unwrap();
    assert_eq!(stored, numbers.len() as i64);

    numbers.sort();
    numbers.dedup();
    assert_eq!(numbers.len() as i64, stored);
}
