//! # Expo Admin
//!
//! Operator tool for the back office database.
//!
//! ## Usage
//! ```bash
//! # Seed exhibitors, invoices and default rates
//! cargo run -p expo-service --bin expo-admin -- seed
//!
//! # Invoice statistics as of now
//! cargo run -p expo-service --bin expo-admin -- stats
//!
//! # Current service rates
//! cargo run -p expo-service --bin expo-admin -- rates
//!
//! # Render an invoice to a file (defaults to <invoiceNumber>.pdf)
//! cargo run -p expo-service --bin expo-admin -- render <invoice-id> [out.pdf]
//!
//! # Record a payment
//! cargo run -p expo-service --bin expo-admin -- mark-paid <invoice-id> [payment-id]
//! ```
//!
//! Configuration comes from the `EXPO_*` environment variables
//! (see `ServiceConfig`).

use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::{Duration, Utc};
use tracing::info;
use uuid::Uuid;

use expo_core::{Exhibitor, InvoiceItem, Money, NewInvoice};
use expo_service::telemetry::init_tracing;
use expo_service::{BackOffice, ServiceConfig};

/// Exhibitors created by `seed`: company, contact, email, phone.
const EXHIBITORS: &[(&str, &str, Option<&str>, Option<&str>)] = &[
    ("Acme Stands", "Asha Rao", Some("billing@acmestands.example"), Some("+91 98100 00001")),
    ("Globex Pavilions", "Rahul Mehta", Some("accounts@globex.example"), None),
    ("Initech Displays", "Meera Iyer", None, Some("+91 98100 00003")),
];

/// Invoice lines created by `seed`: description, quantity, unit amount (major units).
const BOOTH_LINES: &[(&str, i64, i64)] = &[
    ("Booth space (9 sqm)", 1, 45_000),
    ("Corner premium", 1, 5_000),
    ("Additional power socket", 2, 750),
];

fn print_help() {
    println!("Expo Back Office Admin");
    println!();
    println!("Usage: expo-admin <COMMAND>");
    println!();
    println!("Commands:");
    println!("  seed                              Create sample exhibitors, invoices and rates");
    println!("  stats                             Show invoice statistics");
    println!("  rates                             Show current service rates");
    println!("  render <invoice-id> [out.pdf]     Render an invoice to PDF");
    println!("  mark-paid <invoice-id> [payment]  Mark an invoice as paid");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(command) = args.first().map(String::as_str) else {
        print_help();
        return Ok(());
    };
    if matches!(command, "--help" | "-h" | "help") {
        print_help();
        return Ok(());
    }

    let config = ServiceConfig::from_env().context("loading configuration")?;
    info!(path = %config.database_path.display(), "Opening back office database");
    let office = BackOffice::connect(&config)
        .await
        .context("connecting to database")?;

    match command {
        "seed" => seed(&office, &config.currency).await?,
        "stats" => stats(&office, &config.currency).await?,
        "rates" => rates(&office, &config.currency).await?,
        "render" => {
            let id = args.get(1).context("render needs an invoice id")?;
            let out = args.get(2).map(PathBuf::from);
            render(&office, id, out).await?;
        }
        "mark-paid" => {
            let id = args.get(1).context("mark-paid needs an invoice id")?;
            let payment_id = args.get(2).cloned();
            mark_paid(&office, id, payment_id).await?;
        }
        other => {
            print_help();
            bail!("unknown command '{}'", other);
        }
    }

    office.database().close().await;
    Ok(())
}

async fn seed(office: &BackOffice, currency: &str) -> anyhow::Result<()> {
    let existing = office.database().invoices().count().await?;
    if existing > 0 {
        println!("Database already has {} invoices, skipping seed.", existing);
        return Ok(());
    }

    let now = Utc::now();
    let rates = office.rates().list_configs().await?;
    println!("Rates ready for {} domains", rates.len());

    for (index, (company, contact, email, phone)) in EXHIBITORS.iter().enumerate() {
        let exhibitor = office
            .database()
            .exhibitors()
            .insert(&Exhibitor {
                id: Uuid::new_v4().to_string(),
                company: company.to_string(),
                contact_name: contact.to_string(),
                email: email.map(str::to_string),
                phone: phone.map(str::to_string),
                created_at: now,
            })
            .await?;

        let items: Vec<InvoiceItem> = BOOTH_LINES
            .iter()
            .map(|(description, quantity, unit)| {
                InvoiceItem::new(*description, *quantity, Money::from_major(*unit).cents())
            })
            .collect();
        let amount_cents = items
            .iter()
            .filter_map(InvoiceItem::line_amount)
            .sum::<Money>()
            .cents();

        // Spread due dates so one invoice is already overdue.
        let due_date = now + Duration::days(15 * index as i64 - 10);

        let invoice = office
            .invoices()
            .create(NewInvoice {
                company: exhibitor.company.clone(),
                exhibitor_id: Some(exhibitor.id.clone()),
                issue_date: None,
                due_date,
                amount_cents,
                items,
                notes: Some("Payable by bank transfer or UPI.".to_string()),
                status: None,
            })
            .await?;

        println!(
            "  {}  {:<20} {}",
            invoice.invoice_number,
            invoice.company,
            invoice.amount().format_with(currency)
        );
    }

    println!("Seed complete.");
    Ok(())
}

async fn stats(office: &BackOffice, currency: &str) -> anyhow::Result<()> {
    let stats = office.invoices().stats(Utc::now()).await?;

    for (label, total) in [
        ("pending", stats.pending),
        ("paid", stats.paid),
        ("cancelled", stats.cancelled),
        ("overdue", stats.overdue),
        ("total", stats.total),
    ] {
        println!(
            "{:<10} {:>5}  {}",
            label,
            total.count,
            Money::from_cents(total.total_cents).format_with(currency)
        );
    }
    Ok(())
}

async fn rates(office: &BackOffice, currency: &str) -> anyhow::Result<()> {
    for config in office.rates().list_configs().await? {
        let shift = config
            .shift_hours
            .map(|h| format!("{} h", h))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<18} {:>14} per {:<11} shift {}",
            config.domain.as_str(),
            config.rate().format_with(currency),
            config.domain.unit_label(),
            shift
        );
    }
    Ok(())
}

async fn render(office: &BackOffice, id: &str, out: Option<PathBuf>) -> anyhow::Result<()> {
    let attachment = match office.invoice_pdf(id).await {
        Ok(attachment) => attachment,
        Err(reply) => bail!(
            "render failed ({}): {}",
            reply.status,
            reply.body.message.unwrap_or_default()
        ),
    };

    let path = out.unwrap_or_else(|| PathBuf::from(&attachment.filename));
    std::fs::write(&path, &attachment.bytes).with_context(|| format!("writing {}", path.display()))?;

    println!("Wrote {} ({} bytes)", path.display(), attachment.bytes.len());
    Ok(())
}

async fn mark_paid(office: &BackOffice, id: &str, payment_id: Option<String>) -> anyhow::Result<()> {
    let invoice = office.invoices().mark_paid(id, payment_id).await?;
    println!(
        "{} is {} (paid {})",
        invoice.invoice_number,
        invoice.status,
        invoice
            .paid_date
            .map(|d| d.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_default()
    );
    Ok(())
}
