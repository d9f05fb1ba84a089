//! erp-console entry point.

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use console_core::config::get_configuration;
use console_core::numeric::to_display;
use console_core::observability::init_tracing;
use console_core::RecordId;
use erp_console::models::{Invoice, InvoiceStatus};
use erp_console::services::{audit_invoice, calculate_totals, line_breakdown, Adjustments};
use erp_console::{ConsoleState, SERVICE_NAME};
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "erp-console", version, about = "Browse and check ERP invoices")]
struct Cli {
    /// Directory holding base.yaml
    #[arg(long, default_value = "config")]
    config_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List one page of invoices
    Invoices {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        search: Option<String>,
        /// Draft, Sent, Paid, Overdue, Voided or Partial
        #[arg(long)]
        status: Option<InvoiceStatus>,
    },
    /// Show one invoice with recomputed totals
    Show { id: String },
    /// Check one page of invoices for inconsistent totals
    Audit {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = get_configuration(&cli.config_dir).context("Failed to load configuration")?;
    init_tracing(SERVICE_NAME, &settings.logging).context("Failed to initialise tracing")?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        base_url = %settings.api.base_url,
        "Starting erp-console"
    );

    let state = ConsoleState::from_settings(&settings)?;
    let today = Local::now().date_naive();

    match cli.command {
        Commands::Invoices {
            page,
            search,
            status,
        } => list_invoices(&state, page, search, status, today).await?,
        Commands::Show { id } => show_invoice(&state, id, today).await?,
        Commands::Audit { page } => audit_page(&state, page).await?,
    }

    Ok(())
}

async fn list_invoices(
    state: &ConsoleState,
    page: u32,
    search: Option<String>,
    status: Option<InvoiceStatus>,
    today: NaiveDate,
) -> anyhow::Result<()> {
    let invoices = &state.invoices;
    // Search and filter changes fetch page 1 themselves.
    let mut fetched = false;
    if let Some(term) = search {
        invoices.set_search(term).await?;
        fetched = true;
    }
    if let Some(status) = status {
        invoices.set_status_filter(Some(status)).await?;
        fetched = true;
    }
    if page > 1 || !fetched {
        invoices.fetch_page(page).await?;
    }

    let info = invoices.page_info();
    println!(
        "Page {}/{} ({} invoices)",
        info.page, info.total_pages, info.total_items
    );
    for invoice in invoices.visible() {
        print_row(&invoice, today);
    }

    let summary = invoices.summary(today);
    println!(
        "Total {}  Paid {}  Outstanding {}  Overdue {}",
        to_display(summary.total_amount),
        to_display(summary.paid_amount),
        to_display(summary.outstanding),
        summary.overdue
    );
    Ok(())
}

fn print_row(invoice: &Invoice, today: NaiveDate) {
    let balance = invoice.balance();
    println!(
        "{:<8} {:<14} {:<24} {:<8} total {:>12} balance {:>12}",
        invoice.id.as_ref().map(RecordId::as_key).unwrap_or_default(),
        invoice.invoice_number.as_deref().unwrap_or("-"),
        invoice.client_label().unwrap_or("-"),
        invoice.display_status(today).as_str(),
        to_display(balance.total),
        to_display(balance.balance),
    );
}

async fn show_invoice(state: &ConsoleState, id: String, today: NaiveDate) -> anyhow::Result<()> {
    let id = match id.parse::<i64>() {
        Ok(n) => RecordId::Int(n),
        Err(_) => RecordId::Text(id),
    };
    let invoice = state.invoices.load(&id).await?;
    print_row(&invoice, today);

    for item in invoice.line_items() {
        let line = line_breakdown(&item.to_input());
        println!(
            "  {:<30} {:>8} x {:>10}  discount {:>10}  tax {:>10}  line {:>12}",
            item.description.as_deref().unwrap_or("-"),
            item.quantity,
            to_display(item.unit_price),
            to_display(line.discount),
            to_display(line.tax),
            to_display(line.line_total()),
        );
    }

    let totals = calculate_totals(
        &invoice.line_inputs(),
        &Adjustments {
            invoice_discount_amount: Decimal::ZERO,
            shipping_amount: invoice.shipping_amount,
        },
    )
    .rounded();
    println!(
        "Recomputed: subtotal {}  discount {}  tax {}  grand total {}",
        totals.subtotal, totals.total_discount, totals.total_tax, totals.grand_total
    );
    println!(
        "Server:     subtotal {}  discount {}  tax {}  total {}  paid {}",
        to_display(invoice.subtotal()),
        to_display(invoice.discount_amount),
        to_display(invoice.tax_amount),
        to_display(invoice.total_amount),
        to_display(invoice.paid_amount),
    );
    Ok(())
}

async fn audit_page(state: &ConsoleState, page: u32) -> anyhow::Result<()> {
    state.invoices.fetch_page(page).await?;

    let mut flagged = 0usize;
    for invoice in state.invoices.snapshot().collection.items {
        let audit = audit_invoice(&invoice);
        if audit.is_clean() {
            continue;
        }
        flagged += 1;
        println!(
            "{}:",
            audit.invoice_number.as_deref().unwrap_or("(no number)")
        );
        for finding in &audit.findings {
            println!("  {finding}");
        }
    }

    println!("{flagged} invoice(s) with findings on page {page}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_status_is_rejected_at_parse_time() {
        let err = Cli::try_parse_from(["erp-console", "invoices", "--status", "bogus"])
            .err()
            .map(|e| e.kind());
        assert_eq!(err, Some(clap::error::ErrorKind::ValueValidation));

        let cli = Cli::try_parse_from(["erp-console", "invoices", "--status", "partially paid"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Invoices {
                status: Some(InvoiceStatus::Partial),
                ..
            })
        ));
    }
}
