use clap::{Args, Subcommand};
use till_app::context::AppContext;

use super::output::print_table;

#[derive(Debug, Args)]
pub(crate) struct StockCommand {
    #[command(subcommand)]
    command: StockSubcommand,
}

#[derive(Debug, Subcommand)]
enum StockSubcommand {
    /// List stock adjustments the backend has not accepted yet
    Pending,

    /// Apply every queued stock adjustment now
    Retry,
}

pub(crate) async fn run(ctx: &AppContext, command: StockCommand) -> Result<(), String> {
    match command.command {
        StockSubcommand::Pending => pending(ctx),
        StockSubcommand::Retry => retry(ctx).await,
    }
}

fn pending(ctx: &AppContext) -> Result<(), String> {
    let pending = ctx
        .reconciler
        .outbox()
        .pending()
        .map_err(|error| format!("failed to read stock queue: {error}"))?;

    print_table(
        ["Queued", "Sale", "Product", "Variant", "Delta"],
        pending
            .into_iter()
            .map(|entry| {
                [
                    entry.queued_at.to_string(),
                    entry.sale_id.to_string(),
                    entry.adjustment.product_id.to_string(),
                    entry.adjustment.variant_color.unwrap_or_default(),
                    format!("{:+}", entry.adjustment.delta),
                ]
            })
            .collect(),
    );

    Ok(())
}

async fn retry(ctx: &AppContext) -> Result<(), String> {
    let report = ctx
        .reconciler
        .retry_pending()
        .await
        .map_err(|error| format!("failed to read stock queue: {error}"))?;

    println!("updated: {}", report.updated.len());
    println!("failed: {}", report.failed.len());
    println!("discarded: {}", report.discarded);

    if !report.is_complete() {
        return Err("some stock adjustments are still queued".to_string());
    }

    Ok(())
}
