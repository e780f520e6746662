use std::io;

use clap::{Args, Subcommand};
use till::{
    receipt::Receipt,
    sales::{SaleId, SaleRecord},
};
use till_app::{
    backend::{ListQuery, Order},
    context::AppContext,
};

use super::{
    PageArgs,
    output::{money, print_table},
};

#[derive(Debug, Args)]
pub(crate) struct SaleCommand {
    #[command(subcommand)]
    command: SaleSubcommand,
}

#[derive(Debug, Subcommand)]
enum SaleSubcommand {
    /// List sales, newest first
    List(PageArgs),

    /// Print the receipt of a sale
    Receipt {
        /// Sale ID
        id: String,
    },

    /// Cancel a sale and put its items back in stock
    Cancel {
        /// Sale ID
        id: String,
    },
}

pub(crate) async fn run(ctx: &AppContext, command: SaleCommand) -> Result<(), String> {
    match command.command {
        SaleSubcommand::List(args) => list(ctx, &args).await,
        SaleSubcommand::Receipt { id } => receipt(ctx, &SaleId::new(id)).await,
        SaleSubcommand::Cancel { id } => cancel(ctx, &SaleId::new(id)).await,
    }
}

async fn list(ctx: &AppContext, args: &PageArgs) -> Result<(), String> {
    let sales = ctx
        .sales
        .list_sales(args.query(Order::desc("date")))
        .await
        .map_err(|error| format!("failed to list sales: {error}"))?;

    print_table(
        ["ID", "Date", "Items", "Total", "Payment", "Status"],
        sales
            .iter()
            .map(|sale| {
                [
                    sale.id().to_string(),
                    sale.date().to_string(),
                    sale.items().len().to_string(),
                    money(ctx, sale.total()),
                    sale.payment_method().to_string(),
                    if sale.is_cancelled() { "cancelled" } else { "completed" }.to_string(),
                ]
            })
            .collect(),
    );

    Ok(())
}

async fn load_all(ctx: &AppContext) -> Result<Vec<SaleRecord>, String> {
    ctx.sales
        .list_sales(ListQuery::all(Order::desc("date")))
        .await
        .map_err(|error| format!("failed to load sales: {error}"))
}

async fn receipt(ctx: &AppContext, id: &SaleId) -> Result<(), String> {
    let sales = load_all(ctx).await?;

    let sale = sales
        .iter()
        .find(|sale| sale.id() == id)
        .ok_or_else(|| format!("sale {id} not found"))?;

    Receipt::new(sale, ctx.currency)
        .write_to(io::stdout().lock())
        .map_err(|error| format!("failed to print receipt: {error}"))
}

async fn cancel(ctx: &AppContext, id: &SaleId) -> Result<(), String> {
    let mut sales = load_all(ctx).await?;

    let outcome = ctx
        .canceller
        .cancel(&mut sales, id)
        .await
        .map_err(|error| format!("failed to cancel sale: {error}"))?;

    println!("sale {} cancelled", outcome.sale_id);
    println!("products restocked: {}", outcome.restock.updated.len());

    if !outcome.restock.is_complete() {
        println!(
            "products still queued: {} (see `till stock pending`)",
            outcome.restock.failed.len()
        );
    }

    Ok(())
}
