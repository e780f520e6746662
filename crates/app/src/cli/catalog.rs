use clap::{Args, Subcommand, ValueEnum};
use till::catalog::Product;
use till_app::{catalog::CatalogError, context::AppContext, storage::keys};

use super::output::{money, print_table};

#[derive(Debug, Args)]
pub(crate) struct CatalogCommand {
    #[command(subcommand)]
    command: CatalogSubcommand,
}

#[derive(Debug, Subcommand)]
enum CatalogSubcommand {
    /// Show the cached catalog, fetching any list not cached yet
    List {
        /// List to show
        #[arg(value_enum)]
        list: CatalogList,
    },

    /// Fetch and cache every list that is not cached yet
    Prefetch,

    /// Drop cached lists so the next read fetches them again
    Invalidate {
        /// List to drop; every list when omitted
        #[arg(value_enum)]
        list: Option<CatalogList>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CatalogList {
    Categories,
    Brands,
    Products,
}

impl CatalogList {
    fn key(self) -> &'static str {
        match self {
            CatalogList::Categories => keys::PREFETCH_CATEGORIES,
            CatalogList::Brands => keys::PREFETCH_BRANDS,
            CatalogList::Products => keys::PREFETCH_PRODUCTS,
        }
    }
}

pub(crate) async fn run(ctx: &AppContext, command: CatalogCommand) -> Result<(), String> {
    match command.command {
        CatalogSubcommand::List { list } => show(ctx, list).await,
        CatalogSubcommand::Prefetch => {
            let snapshot = ctx.catalog.snapshot().await;

            println!("categories: {}", snapshot.categories.len());
            println!("brands: {}", snapshot.brands.len());
            println!("products: {}", snapshot.products.len());

            Ok(())
        }
        CatalogSubcommand::Invalidate { list } => {
            match list {
                Some(list) => ctx.catalog.invalidate(list.key()),
                None => ctx.catalog.invalidate_all(),
            }
            .map_err(|error| format!("failed to invalidate cache: {error}"))?;

            println!("catalog cache cleared");

            Ok(())
        }
    }
}

async fn show(ctx: &AppContext, list: CatalogList) -> Result<(), String> {
    let failed = |error: CatalogError| format!("failed to load catalog: {error}");

    match list {
        CatalogList::Categories => print_table(
            ["ID", "Name"],
            ctx.catalog
                .categories()
                .await
                .map_err(failed)?
                .into_iter()
                .map(|category| [category.id.to_string(), category.name])
                .collect(),
        ),
        CatalogList::Brands => print_table(
            ["ID", "Name", "Category"],
            ctx.catalog
                .brands()
                .await
                .map_err(failed)?
                .into_iter()
                .map(|brand| {
                    [
                        brand.id.to_string(),
                        brand.name,
                        brand.category_id.map(|id| id.to_string()).unwrap_or_default(),
                    ]
                })
                .collect(),
        ),
        CatalogList::Products => print_table(
            ["ID", "Name", "Price", "Stock", "Variants"],
            ctx.catalog
                .products()
                .await
                .map_err(failed)?
                .into_iter()
                .map(|product| {
                    [
                        product.id.to_string(),
                        product.name.clone(),
                        money(ctx, product.price),
                        product.stock.to_string(),
                        variants(&product),
                    ]
                })
                .collect(),
        ),
    }

    Ok(())
}

pub(crate) fn variants(product: &Product) -> String {
    product
        .variants
        .iter()
        .map(|variant| format!("{} ({})", variant.color, variant.stock))
        .collect::<Vec<_>>()
        .join(", ")
}
