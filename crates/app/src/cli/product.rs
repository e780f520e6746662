use clap::{Args, Subcommand};
use rust_decimal::Decimal;
use till::catalog::{BrandId, CategoryId, ProductId, Variant};
use till_app::{backend::Order, context::AppContext, services::models::NewProduct};

use super::{
    PageArgs,
    catalog::variants,
    output::{money, print_table},
};

#[derive(Debug, Args)]
pub(crate) struct ProductCommand {
    #[command(subcommand)]
    command: ProductSubcommand,
}

#[derive(Debug, Subcommand)]
enum ProductSubcommand {
    /// List products by name
    List {
        #[command(flatten)]
        page: PageArgs,

        /// Only products in this category
        #[arg(long)]
        category: Option<String>,

        /// Only products of this brand
        #[arg(long)]
        brand: Option<String>,
    },

    /// Show one product with live stock
    Show {
        /// Product ID
        id: String,
    },

    /// Create a product
    Create(CreateProductArgs),

    /// Change a product's name, price or base stock
    Update {
        /// Product ID
        id: String,

        /// New display name
        #[arg(long)]
        name: Option<String>,

        /// New unit price
        #[arg(long)]
        price: Option<Decimal>,

        /// New base stock
        #[arg(long)]
        stock: Option<i64>,
    },

    /// Delete a product
    Delete {
        /// Product ID
        id: String,
    },
}

#[derive(Debug, Args)]
struct CreateProductArgs {
    /// Display name
    name: String,

    /// Unit price
    #[arg(long)]
    price: Decimal,

    /// Base stock
    #[arg(long, default_value_t = 0)]
    stock: i64,

    /// Free-text description
    #[arg(long)]
    description: Option<String>,

    /// Owning category
    #[arg(long)]
    category: Option<String>,

    /// Owning brand
    #[arg(long)]
    brand: Option<String>,

    /// Barcode
    #[arg(long)]
    barcode: Option<String>,

    /// Variant as `color=stock`; repeat for several
    #[arg(long = "variant", value_parser = parse_variant)]
    variants: Vec<Variant>,
}

pub(crate) async fn run(ctx: &AppContext, command: ProductCommand) -> Result<(), String> {
    match command.command {
        ProductSubcommand::List {
            page,
            category,
            brand,
        } => {
            let mut query = page.query(Order::asc("name"));

            query.category_id = category.map(CategoryId::new);
            query.brand_id = brand.map(BrandId::new);

            let products = ctx
                .products
                .list_products(query)
                .await
                .map_err(|error| format!("failed to list products: {error}"))?;

            print_table(
                ["ID", "Name", "Price", "Stock", "Variants"],
                products
                    .iter()
                    .map(|product| {
                        [
                            product.id.to_string(),
                            product.name.clone(),
                            money(ctx, product.price),
                            product.stock.to_string(),
                            variants(product),
                        ]
                    })
                    .collect(),
            );
        }
        ProductSubcommand::Show { id } => {
            let product = ctx
                .products
                .get_product(ProductId::new(id))
                .await
                .map_err(|error| format!("failed to load product: {error}"))?;

            println!("id: {}", product.id);
            println!("name: {}", product.name);
            println!("price: {}", money(ctx, product.price));
            println!("stock: {}", product.stock);

            for variant in &product.variants {
                println!("variant: {} ({} in stock)", variant.color, variant.stock);
            }
        }
        ProductSubcommand::Create(args) => {
            ctx.products
                .create_product(NewProduct {
                    name: args.name,
                    description: args.description,
                    price: args.price,
                    stock: args.stock,
                    category_id: args.category.map(CategoryId::new),
                    brand_id: args.brand.map(BrandId::new),
                    barcode: args.barcode,
                    variants: args.variants,
                })
                .await
                .map_err(|error| format!("failed to create product: {error}"))?;

            println!("product created");
        }
        ProductSubcommand::Update {
            id,
            name,
            price,
            stock,
        } => {
            let mut product = ctx
                .products
                .get_product(ProductId::new(id))
                .await
                .map_err(|error| format!("failed to load product: {error}"))?;

            if let Some(name) = name {
                product.name = name;
            }

            if let Some(price) = price {
                product.price = price;
            }

            if let Some(stock) = stock {
                product.stock = stock;
            }

            let id = product.id.clone();

            ctx.products
                .update_product(product)
                .await
                .map_err(|error| format!("failed to update product: {error}"))?;

            println!("product {id} updated");
        }
        ProductSubcommand::Delete { id } => {
            let id = ProductId::new(id);

            ctx.products
                .delete_product(id.clone())
                .await
                .map_err(|error| format!("failed to delete product: {error}"))?;

            println!("product {id} deleted");
        }
    }

    Ok(())
}

fn parse_variant(raw: &str) -> Result<Variant, String> {
    let (color, stock) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected color=stock, got {raw:?}"))?;

    let stock = stock
        .trim()
        .parse::<i64>()
        .map_err(|error| format!("invalid variant stock {stock:?}: {error}"))?;

    Ok(Variant {
        color: color.trim().to_string(),
        stock,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_flag_parses_color_and_stock() {
        assert_eq!(
            parse_variant("red = 4"),
            Ok(Variant {
                color: "red".to_string(),
                stock: 4,
            })
        );
        assert!(parse_variant("red").is_err());
        assert!(parse_variant("red=lots").is_err());
    }
}
