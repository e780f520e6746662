use clap::{Args, Subcommand};
use till::catalog::{BrandId, CategoryId};
use till_app::{
    backend::{ListQuery, Order},
    context::AppContext,
    services::models::NewBrand,
};

use super::{PageArgs, output::print_table};

#[derive(Debug, Args)]
pub(crate) struct BrandCommand {
    #[command(subcommand)]
    command: BrandSubcommand,
}

#[derive(Debug, Subcommand)]
enum BrandSubcommand {
    /// List brands by name
    List {
        #[command(flatten)]
        page: PageArgs,

        /// Only brands in this category
        #[arg(long)]
        category: Option<String>,
    },

    /// Create a brand
    Create {
        /// Display name
        name: String,

        /// Category the brand is listed under
        #[arg(long)]
        category: Option<String>,
    },

    /// Rename or move a brand
    Update {
        /// Brand ID
        id: String,

        /// New display name
        #[arg(long)]
        name: Option<String>,

        /// New category
        #[arg(long)]
        category: Option<String>,
    },

    /// Delete a brand
    Delete {
        /// Brand ID
        id: String,
    },
}

pub(crate) async fn run(ctx: &AppContext, command: BrandCommand) -> Result<(), String> {
    match command.command {
        BrandSubcommand::List { page, category } => {
            let mut query = page.query(Order::asc("name"));

            query.category_id = category.map(CategoryId::new);

            let brands = ctx
                .brands
                .list_brands(query)
                .await
                .map_err(|error| format!("failed to list brands: {error}"))?;

            print_table(
                ["ID", "Name", "Category"],
                brands
                    .into_iter()
                    .map(|brand| {
                        [
                            brand.id.to_string(),
                            brand.name,
                            brand.category_id.map(|id| id.to_string()).unwrap_or_default(),
                        ]
                    })
                    .collect(),
            );
        }
        BrandSubcommand::Create { name, category } => {
            ctx.brands
                .create_brand(NewBrand {
                    name,
                    category_id: category.map(CategoryId::new),
                })
                .await
                .map_err(|error| format!("failed to create brand: {error}"))?;

            println!("brand created");
        }
        BrandSubcommand::Update { id, name, category } => {
            let id = BrandId::new(id);

            let mut brand = ctx
                .brands
                .list_brands(ListQuery::all(Order::asc("name")))
                .await
                .map_err(|error| format!("failed to load brands: {error}"))?
                .into_iter()
                .find(|brand| brand.id == id)
                .ok_or_else(|| format!("brand {id} not found"))?;

            if let Some(name) = name {
                brand.name = name;
            }

            if let Some(category) = category {
                brand.category_id = Some(CategoryId::new(category));
            }

            ctx.brands
                .update_brand(brand)
                .await
                .map_err(|error| format!("failed to update brand: {error}"))?;

            println!("brand {id} updated");
        }
        BrandSubcommand::Delete { id } => {
            let id = BrandId::new(id);

            ctx.brands
                .delete_brand(id.clone())
                .await
                .map_err(|error| format!("failed to delete brand: {error}"))?;

            println!("brand {id} deleted");
        }
    }

    Ok(())
}
