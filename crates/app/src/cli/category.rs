use clap::{Args, Subcommand};
use till::catalog::CategoryId;
use till_app::{
    backend::{ListQuery, Order},
    context::AppContext,
    services::models::NewCategory,
};

use super::{PageArgs, output::print_table};

#[derive(Debug, Args)]
pub(crate) struct CategoryCommand {
    #[command(subcommand)]
    command: CategorySubcommand,
}

#[derive(Debug, Subcommand)]
enum CategorySubcommand {
    /// List categories by name
    List(PageArgs),

    /// Create a category
    Create {
        /// Display name
        name: String,
    },

    /// Rename a category
    Update {
        /// Category ID
        id: String,

        /// New display name
        #[arg(long)]
        name: String,
    },

    /// Delete a category
    Delete {
        /// Category ID
        id: String,
    },
}

pub(crate) async fn run(ctx: &AppContext, command: CategoryCommand) -> Result<(), String> {
    match command.command {
        CategorySubcommand::List(args) => {
            let categories = ctx
                .categories
                .list_categories(args.query(Order::asc("name")))
                .await
                .map_err(|error| format!("failed to list categories: {error}"))?;

            print_table(
                ["ID", "Name"],
                categories
                    .into_iter()
                    .map(|category| [category.id.to_string(), category.name])
                    .collect(),
            );
        }
        CategorySubcommand::Create { name } => {
            ctx.categories
                .create_category(NewCategory { name })
                .await
                .map_err(|error| format!("failed to create category: {error}"))?;

            println!("category created");
        }
        CategorySubcommand::Update { id, name } => {
            let id = CategoryId::new(id);

            let mut category = ctx
                .categories
                .list_categories(ListQuery::all(Order::asc("name")))
                .await
                .map_err(|error| format!("failed to load categories: {error}"))?
                .into_iter()
                .find(|category| category.id == id)
                .ok_or_else(|| format!("category {id} not found"))?;

            category.name = name;

            ctx.categories
                .update_category(category)
                .await
                .map_err(|error| format!("failed to update category: {error}"))?;

            println!("category {id} updated");
        }
        CategorySubcommand::Delete { id } => {
            let id = CategoryId::new(id);

            ctx.categories
                .delete_category(id.clone())
                .await
                .map_err(|error| format!("failed to delete category: {error}"))?;

            println!("category {id} deleted");
        }
    }

    Ok(())
}
