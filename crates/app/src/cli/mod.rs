use clap::{Args, Parser, Subcommand};
use till_app::{
    backend::{ListQuery, Order},
    config::TillConfig,
    context::AppContext,
};

mod brand;
mod catalog;
mod category;
mod drawer;
mod output;
mod product;
mod sale;
mod sell;
mod session;
mod stock;
mod user;

#[derive(Debug, Parser)]
#[command(name = "till", about = "Point-of-sale checkout client", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) config: TillConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Log in with a backend user
    Login(session::LoginArgs),

    /// Log out; a cashier must close their till first
    Logout,

    /// Open, close or inspect the till
    Till(drawer::TillCommand),

    /// Start the interactive sale shell
    Sell,

    /// List or cancel sales
    Sale(sale::SaleCommand),

    /// Inspect or retry queued stock adjustments
    Stock(stock::StockCommand),

    /// Manage the local catalog cache
    Catalog(catalog::CatalogCommand),

    /// Manage products
    Product(product::ProductCommand),

    /// Manage categories
    Category(category::CategoryCommand),

    /// Manage brands
    Brand(brand::BrandCommand),

    /// Manage users
    User(user::UserCommand),
}

/// Pagination and search flags shared by list commands.
#[derive(Debug, Clone, Args)]
pub(crate) struct PageArgs {
    /// Zero-based page number
    #[arg(long, default_value_t = 0)]
    page: u32,

    /// Records per page
    #[arg(long, default_value_t = 20)]
    size: u32,

    /// Free-text search
    #[arg(long)]
    search: Option<String>,
}

impl PageArgs {
    pub(crate) fn query(&self, order: Order) -> ListQuery {
        let query = ListQuery::new(self.size, order).page(self.page, self.size);

        match &self.search {
            Some(term) => query.search(term.clone()),
            None => query,
        }
    }
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        let ctx = AppContext::init(&self.config)
            .map_err(|error| format!("failed to start: {}", output::error_chain(&error)))?;

        let result = match self.command {
            Commands::Login(args) => session::login(&ctx, args).await,
            Commands::Logout => session::logout(&ctx),
            Commands::Till(command) => drawer::run(&ctx, command),
            Commands::Sell => sell::run(&ctx).await,
            Commands::Sale(command) => sale::run(&ctx, command).await,
            Commands::Stock(command) => stock::run(&ctx, command).await,
            Commands::Catalog(command) => catalog::run(&ctx, command).await,
            Commands::Product(command) => product::run(&ctx, command).await,
            Commands::Category(command) => category::run(&ctx, command).await,
            Commands::Brand(command) => brand::run(&ctx, command).await,
            Commands::User(command) => user::run(&ctx, command).await,
        };

        ctx.shutdown().await;

        result
    }
}
