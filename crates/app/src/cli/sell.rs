use std::io::{self, Write};

use rust_decimal::Decimal;
use till::{
    browse::{self, Page},
    cart::{AddOutcome, Cart},
    catalog::{BrandId, CategoryId, ProductId},
    sales::PaymentMethod,
};
use till_app::{catalog::CatalogSnapshot, context::AppContext, session::SessionManager};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use super::output::{money, print_table};

const HELP: &str = "\
commands:
  cats [page]                 list categories
  brands <cat#> [page]        list brands of a listed category
  products <brand#> [page]    list in-stock products of a listed brand
  add <product#> [color]      add a listed product to the cart
  cart                        show the cart
  qty <line#> <n>             set a line's quantity
  rm <line#>                  remove a line
  up <line#> | down <line#>   round a line's price up or down
  reset <line#>               restore a line's catalog price
  pay <method> [amount]       check out (efectivo, debito, credito, transferencia, qr)
  clear                       empty the cart
  refresh                     reload the catalog from the backend
  quit                        leave the shell";

#[derive(Debug, Clone, PartialEq, Eq)]
enum ShellCommand {
    Help,
    Categories { page: usize },
    Brands { category: usize, page: usize },
    Products { brand: usize, page: usize },
    Add { product: usize, color: Option<String> },
    Cart,
    Quantity { line: usize, quantity: u32 },
    Remove { line: usize },
    RoundUp { line: usize },
    RoundDown { line: usize },
    Reset { line: usize },
    Pay { method: PaymentMethod, amount: Decimal },
    Clear,
    Refresh,
    Quit,
}

/// Parse one shell line. Blank lines parse to `None`. Listed entries and
/// cart lines are numbered from 1; pages from 0.
fn parse(line: &str) -> Result<Option<ShellCommand>, String> {
    let mut words = line.split_whitespace();

    let Some(verb) = words.next() else {
        return Ok(None);
    };

    let args: Vec<&str> = words.collect();

    let command = match (verb, args.as_slice()) {
        ("help" | "?", []) => ShellCommand::Help,
        ("cats", rest) => ShellCommand::Categories {
            page: page_arg(rest.first())?,
        },
        ("brands", [category, rest @ ..]) => ShellCommand::Brands {
            category: position(category)?,
            page: page_arg(rest.first())?,
        },
        ("products", [brand, rest @ ..]) => ShellCommand::Products {
            brand: position(brand)?,
            page: page_arg(rest.first())?,
        },
        ("add", [product]) => ShellCommand::Add {
            product: position(product)?,
            color: None,
        },
        ("add", [product, color]) => ShellCommand::Add {
            product: position(product)?,
            color: Some((*color).to_string()),
        },
        ("cart", []) => ShellCommand::Cart,
        ("qty", [line, quantity]) => ShellCommand::Quantity {
            line: position(line)?,
            quantity: quantity_arg(quantity),
        },
        ("rm", [line]) => ShellCommand::Remove {
            line: position(line)?,
        },
        ("up", [line]) => ShellCommand::RoundUp {
            line: position(line)?,
        },
        ("down", [line]) => ShellCommand::RoundDown {
            line: position(line)?,
        },
        ("reset", [line]) => ShellCommand::Reset {
            line: position(line)?,
        },
        ("pay", [method, rest @ ..]) => ShellCommand::Pay {
            method: method.parse().map_err(|error| format!("{error}"))?,
            amount: match rest {
                [] => Decimal::ZERO,
                [amount] => amount
                    .parse()
                    .map_err(|_parse| format!("invalid amount: {amount}"))?,
                _ => return Err("usage: pay <method> [amount]".to_string()),
            },
        },
        ("clear", []) => ShellCommand::Clear,
        ("refresh", []) => ShellCommand::Refresh,
        ("quit" | "exit", []) => ShellCommand::Quit,
        _ => return Err(format!("unrecognised command: {}", line.trim())),
    };

    Ok(Some(command))
}

/// 1-based position to 0-based index.
fn position(raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n - 1),
        _ => Err(format!("expected a number from 1, got {raw}")),
    }
}

/// Quantities below 1, and input that is not a number, become 1.
fn quantity_arg(raw: &str) -> u32 {
    raw.parse::<i64>()
        .map_or(1, |n| u32::try_from(n.max(1)).unwrap_or(u32::MAX))
}

fn page_arg(raw: Option<&&str>) -> Result<usize, String> {
    raw.map_or(Ok(0), |raw| {
        raw.parse()
            .map_err(|_parse| format!("invalid page: {raw}"))
    })
}

/// Ids of the entries most recently listed, so commands can refer to them by
/// position.
#[derive(Debug, Default)]
struct Listed {
    categories: Vec<CategoryId>,
    brands: Vec<BrandId>,
    products: Vec<ProductId>,
}

struct Shell<'a> {
    ctx: &'a AppContext,
    session: SessionManager,
    cart: Cart,
    catalog: CatalogSnapshot,
    listed: Listed,
}

pub(crate) async fn run(ctx: &AppContext) -> Result<(), String> {
    let session = ctx
        .session()
        .map_err(|error| format!("failed to load session: {error}"))?;

    {
        let (user, till) = session
            .session()
            .require_till()
            .map_err(|error| format!("cannot sell: {error}"))?;

        println!("selling as {} on till {}", user.username, till.id);
    }

    let mut shell = Shell {
        ctx,
        session,
        cart: Cart::new(),
        catalog: ctx.catalog.snapshot().await,
        listed: Listed::default(),
    };

    println!("type `help` for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    prompt();

    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|error| format!("failed to read input: {error}"))?
    {
        match parse(&line) {
            Ok(None) => {}
            Ok(Some(ShellCommand::Quit)) => break,
            Ok(Some(command)) => {
                if let Err(message) = shell.execute(command).await {
                    println!("{message}");
                }
            }
            Err(message) => println!("{message}"),
        }

        prompt();
    }

    if !shell.cart.is_empty() {
        println!("discarding cart with {} line(s)", shell.cart.len());
    }

    Ok(())
}

fn prompt() {
    print!("till> ");

    if let Err(error) = io::stdout().flush() {
        warn!(%error, "failed to flush prompt");
    }
}

impl Shell<'_> {
    async fn execute(&mut self, command: ShellCommand) -> Result<(), String> {
        match command {
            ShellCommand::Help => println!("{HELP}"),
            ShellCommand::Categories { page } => self.list_categories(page),
            ShellCommand::Brands { category, page } => self.list_brands(category, page)?,
            ShellCommand::Products { brand, page } => self.list_products(brand, page)?,
            ShellCommand::Add { product, color } => self.add(product, color.as_deref())?,
            ShellCommand::Cart => self.show_cart(),
            ShellCommand::Quantity { line, quantity } => {
                let quantity = self
                    .cart
                    .set_quantity(line, quantity)
                    .map_err(|error| error.to_string())?;

                println!("quantity set to {quantity}");
                self.show_cart();
            }
            ShellCommand::Remove { line } => {
                let removed = self
                    .cart
                    .remove_item(line)
                    .map_err(|error| error.to_string())?;

                println!("removed {}", removed.label());
                self.show_cart();
            }
            ShellCommand::RoundUp { line } => {
                let price = self.cart.round_up(line).map_err(|error| error.to_string())?;

                self.price_changed(price);
            }
            ShellCommand::RoundDown { line } => {
                let price = self
                    .cart
                    .round_down(line)
                    .map_err(|error| error.to_string())?;

                self.price_changed(price);
            }
            ShellCommand::Reset { line } => {
                let price = self
                    .cart
                    .reset_price(line)
                    .map_err(|error| error.to_string())?;

                self.price_changed(price);
            }
            ShellCommand::Pay { method, amount } => self.pay(method, amount).await?,
            ShellCommand::Clear => {
                self.cart.clear();
                println!("cart cleared");
            }
            ShellCommand::Refresh => {
                self.ctx
                    .catalog
                    .invalidate_all()
                    .map_err(|error| format!("failed to clear catalog cache: {error}"))?;

                self.catalog = self.ctx.catalog.snapshot().await;
                self.listed = Listed::default();

                println!(
                    "catalog reloaded: {} categories, {} brands, {} products",
                    self.catalog.categories.len(),
                    self.catalog.brands.len(),
                    self.catalog.products.len()
                );
            }
            ShellCommand::Quit => {}
        }

        Ok(())
    }

    fn list_categories(&mut self, page: usize) {
        let page = browse::categories(&self.catalog.categories, page);

        self.listed.categories = page.items().iter().map(|c| c.id.clone()).collect();

        print_table(
            ["#", "Category"],
            numbered(&page, |category| category.name.clone()),
        );
        page_footer(&page);
    }

    fn list_brands(&mut self, category: usize, page: usize) -> Result<(), String> {
        let category = self
            .listed
            .categories
            .get(category)
            .ok_or("list categories with `cats` first")?;

        let page = browse::brands(&self.catalog.brands, category, page);

        self.listed.brands = page.items().iter().map(|b| b.id.clone()).collect();

        print_table(["#", "Brand"], numbered(&page, |brand| brand.name.clone()));
        page_footer(&page);

        Ok(())
    }

    fn list_products(&mut self, brand: usize, page: usize) -> Result<(), String> {
        let brand = self
            .listed
            .brands
            .get(brand)
            .ok_or("list brands with `brands` first")?;

        let page = browse::products(&self.catalog.products, brand, page);

        self.listed.products = page.items().iter().map(|p| p.id.clone()).collect();

        let ctx = self.ctx;

        print_table(
            ["#", "Product", "Price", "Stock"],
            page.items()
                .iter()
                .enumerate()
                .map(|(index, product)| {
                    [
                        (index + 1).to_string(),
                        product.name.clone(),
                        money(ctx, product.price),
                        product.stock.to_string(),
                    ]
                })
                .collect(),
        );
        page_footer(&page);

        Ok(())
    }

    fn add(&mut self, product: usize, color: Option<&str>) -> Result<(), String> {
        let id = self
            .listed
            .products
            .get(product)
            .ok_or("list products with `products` first")?;

        let product = self
            .catalog
            .products
            .iter()
            .find(|product| &product.id == id)
            .ok_or_else(|| format!("product {id} is no longer cached"))?;

        match self
            .cart
            .add_item(product, color)
            .map_err(|error| error.to_string())?
        {
            AddOutcome::Added { index } => println!("added line {}", index + 1),
            AddOutcome::Merged { index, quantity } => {
                println!("line {} now has {quantity}", index + 1);
            }
        }

        self.show_cart();

        Ok(())
    }

    fn show_cart(&self) {
        let ctx = self.ctx;

        print_table(
            ["#", "Item", "Qty", "Unit Price", "Subtotal"],
            self.cart
                .lines()
                .iter()
                .enumerate()
                .map(|(index, line)| {
                    [
                        (index + 1).to_string(),
                        line.label(),
                        line.quantity().to_string(),
                        money(ctx, line.price()),
                        money(ctx, line.subtotal()),
                    ]
                })
                .collect(),
        );

        println!("total: {}", money(ctx, self.cart.total()));
    }

    fn price_changed(&self, price: Decimal) {
        println!("price now {}", money(self.ctx, price));
        self.show_cart();
    }

    async fn pay(&mut self, method: PaymentMethod, amount: Decimal) -> Result<(), String> {
        let outcome = self
            .ctx
            .checkout
            .finalize(self.session.session(), &mut self.cart, method, amount)
            .await
            .map_err(|error| format!("checkout failed: {error}"))?;

        let sale = &outcome.sale;

        println!("sale {} committed", sale.id());
        println!("total: {}", money(self.ctx, sale.total()));
        println!("received: {}", money(self.ctx, sale.amount_paid()));
        println!("change: {}", money(self.ctx, sale.change()));

        match &outcome.receipt {
            Ok(path) => println!("receipt: {}", path.display()),
            Err(error) => println!("receipt could not be written: {error}"),
        }

        Ok(())
    }
}

fn numbered<T>(page: &Page<'_, T>, name: impl Fn(&T) -> String) -> Vec<[String; 2]> {
    page.items()
        .iter()
        .enumerate()
        .map(|(index, item)| [(index + 1).to_string(), name(*item)])
        .collect()
}

fn page_footer<T>(page: &Page<'_, T>) {
    if page.has_next() {
        println!("page {} (more on page {})", page.number(), page.number() + 1);
    } else {
        println!("page {}", page.number());
    }
}
