use clap::{Args, Subcommand};
use rust_decimal::Decimal;
use till_app::context::AppContext;

use super::output::money;

#[derive(Debug, Args)]
pub(crate) struct TillCommand {
    #[command(subcommand)]
    command: TillSubcommand,
}

#[derive(Debug, Subcommand)]
enum TillSubcommand {
    /// Open the till with an initial cash amount
    Open {
        /// Cash counted into the drawer
        amount: Decimal,
    },

    /// Close the open till
    Close,

    /// Show the logged-in user and till
    Status,
}

pub(crate) fn run(ctx: &AppContext, command: TillCommand) -> Result<(), String> {
    let mut session = ctx
        .session()
        .map_err(|error| format!("failed to load session: {error}"))?;

    match command.command {
        TillSubcommand::Open { amount } => {
            let till = session
                .open_till(amount)
                .map_err(|error| format!("failed to open till: {error}"))?;

            println!("till_id: {}", till.id);
            println!("opened_at: {}", till.start_time);
            println!("initial_amount: {}", money(ctx, till.initial_amount));
        }
        TillSubcommand::Close => {
            let till = session
                .close_till()
                .map_err(|error| format!("failed to close till: {error}"))?;

            println!("closed till {} opened at {}", till.id, till.start_time);
        }
        TillSubcommand::Status => {
            let Some(user) = session.session().user() else {
                println!("nobody is logged in");
                return Ok(());
            };

            println!("user: {} ({:?})", user.username, user.role);

            match session.session().till() {
                Some(till) => {
                    println!("till_id: {}", till.id);
                    println!("opened_at: {}", till.start_time);
                    println!("initial_amount: {}", money(ctx, till.initial_amount));
                }
                None => println!("till: closed"),
            }
        }
    }

    Ok(())
}
