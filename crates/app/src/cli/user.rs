use clap::{Args, Subcommand, ValueEnum};
use till::catalog::{Role, UserId};
use till_app::{backend::Order, context::AppContext, services::models::NewUser};
use zeroize::Zeroizing;

use super::{PageArgs, output::print_table};

#[derive(Debug, Args)]
pub(crate) struct UserCommand {
    #[command(subcommand)]
    command: UserSubcommand,
}

#[derive(Debug, Subcommand)]
enum UserSubcommand {
    /// List users by username
    List(PageArgs),

    /// Create a user
    Create {
        /// Login name
        username: String,

        /// Initial password
        #[arg(long, env = "TILL_NEW_USER_PASSWORD", hide_env_values = true)]
        password: String,

        /// Role
        #[arg(long, value_enum, default_value_t = RoleArg::Cashier)]
        role: RoleArg,
    },

    /// Delete a user
    Delete {
        /// User ID
        id: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RoleArg {
    Admin,
    Cashier,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Admin => Role::Admin,
            RoleArg::Cashier => Role::Cashier,
        }
    }
}

pub(crate) async fn run(ctx: &AppContext, command: UserCommand) -> Result<(), String> {
    match command.command {
        UserSubcommand::List(args) => {
            let users = ctx
                .users
                .list_users(args.query(Order::asc("username")))
                .await
                .map_err(|error| format!("failed to list users: {error}"))?;

            print_table(
                ["ID", "Username", "Role"],
                users
                    .into_iter()
                    .map(|user| [user.id.to_string(), user.username, format!("{:?}", user.role)])
                    .collect(),
            );
        }
        UserSubcommand::Create {
            username,
            password,
            role,
        } => {
            ctx.users
                .create_user(NewUser {
                    username,
                    password: Zeroizing::new(password),
                    role: role.into(),
                })
                .await
                .map_err(|error| format!("failed to create user: {error}"))?;

            println!("user created");
        }
        UserSubcommand::Delete { id } => {
            let id = UserId::new(id);

            ctx.users
                .delete_user(id.clone())
                .await
                .map_err(|error| format!("failed to delete user: {error}"))?;

            println!("user {id} deleted");
        }
    }

    Ok(())
}
