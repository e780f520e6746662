use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};
use till_app::context::AppContext;
use zeroize::Zeroizing;

#[derive(Debug, Args)]
pub(crate) struct LoginArgs {
    /// Username
    username: String,

    /// Password; read from stdin when omitted
    #[arg(long, env = "TILL_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

pub(crate) async fn login(ctx: &AppContext, args: LoginArgs) -> Result<(), String> {
    let password = match args.password {
        Some(password) => Zeroizing::new(password),
        None => read_password().await?,
    };

    let mut session = ctx
        .session()
        .map_err(|error| format!("failed to load session: {error}"))?;

    let user = session
        .login(ctx.users.as_ref(), &args.username, &password)
        .await
        .map_err(|error| format!("login failed: {error}"))?;

    println!("logged in as {} ({:?})", user.username, user.role);

    Ok(())
}

pub(crate) fn logout(ctx: &AppContext) -> Result<(), String> {
    let mut session = ctx
        .session()
        .map_err(|error| format!("failed to load session: {error}"))?;

    match session
        .logout()
        .map_err(|error| format!("logout failed: {error}"))?
    {
        Some(user) => println!("logged out {}", user.username),
        None => println!("nobody is logged in"),
    }

    Ok(())
}

async fn read_password() -> Result<Zeroizing<String>, String> {
    eprint!("password: ");

    let mut line = Zeroizing::new(String::new());

    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .map_err(|error| format!("failed to read password: {error}"))?;

    Ok(Zeroizing::new(line.trim_end_matches(['\r', '\n']).to_string()))
}
