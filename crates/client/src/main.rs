use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use workportal_auth::{UserType, explain};
use workportal_client::{ClientConfig, LoginForm, RegisterForm, SessionStore};

/// Probe the portal's session and route access rules from the command line.
#[derive(Debug, Parser)]
#[command(name = "workportal-nav", version)]
struct Cli {
    /// Override the API base URL.
    #[arg(long, global = true, env = "WORKPORTAL_API_BASE")]
    api_base: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Navigate to a path and print where the router ends up.
    Go { path: String },
    /// Sign in and store the bearer credential.
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "WORKPORTAL_PASSWORD", hide_env_values = true)]
        password: String,
        /// Account type hint: admin, enterprise or contractor.
        #[arg(long, value_parser = parse_user_type)]
        user_type: Option<UserType>,
    },
    /// Create an account. The account still has to sign in and submit its
    /// apply/bind form.
    Register {
        #[arg(long)]
        username: String,
        #[arg(long, env = "WORKPORTAL_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long, value_parser = parse_user_type)]
        user_type: UserType,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        email: String,
    },
    /// Submit the signed-in account's apply/bind form (a JSON object).
    Apply { application: String },
    /// Sign out and forget the stored credential.
    Logout,
    /// Explain the access verdict for the stored session.
    Whoami,
}

fn parse_user_type(raw: &str) -> Result<UserType, String> {
    UserType::parse(raw).ok_or_else(|| format!("unknown user type '{raw}'"))
}

#[tokio::main]
async fn main() {
    workportal_observability::init();

    if let Err(e) = run().await {
        tracing::error!(error = %format!("{e:#}"), "workportal-nav failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ClientConfig::from_env().context("failed to load client configuration")?;
    if let Some(api_base) = cli.api_base {
        config = ClientConfig::new(api_base, config.token_path.clone())?.with_http_timeout(config.http_timeout);
    }

    let router = workportal_client::connect(config).context("failed to set up the portal client")?;
    let session = router.guard().session();

    match cli.command {
        Command::Go { path } => {
            let navigation = router.navigate(&path).await?;
            print_json(&navigation)?;
        }
        Command::Login {
            username,
            password,
            user_type,
        } => {
            let form = LoginForm {
                username,
                password,
                user_type,
            };
            let Some(token) = session.login(&form).await else {
                anyhow::bail!("sign-in failed: {}", failure(session));
            };
            if let Some(message) = &token.message {
                tracing::info!(%message, "backend message");
            }
            // Follow the backend's hint, or the dashboard, through the guard.
            let target = token.redirect_to.as_deref().unwrap_or(workportal_auth::paths::DASHBOARD);
            print_json(&router.navigate(target).await?)?;
        }
        Command::Register {
            username,
            password,
            user_type,
            phone,
            email,
        } => {
            let form = RegisterForm::new(username, password, user_type, phone, email);
            let Some(receipt) = session.register(&form).await else {
                anyhow::bail!("registration failed: {}", failure(session));
            };
            print_json(&receipt)?;
        }
        Command::Apply { application } => {
            let application: serde_json::Value =
                serde_json::from_str(&application).context("application must be a JSON object")?;
            anyhow::ensure!(application.is_object(), "application must be a JSON object");

            if !session.check_auth().await {
                anyhow::bail!("not signed in");
            }
            let Some(receipt) = session.submit_onboarding(&application).await else {
                anyhow::bail!("submission failed: {}", failure(session));
            };
            print_json(&receipt)?;
            print_json(&explain(session.user().as_deref()))?;
        }
        Command::Logout => {
            session.logout().await;
            tracing::info!("signed out");
        }
        Command::Whoami => {
            session.check_auth().await;
            print_json(&explain(session.user().as_deref()))?;
        }
    }

    Ok(())
}

fn failure(session: &SessionStore) -> String {
    session.last_error().unwrap_or_else(|| "unknown error".to_string())
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render output")?;
    println!("{rendered}");
    Ok(())
}
