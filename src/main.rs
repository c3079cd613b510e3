use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};

use intelink::error::ApiError;

mod commands;
mod login;
mod logout;
mod status;

use commands::api_keys::ApiKeysCommand;
use commands::billing::{PayCommand, PlansCommand, SubscriptionCommand};
use commands::config::ConfigCommand;
use commands::stats::StatsArgs;
use commands::urls::UrlsCommand;
use commands::Context;

#[derive(Parser)]
#[command(name = "intelink", version)]
#[command(about = "Intelink short links and click analytics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session tokens
    Login {
        /// Username; prompted for when omitted
        #[arg(long)]
        username: Option<String>,
    },
    /// Create an account and log in
    Register {
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Log out and remove the stored tokens
    Logout {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Renew the access token with the stored refresh token
    Refresh,
    /// Show configuration and session status
    Status,
    /// Show or change client settings
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Manage short URLs
    #[command(subcommand)]
    Urls(UrlsCommand),
    /// Click statistics for a short URL
    Stats(StatsArgs),
    /// Subscription plans
    #[command(subcommand)]
    Plans(PlansCommand),
    /// Your subscriptions
    #[command(subcommand)]
    Subscription(SubscriptionCommand),
    /// VNPay payments
    #[command(subcommand)]
    Pay(PayCommand),
    /// API keys
    #[command(subcommand)]
    ApiKeys(ApiKeysCommand),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Login { .. } => "login",
            Commands::Register { .. } => "register",
            Commands::Logout { .. } => "logout",
            Commands::Refresh => "refresh",
            Commands::Status => "status",
            Commands::Config(_) => "config",
            Commands::Urls(_) => "urls",
            Commands::Stats(_) => "stats",
            Commands::Plans(_) => "plans",
            Commands::Subscription(_) => "subscription",
            Commands::Pay(_) => "pay",
            Commands::ApiKeys(_) => "api-keys",
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        tracing::error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        if let Some(ApiError::Validation { fields, .. }) = e.downcast_ref::<ApiError>() {
            for field in fields {
                eprintln!("  - {}: {}", field.field, field.message);
            }
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let ctx = Context::init(cli.command.name())?;

    tokio::runtime::Runtime::new()
        .context("Failed to create Tokio runtime")?
        .block_on(dispatch(&ctx, cli.command))
}

async fn dispatch(ctx: &Context, command: Commands) -> Result<()> {
    match command {
        Commands::Login { username } => login::run(ctx, username).await,
        Commands::Register { username, email } => login::register(ctx, username, email).await,
        Commands::Logout { yes } => logout::run(ctx, yes).await,
        Commands::Refresh => {
            ctx.api.refresh_session().await?;
            eprintln!("Session renewed.");
            Ok(())
        }
        Commands::Status => status::run(ctx).await,
        Commands::Config(cmd) => commands::config::run(ctx, cmd),
        Commands::Urls(cmd) => commands::urls::run(ctx, cmd).await,
        Commands::Stats(args) => commands::stats::run(ctx, args).await,
        Commands::Plans(cmd) => commands::billing::run_plans(ctx, cmd).await,
        Commands::Subscription(cmd) => commands::billing::run_subscription(ctx, cmd).await,
        Commands::Pay(cmd) => commands::billing::run_pay(ctx, cmd).await,
        Commands::ApiKeys(cmd) => commands::api_keys::run(ctx, cmd).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use intelink::models::statistics::DimensionType;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_stats_flags() {
        let cli = Cli::try_parse_from([
            "intelink",
            "stats",
            "abc123",
            "-d",
            "browser",
            "--dimension",
            "UTM_SOURCE",
            "--timeseries",
            "--peak-times",
        ])
        .unwrap();
        match cli.command {
            Commands::Stats(args) => {
                assert_eq!(args.code, "abc123");
                assert_eq!(
                    args.dimensions,
                    vec![DimensionType::Browser, DimensionType::UtmSource]
                );
                assert!(args.timeseries.is_some());
                assert!(args.peak_times);
            }
            _ => panic!("expected stats command"),
        }
    }

    #[test]
    fn test_parse_nested_subcommand() {
        let cli = Cli::try_parse_from(["intelink", "api-keys", "delete", "k1", "-y"]).unwrap();
        assert_eq!(cli.command.name(), "api-keys");
    }

    #[test]
    fn test_parse_config_set_empty_value() {
        let cli =
            Cli::try_parse_from(["intelink", "config", "set", "map_floor_region", ""]).unwrap();
        assert_eq!(cli.command.name(), "config");
    }
}
