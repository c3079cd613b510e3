use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Subcommand;

use intelink::models::api_key::{ApiKey, CreateApiKeyRequest, UpdateApiKeyRequest};
use intelink::renderer::table::Table;
use intelink::timefmt::format_datetime_opt;

use super::{confirm, Context};

#[derive(Subcommand)]
pub enum ApiKeysCommand {
    List,
    /// Create a key; the secret is shown once
    Create {
        name: String,
        #[arg(long)]
        rate_limit: Option<u32>,
        /// Expiry as RFC 3339
        #[arg(long)]
        expires_at: Option<DateTime<Utc>>,
    },
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        rate_limit: Option<u32>,
        #[arg(long, conflicts_with = "disable")]
        enable: bool,
        #[arg(long)]
        disable: bool,
    },
    Delete {
        id: String,
        #[arg(short, long)]
        yes: bool,
    },
}

pub async fn run(ctx: &Context, command: ApiKeysCommand) -> Result<()> {
    ctx.require_user().await?;

    match command {
        ApiKeysCommand::List => {
            let keys = ctx.api.list_api_keys().await?;
            print_keys(&keys);
        }
        ApiKeysCommand::Create {
            name,
            rate_limit,
            expires_at,
        } => {
            let request = CreateApiKeyRequest {
                name,
                rate_limit_per_hour: rate_limit,
                expires_at,
            };
            let key = ctx.api.create_api_key(&request).await?;
            eprintln!("✅ Created API key {} ({})", key.name, key.id);
            match key.raw_key {
                Some(ref secret) => {
                    println!("{}", secret);
                    eprintln!("Store this key now; it will not be shown again.");
                }
                None => eprintln!("⚠️  The server did not return the key secret."),
            }
        }
        ApiKeysCommand::Update {
            id,
            name,
            rate_limit,
            enable,
            disable,
        } => {
            let active = match (enable, disable) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            let request = UpdateApiKeyRequest {
                name,
                active,
                rate_limit_per_hour: rate_limit,
            };
            let key = ctx.api.update_api_key(&id, &request).await?;
            eprintln!("✅ Updated API key {}", key.name);
        }
        ApiKeysCommand::Delete { id, yes } => {
            if !confirm(&format!("Delete API key {}?", id), yes)? {
                eprintln!("Delete cancelled.");
                return Ok(());
            }
            ctx.api.delete_api_key(&id).await?;
            eprintln!("🗑️  Deleted API key {}", id);
        }
    }
    Ok(())
}

fn print_keys(keys: &[ApiKey]) {
    if keys.is_empty() {
        println!("No API keys.");
        return;
    }
    let mut table = Table::new(["ID", "Name", "Prefix", "Active", "Limit/h", "Last used"]);
    for key in keys {
        table.row([
            key.id.clone(),
            key.name.clone(),
            key.key_prefix.clone().unwrap_or_default(),
            if key.active { "yes" } else { "no" }.to_string(),
            key.rate_limit_per_hour
                .map(|n| n.to_string())
                .unwrap_or_else(|| "-".to_string()),
            format_datetime_opt(key.last_used_at.as_ref()),
        ]);
    }
    print!("{}", table.render());
}
