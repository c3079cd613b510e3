use anyhow::Result;
use clap::Subcommand;

use intelink::config::Config;

use super::Context;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the effective settings
    Show,
    /// Change one stored setting
    Set {
        /// api_url, timeout_secs, log_filter, search_debounce_ms or map_floor_region
        key: String,
        /// New value; empty resets optional settings
        value: String,
    },
}

pub fn run(ctx: &Context, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => {
            println!("{}", serde_json::to_string_pretty(&ctx.config)?);
        }
        ConfigCommand::Set { key, value } => {
            // Environment overrides must not end up in the file
            let mut stored = Config::load_stored(&ctx.data_root)?;
            stored.set(&key, &value)?;
            stored.save(&ctx.data_root)?;
            tracing::info!("Config {} updated", key);
            eprintln!("Saved {}.", key);
        }
    }
    Ok(())
}
