use anyhow::Result;

use crate::commands::{confirm, Context};

pub async fn run(ctx: &Context, assume_yes: bool) -> Result<()> {
    let session = ctx.session();
    if !session.has_persisted_tokens() {
        eprintln!("Not logged in.");
        return Ok(());
    }

    // Best effort: the name is only for the prompt
    let who = match ctx.api.profile().await {
        Ok(user) => user.username,
        Err(e) => {
            tracing::debug!("Profile unavailable before logout: {}", e);
            "the current account".to_string()
        }
    };
    if !session.has_persisted_tokens() {
        // The profile call found the session already expired
        eprintln!("Session had expired; local credentials removed.");
        return Ok(());
    }

    if !confirm(&format!("Log out from {}?", who), assume_yes)? {
        eprintln!("Logout cancelled.");
        return Ok(());
    }

    match ctx.api.logout().await {
        Ok(()) => eprintln!("Logged out from {}", who),
        Err(e) => {
            eprintln!("Warning: Server logout failed: {}", e);
            eprintln!("Local credentials were removed anyway.");
        }
    }
    Ok(())
}
