use anyhow::Result;

use intelink::models::auth::User;
use intelink::timefmt::format_datetime_opt;

use crate::commands::Context;

/// What can be said about the local session.
pub enum SessionStatus {
    SignedOut,
    /// Tokens are stored but the server could not be reached.
    Unverified(String),
    SignedIn(User),
}

pub async fn check_session_status(ctx: &Context) -> SessionStatus {
    match ctx.api.initialize_session().await {
        Ok(Some(user)) => SessionStatus::SignedIn(user),
        Ok(None) => SessionStatus::SignedOut,
        Err(e) => SessionStatus::Unverified(e.to_string()),
    }
}

pub async fn run(ctx: &Context) -> Result<()> {
    println!("Data directory: {}", ctx.data_root.display());
    println!("API:            {}", ctx.config.api_url);
    println!("Log file:       {}", ctx.log_path.display());

    let store_path = ctx.session().store_path();
    println!(
        "Credentials:    {} ({})",
        if ctx.session().has_persisted_tokens() {
            "OK"
        } else {
            "MISSING"
        },
        store_path.display()
    );
    println!(
        "Refresh token:  {}",
        if ctx.session().refresh_token().is_some() {
            "OK"
        } else {
            "MISSING"
        }
    );

    match check_session_status(ctx).await {
        SessionStatus::SignedOut => {
            println!("Session:        signed out");
            return Ok(());
        }
        SessionStatus::Unverified(reason) => {
            println!("Session:        ⚠ Unable to check ({})", reason);
            return Ok(());
        }
        SessionStatus::SignedIn(user) => print_user(&user),
    }

    match ctx.api.current_subscription().await {
        Ok(Some(sub)) => println!(
            "Subscription:   {} ({}, expires {})",
            sub.plan.plan_type,
            sub.status,
            format_datetime_opt(sub.expires_at.as_ref())
        ),
        Ok(None) => println!("Subscription:   none"),
        Err(e) => eprintln!("  Error reading subscription: {}", e),
    }
    Ok(())
}

fn print_user(user: &User) {
    println!("Session:        ✓ signed in as {}", user.username);
    if let Some(ref email) = user.email {
        println!("Email:          {}", email);
    }
    if let Some(ref role) = user.role {
        println!("Role:           {}", role);
    }
    if let Some(n) = user.total_short_urls {
        println!("Short URLs:     {}", n);
    }
    if let Some(n) = user.total_clicks {
        println!("Total clicks:   {}", n);
    }
    println!("Member since:   {}", format_datetime_opt(user.created_at.as_ref()));
}
