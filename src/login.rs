use anyhow::Result;
use rpassword::prompt_password;
use std::io::{self, Write};

use intelink::models::auth::{LoginRequest, RegisterRequest};

use crate::commands::{confirm, finish_spinner, spinner, Context};

pub async fn run(ctx: &Context, username_flag: Option<String>) -> Result<()> {
    if !switch_account_if_needed(ctx).await? {
        return Ok(());
    }

    let username = match username_flag {
        Some(name) => name,
        None => prompt_username()?,
    };
    let password = prompt_password("Password: ")?;

    let pb = spinner("Signing in...");
    let result = ctx
        .api
        .login(&LoginRequest {
            username: username.trim().to_owned(),
            password,
        })
        .await;
    finish_spinner(pb);

    let user = result?;
    tracing::info!("Logged in as {}", user.username);
    eprintln!(
        "Logged in and stored credentials for {} ({})",
        user.username,
        ctx.session().store_path().display()
    );
    Ok(())
}

pub async fn register(
    ctx: &Context,
    username_flag: Option<String>,
    email_flag: Option<String>,
) -> Result<()> {
    if !switch_account_if_needed(ctx).await? {
        return Ok(());
    }

    let username = match username_flag {
        Some(name) => name,
        None => prompt_username()?,
    };
    let email = match email_flag {
        Some(email) => email,
        None => prompt("Email: ")?,
    };
    let password = prompt_password("Password: ")?;
    let repeated = prompt_password("Repeat password: ")?;
    if password != repeated {
        anyhow::bail!("Passwords do not match");
    }

    let user = ctx
        .api
        .register(&RegisterRequest {
            username: username.trim().to_owned(),
            email: email.trim().to_owned(),
            password,
        })
        .await?;
    tracing::info!("Registered {}", user.username);
    eprintln!("Account created. Logged in as {}", user.username);
    Ok(())
}

/// Returns `false` when the user keeps the existing session.
async fn switch_account_if_needed(ctx: &Context) -> Result<bool> {
    let current = match ctx.restore_session().await {
        Ok(user) => user,
        Err(e) => {
            // Offline: the stored tokens stay, a fresh login replaces them
            tracing::warn!("Could not check the existing session: {:#}", e);
            None
        }
    };

    match current {
        Some(user) => {
            eprintln!("Already logged in as {}.", user.username);
            confirm("Log in with a different account?", false)
        }
        None => Ok(true),
    }
}

/// Ask for a username, offering the OS user name as the default.
fn prompt_username() -> Result<String> {
    let default = whoami::username();
    let input = prompt(&format!("Username [{}]: ", default))?;
    let input = input.trim();
    if input.is_empty() {
        Ok(default)
    } else {
        Ok(input.to_owned())
    }
}

pub fn prompt(msg: &str) -> Result<String> {
    print!("{}", msg);
    io::stdout().flush().ok();
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input)
}
