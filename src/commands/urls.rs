use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use clap::Subcommand;
use inquire::{Select, Text};
use rpassword::prompt_password;

use intelink::models::short_url::{
    CreateShortUrlRequest, ShortUrl, ShortUrlSearch, ShortUrlStatus, UpdatePasswordRequest,
    UpdateShortUrlRequest,
};
use intelink::pagination::{ListQuery, ListQueryController, PagedList, DEFAULT_PAGE_SIZE};
use intelink::renderer::table::Table;
use intelink::timefmt::{format_datetime, format_datetime_opt};

use super::{confirm, finish_spinner, spinner, Context};

#[derive(Subcommand)]
pub enum UrlsCommand {
    /// List your short URLs
    List {
        /// Zero-based page index
        #[arg(long, default_value_t = 0)]
        page: u32,
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        size: u32,
        /// Only URLs with this status (ENABLED, DISABLED, EXPIRED)
        #[arg(long)]
        status: Option<ShortUrlStatus>,
    },
    /// Search short URLs by code, destination or description
    Search {
        query: String,
        #[arg(long)]
        status: Option<ShortUrlStatus>,
        #[arg(long, default_value_t = 0)]
        page: u32,
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        size: u32,
    },
    /// Page through short URLs interactively
    Browse {
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        size: u32,
    },
    /// Show one short URL
    Show { code: String },
    /// Create a short URL
    Create {
        /// Destination URL
        url: String,
        /// Custom short code
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Prompt for an access password
        #[arg(long)]
        password: bool,
        /// Maximum number of clicks
        #[arg(long)]
        max_usage: Option<u64>,
        /// Expiry as RFC 3339, e.g. 2025-01-31T00:00:00Z
        #[arg(long)]
        expires_at: Option<DateTime<Utc>>,
    },
    /// Change a short URL's destination, description or limits
    Update {
        code: String,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        max_usage: Option<u64>,
        #[arg(long)]
        expires_at: Option<DateTime<Utc>>,
    },
    Enable { code: String },
    Disable { code: String },
    /// Delete a short URL
    Delete {
        code: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Set or remove the access password
    Password {
        code: String,
        #[arg(long)]
        remove: bool,
    },
}

pub async fn run(ctx: &Context, command: UrlsCommand) -> Result<()> {
    ctx.require_user().await?;

    match command {
        UrlsCommand::List { page, size, status } => {
            let search = ShortUrlSearch {
                status,
                page,
                size,
                ..Default::default()
            };
            print_page(ctx, &search).await
        }
        UrlsCommand::Search {
            query,
            status,
            page,
            size,
        } => {
            let search = ShortUrlSearch {
                query,
                status,
                page,
                size,
                ..Default::default()
            };
            print_page(ctx, &search).await
        }
        UrlsCommand::Browse { size } => browse(ctx, size).await,
        UrlsCommand::Show { code } => {
            let url = ctx.api.get_short_url(&code).await?;
            print_details(&url);
            Ok(())
        }
        UrlsCommand::Create {
            url,
            code,
            description,
            password,
            max_usage,
            expires_at,
        } => {
            let password = if password {
                Some(prompt_password("Access password: ")?)
            } else {
                None
            };
            let request = CreateShortUrlRequest {
                original_url: url,
                custom_code: code,
                description,
                password,
                expires_at,
                max_usage,
            };
            let created = ctx.api.create_short_url(&request).await?;
            eprintln!("✅ Created {}", display_url(&created));
            print_details(&created);
            Ok(())
        }
        UrlsCommand::Update {
            code,
            url,
            description,
            max_usage,
            expires_at,
        } => {
            let request = UpdateShortUrlRequest {
                original_url: url,
                description,
                expires_at,
                max_usage,
            };
            let updated = ctx.api.update_short_url(&code, &request).await?;
            eprintln!("✅ Updated {}", updated.short_code);
            print_details(&updated);
            Ok(())
        }
        UrlsCommand::Enable { code } => {
            ctx.api.enable_short_url(&code).await?;
            eprintln!("✅ Enabled {}", code);
            Ok(())
        }
        UrlsCommand::Disable { code } => {
            ctx.api.disable_short_url(&code).await?;
            eprintln!("✅ Disabled {}", code);
            Ok(())
        }
        UrlsCommand::Delete { code, yes } => {
            if !confirm(&format!("Delete short URL '{}'?", code), yes)? {
                eprintln!("Delete cancelled.");
                return Ok(());
            }
            ctx.api.delete_short_url(&code).await?;
            eprintln!("🗑️  Deleted {}", code);
            Ok(())
        }
        UrlsCommand::Password { code, remove } => {
            let password = if remove {
                None
            } else {
                Some(prompt_password("New access password: ")?)
            };
            ctx.api
                .update_short_url_password(&code, &UpdatePasswordRequest { password })
                .await?;
            if remove {
                eprintln!("🔓 Password removed from {}", code);
            } else {
                eprintln!("🔒 Password set on {}", code);
            }
            Ok(())
        }
    }
}

async fn fetch(ctx: &Context, search: &ShortUrlSearch, list: &mut PagedList<ShortUrl>) {
    let pb = spinner("Loading short URLs...");
    // The search endpoint is only needed once a query or filter is set
    let result = if search.query.trim().is_empty() && search.status.is_none() {
        ctx.api.list_short_urls(search).await
    } else {
        ctx.api.search_short_urls(search).await
    };
    finish_spinner(pb);
    list.apply(result);
}

async fn print_page(ctx: &Context, search: &ShortUrlSearch) -> Result<()> {
    let mut list = PagedList::default();
    fetch(ctx, search, &mut list).await;
    if let Some(error) = list.error() {
        anyhow::bail!("{}", error);
    }
    print_list(&list);
    Ok(())
}

fn print_list(list: &PagedList<ShortUrl>) {
    if list.items().is_empty() {
        println!("No short URLs found.");
        return;
    }

    let mut table = Table::new(["Code", "Destination", "Status", "Clicks", "Created"]);
    for url in list.items() {
        table.row([
            url.short_code.clone(),
            url.original_url.clone(),
            url.status.to_string(),
            url.total_clicks.to_string(),
            format_datetime_opt(url.created_at.as_ref()),
        ]);
    }
    print!("{}", table.render());
    println!(
        "{} (page {} of {})",
        list.showing_label(),
        list.page() + 1,
        list.total_pages().max(1)
    );
}

fn print_details(url: &ShortUrl) {
    println!("Code:         {}", url.short_code);
    println!("Short URL:    {}", display_url(url));
    println!("Destination:  {}", url.original_url);
    if let Some(ref description) = url.description {
        println!("Description:  {}", description);
    }
    println!("Status:       {}", url.status);
    println!("Clicks:       {}", url.total_clicks);
    if let Some(max) = url.max_usage {
        println!(
            "Usage limit:  {} ({} left)",
            max,
            url.remaining_usage().unwrap_or(0)
        );
    }
    if let Some(ref expires_at) = url.expires_at {
        println!("Expires:      {}", format_datetime(expires_at));
    }
    println!(
        "Password:     {}",
        if url.has_password { "yes" } else { "no" }
    );
    println!("Created:      {}", format_datetime_opt(url.created_at.as_ref()));
}

fn display_url(url: &ShortUrl) -> String {
    url.display_url().unwrap_or_else(|| url.short_code.clone())
}

const NEXT: &str = "Next page";
const PREVIOUS: &str = "Previous page";
const SEARCH: &str = "Search";
const FILTER: &str = "Filter by status";
const DISMISS: &str = "Dismiss error";
const QUIT: &str = "Quit";

/// Interactive list view. Page moves apply at once; search and filter
/// changes go through the debounced controller and land on the first page.
async fn browse(ctx: &Context, size: u32) -> Result<()> {
    let controller = ListQueryController::new(ctx.config.search_debounce());
    let mut committed = controller.subscribe();
    let mut list = PagedList::default();
    let mut reload = true;

    loop {
        let query = controller.current();
        if reload {
            fetch(ctx, &search_for(&query, size), &mut list).await;
        }
        reload = true;

        print_list(&list);
        if let Some(error) = list.error() {
            eprintln!("⚠️  {}", error);
        }

        let mut actions = Vec::new();
        if list.page() + 1 < list.total_pages() {
            actions.push(NEXT);
        }
        if list.page() > 0 {
            actions.push(PREVIOUS);
        }
        actions.extend([SEARCH, FILTER]);
        if list.error().is_some() {
            actions.push(DISMISS);
        }
        actions.push(QUIT);

        let choice = Select::new("Action:", actions).prompt()?;
        let _ = committed.borrow_and_update();
        match choice {
            NEXT => controller.set_page(list.page() + 1),
            PREVIOUS => controller.set_page(list.page().saturating_sub(1)),
            SEARCH => {
                let text = Text::new("Search:")
                    .with_initial_value(&query.query)
                    .prompt()?;
                controller.set_query(text);
                committed
                    .changed()
                    .await
                    .context("List state closed unexpectedly")?;
            }
            FILTER => {
                let options = vec!["All", "ENABLED", "DISABLED", "EXPIRED"];
                let picked = Select::new("Status:", options).prompt()?;
                controller.set_status(picked.parse().ok());
                committed
                    .changed()
                    .await
                    .context("List state closed unexpectedly")?;
            }
            DISMISS => {
                list.dismiss_error();
                reload = false;
            }
            _ => return Ok(()),
        }
    }
}

fn search_for(query: &ListQuery, size: u32) -> ShortUrlSearch {
    ShortUrlSearch {
        query: query.query.clone(),
        status: query.status,
        page: query.page,
        size,
        ..Default::default()
    }
}
