use anyhow::{Context as _, Result};
use clap::Subcommand;
use std::collections::BTreeMap;
use url::Url;

use intelink::models::billing::{
    BillingInterval, CreatePlanRequest, CreateSubscriptionRequest, Plan, PlanType, Subscription,
    UpdatePlanRequest, VnpayPaymentRequest,
};
use intelink::renderer::table::Table;
use intelink::timefmt::format_datetime_opt;

use super::{confirm, Context};

#[derive(Subcommand)]
pub enum PlansCommand {
    /// List available plans
    List,
    /// Create a plan (admin)
    Create {
        /// FREE, PRO or ENTERPRISE
        #[arg(long = "type")]
        plan_type: PlanType,
        #[arg(long)]
        price: f64,
        /// MONTHLY or YEARLY
        #[arg(long, default_value = "MONTHLY")]
        interval: BillingInterval,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        max_short_urls: Option<u64>,
        #[arg(long)]
        max_usage_per_url: Option<u64>,
        #[arg(long)]
        custom_domain: bool,
        #[arg(long)]
        statistics: bool,
        #[arg(long)]
        api_access: bool,
    },
    /// Update a plan (admin)
    Update {
        id: i64,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        price: Option<f64>,
        #[arg(long)]
        max_short_urls: Option<u64>,
        #[arg(long)]
        max_usage_per_url: Option<u64>,
    },
    /// Delete a plan (admin)
    Delete {
        id: i64,
        #[arg(short, long)]
        yes: bool,
    },
    /// Activate or deactivate a plan (admin)
    Status {
        id: i64,
        #[arg(long, conflicts_with = "inactive")]
        active: bool,
        #[arg(long)]
        inactive: bool,
    },
}

#[derive(Subcommand)]
pub enum SubscriptionCommand {
    /// Show the active subscription
    Current,
    /// List all your subscriptions
    List,
    /// Quote the price of switching to a plan
    Cost { plan_id: i64 },
    /// Subscribe to a plan
    Create {
        plan_id: i64,
        /// Switch now instead of at the end of the current period
        #[arg(long)]
        now: bool,
    },
    /// Cancel a subscription
    Cancel {
        id: String,
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum PayCommand {
    /// Start a VNPay payment and print the checkout URL
    Create {
        subscription_id: String,
        #[arg(long)]
        amount: f64,
        #[arg(long)]
        order_info: Option<String>,
        #[arg(long)]
        return_url: Option<String>,
    },
    /// Confirm a payment from the URL VNPay redirected to
    Callback { return_url: String },
}

pub async fn run_plans(ctx: &Context, command: PlansCommand) -> Result<()> {
    match command {
        PlansCommand::List => {
            ctx.restore_session().await?;
            let plans = ctx.api.list_plans().await?;
            print_plans(&plans);
        }
        PlansCommand::Create {
            plan_type,
            price,
            interval,
            description,
            max_short_urls,
            max_usage_per_url,
            custom_domain,
            statistics,
            api_access,
        } => {
            ctx.require_admin().await?;
            let request = CreatePlanRequest {
                plan_type,
                description,
                price,
                billing_interval: interval,
                max_short_urls,
                max_usage_per_url,
                custom_domain_enabled: custom_domain,
                statistics_enabled: statistics,
                api_access_enabled: api_access,
            };
            let plan = ctx.api.create_plan(&request).await?;
            eprintln!("✅ Created plan {} ({})", plan.id, plan.plan_type);
        }
        PlansCommand::Update {
            id,
            description,
            price,
            max_short_urls,
            max_usage_per_url,
        } => {
            ctx.require_admin().await?;
            let request = UpdatePlanRequest {
                description,
                price,
                max_short_urls,
                max_usage_per_url,
            };
            let plan = ctx.api.update_plan(id, &request).await?;
            eprintln!("✅ Updated plan {} ({})", plan.id, plan.plan_type);
        }
        PlansCommand::Delete { id, yes } => {
            ctx.require_admin().await?;
            if !confirm(&format!("Delete plan {}?", id), yes)? {
                eprintln!("Delete cancelled.");
                return Ok(());
            }
            ctx.api.delete_plan(id).await?;
            eprintln!("🗑️  Deleted plan {}", id);
        }
        PlansCommand::Status {
            id,
            active,
            inactive,
        } => {
            ctx.require_admin().await?;
            if active == inactive {
                anyhow::bail!("Pass either --active or --inactive");
            }
            let plan = ctx.api.set_plan_status(id, active).await?;
            eprintln!(
                "✅ Plan {} is now {}",
                plan.id,
                if plan.active { "active" } else { "inactive" }
            );
        }
    }
    Ok(())
}

pub async fn run_subscription(ctx: &Context, command: SubscriptionCommand) -> Result<()> {
    ctx.require_user().await?;

    match command {
        SubscriptionCommand::Current => match ctx.api.current_subscription().await? {
            Some(sub) => print_subscriptions(std::slice::from_ref(&sub)),
            None => println!("No active subscription."),
        },
        SubscriptionCommand::List => {
            let subs = ctx.api.list_subscriptions().await?;
            if subs.is_empty() {
                println!("No subscriptions.");
            } else {
                print_subscriptions(&subs);
            }
        }
        SubscriptionCommand::Cost { plan_id } => {
            let cost = ctx.api.subscription_cost(plan_id).await?;
            let currency = cost.currency.as_deref().unwrap_or("VND");
            println!("Plan price:   {:.2} {}", cost.amount, currency);
            if cost.credit_amount > 0.0 {
                println!("Credit:       {:.2} {}", cost.credit_amount, currency);
            }
            println!("Amount due:   {:.2} {}", cost.amount_due(), currency);
            if let Some(ref message) = cost.message {
                println!("{}", message);
            }
        }
        SubscriptionCommand::Create { plan_id, now } => {
            let request = CreateSubscriptionRequest {
                plan_id,
                apply_immediately: now,
            };
            let sub = ctx.api.create_subscription(&request).await?;
            eprintln!(
                "✅ Subscription {} created ({})",
                sub.id, sub.status
            );
            if !sub.active {
                eprintln!(
                    "Run 'intelink pay create {} --amount <amount>' to complete payment.",
                    sub.id
                );
            }
        }
        SubscriptionCommand::Cancel { id, yes } => {
            if !confirm(&format!("Cancel subscription {}?", id), yes)? {
                eprintln!("Cancel aborted.");
                return Ok(());
            }
            let sub = ctx.api.cancel_subscription(&id).await?;
            eprintln!("✅ Subscription {} is {}", sub.id, sub.status);
        }
    }
    Ok(())
}

pub async fn run_pay(ctx: &Context, command: PayCommand) -> Result<()> {
    ctx.require_user().await?;

    match command {
        PayCommand::Create {
            subscription_id,
            amount,
            order_info,
            return_url,
        } => {
            let request = VnpayPaymentRequest {
                subscription_id,
                amount,
                order_info,
                return_url,
            };
            let payment = ctx.api.create_vnpay_payment(&request).await?;
            println!("Open this URL to pay:\n{}", payment.payment_url);
            if let Some(id) = payment.payment_id {
                eprintln!("Payment id: {}", id);
            }
        }
        PayCommand::Callback { return_url } => {
            let params = callback_params(&return_url)?;
            let result = ctx.api.vnpay_callback(&params).await?;
            if result.success {
                eprintln!("✅ Payment confirmed");
            } else {
                eprintln!("❌ Payment not completed");
            }
            if let Some(status) = result.status {
                println!("Status:  {}", status);
            }
            if let Some(message) = result.message {
                println!("Message: {}", message);
            }
        }
    }
    Ok(())
}

/// Query parameters of the URL the payment gateway redirected to.
fn callback_params(return_url: &str) -> Result<BTreeMap<String, String>> {
    let url = Url::parse(return_url.trim())
        .with_context(|| format!("Invalid return URL: {}", return_url))?;
    let params: BTreeMap<String, String> = url.query_pairs().into_owned().collect();
    if params.is_empty() {
        anyhow::bail!("The return URL carries no payment parameters");
    }
    Ok(params)
}

fn print_plans(plans: &[Plan]) {
    if plans.is_empty() {
        println!("No plans available.");
        return;
    }
    let mut table = Table::new(["ID", "Type", "Price", "Interval", "URLs", "Features", "Active"]);
    for plan in plans {
        let mut features = Vec::new();
        if plan.statistics_enabled {
            features.push("stats");
        }
        if plan.api_access_enabled {
            features.push("api");
        }
        if plan.custom_domain_enabled {
            features.push("domain");
        }
        table.row([
            plan.id.to_string(),
            plan.plan_type.to_string(),
            format!("{:.0}", plan.price),
            plan.billing_interval.to_string(),
            plan.max_short_urls
                .map(|n| n.to_string())
                .unwrap_or_else(|| "unlimited".to_string()),
            features.join(","),
            if plan.active { "yes" } else { "no" }.to_string(),
        ]);
    }
    print!("{}", table.render());
}

fn print_subscriptions(subs: &[Subscription]) {
    let mut table = Table::new(["ID", "Plan", "Status", "Starts", "Expires"]);
    for sub in subs {
        table.row([
            sub.id.clone(),
            sub.plan.plan_type.to_string(),
            sub.status.to_string(),
            format_datetime_opt(sub.starts_at.as_ref()),
            format_datetime_opt(sub.expires_at.as_ref()),
        ]);
    }
    print!("{}", table.render());
}
