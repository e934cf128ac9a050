use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use supptrack::{
    Filter, PlanResolver, SupplementPlan, SyncSession, SyncStatus,
    calendar::{LEGEND, MonthNavigator, ViewContext, checklist, month_cells, render_month},
    core::{SystemClock, parse_date_key},
    retention::MonthRef,
    sync::{FileCache, HttpRemote, RetryPolicy},
};
use tracing::warn;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "supp-cli")]
#[command(about = "Track daily supplements against a supptrack server")]
struct Cli {
    /// Base URL of the supptrack server
    #[arg(long, env = "SUPP_SERVER", default_value = "http://127.0.0.1:8080")]
    server: String,

    /// Directory holding the local record cache
    #[arg(long, env = "SUPP_CACHE_DIR", default_value = ".supptrack-cache")]
    cache_dir: PathBuf,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the heatmap for a month of the retention window
    Show {
        #[arg(long)]
        user: String,
        /// Month as YYYY-MM, defaults to the current month
        #[arg(long)]
        month: Option<String>,
        /// "All" or a single supplement name
        #[arg(long, default_value = "All")]
        filter: String,
    },
    /// List the supplements for a day and whether they are scheduled and taken
    Checklist {
        #[arg(long)]
        user: String,
        /// Date as YYYY-MM-DD, defaults to today
        #[arg(long)]
        date: Option<String>,
    },
    /// Mark or unmark one scheduled supplement
    Toggle {
        #[arg(long)]
        user: String,
        #[arg(long)]
        supplement: String,
        #[arg(long)]
        date: Option<String>,
    },
    /// Replace the full list for a day
    Edit {
        #[arg(long)]
        user: String,
        #[arg(long)]
        date: String,
        #[arg(long = "supplement")]
        supplements: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let remote = Arc::new(
        HttpRemote::new(&cli.server, Duration::from_secs(cli.timeout_secs))
            .context("failed to create HTTP client")?,
    );
    let plan = match remote.fetch_plan().await {
        Ok(plan) => plan,
        Err(err) => {
            warn!(error = %err, "could not fetch plan from server, using built-in plan");
            SupplementPlan::builtin()
        }
    };
    let session = SyncSession::new(
        Arc::new(FileCache::new(&cli.cache_dir)),
        remote,
        PlanResolver::new(plan),
        Arc::new(SystemClock),
        RetryPolicy::default(),
    );

    match cli.command {
        Command::Show {
            user,
            month,
            filter,
        } => show(&session, &user, month.as_deref(), &filter).await,
        Command::Checklist { user, date } => print_checklist(&session, &user, date.as_deref()).await,
        Command::Toggle {
            user,
            supplement,
            date,
        } => toggle(&session, &user, &supplement, date.as_deref()).await,
        Command::Edit {
            user,
            date,
            supplements,
        } => edit(&session, &user, &date, supplements).await,
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn open_user(session: &SyncSession, user: &str) -> Result<()> {
    if !session.resolver().plan().knows_user(user) {
        warn!(user, "user is not part of the supplement plan");
    }
    session
        .select_user(user)?
        .await
        .context("remote fetch task failed")?;
    Ok(())
}

fn parse_day(raw: Option<&str>, today: NaiveDate) -> Result<NaiveDate> {
    match raw {
        None => Ok(today),
        Some(raw) => parse_date_key(raw).ok_or_else(|| anyhow!("'{raw}' is not a YYYY-MM-DD date")),
    }
}

fn parse_month(raw: &str) -> Result<MonthRef> {
    parse_date_key(&format!("{raw}-01"))
        .map(MonthRef::of)
        .ok_or_else(|| anyhow!("'{raw}' is not a YYYY-MM month"))
}

async fn show(session: &SyncSession, user: &str, month: Option<&str>, filter: &str) -> Result<()> {
    open_user(session, user).await?;
    let today = session.today();

    let mut navigator = MonthNavigator::new(today);
    if let Some(raw) = month {
        let wanted = parse_month(raw)?;
        if !navigator.seek(wanted) {
            return Err(anyhow!("{raw} is outside the three-month window"));
        }
    }

    let filter: Filter = filter.parse().unwrap_or_default();
    let record = session.record()?;
    let ctx = ViewContext {
        record: &record,
        resolver: session.resolver(),
        user,
        filter: &filter,
        today,
    };
    let cells = month_cells(navigator.current(), &ctx, Some(today));

    println!("{user} - filter: {filter}");
    print!("{}", render_month(navigator.current(), &cells));
    println!();
    for (glyph, (_, caption)) in ['-', '+', '#', '.'].iter().zip(LEGEND.iter()) {
        println!("  {glyph}  {caption}");
    }
    println!("  *  Today");
    Ok(())
}

async fn print_checklist(session: &SyncSession, user: &str, date: Option<&str>) -> Result<()> {
    open_user(session, user).await?;
    let day = parse_day(date, session.today())?;
    let record = session.record()?;

    println!("{user} - {}", day.format("%A %Y-%m-%d"));
    for item in checklist(day, &record, session.resolver(), user) {
        let mark = if item.checked { "x" } else { " " };
        println!("  [{mark}] {}", item.label());
    }
    Ok(())
}

async fn toggle(
    session: &SyncSession,
    user: &str,
    supplement: &str,
    date: Option<&str>,
) -> Result<()> {
    open_user(session, user).await?;
    let day = parse_day(date, session.today())?;

    let (updated, write) = session.toggle(day, supplement)?;
    write.await.context("remote write task failed")?;

    println!("{}: {}", day, updated.join(", "));
    report_sync(session)
}

async fn edit(session: &SyncSession, user: &str, date: &str, supplements: Vec<String>) -> Result<()> {
    open_user(session, user).await?;
    let day = parse_day(Some(date), session.today())?;

    let write = session.save_day(day, supplements.clone())?;
    write.await.context("remote write task failed")?;

    println!("{}: {}", day, supplements.join(", "));
    report_sync(session)
}

fn report_sync(session: &SyncSession) -> Result<()> {
    match session.status() {
        SyncStatus::Failed { last_error, .. } => {
            eprintln!("saved locally, server sync failed: {last_error}");
            Err(anyhow!("server sync failed"))
        }
        _ => Ok(()),
    }
}
