//! Show or update today's reading status for one user.
//!
//! Usage: cargo run --bin reading-status -- --user <id> [--mark <section> | --all] [--history <days>]

use anyhow::{bail, Context};
use chrono::Days;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use daily_reading::clock::format_reading_date;
use daily_reading::config::Config;
use daily_reading::session::SessionSnapshot;
use daily_reading::store::SupabaseStore;
use daily_reading::{MarkOutcome, ReadingService, ReadingSession, Section, UserId};

fn arg_value(name: &str) -> Option<String> {
    std::env::args()
        .position(|a| a == name)
        .and_then(|i| std::env::args().nth(i + 1))
}

fn print_status(snapshot: &SessionSnapshot) {
    println!("=== {} ===", format_reading_date(snapshot.date));
    for section in Section::all() {
        println!("  [{:?}] {}", snapshot.get(*section), section.name());
    }
    if let Some(streak) = &snapshot.streak {
        println!(
            "Streak: {} day(s), {} total{}",
            streak.displayed,
            streak.total_readings,
            if streak.is_lapsed() { " (lapsed)" } else { "" }
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let Some(user) = arg_value("--user") else {
        bail!("Missing --user <id>");
    };

    let config = Config::load()?;
    let store = SupabaseStore::new(&config)?;
    let service = Arc::new(ReadingService::from_config(Arc::new(store), &config));
    let session = ReadingSession::sign_in(Arc::clone(&service), UserId::new(user))
        .await
        .context("Failed to load today's reading status")?;

    let outcome = if let Some(key) = arg_value("--mark") {
        Some(session.mark_section_complete(Section::parse(&key)?).await?)
    } else if std::env::args().any(|a| a == "--all") {
        Some(session.mark_all_complete().await?)
    } else {
        None
    };

    match outcome {
        Some(MarkOutcome::Saved(receipt)) if receipt.newly_completed => {
            println!("All sections complete for today!");
        }
        Some(MarkOutcome::Ignored(notice)) => println!("{}", notice.message()),
        _ => {}
    }

    session.get_streak().await?;
    print_status(&session.get_status().await);

    if let Some(days) = arg_value("--history").and_then(|s| s.parse::<u64>().ok()) {
        let to = service.today();
        let from = to.checked_sub_days(Days::new(days)).unwrap_or(to);
        let history = service.history(session.user_id(), from, to).await?;
        println!("\n=== History ({} day(s)) ===", history.len());
        for day in &history {
            let (done, total) = day.progress();
            println!(
                "  {} {}/{}{}",
                format_reading_date(day.reading_date),
                done,
                total,
                if day.completed() { " ✓" } else { "" }
            );
        }
    }

    session.sign_out();
    Ok(())
}
