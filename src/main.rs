mod aggregate;
mod api;
mod config;
mod error;
mod parser;
mod pipeline;
mod render;
mod source;
mod table;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use crate::api::WikiApi;
use crate::config::Settings;
use crate::table::{BadDatePolicy, CharacterTable};

#[derive(Parser)]
#[command(name = "rainverse_birthdays", about = "Rainverse character birthday table from the wiki")]
struct Cli {
    /// MediaWiki API endpoint (overrides settings)
    #[arg(long, global = true)]
    endpoint: Option<String>,
    /// Story whose character category is included; repeat to list several, in order
    #[arg(long = "story", global = true)]
    stories: Vec<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, render through the wiki and write a standalone HTML page
    Render {
        #[arg(short, long, default_value = "characters.html")]
        out: PathBuf,
        /// Abort on the first unparseable birth date
        #[arg(long)]
        strict: bool,
        /// Ask the wiki for unminified resources
        #[arg(long)]
        debug: bool,
    },
    /// Print the generated table wikitext
    Wikitext {
        #[arg(long)]
        strict: bool,
    },
    /// Print the sorted characters as a console table
    List {
        #[arg(long)]
        strict: bool,
        /// Max rows to display
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Parse a single date string and show the result
    ParseDate { text: String },
}

fn policy(strict: bool) -> BadDatePolicy {
    if strict {
        BadDatePolicy::Abort
    } else {
        BadDatePolicy::Flag
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let settings = Settings::load()?.with_overrides(cli.endpoint, cli.stories);

    let result = match cli.command {
        Commands::ParseDate { text } => describe_date(&text).map(|line| println!("{}", line)),
        Commands::Render { out, strict, debug } => {
            let api = WikiApi::new(&settings)?;
            let status = spinner()?;
            let (table, page) =
                pipeline::render_page(&api, &api, &settings, policy(strict), debug, &status).await?;
            status.finish_and_clear();
            std::fs::write(&out, page)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            println!("Wrote {} characters to {}", table.rows.len(), out.display());
            print_flagged(&table);
            Ok(())
        }
        Commands::Wikitext { strict } => {
            let api = WikiApi::new(&settings)?;
            let status = spinner()?;
            let table = pipeline::build_table(&api, &settings, policy(strict), &status).await?;
            status.finish_and_clear();
            println!("{}", table.to_wikitext());
            print_flagged(&table);
            Ok(())
        }
        Commands::List { strict, limit } => {
            let api = WikiApi::new(&settings)?;
            let status = spinner()?;
            let table = pipeline::build_table(&api, &settings, policy(strict), &status).await?;
            status.finish_and_clear();
            print_list(&table, limit.unwrap_or(table.rows.len()));
            print_flagged(&table);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        eprintln!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn spinner() -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(120));
    Ok(pb)
}

fn print_list(table: &CharacterTable, limit: usize) {
    println!("{:>3} | {:<28} | {:<32} | {:<20}", "#", "Character", "From comics", "Date of birth");
    println!("{}", "-".repeat(92));
    for (i, row) in table.rows.iter().take(limit).enumerate() {
        println!(
            "{:>3} | {:<28} | {:<32} | {:<20}",
            i + 1,
            truncate(&row.label, 28),
            truncate(&row.stories.join(", "), 32),
            truncate(&row.date_text, 20),
        );
    }
    println!("\n{} characters", table.rows.len());
}

/// One-line summary of a parsed date for `parse-date`.
fn describe_date(text: &str) -> anyhow::Result<String> {
    let date = parser::parse_date(text).with_context(|| format!("Could not parse {:?}", text))?;
    Ok(format!(
        "{} (year {}, month {}, day {}, sort key {})",
        date,
        date.year(),
        date.month(),
        date.day(),
        date.sort_key()
    ))
}

/// Goes to stderr so `wikitext` output stays pipeable.
fn print_flagged(table: &CharacterTable) {
    if let Some(report) = flagged_report(table) {
        eprint!("{}", report);
    }
}

fn flagged_report(table: &CharacterTable) -> Option<String> {
    if table.flagged.is_empty() {
        return None;
    }
    let mut out = format!("\n--- Unparsed birth dates ({}) ---\n", table.flagged.len());
    for err in &table.flagged {
        out.push_str(&format!("  {}\n", err));
    }
    Some(out)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}
