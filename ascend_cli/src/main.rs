use ascend_core::analytics::MAX_WINDOW_DAYS;
use ascend_core::dates::parse_day;
use ascend_core::store::update;
use ascend_core::*;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ascend")]
#[command(about = "Self-tracking progression engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Evaluate as of this day (YYYY-MM-DD) instead of the local date
    #[arg(long, global = true, value_parser = parse_date_arg)]
    today: Option<NaiveDate>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the full progression snapshot as JSON
    Snapshot,

    /// Analyze one metric area over a rolling window
    Metric {
        /// Area key (sleep, mood, calories, steps, exercise, effort)
        area: String,

        /// Window length in days (1-3660)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=MAX_WINDOW_DAYS as i64))]
        days: Option<u32>,
    },

    /// Print BMR, baseline and dynamic TDEE
    Tdee,

    /// Add or replace the entry for a day
    Log {
        /// Day to log (defaults to today)
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,

        #[arg(long)]
        calories: Option<f64>,

        /// Hours slept
        #[arg(long)]
        sleep: Option<f64>,

        /// Mood, 1-10
        #[arg(long)]
        mood: Option<f64>,

        #[arg(long)]
        steps: Option<f64>,

        /// Exercise minutes
        #[arg(long)]
        minutes: Option<f64>,

        /// Exercise effort, 1-10
        #[arg(long)]
        effort: Option<f64>,
    },

    /// Accept a quest so its progress starts counting
    Accept {
        quest_id: String,
    },

    /// Export the normalized entry log to CSV
    Export {
        #[arg(long)]
        out: PathBuf,
    },

    /// Delete all stored data
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

fn parse_date_arg(s: &str) -> std::result::Result<NaiveDate, String> {
    parse_day(s).map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    ascend_core::logging::init_with_level(ascend_core::logging::level_for_verbosity(cli.verbose));

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let store = JsonFileStore::in_dir(&data_dir);
    let today = cli
        .today
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    tracing::debug!("Using data dir {:?}, evaluating as of {}", data_dir, today);

    match cli.command {
        Commands::Snapshot => cmd_snapshot(&store, today, &config),
        Commands::Metric { area, days } => cmd_metric(
            &store,
            &area,
            days.map(|d| d as usize)
                .unwrap_or(config.analytics.default_window_days),
            today,
        ),
        Commands::Tdee => cmd_tdee(&store, &config),
        Commands::Log {
            date,
            calories,
            sleep,
            mood,
            steps,
            minutes,
            effort,
        } => {
            let mut entry = DailyEntry::new(date.unwrap_or(today));
            entry.calories = calories;
            entry.sleep_hours = sleep;
            entry.mood = mood;
            entry.steps = steps;
            entry.exercise_minutes = minutes;
            entry.exercise_effort = effort;
            cmd_log(&store, entry, &config)
        }
        Commands::Accept { quest_id } => cmd_accept(&store, &quest_id, &config),
        Commands::Export { out } => cmd_export(&store, &out),
        Commands::Reset { yes } => cmd_reset(&store, yes),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_snapshot(store: &JsonFileStore, today: NaiveDate, config: &Config) -> Result<()> {
    let data = store.load()?;
    let snapshot = compute_snapshot_from_log(
        &data.entries,
        &data.profile,
        &data.accepted_quests,
        today,
        &config.engine_options(),
    )?;
    print_json(&snapshot)
}

fn cmd_metric(store: &JsonFileStore, area: &str, days: usize, today: NaiveDate) -> Result<()> {
    let data = store.load()?;
    let entries = normalize_entries(&data.entries)?;
    let envelope = analyze_area(area, &entries, days, today).ok_or_else(|| {
        let known: Vec<&str> = ascend_core::analytics::analyzers()
            .iter()
            .map(|a| a.area_key)
            .collect();
        Error::Other(format!(
            "Unknown metric area '{}'. Known areas: {}",
            area,
            known.join(", ")
        ))
    })?;
    print_json(&envelope)
}

fn cmd_tdee(store: &JsonFileStore, config: &Config) -> Result<()> {
    let data = store.load()?;
    let entries = normalize_entries(&data.entries)?;
    let summary = derive_metabolics(
        &data.profile,
        &entries,
        config.metabolic.dynamic_tdee_window_days,
    );
    print_json(&summary)
}

fn cmd_log(store: &JsonFileStore, entry: DailyEntry, config: &Config) -> Result<()> {
    let date = entry.date;
    let data = update(store, config.metabolic.dynamic_tdee_window_days, |data| {
        data.upsert_entry(entry, chrono::Utc::now());
        Ok(())
    })?;

    // Surface range problems right away instead of at the next snapshot
    let mut check = data.entries[&dates::day_key(date)].clone();
    ascend_core::entries::flag_anomalies(&mut check);
    let flags: Vec<Value> = check
        .anomalies
        .iter()
        .filter_map(|f| serde_json::to_value(f).ok())
        .collect();

    print_json(&serde_json::json!({
        "logged": dates::day_key(date),
        "entries": data.entries.len(),
        "anomalies": flags,
    }))
}

fn cmd_accept(store: &JsonFileStore, quest_id: &str, config: &Config) -> Result<()> {
    update(store, config.metabolic.dynamic_tdee_window_days, |data| {
        data.accept_quest(quest_id)
    })?;
    println!("Accepted quest {}", quest_id);
    Ok(())
}

fn cmd_export(store: &JsonFileStore, out: &std::path::Path) -> Result<()> {
    let data = store.load()?;
    let entries = normalize_entries(&data.entries)?;
    let count = export_entries_csv(&entries, out)?;
    println!("Exported {} entries to {}", count, out.display());
    Ok(())
}

fn cmd_reset(store: &JsonFileStore, yes: bool) -> Result<()> {
    if !yes {
        return Err(Error::Other(
            "Reset refused: pass --yes to permanently delete all stored data".into(),
        ));
    }
    store.reset()?;
    println!("All data deleted");
    Ok(())
}
