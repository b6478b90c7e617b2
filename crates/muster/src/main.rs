//! `muster` - CLI for emergency check-ins
//!
//! This binary records check-ins against the community roster and prints
//! the accountability report.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::Context;
use clap::Parser;

use muster::cli::{
    Cli, ClearCommand, Command, ConfigCommand, ListCommand, OutputFormat, ReportCommand,
    SubmitCommand, ValidateCommand,
};
use muster::report::{CategoryBuckets, Report};
use muster::service::SubmitResponse;
use muster::{init_logging, CheckIn, CheckInService, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    match cli.command {
        Command::Validate(cmd) => handle_validate(&open_service(&config)?, &cmd),
        Command::Submit(cmd) => handle_submit(&open_service(&config)?, &cmd).await,
        Command::List(cmd) => handle_list(&open_service(&config)?, &cmd).await,
        Command::Clear(cmd) => handle_clear(&open_service(&config)?, &cmd).await,
        Command::Report(cmd) => handle_report(&open_service(&config)?, &cmd).await,
        Command::Status(cmd) => handle_status(&open_service(&config)?, cmd.json).await,
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
    }
}

fn open_service(config: &Config) -> anyhow::Result<CheckInService> {
    CheckInService::from_config(config).context("opening check-in store")
}

fn handle_validate(service: &CheckInService, cmd: &ValidateCommand) -> anyhow::Result<()> {
    let response = service.validate_user(&cmd.id)?;
    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else if let Some(user) = &response.user {
        println!("Authorized: {} <{}> ({})", user.display_name, user.email, user.id);
    } else {
        println!("Not authorized: '{}' is not on the roster", cmd.id.trim());
    }
    Ok(())
}

async fn handle_submit(service: &CheckInService, cmd: &SubmitCommand) -> anyhow::Result<()> {
    let response = SubmitResponse::from_outcome(service.submit_check_in(cmd.to_request()).await)?;
    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else if let Some(sequence_id) = response.sequence_id {
        println!("Check-in recorded (ID: {sequence_id})");
    } else {
        println!(
            "Check-in rejected: {}",
            response.reason.as_deref().unwrap_or("unknown reason")
        );
    }
    Ok(())
}

async fn handle_list(service: &CheckInService, cmd: &ListCommand) -> anyhow::Result<()> {
    let records = service.list_check_ins().await?;
    match cmd.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
        OutputFormat::Plain => {
            for record in &records {
                println!(
                    "#{} {} {} ({}) at {}{}",
                    record.sequence_id,
                    record.submitted_at.to_rfc3339(),
                    record.display_name,
                    record.user_id,
                    record.location,
                    notes_suffix(&record.notes)
                );
            }
        }
        OutputFormat::Table => print_check_in_table(&records),
    }
    Ok(())
}

fn notes_suffix(notes: &str) -> String {
    if notes.is_empty() {
        String::new()
    } else {
        format!(" - {notes}")
    }
}

fn print_check_in_table(records: &[CheckIn]) {
    if records.is_empty() {
        println!("No check-ins recorded.");
        return;
    }

    println!(
        "{:>5}  {:<20}  {:<10}  {:<24}  {:<20}  NOTES",
        "ID", "SUBMITTED", "USER", "NAME", "LOCATION"
    );
    for record in records {
        println!(
            "{:>5}  {:<20}  {:<10}  {:<24}  {:<20}  {}",
            record.sequence_id,
            record.submitted_at.format("%Y-%m-%d %H:%M:%S"),
            record.user_id,
            record.display_name,
            record.location,
            record.notes
        );
    }
    println!();
    println!("{} check-ins", records.len());
}

async fn handle_clear(service: &CheckInService, cmd: &ClearCommand) -> anyhow::Result<()> {
    if !cmd.yes {
        println!("This will delete every recorded check-in.");
        println!("Use --yes to confirm.");
        return Ok(());
    }

    let response = service.clear_check_ins().await?;
    println!("{}", response.message);
    Ok(())
}

async fn handle_report(service: &CheckInService, cmd: &ReportCommand) -> anyhow::Result<()> {
    let report = service.build_accountability_report().await?;
    match cmd.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Plain | OutputFormat::Table => print_report(&report),
    }
    Ok(())
}

fn print_report(report: &Report) {
    let stats = &report.stats;
    println!("Accountability Report");
    println!("=====================");
    println!("  Total users:        {}", stats.total_users);
    println!("  Checked in:         {}", stats.total_checked_in);
    println!("  Not checked in:     {}", stats.total_not_checked_in);
    println!();
    print_category("Staff", stats.staff.total, &report.users.staff);
    print_category("Students", stats.students.total, &report.users.students);
}

fn print_category(title: &str, total: usize, buckets: &CategoryBuckets) {
    println!("[{title}] {total} total");
    println!("  Checked in ({}):", buckets.checked_in.len());
    for entry in &buckets.checked_in {
        if let Some(check_in) = &entry.check_in {
            println!(
                "    {} ({}) at {}, {}{}",
                entry.display_name,
                entry.id,
                check_in.location,
                check_in.submitted_at.format("%Y-%m-%d %H:%M"),
                notes_suffix(&check_in.notes)
            );
        }
    }
    println!("  Not checked in ({}):", buckets.not_checked_in.len());
    for entry in &buckets.not_checked_in {
        println!("    {} ({}) {}", entry.display_name, entry.id, entry.email);
    }
    println!();
}

async fn handle_status(service: &CheckInService, json: bool) -> anyhow::Result<()> {
    let status = service.status().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("muster status");
        println!("-------------");
        println!("Backend:       {}", status.backend);
        if let Some(path) = &status.database_path {
            println!("Database:      {}", path.display());
        }
        println!("Roster:        {} users", status.roster_size);
        println!("Staff/faculty: {} members", status.staff_size);
        println!("Check-ins:     {}", status.check_in_count);
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Directory]");
                println!("  Roster path:        {}", config.roster_path().display());
                for path in config.staff_paths() {
                    println!("  Staff export:       {}", path.display());
                }
                println!("  Header token:       {}", config.directory.header_token);
                println!("  Group marker:       {}", config.directory.group_marker);
                println!();
                println!("[Storage]");
                println!("  Backend:            {}", config.storage.backend);
                println!("  Database path:      {}", config.database_path().display());
                println!("  List key:           {}", config.storage.list_key);
                println!("  Counter key:        {}", config.storage.counter_key);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            Config::load_from(Some(path.clone()))
                .with_context(|| format!("invalid configuration in {}", path.display()))?;
            println!("Configuration is valid.");
        }
    }
    Ok(())
}
