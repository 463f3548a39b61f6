//! `rollbook` - CLI for the student record store
//!
//! This binary is a thin caller of [`rollbook::RecordStore`]. It owns the
//! checks the store leaves to its callers: required fields and duplicate ids.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::Path;

use anyhow::{bail, Context};
use chrono::Local;
use clap::Parser;

use rollbook::cli::{
    AddCommand, Cli, Command, ConfigCommand, DeleteCommand, OutputFormat, SearchCommand,
    ShowCommand, StatsCommand, UpdateCommand,
};
use rollbook::{init_logging, record, validate_new_record, Config, Record, RecordStore};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone())?;
    let open = || open_store(cli.data_file.as_deref(), &config);

    match cli.command {
        Command::Add(cmd) => handle_add(&mut open()?, &cmd),
        Command::Show(cmd) => handle_show(&open()?, &cmd),
        Command::List(cmd) => {
            let store = open()?;
            let records: Vec<&Record> = store.iter().collect();
            print_records(&records, cmd.format)
        }
        Command::Update(cmd) => handle_update(&mut open()?, &cmd),
        Command::Delete(cmd) => handle_delete(&mut open()?, &cmd),
        Command::Search(cmd) => handle_search(&open()?, &cmd),
        Command::Stats(cmd) => handle_stats(&open()?, &cmd),
        Command::Grades => {
            print_grades(&open()?);
            Ok(())
        }
        Command::Today => {
            print_today(&open()?, &config);
            Ok(())
        }
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

/// Open the store named on the command line, or the configured one.
///
/// Only the default location has its directory created; an explicit path is
/// used as given.
fn open_store(data_file: Option<&Path>, config: &Config) -> anyhow::Result<RecordStore> {
    let data_file = match data_file {
        Some(path) => path.to_path_buf(),
        None => {
            config.create_default_data_dir()?;
            config.data_file()
        }
    };

    RecordStore::open_with(&data_file, config.write_options())
        .with_context(|| format!("cannot open student data at {}", data_file.display()))
}

fn handle_show(store: &RecordStore, cmd: &ShowCommand) -> anyhow::Result<()> {
    let Some(record) = store.get(&cmd.id) else {
        bail!("student {} not found", cmd.id);
    };
    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&record_json(record)?)?);
    } else {
        print_detail(record);
    }
    Ok(())
}

fn handle_search(store: &RecordStore, cmd: &SearchCommand) -> anyhow::Result<()> {
    let records: Vec<&Record> = store
        .search(&cmd.query)
        .into_iter()
        .map(|(_, record)| record)
        .collect();
    print_records(&records, cmd.format)?;
    if cmd.format != OutputFormat::Json {
        println!("Found {} student(s)", records.len());
    }
    Ok(())
}

fn handle_stats(store: &RecordStore, cmd: &StatsCommand) -> anyhow::Result<()> {
    let stats = store.stats(&record::today());
    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("Total students:  {}", stats.total);
        println!("Active grades:   {}", stats.distinct_grades);
        println!("Added today:     {}", stats.added_today);
    }
    Ok(())
}

fn print_grades(store: &RecordStore) {
    let grades = store.grade_breakdown();
    println!("Students by grade:");
    for (grade, count) in &grades {
        let label = if grade.is_empty() { "(none)" } else { *grade };
        println!("  {label}: {count} student(s)");
    }
    println!("Total grades: {}", grades.len());
}

fn print_today(store: &RecordStore, config: &Config) {
    let heading = Local::now().format(&config.display.date_format).to_string();
    let today = store.created_on(&record::today());
    if today.is_empty() {
        println!("No students were added today.");
    } else {
        println!("Students added today ({heading}):");
        for (i, record) in today.iter().enumerate() {
            println!("  {}. {}", i + 1, record.name);
        }
    }
}

fn handle_add(store: &mut RecordStore, cmd: &AddCommand) -> anyhow::Result<()> {
    let id = cmd.id.trim();
    let name = cmd.name.trim();
    validate_new_record(id, name)?;

    if store.contains(id) {
        bail!("student id {id} already exists");
    }

    store.add(
        id,
        name,
        cmd.grade.trim(),
        cmd.email.trim(),
        cmd.phone.trim(),
    )?;
    println!("Added student {id}");
    Ok(())
}

fn handle_update(store: &mut RecordStore, cmd: &UpdateCommand) -> anyhow::Result<()> {
    if !store.update(&cmd.id, &cmd.to_update())? {
        bail!("student {} not found", cmd.id);
    }
    println!("Updated student {}", cmd.id);
    Ok(())
}

fn handle_delete(store: &mut RecordStore, cmd: &DeleteCommand) -> anyhow::Result<()> {
    let Some(record) = store.get(&cmd.id) else {
        bail!("student {} not found", cmd.id);
    };

    if !cmd.yes {
        println!("This will delete {} ({}).", record.name, record.id);
        println!("This action cannot be undone. Use --yes to confirm.");
        return Ok(());
    }

    if !store.delete(&cmd.id)? {
        bail!("student {} not found", cmd.id);
    }
    println!("Deleted student {}", cmd.id);
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
                println!("[Storage]");
                println!("  Data file:          {}", config.data_file().display());
                println!("  Atomic writes:      {}", config.storage.atomic_writes);
                println!("  Pretty JSON:        {}", config.storage.pretty);
                println!();
                println!("[Display]");
                println!("  Date format:        {}", config.display.date_format);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}

/// A record as a JSON object, with its id included.
fn record_json(record: &Record) -> anyhow::Result<serde_json::Value> {
    let mut value = serde_json::to_value(record)?;
    value["id"] = serde_json::Value::String(record.id.clone());
    Ok(value)
}

fn blank(field: Option<&str>) -> &str {
    field.unwrap_or_default()
}

fn print_detail(record: &Record) {
    println!("ID:       {}", record.id);
    println!("Name:     {}", record.name);
    println!("Grade:    {}", blank(record.grade.as_deref()));
    println!("Email:    {}", blank(record.email.as_deref()));
    println!("Phone:    {}", blank(record.phone.as_deref()));
    println!("Created:  {}", blank(record.created.as_deref()));
    if let Some(modified) = &record.modified {
        println!("Modified: {modified}");
    }
}

fn print_records(records: &[&Record], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let values = records
                .iter()
                .map(|record| record_json(record))
                .collect::<anyhow::Result<Vec<_>>>()?;
            println!("{}", serde_json::to_string_pretty(&values)?);
        }
        OutputFormat::Plain => {
            for record in records {
                println!(
                    "{}\t{}\t{}\t{}\t{}\t{}",
                    record.id,
                    record.name,
                    blank(record.grade.as_deref()),
                    blank(record.email.as_deref()),
                    blank(record.phone.as_deref()),
                    blank(record.created.as_deref())
                );
            }
        }
        OutputFormat::Table => print_table(records),
    }
    Ok(())
}

fn print_table(records: &[&Record]) {
    const HEADERS: [&str; 6] = ["ID", "NAME", "GRADE", "EMAIL", "PHONE", "CREATED"];

    let rows: Vec<[&str; 6]> = records
        .iter()
        .map(|r| {
            [
                r.id.as_str(),
                r.name.as_str(),
                blank(r.grade.as_deref()),
                blank(r.email.as_deref()),
                blank(r.phone.as_deref()),
                blank(r.created.as_deref()),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_row = |cells: &[&str; 6]| {
        cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    println!("{}", format_row(&HEADERS));
    for row in &rows {
        println!("{}", format_row(row));
    }
}
