//! SQL Sandbox Interactive REPL
//!
//! Runs batches against an in-process engine. Input is buffered until a
//! line ends with `;` (or is blank), then executed as one batch.

use anyhow::Context;
use colored::Colorize;
use sqlsandbox::config::LogFormat;
use sqlsandbox::{EngineConfig, QueryResult, SqlEngine, SqlValue};
use std::io::{self, BufRead, Write};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const VERSION: &str = env!("CARGO_PKG_VERSION");

struct ReplState {
    engine: SqlEngine,
    json_output: bool,
    buffer: String,
}

fn init_tracing(config: &EngineConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("sqlsandbox={}", config.logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    match config.logging.format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init(),
        LogFormat::Compact => registry
            .with(tracing_subscriber::fmt::layer().compact().with_writer(io::stderr))
            .init(),
    }
}

fn print_welcome(state: &ReplState) {
    println!("{}", format!("SQL Sandbox REPL v{}", VERSION).bright_cyan().bold());
    println!(
        "{}",
        "Type .help for commands, .exit to quit. End statements with ';'.".bright_cyan()
    );
    println!("Connected to {}", state.engine.current_database().cyan());
    println!();
}

fn print_help() {
    println!("\n{}", "Available Commands:".bright_yellow().bold());
    println!("  {}  - Show this help message", ".help".green());
    println!("  {}  - Exit REPL", ".exit / .quit".green());
    println!("  {}  - Show tables of the current database", ".schema".green());
    println!("  {}  - List databases", ".databases".green());
    println!("  {}  - Restore all databases to their seed data", ".reset".green());
    println!("  {}  - Toggle raw JSON output", ".json".green());
    println!();
    println!("{}", "Query Examples:".bright_yellow().bold());
    println!("  {}", "SELECT TOP 5 * FROM STUDENTS ORDER BY GPA DESC;".cyan());
    println!("  {}", "USE ShopDB;".cyan());
    println!("  {}", "SELECT c.NAME, COUNT(*) FROM CUSTOMERS c JOIN ORDERS o ON o.CUSTOMER_ID = c.CUSTOMER_ID GROUP BY c.NAME;".cyan());
    println!();
}

/// Returns `false` when the REPL should exit.
fn execute_command(state: &mut ReplState, command: &str) -> anyhow::Result<bool> {
    match command {
        ".help" => print_help(),
        ".exit" | ".quit" => return Ok(false),
        ".schema" => {
            let snapshot = state.engine.schema().context("reading schema")?;
            println!("\n{}", snapshot.current_database.bright_yellow().bold());
            for table in &snapshot.tables {
                let columns: Vec<String> = table
                    .columns
                    .iter()
                    .map(|c| match c.key_role {
                        Some(_) => format!("{} {} PK", c.name, c.data_type),
                        None => format!("{} {}", c.name, c.data_type),
                    })
                    .collect();
                println!("  {} ({})", table.name.green(), columns.join(", ").dimmed());
            }
            println!();
        }
        ".databases" => {
            let current = state.engine.current_database();
            for name in state.engine.database_names() {
                let marker = if name == current { "*" } else { " " };
                println!("  {} {}", marker.green(), name);
            }
        }
        ".reset" => {
            let result = state.engine.reset();
            print_result(state, &result)?;
        }
        ".json" => {
            state.json_output = !state.json_output;
            let mode = if state.json_output { "on" } else { "off" };
            println!("JSON output {}", mode.cyan());
        }
        other => println!("{} Unknown command: {}", "Error:".red(), other),
    }
    Ok(true)
}

fn print_result(state: &ReplState, result: &QueryResult) -> anyhow::Result<()> {
    if state.json_output {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    match result {
        QueryResult::Rows { columns, rows } => {
            print_table(columns, rows);
            let noun = if rows.len() == 1 { "row" } else { "rows" };
            println!("{}", format!("({} {})", rows.len(), noun).dimmed());
        }
        QueryResult::Status { message, .. } => println!("{}", message.green()),
        QueryResult::Failed { error, .. } => println!("{} {}", "Error:".red(), error),
    }
    println!();
    Ok(())
}

fn print_table(columns: &[String], rows: &[Vec<SqlValue>]) {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|v| v.to_string()).collect())
        .collect();

    let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| format!("{:<w$}", c, w = *w))
        .collect();
    println!("{}", header.join(" | ").bright_yellow().bold());

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    println!("{}", rule.join("-+-").dimmed());

    for row in &cells {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<w$}", c, w = *w))
            .collect();
        println!("{}", line.join(" | "));
    }
}

fn prompt(state: &ReplState) -> String {
    if state.buffer.is_empty() {
        format!("{}> ", state.engine.current_database()).bright_green().bold().to_string()
    } else {
        "   ... ".dimmed().to_string()
    }
}

fn main() -> anyhow::Result<()> {
    let config = EngineConfig::from_env().context("loading configuration")?;
    init_tracing(&config);

    let mut state = ReplState {
        engine: SqlEngine::with_config(config).context("creating engine")?,
        json_output: false,
        buffer: String::new(),
    };

    print_welcome(&state);

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("{}", prompt(&state));
        io::stdout().flush()?;

        let line = match lines.next() {
            Some(line) => line?,
            None => break,
        };
        let trimmed = line.trim();

        if state.buffer.is_empty() && trimmed.starts_with('.') {
            if !execute_command(&mut state, trimmed)? {
                break;
            }
            continue;
        }

        if !trimmed.is_empty() {
            state.buffer.push_str(&line);
            state.buffer.push('\n');
        }
        if state.buffer.is_empty() || !(trimmed.is_empty() || trimmed.ends_with(';')) {
            continue;
        }

        let batch = std::mem::take(&mut state.buffer);
        let result = state.engine.execute(&batch);
        print_result(&state, &result)?;
    }

    println!("\n{}", "Goodbye!".bright_cyan());
    Ok(())
}
