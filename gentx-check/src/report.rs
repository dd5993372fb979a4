use comfy_table::{presets, Cell, ContentArrangement, Table};
use console::Style;
use gentx_types::result::{FileStatus, RunResult, RunStatus};

use crate::config::CheckConfig;
use crate::log_sink::LogTail;

pub fn style_success() -> Style {
    Style::new().green()
}

pub fn style_error() -> Style {
    Style::new().red()
}

pub fn style_warn() -> Style {
    Style::new().yellow()
}

pub fn style_bold() -> Style {
    Style::new().bold()
}

pub fn style_dim() -> Style {
    Style::new().dim()
}

/// Colour only when stdout is a terminal and `NO_COLOR` is unset.
pub fn configure_colors() {
    let enabled = std::env::var_os("NO_COLOR").is_none() && console::Term::stdout().is_term();
    console::set_colors_enabled(enabled);
}

fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Run header with the settings that matter when reading a CI log.
pub fn print_header(config: &CheckConfig) {
    let bold = style_bold();
    let dim = style_dim();

    println!();
    println!(
        "  {} {}",
        bold.apply_to("gentx validation"),
        dim.apply_to(format!("v{}", env!("CARGO_PKG_VERSION")))
    );
    let mut table = info_table();
    table.add_row(vec![Cell::new("Started"), Cell::new(timestamp())]);
    table.add_row(vec![Cell::new("Network"), Cell::new(&config.network)]);
    table.add_row(vec![Cell::new("Chain ID"), Cell::new(&config.chain_id)]);
    table.add_row(vec![Cell::new("Mode"), Cell::new(config.mode.as_str())]);
    table.add_row(vec![
        Cell::new("Minimum fee"),
        Cell::new(config.fee.min_amount.to_string()),
    ]);
    table.add_row(vec![
        Cell::new("Log file"),
        Cell::new(config.files.log_file.display()),
    ]);
    print_table(&table);
    println!();
}

/// Data table with a header row and dynamic width.
pub fn data_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(headers);
    table
}

/// Key-value rows without borders.
pub fn info_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn print_table(table: &Table) {
    for line in table.lines() {
        println!("  {}", line);
    }
}

pub fn results_table(result: &RunResult) -> Table {
    let mut table = data_table(&["File", "Status", "Message"]);
    for file in &result.results {
        let status = match file.status {
            FileStatus::Passed => style_success().apply_to("passed"),
            FileStatus::Failed => style_error().apply_to("failed"),
        };
        table.add_row(vec![
            Cell::new(&file.file),
            Cell::new(status.to_string()),
            Cell::new(&file.message),
        ]);
    }
    table
}

fn status_style(status: RunStatus) -> Style {
    match status {
        RunStatus::Passed => style_success(),
        RunStatus::Failed => style_error(),
        RunStatus::NoFiles => style_warn(),
    }
}

/// Per-file table, failed files, then the aggregate summary line.
pub fn print_result(result: &RunResult) {
    if !result.results.is_empty() {
        print_table(&results_table(result));
        println!();
    }

    if !result.failed_files.is_empty() {
        println!("  {}", style_error().bold().apply_to("Failed files:"));
        for file in &result.failed_files {
            println!("    - {}", file);
        }
        println!();
    }

    println!(
        "  {} {}",
        status_style(result.status).bold().apply_to(result.status.as_str().to_uppercase()),
        result.message
    );
    println!("  {}", style_dim().apply_to(result.summary_line()));
    println!();
}

/// Error banner for a run that could not complete.
pub fn print_fatal(message: &str) {
    println!("  {} {}", style_error().bold().apply_to("ERROR"), message);
    println!();
}

/// Plain-text log tail, used where the styled report is not printed.
pub fn log_tail_lines(tail: &LogTail) -> Vec<String> {
    let mut lines = Vec::with_capacity(tail.lines.len() + 1);
    if tail.panic_observed {
        lines.push(format!("Last {} lines of log (panic detected):", tail.lines.len()));
    } else {
        lines.push(format!("Last {} lines of log:", tail.lines.len()));
    }
    lines.extend(tail.lines.iter().map(|line| format!("  {}", line)));
    lines
}

pub fn print_log_tail(tail: &LogTail) {
    let title = if tail.panic_observed {
        style_error().bold().apply_to(format!(
            "Last {} lines of log (panic detected):",
            tail.lines.len()
        ))
    } else {
        style_bold().apply_to(format!("Last {} lines of log:", tail.lines.len()))
    };
    println!("  {}", title);
    let dim = style_dim();
    for line in &tail.lines {
        println!("    {}", dim.apply_to(line));
    }
    println!();
}

/// Log tail on stderr, keeping stdout free for machine-readable output.
pub fn eprint_log_tail(tail: &LogTail) {
    for line in log_tail_lines(tail) {
        eprintln!("{}", line);
    }
}
