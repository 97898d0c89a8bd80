//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one identifier per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use gridwatch_core::{HealthLevel, Priority, Severity};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ───────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Paint a maintenance priority.
pub fn paint_priority(priority: Priority, color: bool) -> String {
    let label = priority.to_string();
    if !color {
        return label;
    }
    match priority {
        Priority::Critical => label.red().bold().to_string(),
        Priority::High => label.yellow().to_string(),
        Priority::Medium => label.cyan().to_string(),
        Priority::Low => label.dimmed().to_string(),
    }
}

/// Paint a fault severity.
pub fn paint_severity(severity: Severity, color: bool) -> String {
    let label = severity.to_string();
    if !color {
        return label;
    }
    match severity {
        Severity::Critical => label.red().bold().to_string(),
        Severity::High => label.red().to_string(),
        Severity::Medium => label.yellow().to_string(),
        Severity::Low => label.dimmed().to_string(),
    }
}

/// Paint a health grade.
pub fn paint_health(level: HealthLevel, color: bool) -> String {
    let label = level.to_string();
    if !color {
        return label;
    }
    match level {
        HealthLevel::Healthy => label.green().to_string(),
        HealthLevel::Warning => label.yellow().to_string(),
        HealthLevel::Critical => label.red().bold().to_string(),
    }
}

/// A probability as a whole percentage.
pub fn percent(probability: f64) -> String {
    format!("{:.0}%", probability * 100.0)
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
///
/// - `table`: uses the `Tabled` derive to build a pretty table
/// - `json` / `json-compact`: serializes the original data via serde
/// - `yaml`: serializes via serde_yaml
/// - `plain`: calls `id_fn` on each item to emit one identifier per line
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(render_table(&rows))
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(data.iter().map(&id_fn).collect::<Vec<_>>().join("\n")),
    }
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses a custom `detail_fn` that returns a pre-formatted string,
/// since single-item detail views don't use `Tabled` derive.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => Ok(detail_fn(data)),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(id_fn(data)),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

/// A rounded table, or a placeholder line when there are no rows.
pub(crate) fn render_table<R: Tabled>(rows: &[R]) -> String {
    if rows.is_empty() {
        return "(none)".into();
    }
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    let rendered = if compact {
        serde_json::to_string(data)?
    } else {
        serde_json::to_string_pretty(data)?
    };
    Ok(rendered)
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    Ok(serde_yaml::to_string(data)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(serde::Serialize, Tabled)]
    struct Row {
        name: &'static str,
    }

    #[test]
    fn plain_output_is_one_id_per_line() {
        let rows = [Row { name: "a" }, Row { name: "b" }];
        let out = render_list(
            &OutputFormat::Plain,
            &rows,
            |r| Row { name: r.name },
            |r| r.name.to_owned(),
        )
        .unwrap_or_default();
        assert_eq!(out, "a\nb");
    }

    #[test]
    fn empty_table_renders_placeholder() {
        let rows: [Row; 0] = [];
        assert_eq!(render_table(&rows), "(none)");
    }

    #[test]
    fn colorless_labels_are_plain() {
        assert_eq!(paint_priority(Priority::Critical, false), "critical");
        assert_eq!(paint_health(HealthLevel::Warning, false), "warning");
        assert_eq!(percent(0.85), "85%");
    }
}
