//! Printing of adapter results.

use anyhow::{Context, Result};
use ccd::{Source, Sourced};
use console::style;
use serde::Serialize;

/// Prints `result` as pretty JSON on stdout and its source on stderr.
pub fn print_sourced<T: Serialize>(function: &str, result: &Sourced<T>) -> Result<()> {
    eprintln!("{}", source_line(function, result.source));

    let json = serde_json::to_string_pretty(result).context("failed to serialize result")?;
    println!("{json}");
    Ok(())
}

/// One-line marker telling the operator where data came from.
pub fn source_line(function: &str, source: Source) -> String {
    match source {
        Source::Live => format!("{} {} ({function})", style("✓").green().bold(), style("live").green()),
        Source::Simulated => format!(
            "{} {} ({function}): telephony server unavailable, showing fallback data",
            style("⚠").yellow(),
            style("simulated").yellow().bold()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_line_names_function_and_source() {
        let live = console::strip_ansi_codes(&source_line("agent_status", Source::Live)).to_string();
        assert_eq!(live, "✓ live (agent_status)");

        let simulated =
            console::strip_ansi_codes(&source_line("lead_search", Source::Simulated)).to_string();
        assert!(simulated.starts_with("⚠ simulated (lead_search)"));
    }
}
