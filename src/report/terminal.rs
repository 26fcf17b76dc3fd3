use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use super::ReportSink;
use crate::error::Error;
use crate::models::{Report, ReportLine, RiskTier};

/// Prints the report to stdout.
pub struct TerminalSink {
    /// Show every line, not only the ones needing attention.
    pub verbose: bool,
    /// Only print the one-line summary.
    pub quiet: bool,
}

impl ReportSink for TerminalSink {
    fn publish(&self, report: &Report) -> Result<String, Error> {
        render(report, self.verbose, self.quiet);
        Ok("terminal".to_string())
    }
}

/// Render a colored terminal report.
pub fn render(report: &Report, verbose: bool, quiet: bool) {
    let summary = &report.summary;

    if quiet {
        println!("{}", summary_line(report));
        return;
    }

    println!("\n {} v{}", "bom-risk".bold(), env!("CARGO_PKG_VERSION"));
    println!(
        " BOM: {}  (distributor: {})\n",
        report.source, report.distributor
    );

    println!(" ┌────────────────────────────────────────────────────┐");
    println!(" │  {:<48} │", "SUMMARY".bold());
    println!(
        " │  {:<48} │",
        format!("Total parts        : {}", summary.total())
    );
    for (tier, count) in summary.iter() {
        println!(
            " │  {:<48} │",
            format!("{}  {:<15}: {:>4}", tier_marker(tier), tier.to_string(), count)
        );
    }
    println!(" └────────────────────────────────────────────────────┘\n");

    let attention: Vec<&ReportLine> = report
        .lines
        .iter()
        .filter(|l| needs_attention(l.risk))
        .collect();

    if !attention.is_empty() {
        println!(" {} Parts requiring attention:\n", "[RISK]".red().bold());
        render_table(&attention);
        println!();
    }

    if verbose {
        let rest: Vec<&ReportLine> = report
            .lines
            .iter()
            .filter(|l| !needs_attention(l.risk))
            .collect();
        if !rest.is_empty() {
            println!(" {} Remaining parts:\n", "[OK]".green().bold());
            render_table(&rest);
            println!();
        }
    }
}

/// `Total: N  Low: ..  Medium: ..` in one line.
pub fn summary_line(report: &Report) -> String {
    let mut parts = vec![format!("Total: {}", report.summary.total())];
    for (tier, count) in report.summary.iter() {
        parts.push(format!("{}: {}", tier, colorize(&count.to_string(), tier)));
    }
    parts.join("  ")
}

fn needs_attention(tier: RiskTier) -> bool {
    !matches!(tier, RiskTier::Low | RiskTier::Medium)
}

fn tier_marker(tier: RiskTier) -> ColoredString {
    match tier {
        RiskTier::Low => "✓".green(),
        RiskTier::Medium => "•".yellow(),
        RiskTier::High => "⚠".bright_red(),
        RiskTier::Critical => "✗".red(),
        RiskTier::NotFound => "?".dimmed(),
        RiskTier::ApiError => "!".magenta(),
    }
}

fn colorize(text: &str, tier: RiskTier) -> ColoredString {
    match tier {
        RiskTier::Low => text.green(),
        RiskTier::Medium => text.yellow(),
        RiskTier::High => text.bright_red(),
        RiskTier::Critical => text.red(),
        RiskTier::NotFound => text.dimmed(),
        RiskTier::ApiError => text.magenta(),
    }
}

fn tier_color(tier: RiskTier) -> Color {
    match tier {
        RiskTier::Low => Color::Green,
        RiskTier::Medium => Color::Yellow,
        RiskTier::High => Color::DarkRed,
        RiskTier::Critical => Color::Red,
        RiskTier::NotFound => Color::DarkGrey,
        RiskTier::ApiError => Color::Magenta,
    }
}

fn render_table(lines: &[&ReportLine]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("#").add_attribute(Attribute::Bold),
            Cell::new("Part Number").add_attribute(Attribute::Bold),
            Cell::new("Manufacturer").add_attribute(Attribute::Bold),
            Cell::new("Stock").add_attribute(Attribute::Bold),
            Cell::new("Lifecycle").add_attribute(Attribute::Bold),
            Cell::new("Risk").add_attribute(Attribute::Bold),
            Cell::new("Replacements").add_attribute(Attribute::Bold),
        ]);

    for line in lines {
        table.add_row(vec![
            Cell::new(line.row_number).set_alignment(CellAlignment::Right),
            Cell::new(&line.part_number),
            Cell::new(&line.manufacturer),
            Cell::new(line.stock).set_alignment(CellAlignment::Right),
            Cell::new(&line.lifecycle_status),
            Cell::new(line.risk.to_string()).fg(tier_color(line.risk)),
            Cell::new(replacement_cell(line)),
        ]);
    }

    println!("{}", table);
}

fn replacement_cell(line: &ReportLine) -> String {
    if !line.risk.needs_replacement() {
        return String::new();
    }
    if line.replacements.is_empty() {
        return "none found".to_string();
    }
    line.replacements
        .iter()
        .map(|r| format!("{} ({}, {} in stock)", r.part_number, r.manufacturer, r.stock))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::testing::sample_report;

    #[test]
    fn test_summary_line_lists_every_tier() {
        colored::control::set_override(false);
        let line = summary_line(&sample_report());
        assert!(line.starts_with("Total: 3"));
        assert!(line.contains("Critical: 1"));
        assert!(line.contains("Not Found: 1"));
        assert!(line.contains("API Error: 0"));
    }

    #[test]
    fn test_replacement_cell() {
        let report = sample_report();
        assert_eq!(replacement_cell(&report.lines[0]), "");
        assert_eq!(
            replacement_cell(&report.lines[1]),
            "595-SN74HC00N (Texas Instruments, 5400 in stock)"
        );
    }
}
