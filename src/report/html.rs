use std::path::PathBuf;

use serde::Serialize;
use tera::{Context, Tera};

use super::ReportSink;
use crate::bom::PART_NUMBER_COLUMN;
use crate::error::Error;
use crate::models::{Report, ReportLine};

pub const DEFAULT_OUTPUT: &str = "bom_risk_report.html";

// The `.html` suffix turns on Tera's auto-escaping.
const TEMPLATE_NAME: &str = "report.html";
const TEMPLATE: &str = include_str!("../../templates/report.html.tera");

/// Renders the report to a standalone HTML file.
pub struct HtmlSink {
    pub output: PathBuf,
}

impl ReportSink for HtmlSink {
    fn publish(&self, report: &Report) -> Result<String, Error> {
        let html = render(report)?;
        std::fs::write(&self.output, html).map_err(|e| {
            Error::report(format!("failed to write {}: {}", self.output.display(), e))
        })?;
        Ok(self.output.display().to_string())
    }
}

#[derive(Serialize)]
struct SummaryCard {
    label: String,
    class: &'static str,
    count: usize,
}

#[derive(Serialize)]
struct Field<'a> {
    name: &'a str,
    value: &'a str,
}

#[derive(Serialize)]
struct LineView<'a> {
    line: &'a ReportLine,
    risk_label: String,
    /// Source columns other than the part number, in file order.
    fields: Vec<Field<'a>>,
}

pub fn render(report: &Report) -> Result<String, Error> {
    let mut tera = Tera::default();
    tera.add_raw_template(TEMPLATE_NAME, TEMPLATE)
        .map_err(|e| Error::report(e.to_string()))?;

    let summary: Vec<SummaryCard> = report
        .summary
        .iter()
        .map(|(tier, count)| SummaryCard {
            label: tier.to_string(),
            class: tier.css_class(),
            count,
        })
        .collect();

    let lines: Vec<LineView> = report
        .lines
        .iter()
        .map(|line| LineView {
            line,
            risk_label: line.risk.to_string(),
            fields: line
                .fields
                .0
                .iter()
                .filter(|(name, _)| name != PART_NUMBER_COLUMN)
                .map(|(name, value)| Field { name, value })
                .collect(),
        })
        .collect();

    let mut context = Context::new();
    context.insert("source", &report.source);
    context.insert("distributor", &report.distributor);
    context.insert(
        "report_date",
        &report.generated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
    );
    context.insert("summary", &summary);
    context.insert("lines", &lines);

    tera.render(TEMPLATE_NAME, &context)
        .map_err(|e| Error::report(format!("template rendering failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::testing::sample_report;

    #[test]
    fn test_render_contains_summary_and_rows() {
        let html = render(&sample_report()).unwrap();
        assert!(html.contains("board.csv"));
        assert!(html.contains("595-LM358DR"));
        assert!(html.contains("595-SN74HC00N"));
        assert!(html.contains("API Error"));
        assert!(html.contains(r#"class="risk-critical""#));
        assert!(html.contains("Ref: U2"));
        assert!(!html.contains("PartNumber: 595"));
    }

    #[test]
    fn test_render_escapes_descriptions() {
        let html = render(&sample_report()).unwrap();
        assert!(html.contains("Quad NAND &lt;Gate&gt; &amp; DIP"));
        assert!(!html.contains("<Gate>"));
    }

    #[test]
    fn test_publish_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.html");
        let sink = HtmlSink {
            output: output.clone(),
        };
        let artifact = sink.publish(&sample_report()).unwrap();
        assert!(artifact.ends_with("out.html"));
        assert!(std::fs::read_to_string(output).unwrap().starts_with("<!DOCTYPE html>"));
    }
}
