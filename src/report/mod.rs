//! Report sinks for a finished run.
//!
//! - [`terminal`]: colored summary box and comfy-table listing; respects `--verbose` / `--quiet`.
//! - [`html`]: standalone HTML page rendered from an embedded Tera template.
//! - [`json`]: the [`Report`](crate::models::Report) as pretty-printed JSON.

pub mod html;
pub mod json;
pub mod terminal;

use crate::error::Error;
use crate::models::Report;

/// Receives the aggregated report and writes it somewhere.
pub trait ReportSink: Send + Sync {
    /// Publish `report`, returning a name for the produced artifact.
    fn publish(&self, report: &Report) -> Result<String, Error>;
}

#[cfg(test)]
pub(crate) mod testing {
    use chrono::Local;

    use crate::models::{
        BomFields, BomRow, PartRecord, ReplacementCandidate, Report, ReportLine, RiskSummary,
        RiskTier,
    };

    /// A small report with one healthy, one critical and one unknown part.
    pub fn sample_report() -> Report {
        let row = |n: usize, pn: &str| BomRow {
            row_number: n,
            part_number: pn.to_string(),
            fields: BomFields(vec![
                ("Ref".to_string(), format!("U{}", n)),
                ("PartNumber".to_string(), pn.to_string()),
            ]),
        };
        let record = |lifecycle: &str, stock: u64, desc: &str| PartRecord {
            distributor_part_number: None,
            manufacturer: "Texas Instruments".to_string(),
            stock,
            lifecycle_status: lifecycle.to_string(),
            description: desc.to_string(),
        };

        let lines = vec![
            ReportLine::new(
                row(1, "595-LM358DR"),
                Some(record("Active", 12000, "Op Amp Dual")),
                RiskTier::Low,
                Vec::new(),
            ),
            ReportLine::new(
                row(2, "595-SN74LS00N"),
                Some(record("Obsolete", 0, "Quad NAND <Gate> & DIP")),
                RiskTier::Critical,
                vec![ReplacementCandidate {
                    part_number: "595-SN74HC00N".to_string(),
                    manufacturer: "Texas Instruments".to_string(),
                    stock: 5400,
                    description: "Quad NAND Gate".to_string(),
                }],
            ),
            ReportLine::new(row(3, "BOGUS-1"), None, RiskTier::NotFound, Vec::new()),
        ];

        Report {
            generated_at: Local::now(),
            source: "board.csv".to_string(),
            distributor: "Mouser".to_string(),
            summary: RiskSummary::tally(&lines),
            lines,
        }
    }
}
