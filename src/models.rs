use std::collections::BTreeMap;

use chrono::{DateTime, Local};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::distributor::TransportFailure;

/// Placeholder used in report lines when a lookup yielded no record.
pub const NOT_AVAILABLE: &str = "N/A";

/// Normalized result of an exact part lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct PartRecord {
    /// The distributor's own part number, when the response carried one.
    pub distributor_part_number: Option<String>,
    pub manufacturer: String,
    pub stock: u64,
    pub lifecycle_status: String,
    pub description: String,
}

/// Tagged outcome of a lookup: data, a well-formed empty answer, or a failed call.
#[derive(Debug, Clone)]
pub enum LookupOutcome {
    Found(PartRecord),
    NoData,
    TransportFailure(TransportFailure),
}

impl LookupOutcome {
    pub fn record(&self) -> Option<&PartRecord> {
        match self {
            LookupOutcome::Found(record) => Some(record),
            _ => None,
        }
    }

    pub fn into_record(self) -> Option<PartRecord> {
        match self {
            LookupOutcome::Found(record) => Some(record),
            _ => None,
        }
    }
}

/// A keyword-search hit before replacement filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCandidate {
    pub part_number: String,
    pub manufacturer: String,
    pub stock: u64,
    /// Raw lifecycle text; empty when the distributor left it out.
    pub lifecycle_status: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplacementCandidate {
    pub part_number: String,
    pub manufacturer: String,
    pub stock: u64,
    pub description: String,
}

impl From<RawCandidate> for ReplacementCandidate {
    fn from(raw: RawCandidate) -> Self {
        ReplacementCandidate {
            part_number: raw.part_number,
            manufacturer: raw.manufacturer,
            stock: raw.stock,
            description: raw.description,
        }
    }
}

/// Supply-chain risk tier. Declaration order is the summary display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum RiskTier {
    Low,
    Medium,
    High,
    Critical,
    #[serde(rename = "Not Found")]
    NotFound,
    #[serde(rename = "API Error")]
    ApiError,
}

impl RiskTier {
    pub const ALL: [RiskTier; 6] = [
        RiskTier::Low,
        RiskTier::Medium,
        RiskTier::High,
        RiskTier::Critical,
        RiskTier::NotFound,
        RiskTier::ApiError,
    ];

    /// High and Critical parts trigger a replacement search.
    pub fn needs_replacement(self) -> bool {
        matches!(self, RiskTier::High | RiskTier::Critical)
    }

    /// Class name used by the HTML report stylesheet.
    pub fn css_class(self) -> &'static str {
        match self {
            RiskTier::Low => "risk-low",
            RiskTier::Medium => "risk-medium",
            RiskTier::High => "risk-high",
            RiskTier::Critical | RiskTier::ApiError => "risk-critical",
            RiskTier::NotFound => "risk-not-found",
        }
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskTier::Low => write!(f, "Low"),
            RiskTier::Medium => write!(f, "Medium"),
            RiskTier::High => write!(f, "High"),
            RiskTier::Critical => write!(f, "Critical"),
            RiskTier::NotFound => write!(f, "Not Found"),
            RiskTier::ApiError => write!(f, "API Error"),
        }
    }
}

/// Source columns of a BOM row, kept in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BomFields(pub Vec<(String, String)>);

impl BomFields {
    #[cfg(test)]
    pub fn get(&self, column: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }
}

impl Serialize for BomFields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BomRow {
    /// 1-based position among the data rows.
    pub row_number: usize,
    pub part_number: String,
    pub fields: BomFields,
}

/// One enriched BOM row, as handed to report rendering.
#[derive(Debug, Clone, Serialize)]
pub struct ReportLine {
    pub row_number: usize,
    pub part_number: String,
    pub fields: BomFields,
    pub distributor_part_number: Option<String>,
    pub manufacturer: String,
    pub stock: u64,
    pub lifecycle_status: String,
    pub description: String,
    pub risk: RiskTier,
    pub risk_class: &'static str,
    pub replacements: Vec<ReplacementCandidate>,
}

impl ReportLine {
    pub fn new(
        row: BomRow,
        record: Option<PartRecord>,
        risk: RiskTier,
        replacements: Vec<ReplacementCandidate>,
    ) -> Self {
        let (distributor_part_number, manufacturer, stock, lifecycle_status, description) =
            match record {
                Some(r) => (
                    r.distributor_part_number,
                    r.manufacturer,
                    r.stock,
                    r.lifecycle_status,
                    r.description,
                ),
                None => (
                    None,
                    NOT_AVAILABLE.to_string(),
                    0,
                    NOT_AVAILABLE.to_string(),
                    NOT_AVAILABLE.to_string(),
                ),
            };

        ReportLine {
            row_number: row.row_number,
            part_number: row.part_number,
            fields: row.fields,
            distributor_part_number,
            manufacturer,
            stock,
            lifecycle_status,
            description,
            risk,
            risk_class: risk.css_class(),
            replacements,
        }
    }
}

/// Line count per risk tier; every tier is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskSummary(BTreeMap<RiskTier, usize>);

impl RiskSummary {
    pub fn tally(lines: &[ReportLine]) -> Self {
        let mut counts: BTreeMap<RiskTier, usize> =
            RiskTier::ALL.iter().map(|tier| (*tier, 0)).collect();
        for line in lines {
            *counts.entry(line.risk).or_insert(0) += 1;
        }
        RiskSummary(counts)
    }

    #[cfg(test)]
    pub fn count(&self, tier: RiskTier) -> usize {
        self.0.get(&tier).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RiskTier, usize)> + '_ {
        self.0.iter().map(|(tier, count)| (*tier, *count))
    }
}

impl Serialize for RiskSummary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (tier, count) in &self.0 {
            map.serialize_entry(&tier.to_string(), count)?;
        }
        map.end()
    }
}

/// Everything a report sink needs to render one run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Local>,
    pub source: String,
    pub distributor: String,
    pub summary: RiskSummary,
    pub lines: Vec<ReportLine>,
}
