use std::path::PathBuf;

use clap::Parser;

use crate::distributor::DistributorKind;
use crate::models::RiskTier;

#[derive(Parser, Debug)]
#[command(
    name = "bom-risk",
    about = "Enrich a bill of materials with distributor data and score supply-chain risk",
    version
)]
pub struct Cli {
    /// BOM file (CSV with a PartNumber column)
    pub bom: PathBuf,

    /// Config file [default: ./.bom-risk/config.toml, fallback ~/.config/bom-risk/config.toml]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Use this distributor instead of the first one with a configured key
    #[arg(long, value_name = "NAME")]
    pub distributor: Option<DistributorArg>,

    /// Report format
    #[arg(long, default_value = "terminal", value_name = "FORMAT")]
    pub report: ReportFormat,

    /// Output file for json/html reports [html default: bom_risk_report.html]
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Rows processed concurrently (overrides [pipeline] concurrency)
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Exit with code 1 when any part reaches this risk level
    #[arg(long, default_value = "never", value_name = "LEVEL")]
    pub fail_on: FailOn,

    /// Show all parts (not just risky ones)
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print summary line
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum ReportFormat {
    Terminal,
    Json,
    Html,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum DistributorArg {
    Mouser,
    Digikey,
    Farnell,
    Lcsc,
}

impl From<&DistributorArg> for DistributorKind {
    fn from(arg: &DistributorArg) -> Self {
        match arg {
            DistributorArg::Mouser => DistributorKind::Mouser,
            DistributorArg::Digikey => DistributorKind::DigiKey,
            DistributorArg::Farnell => DistributorKind::Farnell,
            DistributorArg::Lcsc => DistributorKind::Lcsc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, clap::ValueEnum)]
pub enum FailOn {
    Never,
    High,
    Critical,
}

impl FailOn {
    /// Whether a line at `tier` should fail the run.
    pub fn trips(self, tier: RiskTier) -> bool {
        match self {
            FailOn::Never => false,
            FailOn::High => matches!(tier, RiskTier::High | RiskTier::Critical),
            FailOn::Critical => tier == RiskTier::Critical,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::try_parse_from(["bom-risk", "board.csv"]).unwrap();
        assert_eq!(cli.bom, PathBuf::from("board.csv"));
        assert!(matches!(cli.report, ReportFormat::Terminal));
        assert_eq!(cli.fail_on, FailOn::Never);
        assert!(cli.distributor.is_none());
    }

    #[test]
    fn test_parse_options() {
        let cli = Cli::try_parse_from([
            "bom-risk",
            "board.csv",
            "--report",
            "html",
            "-o",
            "out.html",
            "--distributor",
            "mouser",
            "--fail-on",
            "high",
            "--concurrency",
            "4",
        ])
        .unwrap();
        assert!(matches!(cli.report, ReportFormat::Html));
        assert_eq!(cli.output, Some(PathBuf::from("out.html")));
        assert_eq!(cli.concurrency, Some(4));
        let kind: DistributorKind = cli.distributor.as_ref().unwrap().into();
        assert_eq!(kind, DistributorKind::Mouser);
    }

    #[test]
    fn test_fail_on() {
        assert!(!FailOn::Never.trips(RiskTier::Critical));
        assert!(FailOn::High.trips(RiskTier::High));
        assert!(FailOn::High.trips(RiskTier::Critical));
        assert!(!FailOn::High.trips(RiskTier::ApiError));
        assert!(!FailOn::Critical.trips(RiskTier::High));
    }
}
