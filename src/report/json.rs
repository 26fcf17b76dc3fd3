use std::path::PathBuf;

use super::ReportSink;
use crate::error::Error;
use crate::models::Report;

/// Writes the report as JSON to a file, or to stdout when no path is given.
pub struct JsonSink {
    pub output: Option<PathBuf>,
}

impl ReportSink for JsonSink {
    fn publish(&self, report: &Report) -> Result<String, Error> {
        let json = serde_json::to_string_pretty(report).map_err(|e| Error::report(e.to_string()))?;

        match &self.output {
            Some(path) => {
                std::fs::write(path, json).map_err(|e| {
                    Error::report(format!("failed to write {}: {}", path.display(), e))
                })?;
                Ok(path.display().to_string())
            }
            None => {
                println!("{}", json);
                Ok("stdout".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::testing::sample_report;

    #[test]
    fn test_writes_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let sink = JsonSink {
            output: Some(path.clone()),
        };

        let artifact = sink.publish(&sample_report()).unwrap();
        assert_eq!(artifact, path.display().to_string());

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["lines"].as_array().unwrap().len(), 3);
        assert_eq!(value["summary"]["Critical"], 1);
        assert_eq!(value["summary"]["API Error"], 0);
        assert_eq!(value["lines"][1]["risk"], "Critical");
        assert_eq!(value["lines"][1]["fields"]["Ref"], "U2");
        assert_eq!(value["lines"][1]["replacements"][0]["part_number"], "595-SN74HC00N");
    }
}
