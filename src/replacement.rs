use crate::distributor::{Distributor, KeywordQuery};
use crate::models::{PartRecord, ReplacementCandidate};
use crate::risk::lifecycle::is_presumed_active;

/// Leading description tokens used as search keywords. Later tokens tend to be
/// package or variant noise that over-narrows the search.
pub const KEYWORD_TOKENS: usize = 4;
/// Records requested from the keyword search.
pub const SEARCH_RECORDS: u32 = 5;
/// Candidates kept per part.
pub const MAX_REPLACEMENTS: usize = 3;

/// Build keywords from the first [`KEYWORD_TOKENS`] whitespace-separated words.
pub fn extract_keywords(description: &str) -> Option<String> {
    let tokens: Vec<&str> = description.split_whitespace().take(KEYWORD_TOKENS).collect();
    if tokens.is_empty() {
        None
    } else {
        Some(tokens.join(" "))
    }
}

/// Best-effort search for in-stock, active substitutes of a risky part.
///
/// Returns at most [`MAX_REPLACEMENTS`] candidates in the order the distributor
/// returned them. A failed search yields an empty list.
pub async fn find_replacements(
    distributor: &dyn Distributor,
    record: Option<&PartRecord>,
    original_part_number: &str,
) -> Vec<ReplacementCandidate> {
    let Some(keywords) = record.and_then(|r| extract_keywords(&r.description)) else {
        return Vec::new();
    };

    let query = KeywordQuery {
        keywords,
        max_records: SEARCH_RECORDS,
        starting_record: 0,
        in_stock_only: true,
    };

    let candidates = match distributor.search_by_keyword(&query).await {
        Ok(candidates) => candidates,
        Err(failure) => {
            tracing::warn!(
                part_number = original_part_number,
                keywords = %query.keywords,
                %failure,
                "replacement search failed"
            );
            return Vec::new();
        }
    };

    candidates
        .into_iter()
        .filter(|c| c.part_number != original_part_number)
        .filter(|c| is_presumed_active(&c.lifecycle_status))
        .take(MAX_REPLACEMENTS)
        .map(ReplacementCandidate::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributor::fake::{candidate, FakeDistributor};
    use crate::distributor::TransportFailure;

    fn record(description: &str) -> PartRecord {
        PartRecord {
            distributor_part_number: Some("ORIG".to_string()),
            manufacturer: "ACME".to_string(),
            stock: 0,
            lifecycle_status: "Obsolete".to_string(),
            description: description.to_string(),
        }
    }

    #[test]
    fn test_extract_keywords() {
        assert_eq!(
            extract_keywords("High Power N-Channel MOSFET TO-220 60V").as_deref(),
            Some("High Power N-Channel MOSFET")
        );
        assert_eq!(extract_keywords("  Op  Amp ").as_deref(), Some("Op Amp"));
        assert_eq!(extract_keywords("   "), None);
        assert_eq!(extract_keywords(""), None);
    }

    #[tokio::test]
    async fn test_search_uses_leading_keywords() {
        let fake = FakeDistributor::new();
        let rec = record("High Power N-Channel MOSFET TO-220 60V");
        find_replacements(&fake, Some(&rec), "ORIG").await;

        let queries = fake.search_queries();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].keywords, "High Power N-Channel MOSFET");
        assert_eq!(queries[0].max_records, 5);
        assert_eq!(queries[0].starting_record, 0);
        assert!(queries[0].in_stock_only);
    }

    #[tokio::test]
    async fn test_filters_original_and_inactive() {
        let fake = FakeDistributor::new().with_search(Ok(vec![
            candidate("ORIG", "Active"),
            candidate("A", "Obsolete"),
            candidate("B", "ACTIVE"),
            candidate("C", ""),
            candidate("D", "NRND"),
            candidate("E", "active"),
        ]));
        let rec = record("Low Dropout Regulator 3.3V");
        let found = find_replacements(&fake, Some(&rec), "ORIG").await;

        let numbers: Vec<&str> = found.iter().map(|c| c.part_number.as_str()).collect();
        assert_eq!(numbers, vec!["B", "C", "E"]);
    }

    #[tokio::test]
    async fn test_truncates_to_three_in_upstream_order() {
        let fake = FakeDistributor::new().with_search(Ok(vec![
            candidate("P1", "Active"),
            candidate("P2", ""),
            candidate("P3", "Active"),
            candidate("P4", "Active"),
            candidate("P5", "Active"),
        ]));
        let rec = record("Ceramic Capacitor 10uF 25V X5R");
        let found = find_replacements(&fake, Some(&rec), "ORIG").await;

        let numbers: Vec<&str> = found.iter().map(|c| c.part_number.as_str()).collect();
        assert_eq!(numbers, vec!["P1", "P2", "P3"]);
    }

    #[tokio::test]
    async fn test_search_failure_is_empty() {
        let fake =
            FakeDistributor::new().with_search(Err(TransportFailure::Network("timeout".into())));
        let rec = record("Schottky Diode 40V 1A");
        assert!(find_replacements(&fake, Some(&rec), "ORIG").await.is_empty());
        assert_eq!(fake.search_queries().len(), 1);
    }

    #[tokio::test]
    async fn test_skips_without_description_or_record() {
        let fake = FakeDistributor::new().with_search(Ok(vec![candidate("X", "Active")]));
        assert!(find_replacements(&fake, Some(&record("")), "ORIG").await.is_empty());
        assert!(find_replacements(&fake, None, "ORIG").await.is_empty());
        assert!(fake.search_queries().is_empty());
    }
}
