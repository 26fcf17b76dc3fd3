//! In-memory distributor for tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{Distributor, KeywordQuery, TransportFailure};
use crate::models::{LookupOutcome, PartRecord, RawCandidate};

pub struct FakeDistributor {
    parts: HashMap<String, LookupOutcome>,
    search_result: Result<Vec<RawCandidate>, TransportFailure>,
    /// Per-part artificial latency, to shuffle completion order.
    delays: HashMap<String, Duration>,
    pub lookups: Mutex<Vec<String>>,
    pub searches: Mutex<Vec<KeywordQuery>>,
}

impl FakeDistributor {
    pub fn new() -> Self {
        Self {
            parts: HashMap::new(),
            search_result: Ok(Vec::new()),
            delays: HashMap::new(),
            lookups: Mutex::new(Vec::new()),
            searches: Mutex::new(Vec::new()),
        }
    }

    pub fn with_part(
        mut self,
        part_number: &str,
        lifecycle: &str,
        stock: u64,
        description: &str,
    ) -> Self {
        self.parts.insert(
            part_number.to_string(),
            LookupOutcome::Found(PartRecord {
                distributor_part_number: Some(part_number.to_string()),
                manufacturer: "ACME".to_string(),
                stock,
                lifecycle_status: lifecycle.to_string(),
                description: description.to_string(),
            }),
        );
        self
    }

    pub fn with_outcome(mut self, part_number: &str, outcome: LookupOutcome) -> Self {
        self.parts.insert(part_number.to_string(), outcome);
        self
    }

    pub fn with_search(mut self, result: Result<Vec<RawCandidate>, TransportFailure>) -> Self {
        self.search_result = result;
        self
    }

    pub fn with_delay(mut self, part_number: &str, millis: u64) -> Self {
        self.delays
            .insert(part_number.to_string(), Duration::from_millis(millis));
        self
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.lock().unwrap().len()
    }

    pub fn search_queries(&self) -> Vec<KeywordQuery> {
        self.searches.lock().unwrap().clone()
    }
}

pub fn candidate(part_number: &str, lifecycle: &str) -> RawCandidate {
    RawCandidate {
        part_number: part_number.to_string(),
        manufacturer: "ACME".to_string(),
        stock: 1000,
        lifecycle_status: lifecycle.to_string(),
        description: format!("replacement {}", part_number),
    }
}

#[async_trait]
impl Distributor for FakeDistributor {
    fn name(&self) -> &str {
        "Fake"
    }

    async fn lookup_part(&self, part_number: &str) -> LookupOutcome {
        self.lookups.lock().unwrap().push(part_number.to_string());
        if let Some(delay) = self.delays.get(part_number) {
            tokio::time::sleep(*delay).await;
        }
        self.parts
            .get(part_number)
            .cloned()
            .unwrap_or(LookupOutcome::NoData)
    }

    async fn search_by_keyword(
        &self,
        query: &KeywordQuery,
    ) -> Result<Vec<RawCandidate>, TransportFailure> {
        self.searches.lock().unwrap().push(query.clone());
        self.search_result.clone()
    }
}
