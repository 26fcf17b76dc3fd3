//! Distributor API clients.
//!
//! A [`Distributor`] answers two questions: an exact part-number lookup and a
//! keyword search. Transport problems are returned as [`TransportFailure`]
//! values instead of errors so that one bad row never aborts a run.
//!
//! Which distributor a run talks to is decided once, up front, by a
//! [`SelectionStrategy`] over the configured credentials.

#[cfg(test)]
pub mod fake;
pub mod mouser;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{ClientConfig, Credentials};
use crate::error::Error;
use crate::models::{LookupOutcome, RawCandidate};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportFailure {
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("network error: {0}")]
    Network(String),
    #[error("undecodable response: {0}")]
    Decode(String),
    #[error("request rejected: {0}")]
    Rejected(String),
}

/// Parameters of a keyword search.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordQuery {
    pub keywords: String,
    pub max_records: u32,
    pub starting_record: u32,
    pub in_stock_only: bool,
}

#[async_trait]
pub trait Distributor: Send + Sync {
    /// Display name used in reports and progress messages.
    fn name(&self) -> &str;

    async fn lookup_part(&self, part_number: &str) -> LookupOutcome;

    async fn search_by_keyword(
        &self,
        query: &KeywordQuery,
    ) -> Result<Vec<RawCandidate>, TransportFailure>;
}

/// Distributors that may appear in the credentials table, in preference order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistributorKind {
    Mouser,
    DigiKey,
    Farnell,
    Lcsc,
}

impl DistributorKind {
    pub const ALL: [DistributorKind; 4] = [
        DistributorKind::Mouser,
        DistributorKind::DigiKey,
        DistributorKind::Farnell,
        DistributorKind::Lcsc,
    ];

    /// Key used in `[credentials]` and in `BOM_RISK_<KEY>_API_KEY`.
    pub fn key(self) -> &'static str {
        match self {
            DistributorKind::Mouser => "mouser",
            DistributorKind::DigiKey => "digikey",
            DistributorKind::Farnell => "farnell",
            DistributorKind::Lcsc => "lcsc",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.key().eq_ignore_ascii_case(key.trim()))
    }

    /// Whether this build ships a client for the distributor.
    pub fn has_backend(self) -> bool {
        matches!(self, DistributorKind::Mouser)
    }
}

impl std::fmt::Display for DistributorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DistributorKind::Mouser => write!(f, "Mouser"),
            DistributorKind::DigiKey => write!(f, "Digi-Key"),
            DistributorKind::Farnell => write!(f, "Farnell"),
            DistributorKind::Lcsc => write!(f, "LCSC"),
        }
    }
}

/// Policy choosing the single distributor used for a whole run.
pub trait SelectionStrategy {
    fn select(&self, credentials: &Credentials) -> Result<(DistributorKind, String), Error>;
}

/// First distributor in preference order with a non-empty key and a backend.
pub struct FirstConfigured;

impl SelectionStrategy for FirstConfigured {
    fn select(&self, credentials: &Credentials) -> Result<(DistributorKind, String), Error> {
        let mut without_backend = Vec::new();

        for kind in DistributorKind::ALL {
            let Some(key) = credentials.api_key(kind) else {
                continue;
            };
            if kind.has_backend() {
                return Ok((kind, key.to_string()));
            }
            without_backend.push(kind.key());
        }

        if without_backend.is_empty() {
            Err(Error::configuration(
                "no distributor API key configured (set [credentials] mouser = \"...\" or BOM_RISK_MOUSER_API_KEY)",
            ))
        } else {
            Err(Error::configuration(format!(
                "configured distributors have no client in this build: {}",
                without_backend.join(", ")
            )))
        }
    }
}

/// Always use one named distributor.
pub struct Preferred(pub DistributorKind);

impl SelectionStrategy for Preferred {
    fn select(&self, credentials: &Credentials) -> Result<(DistributorKind, String), Error> {
        let kind = self.0;
        if !kind.has_backend() {
            return Err(Error::configuration(format!(
                "{} has no client in this build",
                kind
            )));
        }
        credentials
            .api_key(kind)
            .map(|key| (kind, key.to_string()))
            .ok_or_else(|| Error::configuration(format!("no API key configured for {}", kind)))
    }
}

/// Build the client for the selected distributor.
pub fn connect(
    kind: DistributorKind,
    api_key: String,
    config: &ClientConfig,
) -> Result<Arc<dyn Distributor>, Error> {
    match kind {
        DistributorKind::Mouser => Ok(Arc::new(mouser::MouserClient::new(api_key, config)?)),
        other => Err(Error::configuration(format!(
            "{} has no client in this build",
            other
        ))),
    }
}
