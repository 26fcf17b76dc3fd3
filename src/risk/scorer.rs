use crate::models::{LookupOutcome, PartRecord, RiskTier};
use crate::risk::lifecycle::{signal, LifecycleSignal};

/// Stock below this level adds a low-stock penalty.
pub const LOW_STOCK_THRESHOLD: u64 = 100;

/// Classify a lookup outcome into a risk tier.
///
/// - no data → [`RiskTier::NotFound`]
/// - transport failure → [`RiskTier::ApiError`]
/// - otherwise the additive [`score`] is thresholded
pub fn classify(outcome: &LookupOutcome) -> RiskTier {
    match outcome {
        LookupOutcome::NoData => RiskTier::NotFound,
        LookupOutcome::TransportFailure(_) => RiskTier::ApiError,
        LookupOutcome::Found(record) => tier_for_score(score(record)),
    }
}

/// Additive risk score: lifecycle penalty plus stock penalty.
pub fn score(record: &PartRecord) -> u32 {
    let lifecycle = match signal(&record.lifecycle_status) {
        LifecycleSignal::EndOfLife => 10,
        LifecycleSignal::NotRecommended => 5,
        LifecycleSignal::None => 0,
    };

    let stock = if record.stock == 0 {
        4
    } else if record.stock < LOW_STOCK_THRESHOLD {
        2
    } else {
        0
    };

    lifecycle + stock
}

pub fn tier_for_score(score: u32) -> RiskTier {
    match score {
        s if s >= 10 => RiskTier::Critical,
        s if s >= 5 => RiskTier::High,
        s if s >= 2 => RiskTier::Medium,
        _ => RiskTier::Low,
    }
}
