/// Lifecycle signal extracted from free-text distributor status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleSignal {
    /// Obsolete or end-of-life.
    EndOfLife,
    /// Not recommended for new designs.
    NotRecommended,
    None,
}

/// Match lifecycle text by case-insensitive substring.
///
/// End-of-life markers win over NRND markers when both appear.
pub fn signal(status: &str) -> LifecycleSignal {
    let lower = status.to_lowercase();
    if lower.contains("obsolete") || lower.contains("eol") {
        LifecycleSignal::EndOfLife
    } else if lower.contains("nrnd") || lower.contains("not recommended") {
        LifecycleSignal::NotRecommended
    } else {
        LifecycleSignal::None
    }
}

/// Whether a replacement candidate's lifecycle is acceptable.
///
/// Only an exact `active` qualifies; an empty status counts as active because
/// search results often omit it.
pub fn is_presumed_active(status: &str) -> bool {
    let lower = status.to_lowercase();
    lower == "active" || lower.is_empty()
}
