// Valuation: feed normalization, derived metrics, and pick suggestions.

pub mod metrics;
pub mod normalize;
pub mod suggest;
