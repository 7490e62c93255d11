//! Stats engine: boxscore normalization, the cache-first daily pipeline,
//! weekly aggregation and replacement-level ranking.

pub mod normalizer;
pub mod pipeline;
pub mod replacement;
pub mod weekly;
