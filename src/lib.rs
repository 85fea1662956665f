//! HoopSight Backend Library
//!
//! Fantasy season replay and wager settlement engine. The `engine`
//! module holds the pure domain logic; `data` loads the immutable
//! season dataset; `store` persists league aggregates; `api` exposes
//! everything over HTTP.

pub mod api;
pub mod data;
pub mod engine;
pub mod store;
