//! In-memory caching layer for hot-path reference lookups.
//!
//! `TtlCache` is the generic load-on-miss engine (moka-backed, with
//! single-flight loading). `NormalizingCache` decorates a string-keyed
//! cache with path canonicalization.

pub mod normalizing_cache;
pub mod ttl_cache;

pub use normalizing_cache::{NormalizingCache, SegmentTransform};
pub use ttl_cache::TtlCache;
