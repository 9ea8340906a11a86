//! Per-user task management.
//!
//! Tasks belong to exactly one user. The store port scopes every query and
//! mutation by owner, and the service turns owner-scoped misses into
//! [`services::TaskServiceError::NotFound`]. The module follows hexagonal
//! architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
