//! Taskboard: per-user task tracking.
//!
//! This crate provides the persistence and service layers behind a
//! personal task list. Authenticated users create, list, filter, update,
//! and delete their own tasks; every store call is scoped to the owning
//! user, so one user's tasks are invisible to everyone else.
//!
//! # Architecture
//!
//! Taskboard follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (`PostgreSQL`, memory)
//!
//! # Modules
//!
//! - [`task`]: Task records, the owner-scoped store port, and the service
//! - [`config`]: Datastore settings and connection setup

pub mod config;
pub mod task;
