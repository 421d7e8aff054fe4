//! Resource reconciliation engine for the Datadog platform: typed schemas,
//! a dynamic value tree, drift/diff semantics, and CRUD+Import adapters,
//! designed to sit behind a generic declarative host runtime that owns
//! planning, state, and scheduling.

pub mod api;
pub mod data;
pub mod datasources;
pub mod diag;
pub mod diff;
pub mod engine;
pub mod lock;
pub mod provider;
pub mod resources;
pub mod schema;
pub mod value;
