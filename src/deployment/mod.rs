//! Deployment provisioning, registry and orchestration workflows.
//!
//! The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Resource provisioners in [`provisioning`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration workflows in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod provisioning;
pub mod services;

#[cfg(test)]
mod tests;
