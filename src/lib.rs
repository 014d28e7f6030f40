//! Skylift: deploy application repositories to AWS through MCP tools.
//!
//! This crate provisions EC2-hosted backends and S3-hosted static frontends
//! from a git repository URL, records every deployment in an on-disk
//! registry, and exposes the workflows as named tools over a JSON-RPC stdio
//! transport.
//!
//! # Architecture
//!
//! Skylift follows hexagonal architecture principles:
//!
//! - **Domain**: deployment records, names, runtimes and cost estimates
//! - **Ports**: trait contracts for the registry, cloud APIs, source fetching
//!   and build tooling
//! - **Adapters**: filesystem, AWS SDK, git, process and in-memory
//!   implementations of those ports
//!
//! # Modules
//!
//! - [`deployment`]: provisioning and orchestration of deployments
//! - [`gateway`]: tool catalogue, dispatch and stdio transport
//! - [`config`]: process-wide configuration built once at start-up
//! - [`observability`]: tracing subscriber set-up

pub mod config;
pub mod deployment;
pub mod gateway;
pub mod observability;
pub mod shell;
