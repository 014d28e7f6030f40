//! Tool gateway exposing deployment workflows as named operations.
//!
//! [`ToolGateway`] validates arguments and converts every outcome into a
//! structured result; [`stdio`] frames it as JSON-RPC over stdin/stdout.

pub mod arguments;
mod dispatch;
pub mod stdio;
mod tool;

pub use dispatch::ToolGateway;
pub use stdio::{TransportError, serve, serve_stdio};
pub use tool::{ToolDefinition, ToolName, tool_definitions};
