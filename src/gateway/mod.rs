//! Serialized access to the provider connection
//!
//! The HTTP layer handles requests concurrently, but the provider connection
//! is not safe for concurrent use. A single worker task owns the provider;
//! handlers submit commands through a `GatewayHandle` and await the reply.
//! Commands run one at a time in arrival order, with no timeout and no retry.

mod handle;
mod worker;

pub use handle::{Gateway, GatewayHandle, WorkerUnavailable};
pub use worker::ChatHistory;
