//! Talking to the on-device automation service
//!
//! - `RequestEngine` - reqwest client with fixed transport settings and a
//!   pinned DNS nameserver
//! - `ServiceBridge` - starts, stops and probes the JSON-RPC service and
//!   fetches hierarchy dumps from it

pub mod request;
pub mod service;

pub use request::{RequestEngine, Requester};
pub use service::{JsonRpcRequest, ServiceBridge, ServiceStatus, DUMP_METHOD};
