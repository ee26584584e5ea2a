pub mod api;
pub mod config;
pub mod device;
pub mod error;
pub mod hierarchy;
pub mod models;
pub mod rpc;

pub use config::{Config, DriverConfig};
pub use device::Driver;
pub use error::{DriverError, Result};
pub use hierarchy::{By, Document, Element, SelectorKind};
