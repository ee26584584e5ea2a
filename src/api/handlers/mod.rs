pub mod device;
pub mod elements;
pub mod health;
pub mod service;
