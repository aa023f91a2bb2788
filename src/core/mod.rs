//! Domain types, configuration and network services

pub mod config;
pub mod dataset;
pub mod event_bus;
pub mod mark;
pub mod resolver;
pub mod transport;
