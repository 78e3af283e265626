pub mod aggregate;
pub mod charts;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod filter;
pub mod format;
pub mod layout;
pub mod logging;
pub mod mutation;
pub mod notify;
pub mod store;
pub mod svg;
pub mod transition;
pub mod types;
pub mod views;

pub use error::{Error, Result};
