pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod formats;
pub mod hierarchy;
pub mod loader;
pub mod output;
pub mod request;
pub mod transport;
pub mod tree;
