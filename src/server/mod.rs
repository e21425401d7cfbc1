//! Transports
//!
//! Both transports are thin adapters over [`crate::service::IsaService`];
//! neither knows anything about ISA data.

pub mod http;
pub mod stdio;

pub use http::HttpServer;
