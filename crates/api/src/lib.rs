//! HTTP surface: cron trigger endpoints for the scheduled passes,
//! the conversion recording endpoint, and operational probes.

pub mod handlers;
pub mod server;

pub use server::ApiServer;
