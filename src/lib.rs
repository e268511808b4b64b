//! gps-proxy - credential-injecting proxy for the GPS51 telemetry API
//!
//! Forwards device-location queries to GPS51, attaches either a static token
//! or a login-derived session cookie, and normalizes whatever comes back:
//! JSON is passed through, and non-JSON answers become a diagnostic envelope
//! with a bounded preview where structured data was expected.

pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod telemetry;
pub mod upstream;
