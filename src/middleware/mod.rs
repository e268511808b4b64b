//! HTTP middleware applied to every route

pub mod cors;
pub mod request_id;

pub use cors::cors_middleware;
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
