//! Query string extractor with JSON error responses
//!
//! Wraps Axum's `Query` extractor so a rejected query string (for example
//! `?deviceid=a&deviceid=b`) is answered with the usual `{"error": ...}`
//! body instead of Axum's plain-text rejection.

use axum::{
    extract::{FromRequestParts, Query, rejection::QueryRejection},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidQuery(rejection.body_text())
    }
}

/// Drop-in replacement for `axum::extract::Query` rejecting with [`AppError`]
///
/// ```ignore
/// pub async fn handler(ProxyQuery(query): ProxyQuery<LocationQuery>) -> AppResult<Response> {
///     // a malformed query string never reaches this point
/// }
/// ```
#[derive(Debug)]
pub struct ProxyQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ProxyQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(ProxyQuery(value)),
            Err(rejection) => {
                tracing::debug!(error = %rejection.body_text(), "Rejected query string");
                Err(rejection.into())
            }
        }
    }
}
