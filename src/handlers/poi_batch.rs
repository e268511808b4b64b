//! POI batch passthrough endpoint
//!
//! Handles `GET /api/poibatch?token=&serverid=&extend=`. JSON bodies are
//! forwarded as JSON; anything else is forwarded verbatim as `text/plain`
//! with the upstream status.

use axum::{
    extract::State,
    response::Response,
};

use crate::error::AppResult;
use crate::handlers::extractor::ProxyQuery;
use crate::handlers::{ActionQuery, AppState};
use crate::upstream::Expectation;

pub async fn handler(
    State(state): State<AppState>,
    ProxyQuery(query): ProxyQuery<ActionQuery>,
) -> AppResult<Response> {
    let credentials = state.client().authenticate(query.token.as_deref()).await?;
    let params = query.params(state.config());

    let result = state.client().poi_batch(&credentials, &params).await?;

    Ok(result.respond(
        Expectation::Passthrough,
        state.config().upstream.preview_chars,
    ))
}
