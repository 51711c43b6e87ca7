use axum::{
    extract::{Query, Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    token: Option<String>,
}

/// Rejects the request with 403 before any storage call unless it carries a
/// valid token; on success the token is stored in the request extensions.
///
/// A query string that does not parse (a repeated `token`, say) counts as
/// carrying no query token at all.
pub async fn require_token(
    State(state): State<AppState>,
    query: Option<Query<TokenQuery>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let query_token = query.as_ref().and_then(|Query(q)| q.token.as_deref());

    let token = state
        .gate
        .authorize_request(authorization, query_token)
        .map_err(|e| {
            tracing::debug!("Rejected {}: {}", request.uri().path(), e);
            e
        })?;

    request.extensions_mut().insert(token);
    Ok(next.run(request).await)
}
