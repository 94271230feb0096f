//! Bearer authentication, role gate and login
//!
//! `auth_middleware` wraps every route except login, health and the banner.
//! It puts the verified `AuthContext` into request extensions, where
//! handlers pick it up and pass it on to the workflows.

use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
    Json,
};
use serde::Deserialize;
use sevs_common::api::{mask_token, require_role, AuthContext};
use sevs_common::db::Role;
use sevs_common::Error;
use tracing::warn;

use crate::error::ApiResult;
use crate::services::login::{login as login_workflow, LoginResponse};
use crate::AppState;

/// Authentication middleware
///
/// Missing header, wrong scheme, bad signature and expiry all produce
/// the same 401.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let claims = {
        let token = bearer_token(request.headers()).ok_or(Error::Authentication)?;
        state.keys.verify(token).map_err(|err| {
            warn!(token = %mask_token(token), "Rejected bearer token");
            err
        })?
    };

    request.extensions_mut().insert(AuthContext::from(claims));
    Ok(next.run(request).await)
}

/// Role gate for admin-only routes; runs inside `auth_middleware`
pub async fn require_admin(request: Request, next: Next) -> ApiResult<Response> {
    let ctx = request
        .extensions()
        .get::<AuthContext>()
        .ok_or(Error::Authentication)?;
    require_role(ctx, &[Role::Admin])?;

    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme == "Bearer" && !token.is_empty()).then_some(token)
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Email or staff code
    pub identifier: Option<String>,
    pub password: Option<String>,
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(req) = body?;
    let response = login_workflow(
        &state.db,
        &state.keys,
        req.identifier.as_deref(),
        req.password.as_deref(),
    )
    .await?;

    Ok(Json(response))
}
