//! Account routes
//!
//! Public: signup, signin, token. Protected by [`require_auth`]: signout,
//! profile, delete. The maintenance routes (list all, delete all) are only
//! mounted when `debug_routes` is enabled.

use super::AppJson;
use crate::auth::{require_auth, AuthUser};
use crate::error::ApiResult;
use crate::services::AccountService;
use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::{delete, get, post},
    Json, Router,
};
use storefront_shared::{
    AccessTokenResponse, AuthResponse, MessageResponse, SigninRequest, SignupRequest,
    TokenRequest, UserProfile,
};
use tracing::warn;

/// Create user routes
pub fn users_routes(state: &AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
        .route("/token", post(token));

    let protected = Router::new()
        .route("/signout", get(signout))
        .route("/profile", get(profile))
        .route("/delete", delete(delete_self))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let mut router = public.merge(protected);

    if state.config().debug_routes {
        warn!("Debug user routes enabled");
        router = router
            .route("/", get(list_users))
            .route("/delete/all", delete(delete_all_users));
    }

    router
}

/// POST /users/signup
async fn signup(
    State(state): State<AppState>,
    AppJson(req): AppJson<SignupRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let response = AccountService::signup(state.store(), state.tokens(), req).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /users/signin
async fn signin(
    State(state): State<AppState>,
    AppJson(req): AppJson<SigninRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let response = AccountService::signin(state.store(), state.tokens(), req).await?;
    Ok(Json(response))
}

/// POST /users/token
async fn token(
    State(state): State<AppState>,
    AppJson(req): AppJson<TokenRequest>,
) -> ApiResult<Json<AccessTokenResponse>> {
    let response = AccountService::refresh(state.store(), state.tokens(), req).await?;
    Ok(Json(response))
}

/// GET /users/signout
async fn signout(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> ApiResult<Json<MessageResponse>> {
    let response = AccountService::signout(state.store(), &auth_user.identity).await?;
    Ok(Json(response))
}

/// GET /users/profile
///
/// Answers 201 rather than 200; existing clients rely on it.
async fn profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> ApiResult<(StatusCode, Json<UserProfile>)> {
    let profile = AccountService::get_profile(state.store(), &auth_user.identity).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// DELETE /users/delete
async fn delete_self(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> ApiResult<Json<UserProfile>> {
    let deleted = AccountService::delete_account(state.store(), &auth_user.identity).await?;
    Ok(Json(deleted))
}

/// GET /users (debug)
async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<UserProfile>>> {
    Ok(Json(AccountService::list_users(state.store()).await?))
}

/// DELETE /users/delete/all (debug)
async fn delete_all_users(State(state): State<AppState>) -> ApiResult<&'static str> {
    AccountService::delete_all_users(state.store()).await?;
    Ok("Deleted all users")
}
