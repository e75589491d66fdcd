use axum::{extract::State, http::StatusCode, Extension, Json};
use axum_extra::extract::{cookie::CookieJar, WithRejection};
use tracing::{error, info, instrument};

use super::types::{LoginRequest, RegisterRequest, UpdateRequest, UserEnvelope};
use crate::context::RequestContext;
use crate::session::{session_id_from, AuthenticatedUser};
use crate::shared::{AppError, AppState};

/// HTTP handler for creating an account
///
/// POST /users/register
/// Returns 201 with the new user
#[instrument(name = "register", skip_all, fields(user_name = %request.user_name))]
pub async fn register(
    State(state): State<AppState>,
    ctx: RequestContext,
    WithRejection(Json(request), _): WithRejection<Json<RegisterRequest>, AppError>,
) -> Result<(StatusCode, Json<UserEnvelope>), AppError> {
    let user = state
        .register_service
        .register(&ctx, &request.user_name, &request.email, &request.password)
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// HTTP handler for logging in
///
/// POST /users/login
/// Sets the `session_id` cookie and returns the user
#[instrument(name = "login", skip_all)]
pub async fn login(
    State(state): State<AppState>,
    ctx: RequestContext,
    jar: CookieJar,
    WithRejection(Json(request), _): WithRejection<Json<LoginRequest>, AppError>,
) -> Result<(CookieJar, Json<UserEnvelope>), AppError> {
    let response = state
        .login_service
        .login(&ctx, &request.email, &request.password)
        .await
        .map_err(AppError::credentials)?;

    let jar = jar.add(state.cookie_policy.session_cookie(&response.session));
    Ok((jar, Json(response.user.into())))
}

/// HTTP handler for logging out
///
/// POST /users/logout
/// Always clears the cookie, whether or not the session still exists
#[instrument(name = "logout", skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    ctx: RequestContext,
    jar: CookieJar,
) -> Result<(CookieJar, StatusCode), AppError> {
    if let Some(session_id) = session_id_from(&jar) {
        state.login_service.logout(&ctx, &session_id).await?;
    }

    Ok((jar.add(state.cookie_policy.removal_cookie()), StatusCode::NO_CONTENT))
}

/// GET /users/me
#[instrument(name = "get_me", skip_all, fields(user_id = %user.user_id))]
pub async fn get_me(
    State(state): State<AppState>,
    ctx: RequestContext,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<UserEnvelope>, AppError> {
    let account = state.user_service.get(&ctx, &user.user_id).await?;
    Ok(Json(account.into()))
}

/// PATCH /users/me
#[instrument(name = "update_me", skip_all, fields(user_id = %user.user_id))]
pub async fn update_me(
    State(state): State<AppState>,
    ctx: RequestContext,
    Extension(user): Extension<AuthenticatedUser>,
    WithRejection(Json(request), _): WithRejection<Json<UpdateRequest>, AppError>,
) -> Result<Json<UserEnvelope>, AppError> {
    let account = state
        .user_service
        .update(&ctx, &user.user_id, request.into())
        .await?;

    Ok(Json(account.into()))
}

/// HTTP handler for deleting the caller's account
///
/// DELETE /users/me
/// Also ends the caller's session and clears the cookie
#[instrument(name = "delete_me", skip_all, fields(user_id = %user.user_id))]
pub async fn delete_me(
    State(state): State<AppState>,
    ctx: RequestContext,
    jar: CookieJar,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<(CookieJar, StatusCode), AppError> {
    state.user_service.delete(&ctx, &user.user_id).await?;
    // The account is gone either way; a session left behind fails at the next lookup
    if let Err(e) = state.login_service.logout(&ctx, &user.session_id).await {
        error!(session_id = %user.session_id, error = %e, "Failed to end session of deleted account");
    }

    info!("Account closed");
    Ok((jar.add(state.cookie_policy.removal_cookie()), StatusCode::NO_CONTENT))
}
