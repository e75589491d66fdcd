use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, instrument, warn};

use super::{cookie::session_id_from, types::AuthenticatedUser};
use crate::shared::{AppError, AppState};

/// Session cookie authentication middleware - resolves the `session_id` cookie and adds
/// [`AuthenticatedUser`] plus the request's [`crate::context::RequestContext`] to the extensions.
/// Usage: .route_layer(middleware::from_fn_with_state(app_state.clone(), session::require_session))
#[instrument(skip(state, jar, req, next))]
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let session_id = session_id_from(&jar).ok_or_else(|| {
        warn!(uri = %req.uri(), "Missing session cookie in request");
        AppError::Unauthorized("missing session".to_string())
    })?;

    let ctx = state.request_context();
    let session = state
        .login_service
        .authenticate(&ctx, &session_id)
        .await
        .map_err(|e| {
            warn!(error = %e, "Session authentication failed");
            AppError::from(e)
        })?;

    debug!(
        user_id = %session.user_id,
        session_id = %session.id,
        "Authentication successful, adding user to request"
    );

    req.extensions_mut().insert(AuthenticatedUser::from(&session));
    req.extensions_mut().insert(ctx);

    Ok(next.run(req).await)
}
