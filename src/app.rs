use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::session::require_session;
use crate::shared::AppState;
use crate::user;

/// All HTTP routes; `/users/me` sits behind the session cookie middleware
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/users/me",
            get(user::get_me)
                .patch(user::update_me)
                .delete(user::delete_me),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/users/register", post(user::register))
        .route("/users/login", post(user::login))
        .route("/users/logout", post(user::logout))
        .merge(protected)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
        .with_state(state)
}
