//! Routes and request handlers.

use std::time::{Duration, Instant};

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, FromRequest, Query, Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use frp_manager_config::Config;

use super::TRANSPORT_TARGET;
use crate::dispatch::registry;
use crate::dispatch::{
    DispatchError, Dispatcher, EndpointTag, FailureClass, InboundRequest, OperationKind,
};

/// Header carrying the frp request id.
const REQUEST_ID_HEADER: &str = "x-frp-reqid";

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    dispatcher: Dispatcher,
    request_timeout: Duration,
    max_body_bytes: usize,
}

impl AppState {
    /// Builds handler state from the resolved configuration.
    #[must_use]
    pub fn new(dispatcher: Dispatcher, config: &Config) -> Self {
        Self::with_limits(dispatcher, config.request_timeout(), config.max_body_bytes())
    }

    /// Builds handler state with explicit limits.
    #[must_use]
    pub const fn with_limits(
        dispatcher: Dispatcher,
        request_timeout: Duration,
        max_body_bytes: usize,
    ) -> Self {
        Self {
            dispatcher,
            request_timeout,
            max_body_bytes,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct PluginQuery {
    op: Option<String>,
    version: Option<String>,
}

/// Builds the router serving the plugin and audit log endpoints.
pub fn router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/user-manager", post(user_manager))
        .route("/port-manager", post(port_manager));
    for descriptor in registry::descriptors() {
        let kind = descriptor.kind;
        router = router.route(
            &format!("/logs/{}", descriptor.name),
            get(move |State(state): State<AppState>| audit_log(state, kind)),
        );
    }
    router
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(state.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn user_manager(
    State(state): State<AppState>,
    Query(query): Query<PluginQuery>,
    headers: HeaderMap,
    request: Request,
) -> Response {
    plugin_request(state, EndpointTag::UserManager, query, &headers, request).await
}

async fn port_manager(
    State(state): State<AppState>,
    Query(query): Query<PluginQuery>,
    headers: HeaderMap,
    request: Request,
) -> Response {
    plugin_request(state, EndpointTag::PortManager, query, &headers, request).await
}

async fn plugin_request(
    state: AppState,
    endpoint: EndpointTag,
    query: PluginQuery,
    headers: &HeaderMap,
    request: Request,
) -> Response {
    let received = Instant::now();
    let body = match tokio::time::timeout(state.request_timeout, Bytes::from_request(request, &()))
        .await
    {
        Ok(Ok(body)) => body,
        Ok(Err(rejection)) => return rejection.into_response(),
        Err(_) => {
            warn!(target: TRANSPORT_TARGET, %endpoint, "request body not received in time");
            return (StatusCode::REQUEST_TIMEOUT, "request body not received in time")
                .into_response();
        }
    };

    let mut request = InboundRequest::new(endpoint, body.to_vec())
        .with_correlation_id(request_id(headers))
        .with_query(query.op, query.version);
    if let Some(deadline) = received.checked_add(state.request_timeout) {
        request = request.with_deadline(deadline);
    }

    let dispatcher = state.dispatcher;
    match tokio::task::spawn_blocking(move || dispatcher.dispatch(request)).await {
        Ok(Ok(decision)) => (StatusCode::OK, Json(decision)).into_response(),
        Ok(Err(error)) => error_response(&error),
        Err(join_error) => {
            error!(target: TRANSPORT_TARGET, error = %join_error, "dispatch task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "dispatch task failed").into_response()
        }
    }
}

async fn audit_log(state: AppState, kind: OperationKind) -> Response {
    let dispatcher = state.dispatcher;
    match tokio::task::spawn_blocking(move || dispatcher.audit_log(kind)).await {
        Ok(Ok(entries)) => (StatusCode::OK, Json(entries)).into_response(),
        Ok(Err(error)) => error_response(&error),
        Err(join_error) => {
            error!(target: TRANSPORT_TARGET, error = %join_error, "audit log task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "audit log task failed").into_response()
        }
    }
}

fn request_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

fn error_response(error: &DispatchError) -> Response {
    let status = match error.class() {
        FailureClass::BadRequest => StatusCode::BAD_REQUEST,
        FailureClass::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        FailureClass::Timeout => StatusCode::GATEWAY_TIMEOUT,
        FailureClass::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, error.to_string()).into_response()
}
