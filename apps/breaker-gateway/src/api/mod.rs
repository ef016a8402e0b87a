// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::{
    auth::require_token,
    breaker::{AccountPermissions, AccountsResponse, DisabledListResponse, PageResponse, Permissions},
    state::AppState,
};

pub mod access_log;
pub mod status;
pub mod webhook;

use webhook::{PayloadV1, WebhookResponse};

/// Build the gateway router.
///
/// Layer order, outermost first: request id, access log, then the token
/// gate on the routes that need it.
pub fn router(state: AppState) -> Router {
    let webhook_routes = Router::new()
        .route("/webhook", post(webhook::handle_webhook_v1))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token));

    let mut status_routes = Router::new()
        .route("/listDisabledCommands", get(status::list_disabled_commands))
        .route("/list/disabledCommands", get(status::list_disabled_commands))
        .route("/accounts", get(status::list_accounts))
        .route("/list/accounts", get(status::list_accounts));
    if state.config.status_requires_auth {
        status_routes = status_routes
            .route_layer(middleware::from_fn_with_state(state.clone(), require_token));
    }

    let v1_routes = Router::new()
        .merge(webhook_routes)
        .nest("/status", status_routes)
        .with_state(state);

    Router::new()
        .nest("/v1", v1_routes)
        .route("/api-doc/openapi.json", get(openapi_json))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(middleware::from_fn(access_log::access_log)),
        )
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        webhook::handle_webhook_v1,
        status::list_disabled_commands,
        status::list_accounts
    ),
    components(
        schemas(
            PayloadV1,
            WebhookResponse,
            DisabledListResponse,
            AccountsResponse,
            AccountPermissions,
            Permissions,
            PageResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Webhook", description = "Trip and reset circuits"),
        (name = "Status", description = "Read-only circuit breaker queries")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
