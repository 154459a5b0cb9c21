use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::service::{CreateProjectRequest, ProjectDto, ServiceError};
use crate::token::Claims;
use crate::App;

#[derive(Clone)]
pub struct AppState {
    app: Arc<App>,
}

/// REST surface over the application service. Read routes are open; mutating
/// routes require a bearer token from `/api/auth/login`.
pub fn build_router(app: Arc<App>) -> Router {
    Router::new()
        .route(
            "/api/projects",
            get(list_projects).post(create_project).put(update_project),
        )
        .route("/api/projects/:id", get(get_project).delete(delete_project))
        .route("/api/auth/login", post(login))
        .with_state(AppState { app })
}

pub async fn serve(app: Arc<App>, addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, build_router(app)).await
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// The repository does blocking file IO, so every service call moves onto
/// the blocking pool.
async fn run_service<T, F>(state: AppState, operation: F) -> Result<T, Response>
where
    F: FnOnce(&App) -> Result<T, ServiceError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(move || operation(&state.app)).await {
        Ok(result) => result.map_err(service_error_response),
        Err(err) => {
            tracing::error!(error = %err, "service task failed");
            Err(internal_error())
        }
    }
}

async fn list_projects(State(state): State<AppState>) -> Response {
    match run_service(state, |app| app.service().get_all()).await {
        Ok(items) => {
            tracing::info!(count = items.len(), "GET projects: ok");
            Json(items).into_response()
        }
        Err(response) => response,
    }
}

async fn get_project(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let lookup = id.clone();
    match run_service(state, move |app| app.service().get_by_id(&lookup)).await {
        Ok(Some(project)) => {
            tracing::info!(id = %id, "GET project: ok");
            Json(project).into_response()
        }
        Ok(None) => {
            tracing::warn!(id = %id, "GET project: not found");
            error_body(
                StatusCode::NOT_FOUND,
                &format!("Project with id '{}' was not found.", id),
            )
        }
        Err(response) => response,
    }
}

async fn create_project(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateProjectRequest>,
) -> Response {
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }

    match run_service(state, move |app| app.service().create(&request)).await {
        Ok(project) => {
            tracing::info!(id = %project.id, "POST project: created");
            let location = format!("/api/projects/{}", project.id);
            (
                StatusCode::CREATED,
                [(header::LOCATION, location)],
                Json(project),
            )
                .into_response()
        }
        Err(response) => response,
    }
}

async fn update_project(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(dto): Json<ProjectDto>,
) -> Response {
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }

    match run_service(state, move |app| app.service().update(&dto)).await {
        Ok(project) => {
            tracing::info!(id = %project.id, "PUT project: ok");
            Json(project).into_response()
        }
        Err(response) => response,
    }
}

async fn delete_project(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }

    let target = id.clone();
    match run_service(state, move |app| app.service().delete(&target)).await {
        Ok(()) => {
            tracing::info!(id = %id, "DELETE project: ok");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(response) => response,
    }
}

async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Response {
    if request.username.trim().is_empty() || request.password.trim().is_empty() {
        return error_body(
            StatusCode::BAD_REQUEST,
            "Username and password are required.",
        );
    }

    if !state
        .app
        .auth()
        .validate_credentials(&request.username, &request.password)
    {
        tracing::warn!(username = %request.username.trim(), "login rejected");
        return error_body(StatusCode::UNAUTHORIZED, "Invalid credentials.");
    }

    match state.app.tokens().issue(&request.username) {
        Ok(issued) => {
            tracing::info!(username = %request.username.trim(), "login ok");
            Json(json!({
                "token": issued.token,
                "tokenType": "Bearer",
                "expiresAtUtc": issued.expires_at.to_rfc3339(),
            }))
            .into_response()
        }
        Err(err) => {
            tracing::error!(error = %err, "token issuance failed");
            internal_error()
        }
    }
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<Claims, Response> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .unwrap_or("");

    if bearer.is_empty() {
        return Err(error_body(
            StatusCode::UNAUTHORIZED,
            "A bearer token is required.",
        ));
    }

    state.app.tokens().verify(bearer).map_err(|err| {
        tracing::warn!(error = %err, "rejected bearer token");
        error_body(StatusCode::UNAUTHORIZED, "Invalid token.")
    })
}

fn service_error_response(err: ServiceError) -> Response {
    match err {
        ServiceError::Validation(message) => {
            tracing::warn!(%message, "bad request");
            error_body(StatusCode::BAD_REQUEST, &message)
        }
        ServiceError::NotFound(message) => {
            tracing::warn!(%message, "not found");
            error_body(StatusCode::NOT_FOUND, &message)
        }
        ServiceError::Storage(err) => {
            tracing::error!(error = %err, "unhandled storage failure");
            internal_error()
        }
    }
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn internal_error() -> Response {
    error_body(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
}
