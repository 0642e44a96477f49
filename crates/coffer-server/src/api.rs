use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use coffer_shared::crypto::{hash_password, session_expiry, verify_password};
use coffer_shared::types::{parse_flag, require_name, require_param};
use coffer_store::{Database, FileEntry, StoreError};

use crate::auth;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::extract::{read_body, ApiQuery};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<ServerConfig>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/info", get(server_info))
        .route("/init-db", get(init_db))
        .route("/register", get(register))
        .route("/login", get(login))
        .route("/logout", get(logout))
        .route(
            "/file",
            get(file_download)
                .post(file_upload)
                .patch(file_rename)
                .delete(file_delete),
        )
        .route("/file-list", get(file_list))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run store work on the blocking pool; SQLite and bcrypt both block.
async fn run_blocking<T, F>(f: F) -> Result<T, ServerError>
where
    F: FnOnce() -> Result<T, ServerError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ServerError::Internal(format!("Blocking task failed: {e}")))?
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct ServerInfoResponse {
    name: String,
    version: &'static str,
    registration_open: bool,
    max_file_size: usize,
}

#[derive(Deserialize)]
struct CredentialsQuery {
    name: Option<String>,
    password: Option<String>,
    remember_me: Option<String>,
}

#[derive(Deserialize)]
struct SessionQuery {
    session_token: Option<String>,
}

#[derive(Deserialize)]
struct FileQuery {
    session_token: Option<String>,
    file_name: Option<String>,
}

#[derive(Deserialize)]
struct RenameQuery {
    session_token: Option<String>,
    file_name: Option<String>,
    new_file_name: Option<String>,
}

async fn root() -> &'static str {
    "Coffer file storage"
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn server_info(State(state): State<AppState>) -> Json<ServerInfoResponse> {
    Json(ServerInfoResponse {
        name: state.config.instance_name.clone(),
        version: env!("CARGO_PKG_VERSION"),
        registration_open: state.config.registration_open,
        max_file_size: state.config.max_file_size,
    })
}

async fn init_db(
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<StatusCode, ServerError> {
    auth::verify_admin_token(&headers, &state.config)?;

    let db = state.db.clone();
    let applied = run_blocking(move || Ok(db.run_migrations()?)).await?;

    info!(applied, "Database schema initialized");
    Ok(StatusCode::OK)
}

// ─── Accounts ───

/// 200 with the token as the body and as a cookie.
fn session_response(token: String, expires_at: DateTime<Utc>, secure: bool) -> Response {
    let cookie = auth::session_cookie(&token, expires_at, secure);
    (StatusCode::OK, [(header::SET_COOKIE, cookie)], token).into_response()
}

async fn register(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CredentialsQuery>,
) -> Result<Response, ServerError> {
    if !state.config.registration_open {
        return Err(ServerError::Forbidden("Registration is closed".into()));
    }

    let remember_me = parse_flag(query.remember_me.as_deref());
    let cost = state.config.bcrypt_cost;
    let db = state.db.clone();

    let (token, expires_at) = run_blocking(move || {
        let name = require_name("name", query.name.as_deref())?;
        let password = require_param("password", query.password.as_deref())?;

        let hash = hash_password(password, cost)?;
        let token = db.issue_session_token()?;
        let expires_at = session_expiry(Utc::now(), remember_me);

        let id = db
            .create_user(name, &hash, &token, expires_at)
            .map_err(|e| match e {
                StoreError::Conflict(_) => {
                    ServerError::BadRequest(format!("Name '{name}' is already taken"))
                }
                other => other.into(),
            })?;

        info!(user_id = %id, name, "User registered");
        Ok((token, expires_at))
    })
    .await?;

    Ok(session_response(token, expires_at, state.config.cookie_secure))
}

async fn login(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CredentialsQuery>,
) -> Result<Response, ServerError> {
    let remember_me = parse_flag(query.remember_me.as_deref());
    let db = state.db.clone();

    let (token, expires_at) = run_blocking(move || {
        let invalid = || ServerError::Forbidden("Invalid login or password".into());

        let name = require_param("name", query.name.as_deref())?;
        let password = require_param("password", query.password.as_deref())?;

        let user = match db.get_user_by_name(name) {
            Ok(user) => user,
            Err(StoreError::NotFound) => {
                warn!(name, "Login for unknown user");
                return Err(invalid());
            }
            Err(e) => return Err(e.into()),
        };

        if !verify_password(password, &user.password_hash) {
            warn!(user_id = %user.id, "Login with wrong password");
            return Err(invalid());
        }

        let token = db.issue_session_token()?;
        let expires_at = session_expiry(Utc::now(), remember_me);
        db.start_session(user.id, &token, expires_at)?;

        info!(user_id = %user.id, remember_me, "User logged in");
        Ok((token, expires_at))
    })
    .await?;

    Ok(session_response(token, expires_at, state.config.cookie_secure))
}

/// Always succeeds; an unknown token simply logs nobody out.
async fn logout(
    headers: HeaderMap,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SessionQuery>,
) -> Result<Response, ServerError> {
    if let Some(token) = auth::session_token(query.session_token.as_deref(), &headers) {
        let db = state.db.clone();
        let ended = run_blocking(move || Ok(db.end_session(&token)?)).await?;
        if ended {
            info!("User logged out");
        }
    }

    let cookie = auth::expired_session_cookie(state.config.cookie_secure);
    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)]).into_response())
}

// ─── Files ───

async fn file_upload(
    headers: HeaderMap,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<FileQuery>,
    body: Body,
) -> Result<StatusCode, ServerError> {
    let token = auth::session_token(query.session_token.as_deref(), &headers);
    let db = state.db.clone();

    let (owner, name) = run_blocking(move || {
        let user = auth::authenticate(&db, token.as_deref())?;
        let name = require_name("file_name", query.file_name.as_deref())?;
        Ok((user.id, name.to_string()))
    })
    .await?;

    let data = read_body(body, state.config.max_file_size).await?;
    let size = data.len();

    let db = state.db.clone();
    let file = name.clone();
    run_blocking(move || Ok(db.upsert_file(owner, &file, &data)?)).await?;

    info!(user_id = %owner, file = %name, size, "File stored");
    Ok(StatusCode::OK)
}

async fn file_download(
    headers: HeaderMap,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<FileQuery>,
) -> Result<Response, ServerError> {
    let token = auth::session_token(query.session_token.as_deref(), &headers);
    let db = state.db.clone();

    let data = run_blocking(move || {
        let user = auth::authenticate(&db, token.as_deref())?;
        let name = require_name("file_name", query.file_name.as_deref())?;

        db.get_file(user.id, name).map_err(|e| match e {
            StoreError::NotFound => ServerError::NotFound(format!("File '{name}' not found")),
            other => other.into(),
        })
    })
    .await?;

    Ok(([(header::CONTENT_TYPE, "application/octet-stream")], data).into_response())
}

async fn file_rename(
    headers: HeaderMap,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<RenameQuery>,
) -> Result<StatusCode, ServerError> {
    let token = auth::session_token(query.session_token.as_deref(), &headers);
    let db = state.db.clone();

    run_blocking(move || {
        let user = auth::authenticate(&db, token.as_deref())?;
        let name = require_name("file_name", query.file_name.as_deref())?;
        let new_name = require_name("new_file_name", query.new_file_name.as_deref())?;

        db.rename_file(user.id, name, new_name).map_err(|e| match e {
            StoreError::NotFound => ServerError::NotFound(format!("File '{name}' not found")),
            StoreError::Conflict(_) => {
                ServerError::BadRequest(format!("A file named '{new_name}' already exists"))
            }
            other => other.into(),
        })?;

        info!(user_id = %user.id, from = name, to = new_name, "File renamed");
        Ok(())
    })
    .await?;

    Ok(StatusCode::OK)
}

async fn file_delete(
    headers: HeaderMap,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<FileQuery>,
) -> Result<StatusCode, ServerError> {
    let token = auth::session_token(query.session_token.as_deref(), &headers);
    let db = state.db.clone();

    run_blocking(move || {
        let user = auth::authenticate(&db, token.as_deref())?;
        let name = require_name("file_name", query.file_name.as_deref())?;

        if !db.delete_file(user.id, name)? {
            return Err(ServerError::NotFound(format!("File '{name}' not found")));
        }

        info!(user_id = %user.id, file = name, "File deleted");
        Ok(())
    })
    .await?;

    Ok(StatusCode::OK)
}

async fn file_list(
    headers: HeaderMap,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SessionQuery>,
) -> Result<Json<Vec<FileEntry>>, ServerError> {
    let token = auth::session_token(query.session_token.as_deref(), &headers);
    let db = state.db.clone();

    let files = run_blocking(move || {
        let user = auth::authenticate(&db, token.as_deref())?;
        Ok(db.list_files(user.id)?)
    })
    .await?;

    Ok(Json(files))
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
