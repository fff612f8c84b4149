//! In-memory stand-in for an ONLYOFFICE portal.
//!
//! Serves the authentication, people, files, projects and task endpoints
//! with fixture data. Tokens are random UUIDs kept in memory; every route
//! except authentication requires `Authorization: Bearer <token>`.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const TOKEN_EXPIRES: &str = "2030-01-01T00:00:00.0000000+00:00";

/// Data the portal serves. Folder ids, project filters and task statuses are
/// the raw path segments without the `.json` suffix.
#[derive(Clone, Debug)]
pub struct Fixtures {
    pub username: String,
    pub password: String,
    /// When set, `/authentication.json` only reports that a code is needed
    /// and `/authentication/{code}` must be used.
    pub required_code: Option<String>,
    pub people: Vec<Value>,
    pub root_files: Value,
    pub folders: HashMap<String, Value>,
    pub projects: HashMap<String, Vec<Value>>,
    pub tasks: HashMap<(u64, String), Vec<Value>>,
    /// Statuses whose task query answers 500.
    pub failing_statuses: HashSet<String>,
}

impl Default for Fixtures {
    fn default() -> Self {
        let people = vec![
            json!({
                "id": "a1b2c3",
                "userName": "admin",
                "displayName": "Portal Admin",
                "email": "admin@example.com"
            }),
            json!({
                "id": "d4e5f6",
                "userName": "jdoe",
                "displayName": "J. Doe",
                "email": "jdoe@example.com"
            }),
        ];
        let root_files = json!([
            {"id": 1, "title": "My Documents", "filesCount": 2, "foldersCount": 0},
            {"id": 2, "title": "Common Documents", "filesCount": 1, "foldersCount": 0}
        ]);
        let folders = HashMap::from([
            (
                "1".to_string(),
                json!({"current": {"id": 1, "title": "My Documents"}, "files": [
                    {"id": 101, "title": "report.docx"},
                    {"id": 102, "title": "budget.xlsx"}
                ]}),
            ),
            (
                "2".to_string(),
                json!({"current": {"id": 2, "title": "Common Documents"}, "files": [
                    {"id": 201, "title": "handbook.pdf"}
                ]}),
            ),
        ]);
        let project = json!({"id": 220, "title": "Website relaunch", "status": 0});
        let projects = HashMap::from([
            ("@self".to_string(), vec![project.clone()]),
            ("@follow".to_string(), vec![project]),
        ]);
        let tasks = HashMap::from([
            (
                (220, "open".to_string()),
                vec![
                    json!({"id": 5001, "title": "Draft copy", "status": 1}),
                    json!({"id": 5002, "title": "Pick fonts", "status": 1}),
                ],
            ),
            (
                (220, "closed".to_string()),
                vec![json!({"id": 5003, "title": "Kickoff", "status": 2})],
            ),
        ]);
        Self {
            username: "admin".to_string(),
            password: "secret".to_string(),
            required_code: None,
            people,
            root_files,
            folders,
            projects,
            tasks,
            failing_statuses: HashSet::new(),
        }
    }
}

pub struct Portal {
    fixtures: Fixtures,
    tokens: RwLock<HashSet<String>>,
}

pub type SharedPortal = Arc<Portal>;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

pub fn app() -> Router {
    app_with(Fixtures::default())
}

pub fn app_with(fixtures: Fixtures) -> Router {
    let portal: SharedPortal = Arc::new(Portal {
        fixtures,
        tokens: RwLock::new(HashSet::new()),
    });
    Router::new()
        .route("/api/2.0/authentication.json", post(authenticate))
        .route("/api/2.0/authentication/logout.json", post(logout))
        .route("/api/2.0/authentication/{code}", post(authenticate_with_code))
        .route("/api/2.0/people.json", get(people))
        .route("/api/2.0/files.json", get(root_files))
        .route("/api/2.0/files/@folder/{folder}", get(folder_files))
        .route("/api/2.0/project/{key}", get(projects))
        .route("/api/2.0/project/{key}/task/{status}", get(project_tasks))
        .with_state(portal)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, Fixtures::default()).await
}

pub async fn run_with(listener: TcpListener, fixtures: Fixtures) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(fixtures)).await
}

/// Portal-style success envelope.
fn envelope(status: StatusCode, response: Value) -> Response {
    let mut body = json!({
        "response": response,
        "status": 0,
        "statusCode": status.as_u16(),
    });
    let count = body["response"].as_array().map(Vec::len);
    if let Some(count) = count {
        body["count"] = json!(count);
    }
    (status, Json(body)).into_response()
}

fn plain(status: StatusCode, message: &str) -> Response {
    (status, message.to_string()).into_response()
}

fn strip_json(segment: &str) -> &str {
    segment.strip_suffix(".json").unwrap_or(segment)
}

async fn authorize(portal: &Portal, headers: &HeaderMap) -> Result<String, Response> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);
    let Some(token) = token else {
        return Err(plain(StatusCode::UNAUTHORIZED, "Unauthorized"));
    };
    if portal.tokens.read().await.contains(&token) {
        Ok(token)
    } else {
        Err(plain(StatusCode::UNAUTHORIZED, "Unauthorized"))
    }
}

async fn issue_token(portal: &Portal) -> Response {
    let token = Uuid::new_v4().to_string();
    portal.tokens.write().await.insert(token.clone());
    tracing::info!("issued token");
    envelope(
        StatusCode::CREATED,
        json!({"token": token, "expires": TOKEN_EXPIRES}),
    )
}

fn credentials_match(fixtures: &Fixtures, input: &LoginRequest) -> bool {
    input.username == fixtures.username && input.password == fixtures.password
}

async fn authenticate(
    State(portal): State<SharedPortal>,
    Json(input): Json<LoginRequest>,
) -> Response {
    if !credentials_match(&portal.fixtures, &input) {
        return plain(StatusCode::UNAUTHORIZED, "User authentication failed");
    }
    if portal.fixtures.required_code.is_some() {
        return envelope(StatusCode::CREATED, json!({"tfa": true, "tfaKey": null}));
    }
    issue_token(&portal).await
}

async fn authenticate_with_code(
    State(portal): State<SharedPortal>,
    Path(code): Path<String>,
    Json(input): Json<LoginRequest>,
) -> Response {
    if !credentials_match(&portal.fixtures, &input) {
        return plain(StatusCode::UNAUTHORIZED, "User authentication failed");
    }
    match &portal.fixtures.required_code {
        Some(expected) if *expected == code => issue_token(&portal).await,
        _ => plain(StatusCode::UNAUTHORIZED, "Invalid authentication code"),
    }
}

async fn logout(State(portal): State<SharedPortal>, headers: HeaderMap) -> Response {
    let token = match authorize(&portal, &headers).await {
        Ok(token) => token,
        Err(resp) => return resp,
    };
    portal.tokens.write().await.remove(&token);
    envelope(StatusCode::OK, json!(""))
}

async fn people(State(portal): State<SharedPortal>, headers: HeaderMap) -> Response {
    if let Err(resp) = authorize(&portal, &headers).await {
        return resp;
    }
    envelope(StatusCode::OK, json!(portal.fixtures.people))
}

async fn root_files(State(portal): State<SharedPortal>, headers: HeaderMap) -> Response {
    if let Err(resp) = authorize(&portal, &headers).await {
        return resp;
    }
    envelope(StatusCode::OK, portal.fixtures.root_files.clone())
}

async fn folder_files(
    State(portal): State<SharedPortal>,
    Path(folder): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(resp) = authorize(&portal, &headers).await {
        return resp;
    }
    match portal.fixtures.folders.get(strip_json(&folder)) {
        Some(content) => envelope(StatusCode::OK, content.clone()),
        None => plain(StatusCode::NOT_FOUND, "The required folder was not found"),
    }
}

async fn projects(
    State(portal): State<SharedPortal>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(resp) = authorize(&portal, &headers).await {
        return resp;
    }
    let filter = strip_json(&key);
    match portal.fixtures.projects.get(filter) {
        Some(list) => envelope(StatusCode::OK, json!(list)),
        None => envelope(StatusCode::OK, json!([])),
    }
}

async fn project_tasks(
    State(portal): State<SharedPortal>,
    Path((key, status)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    if let Err(resp) = authorize(&portal, &headers).await {
        return resp;
    }
    let project_id: u64 = match key.parse() {
        Ok(id) => id,
        Err(_) => return plain(StatusCode::BAD_REQUEST, "Invalid project id"),
    };
    let status = strip_json(&status).to_string();
    if portal.fixtures.failing_statuses.contains(&status) {
        return plain(StatusCode::INTERNAL_SERVER_ERROR, "Task query failed");
    }
    let known = portal
        .fixtures
        .projects
        .values()
        .flatten()
        .any(|p| p["id"].as_u64() == Some(project_id));
    if !known {
        return plain(StatusCode::NOT_FOUND, "Project not found");
    }
    let tasks = portal
        .fixtures
        .tasks
        .get(&(project_id, status))
        .cloned()
        .unwrap_or_default();
    envelope(StatusCode::OK, json!(tasks))
}
