//! Request builders and response parsers for the portal's resources.
//!
//! Every builder checks the session for a token first and returns
//! `ApiError::NotAuthenticated` without producing a request otherwise.

use serde_json::Value;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::session::Session;
use crate::types::{ProjectTasks, StatusFailure, StatusSet, TaskStatus};

pub fn build_get_people(session: &Session) -> Result<HttpRequest, ApiError> {
    session.authorized_request(HttpMethod::Get, "people.json")
}

/// Files in `folder_id`, or the root listing when no (or an empty) folder
/// id is given.
pub fn build_get_files(
    session: &Session,
    folder_id: Option<&str>,
) -> Result<HttpRequest, ApiError> {
    let path = match folder_id.filter(|id| !id.is_empty()) {
        Some(id) => format!("files/@folder/{id}.json"),
        None => "files.json".to_string(),
    };
    session.authorized_request(HttpMethod::Get, &path)
}

/// `filter` is passed through as a path segment (`@self`, `@follow`, ...).
pub fn build_get_projects(session: &Session, filter: &str) -> Result<HttpRequest, ApiError> {
    session.authorized_request(HttpMethod::Get, &format!("project/{filter}.json"))
}

pub fn build_get_project_tasks(
    session: &Session,
    project_id: u64,
    status: TaskStatus,
) -> Result<HttpRequest, ApiError> {
    session.authorized_request(HttpMethod::Get, &format!("project/{project_id}/task/{status}.json"))
}

/// One request per status in `statuses`, in allow-list order.
pub fn build_project_task_fanout(
    session: &Session,
    project_id: u64,
    statuses: &StatusSet,
) -> Result<Vec<(TaskStatus, HttpRequest)>, ApiError> {
    statuses
        .resolved()
        .into_iter()
        .map(|status| Ok((status, build_get_project_tasks(session, project_id, status)?)))
        .collect()
}

/// Decode a 200/201 body verbatim; everything else becomes `ApiError::Http`
/// with the raw body.
pub fn parse_json(response: HttpResponse) -> Result<Value, ApiError> {
    if !response.is_success() {
        return Err(ApiError::Http {
            status: response.status,
            body: response.body,
        });
    }
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// Pull the task array out of a per-status body. The portal wraps lists in
/// `{"response": [...]}`; a bare array is accepted too.
pub fn parse_task_list(response: HttpResponse) -> Result<Vec<Value>, ApiError> {
    match parse_json(response)? {
        Value::Array(tasks) => Ok(tasks),
        Value::Object(mut body) => match body.remove("response") {
            Some(Value::Array(tasks)) => Ok(tasks),
            _ => Err(ApiError::Deserialization(
                "expected a task array under \"response\"".to_string(),
            )),
        },
        _ => Err(ApiError::Deserialization("expected a task array".to_string())),
    }
}

/// Fold per-status outcomes into one result. Successful task arrays are
/// concatenated in the order given; failures are kept alongside.
pub fn merge_project_tasks<I>(outcomes: I) -> ProjectTasks
where
    I: IntoIterator<Item = (TaskStatus, Result<Vec<Value>, ApiError>)>,
{
    let mut merged = ProjectTasks::default();
    for (status, outcome) in outcomes {
        match outcome {
            Ok(tasks) => merged.tasks.extend(tasks),
            Err(err) => merged.errors.push(StatusFailure::new(status, &err)),
        }
    }
    merged
}
