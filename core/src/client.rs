//! Blocking client that drives the builders and parsers through a transport.
//!
//! # Design
//! `PortalClient` owns a [`Transport`] and nothing else. Session state lives
//! in a caller-owned [`Session`] passed to each call, so one client can serve
//! several sessions and no call hides global state. Every method returns
//! `Result<_, ApiError>`; transport failures are converted, never raised.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::resources::{
    build_get_files, build_get_people, build_get_projects, build_project_task_fanout,
    merge_project_tasks, parse_json, parse_task_list,
};
use crate::session::Session;
use crate::transport::{Transport, UreqTransport};
use crate::types::{Authentication, Credentials, ProjectTasks, StatusSet, TaskStatus};

#[derive(Debug, Clone, Default)]
pub struct PortalClient<T = UreqTransport> {
    transport: T,
}

impl PortalClient<UreqTransport> {
    pub fn new() -> Self {
        Self::with_transport(UreqTransport::new())
    }
}

impl<T: Transport> PortalClient<T> {
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = %request.method, url = %request.url, "sending request");
        let response = self.transport.execute(request).map_err(|err| {
            warn!(url = %request.url, error = %err, "transport failure");
            ApiError::from(err)
        })?;
        debug!(status = response.status, url = %request.url, "received response");
        Ok(response)
    }

    /// Exchange credentials for a token, storing it in `session`.
    ///
    /// A session that already holds a token is left alone and
    /// `Authentication::Reused` is returned without contacting the portal.
    pub fn authenticate(
        &self,
        session: &mut Session,
        credentials: &Credentials,
    ) -> Result<Authentication, ApiError> {
        if session.is_authenticated() {
            debug!("session already holds a token, skipping login");
            return Ok(Authentication::Reused);
        }
        self.login(session, credentials).map(Authentication::Issued)
    }

    /// Always performs the credential exchange, replacing any held token.
    pub fn login(
        &self,
        session: &mut Session,
        credentials: &Credentials,
    ) -> Result<Value, ApiError> {
        let request = session.build_login(credentials)?;
        let body = session.apply_login(self.send(&request)?)?;
        if session.is_authenticated() {
            info!(portal = session.base_url(), user = %credentials.username, "logged in");
        } else {
            warn!(portal = session.base_url(), "login succeeded without a token in the response");
        }
        Ok(body)
    }

    pub fn logout(&self, session: &mut Session) -> Result<Value, ApiError> {
        let request = session.build_logout()?;
        let body = session.apply_logout(self.send(&request)?)?;
        info!(portal = session.base_url(), "logged out");
        Ok(body)
    }

    pub fn get_people(&self, session: &Session) -> Result<Value, ApiError> {
        let request = build_get_people(session)?;
        parse_json(self.send(&request)?)
    }

    pub fn get_files(&self, session: &Session, folder_id: Option<&str>) -> Result<Value, ApiError> {
        let request = build_get_files(session, folder_id)?;
        parse_json(self.send(&request)?)
    }

    pub fn get_projects(&self, session: &Session, filter: &str) -> Result<Value, ApiError> {
        let request = build_get_projects(session, filter)?;
        parse_json(self.send(&request)?)
    }

    /// Query each status in turn and merge the task arrays.
    ///
    /// Per-status failures land in `ProjectTasks::errors`; the call as a
    /// whole only fails when the session has no token.
    pub fn get_project_tasks(
        &self,
        session: &Session,
        project_id: u64,
        statuses: &StatusSet,
    ) -> Result<ProjectTasks, ApiError> {
        let requests = build_project_task_fanout(session, project_id, statuses)?;
        let outcomes = requests.into_iter().map(|(status, request)| {
            let outcome = self.send(&request).and_then(parse_task_list);
            if let Err(err) = &outcome {
                warn!(project_id, status = %status, error = %err, "task query failed");
            }
            (status, outcome)
        });
        Ok(merge_project_tasks(outcomes))
    }

    /// Variant of [`PortalClient::get_project_tasks`] taking status names.
    /// Names are validated before anything is sent; `None` means all.
    pub fn get_project_tasks_named<S: AsRef<str>>(
        &self,
        session: &Session,
        project_id: u64,
        statuses: Option<&[S]>,
    ) -> Result<ProjectTasks, ApiError> {
        if !session.is_authenticated() {
            return Err(ApiError::NotAuthenticated);
        }
        let statuses = match statuses {
            Some(names) => TaskStatus::parse_list(names)?,
            None => StatusSet::all(),
        };
        self.get_project_tasks(session, project_id, &statuses)
    }
}
