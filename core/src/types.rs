//! Domain types shared by the session and the resource builders.
//!
//! Response bodies stay `serde_json::Value`; the portal's schemas are not
//! modelled here. What is typed is the input side: credentials, the task
//! status allow-list, and the shape of the task fan-out result.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

/// Project filter used when the caller does not pick one.
pub const DEFAULT_PROJECT_FILTER: &str = "@self";

/// Login input. `code` is the one-time second-factor code, if the portal
/// asks for one. `Debug` never prints the password or the code.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("code", &self.code.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            code: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// The code, unless absent or blank.
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref().filter(|c| !c.is_empty())
    }
}

/// Task status path segments the portal accepts. Declaration order is the
/// order in which the fan-out queries them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    NotAccept,
    Open,
    Closed,
    Disable,
    Unclassified,
    NotInMilestone,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 6] = [
        TaskStatus::NotAccept,
        TaskStatus::Open,
        TaskStatus::Closed,
        TaskStatus::Disable,
        TaskStatus::Unclassified,
        TaskStatus::NotInMilestone,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::NotAccept => "notaccept",
            TaskStatus::Open => "open",
            TaskStatus::Closed => "closed",
            TaskStatus::Disable => "disable",
            TaskStatus::Unclassified => "unclassified",
            TaskStatus::NotInMilestone => "notinmilestone",
        }
    }

    /// Validate a list of status names in one pass.
    ///
    /// Returns `ApiError::InvalidStatuses` naming every value outside the
    /// allow-list, in input order, so callers see all mistakes at once.
    pub fn parse_list<I, S>(values: I) -> Result<StatusSet, ApiError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = StatusSet::default();
        let mut invalid = Vec::new();
        for value in values {
            match value.as_ref().parse::<TaskStatus>() {
                Ok(status) => {
                    set.insert(status);
                }
                Err(name) => invalid.push(name),
            }
        }
        if invalid.is_empty() {
            Ok(set)
        } else {
            Err(ApiError::InvalidStatuses(invalid))
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    /// The rejected input, verbatim.
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// A deduplicated set of task statuses. An empty set means "all of them".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusSet(BTreeSet<TaskStatus>);

impl StatusSet {
    pub fn all() -> Self {
        TaskStatus::ALL.into_iter().collect()
    }

    pub fn insert(&mut self, status: TaskStatus) -> bool {
        self.0.insert(status)
    }

    pub fn contains(&self, status: TaskStatus) -> bool {
        self.0.contains(&status)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Statuses to query, in allow-list order. Empty expands to all six.
    pub fn resolved(&self) -> Vec<TaskStatus> {
        if self.0.is_empty() {
            TaskStatus::ALL.to_vec()
        } else {
            self.0.iter().copied().collect()
        }
    }
}

impl FromIterator<TaskStatus> for StatusSet {
    fn from_iter<I: IntoIterator<Item = TaskStatus>>(iter: I) -> Self {
        StatusSet(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[TaskStatus; N]> for StatusSet {
    fn from(statuses: [TaskStatus; N]) -> Self {
        statuses.into_iter().collect()
    }
}

/// Outcome of [`crate::PortalClient::authenticate`].
#[derive(Debug, Clone, PartialEq)]
pub enum Authentication {
    /// Credentials were exchanged; carries the portal's decoded response.
    Issued(Value),
    /// The session already held a token and no request was made. The token
    /// has not been checked against the portal.
    Reused,
}

impl Authentication {
    pub fn response(&self) -> Option<&Value> {
        match self {
            Authentication::Issued(body) => Some(body),
            Authentication::Reused => None,
        }
    }
}

/// One failed status query inside a task fan-out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusFailure {
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,
    pub message: String,
}

impl StatusFailure {
    pub fn new(status: TaskStatus, err: &ApiError) -> Self {
        Self {
            status,
            status_code: err.status_code(),
            exception: err.exception().map(str::to_string),
            message: err.message(),
        }
    }
}

/// Combined result of querying several task statuses.
///
/// `tasks` holds every task from the statuses that succeeded, in query
/// order. `errors` is left out of the JSON form when nothing failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectTasks {
    pub tasks: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<StatusFailure>,
}

impl ProjectTasks {
    pub fn is_partial(&self) -> bool {
        !self.errors.is_empty()
    }
}
