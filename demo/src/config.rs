//! Environment configuration for the demo binary.

use std::fmt;

use anyhow::{bail, Context, Result};
use onlyoffice_core::{Credentials, StatusSet, TaskStatus};

pub const DEFAULT_PORTAL_URL: &str = "https://yourportal.onlyoffice.com";

#[derive(Clone)]
pub struct DemoConfig {
    pub portal_url: String,
    pub credentials: Credentials,
    pub token: Option<String>,
    pub verify_tls: bool,
    pub project_id: Option<u64>,
    pub statuses: StatusSet,
    pub output: Option<String>,
}

impl fmt::Debug for DemoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DemoConfig")
            .field("portal_url", &self.portal_url)
            .field("credentials", &self.credentials)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("verify_tls", &self.verify_tls)
            .field("project_id", &self.project_id)
            .field("statuses", &self.statuses)
            .field("output", &self.output)
            .finish()
    }
}

impl DemoConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let portal_url =
            get("ONLYOFFICE_PORTAL_URL").unwrap_or_else(|| DEFAULT_PORTAL_URL.to_string());
        let username = get("ONLYOFFICE_USERNAME");
        let password = get("ONLYOFFICE_PASSWORD");
        let (Some(username), Some(password)) = (username, password) else {
            bail!("set ONLYOFFICE_PORTAL_URL, ONLYOFFICE_USERNAME and ONLYOFFICE_PASSWORD");
        };

        let mut credentials = Credentials::new(username, password);
        if let Some(code) = get("ONLYOFFICE_AUTH_CODE") {
            credentials = credentials.with_code(code);
        }

        let verify_tls = get("VERIFY_SSL")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(true);

        let project_id = get("ONLYOFFICE_PROJECT_ID")
            .map(|v| v.trim().parse::<u64>())
            .transpose()
            .context("ONLYOFFICE_PROJECT_ID must be a number")?;

        let statuses = match get("ONLYOFFICE_TASK_STATUSES") {
            Some(list) => {
                TaskStatus::parse_list(list.split(',').map(str::trim).filter(|s| !s.is_empty()))?
            }
            None => StatusSet::all(),
        };

        Ok(Self {
            portal_url,
            credentials,
            token: get("ONLYOFFICE_AUTH_TOKEN"),
            verify_tls,
            project_id,
            statuses,
            output: get("ONLYOFFICE_OUTPUT"),
        })
    }
}
