//! Log in to a portal and dump one resource as pretty JSON.
//!
//! Configuration comes from the environment, see `config.rs`. With
//! `ONLYOFFICE_PROJECT_ID` set the project's tasks are fetched, otherwise the
//! people list. `ONLYOFFICE_OUTPUT` additionally writes the result to a file.

mod config;

use std::fs;
use std::process::ExitCode;

use anyhow::{Context, Result};
use onlyoffice_core::{Authentication, PortalClient, Session};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use config::DemoConfig;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let cfg = DemoConfig::from_env()?;

    let client = PortalClient::new();
    let mut session = Session::new(&cfg.portal_url).with_verify_tls(cfg.verify_tls);
    if let Some(token) = &cfg.token {
        session = session.with_token(token.clone());
    }

    let auth = match client.authenticate(&mut session, &cfg.credentials) {
        Ok(Authentication::Issued(body)) => body,
        Ok(Authentication::Reused) => serde_json::json!({"response": {"token": "(provided)"}}),
        Err(err) => {
            println!("Authentication result:\n{}", pretty(&err.to_record())?);
            println!("Authentication failed");
            let status = err.status_code().map_or("-".to_string(), |s| s.to_string());
            println!("Status code: {status}");
            println!("Error message: {}", err.message());
            return Ok(ExitCode::FAILURE);
        }
    };
    println!("Authentication result:\n{}", pretty(&auth)?);

    if !session.is_authenticated() {
        println!(
            "Portal did not return a token; \
             set ONLYOFFICE_AUTH_CODE if a one-time code is required"
        );
        return Ok(ExitCode::FAILURE);
    }
    println!("\nAuthentication successful!");

    let result = match cfg.project_id {
        Some(project_id) => {
            println!("\nRetrieving tasks for project {project_id}...");
            match client.get_project_tasks(&session, project_id, &cfg.statuses) {
                Ok(tasks) => serde_json::to_value(&tasks)?,
                Err(err) => err.to_record(),
            }
        }
        None => {
            println!("\nRetrieving people...");
            client.get_people(&session).unwrap_or_else(|err| err.to_record())
        }
    };
    let rendered = pretty(&result)?;
    println!("Result:\n{rendered}");

    if let Some(path) = &cfg.output {
        fs::write(path, &rendered).with_context(|| format!("writing {path}"))?;
        tracing::info!(path = %path, "result written");
    }

    Ok(ExitCode::SUCCESS)
}

fn pretty(value: &Value) -> Result<String> {
    serde_json::to_string_pretty(value).context("rendering JSON")
}
