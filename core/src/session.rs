//! Authentication state for one portal.
//!
//! # Design
//! `Session` is a plain value owned by the caller. Resource builders borrow
//! it immutably; only login and logout need `&mut`. Like the resource
//! builders, the credential exchange is split into `build_*` and `apply_*`
//! halves so it can be driven by any transport.
//!
//! The `Authorization` header is present in [`Session::headers`] exactly when
//! a token is held. All token mutation goes through `set_token` and
//! `clear_token` to keep that true.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::resources::parse_json;
use crate::types::Credentials;

const AUTHORIZATION: &str = "Authorization";
const CONTENT_TYPE: &str = "Content-Type";

#[derive(Serialize)]
struct LoginBody<'a> {
    username: &'a str,
    password: &'a str,
}

/// Portal address, TLS policy, and the current bearer token.
#[derive(Clone)]
pub struct Session {
    base_url: String,
    verify_tls: bool,
    token: Option<String>,
    headers: Vec<(String, String)>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(name, value)| {
                if name == AUTHORIZATION {
                    (name.as_str(), "Bearer <redacted>")
                } else {
                    (name.as_str(), value.as_str())
                }
            })
            .collect();
        f.debug_struct("Session")
            .field("base_url", &self.base_url)
            .field("verify_tls", &self.verify_tls)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("headers", &headers)
            .finish()
    }
}

impl Session {
    pub fn new(portal_url: &str) -> Self {
        Self {
            base_url: portal_url.trim_end_matches('/').to_string(),
            verify_tls: true,
            token: None,
            headers: vec![(CONTENT_TYPE.to_string(), "application/json".to_string())],
        }
    }

    /// Seed the session with a token obtained elsewhere, skipping login.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.set_token(token.into());
        self
    }

    pub fn with_verify_tls(mut self, verify_tls: bool) -> Self {
        self.verify_tls = verify_tls;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn verify_tls(&self) -> bool {
        self.verify_tls
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn set_token(&mut self, token: String) {
        self.headers.retain(|(name, _)| name != AUTHORIZATION);
        self.headers
            .push((AUTHORIZATION.to_string(), format!("Bearer {token}")));
        self.token = Some(token);
    }

    pub fn clear_token(&mut self) {
        self.token = None;
        self.headers.retain(|(name, _)| name != AUTHORIZATION);
    }

    /// Absolute URL for a path below `/api/2.0/`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/api/2.0/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Request carrying the current headers, regardless of token state.
    pub fn request(&self, method: HttpMethod, path: &str) -> HttpRequest {
        HttpRequest {
            method,
            url: self.endpoint(path),
            headers: self.headers.clone(),
            body: None,
            verify_tls: self.verify_tls,
        }
    }

    /// Like [`Session::request`] but refuses to build anything without a
    /// token.
    pub fn authorized_request(
        &self,
        method: HttpMethod,
        path: &str,
    ) -> Result<HttpRequest, ApiError> {
        if !self.is_authenticated() {
            return Err(ApiError::NotAuthenticated);
        }
        Ok(self.request(method, path))
    }

    pub fn build_login(&self, credentials: &Credentials) -> Result<HttpRequest, ApiError> {
        let path = match credentials.code() {
            Some(code) => format!("authentication/{code}"),
            None => "authentication.json".to_string(),
        };
        let body = serde_json::to_string(&LoginBody {
            username: &credentials.username,
            password: &credentials.password,
        })
        .map_err(|e| ApiError::Serialization(e.to_string()))?;

        let mut request = self.request(HttpMethod::Post, &path);
        request.body = Some(body);
        Ok(request)
    }

    /// Consume the login response. Stores the token when the body carries
    /// one under `response.token`; a success body without a token is
    /// returned as-is and leaves the session unauthenticated.
    pub fn apply_login(&mut self, response: HttpResponse) -> Result<Value, ApiError> {
        let body = parse_json(response)?;
        if let Some(token) = body
            .get("response")
            .and_then(|r| r.get("token"))
            .and_then(Value::as_str)
        {
            self.set_token(token.to_string());
        }
        Ok(body)
    }

    pub fn build_logout(&self) -> Result<HttpRequest, ApiError> {
        if !self.is_authenticated() {
            return Err(ApiError::NotLoggedIn);
        }
        Ok(self.request(HttpMethod::Post, "authentication/logout.json"))
    }

    /// Consume the logout response. The token is dropped as soon as the
    /// portal confirms with 200/201, before the body is looked at. An empty
    /// confirmation body decodes to `Value::Null`.
    pub fn apply_logout(&mut self, response: HttpResponse) -> Result<Value, ApiError> {
        if !response.is_success() {
            return Err(ApiError::Http {
                status: response.status,
                body: response.body,
            });
        }
        self.clear_token();
        if response.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }
}
