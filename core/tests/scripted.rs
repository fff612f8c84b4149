//! Client behavior against a scripted transport.
//!
//! The transport answers from a closure keyed on the request URL and records
//! every request it sees, so tests can assert both on results and on what
//! did or did not go over the wire.

use std::cell::RefCell;

use onlyoffice_core::{
    ApiError, Authentication, Credentials, HttpRequest, HttpResponse, PortalClient, Session,
    StatusSet, TaskStatus, Transport, TransportError,
};
use serde_json::{json, Value};

const PORTAL: &str = "https://portal.example.com";

type Reply = Result<HttpResponse, TransportError>;

struct Scripted<F> {
    reply: F,
    sent: RefCell<Vec<HttpRequest>>,
}

impl<F: Fn(&HttpRequest) -> Reply> Scripted<F> {
    fn new(reply: F) -> Self {
        Self {
            reply,
            sent: RefCell::new(Vec::new()),
        }
    }

    fn sent(&self) -> Vec<HttpRequest> {
        self.sent.borrow().clone()
    }
}

impl<F: Fn(&HttpRequest) -> Reply> Transport for Scripted<F> {
    fn execute(&self, request: &HttpRequest) -> Reply {
        self.sent.borrow_mut().push(request.clone());
        (self.reply)(request)
    }
}

fn ok(status: u16, body: Value) -> Reply {
    Ok(HttpResponse {
        status,
        headers: Vec::new(),
        body: body.to_string(),
    })
}

fn raw(status: u16, body: &str) -> Reply {
    Ok(HttpResponse {
        status,
        headers: Vec::new(),
        body: body.to_string(),
    })
}

fn portal(request: &HttpRequest) -> Reply {
    let path = request.url.strip_prefix(PORTAL).unwrap_or(&request.url);
    match path {
        "/api/2.0/authentication.json" => {
            ok(201, json!({"response": {"token": "tok-1", "expires": "2030-01-01"}}))
        }
        "/api/2.0/authentication/logout.json" => ok(200, json!({"response": ""})),
        "/api/2.0/people.json" => ok(200, json!({"response": [{"id": "u1"}]})),
        _ => raw(404, "no route"),
    }
}

fn authorization(request: &HttpRequest) -> Option<&str> {
    request.header("Authorization")
}

#[test]
fn anonymous_calls_never_reach_the_transport() {
    let client = PortalClient::with_transport(Scripted::new(portal));
    let session = Session::new(PORTAL);

    assert!(matches!(client.get_people(&session), Err(ApiError::NotAuthenticated)));
    assert!(matches!(client.get_files(&session, None), Err(ApiError::NotAuthenticated)));
    assert!(matches!(client.get_files(&session, Some("12")), Err(ApiError::NotAuthenticated)));
    assert!(matches!(client.get_projects(&session, "@self"), Err(ApiError::NotAuthenticated)));
    assert!(matches!(
        client.get_project_tasks(&session, 220, &StatusSet::all()),
        Err(ApiError::NotAuthenticated)
    ));
    assert!(matches!(
        client.get_project_tasks_named::<&str>(&session, 220, None),
        Err(ApiError::NotAuthenticated)
    ));

    let mut session = session;
    assert!(matches!(client.logout(&mut session), Err(ApiError::NotLoggedIn)));

    assert!(client.transport().sent().is_empty());
}

#[test]
fn authorization_header_follows_login_and_logout() {
    let client = PortalClient::with_transport(Scripted::new(portal));
    let mut session = Session::new(PORTAL);

    let outcome = client
        .authenticate(&mut session, &Credentials::new("admin", "secret"))
        .unwrap();
    assert_eq!(outcome.response().unwrap()["response"]["token"], "tok-1");
    assert_eq!(session.token(), Some("tok-1"));

    client.get_people(&session).unwrap();
    client.logout(&mut session).unwrap();
    assert!(session.token().is_none());

    let sent = client.transport().sent();
    assert_eq!(sent.len(), 3);
    assert_eq!(authorization(&sent[0]), None, "login goes out anonymous");
    assert_eq!(authorization(&sent[1]), Some("Bearer tok-1"));
    assert_eq!(authorization(&sent[2]), Some("Bearer tok-1"));

    assert!(matches!(client.get_people(&session), Err(ApiError::NotAuthenticated)));
    assert_eq!(client.transport().sent().len(), 3);
}

#[test]
fn confirmed_logout_with_empty_body_ends_the_session() {
    let client = PortalClient::with_transport(Scripted::new(|_: &HttpRequest| raw(200, "")));
    let mut session = Session::new(PORTAL).with_token("abc");

    let body = client.logout(&mut session).unwrap();
    assert_eq!(body, Value::Null);
    assert!(session.token().is_none());
    assert!(session.headers().iter().all(|(name, _)| name != "Authorization"));

    assert!(matches!(client.get_people(&session), Err(ApiError::NotAuthenticated)));
    assert_eq!(client.transport().sent().len(), 1);
}

#[test]
fn held_token_is_reused_without_login() {
    let client = PortalClient::with_transport(Scripted::new(portal));
    let mut session = Session::new(PORTAL).with_token("injected");

    let outcome = client
        .authenticate(&mut session, &Credentials::new("admin", "secret"))
        .unwrap();
    assert_eq!(outcome, Authentication::Reused);
    assert_eq!(session.token(), Some("injected"));
    assert!(client.transport().sent().is_empty());

    client.get_people(&session).unwrap();
    assert_eq!(authorization(&client.transport().sent()[0]), Some("Bearer injected"));
}

#[test]
fn explicit_login_replaces_held_token() {
    let client = PortalClient::with_transport(Scripted::new(portal));
    let mut session = Session::new(PORTAL).with_token("stale");

    client.login(&mut session, &Credentials::new("admin", "secret")).unwrap();
    assert_eq!(session.token(), Some("tok-1"));
}

#[test]
fn login_transport_failure_is_reported_as_data() {
    let client = PortalClient::with_transport(Scripted::new(|_: &HttpRequest| {
        Err(TransportError::new("dns error: failed to lookup address"))
    }));
    let mut session = Session::new(PORTAL);

    let err = client
        .authenticate(&mut session, &Credentials::new("admin", "secret"))
        .unwrap_err();
    assert_eq!(err.exception(), Some("dns error: failed to lookup address"));
    assert_eq!(err.message(), "Connection error occurred");
    assert!(err.status_code().is_none());
    assert!(!session.is_authenticated());
}

#[test]
fn non_success_statuses_keep_code_and_raw_body() {
    for status in [202u16, 204, 301, 400, 401, 403, 404, 500, 502] {
        let client = PortalClient::with_transport(Scripted::new(move |_: &HttpRequest| {
            raw(status, &format!("body for {status}"))
        }));
        let session = Session::new(PORTAL).with_token("tok");

        let err = client.get_people(&session).unwrap_err();
        assert_eq!(err.status_code(), Some(status));
        assert_eq!(err.message(), format!("body for {status}"));

        let record = err.to_record();
        assert_eq!(record["error"], true);
        assert_eq!(record["status_code"], status);
    }
}

#[test]
fn files_endpoint_depends_on_folder() {
    let client = PortalClient::with_transport(Scripted::new(|_: &HttpRequest| {
        ok(200, json!({"response": []}))
    }));
    let session = Session::new(PORTAL).with_token("tok");

    client.get_files(&session, Some("@my")).unwrap();
    client.get_files(&session, None).unwrap();

    let urls: Vec<_> = client.transport().sent().into_iter().map(|r| r.url).collect();
    assert_eq!(
        urls,
        vec![
            format!("{PORTAL}/api/2.0/files/@folder/@my.json"),
            format!("{PORTAL}/api/2.0/files.json"),
        ]
    );
}

#[test]
fn invalid_status_names_are_rejected_before_any_request() {
    let client = PortalClient::with_transport(Scripted::new(portal));
    let session = Session::new(PORTAL).with_token("tok");

    let err = client
        .get_project_tasks_named(&session, 220, Some(&["open", "archived", "closed", "draft"][..]))
        .unwrap_err();
    match err {
        ApiError::InvalidStatuses(values) => assert_eq!(values, vec!["archived", "draft"]),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(client.transport().sent().is_empty());
}

#[test]
fn all_statuses_are_queried_and_partial_failure_is_kept() {
    let client = PortalClient::with_transport(Scripted::new(|request: &HttpRequest| {
        if request.url.ends_with("/task/open.json") {
            ok(200, json!({"response": [{"id": 1}, {"id": 2}]}))
        } else if request.url.ends_with("/task/closed.json") {
            Err(TransportError::new("connection reset by peer"))
        } else {
            ok(200, json!({"response": []}))
        }
    }));
    let session = Session::new(PORTAL).with_token("tok");

    let result = client.get_project_tasks_named::<&str>(&session, 220, None).unwrap();

    let sent: Vec<_> = client.transport().sent().into_iter().map(|r| r.url).collect();
    let expected: Vec<_> = TaskStatus::ALL
        .iter()
        .map(|s| format!("{PORTAL}/api/2.0/project/220/task/{s}.json"))
        .collect();
    assert_eq!(sent, expected);

    assert_eq!(result.tasks, vec![json!({"id": 1}), json!({"id": 2})]);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].status, TaskStatus::Closed);
    assert_eq!(result.errors[0].exception.as_deref(), Some("connection reset by peer"));
    assert_eq!(result.errors[0].status_code, None);

    let rendered = serde_json::to_value(&result).unwrap();
    assert_eq!(rendered["errors"][0]["status"], "closed");
    assert_eq!(rendered["errors"][0]["message"], "Connection error occurred");
}

#[test]
fn clean_fanout_has_no_errors_field() {
    let client = PortalClient::with_transport(Scripted::new(|_: &HttpRequest| {
        ok(200, json!({"response": [{"id": 9}]}))
    }));
    let session = Session::new(PORTAL).with_token("tok");

    let statuses = StatusSet::from([TaskStatus::Open, TaskStatus::Open, TaskStatus::Disable]);
    let result = client.get_project_tasks(&session, 7, &statuses).unwrap();
    assert_eq!(client.transport().sent().len(), 2);
    assert_eq!(result.tasks.len(), 2);
    assert!(serde_json::to_value(&result).unwrap().get("errors").is_none());
}

#[test]
fn per_status_http_failure_records_status_code() {
    let client = PortalClient::with_transport(Scripted::new(|request: &HttpRequest| {
        if request.url.ends_with("/task/open.json") {
            raw(403, "Access denied")
        } else {
            ok(200, json!([{"id": 4}]))
        }
    }));
    let session = Session::new(PORTAL).with_token("tok");

    let statuses = StatusSet::from([TaskStatus::Open, TaskStatus::Closed]);
    let result = client.get_project_tasks(&session, 7, &statuses).unwrap();
    assert_eq!(result.tasks, vec![json!({"id": 4})]);
    assert_eq!(result.errors[0].status_code, Some(403));
    assert_eq!(result.errors[0].message, "Access denied");
}
