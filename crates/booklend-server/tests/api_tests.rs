//! API integration tests
//!
//! Drive the router in-process against an in-memory library.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use booklend_core::Library;
use booklend_server::{create_router, AppState};

struct TestServer {
    app: Router,
    admin_token: String,
}

impl TestServer {
    fn new() -> Self {
        let mut library = Library::in_memory().unwrap();
        let admin = library.ensure_admin("admin", "Admin").unwrap().unwrap();
        let state = Arc::new(AppState::new(library));
        Self {
            app: create_router(state),
            admin_token: admin.access_token,
        }
    }

    async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn admin(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let token = self.admin_token.clone();
        self.call(method, uri, Some(&token), body).await
    }

    /// Register a reader and return (user id, token)
    async fn reader(&self, student_id: &str) -> (String, String) {
        let (status, body) = self
            .admin(
                Method::POST,
                "/api/admin/users",
                Some(json!({ "student_id": student_id, "name": student_id })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        (
            body["user"]["id"].as_str().unwrap().to_string(),
            body["access_token"].as_str().unwrap().to_string(),
        )
    }

    async fn book(&self, title: &str, donor_id: Option<&str>) -> String {
        let (status, body) = self
            .admin(
                Method::POST,
                "/api/books",
                Some(json!({
                    "title": title,
                    "author": "Author",
                    "publisher": "Press",
                    "donor_id": donor_id,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["book"]["id"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn test_login_and_me() {
    let server = TestServer::new();
    let (_, token) = server.reader("s1").await;

    let (status, body) = server
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "student_id": "s1", "access_token": token })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["student_id"], "s1");
    assert!(body["user"].get("access_token").is_none());

    let (status, body) = server
        .call(Method::GET, "/api/auth/me", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["name"], "s1");

    let (status, _) = server
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "student_id": "s1", "access_token": "wrong" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_missing_or_unknown_token() {
    let server = TestServer::new();
    let (status, body) = server.call(Method::GET, "/api/borrows", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = server
        .call(Method::GET, "/api/borrows", Some("nope"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_borrow_round_trip() {
    let server = TestServer::new();
    let (_, token) = server.reader("s1").await;
    let book_id = server.book("Dune", None).await;

    let (status, body) = server
        .call(
            Method::POST,
            "/api/borrows",
            Some(&token),
            Some(json!({ "book_id": book_id })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["record"]["status"], "pending");
    let record_id = body["record"]["id"].as_str().unwrap().to_string();

    let (status, body) = server
        .call(Method::GET, &format!("/api/books/{}", book_id), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["book"]["status"], "pending_borrow");

    let (status, body) = server
        .admin(
            Method::PUT,
            &format!("/api/admin/borrows/{}/approve", record_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["record"]["status"], "approved");

    let (status, _) = server
        .call(
            Method::PUT,
            &format!("/api/borrows/{}/return", record_id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = server
        .admin(
            Method::PUT,
            &format!("/api/admin/borrows/{}/confirm-return", record_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["record"]["status"], "completed");

    let (_, body) = server
        .call(Method::GET, "/api/books?status=available", None, None)
        .await;
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn test_refusals_map_to_statuses() {
    let server = TestServer::new();
    let (_, first) = server.reader("s1").await;
    let (_, second) = server.reader("s2").await;
    let book_id = server.book("Dune", None).await;

    server
        .call(
            Method::POST,
            "/api/borrows",
            Some(&first),
            Some(json!({ "book_id": book_id })),
        )
        .await;
    let (status, body) = server
        .call(
            Method::POST,
            "/api/borrows",
            Some(&second),
            Some(json!({ "book_id": book_id })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = server
        .call(Method::GET, "/api/admin/borrows", Some(&first), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = server
        .call(
            Method::GET,
            &format!("/api/books/{}", booklend_core::BookId::new()),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = server
        .call(Method::GET, "/api/books/not-a-uuid", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = server
        .admin(Method::GET, "/api/admin/borrows?status=lost", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_donor_consent_over_http() {
    let server = TestServer::new();
    let (donor_id, donor) = server.reader("donor").await;
    let (_, reader) = server.reader("reader").await;
    let book_id = server.book("Gift", Some(&donor_id)).await;

    let (_, body) = server
        .call(
            Method::POST,
            "/api/borrows",
            Some(&reader),
            Some(json!({ "book_id": book_id })),
        )
        .await;
    assert_eq!(body["record"]["status"], "donor_pending");

    let (_, body) = server
        .call(Method::GET, "/api/donor/confirms", Some(&donor), None)
        .await;
    let confirms = body["confirms"].as_array().unwrap();
    assert_eq!(confirms.len(), 1);
    assert_eq!(confirms[0]["book"]["id"], book_id.as_str());
    let confirm_id = confirms[0]["id"].as_str().unwrap().to_string();

    // Only the donor may answer
    let (status, _) = server
        .call(
            Method::PUT,
            &format!("/api/donor/confirms/{}/approve", confirm_id),
            Some(&reader),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = server
        .call(
            Method::PUT,
            &format!("/api/donor/confirms/{}/approve", confirm_id),
            Some(&donor),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["confirm"]["status"], "approved");

    let (_, body) = server
        .admin(Method::GET, "/api/admin/borrows?status=pending", None)
        .await;
    assert_eq!(body["records"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_donation_and_settings() {
    let server = TestServer::new();
    let (_, token) = server.reader("s1").await;

    let (status, body) = server
        .call(
            Method::POST,
            "/api/donations",
            Some(&token),
            Some(json!({ "title": "Emma", "author": "Austen", "reason": "spare" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let donation_id = body["donation"]["id"].as_str().unwrap().to_string();

    let (status, body) = server
        .admin(
            Method::PUT,
            &format!("/api/admin/donations/{}/approve", donation_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["donation"]["id"], donation_id.as_str());
    assert_eq!(body["donation"]["status"], "approved");
    assert_eq!(body["book"]["source"], "donated");
    assert_eq!(body["book"]["title"], "Emma");

    let (_, body) = server
        .call(Method::GET, "/api/donations", Some(&token), None)
        .await;
    assert_eq!(body["donations"][0]["status"], "approved");
    assert_eq!(body["donated_books"].as_array().unwrap().len(), 1);

    let (status, body) = server
        .admin(
            Method::PUT,
            "/api/admin/settings",
            Some(json!({ "max_books_per_user": 2 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["settings"]["max_books_per_user"], "2");
    assert_eq!(body["settings"]["max_borrow_days"], "30");

    let (status, _) = server
        .admin(
            Method::PUT,
            "/api/admin/settings",
            Some(json!({ "max_books_per_user": 0 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = server
        .admin(Method::GET, "/api/admin/dashboard", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stats"]["total_books"], 1);
    assert_eq!(body["stats"]["total_users"], 1);
}

#[tokio::test]
async fn test_overdue_reminders() {
    let server = TestServer::new();
    let (_, token) = server.reader("s1").await;
    let book_id = server.book("Dune", None).await;

    let (_, body) = server
        .call(
            Method::POST,
            "/api/borrows",
            Some(&token),
            Some(json!({ "book_id": book_id })),
        )
        .await;
    let record_id = body["record"]["id"].as_str().unwrap().to_string();
    server
        .admin(
            Method::PUT,
            &format!("/api/admin/borrows/{}/approve", record_id),
            None,
        )
        .await;

    let (status, body) = server
        .admin(
            Method::POST,
            "/api/admin/overdue/send-reminder",
            Some(json!({ "record_ids": [record_id] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let reminders = body["reminders"].as_array().unwrap();
    assert_eq!(reminders.len(), 1);
    assert_eq!(reminders[0]["borrower_name"], "s1");
    assert_eq!(reminders[0]["book_title"], "Dune");

    let (status, _) = server
        .admin(
            Method::POST,
            "/api/admin/overdue/send-reminder",
            Some(json!({ "record_ids": [] })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
