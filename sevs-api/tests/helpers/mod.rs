//! Shared fixtures for sevs-api integration tests

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use sevs_api::db::{participants, staff};
use sevs_api::{build_router, AppState};
use sevs_common::api::{hash_password, TokenKeys};
use sevs_common::config::DuplicateScope;
use sevs_common::db::{init_database_in_memory, Role, Staff};
use sqlx::SqlitePool;
use tower::util::ServiceExt; // for `oneshot`

pub const TEST_SECRET: &str = "integration-test-secret";

/// Registered participants: (id, reference, name, email)
pub const PARTICIPANTS: &[(&str, &str, &str, &str)] = &[
    ("p-ada", "REF100", "Ada Lovelace", "a@x.com"),
    ("p-bob", "REF101", "Bob Builder", "b@x.com"),
    ("p-cy", "REF102", "Cy Young", "c@x.com"),
];

pub async fn seed_participants(pool: &SqlitePool) {
    for (i, (id, reference, name, email)) in PARTICIPANTS.iter().enumerate() {
        let record = participants::ParticipantRecord {
            reference_no: reference.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            mobile_no: format!("900000000{}", i),
            ..Default::default()
        };
        participants::upsert(pool, id, &record, i as i64).await.unwrap();
    }
}

/// In-memory state with the participant fixtures loaded
pub async fn setup_state(scope: DuplicateScope) -> AppState {
    let pool = init_database_in_memory().await.unwrap();
    seed_participants(&pool).await;
    AppState::new(pool, TokenKeys::new(TEST_SECRET, None, 24), scope)
}

/// Router over the given state
pub fn setup_app(state: &AppState) -> Router {
    build_router(state.clone())
}

/// Staff identity used for token issue
pub fn staff_member(role: Role) -> Staff {
    let code = match role {
        Role::Admin => "ADMIN001",
        Role::Coordinator => "COORD001",
        Role::Staff => "STAFF001",
    };
    Staff {
        id: format!("row-{}", code),
        staff_id: code.to_string(),
        name: format!("{} user", role),
        email: format!("{}@event.com", code.to_lowercase()),
        password_hash: String::new(),
        role,
    }
}

/// Bearer token for a role, signed with the test keys
pub fn token_for(state: &AppState, role: Role) -> String {
    state.keys.issue(&staff_member(role)).unwrap()
}

/// Store a staff account with a real password hash (for login tests)
pub async fn create_staff(pool: &SqlitePool, role: Role, password: &str) -> Staff {
    let member = staff_member(role);
    let hash = hash_password(password).unwrap();
    staff::upsert(
        pool,
        &member.id,
        &member.staff_id,
        &member.name,
        &member.email,
        &hash,
        role,
        0,
    )
    .await
    .unwrap()
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Send a request and decode the JSON response body
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

/// Registration spreadsheet with one row; reference, mobile and amount are
/// numeric cells
pub fn registration_workbook() -> Vec<u8> {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();
    let headers = ["Reference No.", "Prefix", "Name", "E-Mail", "Mobile No.", "Amount Paid (INR)"];
    for (col, label) in headers.iter().enumerate() {
        sheet.write_string(0, col as u16, *label).unwrap();
    }
    sheet.write_number(1, 0, 1001.0).unwrap();
    sheet.write_string(1, 1, "Dr.").unwrap();
    sheet.write_string(1, 2, "Grace Hopper").unwrap();
    sheet.write_string(1, 3, "g@x.com").unwrap();
    sheet.write_number(1, 4, 9876543210.0).unwrap();
    sheet.write_number(1, 5, 1500.5).unwrap();
    workbook.save_to_buffer().unwrap()
}
