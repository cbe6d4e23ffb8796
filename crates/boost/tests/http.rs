#![cfg(feature = "service-password")]

mod common;

use accounts_boost::Boost;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use common::{memory_registry, options};
use serde_json::{Value, json};
use tower::ServiceExt;

async fn app() -> Router {
    let boost = Boost::builder().registry(memory_registry()).options(options()).build().await.unwrap();
    boost.router().unwrap()
}

async fn graphql(app: &Router, query: &str, token: Option<&str>) -> Value {
    let mut request = Request::post("/")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::USER_AGENT, "boost-tests");
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = request.body(Body::from(json!({ "query": query }).to_string())).unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn create_authenticate_and_read_the_user() {
    let app = app().await;

    let created = graphql(
        &app,
        r#"mutation { createUser(user: { username: "alice", email: "alice@example.com", password: "hunter22" }) }"#,
        None,
    )
    .await;
    let id = created["data"]["createUser"].as_str().unwrap().to_owned();

    let login = graphql(
        &app,
        r#"mutation {
            authenticate(serviceName: "password", params: { user: { email: "alice@example.com" }, password: "hunter22" }) {
                sessionId
                tokens { accessToken refreshToken }
                user { id username }
            }
        }"#,
        None,
    )
    .await;
    let login = &login["data"]["authenticate"];
    assert_eq!(login["user"]["id"], id.as_str());
    let token = login["tokens"]["accessToken"].as_str().unwrap();

    let me = graphql(&app, "{ getUser { id username emails { address verified } } }", Some(token)).await;
    assert_eq!(me["data"]["getUser"]["username"], "alice");
    assert_eq!(me["data"]["getUser"]["emails"][0]["address"], "alice@example.com");

    let anonymous = graphql(&app, "{ getUser { id } }", None).await;
    assert_eq!(anonymous["data"]["getUser"], Value::Null);
}

#[tokio::test]
async fn auth_directive_guards_logout() {
    let app = app().await;
    let response = graphql(&app, "mutation { logout }", None).await;
    assert_eq!(response["errors"][0]["message"], "Unauthorized");
}

#[tokio::test]
async fn health_reports_up() {
    let app = app().await;
    let response =
        app.oneshot(Request::get("/health").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store, no-cache, must-revalidate");

    let body: Value = serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.unwrap()).unwrap();
    assert_eq!(body["status"], "up");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn graphiql_is_served_on_get() {
    let app = app().await;
    let response = app.oneshot(Request::get("/").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&body).to_lowercase().contains("graphiql"));
}
