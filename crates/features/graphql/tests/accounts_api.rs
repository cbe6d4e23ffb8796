#![cfg(feature = "password")]

use accounts_domain::config::AccountsConfig;
use accounts_graphql::{
    AccountsContext, FragmentOptions, RequestInfo, Schema, accounts_context,
    build_executable_schema, create_schema_fragment,
};
use accounts_password::{PasswordOptions, PasswordService, SERVICE_NAME};
use accounts_server::{AccountsServer, DatabaseManager, MemoryStorage, ServerOptions, ServicesMap};
use async_graphql::{Request, Variables};
use serde_json::{Value, json};
use std::sync::Arc;

fn server() -> Arc<AccountsServer> {
    let db = DatabaseManager::from_storage(Arc::new(MemoryStorage::new()));
    let mut services = ServicesMap::new();
    services.insert(SERVICE_NAME.into(), Arc::new(PasswordService::new(PasswordOptions::default())));
    Arc::new(
        AccountsServer::new(ServerOptions::new(AccountsConfig::with_secret("secret"), db), services)
            .unwrap(),
    )
}

fn schema(server: &Arc<AccountsServer>) -> Schema {
    let fragment = create_schema_fragment(server, FragmentOptions::default());
    build_executable_schema(&fragment.type_defs, &fragment.resolvers, &fragment.directives).unwrap()
}

async fn run(schema: &Schema, query: &str, variables: Value, ctx: AccountsContext) -> Value {
    let request = Request::new(query).variables(Variables::from_json(variables)).data(ctx);
    let response = schema.execute(request).await;
    let errors: Vec<_> = response.errors.iter().map(|e| e.message.clone()).collect();
    json!({ "data": response.data.into_json().unwrap(), "errors": errors })
}

const CREATE_USER: &str = "mutation($user: CreateUserInput!) { createUser(user: $user) }";
const AUTHENTICATE: &str = r#"
    mutation($username: String!, $password: String!) {
        authenticate(serviceName: "password", params: { user: { username: $username }, password: $password }) {
            sessionId
            tokens { accessToken refreshToken }
            user { id username emails { address verified } }
        }
    }
"#;
const GET_USER: &str = "{ getUser { id username } }";

#[tokio::test]
async fn create_authenticate_resume_logout() {
    let server = server();
    let schema = schema(&server);

    let created = run(
        &schema,
        CREATE_USER,
        json!({ "user": { "username": "alice", "email": "alice@example.com", "password": "hunter22" } }),
        AccountsContext::default(),
    )
    .await;
    let user_id = created["data"]["createUser"].as_str().unwrap().to_owned();

    let login = run(
        &schema,
        AUTHENTICATE,
        json!({ "username": "alice", "password": "hunter22" }),
        AccountsContext::default(),
    )
    .await;
    let login = &login["data"]["authenticate"];
    assert_eq!(login["user"]["id"], user_id);
    assert_eq!(login["user"]["emails"], json!([{ "address": "alice@example.com", "verified": false }]));
    let access = login["tokens"]["accessToken"].as_str().unwrap();

    let request = RequestInfo { authorization: Some(format!("Bearer {access}")), ..RequestInfo::default() };
    let ctx = accounts_context(&server, request.clone()).await;
    assert!(ctx.user.is_some());

    let me = run(&schema, GET_USER, json!({}), ctx.clone()).await;
    assert_eq!(me["data"]["getUser"], json!({ "id": user_id, "username": "alice" }));

    let logout = run(&schema, "mutation { logout }", json!({}), ctx).await;
    assert_eq!(logout["data"]["logout"], true);

    let after = accounts_context(&server, request).await;
    assert!(after.user.is_none());
    let me = run(&schema, GET_USER, json!({}), after).await;
    assert_eq!(me["data"]["getUser"], Value::Null);
}

#[tokio::test]
async fn guarded_fields_require_a_user() {
    let server = server();
    let schema = schema(&server);

    let result = run(
        &schema,
        r#"mutation { changePassword(oldPassword: "a", newPassword: "b") }"#,
        json!({}),
        AccountsContext::default(),
    )
    .await;
    assert_eq!(result["errors"], json!(["Unauthorized"]));
    assert_eq!(result["data"]["changePassword"], Value::Null);
}

#[tokio::test]
async fn failed_login_reports_ambiguous_error() {
    let server = server();
    let schema = schema(&server);

    let result = run(
        &schema,
        AUTHENTICATE,
        json!({ "username": "nobody", "password": "whatever" }),
        AccountsContext::default(),
    )
    .await;
    assert_eq!(result["errors"], json!(["Invalid credentials"]));
}

#[tokio::test]
async fn tokens_can_be_refreshed() {
    let server = server();
    let schema = schema(&server);
    run(
        &schema,
        CREATE_USER,
        json!({ "user": { "username": "bob", "password": "hunter22" } }),
        AccountsContext::default(),
    )
    .await;
    let login = run(
        &schema,
        AUTHENTICATE,
        json!({ "username": "bob", "password": "hunter22" }),
        AccountsContext::default(),
    )
    .await;
    let tokens = &login["data"]["authenticate"]["tokens"];

    let refreshed = run(
        &schema,
        "mutation($a: String!, $r: String!) { refreshTokens(accessToken: $a, refreshToken: $r) { sessionId user { username } } }",
        json!({ "a": tokens["accessToken"], "r": tokens["refreshToken"] }),
        AccountsContext::default(),
    )
    .await;
    assert_eq!(
        refreshed["data"]["refreshTokens"]["sessionId"],
        login["data"]["authenticate"]["sessionId"]
    );
    assert_eq!(refreshed["data"]["refreshTokens"]["user"]["username"], "bob");
}

#[test]
fn extended_fragment_extends_root_types() {
    let server = server();
    let extended = create_schema_fragment(&server, FragmentOptions { extend: true });
    let base = create_schema_fragment(&server, FragmentOptions { extend: false });

    let extended_sdl = extended.type_defs.to_string();
    assert!(extended_sdl.contains("extend type Query {"));
    assert!(extended_sdl.contains("extend type Mutation {"));
    assert!(base.type_defs.to_string().contains("\ntype Query {"));
    assert_eq!(extended.resolvers.field_names(), base.resolvers.field_names());
    assert!(base.type_defs.get("Query").is_some());
    assert!(extended.type_defs.get("Query").is_none());
}
