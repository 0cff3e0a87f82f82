use std::sync::Arc;
use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;

use iam::IamClient;
use sdk::{
    ApiRequest, AuthenticationOptions, ClientCredentials, EndpointConfig, Iam, Method, RequestBody,
    RequestId, Transport, TransportError, UserId,
};
use transport::{HttpTransport, TransportConfig};

fn transport() -> HttpTransport {
    HttpTransport::new(&TransportConfig::default()).unwrap()
}

fn request(server: &MockServer, method: Method, path: &[&str]) -> ApiRequest {
    ApiRequest {
        id: RequestId::new_random(),
        method,
        base_url: server.base_url(),
        path: path.iter().map(|s| (*s).to_owned()).collect(),
        query: Vec::new(),
        headers: Vec::new(),
        body: RequestBody::Empty,
    }
}

#[tokio::test]
async fn get_sends_query_and_headers() {
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/v1.0/user")
            .query_param("api:page", "2")
            .header("authorization", "Bearer tok")
            .header_exists("user-agent");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"[{"id":"u-1"}]"#);
    });

    let mut req = request(&server, Method::Get, &["v1.0", "user"]);
    req.query.push(("api:page".into(), "2".into()));
    req.headers.push(("authorization".into(), "Bearer tok".into()));

    let response = transport().execute(req).await.unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.header("content-type"), Some("application/json"));
    assert_eq!(response.body, br#"[{"id":"u-1"}]"#.to_vec());
    mock.assert();
}

#[tokio::test]
async fn post_json_body_and_location_header() {
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1.0/user")
            .header("content-type", "application/json")
            .json_body(json!({"username": "ana"}));
        then.status(201)
            .header("Location", "https://iam.test/v1.0/user/u-42");
    });

    let mut req = request(&server, Method::Post, &["v1.0", "user"]);
    req.body = RequestBody::Json(json!({"username": "ana"}));

    let response = transport().execute(req).await.unwrap();
    assert_eq!(response.status, 201);
    assert_eq!(
        response.header("location"),
        Some("https://iam.test/v1.0/user/u-42")
    );
    mock.assert();
}

#[tokio::test]
async fn put_and_delete_use_their_methods() {
    let server = MockServer::start();

    let put = server.mock(|when, then| {
        when.method(PUT).path("/v1.0/user/u-1/group");
        then.status(204);
    });
    let delete = server.mock(|when, then| {
        when.method(DELETE).path("/v1.0/user/u-1/group/g-1");
        then.status(204);
    });

    let http = transport();
    let mut req = request(&server, Method::Put, &["v1.0", "user", "u-1", "group"]);
    req.body = RequestBody::Json(json!(["g-1"]));
    assert_eq!(http.execute(req).await.unwrap().status, 204);

    let req = request(&server, Method::Delete, &["v1.0", "user", "u-1", "group", "g-1"]);
    assert_eq!(http.execute(req).await.unwrap().status, 204);

    put.assert();
    delete.assert();
}

#[tokio::test]
async fn form_body_is_url_encoded() {
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1.0/oauth/token")
            .header("content-type", "application/x-www-form-urlencoded")
            .body_includes("assertion=a.b.c");
        then.status(200).body("{}");
    });

    let mut req = request(&server, Method::Post, &["v1.0", "oauth", "token"]);
    req.body = RequestBody::Form(vec![("assertion".into(), "a.b.c".into())]);

    transport().execute(req).await.unwrap();
    mock.assert();
}

#[tokio::test]
async fn error_status_is_a_successful_exchange() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/v1.0/user/missing");
        then.status(404)
            .body(r#"{"error":"not_found","errorDescription":"No such user"}"#);
    });

    let req = request(&server, Method::Get, &["v1.0", "user", "missing"]);
    let response = transport().execute(req).await.unwrap();
    assert_eq!(response.status, 404);
    assert!(!response.is_success());
}

#[tokio::test]
async fn slow_server_times_out() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/v1.0/user/me");
        then.status(200).delay(Duration::from_millis(500));
    });

    let http = HttpTransport::new(&TransportConfig {
        timeout_ms: 50,
        ..TransportConfig::default()
    })
    .unwrap();

    let req = request(&server, Method::Get, &["v1.0", "user", "me"]);
    let err = http.execute(req).await.unwrap_err();
    assert!(
        matches!(err, TransportError::Timeout(d) if d == Duration::from_millis(50)),
        "got {err:?}"
    );
}

#[tokio::test]
async fn refused_connection_is_connection_error() {
    let req = ApiRequest {
        id: RequestId::new_random(),
        method: Method::Get,
        base_url: "http://127.0.0.1:1".into(),
        path: vec!["v1.0".into(), "user".into(), "me".into()],
        query: Vec::new(),
        headers: Vec::new(),
        body: RequestBody::Empty,
    };

    let err = transport().execute(req).await.unwrap_err();
    assert!(matches!(err, TransportError::Connection(_)), "got {err:?}");
}

#[tokio::test]
async fn iam_client_runs_over_http() {
    let server = MockServer::start();

    let token = server.mock(|when, then| {
        when.method(POST)
            .path("/v1.0/oauth/token")
            .body_includes("grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"accessToken":"tok-1","expiresAt":4102444800000,"refreshToken":"ref-1"}"#);
    });
    let create = server.mock(|when, then| {
        when.method(POST)
            .path("/v1.0/user")
            .header("authorization", "Bearer tok-1")
            .header_exists("x-request-id");
        then.status(201)
            .header("Location", format!("{}/v1.0/user/u-7", server.base_url()));
    });

    let endpoints = EndpointConfig {
        iam_url: server.base_url(),
        ..EndpointConfig::default()
    };
    let iam = IamClient::new(Arc::new(transport()), &endpoints);
    let client = ClientCredentials::new("client-1", "secret-1");

    let tokens = iam
        .authenticate(&client, None, &AuthenticationOptions::default())
        .await
        .unwrap();
    assert_eq!(tokens.access_token.expose(), "tok-1");

    let id = iam
        .authenticated(&tokens)
        .create_user(&sdk::User::with_username("ana"))
        .await
        .unwrap();
    assert_eq!(id, UserId::new("u-7").unwrap());

    token.assert();
    create.assert();
}
