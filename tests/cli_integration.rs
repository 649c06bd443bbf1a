use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "3ef6e4b9a8d14b0c9f2a7d5e6c1b0a98";

#[test]
fn test_cli_help_succeeds() {
    let output = cargo_bin_cmd!("tonicpow")
        .arg("--help")
        .output()
        .expect("run tonicpow");
    assert!(output.status.success(), "help should exit 0");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage"), "help should include usage text");
    assert!(stdout.contains("extract-token"));
}

#[test]
fn test_cli_extract_token_is_offline() {
    let output = cargo_bin_cmd!("tonicpow")
        .env_remove("TONICPOW_API_KEY")
        .args(["extract-token", "Cookie: theme=dark; session_token=abc%3D123"])
        .output()
        .expect("run tonicpow");
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "abc=123");
}

#[test]
fn test_cli_missing_api_key_exit_code() {
    let output = cargo_bin_cmd!("tonicpow")
        .env_remove("TONICPOW_API_KEY")
        .arg("session")
        .output()
        .expect("run tonicpow");
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid api key"));
}

fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn test_cli_rate_prints_json() {
    if !can_bind_localhost() {
        return;
    }

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/rates/usd"))
        .and(query_param("amount", "2"))
        .and(header("cookie", "session_token=cli-token"))
        .and(header("x-request-source", "cli"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "currency": "usd", "price": 1.5 })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let output = cargo_bin_cmd!("tonicpow")
        .env("TONICPOW_API_KEY", API_KEY)
        .args(["--api-url", &server.uri(), "--token", "cli-token"])
        .args(["-H", "X-Request-Source: cli", "rate", "usd", "--amount", "2"])
        .output()
        .expect("run tonicpow");

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let body: serde_json::Value = serde_json::from_str(&stdout).expect("json output");
    assert_eq!(body["currency"], "usd");
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn test_cli_api_error_exit_code() {
    if !can_bind_localhost() {
        return;
    }

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/campaigns/details/404"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({ "code": 404, "message": "campaign not found" })),
        )
        .mount(&server)
        .await;

    let output = cargo_bin_cmd!("tonicpow")
        .env("TONICPOW_API_KEY", API_KEY)
        .args(["--api-url", &server.uri(), "--token", "cli-token", "campaign", "404"])
        .output()
        .expect("run tonicpow");

    assert_eq!(output.status.code(), Some(22));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("campaign not found"));
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn test_cli_headers_reach_session_call() {
    if !can_bind_localhost() {
        return;
    }

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/session"))
        .and(header("x-request-source", "cli"))
        .respond_with(
            ResponseTemplate::new(201).insert_header("set-cookie", "session_token=fresh-token; Path=/"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let output = cargo_bin_cmd!("tonicpow")
        .env("TONICPOW_API_KEY", API_KEY)
        .args(["--api-url", &server.uri(), "-H", "X-Request-Source: cli", "session"])
        .output()
        .expect("run tonicpow");

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "fresh-token");
}
