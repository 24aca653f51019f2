use std::{sync::Arc, time::Duration};

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use execbox_core::{
    config::ResourceLimits,
    registry::LanguageRegistry,
    runtime::{MockExit, MockLogs, MockRuntime, MockScript},
    sandbox::Orchestrator,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::{auth, config::Config, route::create_router, state::AppState};

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

fn app_with(runtime: Arc<MockRuntime>, config: Config) -> Router {
    let registry = Arc::new(LanguageRegistry::builtin().unwrap());
    let orchestrator = Orchestrator::new(runtime);
    create_router(AppState::new(Arc::new(config), registry, orchestrator))
}

fn dev_config() -> Config {
    Config::new(None, "127.0.0.1", 5001, true).unwrap()
}

fn app(script: MockScript) -> (Router, Arc<MockRuntime>) {
    let runtime = Arc::new(MockRuntime::new(script));
    (app_with(Arc::clone(&runtime), dev_config()), runtime)
}

fn execute_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/execute")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[tokio::test]
async fn test_execute_returns_output_and_exit_code() {
    let (app, runtime) = app(MockScript::default());

    let (status, body) = send(
        app,
        execute_request(json!({"language": "python", "code": "print('hello')"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["output"], "print('hello')");
    assert_eq!(body["exit_code"], 0);
    assert_eq!(runtime.live_units(), 0);
}

#[tokio::test]
async fn test_execute_accepts_aliases_and_reports_nonzero_exit() {
    let (app, _) = app(MockScript {
        exit: MockExit::Code(1),
        logs: MockLogs::Fixed(b"Traceback: boom\n".to_vec()),
        ..Default::default()
    });

    let (status, body) = send(
        app,
        execute_request(json!({"language": "py", "code": "raise Exception('boom')"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["output"], "Traceback: boom\n");
    assert_eq!(body["exit_code"], 1);
}

#[tokio::test]
async fn test_execute_rejects_missing_fields() {
    for body in [
        json!({"code": "print(1)"}),
        json!({"language": "python"}),
        json!({"language": "", "code": "print(1)"}),
        json!({"language": "python", "code": ""}),
    ] {
        let (app, runtime) = app(MockScript::default());
        let (status, body) = send(app, execute_request(body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing 'language' or 'code' field");
        assert_eq!(runtime.creates(), 0);
    }
}

#[tokio::test]
async fn test_execute_rejects_unreadable_body() {
    let (app, runtime) = app(MockScript::default());
    let request = Request::builder()
        .method("POST")
        .uri("/api/execute")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing 'language' or 'code' field");
    assert_eq!(runtime.creates(), 0);
}

#[tokio::test]
async fn test_execute_rejects_unsupported_language() {
    let (app, runtime) = app(MockScript::default());

    let (status, body) = send(
        app,
        execute_request(json!({"language": "cobol", "code": "DISPLAY 'HI'."})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Language 'cobol' is not supported for server-side execution."
    );
    assert_eq!(runtime.creates(), 0);
}

#[tokio::test]
async fn test_execute_rejects_oversized_code() {
    let runtime = Arc::new(MockRuntime::default());
    let config = dev_config().with_max_code_bytes(8).unwrap();
    let app = app_with(Arc::clone(&runtime), config);

    let (status, body) = send(
        app,
        execute_request(json!({"language": "python", "code": "print('too long')"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("8 bytes"));
    assert_eq!(runtime.creates(), 0);
}

#[tokio::test]
async fn test_execute_reports_missing_image() {
    let (app, runtime) = app(MockScript {
        missing_images: vec!["python:3.12-slim".to_string()],
        ..Default::default()
    });

    let (status, body) = send(
        app,
        execute_request(json!({"language": "python", "code": "print(1)"})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["error"],
        "Docker image for python not found. Please contact admin."
    );
    assert_eq!(runtime.starts(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_execute_reports_timeout_as_success() {
    let runtime = Arc::new(MockRuntime::new(MockScript {
        exit: MockExit::Hang,
        logs: MockLogs::Fixed(Vec::new()),
        ..Default::default()
    }));
    let config = dev_config().with_limits(ResourceLimits::default());
    let app = app_with(Arc::clone(&runtime), config);

    let (status, body) = send(
        app,
        execute_request(json!({"language": "go", "code": "package main\nfunc main() { for {} }"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["output"], "Error: Execution Timed Out (Limit: 5s)");
    assert_eq!(body["exit_code"], 124);
    assert_eq!(runtime.kills(), 1);
    assert_eq!(runtime.live_units(), 0);
}

#[tokio::test]
async fn test_execute_reports_runtime_failure() {
    let (app, runtime) = app(MockScript {
        start_error: Some("cgroup setup failed".to_string()),
        ..Default::default()
    });

    let (status, body) = send(
        app,
        execute_request(json!({"language": "ruby", "code": "puts 1"})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("cgroup setup failed"));
    assert_eq!(runtime.live_units(), 0);
}

#[tokio::test]
async fn test_execute_requires_token_when_key_is_set() {
    let runtime = Arc::new(MockRuntime::default());
    let config = Config::new(Some("secret".to_string()), "127.0.0.1", 5001, false).unwrap();
    let app = app_with(Arc::clone(&runtime), config);

    let (status, _) = send(
        app.clone(),
        execute_request(json!({"language": "python", "code": "print(1)"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let mut forged = execute_request(json!({"language": "python", "code": "print(1)"}));
    let token = auth::issue_token("other", "7", chrono::Duration::hours(1)).unwrap();
    forged.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {}", token).parse().unwrap(),
    );
    let (status, _) = send(app.clone(), forged).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(runtime.creates(), 0);

    let mut request = execute_request(json!({"language": "python", "code": "print(1)"}));
    let token = auth::issue_token("secret", "7", chrono::Duration::hours(1)).unwrap();
    request.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {}", token).parse().unwrap(),
    );
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["output"], "print(1)");
}

#[tokio::test]
async fn test_health_is_public() {
    let runtime = Arc::new(MockRuntime::default());
    let config = Config::new(Some("secret".to_string()), "127.0.0.1", 5001, false).unwrap();
    let app = app_with(runtime, config);

    let request = Request::builder()
        .uri("/api/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Service is healthy");
}

#[tokio::test]
async fn test_languages_lists_builtin_profiles() {
    let (app, _) = app(MockScript::default());

    let request = Request::builder()
        .uri("/api/languages")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    let languages: Vec<&str> = body["languages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|info| info["language"].as_str().unwrap())
        .collect();
    assert!(languages.contains(&"python"));
    assert!(languages.contains(&"java"));
    assert!(!languages.contains(&"py"));
    assert!(languages.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[tokio::test]
async fn test_concurrent_requests_do_not_share_output() {
    let runtime = Arc::new(MockRuntime::new(MockScript {
        exit: MockExit::After(Duration::from_millis(20), 0),
        ..Default::default()
    }));
    let config = dev_config().with_max_concurrent(4).unwrap();
    let app = app_with(Arc::clone(&runtime), config);

    let tasks: Vec<_> = (0..12)
        .map(|i| {
            let app = app.clone();
            tokio::spawn(async move {
                let code = format!("print({})", i);
                let (status, body) = send(
                    app,
                    execute_request(json!({"language": "python", "code": code})),
                )
                .await;
                (status, body, code)
            })
        })
        .collect();

    for task in tasks {
        let (status, body, code) = task.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["output"], code);
    }
    assert_eq!(runtime.creates(), 12);
    assert_eq!(runtime.live_units(), 0);
}
