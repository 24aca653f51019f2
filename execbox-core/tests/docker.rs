//! Integration tests against a real Docker daemon.
//!
//! These need a reachable daemon and network access to pull the language images, so they are
//! ignored by default. Run them with `cargo test -p execbox-core --test docker -- --ignored`.

use std::{sync::Arc, time::Duration};

use execbox_core::{
    config::ResourceLimits,
    registry::LanguageRegistry,
    runtime::{DockerRuntime, SandboxRuntime},
    sandbox::{ExecutionRequest, ExecutionStatus, Orchestrator},
};

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

fn setup() -> (Orchestrator, LanguageRegistry) {
    let runtime: Arc<dyn SandboxRuntime> = Arc::new(DockerRuntime::connect(true).unwrap());
    (
        Orchestrator::new(runtime),
        LanguageRegistry::builtin().unwrap(),
    )
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn test_python_hello() {
    let (orchestrator, registry) = setup();

    let result = orchestrator
        .execute_request(
            &registry,
            &ExecutionRequest::new("python", "print('hi')"),
            &ResourceLimits::default().with_timeout(Duration::from_secs(60)),
        )
        .await
        .unwrap();

    assert_eq!(result.status, ExecutionStatus::Completed);
    assert_eq!(result.output, "hi\n");
    assert_eq!(result.exit_code, 0);
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn test_shell_metacharacters_are_inert() {
    let (orchestrator, registry) = setup();
    let code = "print(\"$(echo pwned) `echo pwned` $HOME\")";

    let result = orchestrator
        .execute_request(
            &registry,
            &ExecutionRequest::new("python", code),
            &ResourceLimits::default().with_timeout(Duration::from_secs(60)),
        )
        .await
        .unwrap();

    assert_eq!(result.output, "$(echo pwned) `echo pwned` $HOME\n");
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn test_go_infinite_loop_times_out() {
    let (orchestrator, registry) = setup();

    let code = "package main\nfunc main() { for {} }";
    let result = orchestrator
        .execute_request(
            &registry,
            &ExecutionRequest::new("go", code),
            &ResourceLimits::default(),
        )
        .await
        .unwrap();

    assert_eq!(result.status, ExecutionStatus::TimedOut);
    assert_eq!(result.exit_code, 124);
    assert!(result.output.contains("Timed Out"));
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn test_network_is_unreachable() {
    let (orchestrator, registry) = setup();

    let code = "import socket\ntry:\n    socket.create_connection(('1.1.1.1', 53), timeout=2)\n    print('reachable')\nexcept OSError:\n    print('unreachable')";
    let result = orchestrator
        .execute_request(
            &registry,
            &ExecutionRequest::new("python", code),
            &ResourceLimits::default().with_timeout(Duration::from_secs(60)),
        )
        .await
        .unwrap();

    assert_eq!(result.output, "unreachable\n");
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn test_missing_image_is_unavailable() {
    let runtime: Arc<dyn SandboxRuntime> = Arc::new(DockerRuntime::connect(false).unwrap());
    let orchestrator = Orchestrator::new(runtime);
    let registry = LanguageRegistry::from_yaml_str(
        r#"
languages:
  - language: ghost
    image: execbox/does-not-exist:never
    entry: main.sh
    command: ["sh", "-c", "sh {entry}"]
"#,
    )
    .unwrap();

    let result = orchestrator
        .execute_request(
            &registry,
            &ExecutionRequest::new("ghost", "echo hi"),
            &ResourceLimits::default(),
        )
        .await
        .unwrap();

    assert_eq!(result.status, ExecutionStatus::ImageUnavailable);
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn test_concurrent_units_are_isolated() {
    let (orchestrator, registry) = setup();
    let registry = Arc::new(registry);

    let mut tasks = Vec::new();
    for i in 0..6 {
        let orchestrator = orchestrator.clone();
        let registry = Arc::clone(&registry);
        tasks.push(tokio::spawn(async move {
            let code = format!(
                "import os\nopen('marker', 'a').write('{i}')\nprint(open('marker').read())"
            );
            let result = orchestrator
                .execute_request(
                    &registry,
                    &ExecutionRequest::new("python", code),
                    &ResourceLimits::default().with_timeout(Duration::from_secs(60)),
                )
                .await
                .unwrap();
            (i, result)
        }));
    }

    for task in tasks {
        let (i, result) = task.await.unwrap();
        assert_eq!(result.output, format!("{}\n", i));
    }
}
