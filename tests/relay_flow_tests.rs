//! End-to-end flows through the public library API, with a scripted toolchain

use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;

use buildrelay::build::BuildOrchestrator;
use buildrelay::config::RelayConfig;
use buildrelay::gotest::TestOrchestrator;
use buildrelay::request::{BuildRequest, TestRequest};
use buildrelay::session::{DeliveryChannel, MemorySink, SessionChannelRegistry, SessionId};
use buildrelay::subprocess::MockProcessRunner;
use buildrelay::workspace::{Toolchain, WorkspaceLayout};

fn config_for(temp: &TempDir) -> RelayConfig {
    let mut config = RelayConfig::new();
    config.workspace.root = temp.path().join("ws");
    config.workspace.cache_root = temp.path().join("cache");
    config.toolchain.required_build_flag = None;
    config
        .users
        .entry("alice".to_string())
        .or_default()
        .build_args
        .insert(buildrelay::workspace::current_goos().to_string(), vec!["-race".to_string()]);
    config
}

#[tokio::test]
async fn test_build_then_reconnect_then_test() {
    let temp = TempDir::new().unwrap();
    let config = config_for(&temp);
    std::fs::create_dir_all(temp.path().join("ws/alice/src/hello")).unwrap();

    let mut mock = MockProcessRunner::new();
    mock.expect_command("go")
        .with_args(|args| args.first().map(String::as_str) == Some("mod"))
        .returns_success()
        .finish();
    mock.expect_command("go")
        .with_args(|args| args == ["build", "-race"])
        .returns_success()
        .finish();
    mock.expect_command("go")
        .with_args(|args| args == ["test", "-v"])
        .returns_stdout("FAIL\n")
        .returns_exit_code(1)
        .finish();

    let toolchain = Toolchain::from_config(&config, Arc::new(mock.clone()));
    let layout = Arc::new(WorkspaceLayout::from_config(&config));
    let builds = BuildOrchestrator::new(toolchain.clone(), layout.clone());
    let tests = TestOrchestrator::new(toolchain, layout);
    let registry = SessionChannelRegistry::new();
    let session = SessionId::from("s1");

    let first = MemorySink::new();
    let (channel, first_writer) = DeliveryChannel::open(session.clone(), first.clone());
    let first_connection = channel.connection_id();
    registry.attach(channel).await;

    let body: Value = serde_json::json!({
        "sid": "s1",
        "file": "hello/main.go",
        "pathtype": "0",
        "code": "package main\n",
    });
    let request = BuildRequest::from_value(&body).unwrap();
    let ctx = registry.context(session.clone(), "alice").await;
    let outcome = builds.build(&ctx, &request).await.unwrap();
    drop(ctx);
    assert!(outcome.succeeded());

    // The editor reconnects; the old connection's late detach must not
    // remove the new channel.
    let second = MemorySink::new();
    let (channel, second_writer) = DeliveryChannel::open(session.clone(), second.clone());
    let replaced = registry.attach(channel).await;
    assert_eq!(replaced.map(|old| old.connection_id()), Some(first_connection));
    first_writer.await.unwrap();
    assert!(!registry.detach(&session, first_connection).await);
    assert!(registry.is_live(&session).await);

    let test_request = TestRequest::from_value(&serde_json::json!({
        "session": "s1",
        "targetFileRef": "hello/main_test.go",
        "pathType": 0,
    }))
    .unwrap();
    let ctx = registry.context(session.clone(), "alice").await;
    let run = tests.start(ctx, &test_request).await.unwrap();
    let result = run.handle.await.unwrap().unwrap();
    assert!(!result.passed());
    assert!(result.delivered);

    let connection = registry.get(&session).await.unwrap().connection_id();
    assert!(registry.detach(&session, connection).await);
    second_writer.await.unwrap();

    let first_cmds: Vec<String> = first
        .values()
        .iter()
        .map(|f| f["cmd"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(first_cmds, vec!["start-build", "build"]);
    assert_eq!(
        first.values()[0]["output"],
        "<span class='start-build'>Start [go build [-race]]</span>\n"
    );

    let frames = second.values();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0]["cmd"], "start-test");
    assert_eq!(
        frames[1]["output"],
        "<span class='test-error'>Test failed</span>\nFAIL\n"
    );
}
