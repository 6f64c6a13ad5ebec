use super::*;
use crate::presentation::Banners;
use crate::request::BuildRequest;
use crate::session::{DeliveryChannel, MemorySink, SessionContext, SessionId};
use crate::subprocess::MockProcessRunner;
use crate::workspace::{
    PathType, Toolchain, UserBuildArgs, UserToolchainEnv, WorkspaceLayout,
};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::task::JoinHandle;

struct Fixture {
    _temp: TempDir,
    root: PathBuf,
    mock: MockProcessRunner,
    orchestrator: BuildOrchestrator,
}

impl Fixture {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let root = temp.path().to_path_buf();
        let mock = MockProcessRunner::new();
        let toolchain = Toolchain::new(
            Arc::new(mock.clone()),
            Arc::new(UserToolchainEnv::new(root.join("ws"), root.join("cache"), None)),
            Arc::new(UserBuildArgs::default()),
            Arc::new(Banners::default()),
        );
        let resolver = WorkspaceLayout::new(root.join("ws"), Some(root.join("goroot/src")), None);
        let orchestrator = BuildOrchestrator::new(toolchain, Arc::new(resolver));

        Self {
            _temp: temp,
            root,
            mock,
            orchestrator,
        }
    }

    /// `<ws>/alice/src/hello`, created on disk
    fn package_dir(&self) -> PathBuf {
        let dir = self.root.join("ws/alice/src/hello");
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn expect_module_prep(&mut self) {
        self.mock
            .expect_command("go")
            .with_args(|args| args.first().map(String::as_str) == Some("mod"))
            .returns_success()
            .finish();
    }

    fn expect_compile(&mut self, stdout: &str, stderr: &str, exit_code: i32) {
        self.mock
            .expect_command("go")
            .with_args(|args| args.first().map(String::as_str) == Some("build"))
            .returns_stdout(stdout)
            .returns_stderr(stderr)
            .returns_exit_code(exit_code)
            .finish();
    }
}

fn request(next_command: Option<&str>) -> BuildRequest {
    BuildRequest {
        session: SessionId::from("s1"),
        target_file_ref: "hello/main.go".to_string(),
        path_type: PathType::Workspace,
        source_text: "package main\n\nfunc main() {}\n".to_string(),
        next_command: next_command.map(str::to_string),
    }
}

fn live_context(sink: MemorySink) -> (SessionContext, JoinHandle<()>) {
    let (channel, writer) = DeliveryChannel::open(SessionId::from("s1"), sink);
    (SessionContext::new(SessionId::from("s1"), "alice", Some(channel)), writer)
}

/// Drop the last producer and wait until every queued frame is written.
async fn flush(ctx: SessionContext, writer: JoinHandle<()>) {
    drop(ctx);
    writer.await.unwrap();
}

fn cmds(frames: &[Value]) -> Vec<&str> {
    frames.iter().map(|f| f["cmd"].as_str().unwrap()).collect()
}

#[tokio::test]
async fn test_clean_compile_sends_one_success_banner() {
    let mut fixture = Fixture::new();
    let dir = fixture.package_dir();
    fixture.expect_module_prep();
    fixture.expect_compile("", "", 0);

    let sink = MemorySink::new();
    let (ctx, writer) = live_context(sink.clone());
    let outcome = fixture
        .orchestrator
        .build(&ctx, &request(Some("run")))
        .await
        .unwrap();
    flush(ctx, writer).await;

    assert!(outcome.succeeded());
    assert!(outcome.diagnostics.is_empty());
    assert_eq!(outcome.executable, dir.join("hello"));

    let frames = sink.values();
    assert_eq!(cmds(&frames), vec!["start-build", "build"]);
    assert_eq!(
        frames[0]["output"],
        "<span class='start-build'>Start [go build []]</span>\n"
    );

    let last = &frames[1];
    assert_eq!(last["output"], "<span class='build-succ'>Build succeeded</span>\n");
    assert_eq!(last["nextCommand"], "run");
    assert!(last.get("diagnostics").is_none());
    let successes = frames
        .iter()
        .filter(|f| f["output"].as_str().unwrap().contains("build-succ"))
        .count();
    assert_eq!(successes, 1);

    let written = std::fs::read_to_string(dir.join("main.go")).unwrap();
    assert_eq!(written, "package main\n\nfunc main() {}\n");
}

#[tokio::test]
async fn test_failed_compile_attaches_diagnostics() {
    let mut fixture = Fixture::new();
    let dir = fixture.package_dir();
    fixture.expect_module_prep();
    fixture.expect_compile("", "main.go:10:2: undefined: foo\n", 2);

    let sink = MemorySink::new();
    let (ctx, writer) = live_context(sink.clone());
    let outcome = fixture
        .orchestrator
        .build(&ctx, &request(Some("run")))
        .await
        .unwrap();
    flush(ctx, writer).await;

    assert!(!outcome.succeeded());
    assert_eq!(outcome.phase, BuildPhase::Failed);
    let expected_file = format!("{}/main.go", dir.display());
    assert_eq!(outcome.diagnostics.len(), 1);
    assert_eq!(outcome.diagnostics[0].file, expected_file);
    assert_eq!(outcome.diagnostics[0].line, 9);
    assert_eq!(outcome.diagnostics[0].message, "undefined: foo");

    let frames = sink.values();
    assert_eq!(cmds(&frames), vec!["start-build", "build", "build"]);
    assert!(frames[1]["output"]
        .as_str()
        .unwrap()
        .starts_with("<span class='stderr'><span class='path'>"));

    let last = frames.last().unwrap();
    assert_eq!(last["output"], "<span class='build-error'>Build failed</span>\n");
    assert!(last.get("nextCommand").is_none());
    assert_eq!(
        last["diagnostics"],
        serde_json::json!([{
            "file": expected_file,
            "line": 9,
            "severity": "error",
            "message": "undefined: foo"
        }])
    );
}

#[tokio::test]
async fn test_package_header_is_not_a_diagnostic() {
    let mut fixture = Fixture::new();
    fixture.package_dir();
    fixture.expect_module_prep();
    fixture.expect_compile("", "# hello\n./main.go:3:5: syntax error\n", 1);

    let ctx = SessionContext::detached(SessionId::from("s1"), "alice");
    let outcome = fixture.orchestrator.build(&ctx, &request(None)).await.unwrap();

    assert_eq!(outcome.diagnostics.len(), 1);
    assert_eq!(outcome.diagnostics[0].line, 2);
    assert_eq!(outcome.diagnostics[0].message, "syntax error");
}

#[tokio::test]
async fn test_build_without_channel_completes() {
    let mut fixture = Fixture::new();
    fixture.package_dir();
    fixture.expect_module_prep();
    fixture.expect_compile("compiling\n", "", 0);

    let ctx = SessionContext::detached(SessionId::from("s1"), "alice");
    let outcome = fixture.orchestrator.build(&ctx, &request(None)).await.unwrap();

    assert!(outcome.succeeded());
    assert!(!outcome.channel_lost);
    assert!(fixture.mock.verify_called("go", 2));
}

#[tokio::test]
async fn test_disconnect_mid_build_lets_compile_finish() {
    let mut fixture = Fixture::new();
    fixture.package_dir();
    fixture.expect_module_prep();
    fixture.expect_compile("", "a.go:1:1: one\nb.go:2:1: two\nc.go:3:1: three\n", 2);

    let sink = MemorySink::disconnect_after(2);
    let (ctx, writer) = live_context(sink.clone());
    let outcome = fixture.orchestrator.build(&ctx, &request(None)).await.unwrap();
    flush(ctx, writer).await;

    assert_eq!(outcome.phase, BuildPhase::Failed);
    assert_eq!(outcome.diagnostics.len(), 3);
    assert_eq!(sink.frames().len(), 2);
}

/// Real `sh` standing in for `go`: `sh mod tidy` and `sh build` run the
/// scripts of those names in the package directory.
#[cfg(unix)]
#[tokio::test]
async fn test_disconnect_keeps_draining_a_real_process() {
    use crate::subprocess::{ExitStatus, TokioProcessRunner};

    const LINES: usize = 3000;

    let temp = TempDir::new().unwrap();
    let root = temp.path();
    let dir = root.join("ws/alice/src/hello");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("go.mod"), "module hello\n").unwrap();
    std::fs::write(dir.join("mod"), "exit 0\n").unwrap();
    // Roughly 150 KiB of stderr, well past a pipe buffer
    std::fs::write(
        dir.join("build"),
        format!(
            "i=1\nwhile [ $i -le {LINES} ]; do\n  echo \"./f.go:$i:1: error number $i padded to fill the pipe\" >&2\n  i=$((i+1))\ndone\nexit 3\n"
        ),
    )
    .unwrap();

    let toolchain = Toolchain::new(
        Arc::new(TokioProcessRunner),
        Arc::new(UserToolchainEnv::new(root.join("ws"), root.join("cache"), None)),
        Arc::new(UserBuildArgs::default()),
        Arc::new(Banners::default()),
    )
    .with_go_binary("sh")
    .with_required_build_flag(None);
    let resolver = WorkspaceLayout::new(root.join("ws"), None, None);
    let orchestrator = BuildOrchestrator::new(toolchain, Arc::new(resolver));

    let sink = MemorySink::disconnect_after(1);
    let (ctx, writer) = live_context(sink.clone());
    let outcome = orchestrator.build(&ctx, &request(None)).await.unwrap();
    flush(ctx, writer).await;

    assert_eq!(outcome.status, ExitStatus::Error(3));
    assert_eq!(outcome.phase, BuildPhase::Failed);
    assert!(outcome.channel_lost);
    assert_eq!(outcome.diagnostics.len(), LINES);
    assert_eq!(outcome.diagnostics[0].line, 0);
    assert_eq!(outcome.diagnostics[LINES - 1].line, LINES as i64 - 1);
    assert_eq!(sink.frames().len(), 1);
}

#[tokio::test]
async fn test_stdout_lines_keep_their_order() {
    let mut fixture = Fixture::new();
    fixture.package_dir();
    fixture.expect_module_prep();
    fixture.expect_compile("one\ntwo\nthree\n", "warn\n", 0);

    let sink = MemorySink::new();
    let (ctx, writer) = live_context(sink.clone());
    fixture.orchestrator.build(&ctx, &request(None)).await.unwrap();
    flush(ctx, writer).await;

    let stdout: Vec<String> = sink
        .values()
        .iter()
        .filter(|f| f["cmd"] == "build")
        .map(|f| f["output"].as_str().unwrap().to_string())
        .filter(|o| !o.starts_with("<span"))
        .collect();
    assert_eq!(stdout, vec!["one\n", "two\n", "three\n"]);

    let first = &sink.values()[1];
    assert!(first["executable"].as_str().unwrap().ends_with("hello"));
}

#[tokio::test]
async fn test_required_flag_and_platform_args_reach_the_compiler() {
    let temp = TempDir::new().unwrap();
    let mock = MockProcessRunner::new();
    let mut users = std::collections::HashMap::new();
    let mut alice = crate::config::UserSettings::default();
    alice.build_args.insert(
        crate::workspace::current_goos().to_string(),
        vec!["-race".to_string(), "-race".to_string()],
    );
    users.insert("alice".to_string(), alice);

    let toolchain = Toolchain::new(
        Arc::new(mock.clone()),
        Arc::new(UserToolchainEnv::new(temp.path().join("ws"), temp.path().join("cache"), None)),
        Arc::new(UserBuildArgs::new(users)),
        Arc::new(Banners::default()),
    );
    let orchestrator = BuildOrchestrator::new(
        toolchain,
        Arc::new(WorkspaceLayout::new(temp.path().join("ws"), None, None)),
    );

    let dir = temp.path().join("ws/alice/src/hello");
    std::fs::create_dir_all(&dir).unwrap();
    let mut expect = mock.clone();
    expect.expect_command("go").returns_success().finish();

    let sink = MemorySink::new();
    let (ctx, writer) = live_context(sink.clone());
    orchestrator.build(&ctx, &request(None)).await.unwrap();
    flush(ctx, writer).await;

    let history = mock.get_call_history();
    assert_eq!(history[0].args, vec!["mod", "init", "hello"]);
    assert_eq!(history[1].args, vec!["build", "-race", "-i"]);
    assert_eq!(history[1].working_dir.as_deref(), Some(dir.as_path()));
    assert!(history[1].env["GOPATH"].ends_with("alice"));
    assert_eq!(
        sink.values()[0]["output"],
        "<span class='start-build'>Start [go build [-race -race]]</span>\n"
    );
}

#[tokio::test]
async fn test_existing_module_is_tidied() {
    let mut fixture = Fixture::new();
    let dir = fixture.package_dir();
    std::fs::write(dir.join("go.mod"), "module hello\n").unwrap();
    fixture.expect_module_prep();
    fixture.expect_compile("", "", 0);

    let ctx = SessionContext::detached(SessionId::from("s1"), "alice");
    fixture.orchestrator.build(&ctx, &request(None)).await.unwrap();

    assert_eq!(fixture.mock.get_call_history()[0].args, vec!["mod", "tidy"]);
}

#[tokio::test]
async fn test_module_preparation_twice_never_aborts() {
    let mut fixture = Fixture::new();
    let dir = fixture.package_dir();
    fixture
        .mock
        .expect_command("go")
        .with_args(|args| args.first().map(String::as_str) == Some("mod"))
        .returns_stderr("go: /x/hello/go.mod already exists\n")
        .returns_exit_code(1)
        .finish();
    fixture.expect_compile("", "", 0);

    let ctx = SessionContext::detached(SessionId::from("s1"), "alice");
    let first = fixture.orchestrator.build(&ctx, &request(None)).await;
    let second = fixture.orchestrator.build(&ctx, &request(None)).await;

    assert!(first.unwrap().succeeded());
    assert!(second.unwrap().succeeded());
    assert!(!dir.join("go.mod").exists());
}

#[tokio::test]
async fn test_module_failure_aborts_before_compile() {
    let mut fixture = Fixture::new();
    fixture.package_dir();
    fixture
        .mock
        .expect_command("go")
        .with_args(|args| args.first().map(String::as_str) == Some("mod"))
        .returns_stderr("go: cannot determine module path\n")
        .returns_exit_code(1)
        .finish();
    fixture.expect_compile("", "", 0);

    let ctx = SessionContext::detached(SessionId::from("s1"), "alice");
    let err = fixture
        .orchestrator
        .build(&ctx, &request(None))
        .await
        .unwrap_err();

    assert!(matches!(err, BuildError::ModuleInit { ref output, .. } if output.contains("module path")));
    assert!(fixture.mock.verify_called("go", 1));

    let relay: crate::error::RelayError = err.into();
    assert_eq!(relay.api_code(), -1);
    assert_eq!(relay.code(), crate::error::ErrorCode::BUILD_MODULE_INIT_FAILED);
}

#[tokio::test]
async fn test_write_failure_aborts() {
    let fixture = Fixture::new();
    // package directory deliberately not created
    let ctx = SessionContext::detached(SessionId::from("s1"), "alice");
    let err = fixture
        .orchestrator
        .build(&ctx, &request(None))
        .await
        .unwrap_err();

    assert!(matches!(err, BuildError::Write { .. }));
    assert!(fixture.mock.get_call_history().is_empty());
}

#[tokio::test]
async fn test_missing_toolchain_is_a_spawn_error() {
    let mut fixture = Fixture::new();
    fixture.package_dir();
    fixture.expect_module_prep();
    fixture
        .mock
        .expect_command("go")
        .with_args(|args| args.first().map(String::as_str) == Some("build"))
        .not_found()
        .finish();

    let ctx = SessionContext::detached(SessionId::from("s1"), "alice");
    let err = fixture
        .orchestrator
        .build(&ctx, &request(None))
        .await
        .unwrap_err();

    assert!(matches!(err, BuildError::Process(ref e) if e.is_spawn_error()));
}

#[tokio::test]
async fn test_toolchain_sources_are_read_only() {
    let fixture = Fixture::new();
    let mut req = request(None);
    req.path_type = PathType::GoApi;
    req.target_file_ref = "fmt/print.go".to_string();

    let ctx = SessionContext::detached(SessionId::from("s1"), "alice");
    let err = fixture.orchestrator.build(&ctx, &req).await.unwrap_err();

    assert!(matches!(err, BuildError::ReadOnlyTarget(_)));
    assert!(!fixture.root.join("goroot/src/fmt/print.go").exists());
    assert!(fixture.mock.get_call_history().is_empty());
}

#[tokio::test]
async fn test_target_without_parent_directory() {
    let fixture = Fixture::new();
    let ctx = SessionContext::detached(SessionId::from("s1"), "alice");
    let err = fixture
        .orchestrator
        .build_file(&ctx, Path::new("main.go"), "", None)
        .await
        .unwrap_err();
    assert!(matches!(err, BuildError::NoParentDir(_)));
}
