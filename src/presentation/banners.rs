//! Banner text shown at the start and end of a command

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    StartBuild,
    BuildSucceeded,
    BuildFailed,
    StartTest,
    TestPassed,
    TestFailed,
}

impl MessageKey {
    /// CSS class the editor styles the banner with
    pub fn css_class(self) -> &'static str {
        match self {
            MessageKey::StartBuild => "start-build",
            MessageKey::BuildSucceeded => "build-succ",
            MessageKey::BuildFailed => "build-error",
            MessageKey::StartTest => "start-test",
            MessageKey::TestPassed => "test-succ",
            MessageKey::TestFailed => "test-error",
        }
    }
}

/// Source of (possibly localized) banner text.
pub trait MessageCatalog: Send + Sync {
    fn text(&self, user_id: &str, key: MessageKey) -> String;
}

/// Fixed banner text, loaded from the `[banners]` config table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Banners {
    pub start_build: String,
    pub build_succ: String,
    pub build_error: String,
    pub start_test: String,
    pub test_succ: String,
    pub test_error: String,
}

impl Default for Banners {
    fn default() -> Self {
        Self {
            start_build: "Start [go build]".to_string(),
            build_succ: "Build succeeded".to_string(),
            build_error: "Build failed".to_string(),
            start_test: "Start [go test]".to_string(),
            test_succ: "Test passed".to_string(),
            test_error: "Test failed".to_string(),
        }
    }
}

impl MessageCatalog for Banners {
    fn text(&self, _user_id: &str, key: MessageKey) -> String {
        match key {
            MessageKey::StartBuild => &self.start_build,
            MessageKey::BuildSucceeded => &self.build_succ,
            MessageKey::BuildFailed => &self.build_error,
            MessageKey::StartTest => &self.start_test,
            MessageKey::TestPassed => &self.test_succ,
            MessageKey::TestFailed => &self.test_error,
        }
        .clone()
    }
}
