use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use crate::config::RelayConfig;
use crate::error::{ErrorCode, RelayError};

/// Which tree a logical path is relative to.
///
/// On the wire this is `0`, `1` or `2`, sent either as a number or a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathType {
    /// The user's own workspace sources
    Workspace,
    /// The toolchain's bundled sources; read-only
    GoApi,
    /// The shared GOPATH sources
    GoPath,
}

impl PathType {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(PathType::Workspace),
            1 => Some(PathType::GoApi),
            2 => Some(PathType::GoPath),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            PathType::Workspace => 0,
            PathType::GoApi => 1,
            PathType::GoPath => 2,
        }
    }

    /// Whether builds may write to files of this class.
    pub fn is_writable(self) -> bool {
        !matches!(self, PathType::GoApi)
    }
}

impl fmt::Display for PathType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PathType::Workspace => "workspace",
            PathType::GoApi => "go-api",
            PathType::GoPath => "gopath",
        };
        f.write_str(name)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPathType {
    Number(i64),
    Text(String),
}

impl<'de> Deserialize<'de> for PathType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = match RawPathType::deserialize(deserializer)? {
            RawPathType::Number(n) => n,
            RawPathType::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| D::Error::custom(format!("invalid path type '{s}'")))?,
        };
        PathType::from_code(code)
            .ok_or_else(|| D::Error::custom(format!("unknown path type {code}")))
    }
}

impl Serialize for PathType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    pub path: PathBuf,
    pub class: PathType,
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("empty file reference")]
    Empty,

    #[error("'{0}' points outside its root")]
    EscapesRoot(String),

    #[error("no {0} root is configured")]
    RootUnavailable(PathType),
}

impl From<ResolveError> for RelayError {
    fn from(err: ResolveError) -> Self {
        RelayError::build(ErrorCode::BUILD_UNRESOLVED_PATH, err.to_string()).with_source(err)
    }
}

/// Maps a user's logical file reference to a location on disk.
pub trait PathResolver: Send + Sync {
    fn resolve(
        &self,
        user_id: &str,
        logical: &str,
        path_type: PathType,
    ) -> Result<ResolvedPath, ResolveError>;
}

/// Directory layout taken from the `[workspace]` config table.
#[derive(Debug, Clone)]
pub struct WorkspaceLayout {
    root: PathBuf,
    go_api_root: Option<PathBuf>,
    gopath_root: Option<PathBuf>,
}

impl WorkspaceLayout {
    pub fn new(root: PathBuf, go_api_root: Option<PathBuf>, gopath_root: Option<PathBuf>) -> Self {
        Self {
            root,
            go_api_root,
            gopath_root,
        }
    }

    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(
            config.workspace.root.clone(),
            config.go_api_root(),
            config.workspace.gopath_root.clone(),
        )
    }

    /// `<root>/<user>/src`
    pub fn user_src(&self, user_id: &str) -> PathBuf {
        self.root.join(user_id).join("src")
    }

    fn base(&self, user_id: &str, path_type: PathType) -> Result<PathBuf, ResolveError> {
        match path_type {
            PathType::Workspace => Ok(self.user_src(user_id)),
            PathType::GoApi => self
                .go_api_root
                .clone()
                .ok_or(ResolveError::RootUnavailable(path_type)),
            PathType::GoPath => self
                .gopath_root
                .clone()
                .ok_or(ResolveError::RootUnavailable(path_type)),
        }
    }

    /// Classify by location, so a workspace reference that lands in the Go
    /// API tree is still treated as API source.
    fn classify(&self, path: &Path, requested: PathType) -> PathType {
        match &self.go_api_root {
            Some(api) if path.starts_with(api) => PathType::GoApi,
            _ => requested,
        }
    }
}

/// Clean a client-supplied relative path. Leading separators are ignored and
/// `..` may not climb above the root.
fn relative_components(logical: &str) -> Result<PathBuf, ResolveError> {
    let mut clean = PathBuf::new();
    for component in Path::new(logical).components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::ParentDir => {
                if !clean.pop() {
                    return Err(ResolveError::EscapesRoot(logical.to_string()));
                }
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }

    if clean.as_os_str().is_empty() {
        return Err(ResolveError::Empty);
    }
    Ok(clean)
}

impl PathResolver for WorkspaceLayout {
    fn resolve(
        &self,
        user_id: &str,
        logical: &str,
        path_type: PathType,
    ) -> Result<ResolvedPath, ResolveError> {
        let relative = relative_components(logical)?;
        let path = self.base(user_id, path_type)?.join(relative);
        let class = self.classify(&path, path_type);

        debug!(
            "User [{}] resolved {} path '{}' to {} ({})",
            user_id,
            path_type,
            logical,
            path.display(),
            class
        );

        Ok(ResolvedPath { path, class })
    }
}
