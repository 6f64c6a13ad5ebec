//! Where a user's sources live and how the toolchain is invoked for them
//!
//! These are the narrow collaborators the orchestrators depend on. Each one
//! is a trait with a config-backed implementation so tests can substitute
//! their own.

pub mod env;
pub mod resolver;
pub mod settings;
pub mod toolchain;

pub use env::{EnvOverlayBuilder, UserToolchainEnv};
pub use resolver::{PathResolver, PathType, ResolveError, ResolvedPath, WorkspaceLayout};
pub use settings::{current_goos, BuildSettings, UserBuildArgs};
pub use toolchain::Toolchain;
