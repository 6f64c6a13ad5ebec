pub mod builder;
pub mod error;
pub mod mock;
pub mod runner;
pub mod streaming;


pub use builder::ProcessCommandBuilder;
pub use error::ProcessError;
pub use mock::{MockCommandConfig, MockProcessRunner};
pub use runner::{
    ByteStream, ExitStatus, ProcessCommand, ProcessHandle, ProcessOutput, ProcessRunner,
    TokioProcessRunner,
};
