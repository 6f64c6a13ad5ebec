//! Fatal error reporting for the binary

use tracing::error;

use crate::error::{describe_error_code, RelayError};

/// Report `error` and exit with a status code that reflects its category.
///
/// `RelayError`s print their user message, plus the full source chain with
/// `-v`. Anything else prints the anyhow chain.
pub fn handle_fatal_error(error: anyhow::Error, verbose: u8) -> ! {
    error!("Fatal error: {}", error);
    std::process::exit(report(&error, verbose))
}

fn report(error: &anyhow::Error, verbose: u8) -> i32 {
    if let Some(relay_err) = error.downcast_ref::<RelayError>() {
        eprintln!("{}", relay_err.user_message());
        if verbose >= 1 {
            let code = relay_err.code();
            eprintln!("Error code: E{:04} ({})", code, describe_error_code(code));
            eprintln!("\nContext Chain:\n{}", relay_err.developer_message());
        }
        return relay_err.exit_code();
    }

    eprintln!("Error: {error}");
    if verbose >= 1 {
        eprintln!("\nError chain:");
        for (i, cause) in error.chain().enumerate() {
            eprintln!("  {}: {}", i, cause);
        }
    }
    1
}
