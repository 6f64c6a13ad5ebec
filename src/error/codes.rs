/// Error code registry for buildrelay
///
/// Error codes are organized by category:
/// - 1000-1999: Configuration errors
/// - 2000-2999: Session and delivery channel errors
/// - 3000-3999: Storage errors (writing submitted sources)
/// - 4000-4999: Execution errors (spawning and waiting on the toolchain)
/// - 5000-5999: Build errors (module preparation, target resolution)
/// - 7000-7999: Validation errors
/// - 9000-9999: Other errors
pub struct ErrorCode;

impl ErrorCode {
    // Configuration errors (1000-1999)
    pub const CONFIG_GENERIC: u16 = 1000;
    pub const CONFIG_NOT_FOUND: u16 = 1001;
    pub const CONFIG_PARSE_ERROR: u16 = 1002;
    pub const CONFIG_INVALID_VALUE: u16 = 1003;
    pub const CONFIG_PATH_ERROR: u16 = 1004;

    // Session errors (2000-2999)
    pub const SESSION_MISSING_USER: u16 = 2002;

    // Storage errors (3000-3999)
    pub const STORAGE_IO_ERROR: u16 = 3001;
    pub const STORAGE_PERMISSION_DENIED: u16 = 3002;

    // Execution errors (4000-4999)
    pub const EXEC_GENERIC: u16 = 4000;
    pub const EXEC_COMMAND_NOT_FOUND: u16 = 4001;
    pub const EXEC_INVALID_WORKDIR: u16 = 4002;
    pub const EXEC_SPAWN_FAILED: u16 = 4003;
    pub const EXEC_WAIT_FAILED: u16 = 4004;
    pub const EXEC_OUTPUT_ERROR: u16 = 4005;

    // Build errors (5000-5999)
    pub const BUILD_MODULE_INIT_FAILED: u16 = 5001;
    pub const BUILD_READ_ONLY_TARGET: u16 = 5002;
    pub const BUILD_UNRESOLVED_PATH: u16 = 5003;

    // Validation errors (7000-7999)
    pub const VALIDATION_GENERIC: u16 = 7000;
    pub const VALIDATION_REQUIRED_FIELD: u16 = 7001;
    pub const VALIDATION_INVALID_TYPE: u16 = 7002;
    pub const VALIDATION_INVALID_FORMAT: u16 = 7003;

    // Other errors (9000-9999)
    pub const OTHER_GENERIC: u16 = 9000;
}

/// Get a human-readable description for an error code
pub fn describe_error_code(code: u16) -> &'static str {
    match code {
        1000 => "Generic configuration error",
        1001 => "Configuration file not found",
        1002 => "Failed to parse configuration",
        1003 => "Invalid value in configuration",
        1004 => "Configuration path error",

        2002 => "Request carries no user identity",

        3001 => "Storage I/O error",
        3002 => "Storage permission denied",

        4000 => "Generic execution error",
        4001 => "Command not found",
        4002 => "Working directory is not usable",
        4003 => "Failed to spawn process",
        4004 => "Failed to wait for process",
        4005 => "Failed to read process output",

        5001 => "Module preparation failed",
        5002 => "Target is read-only toolchain source",
        5003 => "Target path could not be resolved",

        7000 => "Generic validation error",
        7001 => "Required field is missing",
        7002 => "Field has the wrong type",
        7003 => "Field has an invalid format",

        9000 => "Generic error",

        _ => "Unknown error code",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_fall_in_their_category() {
        for code in [
            ErrorCode::EXEC_GENERIC,
            ErrorCode::EXEC_COMMAND_NOT_FOUND,
            ErrorCode::EXEC_OUTPUT_ERROR,
        ] {
            assert_eq!(code / 1000, 4);
        }
        assert_eq!(ErrorCode::BUILD_MODULE_INIT_FAILED / 1000, 5);
        assert_eq!(ErrorCode::VALIDATION_REQUIRED_FIELD / 1000, 7);
    }

    #[test]
    fn test_describe_error_code() {
        assert_eq!(describe_error_code(4001), "Command not found");
        assert_eq!(
            describe_error_code(ErrorCode::BUILD_READ_ONLY_TARGET),
            "Target is read-only toolchain source"
        );
        assert_eq!(describe_error_code(1234), "Unknown error code");
    }
}
