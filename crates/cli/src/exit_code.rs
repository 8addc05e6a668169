//! Exit code definitions for the pstore CLI
//!
//! Scripts rely on these values; changing one is a breaking change.

/// Exit codes for the pstore CLI application.
///
/// Each error kind of `ps_core::Error` maps onto exactly one of these codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Operation completed successfully
    Success = 0,

    /// General/unspecified error
    GeneralError = 1,

    /// User input error: invalid arguments, malformed path, bad configuration
    UsageError = 2,

    /// Transport or provider failure
    StoreError = 3,

    /// Authentication or permission failure
    AuthError = 4,

    /// Resource not found: bucket, object, folder, local path or profile
    NotFound = 5,

    /// Conflict: destination exists, bucket not empty, bucket name taken
    Conflict = 6,

    /// Operation was interrupted (e.g., Ctrl+C)
    Interrupted = 130,
}

impl ExitCode {
    /// Convert exit code to i32 for use with std::process::exit
    #[inline]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Create exit code from i32 value
    ///
    /// Returns None if the value doesn't correspond to a known exit code.
    pub const fn from_i32(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Success),
            1 => Some(Self::GeneralError),
            2 => Some(Self::UsageError),
            3 => Some(Self::StoreError),
            4 => Some(Self::AuthError),
            5 => Some(Self::NotFound),
            6 => Some(Self::Conflict),
            130 => Some(Self::Interrupted),
            _ => None,
        }
    }

    /// Exit code for a core error
    pub fn from_error(error: &ps_core::Error) -> Self {
        Self::from_i32(error.exit_code()).unwrap_or(Self::GeneralError)
    }

    /// Get a human-readable description of the exit code
    pub const fn description(self) -> &'static str {
        match self {
            Self::Success => "Operation completed successfully",
            Self::GeneralError => "General error",
            Self::UsageError => "Invalid arguments, path or configuration",
            Self::StoreError => "Storage service error",
            Self::AuthError => "Authentication or permission failure",
            Self::NotFound => "Resource not found",
            Self::Conflict => "Resource conflict",
            Self::Interrupted => "Operation interrupted",
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.as_i32()
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.description(), self.as_i32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ps_core::Error;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::GeneralError.as_i32(), 1);
        assert_eq!(ExitCode::UsageError.as_i32(), 2);
        assert_eq!(ExitCode::StoreError.as_i32(), 3);
        assert_eq!(ExitCode::AuthError.as_i32(), 4);
        assert_eq!(ExitCode::NotFound.as_i32(), 5);
        assert_eq!(ExitCode::Conflict.as_i32(), 6);
        assert_eq!(ExitCode::Interrupted.as_i32(), 130);
    }

    #[test]
    fn test_exit_code_from_i32() {
        assert_eq!(ExitCode::from_i32(3), Some(ExitCode::StoreError));
        assert_eq!(ExitCode::from_i32(130), Some(ExitCode::Interrupted));
        assert_eq!(ExitCode::from_i32(7), None);
        assert_eq!(ExitCode::from_i32(99), None);
    }

    #[test]
    fn test_exit_code_from_error() {
        assert_eq!(
            ExitCode::from_error(&Error::NotFound("b/k".into())),
            ExitCode::NotFound
        );
        assert_eq!(
            ExitCode::from_error(&Error::LocalNotFound("/tmp/x".into())),
            ExitCode::NotFound
        );
        assert_eq!(
            ExitCode::from_error(&Error::NameTaken("b".into())),
            ExitCode::Conflict
        );
        assert_eq!(
            ExitCode::from_error(&Error::Config("empty key".into())),
            ExitCode::UsageError
        );
        assert_eq!(
            ExitCode::from_error(&Error::Store("timeout".into())),
            ExitCode::StoreError
        );
        assert_eq!(
            ExitCode::from_error(&Error::Decode("utf-8".into())),
            ExitCode::GeneralError
        );
    }

    #[test]
    fn test_exit_code_display() {
        let display = format!("{}", ExitCode::NotFound);
        assert!(display.contains("5"));
        assert!(display.contains("not found"));
    }
}
