//! Exit codes for the coursegen CLI.
//!
//! | Code | Constant | Description |
//! |------|----------|-------------|
//! | 0 | `SUCCESS` | Operation completed successfully |
//! | 1 | `INTERNAL` | General/internal failure |
//! | 2 | `CONFIG` | Invalid CLI arguments or configuration |
//! | 3 | `GENERATION_FAILED` | No model produced a response |
//! | 4 | `RENDER_FAILED` | Artifact rendering failed |
//! | 130 | `CANCELLED` | Interrupted before completion |

/// Type-safe process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);

    pub const INTERNAL: ExitCode = ExitCode(1);

    /// Invalid arguments or configuration
    pub const CONFIG: ExitCode = ExitCode(2);

    /// Every model failed or the credential was missing
    pub const GENERATION_FAILED: ExitCode = ExitCode(3);

    pub const RENDER_FAILED: ExitCode = ExitCode(4);

    /// Matches the conventional SIGINT exit status
    pub const CANCELLED: ExitCode = ExitCode(130);

    /// Numeric value for `std::process::exit()`.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}
