//! Root privilege check

#[cfg(unix)]
use sudo::RunningAs;

use crate::error::MigrateError;

/// Whether the process runs with effective uid 0
pub fn is_root() -> bool {
    #[cfg(unix)]
    {
        matches!(sudo::check(), RunningAs::Root)
    }

    #[cfg(not(unix))]
    {
        false
    }
}

/// Fail with `NotRoot` unless running as root
pub fn ensure_root(program: &str) -> Result<(), MigrateError> {
    if is_root() {
        Ok(())
    } else {
        Err(MigrateError::NotRoot(program.to_string()))
    }
}
