//! Process exit codes for `tierio`.
//! Scripts rely on these values; keep them stable.

use tierio_core::FileIoError;

pub const SUCCESS: i32 = 0;
pub const IO_FAILURE: i32 = 1; // Storage or local I/O failed
pub const CONFIG_ERROR: i32 = 2; // Bad config, location or scheme
pub const NOT_FOUND: i32 = 3; // Requested file does not exist

/// Exit code for a failed command, taken from the first `FileIoError` in the chain.
pub fn for_error(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<FileIoError>())
        .map_or(IO_FAILURE, FileIoError::exit_code)
}
