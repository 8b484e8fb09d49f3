//! Error code translation between Rust and Linux
//!
//! Converts between `KernelResult<T>` and Linux's integer errno values.

use irqwork_ffi::{c_int, KernelError};

/// Convert a Result to Linux errno format
///
/// - Ok(value) => 0
/// - Err(error) => negative errno
pub fn result_to_errno<T>(result: Result<T, KernelError>) -> c_int {
    match result {
        Ok(_) => 0,
        Err(e) => e.to_errno(),
    }
}

/// Convert errno to Result
///
/// - 0 => Ok(())
/// - negative => Err(KernelError)
/// - positive or unknown => Err(EINVAL)
pub fn errno_to_result(errno: c_int) -> Result<(), KernelError> {
    if errno == 0 {
        return Ok(());
    }
    Err(KernelError::from_errno(errno).unwrap_or(KernelError::EINVAL))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_to_errno() {
        assert_eq!(result_to_errno(Ok::<(), _>(())), 0);
        assert_eq!(result_to_errno(Err::<(), _>(KernelError::EBUSY)), -16);
        assert_eq!(result_to_errno(Err::<(), _>(KernelError::EINVAL)), -22);
    }

    #[test]
    fn test_errno_to_result() {
        assert!(errno_to_result(0).is_ok());
        assert_eq!(errno_to_result(-19), Err(KernelError::ENODEV));
        assert_eq!(errno_to_result(5), Err(KernelError::EINVAL));
        assert_eq!(errno_to_result(-4095), Err(KernelError::EINVAL));
    }
}
