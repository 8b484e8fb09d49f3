//! FFI compatibility layer for C/Rust interoperability
//!
//! This crate provides the C scalar types and the errno-valued error type
//! shared by the irq work crates and their C-facing adapter.

#![cfg_attr(not(test), no_std)]

use static_assertions::assert_eq_size;

pub use libc::{c_int, c_long, c_ulong, c_void};

/// Kernel pointer type (matches C void*)
pub type KernelPtr = *mut c_void;

/// Error codes matching Linux kernel errno values
#[repr(i32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KernelError {
    #[error("operation not permitted")]
    EPERM = 1,
    #[error("no such device or address")]
    ENXIO = 6,
    #[error("resource temporarily unavailable")]
    EAGAIN = 11,
    #[error("device or resource busy")]
    EBUSY = 16,
    #[error("no such device")]
    ENODEV = 19,
    #[error("invalid argument")]
    EINVAL = 22,
}

assert_eq_size!(KernelError, c_int);

impl KernelError {
    /// Negative errno, as returned across the C boundary
    pub fn to_errno(self) -> c_int {
        -(self as c_int)
    }

    /// Map a negative errno back to a known error
    pub fn from_errno(errno: c_int) -> Option<Self> {
        match -errno {
            1 => Some(KernelError::EPERM),
            6 => Some(KernelError::ENXIO),
            11 => Some(KernelError::EAGAIN),
            16 => Some(KernelError::EBUSY),
            19 => Some(KernelError::ENODEV),
            22 => Some(KernelError::EINVAL),
            _ => None,
        }
    }
}

/// Result type for kernel operations
pub type KernelResult<T> = Result<T, KernelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_error_errno() {
        assert_eq!(KernelError::EBUSY.to_errno(), -16);
        assert_eq!(KernelError::EINVAL.to_errno(), -22);
        assert_eq!(KernelError::ENODEV.to_errno(), -19);
    }

    #[test]
    fn test_from_errno() {
        assert_eq!(KernelError::from_errno(-16), Some(KernelError::EBUSY));
        assert_eq!(KernelError::from_errno(-6), Some(KernelError::ENXIO));
        assert_eq!(KernelError::from_errno(0), None);
        assert_eq!(KernelError::from_errno(-9999), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(KernelError::EBUSY.to_string(), "device or resource busy");
        assert_eq!(KernelError::ENODEV.to_string(), "no such device");
    }
}
