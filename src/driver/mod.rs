//! Virtual gamepad bus driver interface
//!
//! [`DriverApi`] is the strongly-typed view of the eleven entry points the
//! vendor client module exports. [`library::DriverLibrary`] resolves them
//! from a dynamic module at runtime; [`mock::MockDriver`] stands in for it
//! when no driver is installed.

pub mod library;
pub mod mock;

use crate::error::PadError;
use crate::report::GamepadReport;
use std::ffi::c_void;
use std::fmt;
use std::path::Path;
use std::ptr::NonNull;
use thiserror::Error;

pub use library::DriverLibrary;
pub use mock::MockDriver;

/// Raw status value the driver returns on success
pub const STATUS_SUCCESS: u32 = 0x2000_0000;

/// Driver status codes other than success
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum DriverError {
    #[error("bus not found")]
    BusNotFound,
    #[error("no free slot")]
    NoFreeSlot,
    #[error("invalid target")]
    InvalidTarget,
    #[error("removal failed")]
    RemovalFailed,
    #[error("already connected")]
    AlreadyConnected,
    #[error("target uninitialized")]
    TargetUninitialized,
    #[error("target not plugged in")]
    TargetNotPluggedIn,
    #[error("bus version mismatch")]
    BusVersionMismatch,
    #[error("bus access failed")]
    BusAccessFailed,
    #[error("callback already registered")]
    CallbackAlreadyRegistered,
    #[error("callback not found")]
    CallbackNotFound,
    #[error("bus already connected")]
    BusAlreadyConnected,
    #[error("invalid bus handle")]
    BusInvalidHandle,
    #[error("user index out of range")]
    UserIndexOutOfRange,
    #[error("invalid parameter")]
    InvalidParameter,
    #[error("not supported")]
    NotSupported,
    #[error("unknown status 0x{0:08X}")]
    Unknown(u32),
}

impl DriverError {
    /// Map a raw status to `Ok(())` for success or the matching error
    pub fn check(raw: u32) -> Result<(), DriverError> {
        if raw == STATUS_SUCCESS {
            Ok(())
        } else {
            Err(Self::from_raw(raw))
        }
    }

    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0xE000_0001 => DriverError::BusNotFound,
            0xE000_0002 => DriverError::NoFreeSlot,
            0xE000_0003 => DriverError::InvalidTarget,
            0xE000_0004 => DriverError::RemovalFailed,
            0xE000_0005 => DriverError::AlreadyConnected,
            0xE000_0006 => DriverError::TargetUninitialized,
            0xE000_0007 => DriverError::TargetNotPluggedIn,
            0xE000_0008 => DriverError::BusVersionMismatch,
            0xE000_0009 => DriverError::BusAccessFailed,
            0xE000_0010 => DriverError::CallbackAlreadyRegistered,
            0xE000_0011 => DriverError::CallbackNotFound,
            0xE000_0012 => DriverError::BusAlreadyConnected,
            0xE000_0013 => DriverError::BusInvalidHandle,
            0xE000_0014 => DriverError::UserIndexOutOfRange,
            0xE000_0015 => DriverError::InvalidParameter,
            0xE000_0016 => DriverError::NotSupported,
            other => DriverError::Unknown(other),
        }
    }

    pub fn to_raw(self) -> u32 {
        match self {
            DriverError::BusNotFound => 0xE000_0001,
            DriverError::NoFreeSlot => 0xE000_0002,
            DriverError::InvalidTarget => 0xE000_0003,
            DriverError::RemovalFailed => 0xE000_0004,
            DriverError::AlreadyConnected => 0xE000_0005,
            DriverError::TargetUninitialized => 0xE000_0006,
            DriverError::TargetNotPluggedIn => 0xE000_0007,
            DriverError::BusVersionMismatch => 0xE000_0008,
            DriverError::BusAccessFailed => 0xE000_0009,
            DriverError::CallbackAlreadyRegistered => 0xE000_0010,
            DriverError::CallbackNotFound => 0xE000_0011,
            DriverError::BusAlreadyConnected => 0xE000_0012,
            DriverError::BusInvalidHandle => 0xE000_0013,
            DriverError::UserIndexOutOfRange => 0xE000_0014,
            DriverError::InvalidParameter => 0xE000_0015,
            DriverError::NotSupported => 0xE000_0016,
            DriverError::Unknown(raw) => raw,
        }
    }
}

/// Opaque driver client handle
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientHandle(NonNull<c_void>);

/// Opaque driver target handle
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetHandle(NonNull<c_void>);

macro_rules! opaque_handle {
    ($name:ident) => {
        impl $name {
            /// Wrap a raw pointer returned by the driver; null means allocation failed
            pub fn from_raw(raw: *mut c_void) -> Option<Self> {
                NonNull::new(raw).map(Self)
            }

            pub fn as_raw(self) -> *mut c_void {
                self.0.as_ptr()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:p})", stringify!($name), self.0)
            }
        }
    };
}

opaque_handle!(ClientHandle);
opaque_handle!(TargetHandle);

/// Controller profile a target is allocated for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TargetProfile {
    #[default]
    X360,
    Ds4,
}

impl TargetProfile {
    /// Parse `"x360"` or `"ds4"`, ignoring case
    pub fn parse(name: &str) -> Result<Self, PadError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "x360" => Ok(TargetProfile::X360),
            "ds4" => Ok(TargetProfile::Ds4),
            _ => Err(PadError::Config(format!(
                "target must be x360 or ds4, got {:?}",
                name
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TargetProfile::X360 => "x360",
            TargetProfile::Ds4 => "ds4",
        }
    }
}

impl fmt::Display for TargetProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The driver's exported entry points
///
/// All calls are blocking and run on the caller's thread. Handles passed in
/// must have been obtained from the same implementation.
pub trait DriverApi {
    fn alloc_client(&self) -> Option<ClientHandle>;
    fn free_client(&self, client: ClientHandle);
    fn connect(&self, client: ClientHandle) -> Result<(), DriverError>;
    fn disconnect(&self, client: ClientHandle);

    fn target_is_waitable_add_supported(&self, target: TargetHandle) -> bool;
    fn alloc_x360_target(&self) -> Option<TargetHandle>;
    fn alloc_ds4_target(&self) -> Option<TargetHandle>;
    fn free_target(&self, target: TargetHandle);

    fn add_target(&self, client: ClientHandle, target: TargetHandle) -> Result<(), DriverError>;
    fn remove_target(&self, client: ClientHandle, target: TargetHandle)
        -> Result<(), DriverError>;

    fn update_x360(
        &self,
        client: ClientHandle,
        target: TargetHandle,
        report: GamepadReport,
    ) -> Result<(), DriverError>;
}

/// Drivers that can be constructed from a module path
pub trait DriverOpen: DriverApi + Sized {
    fn open(path: &Path) -> Result<Self, PadError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_success() {
        assert_eq!(DriverError::check(STATUS_SUCCESS), Ok(()));
        assert_eq!(
            DriverError::check(0xE000_0005),
            Err(DriverError::AlreadyConnected)
        );
    }

    #[test]
    fn test_status_codes_roundtrip() {
        for raw in (0xE000_0001..=0xE000_0009).chain(0xE000_0010..=0xE000_0016) {
            let code = DriverError::from_raw(raw);
            assert!(!matches!(code, DriverError::Unknown(_)), "0x{raw:08X}");
            assert_eq!(code.to_raw(), raw);
        }
        assert_eq!(DriverError::from_raw(0x1234), DriverError::Unknown(0x1234));
        assert_eq!(DriverError::Unknown(0x1234).to_raw(), 0x1234);
    }

    #[test]
    fn test_profile_parse() {
        assert_eq!(TargetProfile::parse("x360").unwrap(), TargetProfile::X360);
        assert_eq!(TargetProfile::parse("DS4").unwrap(), TargetProfile::Ds4);
        assert_eq!(TargetProfile::parse("X360").unwrap(), TargetProfile::X360);
        assert!(matches!(
            TargetProfile::parse("ds5"),
            Err(PadError::Config(_))
        ));
    }

    #[test]
    fn test_null_handle_rejected() {
        assert!(ClientHandle::from_raw(std::ptr::null_mut()).is_none());
        assert!(TargetHandle::from_raw(0x10 as *mut c_void).is_some());
    }
}
