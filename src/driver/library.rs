//! Runtime binding to the vendor client module
//!
//! The module is opened with `libloading` and every entry point is resolved
//! by name into a [`FunctionTable`]. Resolution is all-or-nothing: the table
//! only exists once all eleven symbols were found, so callers never observe
//! a half-populated binding.

use super::{ClientHandle, DriverApi, DriverError, DriverOpen, TargetHandle};
use crate::error::PadError;
use crate::report::GamepadReport;
use libloading::Library;
use std::ffi::c_void;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Module name used when no path is configured
pub const DEFAULT_LIBRARY: &str = "ViGEmClient.dll";

type AllocFn = unsafe extern "C" fn() -> *mut c_void;
type FreeFn = unsafe extern "C" fn(*mut c_void);
type ConnectFn = unsafe extern "C" fn(*mut c_void) -> u32;
type DisconnectFn = unsafe extern "C" fn(*mut c_void);
type WaitableAddSupportedFn = unsafe extern "C" fn(*mut c_void) -> i32;
type TargetAllocFn = unsafe extern "C" fn() -> *mut c_void;
type TargetFreeFn = unsafe extern "C" fn(*mut c_void);
type TargetAddFn = unsafe extern "C" fn(*mut c_void, *mut c_void) -> u32;
type TargetRemoveFn = unsafe extern "C" fn(*mut c_void, *mut c_void) -> u32;
type X360UpdateFn = unsafe extern "C" fn(*mut c_void, *mut c_void, GamepadReport) -> u32;

/// Resolved entry points
#[derive(Clone, Copy)]
struct FunctionTable {
    alloc: AllocFn,
    free: FreeFn,
    connect: ConnectFn,
    disconnect: DisconnectFn,
    target_is_waitable_add_supported: WaitableAddSupportedFn,
    target_x360_alloc: TargetAllocFn,
    target_ds4_alloc: TargetAllocFn,
    target_free: TargetFreeFn,
    target_add: TargetAddFn,
    target_remove: TargetRemoveFn,
    target_x360_update: X360UpdateFn,
}

impl FunctionTable {
    /// Resolve every entry point, failing on the first missing symbol
    ///
    /// # Safety
    /// The module must export these symbols with the declared signatures.
    unsafe fn resolve(library: &Library) -> Result<Self, PadError> {
        Ok(Self {
            alloc: symbol(library, "vigem_alloc")?,
            free: symbol(library, "vigem_free")?,
            connect: symbol(library, "vigem_connect")?,
            disconnect: symbol(library, "vigem_disconnect")?,
            target_is_waitable_add_supported: symbol(
                library,
                "vigem_target_is_waitable_add_supported",
            )?,
            target_x360_alloc: symbol(library, "vigem_target_x360_alloc")?,
            target_ds4_alloc: symbol(library, "vigem_target_ds4_alloc")?,
            target_free: symbol(library, "vigem_target_free")?,
            target_add: symbol(library, "vigem_target_add")?,
            target_remove: symbol(library, "vigem_target_remove")?,
            target_x360_update: symbol(library, "vigem_target_x360_update")?,
        })
    }
}

unsafe fn symbol<T: Copy>(library: &Library, name: &'static str) -> Result<T, PadError> {
    match library.get::<T>(name.as_bytes()) {
        Ok(sym) => {
            debug!("Resolved {}", name);
            Ok(*sym)
        }
        Err(e) => {
            warn!("Failed to load {} function: {}", name, e);
            Err(PadError::Load(format!("failed to resolve {}: {}", name, e)))
        }
    }
}

/// A loaded client module with its resolved function table
///
/// The table is immutable once built. Function pointers stay valid for as
/// long as the module handle held alongside them.
pub struct DriverLibrary {
    path: PathBuf,
    table: FunctionTable,
    _library: Library,
}

impl DriverLibrary {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DriverOpen for DriverLibrary {
    fn open(path: &Path) -> Result<Self, PadError> {
        // SAFETY: loading runs the module's initialisers; the vendor client
        // module has no initialisation side effects beyond its own state.
        let library = unsafe { Library::new(path) }.map_err(|e| {
            warn!("Failed to load driver module {}: {}", path.display(), e);
            PadError::Load(format!("failed to load {}: {}", path.display(), e))
        })?;

        // SAFETY: signatures match the vendor client header.
        let table = unsafe { FunctionTable::resolve(&library) }?;

        info!("Driver module loaded: {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            table,
            _library: library,
        })
    }
}

// SAFETY (all calls below): pointers in the table were resolved from the
// module kept alive in `_library`, and handles were produced by this module.
impl DriverApi for DriverLibrary {
    fn alloc_client(&self) -> Option<ClientHandle> {
        ClientHandle::from_raw(unsafe { (self.table.alloc)() })
    }

    fn free_client(&self, client: ClientHandle) {
        unsafe { (self.table.free)(client.as_raw()) }
    }

    fn connect(&self, client: ClientHandle) -> Result<(), DriverError> {
        DriverError::check(unsafe { (self.table.connect)(client.as_raw()) })
    }

    fn disconnect(&self, client: ClientHandle) {
        unsafe { (self.table.disconnect)(client.as_raw()) }
    }

    fn target_is_waitable_add_supported(&self, target: TargetHandle) -> bool {
        unsafe { (self.table.target_is_waitable_add_supported)(target.as_raw()) != 0 }
    }

    fn alloc_x360_target(&self) -> Option<TargetHandle> {
        TargetHandle::from_raw(unsafe { (self.table.target_x360_alloc)() })
    }

    fn alloc_ds4_target(&self) -> Option<TargetHandle> {
        TargetHandle::from_raw(unsafe { (self.table.target_ds4_alloc)() })
    }

    fn free_target(&self, target: TargetHandle) {
        unsafe { (self.table.target_free)(target.as_raw()) }
    }

    fn add_target(&self, client: ClientHandle, target: TargetHandle) -> Result<(), DriverError> {
        DriverError::check(unsafe { (self.table.target_add)(client.as_raw(), target.as_raw()) })
    }

    fn remove_target(
        &self,
        client: ClientHandle,
        target: TargetHandle,
    ) -> Result<(), DriverError> {
        DriverError::check(unsafe {
            (self.table.target_remove)(client.as_raw(), target.as_raw())
        })
    }

    fn update_x360(
        &self,
        client: ClientHandle,
        target: TargetHandle,
        report: GamepadReport,
    ) -> Result<(), DriverError> {
        DriverError::check(unsafe {
            (self.table.target_x360_update)(client.as_raw(), target.as_raw(), report)
        })
    }
}
