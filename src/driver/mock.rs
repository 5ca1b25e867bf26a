//! In-process stand-in for the driver module
//!
//! Records every call, hands out unique fake handles, and lets tests make any
//! entry point fail. Live handle counts make leaks visible.

use super::{ClientHandle, DriverApi, DriverError, DriverOpen, TargetHandle};
use crate::error::PadError;
use crate::report::GamepadReport;
use std::cell::RefCell;
use std::collections::HashSet;
use std::ffi::c_void;
use std::path::Path;
use tracing::debug;

/// One recorded driver call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverCall {
    AllocClient,
    FreeClient,
    Connect,
    Disconnect,
    WaitableAddSupported,
    AllocX360Target,
    AllocDs4Target,
    FreeTarget,
    AddTarget,
    RemoveTarget,
    UpdateX360(GamepadReport),
}

/// Failure injection switches
#[derive(Debug, Clone, Default)]
pub struct MockFailures {
    /// `alloc_client` returns a null handle
    pub null_client: bool,
    pub connect: Option<DriverError>,
    /// Target allocators return a null handle
    pub null_target: bool,
    pub add_target: Option<DriverError>,
    pub remove_target: Option<DriverError>,
    pub update: Option<DriverError>,
}

#[derive(Default)]
struct MockState {
    next_handle: usize,
    calls: Vec<DriverCall>,
    failures: MockFailures,
    clients: HashSet<usize>,
    connected: HashSet<usize>,
    targets: HashSet<usize>,
    plugged: HashSet<usize>,
}

impl MockState {
    fn next_raw(&mut self) -> *mut c_void {
        self.next_handle += 0x10;
        self.next_handle as *mut c_void
    }
}

/// Scriptable driver double
#[derive(Default)]
pub struct MockDriver {
    state: RefCell<MockState>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failures(failures: MockFailures) -> Self {
        let driver = Self::new();
        driver.set_failures(failures);
        driver
    }

    pub fn set_failures(&self, failures: MockFailures) {
        self.state.borrow_mut().failures = failures;
    }

    pub fn calls(&self) -> Vec<DriverCall> {
        self.state.borrow().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.borrow().calls.len()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// Clients allocated and not yet freed
    pub fn live_clients(&self) -> usize {
        self.state.borrow().clients.len()
    }

    /// Clients currently connected to the bus
    pub fn connected_clients(&self) -> usize {
        self.state.borrow().connected.len()
    }

    /// Targets allocated and not yet freed
    pub fn live_targets(&self) -> usize {
        self.state.borrow().targets.len()
    }

    /// Targets currently added to the bus
    pub fn plugged_targets(&self) -> usize {
        self.state.borrow().plugged.len()
    }

    /// Reports received through `update_x360`, oldest first
    pub fn reports(&self) -> Vec<GamepadReport> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter_map(|c| match c {
                DriverCall::UpdateX360(r) => Some(*r),
                _ => None,
            })
            .collect()
    }

    pub fn last_report(&self) -> Option<GamepadReport> {
        self.reports().last().copied()
    }

    fn record(&self, call: DriverCall) {
        debug!(?call, "mock driver call");
        self.state.borrow_mut().calls.push(call);
    }

    fn alloc_target(&self, call: DriverCall) -> Option<TargetHandle> {
        self.record(call);
        let mut state = self.state.borrow_mut();
        if state.failures.null_target {
            return None;
        }
        let raw = state.next_raw();
        state.targets.insert(raw as usize);
        TargetHandle::from_raw(raw)
    }
}

impl DriverApi for MockDriver {
    fn alloc_client(&self) -> Option<ClientHandle> {
        self.record(DriverCall::AllocClient);
        let mut state = self.state.borrow_mut();
        if state.failures.null_client {
            return None;
        }
        let raw = state.next_raw();
        state.clients.insert(raw as usize);
        ClientHandle::from_raw(raw)
    }

    fn free_client(&self, client: ClientHandle) {
        self.record(DriverCall::FreeClient);
        self.state
            .borrow_mut()
            .clients
            .remove(&(client.as_raw() as usize));
    }

    fn connect(&self, client: ClientHandle) -> Result<(), DriverError> {
        self.record(DriverCall::Connect);
        let mut state = self.state.borrow_mut();
        if let Some(code) = state.failures.connect {
            return Err(code);
        }
        state.connected.insert(client.as_raw() as usize);
        Ok(())
    }

    fn disconnect(&self, client: ClientHandle) {
        self.record(DriverCall::Disconnect);
        self.state
            .borrow_mut()
            .connected
            .remove(&(client.as_raw() as usize));
    }

    fn target_is_waitable_add_supported(&self, _target: TargetHandle) -> bool {
        self.record(DriverCall::WaitableAddSupported);
        true
    }

    fn alloc_x360_target(&self) -> Option<TargetHandle> {
        self.alloc_target(DriverCall::AllocX360Target)
    }

    fn alloc_ds4_target(&self) -> Option<TargetHandle> {
        self.alloc_target(DriverCall::AllocDs4Target)
    }

    fn free_target(&self, target: TargetHandle) {
        self.record(DriverCall::FreeTarget);
        self.state
            .borrow_mut()
            .targets
            .remove(&(target.as_raw() as usize));
    }

    fn add_target(&self, _client: ClientHandle, target: TargetHandle) -> Result<(), DriverError> {
        self.record(DriverCall::AddTarget);
        let mut state = self.state.borrow_mut();
        if let Some(code) = state.failures.add_target {
            return Err(code);
        }
        state.plugged.insert(target.as_raw() as usize);
        Ok(())
    }

    fn remove_target(
        &self,
        _client: ClientHandle,
        target: TargetHandle,
    ) -> Result<(), DriverError> {
        self.record(DriverCall::RemoveTarget);
        let mut state = self.state.borrow_mut();
        state.plugged.remove(&(target.as_raw() as usize));
        match state.failures.remove_target {
            Some(code) => Err(code),
            None => Ok(()),
        }
    }

    fn update_x360(
        &self,
        _client: ClientHandle,
        _target: TargetHandle,
        report: GamepadReport,
    ) -> Result<(), DriverError> {
        self.record(DriverCall::UpdateX360(report));
        match self.state.borrow().failures.update {
            Some(code) => Err(code),
            None => Ok(()),
        }
    }
}

impl DriverOpen for MockDriver {
    fn open(path: &Path) -> Result<Self, PadError> {
        debug!("Mock driver standing in for {}", path.display());
        Ok(Self::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_are_unique_and_tracked() {
        let driver = MockDriver::new();
        let a = driver.alloc_client().unwrap();
        let b = driver.alloc_client().unwrap();
        assert_ne!(a, b);
        assert_eq!(driver.live_clients(), 2);

        driver.free_client(a);
        driver.free_client(b);
        assert_eq!(driver.live_clients(), 0);
        assert_eq!(driver.call_count(), 4);
    }

    #[test]
    fn test_injected_failures() {
        let driver = MockDriver::with_failures(MockFailures {
            null_target: true,
            connect: Some(DriverError::BusNotFound),
            ..Default::default()
        });
        let client = driver.alloc_client().unwrap();

        assert_eq!(driver.connect(client), Err(DriverError::BusNotFound));
        assert_eq!(driver.connected_clients(), 0);
        assert!(driver.alloc_x360_target().is_none());
        assert_eq!(driver.live_targets(), 0);
    }
}
