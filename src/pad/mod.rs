//! Virtual pad: report accumulator, operation dispatch and key resolution
//!
//! Every physical press or release mutates the owned [`GamepadReport`] and
//! then flushes the whole report to the driver. A failed flush is returned
//! to the caller but the local mutation is kept, so the report can run ahead
//! of what the device last accepted.

use crate::dispatch;
use crate::driver::{DriverApi, DriverError, DriverOpen, TargetProfile};
use crate::error::{PadError, Result};
use crate::keymap::KeyMap;
use crate::keys::Key;
use crate::lifecycle::{Lifecycle, LinkState, PadEvent};
use crate::operation::Operation;
use crate::report::GamepadReport;
use std::path::Path;
use tracing::{debug, warn};


/// Driver lifecycle plus the controller state fed to it
pub struct VirtualPad<D: DriverApi> {
    lifecycle: Lifecycle<D>,
    report: GamepadReport,
    keymap: KeyMap,
    default_profile: TargetProfile,
}

impl<D: DriverApi> Default for VirtualPad<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: DriverApi> VirtualPad<D> {
    /// Unbound pad with the default key map
    pub fn new() -> Self {
        Self::from_lifecycle(Lifecycle::new())
    }

    /// Pad bound to an existing driver
    pub fn with_driver(driver: D) -> Self {
        Self::from_lifecycle(Lifecycle::with_driver(driver))
    }

    fn from_lifecycle(lifecycle: Lifecycle<D>) -> Self {
        Self {
            lifecycle,
            report: GamepadReport::neutral(),
            keymap: KeyMap::create_default(),
            default_profile: TargetProfile::default(),
        }
    }

    pub fn lifecycle(&self) -> &Lifecycle<D> {
        &self.lifecycle
    }

    pub fn lifecycle_mut(&mut self) -> &mut Lifecycle<D> {
        &mut self.lifecycle
    }

    pub fn driver(&self) -> Option<&D> {
        self.lifecycle.driver()
    }

    pub fn is_loaded(&self) -> bool {
        self.lifecycle.is_loaded()
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle.is_active()
    }

    pub fn state(&self) -> LinkState {
        self.lifecycle.state()
    }

    pub fn subscribe(&mut self, callback: impl Fn(PadEvent) + 'static) {
        self.lifecycle.subscribe(callback);
    }

    /// Profile used by the connect meta-operation
    pub fn default_profile(&self) -> TargetProfile {
        self.default_profile
    }

    pub fn set_default_profile(&mut self, profile: TargetProfile) {
        self.default_profile = profile;
    }

    pub fn startup(&mut self, profile: &str) -> Result<()> {
        self.lifecycle.startup(profile)
    }

    pub fn shutdown(&mut self) -> Result<()> {
        self.lifecycle.shutdown()
    }

    /// Current accumulated report
    pub fn report(&self) -> &GamepadReport {
        &self.report
    }

    pub fn key_map(&self) -> &KeyMap {
        &self.keymap
    }

    pub fn key_map_mut(&mut self) -> &mut KeyMap {
        &mut self.keymap
    }

    /// Replace the whole key map
    pub fn set_key_map(&mut self, keymap: KeyMap) {
        self.keymap = keymap;
    }

    /// Whether `key` is bound to any operation
    pub fn is_key_associated(&self, key: Key) -> bool {
        self.keymap.resolvable_key(key)
    }

    pub fn press(&mut self, op: Operation) -> Result<()> {
        self.do_operation(op, true)
    }

    pub fn release(&mut self, op: Operation) -> Result<()> {
        self.do_operation(op, false)
    }

    /// Press or release `op`
    ///
    /// Physical operations mutate the report and flush it. Pressing
    /// `Connect` starts the pad with the default profile and pressing
    /// `Disconnect` shuts it down; releasing either, and any use of
    /// `Invalid`, does nothing.
    pub fn do_operation(&mut self, op: Operation, pressed: bool) -> Result<()> {
        match op {
            Operation::Invalid => Ok(()),
            Operation::Connect if pressed => self.connect_pressed(),
            Operation::Disconnect if pressed => {
                if let Err(e) = self.lifecycle.shutdown() {
                    debug!("Disconnect ignored: {}", e);
                }
                Ok(())
            }
            Operation::Connect | Operation::Disconnect => Ok(()),
            op => {
                dispatch::apply(&mut self.report, op, pressed);
                debug!(
                    operation = %op,
                    pressed,
                    buttons = ?self.report.buttons,
                    "Report updated"
                );
                self.flush()
            }
        }
    }

    fn connect_pressed(&mut self) -> Result<()> {
        let profile = self.default_profile.as_str();
        self.lifecycle.startup(profile).map_err(|e| {
            warn!("Connect failed: {}", e);
            PadError::status("startup", DriverError::AlreadyConnected)
        })
    }

    /// Press whatever operation `key` is bound to; unbound keys are ignored
    pub fn press_key(&mut self, key: Key) -> Result<()> {
        let op = self.keymap.resolve_key(key);
        self.do_operation(op, true)
    }

    pub fn release_key(&mut self, key: Key) -> Result<()> {
        let op = self.keymap.resolve_key(key);
        self.do_operation(op, false)
    }

    /// Send the whole current report to the driver
    pub fn flush(&mut self) -> Result<()> {
        self.lifecycle.send_report(self.report)
    }

    /// Reset the report to neutral without flushing
    pub fn reset_report(&mut self) {
        self.report = GamepadReport::neutral();
    }
}

impl<D: DriverOpen> VirtualPad<D> {
    /// Load the driver module, see [`Lifecycle::load`]
    pub fn load(&mut self, path: Option<&Path>) -> Result<()> {
        self.lifecycle.load(path)
    }
}
