//! Connection lifecycle of the virtual controller
//!
//! ```text
//!   Unbound ──load──▶ Loaded ──startup──▶ Active
//!                        ▲                  │
//!                        └─────shutdown─────┘
//! ```
//!
//! `startup` runs as one step from the caller's point of view: allocate and
//! connect a client, allocate and add a target. Each failure point undoes
//! what was acquired before it, so a failed startup never leaks a handle and
//! always leaves the machine in `Loaded`.

use crate::driver::{
    library::DEFAULT_LIBRARY, ClientHandle, DriverApi, DriverError, DriverOpen, TargetHandle,
    TargetProfile,
};
use crate::error::{PadError, Result, StateError};
use crate::report::GamepadReport;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Externally visible lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No driver module bound
    Unbound,
    /// Driver bound, no client/target
    Loaded,
    /// Client connected and target added to the bus
    Active,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkState::Unbound => write!(f, "unbound"),
            LinkState::Loaded => write!(f, "loaded"),
            LinkState::Active => write!(f, "active"),
        }
    }
}

/// Notifications emitted once per successful transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadEvent {
    Activated,
    Deactivated,
}

/// Listener for [`PadEvent`]s
pub type EventCallback = Box<dyn Fn(PadEvent)>;

/// Handles owned while Active
#[derive(Debug)]
struct Session {
    client: ClientHandle,
    target: TargetHandle,
    profile: TargetProfile,
}

/// Owns the driver binding and the client/target handles
pub struct Lifecycle<D: DriverApi> {
    driver: Option<D>,
    library_path: PathBuf,
    session: Option<Session>,
    listeners: Vec<EventCallback>,
}

impl<D: DriverApi> Default for Lifecycle<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: DriverApi> Lifecycle<D> {
    /// Unbound lifecycle using the default module name
    pub fn new() -> Self {
        Self {
            driver: None,
            library_path: PathBuf::from(DEFAULT_LIBRARY),
            session: None,
            listeners: Vec::new(),
        }
    }

    /// Lifecycle already in `Loaded` with the given binding
    pub fn with_driver(driver: D) -> Self {
        let mut lifecycle = Self::new();
        lifecycle.driver = Some(driver);
        lifecycle
    }

    /// Bind an already constructed driver
    pub fn attach(&mut self, driver: D) -> Result<()> {
        if self.driver.is_some() {
            warn!("Driver already loaded");
            return Err(PadError::Load("driver already loaded".into()));
        }
        self.driver = Some(driver);
        Ok(())
    }

    pub fn library_path(&self) -> &Path {
        &self.library_path
    }

    /// Path used by the next `load(None)`
    pub fn set_library_path(&mut self, path: impl Into<PathBuf>) {
        self.library_path = path.into();
    }

    pub fn state(&self) -> LinkState {
        match (&self.driver, &self.session) {
            (None, _) => LinkState::Unbound,
            (Some(_), None) => LinkState::Loaded,
            (Some(_), Some(_)) => LinkState::Active,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.driver.is_some()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Profile of the active target
    pub fn profile(&self) -> Option<TargetProfile> {
        self.session.as_ref().map(|s| s.profile)
    }

    pub fn driver(&self) -> Option<&D> {
        self.driver.as_ref()
    }

    pub fn subscribe(&mut self, callback: impl Fn(PadEvent) + 'static) {
        self.listeners.push(Box::new(callback));
    }

    fn emit(&self, event: PadEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }

    /// Bring the virtual controller up for `profile` ("x360" or "ds4")
    pub fn startup(&mut self, profile: &str) -> Result<()> {
        if self.session.is_some() {
            warn!("startup called when already started");
            return Err(StateError::AlreadyActive.into());
        }
        let Some(driver) = self.driver.as_ref() else {
            warn!("startup called before the driver was loaded");
            return Err(StateError::NotLoaded.into());
        };

        let session = Self::open_session(driver, profile)?;
        info!(
            profile = %session.profile,
            client = ?session.client,
            target = ?session.target,
            "Virtual controller active"
        );
        self.session = Some(session);
        self.emit(PadEvent::Activated);
        Ok(())
    }

    fn open_session(driver: &D, profile: &str) -> Result<Session> {
        let client = driver.alloc_client().ok_or_else(|| {
            warn!("vigem_alloc returned a null handle");
            PadError::null_handle("vigem_alloc")
        })?;

        if let Err(code) = driver.connect(client) {
            warn!("vigem_connect returned {}", code);
            driver.free_client(client);
            return Err(PadError::status("vigem_connect", code));
        }

        let release_client = || {
            driver.disconnect(client);
            driver.free_client(client);
        };

        let profile = match TargetProfile::parse(profile) {
            Ok(p) => p,
            Err(e) => {
                warn!("{}", e);
                release_client();
                return Err(e);
            }
        };

        let (call, target) = match profile {
            TargetProfile::X360 => ("vigem_target_x360_alloc", driver.alloc_x360_target()),
            TargetProfile::Ds4 => ("vigem_target_ds4_alloc", driver.alloc_ds4_target()),
        };
        let Some(target) = target else {
            warn!("{} returned a null handle for target {}", call, profile);
            release_client();
            return Err(PadError::null_handle(call));
        };

        let waitable = driver.target_is_waitable_add_supported(target);
        debug!(waitable, "Waitable target add support");

        if let Err(code) = driver.add_target(client, target) {
            warn!("vigem_target_add returned {}", code);
            driver.free_target(target);
            release_client();
            return Err(PadError::status("vigem_target_add", code));
        }

        Ok(Session {
            client,
            target,
            profile,
        })
    }

    /// Remove the target and release both handles
    pub fn shutdown(&mut self) -> Result<()> {
        let (Some(driver), Some(session)) = (self.driver.as_ref(), self.session.as_ref()) else {
            debug!("shutdown called while inactive");
            return Err(StateError::NotActive.into());
        };

        if let Err(code) = driver.remove_target(session.client, session.target) {
            warn!("vigem_target_remove returned {}", code);
        }
        driver.free_target(session.target);
        driver.disconnect(session.client);
        driver.free_client(session.client);

        self.session = None;
        info!("Virtual controller inactive");
        self.emit(PadEvent::Deactivated);
        Ok(())
    }

    /// Send a full report to the active target
    ///
    /// Without a plugged-in target nothing reaches the driver and the
    /// update is reported as [`DriverError::BusInvalidHandle`].
    pub fn send_report(&self, report: GamepadReport) -> Result<()> {
        let (Some(driver), Some(session)) = (self.driver.as_ref(), self.session.as_ref()) else {
            debug!("Report not sent, controller inactive");
            return Err(PadError::status(
                "vigem_target_x360_update",
                DriverError::BusInvalidHandle,
            ));
        };

        driver
            .update_x360(session.client, session.target, report)
            .map_err(|code| {
                warn!("vigem_target_x360_update returned {}", code);
                PadError::status("vigem_target_x360_update", code)
            })
    }
}

impl<D: DriverOpen> Lifecycle<D> {
    /// Load the driver module from `path`, or the configured library path
    ///
    /// A binding can only be made once.
    pub fn load(&mut self, path: Option<&Path>) -> Result<()> {
        if self.driver.is_some() {
            warn!("Driver already loaded");
            return Err(PadError::Load("driver already loaded".into()));
        }

        if let Some(path) = path.filter(|p| !p.as_os_str().is_empty()) {
            self.library_path = path.to_path_buf();
        }
        if self.library_path.as_os_str().is_empty() {
            warn!("Driver path not specified");
            return Err(PadError::Load("driver path not specified".into()));
        }

        let driver = D::open(&self.library_path)?;
        self.driver = Some(driver);
        Ok(())
    }
}

impl<D: DriverApi> Drop for Lifecycle<D> {
    fn drop(&mut self) {
        if self.session.is_some() {
            debug!("Releasing active controller on drop");
            let _ = self.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::mock::{DriverCall, MockDriver, MockFailures};
    use crate::driver::DriverError;
    use crate::error::ProtocolError;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder(lifecycle: &mut Lifecycle<MockDriver>) -> Rc<RefCell<Vec<PadEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        lifecycle.subscribe(move |e| sink.borrow_mut().push(e));
        events
    }

    fn assert_no_leaks(driver: &MockDriver) {
        assert_eq!(driver.live_clients(), 0, "client leaked");
        assert_eq!(driver.connected_clients(), 0, "client left connected");
        assert_eq!(driver.live_targets(), 0, "target leaked");
        assert_eq!(driver.plugged_targets(), 0, "target left plugged");
    }

    #[test]
    fn test_state_progression() {
        let mut lifecycle: Lifecycle<MockDriver> = Lifecycle::new();
        assert_eq!(lifecycle.state(), LinkState::Unbound);

        lifecycle.load(Some(Path::new("ViGEmClient.dll"))).unwrap();
        assert_eq!(lifecycle.state(), LinkState::Loaded);
        assert!(lifecycle.is_loaded());

        let events = recorder(&mut lifecycle);
        lifecycle.startup("x360").unwrap();
        assert_eq!(lifecycle.state(), LinkState::Active);
        assert_eq!(lifecycle.profile(), Some(TargetProfile::X360));

        lifecycle.shutdown().unwrap();
        assert_eq!(lifecycle.state(), LinkState::Loaded);
        assert_eq!(*events.borrow(), vec![PadEvent::Activated, PadEvent::Deactivated]);
        assert_no_leaks(lifecycle.driver().unwrap());
    }

    #[test]
    fn test_load_twice_is_rejected() {
        let mut lifecycle: Lifecycle<MockDriver> = Lifecycle::new();
        lifecycle.load(None).unwrap();
        assert!(matches!(lifecycle.load(None), Err(PadError::Load(_))));
        assert!(lifecycle.attach(MockDriver::new()).is_err());
    }

    #[test]
    fn test_load_without_path_is_rejected() {
        let mut lifecycle: Lifecycle<MockDriver> = Lifecycle::new();
        lifecycle.set_library_path("");
        assert!(matches!(lifecycle.load(None), Err(PadError::Load(_))));
        assert!(!lifecycle.is_loaded());
    }

    #[test]
    fn test_load_keeps_configured_path() {
        let mut lifecycle: Lifecycle<MockDriver> = Lifecycle::new();
        lifecycle.set_library_path("C:/drivers/custom.dll");
        lifecycle.load(Some(Path::new(""))).unwrap();
        assert_eq!(lifecycle.library_path(), Path::new("C:/drivers/custom.dll"));
    }

    #[test]
    fn test_missing_module_leaves_unbound() {
        use crate::driver::DriverLibrary;
        let mut lifecycle: Lifecycle<DriverLibrary> = Lifecycle::new();
        assert!(matches!(
            lifecycle.load(Some(Path::new("missing.dll"))),
            Err(PadError::Load(_))
        ));
        assert!(!lifecycle.is_loaded());
        assert_eq!(lifecycle.state(), LinkState::Unbound);
    }

    #[test]
    fn test_startup_sequence_calls() {
        let mut lifecycle = Lifecycle::with_driver(MockDriver::new());
        lifecycle.startup("DS4").unwrap();

        assert_eq!(
            lifecycle.driver().unwrap().calls(),
            vec![
                DriverCall::AllocClient,
                DriverCall::Connect,
                DriverCall::AllocDs4Target,
                DriverCall::WaitableAddSupported,
                DriverCall::AddTarget,
            ]
        );
    }

    #[test]
    fn test_startup_while_active_issues_no_calls() {
        let mut lifecycle = Lifecycle::with_driver(MockDriver::new());
        let events = recorder(&mut lifecycle);
        lifecycle.startup("x360").unwrap();
        lifecycle.driver().unwrap().clear_calls();

        let err = lifecycle.startup("x360").unwrap_err();
        assert!(matches!(err, PadError::State(StateError::AlreadyActive)));
        assert_eq!(lifecycle.driver().unwrap().call_count(), 0);
        assert_eq!(events.borrow().len(), 1);
    }

    #[test]
    fn test_startup_while_unbound_is_rejected() {
        let mut lifecycle: Lifecycle<MockDriver> = Lifecycle::new();
        assert!(matches!(
            lifecycle.startup("x360"),
            Err(PadError::State(StateError::NotLoaded))
        ));
    }

    #[test]
    fn test_shutdown_while_inactive_issues_no_calls() {
        let mut lifecycle = Lifecycle::with_driver(MockDriver::new());
        let events = recorder(&mut lifecycle);

        let err = lifecycle.shutdown().unwrap_err();
        assert!(matches!(err, PadError::State(StateError::NotActive)));
        assert_eq!(lifecycle.driver().unwrap().call_count(), 0);
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_shutdown_sequence_calls() {
        let mut lifecycle = Lifecycle::with_driver(MockDriver::new());
        lifecycle.startup("x360").unwrap();
        lifecycle.driver().unwrap().clear_calls();

        lifecycle.shutdown().unwrap();
        assert_eq!(
            lifecycle.driver().unwrap().calls(),
            vec![
                DriverCall::RemoveTarget,
                DriverCall::FreeTarget,
                DriverCall::Disconnect,
                DriverCall::FreeClient,
            ]
        );
    }

    #[test]
    fn test_null_client_fails_without_further_calls() {
        let driver = MockDriver::with_failures(MockFailures {
            null_client: true,
            ..Default::default()
        });
        let mut lifecycle = Lifecycle::with_driver(driver);

        let err = lifecycle.startup("x360").unwrap_err();
        assert!(matches!(
            err,
            PadError::Protocol(ProtocolError::NullHandle { call: "vigem_alloc" })
        ));
        assert_eq!(lifecycle.driver().unwrap().calls(), vec![DriverCall::AllocClient]);
        assert_eq!(lifecycle.state(), LinkState::Loaded);
    }

    #[test]
    fn test_connect_failure_frees_client() {
        let driver = MockDriver::with_failures(MockFailures {
            connect: Some(DriverError::BusNotFound),
            ..Default::default()
        });
        let mut lifecycle = Lifecycle::with_driver(driver);

        let err = lifecycle.startup("x360").unwrap_err();
        assert_eq!(err.driver_code(), Some(DriverError::BusNotFound));
        assert_eq!(
            lifecycle.driver().unwrap().calls(),
            vec![DriverCall::AllocClient, DriverCall::Connect, DriverCall::FreeClient]
        );
        assert_no_leaks(lifecycle.driver().unwrap());
    }

    #[test]
    fn test_unknown_profile_rolls_back_client() {
        let mut lifecycle = Lifecycle::with_driver(MockDriver::new());
        let events = recorder(&mut lifecycle);

        let err = lifecycle.startup("ds5").unwrap_err();
        assert!(matches!(err, PadError::Config(_)));
        assert_eq!(
            lifecycle.driver().unwrap().calls(),
            vec![
                DriverCall::AllocClient,
                DriverCall::Connect,
                DriverCall::Disconnect,
                DriverCall::FreeClient,
            ]
        );
        assert_no_leaks(lifecycle.driver().unwrap());
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_null_target_rolls_back_client() {
        let driver = MockDriver::with_failures(MockFailures {
            null_target: true,
            ..Default::default()
        });
        let mut lifecycle = Lifecycle::with_driver(driver);

        let err = lifecycle.startup("x360").unwrap_err();
        assert!(matches!(err, PadError::Protocol(ProtocolError::NullHandle { .. })));
        assert_no_leaks(lifecycle.driver().unwrap());
        assert!(!lifecycle.is_active());
    }

    #[test]
    fn test_repeated_add_failures_never_leak() {
        let driver = MockDriver::with_failures(MockFailures {
            add_target: Some(DriverError::NoFreeSlot),
            ..Default::default()
        });
        let mut lifecycle = Lifecycle::with_driver(driver);

        for _ in 0..5 {
            let err = lifecycle.startup("x360").unwrap_err();
            assert_eq!(err.driver_code(), Some(DriverError::NoFreeSlot));
            assert_no_leaks(lifecycle.driver().unwrap());
            assert_eq!(lifecycle.state(), LinkState::Loaded);
        }

        let calls = lifecycle.driver().unwrap().calls();
        assert_eq!(
            &calls[calls.len() - 4..],
            &[
                DriverCall::AddTarget,
                DriverCall::FreeTarget,
                DriverCall::Disconnect,
                DriverCall::FreeClient,
            ]
        );
    }

    #[test]
    fn test_remove_failure_still_releases_handles() {
        let mut lifecycle = Lifecycle::with_driver(MockDriver::new());
        lifecycle.startup("x360").unwrap();
        lifecycle.driver().unwrap().set_failures(MockFailures {
            remove_target: Some(DriverError::RemovalFailed),
            ..Default::default()
        });

        lifecycle.shutdown().unwrap();
        assert_no_leaks(lifecycle.driver().unwrap());
        assert!(!lifecycle.is_active());
    }

    #[test]
    fn test_send_report_requires_active() {
        let lifecycle = Lifecycle::with_driver(MockDriver::new());
        let err = lifecycle.send_report(GamepadReport::neutral()).unwrap_err();
        assert!(matches!(
            err,
            PadError::Protocol(ProtocolError::Status {
                call: "vigem_target_x360_update",
                code: DriverError::BusInvalidHandle,
            })
        ));
        assert_eq!(lifecycle.driver().unwrap().call_count(), 0);
    }

    #[test]
    fn test_with_driver_starts_loaded() {
        let mut lifecycle = Lifecycle::with_driver(MockDriver::new());
        assert_eq!(lifecycle.state(), LinkState::Loaded);
        assert_eq!(lifecycle.library_path(), Path::new(DEFAULT_LIBRARY));

        lifecycle.startup("x360").unwrap();
        lifecycle.shutdown().unwrap();
        assert_no_leaks(lifecycle.driver().unwrap());
    }

    #[test]
    fn test_drop_while_active_shuts_down() {
        let events = Rc::new(RefCell::new(Vec::new()));
        {
            let mut lifecycle = Lifecycle::with_driver(MockDriver::new());
            let sink = events.clone();
            lifecycle.subscribe(move |e| sink.borrow_mut().push(e));
            lifecycle.startup("x360").unwrap();
        }
        assert_eq!(*events.borrow(), vec![PadEvent::Activated, PadEvent::Deactivated]);
    }
}
