//! Keyboard-driven virtual gamepad on top of the ViGEm bus driver
//!
//! - [`driver`]: binding to the ViGEm client module (and a mock of it)
//! - [`lifecycle`]: Unbound → Loaded → Active state machine
//! - [`pad`]: report accumulator, operation dispatch and key resolution
//! - [`keymap`]: persisted operation → key mapping
//!
//! ```no_run
//! use vigem_keypad::{driver::DriverLibrary, Key, VirtualPad};
//!
//! let mut pad: VirtualPad<DriverLibrary> = VirtualPad::new();
//! pad.load(None)?;
//! pad.startup("x360")?;
//! pad.press_key(Key::char('a'))?;
//! pad.release_key(Key::char('a'))?;
//! pad.shutdown()?;
//! # Ok::<(), vigem_keypad::PadError>(())
//! ```

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod driver;
pub mod error;
pub mod keymap;
pub mod keys;
pub mod lifecycle;
pub mod operation;
pub mod pad;
pub mod paths;
pub mod report;

pub use error::{PadError, Result};
pub use keymap::KeyMap;
pub use keys::Key;
pub use lifecycle::{LinkState, PadEvent};
pub use operation::Operation;
pub use pad::VirtualPad;
pub use report::{Buttons, GamepadReport};
