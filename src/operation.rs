//! Abstract controller operations
//!
//! An [`Operation`] names a controller action independently of the physical
//! key that triggers it. The string vocabulary returned by
//! [`Operation::name`] is what the key-map file stores, so it must stay
//! stable.

use std::fmt;
use std::str::FromStr;

/// Controller operation
///
/// Discriminants follow the persisted ordering: 24 physical-input operations,
/// then the two meta-operations, then [`Operation::Invalid`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
    ButtonA = 0,
    ButtonB,
    ButtonX,
    ButtonY,
    DpadLeft,
    DpadRight,
    DpadUp,
    DpadDown,
    Start,
    Back,
    LeftThumb,
    RightThumb,
    LeftShoulder,
    RightShoulder,
    LeftTrigger,
    RightTrigger,
    LeftThumbLeft,
    LeftThumbRight,
    LeftThumbUp,
    LeftThumbDown,
    RightThumbLeft,
    RightThumbRight,
    RightThumbUp,
    RightThumbDown,

    /// Bring the virtual controller up with the default profile
    Connect,
    /// Tear the virtual controller down
    Disconnect,

    /// "No such mapping"
    Invalid,
}

impl Operation {
    /// Every operation except [`Operation::Invalid`], in persisted order
    pub const ALL: [Operation; 26] = [
        Operation::ButtonA,
        Operation::ButtonB,
        Operation::ButtonX,
        Operation::ButtonY,
        Operation::DpadLeft,
        Operation::DpadRight,
        Operation::DpadUp,
        Operation::DpadDown,
        Operation::Start,
        Operation::Back,
        Operation::LeftThumb,
        Operation::RightThumb,
        Operation::LeftShoulder,
        Operation::RightShoulder,
        Operation::LeftTrigger,
        Operation::RightTrigger,
        Operation::LeftThumbLeft,
        Operation::LeftThumbRight,
        Operation::LeftThumbUp,
        Operation::LeftThumbDown,
        Operation::RightThumbLeft,
        Operation::RightThumbRight,
        Operation::RightThumbUp,
        Operation::RightThumbDown,
        Operation::Connect,
        Operation::Disconnect,
    ];

    /// Persisted name
    pub fn name(self) -> &'static str {
        match self {
            Operation::ButtonA => "buttonA",
            Operation::ButtonB => "buttonB",
            Operation::ButtonX => "buttonX",
            Operation::ButtonY => "buttonY",
            Operation::DpadLeft => "buttonLeft",
            Operation::DpadRight => "buttonRight",
            Operation::DpadUp => "buttonUp",
            Operation::DpadDown => "buttonDown",
            Operation::Start => "buttonStart",
            Operation::Back => "buttonBack",
            Operation::LeftThumb => "buttonLThumb",
            Operation::RightThumb => "buttonRThumb",
            Operation::LeftShoulder => "buttonLShoulder",
            Operation::RightShoulder => "buttonRShoulder",
            Operation::LeftTrigger => "buttonLTrigger",
            Operation::RightTrigger => "buttonRTrigger",
            Operation::LeftThumbLeft => "buttonLThumbLeft",
            Operation::LeftThumbRight => "buttonLThumbRight",
            Operation::LeftThumbUp => "buttonLThumbUp",
            Operation::LeftThumbDown => "buttonLThumbDown",
            Operation::RightThumbLeft => "buttonRThumbLeft",
            Operation::RightThumbRight => "buttonRThumbRight",
            Operation::RightThumbUp => "buttonRThumbUp",
            Operation::RightThumbDown => "buttonRThumbDown",
            Operation::Connect => "buttonStartup",
            Operation::Disconnect => "buttonShutdown",
            Operation::Invalid => "",
        }
    }

    /// Look up a persisted name, ignoring case; unknown names yield `Invalid`
    pub fn from_name(name: &str) -> Operation {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.name().eq_ignore_ascii_case(name))
            .unwrap_or(Operation::Invalid)
    }

    /// Connect/Disconnect
    pub fn is_meta(self) -> bool {
        matches!(self, Operation::Connect | Operation::Disconnect)
    }

    /// Anything that mutates the gamepad report
    pub fn is_physical(self) -> bool {
        !self.is_meta() && self != Operation::Invalid
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Invalid => f.write_str("invalid"),
            op => f.write_str(op.name()),
        }
    }
}

impl FromStr for Operation {
    type Err = String;

    /// Accepts persisted names, with or without the `button` prefix
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let op = match Operation::from_name(s) {
            Operation::Invalid => Operation::from_name(&format!("button{}", s)),
            op => op,
        };
        match op {
            Operation::Invalid => Err(format!("Unknown operation: {}", s)),
            op => Ok(op),
        }
    }
}
