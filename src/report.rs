//! Gamepad state block sent to the driver on every update
//!
//! The layout mirrors the driver's XUSB report (`XUSB_REPORT`) exactly and is
//! passed by value across the foreign boundary, so field order and widths
//! must not change.

use bitflags::bitflags;

bitflags! {
    /// XUSB button bit positions
    #[repr(transparent)]
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Buttons: u16 {
        const DPAD_UP        = 0x0001;
        const DPAD_DOWN      = 0x0002;
        const DPAD_LEFT      = 0x0004;
        const DPAD_RIGHT     = 0x0008;
        const START          = 0x0010;
        const BACK           = 0x0020;
        const LEFT_THUMB     = 0x0040;
        const RIGHT_THUMB    = 0x0080;
        const LEFT_SHOULDER  = 0x0100;
        const RIGHT_SHOULDER = 0x0200;
        const A              = 0x1000;
        const B              = 0x2000;
        const X              = 0x4000;
        const Y              = 0x8000;
    }
}

/// Full-scale trigger value
pub const TRIGGER_MAX: u8 = u8::MAX;

/// Stick deflection used for a held half-axis direction
pub const AXIS_EXTREME: i16 = 32767;

const _: [(); 12] = [(); std::mem::size_of::<GamepadReport>()];
const _: [(); 2] = [(); std::mem::align_of::<GamepadReport>()];

/// Fixed-layout gamepad report
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GamepadReport {
    pub buttons: Buttons,
    pub left_trigger: u8,
    pub right_trigger: u8,
    pub thumb_lx: i16,
    pub thumb_ly: i16,
    pub thumb_rx: i16,
    pub thumb_ry: i16,
}

/// One of the four stick axes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    LeftX,
    LeftY,
    RightX,
    RightY,
}

/// Trigger side
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Trigger {
    Left,
    Right,
}

impl GamepadReport {
    /// All-zero report: no buttons, triggers released, sticks centred
    pub const fn neutral() -> Self {
        Self {
            buttons: Buttons::empty(),
            left_trigger: 0,
            right_trigger: 0,
            thumb_lx: 0,
            thumb_ly: 0,
            thumb_rx: 0,
            thumb_ry: 0,
        }
    }

    pub fn axis(&self, axis: Axis) -> i16 {
        match axis {
            Axis::LeftX => self.thumb_lx,
            Axis::LeftY => self.thumb_ly,
            Axis::RightX => self.thumb_rx,
            Axis::RightY => self.thumb_ry,
        }
    }

    pub fn axis_mut(&mut self, axis: Axis) -> &mut i16 {
        match axis {
            Axis::LeftX => &mut self.thumb_lx,
            Axis::LeftY => &mut self.thumb_ly,
            Axis::RightX => &mut self.thumb_rx,
            Axis::RightY => &mut self.thumb_ry,
        }
    }

    pub fn trigger(&self, trigger: Trigger) -> u8 {
        match trigger {
            Trigger::Left => self.left_trigger,
            Trigger::Right => self.right_trigger,
        }
    }

    pub fn trigger_mut(&mut self, trigger: Trigger) -> &mut u8 {
        match trigger {
            Trigger::Left => &mut self.left_trigger,
            Trigger::Right => &mut self.right_trigger,
        }
    }

    /// Serialize to the little-endian wire layout the driver reads
    pub fn to_bytes(&self) -> [u8; 12] {
        let mut b = [0u8; 12];
        b[0..2].copy_from_slice(&self.buttons.bits().to_le_bytes());
        b[2] = self.left_trigger;
        b[3] = self.right_trigger;
        b[4..6].copy_from_slice(&self.thumb_lx.to_le_bytes());
        b[6..8].copy_from_slice(&self.thumb_ly.to_le_bytes());
        b[8..10].copy_from_slice(&self.thumb_rx.to_le_bytes());
        b[10..12].copy_from_slice(&self.thumb_ry.to_le_bytes());
        b
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::offset_of;

    #[test]
    fn test_layout_matches_xusb_report() {
        assert_eq!(offset_of!(GamepadReport, buttons), 0);
        assert_eq!(offset_of!(GamepadReport, left_trigger), 2);
        assert_eq!(offset_of!(GamepadReport, right_trigger), 3);
        assert_eq!(offset_of!(GamepadReport, thumb_lx), 4);
        assert_eq!(offset_of!(GamepadReport, thumb_ly), 6);
        assert_eq!(offset_of!(GamepadReport, thumb_rx), 8);
        assert_eq!(offset_of!(GamepadReport, thumb_ry), 10);
    }

    #[test]
    fn test_neutral_report_is_zeroed() {
        assert_eq!(GamepadReport::neutral(), GamepadReport::default());
        assert_eq!(GamepadReport::neutral().to_bytes(), [0u8; 12]);
    }

    #[test]
    fn test_wire_bytes() {
        let report = GamepadReport {
            buttons: Buttons::A | Buttons::DPAD_UP,
            left_trigger: TRIGGER_MAX,
            right_trigger: 0,
            thumb_lx: -AXIS_EXTREME,
            thumb_ly: AXIS_EXTREME,
            thumb_rx: 0,
            thumb_ry: i16::MIN,
        };
        let bytes = report.to_bytes();

        assert_eq!(&bytes[0..2], &0x1001u16.to_le_bytes());
        assert_eq!(bytes[2], 255);
        assert_eq!(bytes[3], 0);
        assert_eq!(&bytes[4..6], &(-32767i16).to_le_bytes());
        assert_eq!(&bytes[6..8], &32767i16.to_le_bytes());
        assert_eq!(&bytes[8..10], &0i16.to_le_bytes());
        assert_eq!(&bytes[10..12], &i16::MIN.to_le_bytes());
    }

    #[test]
    fn test_axis_accessors() {
        let mut report = GamepadReport::neutral();
        *report.axis_mut(Axis::RightY) = 100;
        *report.trigger_mut(Trigger::Left) = 7;

        assert_eq!(report.thumb_ry, 100);
        assert_eq!(report.axis(Axis::RightY), 100);
        assert_eq!(report.trigger(Trigger::Left), 7);
        assert_eq!(report.trigger(Trigger::Right), 0);
    }
}
