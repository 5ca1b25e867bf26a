//! Operation → report mutation table
//!
//! Each physical operation owns a pair of pure functions over the
//! [`GamepadReport`]: one for press, one for release. Meta-operations and
//! `Invalid` have no entry; the pad handles them separately.
//!
//! Half-axis directions share a stick axis. Press only deflects a centred
//! axis, and release only recentres an axis deflected in its own direction,
//! so releasing one direction never cancels a different held direction.

use crate::operation::Operation;
use crate::report::{Axis, Buttons, GamepadReport, Trigger, AXIS_EXTREME, TRIGGER_MAX};

/// A pure state mutation
pub type Mutation = fn(&mut GamepadReport);

/// Press and release mutations for one operation
#[derive(Clone, Copy)]
pub struct Action {
    pub press: Mutation,
    pub release: Mutation,
}

impl Action {
    pub fn get(self, pressed: bool) -> Mutation {
        if pressed {
            self.press
        } else {
            self.release
        }
    }
}

fn hold(report: &mut GamepadReport, button: Buttons) {
    report.buttons.insert(button);
}

fn let_go(report: &mut GamepadReport, button: Buttons) {
    report.buttons.remove(button);
}

fn deflect(report: &mut GamepadReport, axis: Axis, value: i16) {
    let v = report.axis_mut(axis);
    if *v == 0 {
        *v = value;
    }
}

fn recentre_from_negative(report: &mut GamepadReport, axis: Axis) {
    let v = report.axis_mut(axis);
    if *v < 0 {
        *v = v.saturating_add(AXIS_EXTREME);
    }
}

fn recentre_from_positive(report: &mut GamepadReport, axis: Axis) {
    let v = report.axis_mut(axis);
    if *v > 0 {
        *v = v.saturating_sub(AXIS_EXTREME);
    }
}

macro_rules! button {
    ($op:expr, $bit:expr) => {
        (
            $op,
            Action {
                press: |r| hold(r, $bit),
                release: |r| let_go(r, $bit),
            },
        )
    };
}

macro_rules! trigger {
    ($op:expr, $side:expr) => {
        (
            $op,
            Action {
                press: |r| *r.trigger_mut($side) = TRIGGER_MAX,
                release: |r| *r.trigger_mut($side) = 0,
            },
        )
    };
}

macro_rules! negative {
    ($op:expr, $axis:expr) => {
        (
            $op,
            Action {
                press: |r| deflect(r, $axis, -AXIS_EXTREME),
                release: |r| recentre_from_negative(r, $axis),
            },
        )
    };
}

macro_rules! positive {
    ($op:expr, $axis:expr) => {
        (
            $op,
            Action {
                press: |r| deflect(r, $axis, AXIS_EXTREME),
                release: |r| recentre_from_positive(r, $axis),
            },
        )
    };
}

/// Dispatch table, indexed by operation discriminant
pub const ACTIONS: [(Operation, Action); 24] = [
    button!(Operation::ButtonA, Buttons::A),
    button!(Operation::ButtonB, Buttons::B),
    button!(Operation::ButtonX, Buttons::X),
    button!(Operation::ButtonY, Buttons::Y),
    button!(Operation::DpadLeft, Buttons::DPAD_LEFT),
    button!(Operation::DpadRight, Buttons::DPAD_RIGHT),
    button!(Operation::DpadUp, Buttons::DPAD_UP),
    button!(Operation::DpadDown, Buttons::DPAD_DOWN),
    button!(Operation::Start, Buttons::START),
    button!(Operation::Back, Buttons::BACK),
    button!(Operation::LeftThumb, Buttons::LEFT_THUMB),
    button!(Operation::RightThumb, Buttons::RIGHT_THUMB),
    button!(Operation::LeftShoulder, Buttons::LEFT_SHOULDER),
    // Right shoulder keeps the legacy behaviour: press and release both
    // clear the left-shoulder bit and the right-shoulder bit is never set.
    // TODO: confirm intended semantics, then hold/let go Buttons::RIGHT_SHOULDER.
    (
        Operation::RightShoulder,
        Action {
            press: |r| let_go(r, Buttons::LEFT_SHOULDER),
            release: |r| let_go(r, Buttons::LEFT_SHOULDER),
        },
    ),
    trigger!(Operation::LeftTrigger, Trigger::Left),
    trigger!(Operation::RightTrigger, Trigger::Right),
    negative!(Operation::LeftThumbLeft, Axis::LeftX),
    positive!(Operation::LeftThumbRight, Axis::LeftX),
    positive!(Operation::LeftThumbUp, Axis::LeftY),
    negative!(Operation::LeftThumbDown, Axis::LeftY),
    negative!(Operation::RightThumbLeft, Axis::RightX),
    positive!(Operation::RightThumbRight, Axis::RightX),
    positive!(Operation::RightThumbUp, Axis::RightY),
    negative!(Operation::RightThumbDown, Axis::RightY),
];

/// Mutations for a physical operation; `None` for meta-operations and `Invalid`
pub fn action(op: Operation) -> Option<Action> {
    if !op.is_physical() {
        return None;
    }
    ACTIONS.get(op as usize).map(|(_, action)| *action)
}

/// Apply press or release of `op` to `report`; returns whether anything ran
pub fn apply(report: &mut GamepadReport, op: Operation, pressed: bool) -> bool {
    match action(op) {
        Some(action) => {
            (action.get(pressed))(report);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const DIGITAL: [(Operation, Buttons); 13] = [
        (Operation::ButtonA, Buttons::A),
        (Operation::ButtonB, Buttons::B),
        (Operation::ButtonX, Buttons::X),
        (Operation::ButtonY, Buttons::Y),
        (Operation::DpadLeft, Buttons::DPAD_LEFT),
        (Operation::DpadRight, Buttons::DPAD_RIGHT),
        (Operation::DpadUp, Buttons::DPAD_UP),
        (Operation::DpadDown, Buttons::DPAD_DOWN),
        (Operation::Start, Buttons::START),
        (Operation::Back, Buttons::BACK),
        (Operation::LeftThumb, Buttons::LEFT_THUMB),
        (Operation::RightThumb, Buttons::RIGHT_THUMB),
        (Operation::LeftShoulder, Buttons::LEFT_SHOULDER),
    ];

    const HALF_AXES: [(Operation, Axis, i16); 8] = [
        (Operation::LeftThumbLeft, Axis::LeftX, -AXIS_EXTREME),
        (Operation::LeftThumbRight, Axis::LeftX, AXIS_EXTREME),
        (Operation::LeftThumbUp, Axis::LeftY, AXIS_EXTREME),
        (Operation::LeftThumbDown, Axis::LeftY, -AXIS_EXTREME),
        (Operation::RightThumbLeft, Axis::RightX, -AXIS_EXTREME),
        (Operation::RightThumbRight, Axis::RightX, AXIS_EXTREME),
        (Operation::RightThumbUp, Axis::RightY, AXIS_EXTREME),
        (Operation::RightThumbDown, Axis::RightY, -AXIS_EXTREME),
    ];

    #[test]
    fn test_table_is_indexed_by_discriminant() {
        for (idx, (op, _)) in ACTIONS.iter().enumerate() {
            assert_eq!(*op as usize, idx, "{op:?}");
        }
    }

    #[test]
    fn test_meta_and_invalid_have_no_action() {
        let mut report = GamepadReport::neutral();
        for op in [Operation::Connect, Operation::Disconnect, Operation::Invalid] {
            assert!(action(op).is_none());
            assert!(!apply(&mut report, op, true));
        }
        assert_eq!(report, GamepadReport::neutral());
    }

    #[test]
    fn test_digital_press_release() {
        for (op, bit) in DIGITAL {
            let mut report = GamepadReport::neutral();
            apply(&mut report, op, true);
            assert!(report.buttons.contains(bit), "{op:?}");
            apply(&mut report, op, true);
            assert_eq!(report.buttons, bit, "{op:?} press is idempotent");
            apply(&mut report, op, false);
            assert!(report.buttons.is_empty(), "{op:?}");
        }
    }

    #[test]
    fn test_triggers_are_full_scale() {
        let mut report = GamepadReport::neutral();
        apply(&mut report, Operation::LeftTrigger, true);
        apply(&mut report, Operation::RightTrigger, true);
        assert_eq!((report.left_trigger, report.right_trigger), (255, 255));

        apply(&mut report, Operation::LeftTrigger, false);
        assert_eq!((report.left_trigger, report.right_trigger), (0, 255));
    }

    #[test]
    fn test_half_axis_press_and_release() {
        for (op, axis, value) in HALF_AXES {
            let mut report = GamepadReport::neutral();
            apply(&mut report, op, true);
            assert_eq!(report.axis(axis), value, "{op:?}");
            apply(&mut report, op, false);
            assert_eq!(report.axis(axis), 0, "{op:?}");
        }
    }

    #[test]
    fn test_opposite_direction_release_keeps_held_direction() {
        let mut report = GamepadReport::neutral();
        apply(&mut report, Operation::LeftThumbLeft, true);
        apply(&mut report, Operation::LeftThumbRight, true);
        assert_eq!(report.thumb_lx, -AXIS_EXTREME);

        apply(&mut report, Operation::LeftThumbRight, false);
        assert_eq!(report.thumb_lx, -AXIS_EXTREME);

        apply(&mut report, Operation::LeftThumbLeft, false);
        assert_eq!(report.thumb_lx, 0);
    }

    #[test]
    fn test_right_shoulder_legacy_behaviour() {
        let mut report = GamepadReport::neutral();
        apply(&mut report, Operation::LeftShoulder, true);
        apply(&mut report, Operation::RightShoulder, true);
        assert!(!report.buttons.contains(Buttons::RIGHT_SHOULDER));
        assert!(!report.buttons.contains(Buttons::LEFT_SHOULDER));

        apply(&mut report, Operation::LeftShoulder, true);
        apply(&mut report, Operation::RightShoulder, false);
        assert!(report.buttons.is_empty());
    }

    fn any_report() -> impl Strategy<Value = GamepadReport> {
        (any::<u16>(), any::<u8>(), any::<u8>(), any::<[i16; 4]>()).prop_map(
            |(buttons, lt, rt, [lx, ly, rx, ry])| GamepadReport {
                buttons: Buttons::from_bits_retain(buttons),
                left_trigger: lt,
                right_trigger: rt,
                thumb_lx: lx,
                thumb_ly: ly,
                thumb_rx: rx,
                thumb_ry: ry,
            },
        )
    }

    proptest! {
        #[test]
        fn prop_press_release_restores_unheld_button(start in any_report(), idx in 0usize..13) {
            let (op, bit) = DIGITAL[idx];
            let mut report = start;
            report.buttons.remove(bit);
            let before = report;

            apply(&mut report, op, true);
            apply(&mut report, op, false);
            prop_assert_eq!(report, before);
        }

        #[test]
        fn prop_release_before_press_is_noop(start in any_report(), idx in 0usize..13) {
            let (op, bit) = DIGITAL[idx];
            let mut report = start;
            report.buttons.remove(bit);
            let before = report;

            apply(&mut report, op, false);
            prop_assert_eq!(report, before);
        }

        #[test]
        fn prop_press_on_deflected_axis_is_noop(start in any_report(), idx in 0usize..8) {
            let (op, axis, _) = HALF_AXES[idx];
            prop_assume!(start.axis(axis) != 0);
            let mut report = start;

            apply(&mut report, op, true);
            prop_assert_eq!(report, start);
        }

        #[test]
        fn prop_inconsistent_release_is_noop(start in any_report(), idx in 0usize..8) {
            let (op, axis, value) = HALF_AXES[idx];
            // Axis centred or deflected the other way
            prop_assume!(start.axis(axis) == 0 || start.axis(axis).signum() != value.signum());
            let mut report = start;

            apply(&mut report, op, false);
            prop_assert_eq!(report, start);
        }
    }
}
