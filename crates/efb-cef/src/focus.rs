//! Keyboard focus arbitration between the host and the browser.
//!
//! Exactly one side owns keyboard input. Transitions are emitted as ordered
//! [`FocusAction`] lists so that the host claim is taken before the engine is
//! focused, and the engine is unfocused before the host claim is released.
//! Executed in order, no step leaves the engine focused without the host
//! claim that routes keys to it.

use crate::engine::TextInputMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusState {
    #[default]
    HostFocus,
    BrowserFocus,
}

/// One step of a focus transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusAction {
    /// Ask the host window manager for keyboard focus.
    ClaimHostFocus,
    /// Raise the panel window.
    BringToFront,
    /// Engine `SetFocus`.
    EngineFocus(bool),
    /// Run the blur script on the active DOM element.
    BlurActiveElement,
    /// Give keyboard focus back to the host.
    ReleaseHostFocus,
}

const TO_BROWSER: [FocusAction; 3] = [
    FocusAction::ClaimHostFocus,
    FocusAction::BringToFront,
    FocusAction::EngineFocus(true),
];

const TO_HOST: [FocusAction; 3] = [
    FocusAction::EngineFocus(false),
    FocusAction::BlurActiveElement,
    FocusAction::ReleaseHostFocus,
];

#[derive(Debug, Clone, Default)]
pub struct FocusArbiter {
    state: FocusState,
    wants_keyboard: bool,
}

impl FocusArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> FocusState {
        self.state
    }

    pub fn has_input_focus(&self) -> bool {
        self.state == FocusState::BrowserFocus
    }

    /// Whether the page last asked for a keyboard.
    pub fn wants_virtual_keyboard(&self) -> bool {
        self.wants_keyboard
    }

    /// The engine reported a (non-)text element gaining focus.
    pub fn virtual_keyboard_requested(&mut self, mode: TextInputMode) -> Vec<FocusAction> {
        self.wants_keyboard = mode.wants_keyboard();
        if self.wants_keyboard {
            self.enter_browser()
        } else {
            self.enter_host()
        }
    }

    /// The host took keyboard focus away, e.g. a click outside the band.
    pub fn host_focus_lost(&mut self) -> Vec<FocusAction> {
        self.wants_keyboard = false;
        self.enter_host()
    }

    /// Explicit focus request from the host.
    pub fn set_focus(&mut self, focus: bool) -> Vec<FocusAction> {
        if focus {
            self.enter_browser()
        } else {
            self.wants_keyboard = false;
            self.enter_host()
        }
    }

    /// Compare with the host's own view of the keyboard claim, once per frame.
    pub fn reconcile(&mut self, host_has_claim: bool) -> Vec<FocusAction> {
        if self.state == FocusState::BrowserFocus && !host_has_claim {
            log::debug!("host dropped the keyboard claim, returning focus to host");
            return self.host_focus_lost();
        }
        Vec::new()
    }

    /// Drop back to the initial state without emitting actions, for teardown.
    pub fn reset(&mut self) {
        self.state = FocusState::HostFocus;
        self.wants_keyboard = false;
    }

    fn enter_browser(&mut self) -> Vec<FocusAction> {
        if self.state == FocusState::BrowserFocus {
            return Vec::new();
        }
        self.state = FocusState::BrowserFocus;
        TO_BROWSER.to_vec()
    }

    fn enter_host(&mut self) -> Vec<FocusAction> {
        if self.state == FocusState::HostFocus {
            return Vec::new();
        }
        self.state = FocusState::HostFocus;
        TO_HOST.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// What the engine and the host believe after executing actions.
    #[derive(Default)]
    struct Sides {
        engine_focused: bool,
        host_claimed: bool,
    }

    impl Sides {
        fn apply(&mut self, action: FocusAction) {
            match action {
                FocusAction::ClaimHostFocus => self.host_claimed = true,
                FocusAction::ReleaseHostFocus => self.host_claimed = false,
                FocusAction::EngineFocus(focus) => self.engine_focused = focus,
                FocusAction::BringToFront | FocusAction::BlurActiveElement => {}
            }
        }

        fn input_deliverable(&self) -> bool {
            !(self.engine_focused && !self.host_claimed)
        }
    }

    #[derive(Debug, Clone)]
    enum Input {
        Keyboard(TextInputMode),
        HostLost,
        SetFocus(bool),
    }

    fn input() -> impl Strategy<Value = Input> {
        prop_oneof![
            Just(Input::Keyboard(TextInputMode::Text)),
            Just(Input::Keyboard(TextInputMode::Numeric)),
            Just(Input::Keyboard(TextInputMode::None)),
            Just(Input::HostLost),
            any::<bool>().prop_map(Input::SetFocus),
        ]
    }

    #[test]
    fn keyboard_request_moves_focus_to_browser() {
        let mut arbiter = FocusArbiter::new();
        let actions = arbiter.virtual_keyboard_requested(TextInputMode::Text);
        assert_eq!(actions, TO_BROWSER.to_vec());
        assert!(arbiter.has_input_focus());
        assert!(arbiter.wants_virtual_keyboard());

        // Repeated requests are idempotent.
        assert!(arbiter.virtual_keyboard_requested(TextInputMode::Text).is_empty());
    }

    #[test]
    fn none_mode_returns_focus_with_blur() {
        let mut arbiter = FocusArbiter::new();
        arbiter.virtual_keyboard_requested(TextInputMode::Text);
        let actions = arbiter.virtual_keyboard_requested(TextInputMode::None);
        assert_eq!(
            actions,
            vec![
                FocusAction::EngineFocus(false),
                FocusAction::BlurActiveElement,
                FocusAction::ReleaseHostFocus,
            ]
        );
        assert_eq!(arbiter.state(), FocusState::HostFocus);
    }

    #[test]
    fn reconcile_only_acts_on_lost_claim() {
        let mut arbiter = FocusArbiter::new();
        assert!(arbiter.reconcile(false).is_empty());

        arbiter.set_focus(true);
        assert!(arbiter.reconcile(true).is_empty());
        assert_eq!(arbiter.reconcile(false), TO_HOST.to_vec());
        assert!(!arbiter.has_input_focus());
    }

    proptest! {
        #[test]
        fn never_focused_without_host_claim(inputs in proptest::collection::vec(input(), 0..40)) {
            let mut arbiter = FocusArbiter::new();
            let mut sides = Sides::default();

            for input in inputs {
                let actions = match input {
                    Input::Keyboard(mode) => arbiter.virtual_keyboard_requested(mode),
                    Input::HostLost => arbiter.host_focus_lost(),
                    Input::SetFocus(focus) => arbiter.set_focus(focus),
                };
                for action in actions {
                    sides.apply(action);
                    prop_assert!(sides.input_deliverable());
                }
                prop_assert_eq!(sides.engine_focused, arbiter.has_input_focus());
                prop_assert_eq!(sides.host_claimed, arbiter.has_input_focus());
            }
        }
    }
}
