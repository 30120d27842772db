/// Slot 0 is the keyboard, the rest are gamepads.
pub const MAX_CONTROLLERS: usize = 5;
pub const KEYBOARD_CONTROLLER: usize = 0;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ButtonState {
    pub half_transition_count: u32,
    pub ended_down: bool,
}

impl ButtonState {
    pub fn process(&mut self, pressed: bool) {
        if self.ended_down != pressed {
            self.ended_down = pressed;
            self.half_transition_count += 1;
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ControllerInput {
    pub is_connected: bool,
    pub is_analog: bool,
    pub stick_average_x: f32,
    pub stick_average_y: f32,

    pub move_up: ButtonState,
    pub move_down: ButtonState,
    pub move_left: ButtonState,
    pub move_right: ButtonState,

    pub action_up: ButtonState,
    pub action_down: ButtonState,
    pub action_left: ButtonState,
    pub action_right: ButtonState,

    pub left_shoulder: ButtonState,
    pub right_shoulder: ButtonState,

    pub back: ButtonState,
    pub start: ButtonState,
}

impl ControllerInput {
    pub fn buttons(&self) -> [&ButtonState; 12] {
        [
            &self.move_up,
            &self.move_down,
            &self.move_left,
            &self.move_right,
            &self.action_up,
            &self.action_down,
            &self.action_left,
            &self.action_right,
            &self.left_shoulder,
            &self.right_shoulder,
            &self.back,
            &self.start,
        ]
    }

    fn buttons_mut(&mut self) -> [&mut ButtonState; 12] {
        [
            &mut self.move_up,
            &mut self.move_down,
            &mut self.move_left,
            &mut self.move_right,
            &mut self.action_up,
            &mut self.action_down,
            &mut self.action_left,
            &mut self.action_right,
            &mut self.left_shoulder,
            &mut self.right_shoulder,
            &mut self.back,
            &mut self.start,
        ]
    }

    fn button_for_key(&mut self, code: KeyCode) -> Option<&mut ButtonState> {
        Some(match code {
            KeyCode::KeyW => &mut self.move_up,
            KeyCode::KeyA => &mut self.move_left,
            KeyCode::KeyS => &mut self.move_down,
            KeyCode::KeyD => &mut self.move_right,
            KeyCode::KeyQ => &mut self.left_shoulder,
            KeyCode::KeyE => &mut self.right_shoulder,
            KeyCode::UpArrow => &mut self.action_up,
            KeyCode::LeftArrow => &mut self.action_left,
            KeyCode::DownArrow => &mut self.action_down,
            KeyCode::RightArrow => &mut self.action_right,
            KeyCode::Escape => &mut self.back,
            KeyCode::Spacebar => &mut self.start,
            _ => return None,
        })
    }

    /// Feeds a keyboard event into the digital buttons. Returns whether the
    /// key is mapped at all.
    pub fn process_key(&mut self, code: KeyCode, pressed: bool) -> bool {
        match self.button_for_key(code) {
            Some(button) => {
                button.process(pressed);
                true
            }
            None => false,
        }
    }

    /// Held state carries over, transition counts start from zero.
    pub fn next_frame(&self) -> Self {
        let mut next = Self {
            is_connected: self.is_connected,
            is_analog: self.is_analog,
            ..Self::default()
        };
        for (new, old) in next.buttons_mut().into_iter().zip(self.buttons()) {
            new.ended_down = old.ended_down;
        }
        next
    }
}

/// One frame's polled input, valid only for that frame.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Input {
    pub controllers: [ControllerInput; MAX_CONTROLLERS],
}

impl Input {
    pub fn controller(&self, index: usize) -> &ControllerInput {
        debug_assert!(index < MAX_CONTROLLERS);
        &self.controllers[index]
    }

    pub fn controller_mut(&mut self, index: usize) -> &mut ControllerInput {
        debug_assert!(index < MAX_CONTROLLERS);
        &mut self.controllers[index]
    }

    pub fn keyboard_mut(&mut self) -> &mut ControllerInput {
        self.controller_mut(KEYBOARD_CONTROLLER)
    }

    pub fn next_frame(&self) -> Self {
        Self {
            controllers: self.controllers.map(|c| c.next_frame()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Unknown,
    KeyA,
    KeyD,
    KeyE,
    KeyQ,
    KeyS,
    KeyW,
    UpArrow,
    DownArrow,
    LeftArrow,
    RightArrow,
    Escape,
    Spacebar,
    Return,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_only_count_changes() {
        let mut button = ButtonState::default();
        button.process(true);
        button.process(true);
        button.process(false);
        assert_eq!(button.half_transition_count, 2);
        assert!(!button.ended_down);
    }

    #[test]
    fn keyboard_maps_to_digital_buttons() {
        let mut keyboard = ControllerInput::default();
        assert!(keyboard.process_key(KeyCode::KeyA, true));
        assert!(keyboard.process_key(KeyCode::KeyD, true));
        assert!(keyboard.process_key(KeyCode::DownArrow, true));
        assert!(!keyboard.process_key(KeyCode::Return, true));

        assert!(keyboard.move_left.ended_down);
        assert!(keyboard.move_right.ended_down);
        assert!(keyboard.action_down.ended_down);
        assert!(!keyboard.move_up.ended_down);
    }

    #[test]
    fn next_frame_keeps_held_buttons() {
        let mut input = Input::default();
        {
            let keyboard = input.keyboard_mut();
            keyboard.is_connected = true;
            keyboard.process_key(KeyCode::KeyD, true);
            keyboard.process_key(KeyCode::Spacebar, true);
            keyboard.process_key(KeyCode::Spacebar, false);
        }

        let next = input.next_frame();
        let keyboard = next.controller(KEYBOARD_CONTROLLER);
        assert!(keyboard.is_connected);
        assert!(keyboard.move_right.ended_down);
        assert_eq!(keyboard.move_right.half_transition_count, 0);
        assert!(!keyboard.start.ended_down);
        assert_eq!(keyboard.start.half_transition_count, 0);
    }
}
