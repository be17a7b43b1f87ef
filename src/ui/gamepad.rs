/// Gamepad input using gilrs.
///
/// Every move in the maze is one discrete step, so the pad only produces
/// edge-triggered [`Action`]s: a D-pad press or the left stick crossing the
/// deadzone is one move, a configured button press is one confirm/cancel.
///
/// Button mapping comes from `[gamepad]` in config.toml. Defaults:
///   D-pad / Left Stick    →  Move (menus: up/down)
///   South (A) / Start     →  Select
///   East (B) / Select     →  Back / Pause
///
/// Built without the `gamepad` feature, [`GamepadInput::poll`] never
/// returns anything.

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use conmaze::config::GamepadConfig;
#[cfg(feature = "gamepad")]
use conmaze::domain::entity::MoveDir;

use super::input::Action;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.5;

/// Logical face/shoulder buttons that can be bound in config.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    South,
    East,
    West,
    North,
    L1,
    R1,
    Start,
    Select,
}

impl Btn {
    pub fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH" => Some(Btn::South),
            "B" | "EAST" => Some(Btn::East),
            "X" | "WEST" => Some(Btn::West),
            "Y" | "NORTH" => Some(Btn::North),
            "L1" | "LB" | "LEFTTRIGGER" => Some(Btn::L1),
            "R1" | "RB" | "RIGHTTRIGGER" => Some(Btn::R1),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South => Some(Btn::South),
            Button::East => Some(Btn::East),
            Button::West => Some(Btn::West),
            Button::North => Some(Btn::North),
            Button::LeftTrigger => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::Start => Some(Btn::Start),
            Button::Select => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Which buttons select and which go back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ButtonMap {
    pub confirm: Vec<Btn>,
    pub cancel: Vec<Btn>,
}

impl Default for ButtonMap {
    fn default() -> Self {
        ButtonMap {
            confirm: vec![Btn::South, Btn::Start],
            cancel: vec![Btn::East, Btn::Select],
        }
    }
}

impl ButtonMap {
    /// Unknown names are logged and dropped; an empty list keeps the default.
    pub fn from_config(cfg: &GamepadConfig) -> Self {
        fn parse_list(names: &[String]) -> Vec<Btn> {
            names
                .iter()
                .filter_map(|s| {
                    let b = Btn::from_name(s);
                    if b.is_none() {
                        log::warn!("Unknown gamepad button {:?} in config", s);
                    }
                    b
                })
                .collect()
        }
        let mut map = ButtonMap::default();
        let cf = parse_list(&cfg.confirm);
        if !cf.is_empty() { map.confirm = cf; }
        let ca = parse_list(&cfg.cancel);
        if !ca.is_empty() { map.cancel = ca; }
        map
    }

    pub fn action_for(&self, btn: Btn) -> Option<Action> {
        if self.confirm.contains(&btn) {
            Some(Action::Select)
        } else if self.cancel.contains(&btn) {
            Some(Action::Back)
        } else {
            None
        }
    }
}

pub struct GamepadInput {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,
    map: ButtonMap,
    /// Stick direction currently past the deadzone, so holding it counts once.
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    stick: Option<(i8, i8)>,
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    stick_x: f32,
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    stick_y: f32,
}

impl GamepadInput {
    pub fn new(cfg: &GamepadConfig) -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = match Gilrs::new() {
            Ok(g) => {
                let has_pad = g.gamepads().next().is_some();
                (Some(g), has_pad)
            }
            Err(e) => {
                log::warn!("Gamepad support unavailable: {}", e);
                (None, false)
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        if connected {
            log::info!("Gamepad connected");
        }

        GamepadInput {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            map: ButtonMap::from_config(cfg),
            stick: None,
            stick_x: 0.0,
            stick_y: 0.0,
        }
    }

    /// Drain pending pad events into actions, oldest first.
    pub fn poll(&mut self) -> Vec<Action> {
        #[cfg(feature = "gamepad")]
        {
            self.poll_gilrs()
        }
        #[cfg(not(feature = "gamepad"))]
        {
            Vec::new()
        }
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) -> Vec<Action> {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return vec![],
        };
        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        let mut actions = vec![];
        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    let action = match btn {
                        Button::DPadUp => Some(Action::Move(MoveDir::Up)),
                        Button::DPadDown => Some(Action::Move(MoveDir::Down)),
                        Button::DPadLeft => Some(Action::Move(MoveDir::Left)),
                        Button::DPadRight => Some(Action::Move(MoveDir::Right)),
                        other => Btn::from_gilrs(other).and_then(|b| self.map.action_for(b)),
                    };
                    actions.extend(action);
                }
                EventType::AxisChanged(axis, value, _) => {
                    match axis {
                        Axis::LeftStickX => self.stick_x = value,
                        Axis::LeftStickY => self.stick_y = value,
                        _ => continue,
                    }
                    actions.extend(self.stick_edge());
                }
                EventType::Connected => {
                    log::info!("Gamepad connected");
                }
                EventType::Disconnected => {
                    self.stick = None;
                    self.stick_x = 0.0;
                    self.stick_y = 0.0;
                    log::info!("Gamepad disconnected");
                }
                _ => {}
            }
        }
        actions
    }

    /// A move when the stick newly leaves the deadzone in some direction.
    #[cfg(feature = "gamepad")]
    fn stick_edge(&mut self) -> Option<Action> {
        let dir = if self.stick_x < -STICK_DEADZONE {
            Some((0, -1))
        } else if self.stick_x > STICK_DEADZONE {
            Some((0, 1))
        } else if self.stick_y > STICK_DEADZONE {
            Some((-1, 0))
        } else if self.stick_y < -STICK_DEADZONE {
            Some((1, 0))
        } else {
            None
        };
        if dir == self.stick {
            return None;
        }
        self.stick = dir;
        let mv = match dir? {
            (-1, 0) => MoveDir::Up,
            (1, 0) => MoveDir::Down,
            (0, -1) => MoveDir::Left,
            _ => MoveDir::Right,
        };
        Some(Action::Move(mv))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_case_insensitive_with_aliases() {
        assert_eq!(Btn::from_name("a"), Some(Btn::South));
        assert_eq!(Btn::from_name("East"), Some(Btn::East));
        assert_eq!(Btn::from_name("back"), Some(Btn::Select));
        assert_eq!(Btn::from_name("turbo"), None);
    }

    #[test]
    fn config_overrides_defaults() {
        let cfg = GamepadConfig {
            confirm: vec!["North".into()],
            cancel: vec!["nonsense".into()],
        };
        let map = ButtonMap::from_config(&cfg);
        assert_eq!(map.confirm, vec![Btn::North]);
        assert_eq!(map.cancel, ButtonMap::default().cancel);
        assert_eq!(map.action_for(Btn::North), Some(Action::Select));
        assert_eq!(map.action_for(Btn::East), Some(Action::Back));
        assert_eq!(map.action_for(Btn::South), None);
    }
}
