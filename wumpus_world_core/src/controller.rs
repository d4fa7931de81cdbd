use std::{collections::VecDeque, error::Error};

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    Coordinate, Direction,
    world::{Action, Percept, Percepts},
};

/// Error surfaced by a controller. The driver passes it on untouched.
pub type ControllerError = Box<dyn Error + Send + Sync>;

/// Trait defining the logic that decides what the agent does next.
///
/// A controller only ever sees percepts; it has no access to the world.
pub trait Controller {
    /// Forgets everything learned so far, ready for a new episode.
    fn reset(&mut self);

    /// Determines the next action from the percepts available this turn.
    fn process(&mut self, percepts: &Percepts) -> Result<Action, ControllerError>;

    /// Lines explaining the most recent [`Controller::process`] call.
    ///
    /// Controllers with nothing to say keep the default.
    fn notes(&self) -> &[String] {
        &[]
    }
}

#[derive(Debug, thiserror::Error)]
#[error("script exhausted after {0} actions")]
pub struct ScriptExhausted(pub usize);

/// Replays a fixed list of actions, ignoring percepts.
#[derive(Debug, Clone)]
pub struct ScriptedController {
    script: Vec<Action>,
    next: usize,
}

impl ScriptedController {
    pub fn new(script: impl Into<Vec<Action>>) -> Self {
        Self {
            script: script.into(),
            next: 0,
        }
    }

    /// Number of actions handed out since the last reset.
    pub fn played(&self) -> usize {
        self.next
    }
}

impl Controller for ScriptedController {
    fn reset(&mut self) {
        self.next = 0;
    }

    fn process(&mut self, _percepts: &Percepts) -> Result<Action, ControllerError> {
        let action = self
            .script
            .get(self.next)
            .copied()
            .ok_or(ScriptExhausted(self.script.len()))?;
        self.next += 1;
        Ok(action)
    }
}

/// A wandering agent driven by a seeded random generator.
///
/// It tracks its own position relative to where it started (walls are
/// detected through BUMP), takes gold when it sees GLITTER, fires its arrow
/// the first time it smells the wumpus, and climbs out once it holds the gold
/// and is back at the start. Danger sensed at the start also sends it home;
/// elsewhere it turns around and steps back.
#[derive(Debug)]
pub struct RandomController {
    seed: u64,
    rng: StdRng,
    offset: Coordinate,
    facing: Direction,
    /// Offset before the last FORWARD, restored if that move bumped.
    pending_move: Option<Coordinate>,
    has_arrow: bool,
    has_gold: bool,
    wumpus_dead: bool,
    plan: VecDeque<Action>,
    notes: Vec<String>,
}

impl RandomController {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
            offset: Coordinate::new(0, 0),
            facing: Direction::North,
            pending_move: None,
            has_arrow: true,
            has_gold: false,
            wumpus_dead: false,
            plan: VecDeque::new(),
            notes: Vec::new(),
        }
    }

    fn note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    fn wander(&mut self) -> Action {
        match self.rng.random_range(0..10) {
            0..=5 => Action::Forward,
            6 | 7 => Action::Right,
            _ => Action::Left,
        }
    }

    /// Records the effect the chosen action has on the controller's own bookkeeping.
    fn track(&mut self, action: Action) -> Action {
        match action {
            Action::Forward => {
                self.pending_move = Some(self.offset);
                self.offset = self.offset.step(self.facing);
            }
            Action::Right => self.facing = self.facing.right(),
            Action::Left => self.facing = self.facing.left(),
            Action::Fire => self.has_arrow = false,
            Action::Take => self.has_gold = true,
            Action::Climb => {}
        }
        action
    }
}

impl Controller for RandomController {
    fn reset(&mut self) {
        *self = RandomController::new(self.seed);
    }

    fn process(&mut self, percepts: &Percepts) -> Result<Action, ControllerError> {
        self.notes.clear();
        if let Some(previous) = self.pending_move.take() {
            if percepts.contains(&Percept::Bump) {
                self.offset = previous;
                self.plan.clear();
                self.note("bumped into a wall, position unchanged");
            }
        }

        if percepts.contains(&Percept::Scream) {
            self.wumpus_dead = true;
            self.note("heard a scream, wumpus is dead");
        }

        if let Some(action) = self.plan.pop_front() {
            self.note(format!("following plan, {action}"));
            return Ok(self.track(action));
        }

        let at_start = self.offset == Coordinate::new(0, 0);
        let danger = if percepts.contains(&Percept::Breeze) {
            Some("breeze")
        } else if percepts.contains(&Percept::Stench) && !self.wumpus_dead {
            Some("stench")
        } else {
            None
        };

        let action = if percepts.contains(&Percept::Glitter) && !self.has_gold {
            self.note("glitter, taking the gold");
            Action::Take
        } else if self.has_gold && at_start {
            self.note("holding the gold at the start, climbing out");
            Action::Climb
        } else if percepts.contains(&Percept::Stench) && self.has_arrow {
            self.note("stench, firing");
            Action::Fire
        } else if let Some(sensed) = danger {
            if at_start {
                self.note(format!("{sensed} at the start, climbing out"));
                Action::Climb
            } else {
                self.note(format!("{sensed}, turning back"));
                self.plan.extend([Action::Right, Action::Forward]);
                Action::Right
            }
        } else {
            let action = self.wander();
            self.note(format!("nothing to act on, wandering {action}"));
            action
        };
        self.note(format!("offset {} facing {}", self.offset, self.facing));
        Ok(self.track(action))
    }

    fn notes(&self) -> &[String] {
        &self.notes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn percepts(list: &[Percept]) -> Percepts {
        list.iter().copied().collect()
    }

    #[test]
    fn scripted_controller_replays_then_errors() {
        let mut controller = ScriptedController::new([Action::Take, Action::Climb]);
        let none = Percepts::new();
        assert_eq!(controller.process(&none).unwrap(), Action::Take);
        assert_eq!(controller.process(&none).unwrap(), Action::Climb);
        let err = controller.process(&none).unwrap_err();
        assert_eq!(err.to_string(), "script exhausted after 2 actions");

        controller.reset();
        assert_eq!(controller.played(), 0);
        assert_eq!(controller.process(&none).unwrap(), Action::Take);
    }

    #[test]
    fn random_controller_takes_glitter_and_climbs_at_start() {
        let mut controller = RandomController::new(1);
        let action = controller.process(&percepts(&[Percept::Glitter])).unwrap();
        assert_eq!(action, Action::Take);
        let action = controller.process(&Percepts::new()).unwrap();
        assert_eq!(action, Action::Climb);
    }

    #[test]
    fn random_controller_fires_once_on_stench() {
        let mut controller = RandomController::new(3);
        let stench = percepts(&[Percept::Stench]);
        assert_eq!(controller.process(&stench).unwrap(), Action::Fire);
        assert_eq!(controller.notes()[0], "stench, firing");
        // arrow spent and still at the start: leave
        assert_eq!(controller.process(&stench).unwrap(), Action::Climb);
        assert_eq!(controller.notes()[0], "stench at the start, climbing out");
    }

    #[test]
    fn notes_explain_only_the_latest_choice() {
        let mut controller = RandomController::new(8);
        controller.track(Action::Forward);
        let action = controller
            .process(&percepts(&[Percept::Breeze, Percept::Bump]))
            .unwrap();
        assert_eq!(action, Action::Climb);
        assert_eq!(
            controller.notes(),
            [
                "bumped into a wall, position unchanged",
                "breeze at the start, climbing out",
                "offset 0,0 facing NORTH",
            ]
        );

        controller.reset();
        assert!(controller.notes().is_empty());
        controller.process(&Percepts::new()).unwrap();
        assert_eq!(controller.notes().len(), 2);
        assert!(controller.notes()[0].starts_with("nothing to act on, wandering "));
    }

    #[test]
    fn scripted_controller_has_no_notes() {
        let mut controller = ScriptedController::new([Action::Climb]);
        controller.process(&Percepts::new()).unwrap();
        assert!(controller.notes().is_empty());
    }

    #[test]
    fn stench_after_scream_is_ignored() {
        let mut controller = RandomController::new(5);
        controller.track(Action::Forward);
        controller.track(Action::Fire);
        let action = controller
            .process(&percepts(&[Percept::Stench, Percept::Scream]))
            .unwrap();
        assert!(matches!(
            action,
            Action::Forward | Action::Left | Action::Right
        ));
        assert!(controller.wumpus_dead);
    }

    #[test]
    fn bump_undoes_dead_reckoning() {
        let mut controller = RandomController::new(0);
        controller.track(Action::Forward);
        assert_eq!(controller.offset, Coordinate::new(0, -1));
        controller.has_gold = true;
        // the forward bumped, so the controller is still at its start
        let action = controller.process(&percepts(&[Percept::Bump])).unwrap();
        assert_eq!(action, Action::Climb);
    }

    #[test]
    fn reset_replays_same_choices() {
        let mut controller = RandomController::new(11);
        let none = Percepts::new();
        let first: Vec<Action> = (0..20).map(|_| controller.process(&none).unwrap()).collect();
        controller.reset();
        let second: Vec<Action> = (0..20).map(|_| controller.process(&none).unwrap()).collect();
        assert_eq!(first, second);
    }
}
