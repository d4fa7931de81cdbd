use serde::{Deserialize, Serialize};

use crate::{Coordinate, Direction};

/// Life-cycle of the agent within an episode.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, strum::Display, Serialize, Deserialize,
)]
#[strum(serialize_all = "UPPERCASE")]
pub enum AgentState {
    /// Alive and navigating the maze.
    #[default]
    Active,
    /// Fell into a pit or was eaten by the wumpus.
    Dead,
    /// Climbed out of the maze.
    Escaped,
}

impl AgentState {
    pub fn is_terminal(self) -> bool {
        self != AgentState::Active
    }
}

/// What has become of the agent's single arrow.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, strum::Display, Serialize, Deserialize,
)]
#[strum(serialize_all = "UPPERCASE")]
pub enum ArrowState {
    #[default]
    Unused,
    Missed,
    Hit,
}

/// Mutable per-episode state of the agent.
///
/// Only [`crate::world::World`] changes an agent, so the fields are read
/// through accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    location: Coordinate,
    direction: Direction,
    state: AgentState,
    arrow: ArrowState,
    has_gold: bool,
}

impl Agent {
    /// Creates an active agent at `home`, facing north, with its arrow and no gold.
    pub fn new(home: Coordinate) -> Self {
        Agent {
            location: home,
            direction: Direction::North,
            state: AgentState::Active,
            arrow: ArrowState::Unused,
            has_gold: false,
        }
    }

    pub fn location(&self) -> Coordinate {
        self.location
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    pub fn arrow(&self) -> ArrowState {
        self.arrow
    }

    pub fn has_gold(&self) -> bool {
        self.has_gold
    }

    pub fn has_arrow(&self) -> bool {
        self.arrow == ArrowState::Unused
    }

    pub fn has_killed_wumpus(&self) -> bool {
        self.arrow == ArrowState::Hit
    }

    pub(crate) fn set_location(&mut self, location: Coordinate) {
        self.location = location;
    }

    pub(crate) fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    pub(crate) fn set_state(&mut self, state: AgentState) {
        self.state = state;
    }

    pub(crate) fn set_arrow(&mut self, arrow: ArrowState) {
        self.arrow = arrow;
    }

    pub(crate) fn take_gold(&mut self) {
        self.has_gold = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_agent_starts_at_home_facing_north() {
        let agent = Agent::new(Coordinate::new(2, 3));
        assert_eq!(agent.location(), Coordinate::new(2, 3));
        assert_eq!(agent.direction(), Direction::North);
        assert_eq!(agent.state(), AgentState::Active);
        assert!(agent.has_arrow());
        assert!(!agent.has_gold());
        assert!(!agent.has_killed_wumpus());
    }

    #[test]
    fn arrow_states() {
        let mut agent = Agent::new(Coordinate::new(0, 0));
        agent.set_arrow(ArrowState::Missed);
        assert!(!agent.has_arrow());
        assert!(!agent.has_killed_wumpus());
        assert_eq!(agent.arrow().to_string(), "MISSED");
        agent.set_arrow(ArrowState::Hit);
        assert!(agent.has_killed_wumpus());
        assert_eq!(agent.arrow().to_string(), "HIT");
    }

    #[test]
    fn terminal_states() {
        assert!(!AgentState::Active.is_terminal());
        assert!(AgentState::Dead.is_terminal());
        assert!(AgentState::Escaped.is_terminal());
        assert_eq!(AgentState::Escaped.to_string(), "ESCAPED");
    }
}
