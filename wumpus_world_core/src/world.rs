use std::{collections::BTreeSet, sync::Arc};

use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString};

use crate::{
    Coordinate, Direction,
    agent::{Agent, AgentState, ArrowState},
    maze::Maze,
};

/// Represents actions an agent can decide to take.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    EnumString,
    strum::Display,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Action {
    /// Move one cell in the facing direction.
    Forward,
    /// Turn clockwise.
    Right,
    /// Turn anti-clockwise.
    Left,
    /// Shoot the arrow into the cell ahead.
    Fire,
    /// Pick up the gold in the current cell.
    Take,
    /// Climb out of the maze from home.
    Climb,
}

impl Action {
    /// Parses an action name such as `"forward"` or `"CLIMB"`.
    pub fn from_name(name: &str) -> Result<Action, WorldError> {
        name.trim()
            .parse()
            .map_err(|_| WorldError::UnknownAction(name.to_string()))
    }
}

/// An input the agent perceives at a given moment.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumIter,
    strum::Display,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
pub enum Percept {
    /// A pit is in an adjacent cell.
    Breeze,
    /// The wumpus is here or in an adjacent cell.
    Stench,
    /// Untaken gold is in this cell.
    Glitter,
    /// The last action killed the wumpus.
    Scream,
    /// The last action walked into a wall.
    Bump,
}

/// The set of percepts available to the agent.
pub type Percepts = BTreeSet<Percept>;

/// Outcome of a successfully applied action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub action: Action,
    /// Agent state once the action has been applied.
    pub state: AgentState,
    /// The action was a move into a wall.
    pub bumped: bool,
    /// The action killed the wumpus.
    pub scream: bool,
}

/// Errors returned when an action cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    #[error("episode already finished: agent is {state}")]
    EpisodeFinished { state: AgentState },
    #[error("no gold to take at {location}")]
    NoGold { location: Coordinate },
    #[error("no arrow to fire")]
    NoArrow,
    #[error("cannot climb at {location}: not home")]
    NotHome { location: Coordinate },
    #[error("unknown action: {0}")]
    UnknownAction(String),
}

impl WorldError {
    /// True when the action broke a game rule, as opposed to being malformed.
    pub fn is_illegal_action(&self) -> bool {
        !matches!(self, WorldError::UnknownAction(_))
    }
}

/// Mutable state of a single wumpus world episode.
///
/// The maze is shared and never changes; the agent is owned by the world and
/// only changes through [`World::update`] and [`World::reset`]. The world has
/// no internal locking, so callers sharing it across threads wrap it in a
/// mutex.
#[derive(Debug, Clone)]
pub struct World {
    maze: Arc<Maze>,
    agent: Agent,
    last_transition: Option<Transition>,
}

impl World {
    pub fn new(maze: impl Into<Arc<Maze>>) -> Self {
        let maze = maze.into();
        let agent = Agent::new(maze.home());
        World {
            maze,
            agent,
            last_transition: None,
        }
    }

    /// Creates a world over a freshly generated random maze.
    pub fn random() -> Self {
        World::new(Maze::random())
    }

    /// Puts the agent back at home with its arrow and no gold.
    pub fn reset(&mut self) {
        self.agent = Agent::new(self.maze.home());
        self.last_transition = None;
    }

    /// Applies `action` and returns the resulting transition.
    ///
    /// On error nothing about the world changes, including the bump and
    /// scream flags of the previous turn.
    pub fn update(&mut self, action: Action) -> Result<Transition, WorldError> {
        let (agent, transition) = match self.apply(action) {
            Ok(next) => next,
            Err(err) => {
                tracing::debug!(%action, %err, "action rejected");
                return Err(err);
            }
        };

        tracing::debug!(
            %action,
            location = %agent.location(),
            direction = %agent.direction(),
            state = %transition.state,
            bumped = transition.bumped,
            scream = transition.scream,
            "action applied"
        );
        if transition.state.is_terminal() {
            tracing::info!(state = %transition.state, location = %agent.location(), "episode finished");
        }

        self.agent = agent;
        self.last_transition = Some(transition);
        Ok(transition)
    }

    /// Computes the agent that results from `action` without touching `self`.
    fn apply(&self, action: Action) -> Result<(Agent, Transition), WorldError> {
        if self.is_finished() {
            return Err(WorldError::EpisodeFinished {
                state: self.agent.state(),
            });
        }

        let mut next = self.agent.clone();
        let mut bumped = false;
        let mut scream = false;
        let location = next.location();
        let direction = next.direction();

        match action {
            Action::Forward => {
                let target = location.step(direction);
                if self.is_wall(target) {
                    bumped = true;
                } else {
                    next.set_location(target);
                    let eaten = self.is_wumpus(target) && self.is_wumpus_alive();
                    if eaten || self.is_pit(target) {
                        next.set_state(AgentState::Dead);
                    }
                }
            }
            Action::Right => next.set_direction(direction.right()),
            Action::Left => next.set_direction(direction.left()),
            Action::Take => {
                if !self.is_gold(location) {
                    return Err(WorldError::NoGold { location });
                }
                next.take_gold();
            }
            Action::Fire => {
                if !next.has_arrow() {
                    return Err(WorldError::NoArrow);
                }
                if self.is_wumpus(location.step(direction)) {
                    next.set_arrow(ArrowState::Hit);
                    scream = true;
                } else {
                    next.set_arrow(ArrowState::Missed);
                }
            }
            Action::Climb => {
                if !self.is_home(location) {
                    return Err(WorldError::NotHome { location });
                }
                next.set_state(AgentState::Escaped);
            }
        }

        let transition = Transition {
            action,
            state: next.state(),
            bumped,
            scream,
        };
        Ok((next, transition))
    }

    /// Returns the percepts currently available to the agent.
    ///
    /// STENCH, GLITTER and BREEZE depend on the agent's location; BUMP and
    /// SCREAM report the outcome of the previous action. A finished episode
    /// has no percepts.
    pub fn percepts(&self) -> Percepts {
        let mut percepts = Percepts::new();
        if self.is_finished() {
            return percepts;
        }

        if let Some(last) = self.last_transition {
            if last.bumped {
                percepts.insert(Percept::Bump);
            }
            if last.scream {
                percepts.insert(Percept::Scream);
            }
        }

        let location = self.agent.location();
        if self.is_gold(location) {
            percepts.insert(Percept::Glitter);
        }
        if self.is_wumpus(location) {
            percepts.insert(Percept::Stench);
        }
        for adjacent in location.neighbours() {
            if self.is_pit(adjacent) {
                percepts.insert(Percept::Breeze);
            }
            if self.is_wumpus(adjacent) {
                percepts.insert(Percept::Stench);
            }
        }
        percepts
    }

    pub fn maze(&self) -> &Arc<Maze> {
        &self.maze
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn last_transition(&self) -> Option<Transition> {
        self.last_transition
    }

    pub fn state(&self) -> AgentState {
        self.agent.state()
    }

    pub fn is_finished(&self) -> bool {
        self.agent.state().is_terminal()
    }

    pub fn agent_location(&self) -> Coordinate {
        self.agent.location()
    }

    pub fn agent_direction(&self) -> Direction {
        self.agent.direction()
    }

    pub fn is_agent_located(&self, c: Coordinate) -> bool {
        self.agent.location() == c
    }

    pub fn home(&self) -> Coordinate {
        self.maze.home()
    }

    pub fn is_home(&self, c: Coordinate) -> bool {
        self.maze.is_home(c)
    }

    pub fn have_gold(&self) -> bool {
        self.agent.has_gold()
    }

    pub fn have_arrow(&self) -> bool {
        self.agent.has_arrow()
    }

    pub fn is_wumpus_alive(&self) -> bool {
        !self.is_wumpus_killed()
    }

    pub fn is_wumpus_killed(&self) -> bool {
        self.agent.has_killed_wumpus()
    }

    pub fn is_wall(&self, c: Coordinate) -> bool {
        self.maze.is_wall(c)
    }

    /// True if `c` holds gold that has not been taken yet.
    pub fn is_gold(&self, c: Coordinate) -> bool {
        !self.agent.has_gold() && self.maze.is_gold(c)
    }

    /// True if `c` holds the wumpus, dead or alive.
    pub fn is_wumpus(&self, c: Coordinate) -> bool {
        self.maze.is_wumpus(c)
    }

    pub fn is_pit(&self, c: Coordinate) -> bool {
        self.maze.is_pit(c)
    }
}
