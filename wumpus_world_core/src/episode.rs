use crate::{
    agent::AgentState,
    controller::{Controller, ControllerError},
    world::{Action, Percepts, World, WorldError},
};

/// Turn ceiling used when the caller has no better idea.
pub const DEFAULT_MAX_TURNS: usize = 100;

/// Errors that stop an episode before the agent dies or escapes.
#[derive(Debug, thiserror::Error)]
pub enum EpisodeError {
    #[error(transparent)]
    Controller(ControllerError),
    #[error("controller chose an illegal action on turn {turn}")]
    World {
        turn: usize,
        #[source]
        source: WorldError,
    },
    #[error("episode stalled after {turns} turns")]
    Stalled { turns: usize },
}

/// One turn of an episode: what the agent perceived and what it did about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub percepts: Percepts,
    pub action: Action,
    pub state: AgentState,
    /// What the controller said about its choice.
    pub notes: Vec<String>,
}

/// Record of a finished episode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeReport {
    pub turns: Vec<Turn>,
    pub outcome: AgentState,
}

impl EpisodeReport {
    pub fn actions(&self) -> Vec<Action> {
        self.turns.iter().map(|t| t.action).collect()
    }
}

/// Asks the controller for one action and applies it to the world.
///
/// `turn` is only used to label errors.
pub fn step(
    world: &mut World,
    controller: &mut dyn Controller,
    turn: usize,
) -> Result<Turn, EpisodeError> {
    let percepts = world.percepts();
    let action = controller
        .process(&percepts)
        .map_err(EpisodeError::Controller)?;
    let notes = controller.notes().to_vec();
    for note in &notes {
        tracing::trace!(turn, %note, "controller");
    }
    let transition = world
        .update(action)
        .map_err(|source| EpisodeError::World { turn, source })?;
    Ok(Turn {
        percepts,
        action,
        state: transition.state,
        notes,
    })
}

/// Plays the world until the agent dies or escapes.
///
/// The controller is reset before the first turn. The world is played from
/// its current state; call [`World::reset`] first to start over.
pub fn run_episode(
    world: &mut World,
    controller: &mut dyn Controller,
    max_turns: usize,
) -> Result<EpisodeReport, EpisodeError> {
    controller.reset();
    let mut turns = Vec::new();

    while !world.is_finished() {
        if turns.len() >= max_turns {
            tracing::warn!(turns = turns.len(), maze = %world.maze(), "episode stalled");
            return Err(EpisodeError::Stalled { turns: turns.len() });
        }
        turns.push(step(world, controller, turns.len() + 1)?);
    }

    Ok(EpisodeReport {
        turns,
        outcome: world.state(),
    })
}
