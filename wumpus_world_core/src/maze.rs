use std::{collections::BTreeSet, fmt};

use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

use crate::Coordinate;

/// Width and height of the interior of a randomly generated maze.
pub const RANDOM_MAZE_WIDTH: i32 = 4;

/// Represents errors that can occur while constructing a maze.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MazeError {
    #[error("maze has no home location")]
    MissingHome,
    #[error("map string is empty")]
    EmptyMap,
    #[error("inconsistent width at row {row}: expected {expected}, found {found}")]
    InconsistentWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("unknown map code '{token}' at position ({x}, {y})")]
    UnknownToken { token: String, x: usize, y: usize },
    #[error("multiple {feature} locations found, second at {at}")]
    DuplicateFeature {
        feature: &'static str,
        at: Coordinate,
    },
}

/// Immutable layout of a maze: where the agent starts and what hazards it holds.
///
/// Features are tested by coordinate equality only, so a single cell may hold
/// several of them at once. Construct one through [`MazeBuilder`],
/// [`Maze::random`] or [`load_maze_from_string`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Maze {
    home: Coordinate,
    gold: Option<Coordinate>,
    wumpus: Option<Coordinate>,
    pits: BTreeSet<Coordinate>,
    walls: BTreeSet<Coordinate>,
}

/// Inclusive rectangle covering every feature of a maze.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min: Coordinate,
    pub max: Coordinate,
}

impl Bounds {
    pub fn width(&self) -> usize {
        (self.max.x - self.min.x + 1) as usize
    }

    pub fn height(&self) -> usize {
        (self.max.y - self.min.y + 1) as usize
    }
}

impl Maze {
    pub fn builder() -> MazeBuilder {
        MazeBuilder::default()
    }

    /// Generates a random 4x4 maze using the thread-local generator.
    pub fn random() -> Maze {
        Maze::random_with(&mut rand::rng())
    }

    /// Generates a random 4x4 maze surrounded by a wall frame.
    ///
    /// The maze holds exactly one gold, one wumpus, two pits and one interior
    /// wall. Gold may share a cell with home or the wumpus; the wumpus never
    /// starts at home; pits and the interior wall never share a cell with
    /// home, gold or the wumpus.
    pub fn random_with<R: Rng + ?Sized>(rng: &mut R) -> Maze {
        let mut builder = MazeBuilder::default();
        builder.boundary(0, RANDOM_MAZE_WIDTH - 1, 0, RANDOM_MAZE_WIDTH - 1);

        let mut cells: Vec<Coordinate> = (0..RANDOM_MAZE_WIDTH)
            .flat_map(|x| (0..RANDOM_MAZE_WIDTH).map(move |y| Coordinate::new(x, y)))
            .collect();

        cells.shuffle(rng);
        let gold = cells[0];
        cells.shuffle(rng);
        let home = cells.remove(0);
        let wumpus = cells.remove(0);
        cells.retain(|c| *c != gold);
        builder.pit(cells.remove(0)).pit(cells.remove(0));
        builder.wall(cells.remove(0));

        let maze = Maze {
            home,
            gold: Some(gold),
            wumpus: Some(wumpus),
            pits: builder.pits,
            walls: builder.walls,
        };
        tracing::info!(%maze, "generated random maze");
        maze
    }

    pub fn home(&self) -> Coordinate {
        self.home
    }

    pub fn gold(&self) -> Option<Coordinate> {
        self.gold
    }

    pub fn wumpus(&self) -> Option<Coordinate> {
        self.wumpus
    }

    pub fn pits(&self) -> impl Iterator<Item = Coordinate> + '_ {
        self.pits.iter().copied()
    }

    pub fn walls(&self) -> impl Iterator<Item = Coordinate> + '_ {
        self.walls.iter().copied()
    }

    pub fn is_home(&self, c: Coordinate) -> bool {
        self.home == c
    }

    pub fn is_gold(&self, c: Coordinate) -> bool {
        self.gold == Some(c)
    }

    pub fn is_wumpus(&self, c: Coordinate) -> bool {
        self.wumpus == Some(c)
    }

    pub fn is_pit(&self, c: Coordinate) -> bool {
        self.pits.contains(&c)
    }

    pub fn is_wall(&self, c: Coordinate) -> bool {
        self.walls.contains(&c)
    }

    /// Returns the smallest rectangle containing every feature of the maze.
    pub fn bounds(&self) -> Bounds {
        let features = std::iter::once(self.home)
            .chain(self.gold)
            .chain(self.wumpus)
            .chain(self.pits())
            .chain(self.walls());

        let mut bounds = Bounds {
            min: self.home,
            max: self.home,
        };
        for c in features {
            bounds.min.x = bounds.min.x.min(c.x);
            bounds.min.y = bounds.min.y.min(c.y);
            bounds.max.x = bounds.max.x.max(c.x);
            bounds.max.y = bounds.max.y.max(c.y);
        }
        bounds
    }
}

fn fmt_optional(c: Option<Coordinate>) -> String {
    c.map_or_else(|| "none".to_string(), |c| c.to_string())
}

fn fmt_set(set: &BTreeSet<Coordinate>) -> String {
    let items: Vec<String> = set.iter().map(Coordinate::to_string).collect();
    format!("[{}]", items.join(", "))
}

/// Canonical textual form, used to reproduce a maze from logs.
impl fmt::Display for Maze {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Maze [home={}, gold={}, wumpus={}, pits={}, walls={}]",
            self.home,
            fmt_optional(self.gold),
            fmt_optional(self.wumpus),
            fmt_set(&self.pits),
            fmt_set(&self.walls),
        )
    }
}

/// Accumulates the features of a hand-built maze.
///
/// The builder deliberately allows any overlap between features.
#[derive(Debug, Clone, Default)]
pub struct MazeBuilder {
    home: Option<Coordinate>,
    gold: Option<Coordinate>,
    wumpus: Option<Coordinate>,
    pits: BTreeSet<Coordinate>,
    walls: BTreeSet<Coordinate>,
}

impl MazeBuilder {
    pub fn home(&mut self, home: impl Into<Coordinate>) -> &mut Self {
        self.home = Some(home.into());
        self
    }

    pub fn gold(&mut self, gold: impl Into<Coordinate>) -> &mut Self {
        self.gold = Some(gold.into());
        self
    }

    pub fn wumpus(&mut self, wumpus: impl Into<Coordinate>) -> &mut Self {
        self.wumpus = Some(wumpus.into());
        self
    }

    pub fn pit(&mut self, pit: impl Into<Coordinate>) -> &mut Self {
        self.pits.insert(pit.into());
        self
    }

    pub fn wall(&mut self, wall: impl Into<Coordinate>) -> &mut Self {
        self.walls.insert(wall.into());
        self
    }

    /// Adds a one-cell-thick wall frame strictly outside the given rectangle.
    pub fn boundary(&mut self, min_x: i32, max_x: i32, min_y: i32, max_y: i32) -> &mut Self {
        for x in min_x..=max_x {
            self.wall((x, min_y - 1));
            self.wall((x, max_y + 1));
        }
        for y in min_y..=max_y {
            self.wall((min_x - 1, y));
            self.wall((max_x + 1, y));
        }
        self
    }

    /// Builds the maze, failing if no home has been set.
    pub fn build(&self) -> Result<Maze, MazeError> {
        let home = self.home.ok_or(MazeError::MissingHome)?;
        Ok(Maze {
            home,
            gold: self.gold,
            wumpus: self.wumpus,
            pits: self.pits.clone(),
            walls: self.walls.clone(),
        })
    }
}

impl From<(i32, i32)> for Coordinate {
    fn from((x, y): (i32, i32)) -> Self {
        Coordinate::new(x, y)
    }
}

/// Loads a maze from a string representation of a map.
///
/// Each line is a row (the first line is the northernmost) of
/// whitespace-separated cell codes: `BL` blank, `HO` home, `GO` gold,
/// `WU` wumpus, `PI` pit, `WA` wall. Codes may be combined with `+`,
/// e.g. `HO+GO`. A wall frame is drawn around the whole grid.
pub fn load_maze_from_string(map_string: &str) -> Result<Maze, MazeError> {
    let lines: Vec<&str> = map_string.trim().lines().collect();
    if lines.is_empty() {
        return Err(MazeError::EmptyMap);
    }

    let mut width = 0;
    let mut parsed_rows: Vec<Vec<&str>> = Vec::with_capacity(lines.len());
    for (y, line) in lines.iter().enumerate() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if y == 0 {
            width = tokens.len();
            if width == 0 {
                return Err(MazeError::EmptyMap);
            }
        } else if tokens.len() != width {
            return Err(MazeError::InconsistentWidth {
                row: y,
                expected: width,
                found: tokens.len(),
            });
        }
        parsed_rows.push(tokens);
    }

    let mut builder = MazeBuilder::default();
    builder.boundary(0, width as i32 - 1, 0, parsed_rows.len() as i32 - 1);

    for (y, row_tokens) in parsed_rows.iter().enumerate() {
        for (x, token) in row_tokens.iter().enumerate() {
            let pos = Coordinate::new(x as i32, y as i32);
            for code in token.split('+') {
                match code {
                    "BL" => {}
                    "HO" => set_unique(&mut builder.home, "home", pos)?,
                    "GO" => set_unique(&mut builder.gold, "gold", pos)?,
                    "WU" => set_unique(&mut builder.wumpus, "wumpus", pos)?,
                    "PI" => {
                        builder.pit(pos);
                    }
                    "WA" => {
                        builder.wall(pos);
                    }
                    unknown => {
                        return Err(MazeError::UnknownToken {
                            token: unknown.to_string(),
                            x,
                            y,
                        });
                    }
                }
            }
        }
    }

    builder.build()
}

fn set_unique(
    slot: &mut Option<Coordinate>,
    feature: &'static str,
    at: Coordinate,
) -> Result<(), MazeError> {
    if slot.is_some() {
        return Err(MazeError::DuplicateFeature { feature, at });
    }
    *slot = Some(at);
    Ok(())
}
