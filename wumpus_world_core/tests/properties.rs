use proptest::prelude::*;
use rand::{SeedableRng, rngs::StdRng};
use strum::IntoEnumIterator;
use wumpus_world_core::{
    Coordinate, Direction,
    maze::{Maze, RANDOM_MAZE_WIDTH},
    world::{Action, Percept, World},
};

fn direction() -> impl Strategy<Value = Direction> {
    prop::sample::select(Direction::iter().collect::<Vec<_>>())
}

fn action() -> impl Strategy<Value = Action> {
    prop::sample::select(Action::iter().collect::<Vec<_>>())
}

fn coordinate() -> impl Strategy<Value = Coordinate> {
    (-50i32..50, -50i32..50).prop_map(|(x, y)| Coordinate::new(x, y))
}

fn is_adjacent_or_same(a: Coordinate, b: Coordinate) -> bool {
    (a.x - b.x).abs() + (a.y - b.y).abs() <= 1
}

proptest! {
    #[test]
    fn rotation_is_invertible(d in direction()) {
        prop_assert_eq!(d.right().left(), d);
        prop_assert_eq!(d.left().right(), d);
    }

    #[test]
    fn step_then_opposite_returns(c in coordinate(), d in direction()) {
        prop_assert_eq!(c.step(d).step(d.opposite()), c);
    }

    #[test]
    fn finished_world_never_changes(actions in prop::collection::vec(action(), 1..40)) {
        let maze = Maze::builder()
            .boundary(0, 3, 0, 3)
            .home((0, 3))
            .gold((2, 1))
            .wumpus((2, 2))
            .pit((0, 1))
            .build()
            .unwrap();
        let mut world = World::new(maze);

        for action in actions {
            let before = world.agent().clone();
            let was_finished = world.is_finished();
            let result = world.update(action);
            if was_finished {
                prop_assert!(result.is_err());
                prop_assert_eq!(world.agent(), &before);
                prop_assert!(world.percepts().is_empty());
            } else if result.is_err() {
                // rejected actions leave no trace
                prop_assert_eq!(world.agent(), &before);
            }
        }
    }

    #[test]
    fn fire_is_single_use(turns in prop::collection::vec(prop::sample::select(vec![Action::Left, Action::Right]), 0..6)) {
        let mut world = World::new(Maze::builder().home((0, 0)).wumpus((1, 0)).build().unwrap());
        for turn in turns {
            world.update(turn).unwrap();
        }
        prop_assert!(world.update(Action::Fire).is_ok());
        prop_assert!(world.update(Action::Fire).is_err());
        prop_assert!(!world.have_arrow());
    }

    #[test]
    fn stench_and_breeze_are_local(
        wumpus in coordinate(),
        pit in coordinate(),
        kill in any::<bool>(),
    ) {
        let home = Coordinate::new(0, 0);
        let mut world = World::new(
            Maze::builder().home(home).wumpus(wumpus).pit(pit).build().unwrap(),
        );
        if kill {
            // killing the wumpus must not change whether it smells
            let _ = world.update(Action::Fire);
        }

        let percepts = world.percepts();
        prop_assert_eq!(percepts.contains(&Percept::Stench), is_adjacent_or_same(home, wumpus));
        let breeze = pit != home && is_adjacent_or_same(home, pit);
        prop_assert_eq!(percepts.contains(&Percept::Breeze), breeze);
    }

    #[test]
    fn random_maze_invariants(seed in any::<u64>()) {
        let maze = Maze::random_with(&mut StdRng::seed_from_u64(seed));
        let interior: Vec<Coordinate> = (0..RANDOM_MAZE_WIDTH)
            .flat_map(|x| (0..RANDOM_MAZE_WIDTH).map(move |y| Coordinate::new(x, y)))
            .collect();

        let gold = maze.gold().unwrap();
        let wumpus = maze.wumpus().unwrap();
        prop_assert!(interior.contains(&gold));
        prop_assert!(interior.contains(&wumpus));
        prop_assert!(interior.contains(&maze.home()));
        prop_assert_ne!(maze.home(), wumpus);

        let pits: Vec<Coordinate> = maze.pits().collect();
        let inner_walls: Vec<Coordinate> = interior.iter().copied().filter(|c| maze.is_wall(*c)).collect();
        prop_assert_eq!(pits.len(), 2);
        prop_assert_eq!(inner_walls.len(), 1);
        for hazard in pits.iter().chain(&inner_walls) {
            prop_assert!(interior.contains(hazard));
            prop_assert!(![maze.home(), gold, wumpus].contains(hazard));
        }

        for i in 0..RANDOM_MAZE_WIDTH {
            prop_assert!(maze.is_wall(Coordinate::new(i, -1)));
            prop_assert!(maze.is_wall(Coordinate::new(i, RANDOM_MAZE_WIDTH)));
            prop_assert!(maze.is_wall(Coordinate::new(-1, i)));
            prop_assert!(maze.is_wall(Coordinate::new(RANDOM_MAZE_WIDTH, i)));
        }
    }
}
