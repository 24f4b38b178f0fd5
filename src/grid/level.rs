//! A rectangular grid level with an optional maze and an optional dead zone.

use log::debug;
use ndarray::Array2;

use crate::error::{Error, Result};
use crate::grid::{ActionModel, Direction, Maze, Policy};

/// Configuration for a [`GridLevel`].
#[derive(Debug, Clone, PartialEq)]
pub struct GridParameters {
    /// Number of columns
    pub width: usize,
    /// Number of rows
    pub height: usize,
    /// Start cell, also the cell maze carving begins from
    pub start: (usize, usize),
    /// Terminal cell; bottom-right when `None`
    pub end: Option<(usize, usize)>,
    /// Carve a maze over the grid
    pub maze: bool,
    /// Seed for reproducible mazes
    pub maze_seed: Option<u64>,
    /// Exclude every cell not on the outer ring of the grid
    pub fill_center: bool,
    /// Reward collected on entering any cell
    pub step_reward: f64,
    /// Probability that the chosen move is the one executed
    pub transition_probability: f64,
}

impl Default for GridParameters {
    fn default() -> Self {
        Self {
            width: 3,
            height: 3,
            start: (0, 0),
            end: None,
            maze: false,
            maze_seed: None,
            fill_center: false,
            step_reward: -1.0,
            transition_probability: 1.0,
        }
    }
}

/// A grid world: bounds, terminal cell, walls and rewards.
///
/// # Examples
/// ```
/// use gridmdp::grid::{ActionModel, Direction, GridLevel, GridParameters};
///
/// let level = GridLevel::new(GridParameters::default()).unwrap();
/// assert_eq!(level.available_actions(0, 0, None), Direction::EAST | Direction::SOUTH);
/// assert_eq!(level.available_actions(2, 2, None), Direction::STAY);
/// ```
#[derive(Debug, Clone)]
pub struct GridLevel {
    width: usize,
    height: usize,
    start: (usize, usize),
    end: (usize, usize),
    maze: Option<Maze>,
    fill_center: bool,
    rewards: Array2<f64>,
    transition_probability: f64,
}

impl GridLevel {
    pub fn new(params: GridParameters) -> Result<Self> {
        let GridParameters {
            width,
            height,
            start,
            end,
            maze,
            maze_seed,
            fill_center,
            step_reward,
            transition_probability,
        } = params;

        if width == 0 || height == 0 {
            return Err(Error::EmptyGrid { width, height });
        }
        let end = end.unwrap_or((width - 1, height - 1));
        for (x, y) in [start, end] {
            if x >= width || y >= height {
                return Err(Error::OutOfBounds {
                    x,
                    y,
                    width,
                    height,
                });
            }
        }
        if !(0.0..=1.0).contains(&transition_probability) {
            return Err(Error::InvalidProbability(transition_probability));
        }

        let maze = if maze {
            Some(Maze::generate(width, height, start, maze_seed)?)
        } else {
            None
        };

        debug!(
            "created {}x{} level, start {:?}, end {:?}, maze: {}, fill centre: {}",
            width,
            height,
            start,
            end,
            maze.is_some(),
            fill_center
        );

        Ok(Self {
            width,
            height,
            start,
            end,
            maze,
            fill_center,
            rewards: Array2::from_elem((height, width), step_reward),
            transition_probability,
        })
    }

    /// Uses an existing maze for the walls. The maze must cover the grid.
    pub fn with_maze(mut self, maze: Maze) -> Result<Self> {
        let (nx, ny) = maze.dimensions();
        if (nx, ny) != (self.width, self.height) {
            return Err(Error::ShapeMismatch {
                expected: (self.height, self.width),
                found: (ny, nx),
            });
        }
        self.maze = Some(maze);
        Ok(self)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn start(&self) -> (usize, usize) {
        self.start
    }

    pub fn maze(&self) -> Option<&Maze> {
        self.maze.as_ref()
    }

    pub fn fill_center(&self) -> bool {
        self.fill_center
    }

    /// The reward surface, one entry per cell.
    pub fn rewards(&self) -> &Array2<f64> {
        &self.rewards
    }

    /// Overrides the reward collected on entering `(x, y)`.
    pub fn set_reward(&mut self, x: usize, y: usize, reward: f64) -> Result<()> {
        let (width, height) = (self.width, self.height);
        let cell = self
            .rewards
            .get_mut((y, x))
            .ok_or(Error::OutOfBounds {
                x,
                y,
                width,
                height,
            })?;
        *cell = reward;
        Ok(())
    }

    /// Whether `(x, y)` lies in the excluded centre of a fill-centre level.
    pub fn in_dead_zone(&self, x: usize, y: usize) -> bool {
        self.fill_center && x >= 1 && x + 2 <= self.width && y >= 1 && y + 2 <= self.height
    }

    /// Takes one step from `pos`. A move that is not available leaves the
    /// agent where it is.
    pub fn move_agent(&self, pos: (usize, usize), direction: Direction) -> (usize, usize) {
        let (x, y) = pos;
        if direction.is_single() && self.available_actions(x, y, None).contains(direction) {
            self.next_state(x, y, direction).unwrap_or(pos)
        } else {
            pos
        }
    }

    fn open_directions(&self, x: usize, y: usize) -> Direction {
        if let Some(maze) = &self.maze {
            // a knocked-out boundary wall still never leads off the grid
            return maze.cell_at(x, y).map_or(Direction::STAY, |cell| {
                cell.openings()
                    .compass()
                    .filter(|&d| self.next_state(x, y, d).is_some())
                    .collect()
            });
        }
        if self.in_dead_zone(x, y) {
            return Direction::STAY;
        }
        Direction::COMPASS
            .into_iter()
            .filter(|&d| match self.next_state(x, y, d) {
                Some((nx, ny)) => !self.in_dead_zone(nx, ny),
                None => false,
            })
            .collect()
    }
}

impl ActionModel for GridLevel {
    fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn end(&self) -> (usize, usize) {
        self.end
    }

    fn available_actions(&self, x: usize, y: usize, policy: Option<&Policy>) -> Direction {
        if self.is_terminal(x, y) || x >= self.width || y >= self.height {
            return Direction::STAY;
        }
        let actions = self.open_directions(x, y);
        match policy {
            Some(policy) => actions & policy.get((y, x)).copied().unwrap_or(Direction::STAY),
            None => actions,
        }
    }

    fn next_state(&self, x: usize, y: usize, direction: Direction) -> Option<(usize, usize)> {
        if direction.is_empty() {
            return Some((x, y));
        }
        if !direction.is_single() {
            return None;
        }
        let (dx, dy) = direction.offset();
        let nx = x.checked_add_signed(dx)?;
        let ny = y.checked_add_signed(dy)?;
        (nx < self.width && ny < self.height).then_some((nx, ny))
    }

    fn transition_probability(&self, x: usize, y: usize) -> f64 {
        // with a single way out there is nothing to slip into
        if self.available_actions(x, y, None).bits().count_ones() <= 1 {
            1.0
        } else {
            self.transition_probability
        }
    }

    fn action_reward(&self, x: usize, y: usize) -> f64 {
        self.rewards.get((y, x)).copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(params: GridParameters) -> GridLevel {
        GridLevel::new(params).unwrap()
    }

    #[test]
    fn test_defaults() {
        let level = level(GridParameters::default());
        assert_eq!(level.dimensions(), (3, 3));
        assert_eq!(level.shape(), (3, 3));
        assert_eq!(level.start(), (0, 0));
        assert_eq!(level.end(), (2, 2));
        assert!(level.maze().is_none());
        assert_eq!(level.action_reward(1, 1), -1.0);
        assert_eq!(level.transition_probability(1, 1), 1.0);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(matches!(
            GridLevel::new(GridParameters {
                width: 0,
                ..Default::default()
            }),
            Err(Error::EmptyGrid { .. })
        ));
        assert!(matches!(
            GridLevel::new(GridParameters {
                end: Some((3, 0)),
                ..Default::default()
            }),
            Err(Error::OutOfBounds { x: 3, y: 0, .. })
        ));
        assert_eq!(
            GridLevel::new(GridParameters {
                transition_probability: 1.5,
                ..Default::default()
            })
            .unwrap_err(),
            Error::InvalidProbability(1.5)
        );
    }

    #[test]
    fn test_boundary_actions() {
        let level = level(GridParameters::default());
        assert_eq!(
            level.available_actions(0, 0, None),
            Direction::EAST | Direction::SOUTH
        );
        assert_eq!(
            level.available_actions(1, 0, None),
            Direction::EAST | Direction::SOUTH | Direction::WEST
        );
        assert_eq!(level.available_actions(1, 1, None), Direction::ALL);
        assert_eq!(
            level.available_actions(2, 1, None),
            Direction::NORTH | Direction::SOUTH | Direction::WEST
        );
        assert_eq!(
            level.allowed_actions(0, 2),
            vec![Direction::NORTH, Direction::EAST]
        );
        assert!(level.allowed_actions(2, 2).is_empty());
    }

    #[test]
    fn test_terminal_has_no_actions() {
        let everything = Array2::from_elem((4, 5), Direction::ALL);
        let configs = [
            GridParameters {
                width: 5,
                height: 4,
                ..Default::default()
            },
            GridParameters {
                width: 5,
                height: 4,
                fill_center: true,
                ..Default::default()
            },
            GridParameters {
                width: 5,
                height: 4,
                maze: true,
                maze_seed: Some(11),
                end: Some((2, 1)),
                ..Default::default()
            },
        ];
        for params in configs {
            let level = level(params);
            let (ex, ey) = level.end();
            assert_eq!(level.available_actions(ex, ey, None), Direction::STAY);
            assert_eq!(
                level.available_actions(ex, ey, Some(&everything)),
                Direction::STAY
            );
        }
    }

    #[test]
    fn test_dead_zone_is_unreachable() {
        let level = level(GridParameters {
            width: 4,
            height: 4,
            fill_center: true,
            ..Default::default()
        });
        assert!(level.in_dead_zone(1, 1));
        assert!(level.in_dead_zone(2, 2));
        assert!(!level.in_dead_zone(0, 2));
        assert_eq!(level.available_actions(1, 1, None), Direction::STAY);
        assert_eq!(
            level.available_actions(1, 0, None),
            Direction::EAST | Direction::WEST
        );
        assert_eq!(
            level.available_actions(0, 2, None),
            Direction::NORTH | Direction::SOUTH
        );
        assert_eq!(
            level.available_actions(3, 1, None),
            Direction::NORTH | Direction::SOUTH
        );
        assert_eq!(
            level.available_actions(0, 0, None),
            Direction::EAST | Direction::SOUTH
        );
        for y in 0..4 {
            for x in 0..4 {
                for d in level.available_actions(x, y, None).compass() {
                    let (nx, ny) = level.next_state(x, y, d).unwrap();
                    assert!(!level.in_dead_zone(nx, ny));
                }
            }
        }
    }

    #[test]
    fn test_narrow_level_has_no_dead_zone() {
        let level = level(GridParameters {
            width: 4,
            height: 2,
            fill_center: true,
            ..Default::default()
        });
        assert_eq!(
            level.available_actions(1, 0, None),
            Direction::EAST | Direction::SOUTH | Direction::WEST
        );
    }

    #[test]
    fn test_maze_actions_follow_walls() {
        let level = level(GridParameters {
            width: 6,
            height: 5,
            maze: true,
            maze_seed: Some(5),
            ..Default::default()
        });
        let maze = level.maze().unwrap();
        for y in 0..5 {
            for x in 0..6 {
                if level.is_terminal(x, y) {
                    continue;
                }
                let cell = maze.cell_at(x, y).unwrap();
                assert_eq!(level.available_actions(x, y, None), cell.openings());
            }
        }
    }

    #[test]
    fn test_supplied_maze() {
        let mut maze = Maze::new(3, 3).unwrap();
        maze.knock_down_wall(0, 0, Direction::EAST).unwrap();
        let level = level(GridParameters::default()).with_maze(maze).unwrap();
        assert_eq!(level.available_actions(0, 0, None), Direction::EAST);
        assert_eq!(level.available_actions(1, 1, None), Direction::STAY);
        assert!(level
            .with_maze(Maze::new(2, 2).unwrap())
            .is_err());
    }

    #[test]
    fn test_open_boundary_wall_stays_on_grid() {
        let mut maze = Maze::open(2, 1).unwrap();
        maze.knock_down_wall(0, 0, Direction::WEST).unwrap();
        let level = level(GridParameters {
            width: 2,
            height: 1,
            end: Some((1, 0)),
            transition_probability: 0.7,
            ..Default::default()
        })
        .with_maze(maze)
        .unwrap();
        assert_eq!(level.available_actions(0, 0, None), Direction::EAST);
        assert_eq!(level.allowed_actions(0, 0), vec![Direction::EAST]);
        assert_eq!(level.transition_probability(0, 0), 1.0);
        assert_eq!(level.move_agent((0, 0), Direction::WEST), (0, 0));
    }

    #[test]
    fn test_policy_restricts_actions() {
        let level = level(GridParameters::default());
        let mut policy = Array2::from_elem((3, 3), Direction::NORTH | Direction::EAST);
        policy[[1, 1]] = Direction::SOUTH;
        assert_eq!(level.available_actions(1, 1, Some(&policy)), Direction::SOUTH);
        assert_eq!(level.available_actions(0, 0, Some(&policy)), Direction::EAST);
        assert_eq!(
            level.available_actions(0, 1, Some(&policy)),
            Direction::NORTH | Direction::EAST
        );
        policy[[0, 2]] = Direction::STAY;
        assert_eq!(level.available_actions(2, 0, Some(&policy)), Direction::STAY);
    }

    #[test]
    fn test_next_state() {
        let level = level(GridParameters::default());
        assert_eq!(level.next_state(1, 1, Direction::NORTH), Some((1, 0)));
        assert_eq!(level.next_state(1, 1, Direction::WEST), Some((0, 1)));
        assert_eq!(level.next_state(0, 0, Direction::WEST), None);
        assert_eq!(level.next_state(2, 2, Direction::SOUTH), None);
        assert_eq!(level.next_state(1, 1, Direction::STAY), Some((1, 1)));
        assert_eq!(level.next_state(1, 1, Direction::ALL), None);
    }

    #[test]
    fn test_transition_probability_collapses() {
        let mut maze = Maze::new(3, 3).unwrap();
        maze.knock_down_wall(0, 0, Direction::EAST).unwrap();
        maze.knock_down_wall(1, 0, Direction::EAST).unwrap();
        let level = level(GridParameters {
            transition_probability: 0.7,
            ..Default::default()
        })
        .with_maze(maze)
        .unwrap();
        assert_eq!(level.transition_probability(0, 0), 1.0);
        assert_eq!(level.transition_probability(1, 0), 0.7);
    }

    #[test]
    fn test_reward_surface() {
        let mut level = level(GridParameters::default());
        level.set_reward(2, 1, -5.0).unwrap();
        assert_eq!(level.action_reward(2, 1), -5.0);
        assert_eq!(level.action_reward(1, 2), -1.0);
        assert_eq!(level.action_reward(7, 7), 0.0);
        assert!(level.set_reward(3, 0, 1.0).is_err());
    }

    #[test]
    fn test_move_agent() {
        let level = level(GridParameters {
            fill_center: true,
            ..Default::default()
        });
        assert_eq!(level.move_agent((0, 0), Direction::EAST), (1, 0));
        assert_eq!(level.move_agent((1, 0), Direction::SOUTH), (1, 0));
        assert_eq!(level.move_agent((0, 0), Direction::NORTH), (0, 0));
        assert_eq!(level.move_agent((2, 2), Direction::NORTH), (2, 2));
    }
}
