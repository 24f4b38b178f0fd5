//! Maze generation with a randomized depth-first search.
//!
//! The maze is an `nx × ny` grid of [`Cell`]s. Generation starts from fully
//! walled cells and carves a spanning tree: from the current cell an unvisited
//! neighbour (one that still has all four walls) is chosen uniformly at random,
//! the wall between the two is knocked down and the walk continues from the
//! neighbour. When no unvisited neighbour remains the walk backtracks along an
//! explicit stack. The result connects every cell with exactly one path.
//!
//! # Examples
//! ```
//! use gridmdp::grid::Maze;
//!
//! let maze = Maze::generate(6, 4, (0, 0), Some(7)).unwrap();
//! assert_eq!(maze.passage_count(), 6 * 4 - 1);
//! assert!(maze.walls_consistent());
//! ```

use std::fmt;

use log::debug;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::error::{Error, Result};
use crate::grid::Direction;

/// A single maze cell and the walls surrounding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub x: usize,
    pub y: usize,
    walls: Direction,
}

impl Cell {
    fn new(x: usize, y: usize, walls: Direction) -> Self {
        Self { x, y, walls }
    }

    /// Directions in which this cell is walled.
    pub fn walls(&self) -> Direction {
        self.walls
    }

    /// Directions in which this cell is open.
    pub fn openings(&self) -> Direction {
        Direction::ALL - self.walls
    }

    pub fn has_wall(&self, direction: Direction) -> bool {
        self.walls.contains(direction)
    }

    /// A cell still surrounded on all four sides has not been reached by the
    /// generator.
    pub fn has_all_walls(&self) -> bool {
        self.walls == Direction::ALL
    }
}

/// A rectangular maze owning all of its cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Maze {
    nx: usize,
    ny: usize,
    cells: Vec<Cell>,
}

impl Maze {
    /// Creates an `nx × ny` maze with every cell fully walled.
    pub fn new(nx: usize, ny: usize) -> Result<Self> {
        Self::filled(nx, ny, Direction::ALL)
    }

    /// Creates an `nx × ny` maze with no interior walls, only the outer
    /// boundary.
    pub fn open(nx: usize, ny: usize) -> Result<Self> {
        let mut maze = Self::filled(nx, ny, Direction::STAY)?;
        maze.add_boundary_walls();
        Ok(maze)
    }

    /// Builds and carves a maze starting at `start`. Supplying a `seed` makes
    /// the layout reproducible; `None` draws a fresh one from system entropy.
    pub fn generate(nx: usize, ny: usize, start: (usize, usize), seed: Option<u64>) -> Result<Self> {
        let mut rng = match seed {
            Some(seed) => ChaCha20Rng::seed_from_u64(seed),
            None => ChaCha20Rng::from_entropy(),
        };
        Self::generate_with_rng(nx, ny, start, &mut rng)
    }

    /// Builds and carves a maze using the supplied random source.
    pub fn generate_with_rng<R: Rng + ?Sized>(
        nx: usize,
        ny: usize,
        start: (usize, usize),
        rng: &mut R,
    ) -> Result<Self> {
        let mut maze = Self::new(nx, ny)?;
        maze.check_bounds(start.0, start.1)?;
        maze.carve(start, rng);
        debug!("generated {}x{} maze from ({}, {})", nx, ny, start.0, start.1);
        Ok(maze)
    }

    fn filled(nx: usize, ny: usize, walls: Direction) -> Result<Self> {
        if nx == 0 || ny == 0 {
            return Err(Error::EmptyGrid {
                width: nx,
                height: ny,
            });
        }
        let cells = (0..ny)
            .flat_map(|y| (0..nx).map(move |x| Cell::new(x, y, walls)))
            .collect();
        Ok(Self { nx, ny, cells })
    }

    fn add_boundary_walls(&mut self) {
        for cell in &mut self.cells {
            if cell.y == 0 {
                cell.walls |= Direction::NORTH;
            }
            if cell.y + 1 == self.ny {
                cell.walls |= Direction::SOUTH;
            }
            if cell.x == 0 {
                cell.walls |= Direction::WEST;
            }
            if cell.x + 1 == self.nx {
                cell.walls |= Direction::EAST;
            }
        }
    }

    /// `(nx, ny)`
    pub fn dimensions(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }

    pub fn cell_at(&self, x: usize, y: usize) -> Option<&Cell> {
        if x < self.nx && y < self.ny {
            self.cells.get(self.index(x, y))
        } else {
            None
        }
    }

    fn index(&self, x: usize, y: usize) -> usize {
        y * self.nx + x
    }

    fn check_bounds(&self, x: usize, y: usize) -> Result<()> {
        if x < self.nx && y < self.ny {
            Ok(())
        } else {
            Err(Error::OutOfBounds {
                x,
                y,
                width: self.nx,
                height: self.ny,
            })
        }
    }

    /// The cell one step from `(x, y)` in a single `direction`, if it exists.
    pub fn neighbour(&self, x: usize, y: usize, direction: Direction) -> Option<(usize, usize)> {
        if !direction.is_single() {
            return None;
        }
        let (dx, dy) = direction.offset();
        let nx = x.checked_add_signed(dx)?;
        let ny = y.checked_add_signed(dy)?;
        (nx < self.nx && ny < self.ny).then_some((nx, ny))
    }

    /// Removes the wall on the `direction` side of `(x, y)` and the facing wall
    /// of its neighbour. On the outer boundary only the cell's own side changes.
    pub fn knock_down_wall(&mut self, x: usize, y: usize, direction: Direction) -> Result<()> {
        self.set_wall(x, y, direction, false)
    }

    /// Adds the wall on the `direction` side of `(x, y)` and the facing wall of
    /// its neighbour.
    pub fn add_wall(&mut self, x: usize, y: usize, direction: Direction) -> Result<()> {
        self.set_wall(x, y, direction, true)
    }

    fn set_wall(&mut self, x: usize, y: usize, direction: Direction, present: bool) -> Result<()> {
        self.check_bounds(x, y)?;
        let here = self.index(x, y);
        for d in direction.compass() {
            self.cells[here].walls.set(d, present);
            if let Some((nx, ny)) = self.neighbour(x, y, d) {
                let there = self.index(nx, ny);
                self.cells[there].walls.set(d.opposite(), present);
            }
        }
        Ok(())
    }

    /// Neighbours of `(x, y)` that have not been carved into yet.
    fn unvisited_neighbours(&self, x: usize, y: usize) -> Vec<(Direction, (usize, usize))> {
        [
            Direction::WEST,
            Direction::EAST,
            Direction::SOUTH,
            Direction::NORTH,
        ]
        .into_iter()
        .filter_map(|d| self.neighbour(x, y, d).map(|pos| (d, pos)))
        .filter(|&(_, (nx, ny))| self.cells[self.index(nx, ny)].has_all_walls())
        .collect()
    }

    fn carve<R: Rng + ?Sized>(&mut self, start: (usize, usize), rng: &mut R) {
        let total = self.nx * self.ny;
        let mut stack = Vec::with_capacity(total);
        let mut current = start;
        let mut visited = 1;

        while visited < total {
            let neighbours = self.unvisited_neighbours(current.0, current.1);
            let Some(&(direction, next)) = neighbours.choose(rng) else {
                // Dead end: backtrack.
                match stack.pop() {
                    Some(previous) => current = previous,
                    None => break,
                }
                continue;
            };
            let here = self.index(current.0, current.1);
            let there = self.index(next.0, next.1);
            self.cells[here].walls.remove(direction);
            self.cells[there].walls.remove(direction.opposite());
            stack.push(current);
            current = next;
            visited += 1;
        }
    }

    /// Number of interior walls that have been knocked down.
    pub fn passage_count(&self) -> usize {
        self.cells
            .iter()
            .map(|cell| {
                let east = cell.x + 1 < self.nx && !cell.has_wall(Direction::EAST);
                let south = cell.y + 1 < self.ny && !cell.has_wall(Direction::SOUTH);
                usize::from(east) + usize::from(south)
            })
            .sum()
    }

    /// Checks that every interior wall is recorded identically on both sides.
    pub fn walls_consistent(&self) -> bool {
        self.cells.iter().all(|cell| {
            Direction::COMPASS.into_iter().all(|d| {
                match self.neighbour(cell.x, cell.y, d) {
                    Some((nx, ny)) => {
                        cell.has_wall(d) == self.cells[self.index(nx, ny)].has_wall(d.opposite())
                    }
                    None => true,
                }
            })
        })
    }

    /// Cells reachable from `(x, y)` by walking through open walls.
    pub fn reachable_from(&self, x: usize, y: usize) -> usize {
        if self.check_bounds(x, y).is_err() {
            return 0;
        }
        let mut seen = vec![false; self.cells.len()];
        let mut frontier = vec![(x, y)];
        seen[self.index(x, y)] = true;
        let mut count = 0;
        while let Some((cx, cy)) = frontier.pop() {
            count += 1;
            for d in self.cells[self.index(cx, cy)].openings().compass() {
                if let Some((nx, ny)) = self.neighbour(cx, cy, d) {
                    let i = self.index(nx, ny);
                    if !seen[i] {
                        seen[i] = true;
                        frontier.push((nx, ny));
                    }
                }
            }
        }
        count
    }
}

impl fmt::Display for Maze {
    /// A crude text picture: `|` for east walls, `-` for south walls.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "-".repeat(self.nx * 2))?;
        for y in 0..self.ny {
            let mut east = String::from("|");
            let mut south = String::from("|");
            for x in 0..self.nx {
                let cell = &self.cells[self.index(x, y)];
                east.push_str(if cell.has_wall(Direction::EAST) { " |" } else { "  " });
                south.push_str(if cell.has_wall(Direction::SOUTH) { "-+" } else { " +" });
            }
            writeln!(f, "{}", east)?;
            writeln!(f, "{}", south)?;
        }
        Ok(())
    }
}
