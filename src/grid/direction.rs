//! Compass directions as a bit-flag set.
//!
//! A single value either names one move (`NORTH`), several tied moves
//! (`NORTH | EAST`) or no move at all (`STAY`). Policies store one of these per
//! state, and the action model reports the set of currently permitted moves
//! in the same form.

use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// A set of compass directions.
    ///
    /// # Examples
    /// ```
    /// use gridmdp::grid::Direction;
    ///
    /// let tied = Direction::NORTH | Direction::WEST;
    /// assert!(!tied.is_single());
    /// assert_eq!(tied.split(), vec![Direction::NORTH, Direction::WEST]);
    /// assert_eq!(tied.to_string(), "North|West");
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Direction: u8 {
        const NORTH = 1;
        const EAST = 2;
        const SOUTH = 4;
        const WEST = 8;
        const ALL = Self::NORTH.bits() | Self::EAST.bits() | Self::SOUTH.bits() | Self::WEST.bits();
    }
}

impl Direction {
    /// No movement.
    pub const STAY: Self = Self::empty();

    /// The four single directions in the order actions are enumerated.
    pub const COMPASS: [Direction; 4] = [
        Direction::NORTH,
        Direction::EAST,
        Direction::SOUTH,
        Direction::WEST,
    ];

    /// Iterates over the single directions contained in this set, in
    /// North, East, South, West order.
    pub fn compass(self) -> impl Iterator<Item = Direction> {
        Self::COMPASS.into_iter().filter(move |d| self.contains(*d))
    }

    /// Splits the set into its single directions.
    pub fn split(self) -> Vec<Direction> {
        self.compass().collect()
    }

    /// Returns `true` when exactly one direction is set.
    pub fn is_single(self) -> bool {
        self.bits().is_power_of_two()
    }

    /// The opposite of each member of the set.
    pub fn opposite(self) -> Direction {
        self.compass()
            .filter_map(|d| Self::info(d).map(|info| info.opposite))
            .collect()
    }

    /// `(dx, dy)` of a single direction, with `y` growing southwards.
    /// Anything that is not a single direction does not move.
    pub fn offset(self) -> (isize, isize) {
        Self::info(self).map_or((0, 0), |info| info.offset)
    }

    fn name(self) -> &'static str {
        Self::info(self).map_or("Stay", |info| info.name)
    }

    fn info(self) -> Option<&'static CompassInfo> {
        COMPASS_INFO.iter().find(|info| info.direction == self)
    }
}

struct CompassInfo {
    direction: Direction,
    name: &'static str,
    offset: (isize, isize),
    opposite: Direction,
}

static COMPASS_INFO: [CompassInfo; 4] = [
    CompassInfo {
        direction: Direction::NORTH,
        name: "North",
        offset: (0, -1),
        opposite: Direction::SOUTH,
    },
    CompassInfo {
        direction: Direction::EAST,
        name: "East",
        offset: (1, 0),
        opposite: Direction::WEST,
    },
    CompassInfo {
        direction: Direction::SOUTH,
        name: "South",
        offset: (0, 1),
        opposite: Direction::NORTH,
    },
    CompassInfo {
        direction: Direction::WEST,
        name: "West",
        offset: (-1, 0),
        opposite: Direction::EAST,
    },
];

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("Stay");
        }
        let names: Vec<&str> = self.compass().map(Direction::name).collect();
        f.write_str(&names.join("|"))
    }
}
