/*
 * Copyright (C) 2023 Asim Ihsan
 * SPDX-License-Identifier: AGPL-3.0-only
 *
 * This program is free software: you can redistribute it and/or modify it under
 * the terms of the GNU Affero General Public License as published by the Free
 * Software Foundation, version 3.
 *
 * This program is distributed in the hope that it will be useful, but WITHOUT ANY
 * WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A
 * PARTICULAR PURPOSE. See the GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License along
 * with this program. If not, see <https://www.gnu.org/licenses/>
 */

//! Sweep patterns for the burner, and single-step movement toward a target.

use serde::{Deserialize, Serialize};

use crate::{AgentId, GridWorld, Location, MarsWorldError};

/// How the burner sweeps the grid. Every pattern visits each cell once per pass, then starts
/// over at the origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchPattern {
    /// Left to right along a row, then down to the start of the next row.
    LeftRight,

    /// Top to bottom along a column, then right to the top of the next column.
    TopDown,

    /// Left to right along a row, down one, right to left along the next row, and so on.
    ZigZagLeftRight,

    /// Top to bottom along a column, right one, bottom to top along the next column, and so on.
    #[default]
    ZigZagTopDown,
}

impl SearchPattern {
    /// Every pattern.
    pub const ALL: [SearchPattern; 4] = [
        SearchPattern::LeftRight,
        SearchPattern::TopDown,
        SearchPattern::ZigZagLeftRight,
        SearchPattern::ZigZagTopDown,
    ];

    fn name(self) -> &'static str {
        match self {
            SearchPattern::LeftRight => "left-right",
            SearchPattern::TopDown => "top-down",
            SearchPattern::ZigZagLeftRight => "zig-zag-left-right",
            SearchPattern::ZigZagTopDown => "zig-zag-top-down",
        }
    }
}

impl std::fmt::Display for SearchPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for SearchPattern {
    type Err = MarsWorldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SearchPattern::ALL
            .into_iter()
            .find(|pattern| pattern.name() == s)
            .ok_or_else(|| MarsWorldError::InvalidConfig(format!("unknown search pattern: {}", s)))
    }
}

/// Moves the burner one cell per call along its sweep pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchController {
    pattern: SearchPattern,

    /// Zig-zag direction. Cleared whenever a pass completes.
    reverse: bool,
}

impl SearchController {
    /// Create a controller that sweeps with `pattern`, starting in the forward direction.
    pub fn new(pattern: SearchPattern) -> Self {
        Self {
            pattern,
            reverse: false,
        }
    }

    /// The pattern this controller sweeps with.
    pub fn pattern(&self) -> SearchPattern {
        self.pattern
    }

    /// Whether a zig-zag sweep is currently heading back toward the origin side.
    pub fn is_reversed(&self) -> bool {
        self.reverse
    }

    /// Move the burner to the next cell of the sweep and return where it ended up. Only the
    /// burner's position and the zig-zag direction change; grid contents are never looked at.
    pub fn advance(&mut self, world: &mut GridWorld) -> Result<Location, MarsWorldError> {
        let Location { x, y } = world.position(AgentId::Burner);
        let (width, height) = (world.width(), world.height());

        let (next, reverse) = match self.pattern {
            SearchPattern::LeftRight => (left_right(x, y, width, height), self.reverse),
            SearchPattern::TopDown => (top_down(x, y, width, height), self.reverse),
            SearchPattern::ZigZagLeftRight => zig_zag_left_right(x, y, width, height, self.reverse),
            SearchPattern::ZigZagTopDown => zig_zag_top_down(x, y, height, self.reverse),
        };

        world.set_position(AgentId::Burner, next.x, next.y)?;
        self.reverse = reverse;
        Ok(next)
    }
}

fn left_right(mut x: usize, mut y: usize, width: usize, height: usize) -> Location {
    x += 1;
    if x == width {
        x = 0;
        y += 1;
    }
    if y == height {
        y = 0;
    }
    Location { x, y }
}

fn top_down(mut x: usize, mut y: usize, width: usize, height: usize) -> Location {
    y += 1;
    if y == height {
        y = 0;
        x += 1;
    }
    if x == width {
        x = 0;
    }
    Location { x, y }
}

fn zig_zag_left_right(
    mut x: usize,
    mut y: usize,
    width: usize,
    height: usize,
    mut reverse: bool,
) -> (Location, bool) {
    if reverse {
        if x == 0 {
            reverse = false;
            y += 1;
        } else {
            x -= 1;
        }
    } else if x == width - 1 {
        reverse = true;
        y += 1;
    } else {
        x += 1;
    }

    if y == height {
        return (Location { x: 0, y: 0 }, false);
    }
    (Location { x, y }, reverse)
}

// The pass ends when x runs off the grid, checked against the height. Grids are square so this is
// the width too.
fn zig_zag_top_down(
    mut x: usize,
    mut y: usize,
    height: usize,
    mut reverse: bool,
) -> (Location, bool) {
    if reverse {
        if y == 0 {
            reverse = false;
            x += 1;
        } else {
            y -= 1;
        }
    } else if y == height - 1 {
        reverse = true;
        x += 1;
    } else {
        y += 1;
    }

    if x == height {
        return (Location { x: 0, y: 0 }, false);
    }
    (Location { x, y }, reverse)
}

/// Move the agent at most one cell toward (x, y) along each axis. Both axes move in the same call,
/// so diagonal steps happen; reaching the target may take several calls.
///
/// A target off the grid is rejected and the agent does not move.
pub fn step_toward(
    world: &mut GridWorld,
    agent: AgentId,
    x: usize,
    y: usize,
) -> Result<Location, MarsWorldError> {
    let target = world.check_bounds(x, y)?;
    let mut next = world.position(agent);

    if next.x < target.x {
        next.x += 1;
    } else if next.x > target.x {
        next.x -= 1;
    }

    if next.y < target.y {
        next.y += 1;
    } else if next.y > target.y {
        next.y -= 1;
    }

    world.set_position(agent, next.x, next.y)?;
    Ok(next)
}
