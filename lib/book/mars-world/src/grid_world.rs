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

//! The grid: which cells hold which objects, and where the two agents are.

use rand::Rng as _;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{HashSet, MarsWorldError};

/// A cell on the grid. (0, 0) is the top left, x grows to the right and y grows down.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Location {
    /// Column.
    pub x: usize,
    /// Row.
    pub y: usize,
}

impl Location {
    /// Create a location.
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Something that can lie on a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Object {
    /// Garbage waiting to be picked up or burned.
    Debris,
}

/// The two agents sharing the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "usize", try_from = "usize")]
pub enum AgentId {
    /// Agent 0. Picks debris up and drops it elsewhere.
    Collector,

    /// Agent 1. Sweeps the grid and burns debris.
    Burner,
}

impl AgentId {
    /// Both agents, in index order.
    pub const ALL: [AgentId; 2] = [AgentId::Collector, AgentId::Burner];

    /// Position of the agent in the agent list.
    pub fn index(self) -> usize {
        match self {
            AgentId::Collector => 0,
            AgentId::Burner => 1,
        }
    }

    /// Name the agent goes by in belief literals.
    pub fn literal(self) -> &'static str {
        match self {
            AgentId::Collector => "r1",
            AgentId::Burner => "r2",
        }
    }
}

impl From<AgentId> for usize {
    fn from(agent: AgentId) -> Self {
        agent.index()
    }
}

impl TryFrom<usize> for AgentId {
    type Error = String;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        AgentId::ALL
            .get(index)
            .copied()
            .ok_or_else(|| format!("no agent with index {}", index))
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentId::Collector => write!(f, "collector"),
            AgentId::Burner => write!(f, "burner"),
        }
    }
}

/// Mutable per-agent state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentState {
    /// Where the agent stands.
    pub location: Location,

    /// Whether the agent holds debris. Only the collector ever carries.
    pub carrying: bool,

    /// Failed pick (collector) or burn (burner) attempts since the last success.
    pub retries: u32,
}

/// Square grid world holding debris and exactly two agents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridWorld {
    size: usize,
    objects: HashSet<(Object, Location)>,
    agents: [AgentState; 2],
}

impl GridWorld {
    /// Create an empty `size` x `size` grid with both agents at the origin.
    pub fn new(size: usize) -> Result<Self, MarsWorldError> {
        if size == 0 {
            return Err(MarsWorldError::InvalidConfig(
                "grid size must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            size,
            objects: HashSet::default(),
            agents: [AgentState::default(); 2],
        })
    }

    /// Create a grid with both agents at uniformly random cells and `debris_amount` debris at
    /// distinct uniformly random cells.
    ///
    /// The agents may share a cell and may start on top of debris.
    pub fn random<R: rand::Rng>(
        size: usize,
        debris_amount: usize,
        rng: &mut R,
    ) -> Result<Self, MarsWorldError> {
        let mut world = Self::new(size)?;
        let cells = size.checked_mul(size).ok_or_else(|| {
            MarsWorldError::InvalidConfig(format!("{}x{} grid is too large", size, size))
        })?;
        if debris_amount > cells {
            return Err(MarsWorldError::InvalidConfig(format!(
                "cannot place {} debris on a {}x{} grid",
                debris_amount, size, size
            )));
        }

        for agent in AgentId::ALL {
            let location = world.random_location(rng);
            world.set_position(agent, location.x, location.y)?;
            info!(%agent, %location, "placed agent");
        }

        let mut placed = 0;
        while placed < debris_amount {
            let location = world.random_location(rng);
            if world.has_object(Object::Debris, location.x, location.y) {
                debug!(%location, "debris already there, drawing again");
                continue;
            }
            world.place(Object::Debris, location.x, location.y)?;
            info!(%location, "placed debris");
            placed += 1;
        }

        Ok(world)
    }

    fn random_location<R: rand::Rng>(&self, rng: &mut R) -> Location {
        Location {
            x: rng.gen_range(0..self.size),
            y: rng.gen_range(0..self.size),
        }
    }

    /// Width and height of the grid.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Width of the grid.
    pub fn width(&self) -> usize {
        self.size
    }

    /// Height of the grid.
    pub fn height(&self) -> usize {
        self.size
    }

    /// Whether (x, y) lies on the grid.
    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.size && y < self.size
    }

    /// Check that (x, y) lies on the grid.
    pub fn check_bounds(&self, x: usize, y: usize) -> Result<Location, MarsWorldError> {
        if self.in_bounds(x, y) {
            Ok(Location { x, y })
        } else {
            Err(MarsWorldError::OutOfBounds {
                x,
                y,
                size: self.size,
            })
        }
    }

    /// Put an object on a cell. Placing an object that is already there changes nothing.
    pub fn place(&mut self, object: Object, x: usize, y: usize) -> Result<(), MarsWorldError> {
        let location = self.check_bounds(x, y)?;
        self.objects.insert((object, location));
        Ok(())
    }

    /// Take an object off a cell. Removing an object that isn't there changes nothing.
    pub fn remove(&mut self, object: Object, x: usize, y: usize) -> Result<(), MarsWorldError> {
        let location = self.check_bounds(x, y)?;
        self.objects.remove(&(object, location));
        Ok(())
    }

    // Agent locations are always on the grid, so actions place and remove through these.
    pub(crate) fn place_at(&mut self, object: Object, location: Location) {
        self.objects.insert((object, location));
    }

    pub(crate) fn remove_at(&mut self, object: Object, location: Location) {
        self.objects.remove(&(object, location));
    }

    /// Whether the cell holds the object. Cells off the grid hold nothing.
    pub fn has_object(&self, object: Object, x: usize, y: usize) -> bool {
        self.objects.contains(&(object, Location { x, y }))
    }

    /// Number of cells holding the object.
    pub fn count(&self, object: Object) -> usize {
        self.objects.iter().filter(|(o, _)| *o == object).count()
    }

    /// Cells holding the object, row by row.
    pub fn objects(&self, object: Object) -> Vec<Location> {
        let mut locations: Vec<Location> = self
            .objects
            .iter()
            .filter(|(o, _)| *o == object)
            .map(|(_, location)| *location)
            .collect();
        locations.sort_unstable_by_key(|l| (l.y, l.x));
        locations
    }

    /// Where the agent stands.
    pub fn position(&self, agent: AgentId) -> Location {
        self.agents[agent.index()].location
    }

    /// Move the agent to (x, y). Coordinates off the grid are rejected and the agent stays where
    /// it is; they are never clamped.
    pub fn set_position(
        &mut self,
        agent: AgentId,
        x: usize,
        y: usize,
    ) -> Result<(), MarsWorldError> {
        let location = self.check_bounds(x, y)?;
        self.agents[agent.index()].location = location;
        Ok(())
    }

    /// Full state of the agent.
    pub fn agent(&self, agent: AgentId) -> &AgentState {
        &self.agents[agent.index()]
    }

    pub(crate) fn agent_mut(&mut self, agent: AgentId) -> &mut AgentState {
        &mut self.agents[agent.index()]
    }

    /// Whether the agent stands on a cell holding the object.
    pub fn is_on(&self, agent: AgentId, object: Object) -> bool {
        let location = self.position(agent);
        self.has_object(object, location.x, location.y)
    }
}

// print out cells, and row and column numbers which start at 0.
impl std::fmt::Display for GridWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = String::with_capacity((self.size * 2 + 3) * (self.size + 1));

        s.push_str("  ");
        for col in 0..self.size {
            s.push_str(&format!("{}", col % 10));
            if col == self.size - 1 {
                s.push('\n');
            } else {
                s.push(' ');
            }
        }

        let collector = self.agent(AgentId::Collector);
        let burner = self.position(AgentId::Burner);
        for row in 0..self.size {
            s.push_str(&format!("{} ", row % 10));

            for col in 0..self.size {
                let here = Location { x: col, y: row };
                let c = if collector.location == here && burner == here {
                    '*'
                } else if collector.location == here {
                    if collector.carrying {
                        'C'
                    } else {
                        '1'
                    }
                } else if burner == here {
                    '2'
                } else if self.has_object(Object::Debris, col, row) {
                    'D'
                } else {
                    '.'
                };
                s.push(c);
                if col < self.size - 1 {
                    s.push(' ');
                }
            }
            if row < self.size - 1 {
                s.push('\n');
            }
        }
        write!(f, "{}", s)
    }
}
