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

//! Picking, dropping and burning debris, and the percepts the agents get back.

use rand::{Rng as _, SeedableRng};
use serde::Serialize;
use tracing::debug;

use crate::{AgentId, GridWorld, Location, Object, Rng};

/// Source of the coin flips that decide whether a pick or burn works.
pub trait Coin {
    /// Heads means the action works.
    fn flip(&mut self) -> bool;
}

/// A fair coin.
#[derive(Debug, Clone)]
pub struct FairCoin {
    rng: Rng,
}

impl FairCoin {
    /// Fair coin drawing from `rng`.
    pub fn new(rng: Rng) -> Self {
        Self { rng }
    }

    /// Fair coin with its own generator seeded from `seed`.
    pub fn from_seed(seed: u64) -> Self {
        Self::new(Rng::seed_from_u64(seed))
    }
}

impl Coin for FairCoin {
    fn flip(&mut self) -> bool {
        self.rng.gen_bool(0.5)
    }
}

/// A coin that always lands the same way. Heads forces every attempt to work, tails forces every
/// attempt to fail until the retry limit kicks in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedCoin(pub bool);

impl Coin for FixedCoin {
    fn flip(&mut self) -> bool {
        self.0
    }
}

/// What an action did to the world. None of these are errors: a failed pick is a normal outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ActionOutcome {
    /// The agent now stands at this location.
    Moved(Location),

    /// Pick or burn on a cell without debris. Nothing changed.
    NoDebris,

    /// Pick or burn removed the debris.
    Succeeded,

    /// Pick or burn did not work this time. `retries` failed attempts in a row so far.
    Failed {
        /// Failed attempts since the last success.
        retries: u32,
    },

    /// Carried debris was put down here.
    Dropped(Location),

    /// Drop without carrying anything. Nothing changed.
    NotCarrying,
}

/// Resolves pick, drop and burn against the grid.
///
/// Picking and burning work on a coin flip, but the retry counter bounds the bad luck: once an
/// agent has failed `max_errors` times in a row the next attempt always works.
pub struct ActionResolver {
    max_errors: u32,
    coin: Box<dyn Coin + Send>,
}

impl std::fmt::Debug for ActionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionResolver")
            .field("max_errors", &self.max_errors)
            .finish_non_exhaustive()
    }
}

impl ActionResolver {
    /// Create a resolver.
    pub fn new(max_errors: u32, coin: impl Coin + Send + 'static) -> Self {
        Self {
            max_errors,
            coin: Box::new(coin),
        }
    }

    /// Failed attempts after which the next attempt always works.
    pub fn max_errors(&self) -> u32 {
        self.max_errors
    }

    /// Collector tries to pick up the debris it stands on.
    pub fn pick(&mut self, world: &mut GridWorld) -> ActionOutcome {
        let outcome = self.attempt(world, AgentId::Collector);
        if outcome == ActionOutcome::Succeeded {
            world.agent_mut(AgentId::Collector).carrying = true;
        }
        outcome
    }

    /// Burner tries to burn the debris it stands on.
    pub fn burn(&mut self, world: &mut GridWorld) -> ActionOutcome {
        self.attempt(world, AgentId::Burner)
    }

    /// Collector puts down what it carries on its own cell. Always works when carrying.
    pub fn drop(&self, world: &mut GridWorld) -> ActionOutcome {
        let collector = world.agent(AgentId::Collector);
        if !collector.carrying {
            return ActionOutcome::NotCarrying;
        }
        let location = collector.location;
        world.agent_mut(AgentId::Collector).carrying = false;
        world.place_at(Object::Debris, location);
        debug!(%location, "collector dropped debris");
        ActionOutcome::Dropped(location)
    }

    fn attempt(&mut self, world: &mut GridWorld, agent: AgentId) -> ActionOutcome {
        if !world.is_on(agent, Object::Debris) {
            return ActionOutcome::NoDebris;
        }

        let heads = self.coin.flip();
        let state = world.agent_mut(agent);
        if heads || state.retries >= self.max_errors {
            state.retries = 0;
            let location = state.location;
            world.remove_at(Object::Debris, location);
            debug!(%agent, %location, "removed debris");
            ActionOutcome::Succeeded
        } else {
            state.retries += 1;
            debug!(%agent, retries = state.retries, "attempt failed");
            ActionOutcome::Failed {
                retries: state.retries,
            }
        }
    }
}

/// Where an agent stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PositionPercept {
    /// Which agent.
    pub agent: AgentId,
    /// Column.
    pub x: usize,
    /// Row.
    pub y: usize,
}

/// Whether an agent stands on debris.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DebrisPercept {
    /// Which agent.
    pub agent: AgentId,
    /// Whether its cell holds debris.
    pub has_debris_underfoot: bool,
}

/// Everything the agents get to see after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Percepts {
    /// One per agent, in agent order.
    pub positions: [PositionPercept; 2],
    /// One per agent, in agent order.
    pub debris: [DebrisPercept; 2],
}

impl Percepts {
    /// Derive the percepts from the grid. Nothing but the grid is consulted.
    pub fn from_world(world: &GridWorld) -> Self {
        let position = |agent: AgentId| {
            let Location { x, y } = world.position(agent);
            PositionPercept { agent, x, y }
        };
        let debris = |agent: AgentId| DebrisPercept {
            agent,
            has_debris_underfoot: world.is_on(agent, Object::Debris),
        };
        Self {
            positions: [position(AgentId::Collector), position(AgentId::Burner)],
            debris: [debris(AgentId::Collector), debris(AgentId::Burner)],
        }
    }

    /// Where the agent stands.
    pub fn position(&self, agent: AgentId) -> Location {
        let percept = self.positions[agent.index()];
        Location::new(percept.x, percept.y)
    }

    /// Whether the agent stands on debris.
    pub fn has_debris_underfoot(&self, agent: AgentId) -> bool {
        self.debris[agent.index()].has_debris_underfoot
    }

    /// The percepts as belief literals, e.g. `pos(r1,2,3)` and `garbage(r2)`. Agents not on
    /// debris get no `garbage` literal at all.
    pub fn literals(&self) -> Vec<String> {
        let mut literals: Vec<String> = self
            .positions
            .iter()
            .map(|p| format!("pos({},{},{})", p.agent.literal(), p.x, p.y))
            .collect();
        literals.extend(
            self.debris
                .iter()
                .filter(|d| d.has_debris_underfoot)
                .map(|d| format!("garbage({})", d.agent.literal())),
        );
        literals
    }
}
