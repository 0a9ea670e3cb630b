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

//! Simple reflex agents for driving a simulation.

use rand::Rng as _;

use crate::{Agent, AgentId, Location, MarsAction, Percepts, Rng};

/// Burns debris when standing on it, otherwise keeps sweeping.
#[derive(Debug, Default)]
pub struct SweepingBurner {}

impl SweepingBurner {
    /// Create the agent.
    pub fn new() -> Self {
        Self {}
    }
}

impl Agent for SweepingBurner {
    type Action = MarsAction;
    type Percept = Percepts;

    fn act(&mut self, percept: &Self::Percept) -> Option<Self::Action> {
        if percept.has_debris_underfoot(AgentId::Burner) {
            Some(MarsAction::Burn)
        } else {
            Some(MarsAction::AdvanceSearch)
        }
    }
}

/// Wanders until it finds debris, picks it up and carries it toward the burner. Once the burner is
/// at most one cell away the debris is dropped; the burner's sweep reaches every cell, so it will
/// get burned.
///
/// Percepts don't say whether the collector is carrying, so it remembers where it last tried to
/// pick: if the debris is gone from that cell on the next turn, the pick worked. It also leaves
/// alone the debris it dropped until the burner has stood on that cell.
#[derive(Debug)]
pub struct ReflexCollector {
    rng: Rng,
    grid_size: usize,
    target: Option<Location>,
    picking_at: Option<Location>,
    carrying: bool,
    left_for_burner: Vec<Location>,
}

impl ReflexCollector {
    /// Create the agent. `rng` picks wander targets on a `grid_size` grid.
    pub fn new(rng: Rng, grid_size: usize) -> Self {
        Self {
            rng,
            grid_size,
            target: None,
            picking_at: None,
            carrying: false,
            left_for_burner: vec![],
        }
    }

    fn wander(&mut self, here: Location) -> Option<MarsAction> {
        if self.grid_size == 0 {
            return None;
        }
        let target = match self.target {
            Some(target) if target != here => target,
            _ => {
                let target = Location::new(
                    self.rng.gen_range(0..self.grid_size),
                    self.rng.gen_range(0..self.grid_size),
                );
                self.target = Some(target);
                target
            }
        };
        if target == here {
            return None;
        }
        Some(MarsAction::MoveToward {
            x: target.x,
            y: target.y,
        })
    }
}

impl Agent for ReflexCollector {
    type Action = MarsAction;
    type Percept = Percepts;

    fn act(&mut self, percept: &Self::Percept) -> Option<Self::Action> {
        let here = percept.position(AgentId::Collector);
        let burner = percept.position(AgentId::Burner);
        let debris_here = percept.has_debris_underfoot(AgentId::Collector);

        self.left_for_burner.retain(|&cell| cell != burner);

        if let Some(picked_at) = self.picking_at.take() {
            if picked_at == here && !debris_here {
                self.carrying = true;
            }
        }

        if self.carrying {
            if here.x.abs_diff(burner.x) <= 1 && here.y.abs_diff(burner.y) <= 1 {
                self.carrying = false;
                self.left_for_burner.push(here);
                return Some(MarsAction::Drop);
            }
            return Some(MarsAction::MoveToward {
                x: burner.x,
                y: burner.y,
            });
        }

        if debris_here && !self.left_for_burner.contains(&here) {
            self.picking_at = Some(here);
            return Some(MarsAction::Pick);
        }

        self.wander(here)
    }
}
