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

//! Run configuration.

use rand::{Rng as _, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{MarsWorldError, Rng, SearchPattern};

/// Settings fixed for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarsConfig {
    /// Width and height of the square grid.
    pub grid_size: usize,

    /// Debris placed when the world is created.
    pub debris_amount: usize,

    /// Failed pick or burn attempts in a row after which the next attempt always works.
    pub max_errors: u32,

    /// How the burner sweeps the grid.
    pub search_pattern: SearchPattern,

    /// Seed for placement and coin flips. None draws a fresh seed.
    pub seed: Option<u64>,
}

impl MarsConfig {
    /// Create a config.
    pub fn new(
        grid_size: usize,
        debris_amount: usize,
        max_errors: u32,
        search_pattern: SearchPattern,
        seed: Option<u64>,
    ) -> Self {
        Self {
            grid_size,
            debris_amount,
            max_errors,
            search_pattern,
            seed,
        }
    }

    /// Check the config can produce a world: at least one cell, and no more debris than cells.
    pub fn validate(&self) -> Result<(), MarsWorldError> {
        if self.grid_size == 0 {
            return Err(MarsWorldError::InvalidConfig(
                "grid size must be at least 1".to_string(),
            ));
        }
        let cells = self.grid_size.checked_mul(self.grid_size).ok_or_else(|| {
            MarsWorldError::InvalidConfig(format!("grid size {} is too large", self.grid_size))
        })?;
        if self.debris_amount > cells {
            return Err(MarsWorldError::InvalidConfig(format!(
                "cannot place {} debris on a {}x{} grid",
                self.debris_amount, self.grid_size, self.grid_size
            )));
        }
        Ok(())
    }

    /// Random number generator for this run, from the configured seed or a fresh one.
    pub fn rng(&self) -> Rng {
        let seed = self.seed.unwrap_or_else(|| rand::thread_rng().gen());
        info!(seed, "seeding world");
        Rng::seed_from_u64(seed)
    }
}

impl Default for MarsConfig {
    fn default() -> Self {
        Self::new(7, 5, 2, SearchPattern::ZigZagTopDown, None)
    }
}
