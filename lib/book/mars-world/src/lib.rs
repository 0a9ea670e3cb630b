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

#![warn(missing_docs)]

//! Mars world.
//!
//! A small square grid shared by two agents. The burner sweeps the grid cell by cell and burns
//! any debris it stands on; the collector picks debris up and carries it to the burner. Picking
//! and burning sometimes fail, but never more than a configured number of times in a row.
//!
//! This crate is the world model only: the grid, the sweep patterns, the action resolver and the
//! percepts handed back to whoever decides what the agents do next.
//!
//! See:
//! -  Chapter 2: Intelligent Agents, multi-agent environments

// PEAS - Performance, Environment, Action, Sensing

use num_traits::Zero;
use tracing::warn;

pub mod actions;
pub mod agents;
pub mod config;
pub mod environment;
pub mod grid_world;
pub mod search;

pub use actions::{ActionOutcome, ActionResolver, Coin, FairCoin, FixedCoin, Percepts};
pub use config::MarsConfig;
pub use environment::{MarsAction, MarsEnvironment, SharedMarsEnvironment};
pub use grid_world::{AgentId, AgentState, GridWorld, Location, Object};
pub use search::{SearchController, SearchPattern};

/// Random number generator used everywhere in the world. Seedable so runs can be replayed.
pub type Rng = rand_pcg::Pcg64;

/// Hash set used for cell occupancy.
pub type HashSet<T> = rustc_hash::FxHashSet<T>;

/// Mars world error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarsWorldError {
    /// Action name is not one the environment knows how to execute.
    #[error("unknown action: {0}")]
    UnknownAction(String),

    /// Agent is not allowed to perform this action, e.g. the burner cannot pick.
    #[error("{agent} is not permitted to {action}")]
    NotPermitted {
        /// The agent that asked.
        agent: AgentId,
        /// The action it asked for.
        action: MarsAction,
    },

    /// Coordinates fall outside the grid.
    #[error("({x}, {y}) is outside the {size}x{size} grid")]
    OutOfBounds {
        /// Requested x.
        x: usize,
        /// Requested y.
        y: usize,
        /// Grid width and height.
        size: usize,
    },

    /// Configuration can never produce a valid world.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// A thread panicked while holding the shared environment.
    #[error("environment lock poisoned")]
    LockPoisoned,
}

/// An Agent acts in a Performance, Environment, Action, Sensing (PEAS) cycle.
/// For a given Perception, the Agent will return an Action, or None to let its turn pass.
///
/// Notice that the Agent is not aware of an Environment, it's only interface
/// is the Perception coming in then the Action going out.
pub trait Agent {
    /// Action the agent asks the environment to perform.
    type Action;

    /// What the agent senses before acting.
    type Percept;

    /// Decide what to do next.
    fn act(&mut self, percept: &Self::Percept) -> Option<Self::Action>;
}

/// An Environment runs several Agents in a Performance, Environment, Action, Sensing (PEAS)
/// cycle. Every action is attributed to the agent performing it.
///
/// Notice that the Environment is not aware of the Agents' decision logic.
pub trait Environment {
    /// Identifies which agent is acting.
    type AgentId: Copy + std::fmt::Display;
    /// Action an agent may request.
    type Action;
    /// Snapshot handed to agents.
    type Percept;
    /// Result of an action that was dispatched.
    type Outcome;
    /// Dispatch error.
    type Error: std::fmt::Display;
    /// Performance measure.
    type Score: num_traits::NumAssign + Copy;

    /// Current percept, shared by all agents.
    fn percept(&self) -> Self::Percept;

    /// Execute one action on behalf of one agent.
    fn execute_action(
        &mut self,
        agent: Self::AgentId,
        action: &Self::Action,
    ) -> Result<Self::Outcome, Self::Error>;

    /// Returns the score of the Environment. This is not cumulative or stateful. This is the score
    /// of the Environment at the current state.
    fn score(&self) -> Self::Score;

    /// Whether there is nothing left to do.
    fn is_done(&self) -> bool;
}

/// Agent boxed together with the percept and action types of an environment.
pub type BoxedAgent<_Environment> = Box<
    dyn Agent<
        Action = <_Environment as Environment>::Action,
        Percept = <_Environment as Environment>::Percept,
    >,
>;

/// A Simulation runs Agents in multiple Performance, Environment, Action, Sensing (PEAS)
/// cycles. The score (Performance) is continually kept up to date.
///
/// In one time step every agent, in order, receives a fresh percept and gets to act once.
pub struct Simulation<_Environment>
where
    _Environment: Environment,
{
    environment: _Environment,
    agents: Vec<(_Environment::AgentId, BoxedAgent<_Environment>)>,
    time_steps: u32,
    steps_taken: u32,
    score: _Environment::Score,
}

impl<_Environment> Simulation<_Environment>
where
    _Environment: Environment,
{
    /// Create a simulation that runs for at most `time_steps` steps.
    pub fn new(
        environment: _Environment,
        agents: Vec<(_Environment::AgentId, BoxedAgent<_Environment>)>,
        time_steps: u32,
    ) -> Self {
        Self {
            environment,
            agents,
            time_steps,
            steps_taken: 0,
            score: _Environment::Score::zero(),
        }
    }

    /// Run one time step. Returns false, without doing anything, once the time steps are used up
    /// or the environment is done.
    ///
    /// A failed action does not cut the step short: the remaining agents still act and the step is
    /// counted and scored. The first failure is then returned.
    pub fn step(&mut self) -> Result<bool, _Environment::Error> {
        if self.steps_taken >= self.time_steps || self.environment.is_done() {
            return Ok(false);
        }
        let mut first_error = None;
        for (agent_id, agent) in self.agents.iter_mut() {
            let percept = self.environment.percept();
            if let Some(action) = agent.act(&percept) {
                if let Err(error) = self.environment.execute_action(*agent_id, &action) {
                    warn!(agent = %agent_id, %error, "action failed");
                    first_error.get_or_insert(error);
                }
            }
        }
        self.steps_taken += 1;
        self.score += self.environment.score();
        match first_error {
            Some(error) => Err(error),
            None => Ok(true),
        }
    }

    /// Run until the time steps are used up or the environment is done.
    pub fn run(&mut self) -> Result<(), _Environment::Error> {
        while self.step()? {}
        Ok(())
    }

    /// Cumulative score.
    pub fn score(&self) -> _Environment::Score {
        self.score
    }

    /// Number of time steps run so far.
    pub fn steps_taken(&self) -> u32 {
        self.steps_taken
    }

    /// The environment being simulated.
    pub fn environment(&self) -> &_Environment {
        &self.environment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Repeat(MarsAction);

    impl Agent for Repeat {
        type Action = MarsAction;
        type Percept = Percepts;

        fn act(&mut self, _percept: &Self::Percept) -> Option<Self::Action> {
            Some(self.0)
        }
    }

    #[test]
    fn test_failed_action_still_counts_the_step() {
        let mut world = GridWorld::new(5).expect("new failed");
        world.place(Object::Debris, 4, 0).expect("place failed");
        let config = MarsConfig::new(5, 1, 2, SearchPattern::ZigZagTopDown, None);
        let environment = MarsEnvironment::from_world(world, &config, FixedCoin(true));

        let collector: BoxedAgent<MarsEnvironment> =
            Box::new(Repeat(MarsAction::MoveToward { x: 4, y: 4 }));
        let burner: BoxedAgent<MarsEnvironment> = Box::new(Repeat(MarsAction::Pick));
        let mut simulation = Simulation::new(
            environment,
            vec![(AgentId::Collector, collector), (AgentId::Burner, burner)],
            10,
        );

        for step in 1..=3 {
            assert_eq!(
                simulation.step(),
                Err(MarsWorldError::NotPermitted {
                    agent: AgentId::Burner,
                    action: MarsAction::Pick,
                })
            );
            assert_eq!(simulation.steps_taken(), step);
            assert_eq!(
                simulation.environment().world().position(AgentId::Collector),
                Location::new(step as usize, step as usize)
            );
        }
        assert_eq!(simulation.score(), 0);
    }

    #[test]
    fn test_run_stops_at_first_failed_step() {
        let mut world = GridWorld::new(3).expect("new failed");
        world.place(Object::Debris, 2, 2).expect("place failed");
        let config = MarsConfig::new(3, 1, 2, SearchPattern::LeftRight, None);
        let environment = MarsEnvironment::from_world(world, &config, FixedCoin(true));

        let burner: BoxedAgent<MarsEnvironment> = Box::new(Repeat(MarsAction::Drop));
        let mut simulation = Simulation::new(environment, vec![(AgentId::Burner, burner)], 10);

        assert!(simulation.run().is_err());
        assert_eq!(simulation.steps_taken(), 1);
    }
}
