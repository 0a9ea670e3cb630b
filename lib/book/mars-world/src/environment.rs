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

//! The environment agents talk to: one action in, percepts out.

use std::sync::Mutex;

use serde::Serialize;
use tracing::{debug, warn};

use crate::actions::{ActionOutcome, ActionResolver, Coin, FairCoin, Percepts};
use crate::grid_world::{AgentId, GridWorld, Object};
use crate::search::{self, SearchController};
use crate::{Environment, MarsConfig, MarsWorldError};

/// An action an agent can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MarsAction {
    /// Burner moves to the next cell of its sweep.
    AdvanceSearch,

    /// Agent steps once toward (x, y).
    MoveToward {
        /// Target column.
        x: usize,
        /// Target row.
        y: usize,
    },

    /// Collector tries to pick up debris.
    Pick,

    /// Collector puts down what it carries.
    Drop,

    /// Burner tries to burn debris.
    Burn,
}

impl MarsAction {
    /// Whether `agent` is allowed to perform this action.
    pub fn permits(self, agent: AgentId) -> bool {
        match self {
            MarsAction::MoveToward { .. } => true,
            MarsAction::Pick | MarsAction::Drop => agent == AgentId::Collector,
            MarsAction::AdvanceSearch | MarsAction::Burn => agent == AgentId::Burner,
        }
    }
}

// Same spelling the parser accepts.
impl std::fmt::Display for MarsAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarsAction::AdvanceSearch => write!(f, "next(slot)"),
            MarsAction::MoveToward { x, y } => write!(f, "move_towards({},{})", x, y),
            MarsAction::Pick => write!(f, "pick(garb)"),
            MarsAction::Drop => write!(f, "drop(garb)"),
            MarsAction::Burn => write!(f, "burn(garb)"),
        }
    }
}

impl std::str::FromStr for MarsAction {
    type Err = MarsWorldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || MarsWorldError::UnknownAction(s.to_string());
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        match compact.as_str() {
            "next(slot)" => return Ok(MarsAction::AdvanceSearch),
            "pick(garb)" => return Ok(MarsAction::Pick),
            "drop(garb)" => return Ok(MarsAction::Drop),
            "burn(garb)" => return Ok(MarsAction::Burn),
            _ => {}
        }

        let args = compact
            .strip_prefix("move_towards(")
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(unknown)?;
        let (x, y) = args.split_once(',').ok_or_else(unknown)?;
        Ok(MarsAction::MoveToward {
            x: x.parse().map_err(|_| unknown())?,
            y: y.parse().map_err(|_| unknown())?,
        })
    }
}

/// The Mars world: grid, sweep controller and action resolver behind one action entry point.
#[derive(Debug)]
pub struct MarsEnvironment {
    world: GridWorld,
    search: SearchController,
    resolver: ActionResolver,
    burned: u32,
}

impl MarsEnvironment {
    /// Create a world with randomly placed agents and debris, as described by `config`.
    pub fn new(config: MarsConfig) -> Result<Self, MarsWorldError> {
        config.validate()?;
        let mut rng = config.rng();
        let world = GridWorld::random(config.grid_size, config.debris_amount, &mut rng)?;
        Ok(Self::from_world(world, &config, FairCoin::new(rng)))
    }

    /// Wrap an existing grid. Grid size and debris amount in `config` are ignored; the grid is
    /// used as is.
    pub fn from_world(
        world: GridWorld,
        config: &MarsConfig,
        coin: impl Coin + Send + 'static,
    ) -> Self {
        Self {
            world,
            search: SearchController::new(config.search_pattern),
            resolver: ActionResolver::new(config.max_errors, coin),
            burned: 0,
        }
    }

    /// The grid.
    pub fn world(&self) -> &GridWorld {
        &self.world
    }

    /// The burner's sweep controller.
    pub fn search(&self) -> &SearchController {
        &self.search
    }

    /// Debris destroyed by burning so far.
    pub fn burned(&self) -> u32 {
        self.burned
    }

    /// No debris left on the grid or in the collector's hands.
    pub fn is_clean(&self) -> bool {
        self.world.count(Object::Debris) == 0 && !self.world.agent(AgentId::Collector).carrying
    }

    /// Execute one action for one agent.
    ///
    /// An agent asking for an action it isn't allowed to do, e.g. the burner picking, is
    /// rejected and nothing changes. Anything else is dispatched, even if it ends up changing
    /// nothing; the outcome says what happened.
    pub fn execute(
        &mut self,
        agent: AgentId,
        action: MarsAction,
    ) -> Result<ActionOutcome, MarsWorldError> {
        if !action.permits(agent) {
            warn!(%agent, %action, "action not permitted");
            return Err(MarsWorldError::NotPermitted { agent, action });
        }

        let outcome = match action {
            MarsAction::AdvanceSearch => ActionOutcome::Moved(self.search.advance(&mut self.world)?),
            MarsAction::MoveToward { x, y } => {
                ActionOutcome::Moved(search::step_toward(&mut self.world, agent, x, y)?)
            }
            MarsAction::Pick => self.resolver.pick(&mut self.world),
            MarsAction::Drop => self.resolver.drop(&mut self.world),
            MarsAction::Burn => {
                let outcome = self.resolver.burn(&mut self.world);
                if outcome == ActionOutcome::Succeeded {
                    self.burned += 1;
                }
                outcome
            }
        };
        debug!(%agent, %action, ?outcome, "executed action");
        Ok(outcome)
    }

    /// What the agents currently see.
    pub fn percepts(&self) -> Percepts {
        Percepts::from_world(&self.world)
    }
}

impl Environment for MarsEnvironment {
    type AgentId = AgentId;
    type Action = MarsAction;
    type Percept = Percepts;
    type Outcome = ActionOutcome;
    type Error = MarsWorldError;
    type Score = u32;

    fn percept(&self) -> Self::Percept {
        self.percepts()
    }

    fn execute_action(
        &mut self,
        agent: Self::AgentId,
        action: &Self::Action,
    ) -> Result<Self::Outcome, Self::Error> {
        self.execute(agent, *action)
    }

    fn score(&self) -> Self::Score {
        self.burned
    }

    fn is_done(&self) -> bool {
        self.is_clean()
    }
}

/// A MarsEnvironment callers on several threads can share. Each action and the percepts that
/// follow it are computed under one lock, so callers never see a half-applied action.
#[derive(Debug)]
pub struct SharedMarsEnvironment {
    inner: Mutex<MarsEnvironment>,
}

impl SharedMarsEnvironment {
    /// Share `environment`.
    pub fn new(environment: MarsEnvironment) -> Self {
        Self {
            inner: Mutex::new(environment),
        }
    }

    /// Execute one action and return its outcome with the percepts right after it.
    pub fn execute(
        &self,
        agent: AgentId,
        action: MarsAction,
    ) -> Result<(ActionOutcome, Percepts), MarsWorldError> {
        let mut environment = self
            .inner
            .lock()
            .map_err(|_| MarsWorldError::LockPoisoned)?;
        let outcome = environment.execute(agent, action)?;
        Ok((outcome, environment.percepts()))
    }

    /// What the agents currently see.
    pub fn percepts(&self) -> Result<Percepts, MarsWorldError> {
        let environment = self
            .inner
            .lock()
            .map_err(|_| MarsWorldError::LockPoisoned)?;
        Ok(environment.percepts())
    }

    /// Stop sharing and hand the environment back.
    pub fn into_inner(self) -> Result<MarsEnvironment, MarsWorldError> {
        self.inner
            .into_inner()
            .map_err(|_| MarsWorldError::LockPoisoned)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::{FixedCoin, Location, SearchPattern};

    fn config() -> MarsConfig {
        MarsConfig::new(3, 1, 2, SearchPattern::LeftRight, Some(42))
    }

    // 3x3 grid, debris at (2, 2), collector on it, burner at the origin.
    fn small_environment(coin: bool) -> MarsEnvironment {
        let mut world = GridWorld::new(3).expect("new failed");
        world.place(Object::Debris, 2, 2).expect("place failed");
        world
            .set_position(AgentId::Collector, 2, 2)
            .expect("set_position failed");
        MarsEnvironment::from_world(world, &config(), FixedCoin(coin))
    }

    #[test]
    fn test_new_places_configured_debris() {
        let config = MarsConfig::new(5, 7, 2, SearchPattern::ZigZagLeftRight, Some(1));
        let environment = MarsEnvironment::new(config).expect("new failed");
        assert_eq!(environment.world().size(), 5);
        assert_eq!(environment.world().count(Object::Debris), 7);
        assert_eq!(
            environment.search().pattern(),
            SearchPattern::ZigZagLeftRight
        );
    }

    #[test]
    fn test_same_seed_gives_same_world() {
        let a = MarsEnvironment::new(config()).expect("new failed");
        let b = MarsEnvironment::new(config()).expect("new failed");
        assert_eq!(a.world(), b.world());
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = MarsConfig::new(2, 5, 2, SearchPattern::LeftRight, Some(1));
        assert!(matches!(
            MarsEnvironment::new(config),
            Err(MarsWorldError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_forced_pick_scenario() {
        let mut environment = small_environment(true);
        assert_eq!(
            environment.execute(AgentId::Collector, MarsAction::Pick),
            Ok(ActionOutcome::Succeeded)
        );
        assert!(environment.world().agent(AgentId::Collector).carrying);
        assert!(!environment.world().has_object(Object::Debris, 2, 2));

        let percepts = environment.percepts();
        assert_eq!(percepts.position(AgentId::Collector), Location::new(2, 2));
        assert!(!percepts.has_debris_underfoot(AgentId::Collector));
        assert!(!percepts
            .literals()
            .iter()
            .any(|literal| literal == "garbage(r1)"));
        assert!(!environment.is_clean());
    }

    #[test]
    fn test_role_mismatch_is_rejected_without_changes() {
        let mut environment = small_environment(true);
        environment
            .execute(AgentId::Collector, MarsAction::Pick)
            .expect("pick failed");
        let before = environment.world().clone();

        for (agent, action) in [
            (AgentId::Burner, MarsAction::Pick),
            (AgentId::Burner, MarsAction::Drop),
            (AgentId::Collector, MarsAction::Burn),
            (AgentId::Collector, MarsAction::AdvanceSearch),
        ] {
            assert_eq!(
                environment.execute(agent, action),
                Err(MarsWorldError::NotPermitted { agent, action })
            );
        }
        assert_eq!(environment.world(), &before);
    }

    #[test]
    fn test_both_agents_may_move_toward() {
        let mut environment = small_environment(true);
        assert_eq!(
            environment.execute(AgentId::Burner, MarsAction::MoveToward { x: 2, y: 0 }),
            Ok(ActionOutcome::Moved(Location::new(1, 0)))
        );
        assert_eq!(
            environment.execute(AgentId::Collector, MarsAction::MoveToward { x: 0, y: 0 }),
            Ok(ActionOutcome::Moved(Location::new(1, 1)))
        );
    }

    #[test]
    fn test_move_toward_off_grid_is_rejected() {
        let mut environment = small_environment(true);
        assert_eq!(
            environment.execute(AgentId::Collector, MarsAction::MoveToward { x: 3, y: 3 }),
            Err(MarsWorldError::OutOfBounds { x: 3, y: 3, size: 3 })
        );
        assert_eq!(
            environment.world().position(AgentId::Collector),
            Location::new(2, 2)
        );
    }

    #[test]
    fn test_burn_scores_and_cleans() {
        let mut environment = small_environment(false);
        environment
            .execute(AgentId::Burner, MarsAction::MoveToward { x: 2, y: 2 })
            .expect("move failed");
        environment
            .execute(AgentId::Burner, MarsAction::MoveToward { x: 2, y: 2 })
            .expect("move failed");
        assert!(environment.percepts().has_debris_underfoot(AgentId::Burner));

        assert_eq!(
            environment.execute(AgentId::Burner, MarsAction::Burn),
            Ok(ActionOutcome::Failed { retries: 1 })
        );
        assert_eq!(
            environment.execute(AgentId::Burner, MarsAction::Burn),
            Ok(ActionOutcome::Failed { retries: 2 })
        );
        assert_eq!(environment.score(), 0);
        assert_eq!(
            environment.execute(AgentId::Burner, MarsAction::Burn),
            Ok(ActionOutcome::Succeeded)
        );
        assert_eq!(environment.score(), 1);
        assert!(environment.is_clean());
        assert!(environment.is_done());
    }

    #[test]
    fn test_advance_search_moves_burner_only() {
        let mut environment = small_environment(true);
        assert_eq!(
            environment.execute(AgentId::Burner, MarsAction::AdvanceSearch),
            Ok(ActionOutcome::Moved(Location::new(1, 0)))
        );
        assert_eq!(
            environment.world().position(AgentId::Collector),
            Location::new(2, 2)
        );
    }

    #[test]
    fn test_parse_action_names() {
        assert_eq!("next(slot)".parse(), Ok(MarsAction::AdvanceSearch));
        assert_eq!("pick(garb)".parse(), Ok(MarsAction::Pick));
        assert_eq!("drop(garb)".parse(), Ok(MarsAction::Drop));
        assert_eq!("burn(garb)".parse(), Ok(MarsAction::Burn));
        assert_eq!(
            "move_towards(3, 4)".parse(),
            Ok(MarsAction::MoveToward { x: 3, y: 4 })
        );
        for action in [
            MarsAction::AdvanceSearch,
            MarsAction::MoveToward { x: 6, y: 0 },
            MarsAction::Pick,
            MarsAction::Drop,
            MarsAction::Burn,
        ] {
            assert_eq!(action.to_string().parse(), Ok(action));
        }
    }

    #[test]
    fn test_unknown_action_names_are_not_handled() {
        for name in ["fly(away)", "move_towards(1)", "move_towards(a,b)", "pick", ""] {
            assert_eq!(
                name.parse::<MarsAction>(),
                Err(MarsWorldError::UnknownAction(name.to_string()))
            );
        }
    }

    #[test]
    fn test_shared_execute_returns_percepts_after_the_action() {
        let config = MarsConfig::new(5, 10, 2, SearchPattern::ZigZagTopDown, Some(9));
        let shared = SharedMarsEnvironment::new(MarsEnvironment::new(config).expect("new failed"));

        let (outcome, percepts) = shared
            .execute(AgentId::Burner, MarsAction::AdvanceSearch)
            .expect("advance failed");
        let ActionOutcome::Moved(location) = outcome else {
            panic!("unexpected outcome: {:?}", outcome);
        };
        assert_eq!(percepts.position(AgentId::Burner), location);
        assert_eq!(shared.percepts().expect("percepts failed"), percepts);

        let environment = shared.into_inner().expect("lock poisoned");
        assert_eq!(environment.percepts(), percepts);
    }

    #[test]
    fn test_shared_environment_serializes_callers() {
        let config = MarsConfig::new(5, 10, 2, SearchPattern::ZigZagTopDown, Some(9));
        let shared = SharedMarsEnvironment::new(MarsEnvironment::new(config).expect("new failed"));

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for _ in 0..200 {
                    let (_, percepts) = shared
                        .execute(AgentId::Burner, MarsAction::AdvanceSearch)
                        .expect("advance failed");
                    if percepts.has_debris_underfoot(AgentId::Burner) {
                        shared
                            .execute(AgentId::Burner, MarsAction::Burn)
                            .expect("burn failed");
                    }
                }
            });
            scope.spawn(|| {
                for i in 0..200 {
                    let percepts = shared.percepts().expect("percepts failed");
                    let action = if percepts.has_debris_underfoot(AgentId::Collector) {
                        MarsAction::Pick
                    } else if i % 7 == 0 {
                        MarsAction::Drop
                    } else {
                        MarsAction::MoveToward { x: i % 5, y: (i / 5) % 5 }
                    };
                    shared
                        .execute(AgentId::Collector, action)
                        .expect("collector action failed");
                }
            });
        });

        let environment = shared.into_inner().expect("lock poisoned");
        let carried = usize::from(environment.world().agent(AgentId::Collector).carrying);
        let remaining = environment.world().count(Object::Debris) + carried;
        assert!(remaining + environment.burned() as usize <= 10);
    }

    fn any_action() -> impl Strategy<Value = (AgentId, MarsAction)> {
        let agent = prop_oneof![Just(AgentId::Collector), Just(AgentId::Burner)];
        let action = prop_oneof![
            Just(MarsAction::AdvanceSearch),
            (0..5usize, 0..5usize).prop_map(|(x, y)| MarsAction::MoveToward { x, y }),
            Just(MarsAction::Pick),
            Just(MarsAction::Drop),
            Just(MarsAction::Burn),
        ];
        (agent, action)
    }

    proptest! {
        #[test]
        fn test_debris_is_never_created(
            seed in any::<u64>(),
            actions in prop::collection::vec(any_action(), 1..200),
        ) {
            let config = MarsConfig::new(5, 6, 2, SearchPattern::ZigZagTopDown, Some(seed));
            let mut environment = MarsEnvironment::new(config).expect("new failed");

            let debris_held = |environment: &MarsEnvironment| {
                environment.world().count(Object::Debris)
                    + usize::from(environment.world().agent(AgentId::Collector).carrying)
            };

            let mut previous = debris_held(&environment);
            for (agent, action) in actions {
                let result = environment.execute(agent, action);
                prop_assert_eq!(result.is_ok(), action.permits(agent));

                let current = debris_held(&environment);
                prop_assert!(current <= previous);
                previous = current;

                for agent in AgentId::ALL {
                    let Location { x, y } = environment.world().position(agent);
                    prop_assert!(environment.world().in_bounds(x, y));
                }
                prop_assert!(environment.world().agent(AgentId::Collector).retries <= 2);
                prop_assert!(environment.world().agent(AgentId::Burner).retries <= 2);
            }
        }
    }
}
