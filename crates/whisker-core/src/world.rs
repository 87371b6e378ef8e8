//! The world orchestrator: fixed-rate ticks, the decision protocol, collisions and food.
//!
//! A world is driven by exactly two entry points, [`World::tick`] from the scheduler and
//! [`World::handle_response`] for each decision that comes back. Both run to completion
//! without waiting on anything, and nothing else mutates the world.

use tracing::{debug, info, warn};

use crate::config::{BoxSpec, FoodRuleset, SpawnSpec, WorldConfig};
use crate::reward::RewardBreakdown;
use crate::rng::{derive_seed, DeterministicRng, SplitMix64};
use crate::{
    Action, Agent, AgentId, AgentState, DecisionResponse, EventSink, Food, FoodKind, Freshness,
    Outbound, SensedKind, Segment, SimError, Vec2,
};

const FOOD_STREAM: u64 = 1;
const ID_STREAM: u64 = 2;

/// Slack on the eat distance so food placed exactly at touching range is reachable.
const CONTACT_EPSILON: f64 = 1e-9;

/// Nearest obstruction along a cast segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub kind: SensedKind,
    pub ua: f64,
    pub point: Vec2,
}

/// What one applied decision did.
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    pub agent: AgentId,
    pub action: Action,
    /// The move crossed a wall and was undone.
    pub blocked: bool,
    pub eaten: Option<FoodKind>,
    pub reward: RewardBreakdown,
    pub transition_reported: bool,
}

pub struct World {
    config: WorldConfig,
    walls: Vec<Segment>,
    foods: Vec<Food>,
    agents: Vec<Agent>,
    food_rng: SplitMix64,
    id_rng: SplitMix64,
    tick: u64,
}

impl World {
    /// Build the arena described by `config`: outer and interior walls, agents, initial food.
    pub fn new(config: WorldConfig) -> Result<Self, SimError> {
        config.validate()?;

        let mut world = Self::bare(config);
        let c = world.config.clone();

        if c.pad > 0.0 {
            world.add_box(BoxSpec {
                x: c.pad,
                y: c.pad,
                w: c.width - c.pad * 2.0,
                h: c.height - c.pad * 2.0,
                sides: BoxSpec::ALL,
            });
        }
        for spec in &c.interior_boxes {
            world.add_box(*spec);
        }
        world.restock_food();
        for spec in &c.agents {
            world.spawn_agent(spec);
        }

        info!(
            walls = world.walls.len(),
            agents = world.agents.len(),
            food = world.foods.len(),
            "world created"
        );
        Ok(world)
    }

    /// A world with the config's bounds and rules but no walls, food or agents yet.
    pub fn bare(config: WorldConfig) -> Self {
        let food_rng = SplitMix64::new(derive_seed(config.seed, FOOD_STREAM));
        let id_rng = SplitMix64::new(derive_seed(config.seed, ID_STREAM));
        Self {
            config,
            walls: Vec::new(),
            foods: Vec::new(),
            agents: Vec::new(),
            food_rng,
            id_rng,
            tick: 0,
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn walls(&self) -> &[Segment] {
        &self.walls
    }

    pub fn foods(&self) -> &[Food] {
        &self.foods
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id == id)
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn add_wall(&mut self, wall: Segment) {
        self.walls.push(wall);
    }

    /// Add the selected sides of an axis-aligned box, in top/right/bottom/left order.
    pub fn add_box(&mut self, spec: BoxSpec) {
        let BoxSpec { x, y, w, h, sides } = spec;
        let corners = [
            Vec2::new(x, y),
            Vec2::new(x + w, y),
            Vec2::new(x + w, y + h),
            Vec2::new(x, y + h),
        ];
        for (side, bit) in [BoxSpec::TOP, BoxSpec::RIGHT, BoxSpec::BOTTOM, BoxSpec::LEFT]
            .into_iter()
            .enumerate()
        {
            if sides & bit != 0 {
                self.walls
                    .push(Segment::new(corners[side], corners[(side + 1) % 4]));
            }
        }
    }

    pub fn add_food(&mut self, food: Food) {
        self.foods.push(food);
    }

    /// Insert a ready-made agent and cast its eyes. An agent whose id is taken is not added.
    pub fn add_agent(&mut self, mut agent: Agent) -> Result<AgentId, SimError> {
        if self.agent(agent.id).is_some() {
            return Err(SimError::InvalidConfig(format!(
                "duplicate agent id {}",
                agent.id
            )));
        }
        sense(&mut agent, &self.walls, &self.foods);
        agent.last_observation = agent.observation();
        let id = agent.id;
        self.agents.push(agent);
        Ok(id)
    }

    pub fn spawn_agent(&mut self, spec: &SpawnSpec) -> AgentId {
        let id = loop {
            let candidate = AgentId(self.id_rng.next_u64());
            if self.agent(candidate).is_none() {
                break candidate;
            }
        };
        let mut agent = Agent::new(id, spec.name.clone(), spec.position, self.config.eyes.build())
            .with_radius(spec.radius)
            .with_angle(spec.angle)
            .with_exploration(self.config.exploration);
        sense(&mut agent, &self.walls, &self.foods);
        agent.last_observation = agent.observation();
        self.agents.push(agent);
        id
    }

    /// Announce every agent to the decision-maker.
    pub fn register_agents(&self, sink: &mut dyn EventSink) {
        for agent in &self.agents {
            sink.send(Outbound::Register { agent: agent.id });
        }
    }

    /// Nearest wall and/or food crossed by the segment `p1 -> p2`.
    pub fn cast(&self, p1: Vec2, p2: Vec2, check_walls: bool, check_food: bool) -> Option<Hit> {
        let walls: &[Segment] = if check_walls { &self.walls } else { &[] };
        let foods: &[Food] = if check_food { &self.foods } else { &[] };
        cast(walls, foods, &Segment::new(p1, p2))
    }

    /// Recast one agent's eyes against the current world.
    pub fn sense_agent(&mut self, id: AgentId) -> Result<(), SimError> {
        let agent = self
            .agents
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(SimError::UnknownAgent(id))?;
        sense(agent, &self.walls, &self.foods);
        Ok(())
    }

    /// One fixed-rate tick: age food, expire stale requests, ask every ready agent to decide.
    pub fn tick(&mut self, sink: &mut dyn EventSink) {
        self.tick += 1;
        self.age_food();

        if let Some(limit) = self.config.decision_timeout_ticks {
            for agent in &mut self.agents {
                if let AgentState::Waiting { since_tick } = agent.state {
                    if self.tick.saturating_sub(since_tick) > limit {
                        warn!(
                            agent = %agent.id,
                            waited = self.tick - since_tick,
                            "decision timed out; agent stays put"
                        );
                        agent.state = AgentState::Ready;
                    }
                }
            }
        }

        for agent in &mut self.agents {
            if !agent.is_ready() {
                continue;
            }
            agent.state = AgentState::Waiting {
                since_tick: self.tick,
            };
            agent.last_observation = agent.observation();
            sink.send(Outbound::DecisionRequest {
                agent: agent.id,
                observation: agent.last_observation.clone(),
                exploration: agent.exploration,
            });
        }
    }

    /// Return every waiting agent to Ready so the next tick asks again.
    ///
    /// Requests sent while no decision-maker was listening are lost; call this when one attaches.
    pub fn release_waiting(&mut self) -> usize {
        let mut released = 0;
        for agent in &mut self.agents {
            if let AgentState::Waiting { .. } = agent.state {
                agent.state = AgentState::Ready;
                released += 1;
            }
        }
        if released > 0 {
            info!(released, "waiting agents released");
        }
        released
    }

    /// Apply a decision: move, collide, eat, score, re-sense and report.
    ///
    /// Unknown agents and out-of-range actions are refused without touching the world; a refused
    /// action leaves the agent waiting.
    pub fn handle_response(
        &mut self,
        response: DecisionResponse,
        sink: &mut dyn EventSink,
    ) -> Result<StepReport, SimError> {
        let Some(agent) = self.agents.iter_mut().find(|a| a.id == response.agent) else {
            warn!(agent = %response.agent, "decision for unknown agent ignored");
            return Err(SimError::UnknownAgent(response.agent));
        };
        let action = Action::from_index(response.action_index).inspect_err(|_| {
            warn!(
                agent = %agent.id,
                index = response.action_index,
                "action index rejected; agent keeps waiting"
            );
        })?;
        if agent.is_ready() {
            debug!(agent = %agent.id, "decision arrived without an outstanding request");
        }

        let before = agent.last_observation.clone();
        let old_position = agent.position;
        agent.apply_action(action);

        let blocked = cast(&self.walls, &[], &Segment::new(old_position, agent.position)).is_some();
        if blocked {
            agent.position = old_position;
        }
        agent.position = Vec2::new(
            agent.position.x.clamp(0.0, self.config.width),
            agent.position.y.clamp(0.0, self.config.height),
        );

        let eaten_index = self.foods.iter().position(|f| {
            agent.position.distance(f.position) <= f.radius + agent.radius + CONTACT_EPSILON
                && cast(&self.walls, &[], &Segment::new(agent.position, f.position)).is_none()
        });
        let eaten = eaten_index.map(|i| {
            let kind = self.foods.remove(i).kind();
            agent.eat(kind);
            kind
        });

        let reward = agent.reward();
        sense(agent, &self.walls, &self.foods);
        let after = agent.observation();

        let transition_reported = agent.exploration > self.config.transition_threshold;
        if transition_reported {
            sink.send(Outbound::TransitionReport {
                agent: agent.id,
                before,
                action_index: action.index(),
                reward: reward.total,
                after: after.clone(),
            });
        }
        agent.last_observation = after;
        agent.state = AgentState::Ready;

        debug!(
            agent = %agent.id,
            ?action,
            blocked,
            ?eaten,
            reward = reward.total,
            "decision applied"
        );

        let report = StepReport {
            agent: agent.id,
            action,
            blocked,
            eaten,
            reward,
            transition_reported,
        };
        self.restock_food();
        Ok(report)
    }

    /// Set every agent's exploration parameter and tell the decision-maker.
    pub fn set_exploration(&mut self, exploration: f64, sink: &mut dyn EventSink) {
        let exploration = exploration.clamp(0.0, 1.0);
        for agent in &mut self.agents {
            agent.exploration = exploration;
        }
        info!(exploration, "exploration updated");
        sink.send(Outbound::SetExploration { exploration });
    }

    /// Ask the decision-maker to persist itself. The world never learns whether it did.
    pub fn request_snapshot(&self, sink: &mut dyn EventSink) {
        info!("snapshot requested");
        sink.send(Outbound::SnapshotRequest);
    }

    /// Spawn food until the configured target count is reached.
    pub fn restock_food(&mut self) {
        let c = &self.config;
        while self.foods.len() < c.food_target {
            let position = Vec2::new(
                self.food_rng.range_f64(c.food_margin, c.width - c.food_margin),
                self.food_rng.range_f64(c.food_margin, c.height - c.food_margin),
            );
            let freshness = match c.food_rules {
                FoodRuleset::Binary { bad_fraction } => Freshness::Kind {
                    kind: if self.food_rng.chance(bad_fraction) {
                        FoodKind::Bad
                    } else {
                        FoodKind::Good
                    },
                },
                FoodRuleset::Aging {
                    best_before,
                    expire,
                } => Freshness::Aging {
                    best_before_age: self.food_rng.range_whole(best_before.0, best_before.1),
                    expire_age: self.food_rng.range_whole(expire.0, expire.1),
                },
            };
            self.foods.push(Food::new(position, c.food_radius, freshness));
        }
    }

    fn age_food(&mut self) {
        let step = self.config.food_age_step();
        for food in &mut self.foods {
            food.advance_age(step);
        }
        let before = self.foods.len();
        self.foods.retain(|f| !f.is_expired());
        let expired = before - self.foods.len();
        if expired > 0 {
            debug!(expired, "food expired");
            self.restock_food();
        }
    }
}

/// Nearest hit along `segment` by `ua`, walls first on ties.
fn cast(walls: &[Segment], foods: &[Food], segment: &Segment) -> Option<Hit> {
    let wall_hits = walls.iter().filter_map(|w| {
        segment.intersect(w).map(|i| Hit {
            kind: SensedKind::Wall,
            ua: i.ua,
            point: i.point,
        })
    });
    let food_hits = foods.iter().filter_map(|f| {
        segment
            .intersect_circle(f.position, f.radius)
            .map(|i| Hit {
                kind: f.sensed_kind(),
                ua: i.ua,
                point: i.point,
            })
    });

    let mut best: Option<Hit> = None;
    for hit in wall_hits.chain(food_hits) {
        match best {
            Some(b) if hit.ua >= b.ua => {}
            _ => best = Some(hit),
        }
    }
    best
}

fn sense(agent: &mut Agent, walls: &[Segment], foods: &[Food]) {
    let origin = agent.position;
    let heading = agent.angle;
    for eye in &mut agent.eyes {
        let ray = Segment::new(origin, eye.end_point(origin, heading));
        match cast(walls, foods, &ray) {
            Some(hit) => eye.record(hit.kind, hit.point.distance(origin)),
            None => eye.clear(),
        }
    }
}
