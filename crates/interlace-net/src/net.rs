use std::fmt;
use std::sync::Arc;

use fxhash::FxHashSet;
use parking_lot::{ArcMutexGuard, Mutex, RawMutex, RwLock};

use crate::agent::{Agent, Kind};
use crate::error::NetError;
use crate::port::{AgentId, Pair, Port};
use crate::queue::PairQueue;

pub(crate) type AgentCell = Arc<Mutex<Agent>>;
pub(crate) type AgentGuard = ArcMutexGuard<RawMutex, Agent>;

/// The mutable graph: every agent ever created, the queue of pending active pairs, and
/// the record of pairs already queued.
///
/// # Locking
///
/// - The arena lock only guards the vector of cells. It is held for an index lookup, a
///   push, or a snapshot clone, and never while waiting on an agent's own lock.
/// - Each agent sits behind its own mutex. Code that needs several agents at once locks
///   them in ascending id order (see [`LockSet`]).
/// - Agents are never removed, so an [`AgentId`] stays valid for the life of the net.
#[derive(Default)]
pub struct Net {
    agents: RwLock<Vec<AgentCell>>,
    pending: PairQueue,
    enqueued: Mutex<FxHashSet<Pair>>,
}

impl Net {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a net pre-seeded with `agents`. Ids follow the iteration order, starting
    /// at 0.
    pub fn with_agents(agents: impl IntoIterator<Item = Agent>) -> Self {
        let net = Self::new();
        for agent in agents {
            net.insert(agent);
        }
        net
    }

    /// Appends an agent and returns its id.
    ///
    /// # Panics
    /// If the net already holds `u32::MAX` agents, like a `Vec` past its capacity.
    pub fn insert(&self, mut agent: Agent) -> AgentId {
        let mut agents = self.agents.write();
        let id = next_id(agents.len());
        agent.id = id;
        log::trace!("Created agent {id} ({}, arity {})", agent.kind, agent.arity());
        agents.push(Arc::new(Mutex::new(agent)));
        id
    }

    /// Shorthand for inserting a fresh `Agent::new(kind, arity)`.
    pub fn add_agent(&self, kind: Kind, arity: u8) -> AgentId {
        self.insert(Agent::new(kind, arity))
    }

    /// Appends an agent whose lock is already held by the caller, so that nobody else
    /// can observe it before the caller has finished wiring it.
    pub(crate) fn insert_locked(&self, mut agent: Agent) -> (AgentId, AgentGuard) {
        let mut agents = self.agents.write();
        let id = next_id(agents.len());
        agent.id = id;
        log::trace!("Spawned agent {id} ({}, arity {})", agent.kind, agent.arity());
        let cell = Arc::new(Mutex::new(agent));
        let guard = cell.lock_arc();
        agents.push(cell);
        (id, guard)
    }

    /// Number of agents ever created, consumed ones included.
    pub fn len(&self) -> usize {
        self.agents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub(crate) fn contains(&self, id: AgentId) -> bool {
        id.index() < self.len()
    }

    pub(crate) fn cell(&self, id: AgentId) -> Option<AgentCell> {
        self.agents.read().get(id.index()).cloned()
    }

    /// A copy of the arena's cell list, taken so that callers can walk the agents without
    /// holding the arena lock.
    pub(crate) fn cells(&self) -> Vec<AgentCell> {
        self.agents.read().clone()
    }

    /// A snapshot copy of agent `id`.
    pub fn agent(&self, id: AgentId) -> Result<Agent, NetError> {
        let cell = self.cell(id).ok_or(NetError::UnknownAgent(id))?;
        let agent = cell.lock().clone();
        Ok(agent)
    }

    /// Snapshot copies of every agent, in id order.
    pub fn agents(&self) -> Vec<Agent> {
        self.cells().iter().map(|cell| cell.lock().clone()).collect()
    }

    /// Reads the descriptor stored at `port`, or `None` if that slot is unconnected.
    pub fn port(&self, port: Port) -> Result<Option<Port>, NetError> {
        let cell = self.cell(port.agent).ok_or(NetError::NullPort(port))?;
        let agent = cell.lock();
        if !agent.has_slot(port.slot) {
            return Err(NetError::SlotOutOfRange { port, arity: agent.arity() });
        }
        Ok(agent.port(port.slot))
    }

    pub fn is_active(&self, id: AgentId) -> Result<bool, NetError> {
        let cell = self.cell(id).ok_or(NetError::UnknownAgent(id))?;
        let active = cell.lock().active;
        Ok(active)
    }

    /// Wires `p1` to `p2`: afterwards `p1`'s slot holds `p2`, `p2`'s slot holds `p1`, and
    /// both owners are active.
    ///
    /// Fails with [`NetError::NullPort`] if either owner is not an agent of this net, and
    /// leaves the net untouched on any error.
    pub fn connect(&self, p1: Port, p2: Port) -> Result<(), NetError> {
        let c1 = self.cell(p1.agent).ok_or(NetError::NullPort(p1))?;
        let c2 = self.cell(p2.agent).ok_or(NetError::NullPort(p2))?;
        let mut locks = LockSet::default();
        if p1.agent == p2.agent {
            locks.push(p1.agent, c1.lock_arc());
        } else if p1.agent < p2.agent {
            locks.push(p1.agent, c1.lock_arc());
            locks.push(p2.agent, c2.lock_arc());
        } else {
            locks.push(p2.agent, c2.lock_arc());
            locks.push(p1.agent, c1.lock_arc());
        }
        link(&mut locks, p1, p2)
    }

    /// Clears the slot at `port`, and the back pointer of its partner if the wire was
    /// mutual. Returns the descriptor the slot used to hold.
    pub fn disconnect(&self, port: Port) -> Result<Option<Port>, NetError> {
        let Some(target) = self.port(port)? else {
            return Ok(None);
        };
        let mut ids = vec![port.agent];
        if self.contains(target.agent) {
            ids.push(target.agent);
        }
        ids.sort_unstable();
        ids.dedup();
        let mut locks = LockSet::acquire(self, &ids)?;
        unlink(&mut locks, port)
    }

    /// Every mutual wire in the net, each reported once with the lower endpoint first.
    pub fn wires(&self) -> Vec<(Port, Port)> {
        let agents = self.agents();
        let mut wires = Vec::new();
        for agent in &agents {
            for (slot, target) in agent.connections() {
                let here = Port::new(agent.id, slot);
                if (here.agent, here.slot) >= (target.agent, target.slot) {
                    continue;
                }
                let back = agents.get(target.agent.index()).and_then(|a| a.port(target.slot));
                if back == Some(here) {
                    wires.push((here, target));
                }
            }
        }
        wires
    }

    /// Mutual wires whose two endpoints both belong to active agents.
    pub fn live_wires(&self) -> Vec<(Port, Port)> {
        let wires = self.wires();
        wires
            .into_iter()
            .filter(|(a, b)| {
                self.is_active(a.agent).unwrap_or(false) && self.is_active(b.agent).unwrap_or(false)
            })
            .collect()
    }

    /// The queue of pending active pairs.
    pub fn pending(&self) -> &PairQueue {
        &self.pending
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Whether `pair` has ever been queued (and not re-armed since).
    pub fn is_recorded(&self, pair: Pair) -> bool {
        self.enqueued.lock().contains(&pair)
    }

    /// Forgets that `pair` was queued, so that a later scan may queue it again.
    pub fn rearm(&self, pair: Pair) -> bool {
        self.enqueued.lock().remove(&pair)
    }

    /// Records `pair` and queues it if it was not recorded yet. The check and the insert
    /// into the record happen under one lock, so concurrent scans cannot queue a pair
    /// twice. The push to the queue happens after that lock is dropped: if the queue has
    /// been closed by then, the pair stays recorded but is never queued.
    pub(crate) fn record(&self, pair: Pair) -> bool {
        let mut enqueued = self.enqueued.lock();
        if !enqueued.insert(pair) {
            return false;
        }
        drop(enqueued);
        log::trace!("Queued active pair {pair}");
        self.pending.push(pair)
    }
}

fn next_id(len: usize) -> AgentId {
    match AgentId::from_index(len) {
        Some(id) => id,
        None => panic!("agent id space exhausted after {len} agents"),
    }
}

impl fmt::Debug for Net {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Net")
            .field("agents", &self.len())
            .field("pending", &self.pending.len())
            .field("recorded", &self.enqueued.lock().len())
            .finish()
    }
}

impl fmt::Display for Net {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for agent in self.agents() {
            writeln!(f, "{agent}")?;
        }
        Ok(())
    }
}

/// A set of agent locks held at once, kept sorted by id.
#[derive(Default)]
pub(crate) struct LockSet {
    guards: Vec<(AgentId, AgentGuard)>,
}

impl LockSet {
    /// Locks `ids` in the given order. The caller passes them sorted and deduplicated.
    pub(crate) fn acquire(net: &Net, ids: &[AgentId]) -> Result<Self, NetError> {
        debug_assert!(ids.windows(2).all(|w| w[0] < w[1]), "lock order violated: {ids:?}");
        let mut locks = LockSet { guards: Vec::with_capacity(ids.len()) };
        for &id in ids {
            let cell = net.cell(id).ok_or(NetError::UnknownAgent(id))?;
            locks.guards.push((id, cell.lock_arc()));
        }
        Ok(locks)
    }

    /// Adds a guard whose id is higher than every id already held.
    pub(crate) fn push(&mut self, id: AgentId, guard: AgentGuard) {
        debug_assert!(self.guards.last().map_or(true, |(last, _)| *last < id));
        self.guards.push((id, guard));
    }

    pub(crate) fn ids(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.guards.iter().map(|(id, _)| *id)
    }

    pub(crate) fn get(&self, id: AgentId) -> Option<&Agent> {
        self.guards
            .binary_search_by_key(&id, |(held, _)| *held)
            .ok()
            .map(|i| &*self.guards[i].1)
    }

    pub(crate) fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.guards
            .binary_search_by_key(&id, |(held, _)| *held)
            .ok()
            .map(|i| &mut *self.guards[i].1)
    }
}

/// Mutable access to agents by id, for the wiring primitives below.
pub(crate) trait AgentsMut {
    fn agent_mut(&mut self, port: Port) -> Result<&mut Agent, NetError>;
}

impl AgentsMut for LockSet {
    fn agent_mut(&mut self, port: Port) -> Result<&mut Agent, NetError> {
        self.get_mut(port.agent).ok_or(NetError::NullPort(port))
    }
}

fn check_slot(agents: &mut impl AgentsMut, port: Port) -> Result<(), NetError> {
    let agent = agents.agent_mut(port)?;
    if agent.has_slot(port.slot) {
        Ok(())
    } else {
        Err(NetError::SlotOutOfRange { port, arity: agent.arity() })
    }
}

/// The connector. Validates both ends before writing either, so an error leaves every
/// slot as it was.
pub(crate) fn link(agents: &mut impl AgentsMut, p1: Port, p2: Port) -> Result<(), NetError> {
    if p1.is_null() {
        return Err(NetError::NullPort(p1));
    }
    if p2.is_null() {
        return Err(NetError::NullPort(p2));
    }
    if p1 == p2 {
        return Err(NetError::SelfLoop(p1));
    }
    check_slot(agents, p1)?;
    check_slot(agents, p2)?;

    let a = agents.agent_mut(p1)?;
    a.set(p1.slot, Some(p2));
    a.active = true;
    let b = agents.agent_mut(p2)?;
    b.set(p2.slot, Some(p1));
    b.active = true;

    log::trace!("Wired {p1} <-> {p2}");
    Ok(())
}

/// Clears `port`, and its partner's slot too if that slot still points back.
pub(crate) fn unlink(agents: &mut impl AgentsMut, port: Port) -> Result<Option<Port>, NetError> {
    check_slot(agents, port)?;
    let agent = agents.agent_mut(port)?;
    let Some(target) = agent.port(port.slot) else {
        return Ok(None);
    };
    agent.set(port.slot, None);
    if let Ok(other) = agents.agent_mut(target) {
        if other.port(target.slot) == Some(port) {
            other.set(target.slot, None);
        }
    }
    log::trace!("Unwired {port} (was {target})");
    Ok(Some(target))
}
