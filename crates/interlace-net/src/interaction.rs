//! Exclusive access to the neighbourhood of an active pair.
//!
//! The neighbourhood of a pair is the two agents plus every agent wired to one of their
//! slots. A rewrite of an active pair only ever reads or writes agents in that set, and
//! the agents it spawns. Claiming locks the whole set in ascending id order, so two
//! rewrites whose neighbourhoods overlap are serialized and all others run in parallel.

use crossbeam_utils::Backoff;

use crate::agent::{Agent, Kind};
use crate::error::NetError;
use crate::net::{link, unlink, AgentsMut, LockSet, Net};
use crate::port::{AgentId, Pair, Port, Slot};

impl Net {
    /// Locks the neighbourhood of `pair` and returns the interaction context, with the
    /// lower-id agent as `me()`.
    ///
    /// Returns `Ok(None)` if the pair is no longer an active pair once the locks are held
    /// (another rewrite got to one of its agents first).
    pub fn claim(&self, pair: Pair) -> Result<Option<Interaction<'_>>, NetError> {
        let backoff = Backoff::new();
        loop {
            let ids = self.neighbourhood(pair)?;
            let locks = LockSet::acquire(self, &ids)?;

            let (me, partner) = match (locks.get(pair.first()), locks.get(pair.second())) {
                (Some(me), Some(partner)) => (me, partner),
                _ => return Err(NetError::UnknownAgent(pair.first())),
            };
            let live = me.is_active()
                && partner.is_active()
                && me.principal() == Some(Port::principal(partner.id()))
                && partner.principal() == Some(Port::principal(me.id()));
            if !live {
                log::debug!("Pair {pair} is no longer active");
                return Ok(None);
            }

            // The neighbourhood was read before the locks were taken; if a wire moved in
            // between, some neighbour is not covered and the claim starts over.
            let covered = [me, partner]
                .into_iter()
                .flat_map(|agent| agent.connections())
                .all(|(_, target)| locks.get(target.agent).is_some());
            if covered {
                return Ok(Some(Interaction::new(self, pair, locks)));
            }
            drop(locks);
            backoff.snooze();
        }
    }

    /// Ids of the pair's agents and of every agent wired to them, sorted.
    fn neighbourhood(&self, pair: Pair) -> Result<Vec<AgentId>, NetError> {
        let mut ids = vec![pair.first(), pair.second()];
        for id in [pair.first(), pair.second()] {
            let cell = self.cell(id).ok_or(NetError::UnknownAgent(id))?;
            let agent = cell.lock();
            ids.extend(agent.connections().map(|(_, target)| target.agent));
        }
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }
}

/// The context a [`Rule`](crate::Rule) rewrites through.
///
/// Every agent of the claimed neighbourhood is locked for as long as the interaction
/// lives. Reads and writes are limited to those agents and to the agents spawned through
/// [`spawn`](Interaction::spawn); touching anything else is
/// [`NetError::OutsideNeighbourhood`].
pub struct Interaction<'n> {
    net: &'n Net,
    pair: Pair,
    locks: LockSet,
    written: Vec<Port>,
    spawned: Vec<AgentId>,
}

impl<'n> Interaction<'n> {
    fn new(net: &'n Net, pair: Pair, locks: LockSet) -> Self {
        Self { net, pair, locks, written: Vec::new(), spawned: Vec::new() }
    }

    pub fn pair(&self) -> Pair {
        self.pair
    }

    /// The agent whose rule is running.
    pub fn me(&self) -> AgentId {
        self.pair.first()
    }

    /// The agent on the other end of the principal wire.
    pub fn partner(&self) -> AgentId {
        self.pair.second()
    }

    /// Read access to an agent of the neighbourhood.
    pub fn agent(&self, id: AgentId) -> Result<&Agent, NetError> {
        match self.locks.get(id) {
            Some(agent) => Ok(agent),
            None if self.net.contains(id) => {
                Err(NetError::OutsideNeighbourhood { agent: id, pair: self.pair })
            }
            None => Err(NetError::UnknownAgent(id)),
        }
    }

    pub fn kind(&self, id: AgentId) -> Result<Kind, NetError> {
        self.agent(id).map(Agent::kind)
    }

    pub fn partner_kind(&self) -> Result<Kind, NetError> {
        self.kind(self.partner())
    }

    pub fn data(&self, id: AgentId) -> Result<i64, NetError> {
        self.agent(id).map(Agent::data)
    }

    /// The descriptor stored at `port`, or `None` if the slot is unconnected.
    pub fn port(&self, port: Port) -> Result<Option<Port>, NetError> {
        let agent = self.agent(port.agent)?;
        if !agent.has_slot(port.slot) {
            return Err(NetError::SlotOutOfRange { port, arity: agent.arity() });
        }
        Ok(agent.port(port.slot))
    }

    /// The descriptor at auxiliary slot `n` of `id`.
    pub fn aux(&self, id: AgentId, n: u8) -> Result<Option<Port>, NetError> {
        self.port(Port::aux(id, n))
    }

    /// Wires `p1` to `p2`, as [`Net::connect`] does.
    pub fn connect(&mut self, p1: Port, p2: Port) -> Result<(), NetError> {
        link(self, p1, p2)?;
        self.written.extend([p1, p2]);
        Ok(())
    }

    /// Wire fusion: joins whatever `a` and `b` are currently wired to, splicing their
    /// owners out of both wires.
    ///
    /// If only one side is connected, the agent on that side is left with a dangling
    /// slot. If neither is, nothing happens.
    pub fn fuse(&mut self, a: Port, b: Port) -> Result<(), NetError> {
        match (self.port(a)?, self.port(b)?) {
            (Some(x), Some(y)) => self.connect(x, y),
            (Some(x), None) | (None, Some(x)) => self.detach(x),
            (None, None) => Ok(()),
        }
    }

    /// Clears `port` and, if the wire was mutual, its partner's slot.
    pub fn disconnect(&mut self, port: Port) -> Result<Option<Port>, NetError> {
        let target = unlink(self, port)?;
        self.written.push(port);
        if let Some(target) = target {
            self.written.push(target);
        }
        Ok(target)
    }

    /// Clears only the slot at `port`, leaving whatever it pointed at alone.
    fn detach(&mut self, port: Port) -> Result<(), NetError> {
        let agent = self.agent_mut(port)?;
        if !agent.has_slot(port.slot) {
            return Err(NetError::SlotOutOfRange { port, arity: agent.arity() });
        }
        agent.set(port.slot, None);
        self.written.push(port);
        log::trace!("Detached {port}");
        Ok(())
    }

    /// Creates a new agent inside the neighbourhood. It stays locked, and therefore
    /// invisible to other rewrites, until the interaction ends.
    pub fn spawn(&mut self, agent: Agent) -> AgentId {
        let (id, guard) = self.net.insert_locked(agent);
        self.locks.push(id, guard);
        self.spawned.push(id);
        id
    }

    /// Shorthand for spawning `Agent::new(kind, arity).with_data(data)`.
    pub fn spawn_agent(&mut self, kind: Kind, arity: u8, data: i64) -> AgentId {
        self.spawn(Agent::new(kind, arity).with_data(data))
    }

    /// Marks an agent of the neighbourhood as consumed.
    pub fn retire(&mut self, id: AgentId) -> Result<(), NetError> {
        let pair = self.pair;
        let agent = self
            .locks
            .get_mut(id)
            .ok_or(NetError::OutsideNeighbourhood { agent: id, pair })?;
        agent.active = false;
        Ok(())
    }

    /// Ends a rewrite: the pair's agents are retired unless the rule re-wired their
    /// principal slot (that is, reused them), and the locks are released.
    ///
    /// Returns every agent whose slots were written or which was spawned, which is where
    /// any new active pair must be.
    pub fn commit(mut self) -> Vec<AgentId> {
        for id in [self.me(), self.partner()] {
            let reused = self.written.contains(&Port::new(id, Slot::PRINCIPAL));
            if let Some(agent) = self.locks.get_mut(id) {
                if !(reused && agent.principal().is_some()) {
                    agent.active = false;
                }
            }
        }
        let mut touched: Vec<AgentId> = self.written.iter().map(|p| p.agent).collect();
        touched.extend_from_slice(&self.spawned);
        touched.sort_unstable();
        touched.dedup();
        log::trace!("Committed {} touching {} agents", self.pair, touched.len());
        touched
    }

    /// Ends an interaction that did not rewrite anything.
    pub fn release(self) {
        log::trace!("Released {} untouched", self.pair);
    }

    /// Ids of every locked agent, spawned ones included.
    pub fn locked(&self) -> Vec<AgentId> {
        self.locks.ids().collect()
    }
}

impl AgentsMut for Interaction<'_> {
    fn agent_mut(&mut self, port: Port) -> Result<&mut Agent, NetError> {
        if port.is_null() || !self.net.contains(port.agent) {
            return Err(NetError::NullPort(port));
        }
        let pair = self.pair;
        self.locks
            .get_mut(port.agent)
            .ok_or(NetError::OutsideNeighbourhood { agent: port.agent, pair })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const X: Kind = Kind::new("x");
    const Y: Kind = Kind::new("y");
    const Z: Kind = Kind::new("z");

    /// `a ~ b` on their principals, `a.2 - c.2`, `b.2 - d.2`, and `e` off to the side,
    /// wired to `c.1`.
    fn fixture() -> (Net, [AgentId; 5]) {
        let net = Net::new();
        let a = net.add_agent(X, 3);
        let b = net.add_agent(Y, 3);
        let c = net.add_agent(Z, 2);
        let d = net.add_agent(Z, 2);
        let e = net.add_agent(Z, 2);
        net.connect(Port::principal(a), Port::principal(b)).unwrap();
        net.connect(Port::aux(a, 2), Port::aux(c, 2)).unwrap();
        net.connect(Port::aux(b, 2), Port::aux(d, 2)).unwrap();
        net.connect(Port::principal(c), Port::aux(e, 2)).unwrap();
        (net, [a, b, c, d, e])
    }

    #[test]
    fn claim_locks_exactly_the_neighbourhood() {
        let (net, [a, b, c, d, _]) = fixture();
        let cx = net.claim(Pair::new(a, b)).unwrap().expect("pair is active");
        assert_eq!(cx.locked(), vec![a, b, c, d]);
        assert_eq!(cx.me(), a);
        assert_eq!(cx.partner_kind().unwrap(), Y);
    }

    #[test]
    fn claim_of_a_non_pair_is_stale() {
        let (net, [a, _, c, ..]) = fixture();
        assert!(net.claim(Pair::new(a, c)).unwrap().is_none());
    }

    #[test]
    fn fusion_splices_the_pair_out() {
        let (net, [a, b, c, d, _]) = fixture();
        let mut cx = net.claim(Pair::new(a, b)).unwrap().unwrap();
        cx.fuse(Port::aux(a, 2), Port::aux(b, 2)).unwrap();
        let touched = cx.commit();
        assert_eq!(touched, vec![c, d]);

        assert_eq!(net.port(Port::aux(c, 2)).unwrap(), Some(Port::aux(d, 2)));
        assert_eq!(net.port(Port::aux(d, 2)).unwrap(), Some(Port::aux(c, 2)));
        assert!(!net.is_active(a).unwrap());
        assert!(!net.is_active(b).unwrap());
        assert!(net.claim(Pair::new(a, b)).unwrap().is_none());
    }

    #[test]
    fn fusion_with_one_unconnected_side_leaves_a_dangling_slot() {
        let (net, [a, b, c, ..]) = fixture();
        let mut cx = net.claim(Pair::new(a, b)).unwrap().unwrap();
        cx.fuse(Port::aux(a, 2), Port::aux(b, 3)).unwrap();
        cx.commit();
        assert_eq!(net.port(Port::aux(c, 2)).unwrap(), None);
    }

    #[test]
    fn writes_outside_the_neighbourhood_are_refused() {
        let (net, [a, b, c, _, e]) = fixture();
        let mut cx = net.claim(Pair::new(a, b)).unwrap().unwrap();
        let err = cx.connect(Port::aux(e, 2), Port::aux(a, 3)).unwrap_err();
        assert_eq!(err, NetError::OutsideNeighbourhood { agent: e, pair: Pair::new(a, b) });
        assert!(matches!(cx.agent(e), Err(NetError::OutsideNeighbourhood { .. })));
        assert!(matches!(cx.agent(AgentId(40)), Err(NetError::UnknownAgent(_))));
        cx.release();
        // Nothing was written on the failed connect.
        assert_eq!(net.port(Port::aux(a, 3)).unwrap(), None);
        assert_eq!(net.port(Port::aux(e, 2)).unwrap(), Some(Port::principal(c)));
    }

    #[test]
    fn spawned_agents_join_the_neighbourhood() {
        let (net, [a, b, c, ..]) = fixture();
        let mut cx = net.claim(Pair::new(a, b)).unwrap().unwrap();
        let n = cx.spawn_agent(Z, 2, 7);
        cx.connect(Port::principal(n), Port::aux(c, 2)).unwrap();
        assert_eq!(cx.data(n).unwrap(), 7);
        let touched = cx.commit();
        assert!(touched.contains(&n));
        assert_eq!(net.port(Port::aux(c, 2)).unwrap(), Some(Port::principal(n)));
        assert!(net.is_active(n).unwrap());
    }

    #[test]
    fn rewiring_a_principal_keeps_the_agent_alive() {
        let (net, [a, b, c, ..]) = fixture();
        let mut cx = net.claim(Pair::new(a, b)).unwrap().unwrap();
        cx.connect(Port::principal(a), Port::aux(c, 2)).unwrap();
        cx.commit();
        assert!(net.is_active(a).unwrap());
        assert!(!net.is_active(b).unwrap());
    }

    #[test]
    fn disconnect_clears_both_ends() {
        let (net, [a, b, c, ..]) = fixture();
        let mut cx = net.claim(Pair::new(a, b)).unwrap().unwrap();
        assert_eq!(cx.disconnect(Port::aux(a, 2)).unwrap(), Some(Port::aux(c, 2)));
        assert_eq!(cx.aux(a, 2).unwrap(), None);
        assert_eq!(cx.aux(c, 2).unwrap(), None);
        // A second disconnect finds nothing to clear.
        assert_eq!(cx.disconnect(Port::aux(a, 2)).unwrap(), None);
        assert_eq!(cx.commit(), vec![a, c]);
        assert_eq!(net.port(Port::aux(c, 2)).unwrap(), None);
    }

    #[test]
    fn retire_marks_a_neighbour_inert() {
        let (net, [a, b, c, _, e]) = fixture();
        let mut cx = net.claim(Pair::new(a, b)).unwrap().unwrap();
        cx.retire(c).unwrap();
        assert_eq!(
            cx.retire(e),
            Err(NetError::OutsideNeighbourhood { agent: e, pair: Pair::new(a, b) })
        );
        cx.commit();
        assert!(!net.is_active(c).unwrap());
        assert!(net.is_active(e).unwrap());
    }
}
