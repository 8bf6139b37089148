//! Active-pair discovery.
//!
//! A pair `{A, B}` is active when both agents are active and each one's principal slot
//! holds the other's principal port. The scanner records every such pair it sees in the
//! net's pair record and queues the ones that were not recorded before.
//!
//! The full scan walks the whole arena, which is O(n) per call. After a rewrite the
//! dispatcher can instead hand [`Net::scan_agents`] the agents that rewrite touched: a
//! new active pair can only appear where a principal slot was written, and the agent
//! owning that slot is always among the touched ones.

use crate::net::{AgentCell, Net};
use crate::port::{AgentId, Pair, Port};

impl Net {
    /// Scans every agent and queues each newly found active pair. Returns how many pairs
    /// were queued.
    pub fn scan(&self) -> usize {
        let cells = self.cells();
        let mut found = 0;
        for cell in &cells {
            // Each pair is seen from both ends; probing from the lower id is enough.
            if let Some(pair) = self.probe(cell, true) {
                if self.record(pair) {
                    found += 1;
                }
            }
        }
        log::trace!("Full scan over {} agents queued {found} pairs", cells.len());
        found
    }

    /// Like [`scan`](Net::scan), restricted to the given agents. Unknown ids are skipped.
    pub fn scan_agents(&self, ids: impl IntoIterator<Item = AgentId>) -> usize {
        let mut found = 0;
        for id in ids {
            let Some(cell) = self.cell(id) else {
                continue;
            };
            if let Some(pair) = self.probe(&cell, false) {
                if self.record(pair) {
                    found += 1;
                }
            }
        }
        found
    }

    /// The active pair `cell` belongs to, if any.
    ///
    /// The two agents are locked one after the other, never together, so a probe cannot
    /// deadlock against a rewrite holding a whole neighbourhood. The price is that the
    /// answer may be stale by the time it is used; the dispatcher re-checks the pair
    /// once it holds the locks.
    fn probe(&self, cell: &AgentCell, lower_only: bool) -> Option<Pair> {
        let (id, target) = {
            let agent = cell.lock();
            if !agent.is_active() {
                return None;
            }
            (agent.id(), agent.principal()?)
        };
        if !target.is_principal() || target.agent == id {
            return None;
        }
        if lower_only && target.agent < id {
            return None;
        }
        let other = self.cell(target.agent)?;
        let other = other.lock();
        let mutual = other.is_active() && other.principal() == Some(Port::principal(id));
        mutual.then(|| Pair::new(id, target.agent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Kind;

    const NODE: Kind = Kind::new("node");

    #[test]
    fn finds_principal_cut_once() {
        let net = Net::new();
        let a = net.add_agent(NODE, 2);
        let b = net.add_agent(NODE, 2);
        net.connect(Port::principal(b), Port::principal(a)).unwrap();

        assert_eq!(net.scan(), 1);
        assert_eq!(net.scan(), 0);
        assert_eq!(net.scan_agents([a, b]), 0);
        assert_eq!(net.pending_len(), 1);
        assert!(net.is_recorded(Pair::new(a, b)));
    }

    #[test]
    fn incremental_scan_sees_pair_from_either_side() {
        let net = Net::new();
        let a = net.add_agent(NODE, 1);
        let b = net.add_agent(NODE, 1);
        net.connect(Port::principal(a), Port::principal(b)).unwrap();
        assert_eq!(net.scan_agents([b]), 1);
        assert_eq!(net.scan_agents([a, AgentId(99)]), 0);
    }

    #[test]
    fn principal_to_aux_is_not_a_pair() {
        let net = Net::new();
        let a = net.add_agent(NODE, 2);
        let b = net.add_agent(NODE, 2);
        net.connect(Port::principal(a), Port::aux(b, 2)).unwrap();
        assert_eq!(net.scan(), 0);
    }

    #[test]
    fn zero_arity_agents_are_skipped() {
        let net = Net::new();
        net.add_agent(NODE, 0);
        assert_eq!(net.scan(), 0);
    }
}
