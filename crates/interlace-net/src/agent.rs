use std::fmt;

use crate::port::{AgentId, Port, Slot};

/// The kind tag of an agent.
///
/// Kinds are plain static names so that client vocabularies can declare their own
/// alongside the built-in ones:
///
/// ```rust
/// use interlace_net::Kind;
///
/// const CONS: Kind = Kind::new("cons");
/// assert_eq!(CONS.name(), "cons");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Kind(&'static str);

impl Kind {
    #[inline(always)]
    pub const fn new(name: &'static str) -> Self {
        Kind(name)
    }

    #[inline(always)]
    pub fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Debug for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Kind({})", self.0)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// A node of the net.
///
/// An agent has a kind, a fixed number of port slots and an opaque `data` payload that
/// client rules may use (a list cell's value, say). Slot 1 is the principal port; the
/// others are auxiliary. A slot holding `None` is unconnected.
///
/// The `active` flag is raised whenever the connector wires one of the agent's slots,
/// and lowered when an interaction consumes the agent. Only active agents take part in
/// active pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    pub(crate) id: AgentId,
    pub(crate) kind: Kind,
    pub(crate) ports: Box<[Option<Port>]>,
    pub(crate) data: i64,
    pub(crate) active: bool,
}

impl Agent {
    /// Creates an unconnected, inactive agent. Its id is assigned when it is inserted
    /// into a net.
    pub fn new(kind: Kind, arity: u8) -> Self {
        Self {
            id: AgentId::NULL,
            kind,
            ports: vec![None; arity as usize].into_boxed_slice(),
            data: 0,
            active: false,
        }
    }

    pub fn with_data(mut self, data: i64) -> Self {
        self.data = data;
        self
    }

    #[inline(always)]
    pub fn id(&self) -> AgentId {
        self.id
    }

    #[inline(always)]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    #[inline(always)]
    pub fn arity(&self) -> u8 {
        self.ports.len() as u8
    }

    #[inline(always)]
    pub fn data(&self) -> i64 {
        self.data
    }

    #[inline(always)]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The descriptor stored at `slot`, or `None` if the slot is unconnected or out of
    /// range.
    #[inline]
    pub fn port(&self, slot: Slot) -> Option<Port> {
        slot.offset().and_then(|i| self.ports.get(i).copied().flatten())
    }

    #[inline]
    pub fn principal(&self) -> Option<Port> {
        self.port(Slot::PRINCIPAL)
    }

    /// Iterates over `(slot, descriptor)` for every connected slot.
    pub fn connections(&self) -> impl Iterator<Item = (Slot, Port)> + '_ {
        self.ports
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.map(|p| (Slot(i as u8 + 1), p)))
    }

    #[inline]
    pub(crate) fn has_slot(&self, slot: Slot) -> bool {
        slot.offset().is_some_and(|i| i < self.ports.len())
    }

    /// Writes `target` into `slot`. The caller has checked the slot with `has_slot`.
    #[inline]
    pub(crate) fn set(&mut self, slot: Slot, target: Option<Port>) {
        if let Some(i) = slot.offset() {
            self.ports[i] = target;
        }
    }
}

impl fmt::Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.kind)?;
        if self.data != 0 {
            write!(f, "({})", self.data)?;
        }
        f.write_str(" [")?;
        for (i, port) in self.ports.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match port {
                Some(p) => write!(f, "{p}")?,
                None => f.write_str("-")?,
            }
        }
        f.write_str("]")?;
        if !self.active {
            f.write_str(" inert")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CELL: Kind = Kind::new("cell");

    #[test]
    fn fresh_agent_is_unconnected() {
        let agent = Agent::new(CELL, 3).with_data(9);
        assert_eq!(agent.arity(), 3);
        assert_eq!(agent.data(), 9);
        assert!(!agent.is_active());
        assert!(agent.principal().is_none());
        assert_eq!(agent.connections().count(), 0);
        assert!(agent.has_slot(Slot::aux(3)));
        assert!(!agent.has_slot(Slot::aux(4)));
        assert!(!agent.has_slot(Slot(0)));
    }

    #[test]
    fn connections_report_one_based_slots() {
        let mut agent = Agent::new(CELL, 2);
        let target = Port::principal(AgentId(5));
        agent.set(Slot::aux(2), Some(target));
        let connections: Vec<_> = agent.connections().collect();
        assert_eq!(connections, vec![(Slot::aux(2), target)]);
    }
}
