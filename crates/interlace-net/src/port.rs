use std::fmt;

/// Stable identifier of an agent within a [`Net`](crate::Net).
///
/// Identifiers are handed out in creation order and are never reused: an agent that has
/// been consumed by an interaction keeps its id (and its arena slot) for the lifetime of
/// the net. This is what makes the pair record safe to keep for the whole run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(pub u32);

impl AgentId {
    /// Reserved id that never names an agent.
    pub const NULL: AgentId = AgentId(u32::MAX);

    /// The id for arena position `index`, or `None` once the ids run into [`NULL`].
    ///
    /// [`NULL`]: AgentId::NULL
    #[inline]
    pub fn from_index(index: usize) -> Option<AgentId> {
        u32::try_from(index).ok().map(AgentId).filter(|id| !id.is_null())
    }

    /// Position of the agent in the arena.
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline(always)]
    pub fn is_null(self) -> bool {
        self == Self::NULL
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "#null")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}

/// A 1-based slot index on an agent.
///
/// # Slots
/// - 0: never valid
/// - 1: principal port
/// - 2..: auxiliary ports
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot(pub u8);

impl Slot {
    pub const PRINCIPAL: Slot = Slot(1);

    /// Auxiliary slot `n`, counting from 2 like the slot numbering itself.
    #[inline(always)]
    pub const fn aux(n: u8) -> Slot {
        Slot(n)
    }

    #[inline(always)]
    pub fn is_principal(self) -> bool {
        self == Self::PRINCIPAL
    }

    /// Offset of this slot in an agent's port array, if the slot is valid at all.
    #[inline(always)]
    pub(crate) fn offset(self) -> Option<usize> {
        (self.0 as usize).checked_sub(1)
    }
}

/// A port descriptor: which agent owns the slot, and which slot it is.
///
/// Descriptors carry no identity of their own. They are copied by value whenever a wire
/// is read or rewritten, which is what lets an interaction splice an agent out of a wire
/// by connecting the descriptors it reads from that agent's slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Port {
    pub agent: AgentId,
    pub slot: Slot,
}

impl Port {
    /// Descriptor of the null agent. Always rejected by the connector.
    pub const NULL: Port = Port { agent: AgentId::NULL, slot: Slot(0) };

    #[inline(always)]
    pub fn new(agent: AgentId, slot: Slot) -> Self {
        Self { agent, slot }
    }

    /// The principal port of `agent`.
    #[inline(always)]
    pub fn principal(agent: AgentId) -> Self {
        Self::new(agent, Slot::PRINCIPAL)
    }

    /// Auxiliary port `n` (2-based) of `agent`.
    #[inline(always)]
    pub fn aux(agent: AgentId, n: u8) -> Self {
        Self::new(agent, Slot::aux(n))
    }

    #[inline(always)]
    pub fn is_principal(&self) -> bool {
        self.slot.is_principal()
    }

    #[inline(always)]
    pub fn is_null(&self) -> bool {
        self.agent.is_null()
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.agent, self.slot.0)
    }
}

/// An unordered pair of distinct agents, stored with the lower id first.
///
/// Two orderings of the same agents compare equal, so a pair can be recorded in a set
/// exactly once no matter which side the scanner found it from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pair(AgentId, AgentId);

impl Pair {
    #[inline]
    pub fn new(a: AgentId, b: AgentId) -> Self {
        debug_assert!(a != b, "a pair needs two distinct agents, got {a} twice");
        if a <= b {
            Pair(a, b)
        } else {
            Pair(b, a)
        }
    }

    /// The agent with the lower id. Its rule is the one the dispatcher invokes.
    #[inline(always)]
    pub fn first(&self) -> AgentId {
        self.0
    }

    #[inline(always)]
    pub fn second(&self) -> AgentId {
        self.1
    }

    #[inline]
    pub fn contains(&self, agent: AgentId) -> bool {
        self.0 == agent || self.1 == agent
    }

    /// The member of the pair that is not `agent`.
    #[inline]
    pub fn other(&self, agent: AgentId) -> Option<AgentId> {
        if self.0 == agent {
            Some(self.1)
        } else if self.1 == agent {
            Some(self.0)
        } else {
            None
        }
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ~ {}", self.0, self.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_is_canonical() {
        let a = AgentId(7);
        let b = AgentId(3);
        assert_eq!(Pair::new(a, b), Pair::new(b, a));
        assert_eq!(Pair::new(a, b).first(), b);
        assert_eq!(Pair::new(a, b).other(b), Some(a));
        assert_eq!(Pair::new(a, b).other(AgentId(1)), None);
        assert!(Pair::new(a, b).contains(a));
        assert!(!Pair::new(a, b).contains(AgentId(1)));
    }

    #[test]
    fn ids_stop_short_of_null() {
        assert_eq!(AgentId::from_index(0), Some(AgentId(0)));
        assert_eq!(AgentId::from_index(u32::MAX as usize - 1), Some(AgentId(u32::MAX - 1)));
        assert_eq!(AgentId::from_index(u32::MAX as usize), None);
        assert_eq!(AgentId::from_index(usize::MAX), None);
    }

    #[test]
    fn slot_offsets() {
        assert_eq!(Slot(0).offset(), None);
        assert_eq!(Slot::PRINCIPAL.offset(), Some(0));
        assert_eq!(Slot::aux(3).offset(), Some(2));
    }

    #[test]
    fn display() {
        assert_eq!(Port::aux(AgentId(4), 2).to_string(), "#4.2");
        assert_eq!(Port::NULL.agent.to_string(), "#null");
    }
}
