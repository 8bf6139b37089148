use thiserror::Error;

use crate::port::{AgentId, Pair, Port};

/// Errors raised while building or rewriting a net.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetError {
    #[error("Port {0} does not belong to any agent of this net")]
    NullPort(Port),
    #[error("Slot {} is out of range for agent {} of arity {arity}", .port.slot.0, .port.agent)]
    SlotOutOfRange { port: Port, arity: u8 },
    #[error("Cannot connect port {0} to itself")]
    SelfLoop(Port),
    #[error("Agent {agent} lies outside the neighbourhood claimed for {pair}")]
    OutsideNeighbourhood { agent: AgentId, pair: Pair },
    #[error("Unknown agent {0}")]
    UnknownAgent(AgentId),
}

/// Errors a rule body may return. Anything here aborts the run that dispatched it.
///
/// A rule meeting a partner kind it has no case for does not fail: it returns
/// [`Fired::Declined`](crate::Fired::Declined).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error(transparent)]
    Net(#[from] NetError),
    #[error("{0}")]
    Failed(String),
}

impl RuleError {
    pub fn failed(message: impl Into<String>) -> Self {
        RuleError::Failed(message.into())
    }
}
