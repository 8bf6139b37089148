//! Interlace-Net: the interaction-net graph and its rewriting primitives.
//!
//! An interaction net is a graph of *agents*. Every agent has a fixed number of port
//! slots; slot 1 is the *principal* port and the rest are auxiliary. Two agents whose
//! principal ports are wired to each other form an *active pair*, and rewriting an
//! active pair only ever touches the pair and its immediate neighbours. That locality
//! is what lets independent pairs be rewritten in parallel.
//!
//! # Architecture
//!
//! - [`Net`]: the arena of agents, the queue of pending active pairs and the record of
//!   pairs already queued.
//! - [`Net::connect`]: the connector, the only way wires are made.
//! - [`Net::scan`] / [`Net::scan_agents`]: active-pair discovery.
//! - [`Net::claim`]: locks the neighbourhood of a pair and hands out an
//!   [`Interaction`], the context a [`Rule`] rewrites through.
//! - [`RuleBook`]: the kind to rule registry consulted by the runtime.
//!
//! Scheduling lives in `interlace-rt`; this crate is usable on its own from a single
//! thread.
//!
//! # Usage
//!
//! ```rust
//! use interlace_net::{builtin, Net, Port, RuleBook};
//!
//! let net = Net::new();
//! let t = net.add_agent(builtin::TENSOR, builtin::ARITY);
//! let p = net.add_agent(builtin::PAR, builtin::ARITY);
//! net.connect(Port::principal(t), Port::principal(p)).unwrap();
//! net.connect(Port::aux(t, 2), Port::aux(t, 3)).unwrap();
//! net.connect(Port::aux(p, 2), Port::aux(p, 3)).unwrap();
//!
//! assert_eq!(net.scan(), 1);
//! assert_eq!(net.pending_len(), 1);
//!
//! let rules = RuleBook::with_builtins();
//! assert_eq!(rules.len(), 2);
//! ```

mod agent;
pub mod builtin;
mod error;
mod interaction;
mod net;
mod port;
mod queue;
mod rule;
mod scan;

pub use agent::{Agent, Kind};
pub use error::{NetError, RuleError};
pub use interaction::Interaction;
pub use net::Net;
pub use port::{AgentId, Pair, Port, Slot};
pub use queue::{PairQueue, Pop};
pub use rule::{Fired, Rule, RuleBook};
