//! Interlace-RT: the worker-pool scheduler for `interlace-net` graphs.
//!
//! ```rust
//! use std::time::Duration;
//!
//! use interlace_net::{builtin, Net, Port, RuleBook};
//! use interlace_rt::StopReason;
//!
//! let net = Net::new();
//! let t = net.add_agent(builtin::TENSOR, builtin::ARITY);
//! let p = net.add_agent(builtin::PAR, builtin::ARITY);
//! net.connect(Port::principal(t), Port::principal(p)).unwrap();
//!
//! let report = interlace_rt::run(net, RuleBook::with_builtins(), Duration::from_secs(5), 1000)
//!     .unwrap();
//! assert_eq!(report.stop, StopReason::Quiescent);
//! assert_eq!(report.rewrites, 1);
//! ```

pub mod config;
pub mod error;
pub mod inet;

pub use config::{RunConfig, ScanMode};
pub use error::RuntimeError;
pub use inet::{
    run, Dispatched, Dispatcher, RunPhase, RunReport, RuntimeManager, StopReason,
};
