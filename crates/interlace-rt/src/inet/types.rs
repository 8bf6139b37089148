/// The identifier for a worker thread within the runtime system.
pub type WorkerId = usize;
