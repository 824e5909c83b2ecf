//! Single-flight scheduler
//!
//! One generic loop shared by every periodic job: fixed interval, at most one
//! execution in flight per job, failures contained at the boundary.

mod job;
mod runner;
mod single_flight;

pub use job::ScheduledJob;
pub use runner::{schedule, Scheduler};
pub use single_flight::{Invocation, JobStats, SingleFlight};
