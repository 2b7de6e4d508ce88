//! Lifecycle supervisor for a host process running untrusted extensions.
//!
//! The [`TickSupervisor`] intercepts every update and draw frame, keeps the
//! [`SessionContext`](session::SessionContext) in step with the host, raises
//! lifecycle notifications through the [`EventManager`](event_bus::EventManager),
//! and contains failures with a pair of independent [`CrashGuard`]s.

mod config;
mod countdown;
mod error;
mod fatal;
mod guard;
mod host;
mod supervisor;

pub use config::{
    SavingPolicy, SupervisorConfig, DEFAULT_CRASH_THRESHOLD, DEFAULT_POST_LOAD_GRACE_TICKS,
};
pub use countdown::Countdown;
pub use error::SupervisorError;
pub use fatal::{CrashLogExit, CrashPath, CrashReport, FatalExit};
pub use guard::{CrashGuard, GuardError, GuardOutcome};
pub use host::{HostAdapter, HostSnapshot};
pub use supervisor::{SupervisorBuilder, TickOutcome, TickSupervisor};
