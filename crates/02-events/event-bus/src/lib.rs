//! Fault-isolated event dispatch for untrusted extensions.
//!
//! Every notification type gets its own [`EventBus`]; the [`EventManager`] groups
//! them so the supervisor can raise and extensions can register. A raise never
//! fails: a handler that returns an error or panics is logged under its owner's
//! name and the remaining handlers still run.

mod args;
mod bus;
mod fault;
mod manager;
mod owner;

pub use args::{
    EventKind, GameLaunchedArgs, LoadStageChangedArgs, RenderArgs, ReturnedToTitleArgs,
    SaveArgs, SaveLoadedArgs, TickArgs,
};
pub use bus::{EventBus, EventPriority, HandlerFailure, HandlerId, HandlerResult, RaiseSummary};
pub use fault::{panic_message, HandlerFault};
pub use manager::EventManager;
pub use owner::ExtensionId;
