//! # Multicast event bus with per-handler fault isolation.
//!
//! [`EventBus`] holds an ordered list of handlers behind an [`ArcSwap`]. A raise
//! loads the current list once and walks that snapshot, so registrations made
//! while a raise is running (including from inside a handler) only show up on the
//! next raise.
//!
//! ## Rules
//! - **Order**: handlers run by priority, then registration order. With the default
//!   [`EventPriority::Normal`] that is plain registration order.
//! - **Isolation**: each handler call is wrapped on its own. An `Err` return or a
//!   panic is logged with the owning extension and the event name, then the next
//!   handler runs.
//! - **No self-removal**: failing handlers stay registered.
//! - **Never fails**: `raise` returns a [`RaiseSummary`], never an error.
//!
//! ```text
//!   raise(&session, &mut args)
//!       │ load_full() ──► snapshot [h1, h2, h3]
//!       ├──► catch_unwind(h1) ─ ok
//!       ├──► catch_unwind(h2) ─ Err/panic ─► error! owner=… event=…
//!       └──► catch_unwind(h3) ─ ok
//! ```

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use log::{error, trace};
use smallvec::SmallVec;

use session::SessionContext;

use crate::fault::{panic_message, HandlerFault};
use crate::owner::ExtensionId;

/// Result type returned by extension handlers.
pub type HandlerResult = anyhow::Result<()>;

type Callback<T> = dyn Fn(&SessionContext, &mut T) -> HandlerResult + Send + Sync;

static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique handle returned by registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

impl HandlerId {
    fn next() -> Self {
        Self(NEXT_HANDLER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric id, for logs.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Explicit ordering hint for handlers that must run before or after others.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventPriority {
    /// Runs after every `Normal` handler.
    Low,
    /// Default priority.
    #[default]
    Normal,
    /// Runs before every `Normal` handler.
    High,
}

struct Registration<T> {
    id: HandlerId,
    owner: ExtensionId,
    priority: EventPriority,
    callback: Box<Callback<T>>,
}

/// A single handler failure observed during a raise.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandlerFailure {
    /// Handler that failed.
    pub handler_id: HandlerId,
    /// Extension that registered the handler.
    pub owner: ExtensionId,
    /// What went wrong.
    pub fault: HandlerFault,
}

/// Outcome of one raise.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RaiseSummary {
    /// Handlers invoked (the size of the snapshot).
    pub invoked: usize,
    /// Handlers that returned an error or panicked.
    pub failures: SmallVec<[HandlerFailure; 2]>,
}

impl RaiseSummary {
    /// True when every invoked handler succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of handlers that succeeded.
    pub fn succeeded(&self) -> usize {
        self.invoked - self.failures.len()
    }
}

/// Typed, fault-isolated multicast dispatcher for one notification.
pub struct EventBus<T> {
    name: String,
    handlers: ArcSwap<Vec<Arc<Registration<T>>>>,
}

impl<T> EventBus<T> {
    /// Creates an empty bus for the event called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handlers: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// Event name used in logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers `callback` at normal priority on behalf of `owner`.
    ///
    /// Duplicate registrations are allowed; each gets its own id.
    pub fn register<F>(&self, owner: impl Into<ExtensionId>, callback: F) -> HandlerId
    where
        F: Fn(&SessionContext, &mut T) -> HandlerResult + Send + Sync + 'static,
    {
        self.register_with_priority(owner, EventPriority::Normal, callback)
    }

    /// Registers `callback` with an explicit priority.
    ///
    /// The handler is placed after every existing handler of the same or higher
    /// priority, so registration order is kept within a priority band.
    pub fn register_with_priority<F>(
        &self,
        owner: impl Into<ExtensionId>,
        priority: EventPriority,
        callback: F,
    ) -> HandlerId
    where
        F: Fn(&SessionContext, &mut T) -> HandlerResult + Send + Sync + 'static,
    {
        let registration = Arc::new(Registration {
            id: HandlerId::next(),
            owner: owner.into(),
            priority,
            callback: Box::new(callback),
        });
        let id = registration.id;

        self.handlers.rcu(|current| {
            let mut next = Vec::with_capacity(current.len() + 1);
            next.extend(current.iter().cloned());
            let pos = next
                .iter()
                .position(|existing| existing.priority < priority)
                .unwrap_or(next.len());
            next.insert(pos, Arc::clone(&registration));
            next
        });

        trace!(
            "{}: registered handler {} for {}",
            self.name,
            id.get(),
            registration.owner
        );
        id
    }

    /// Removes one handler. Returns `false` if it was not registered.
    pub fn unregister(&self, id: HandlerId) -> bool {
        let mut removed = false;
        self.handlers.rcu(|current| {
            let next: Vec<_> = current
                .iter()
                .filter(|registration| registration.id != id)
                .cloned()
                .collect();
            removed = next.len() != current.len();
            next
        });
        removed
    }

    /// Removes every handler registered by `owner`, returning how many were dropped.
    pub fn unregister_owner(&self, owner: &ExtensionId) -> usize {
        let mut removed = 0;
        self.handlers.rcu(|current| {
            let next: Vec<_> = current
                .iter()
                .filter(|registration| &registration.owner != owner)
                .cloned()
                .collect();
            removed = current.len() - next.len();
            next
        });
        removed
    }

    /// True when at least one handler is registered.
    pub fn has_listeners(&self) -> bool {
        !self.handlers.load().is_empty()
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.load().len()
    }

    /// True when no handler is registered.
    pub fn is_empty(&self) -> bool {
        !self.has_listeners()
    }

    /// Invokes every handler registered before this call, in order.
    ///
    /// Handlers receive the session read-only and `args` mutably; events document
    /// which fields (if any) handlers may change.
    pub fn raise(&self, session: &SessionContext, args: &mut T) -> RaiseSummary {
        let snapshot = self.handlers.load_full();
        let mut summary = RaiseSummary::default();

        for registration in snapshot.iter() {
            summary.invoked += 1;

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                (registration.callback)(session, &mut *args)
            }));
            let fault = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(err)) => HandlerFault::Failed(format!("{err:#}")),
                Err(payload) => HandlerFault::Panicked(panic_message(payload.as_ref())),
            };

            error!(
                "extension '{}' failed in event {}: {fault}",
                registration.owner, self.name
            );
            summary.failures.push(HandlerFailure {
                handler_id: registration.id,
                owner: registration.owner.clone(),
                fault,
            });
        }

        summary
    }
}

impl<T> std::fmt::Debug for EventBus<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("name", &self.name)
            .field("handlers", &self.len())
            .finish()
    }
}
