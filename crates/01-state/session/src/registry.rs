//! Registry of live host instances for split-screen and multi-session hosts.

use std::collections::BTreeSet;

use log::{debug, trace};
use smallvec::SmallVec;

use crate::context::SessionContext;

/// At or below this many live instances the host is not split-screen.
const SINGLE_INSTANCE_THRESHOLD: usize = 1;

/// One locally hosted instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InstanceEntry {
    /// Host-assigned instance id.
    pub instance_id: i32,
    /// Participant playing in this instance, once known.
    pub owner_participant: Option<i64>,
}

/// Tracks the set of active instances and who plays in each.
///
/// Hosts rarely run more than four local instances, so entries live inline and
/// lookups are linear.
#[derive(Debug, Default)]
pub struct InstanceRegistry {
    entries: SmallVec<[InstanceEntry; 4]>,
    last_removed: Option<i32>,
    multi_instance: bool,
}

impl InstanceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new live instance. Returns `false` if it was already present.
    pub fn add_instance(&mut self, instance_id: i32) -> bool {
        if self.contains(instance_id) {
            trace!("registry: instance {instance_id} already registered");
            return false;
        }

        self.entries.push(InstanceEntry {
            instance_id,
            owner_participant: None,
        });
        if self.entries.len() > SINGLE_INSTANCE_THRESHOLD {
            self.multi_instance = true;
        }
        debug!(
            "registry: instance {instance_id} added ({} live)",
            self.entries.len()
        );
        true
    }

    /// Removes a live instance. Returns `false` if it was not registered.
    pub fn remove_instance(&mut self, instance_id: i32) -> bool {
        let Some(pos) = self
            .entries
            .iter()
            .position(|entry| entry.instance_id == instance_id)
        else {
            trace!("registry: instance {instance_id} not registered");
            return false;
        };

        self.entries.remove(pos);
        self.last_removed = Some(instance_id);
        if self.entries.len() <= SINGLE_INSTANCE_THRESHOLD {
            self.multi_instance = false;
        }
        debug!(
            "registry: instance {instance_id} removed ({} live)",
            self.entries.len()
        );
        true
    }

    /// Records which participant plays in `instance_id`.
    pub fn assign_participant(&mut self, instance_id: i32, participant: Option<i64>) -> bool {
        match self
            .entries
            .iter_mut()
            .find(|entry| entry.instance_id == instance_id)
        {
            Some(entry) => {
                entry.owner_participant = participant;
                true
            }
            None => false,
        }
    }

    /// Returns the instance hosting `participant`, or `None` if it is not local.
    pub fn resolve_instance_for(&self, participant: i64) -> Option<i32> {
        self.entries
            .iter()
            .find(|entry| entry.owner_participant == Some(participant))
            .map(|entry| entry.instance_id)
    }

    /// Returns `true` when `instance_id` is live.
    pub fn contains(&self, instance_id: i32) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.instance_id == instance_id)
    }

    /// Ids of all live instances.
    pub fn active_ids(&self) -> BTreeSet<i32> {
        self.entries.iter().map(|entry| entry.instance_id).collect()
    }

    /// Live entries in insertion order.
    pub fn entries(&self) -> &[InstanceEntry] {
        &self.entries
    }

    /// Id of the most recently removed instance.
    pub fn last_removed(&self) -> Option<i32> {
        self.last_removed
    }

    /// True while more than one instance is live.
    pub fn is_multi_instance(&self) -> bool {
        self.multi_instance
    }

    /// Number of live instances.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no instance is live.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copies membership into the session so extensions observe it.
    pub fn sync_into(&self, session: &mut SessionContext) {
        session.set_instances(self.active_ids(), self.last_removed, self.multi_instance);
    }
}
