//! Machine substitution service module
//!
//! This module builds the ordered candidate-machine set for an operation:
//! the quoted machine first (honoring the quote), then its substitution
//! group peers, then the operation's explicit allow-list, and only when all
//! of those are empty, every available machine of the operation's type.
//! Machines not in Available status never appear.

use std::collections::HashSet;

use tracing::debug;

use crate::domain::entities::{Machine, RoutingOperation};

/// Resolves which machines may run an operation, in preference order
pub struct SubstitutionResolver {
    machines: Vec<Machine>,
}

/// Appends a machine if it is available and not already present
fn push_candidate<'a>(
    machine: &'a Machine,
    candidates: &mut Vec<&'a Machine>,
    seen: &mut HashSet<&'a str>,
) {
    if machine.is_available() && seen.insert(machine.machine_id.as_str()) {
        candidates.push(machine);
    }
}

impl SubstitutionResolver {
    /// Creates a resolver over a machine-fleet snapshot
    ///
    /// # Arguments
    ///
    /// * `machines` - All machines, in fleet listing order
    pub fn new(machines: Vec<Machine>) -> Self {
        Self { machines }
    }

    /// The fleet snapshot the resolver works from
    pub fn machines(&self) -> &[Machine] {
        &self.machines
    }

    /// Looks up a machine by stable id
    pub fn machine(&self, machine_id: &str) -> Option<&Machine> {
        self.machines.iter().find(|m| m.machine_id == machine_id)
    }

    /// Builds the ordered candidate set for an operation
    ///
    /// Order: quoted machine, its substitution-group peers, the explicit
    /// compatible-machines list, then (only if still empty) the type
    /// fallback. Insertion order is preserved and duplicates dropped.
    /// An empty result means the operation is unplaceable.
    ///
    /// # Arguments
    ///
    /// * `operation` - The operation to find machines for
    ///
    /// # Returns
    ///
    /// Candidate machines, most preferred first
    pub fn candidates(&self, operation: &RoutingOperation) -> Vec<&Machine> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut candidates: Vec<&Machine> = Vec::new();

        let quoted = operation
            .original_quoted_machine
            .as_deref()
            .and_then(|id| self.machine(id))
            .filter(|m| m.is_available());

        if let Some(quoted) = quoted {
            push_candidate(quoted, &mut candidates, &mut seen);
            for machine in &self.machines {
                if machine.machine_id != quoted.machine_id && machine.shares_group_with(quoted) {
                    push_candidate(machine, &mut candidates, &mut seen);
                }
            }
        }

        for machine_id in &operation.compatible_machines {
            if let Some(machine) = self.machine(machine_id) {
                push_candidate(machine, &mut candidates, &mut seen);
            }
        }

        if candidates.is_empty() {
            for machine in &self.machines {
                if machine.machine_type == operation.machine_type {
                    push_candidate(machine, &mut candidates, &mut seen);
                }
            }
        }

        debug!(
            job_id = operation.job_id,
            sequence = operation.sequence,
            count = candidates.len(),
            "candidate machines resolved"
        );
        candidates
    }
}
