//! Operator compatibility service module
//!
//! This module decides which operators may run a given operation on a given
//! machine. The machine type picks the eligible roles (quality inspectors
//! for INSPECT, operators and shift leads for production, nobody for
//! OUTSOURCE); the operator must additionally be active, qualified on the
//! machine, cover the operation's required skills, and match the operator
//! lock when a prior chunk has pinned one.

use tracing::debug;

use crate::domain::entities::{Machine, Resource, RoutingOperation};

/// Role, work-center and skill gate for operator assignment
pub struct CompatibilityFilter;

impl CompatibilityFilter {
    /// Creates a new CompatibilityFilter
    pub fn new() -> Self {
        Self
    }

    /// Checks a single operator against a machine and operation
    ///
    /// # Arguments
    ///
    /// * `resource` - The operator under consideration
    /// * `machine` - The candidate machine
    /// * `operation` - The operation to staff
    ///
    /// # Returns
    ///
    /// `true` when the operator passes every gate
    pub fn is_compatible(
        &self,
        resource: &Resource,
        machine: &Machine,
        operation: &RoutingOperation,
    ) -> bool {
        if operation.machine_type.is_outsource() {
            return false;
        }
        if !resource.active {
            return false;
        }

        let role_ok = if operation.machine_type.is_inspect() {
            resource.role.runs_inspection()
        } else {
            resource.role.runs_production()
        };
        if !role_ok {
            return false;
        }

        if !resource.qualified_on(&machine.machine_id) {
            return false;
        }

        operation
            .required_skills
            .iter()
            .all(|required| resource.skills.iter().any(|skill| skills_match(required, skill)))
    }

    /// Filters a roster down to operators eligible for machine + operation
    ///
    /// When `locked` names an operator (a prior chunk of the same operation
    /// pinned one), only that operator can qualify.
    ///
    /// # Arguments
    ///
    /// * `roster` - Operators in roster insertion order
    /// * `machine` - The candidate machine
    /// * `operation` - The operation to staff
    /// * `locked` - Operator id pinned by a prior chunk, if any
    ///
    /// # Returns
    ///
    /// Eligible operators in roster order (empty for OUTSOURCE)
    pub fn eligible_operators<'a>(
        &self,
        roster: &'a [Resource],
        machine: &Machine,
        operation: &RoutingOperation,
        locked: Option<u64>,
    ) -> Vec<&'a Resource> {
        let eligible: Vec<&Resource> = roster
            .iter()
            .filter(|resource| match locked {
                Some(locked_id) => resource.id == locked_id,
                None => true,
            })
            .filter(|resource| self.is_compatible(resource, machine, operation))
            .collect();
        debug!(
            machine = %machine.machine_id,
            sequence = operation.sequence,
            eligible = eligible.len(),
            "operator compatibility evaluated"
        );
        eligible
    }
}

impl Default for CompatibilityFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// Case-insensitive substring match in either direction
///
/// A required skill "CNC" is covered by an operator tag "cnc_operation",
/// and a broad required tag is equally covered by a narrower operator tag.
/// TODO: tighten to exact tag matching once imported routings carry
/// normalized skill tags; the substring rule admits spurious pairs like
/// "cnc" / "increment".
fn skills_match(required: &str, skill: &str) -> bool {
    let required = required.to_lowercase();
    let skill = skill.to_lowercase();
    required.contains(&skill) || skill.contains(&required)
}
