//! Resource entity module
//!
//! This module defines the Resource entity: a human operator with a role, a
//! base shift schedule, the work centers they are qualified on, and free-form
//! skill tags matched against operation requirements.

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::Shift;

/// Role a resource fills on the floor
///
/// The role gates which operations a resource may run: quality inspectors
/// staff INSPECT operations, operators and shift leads staff production, and
/// the remaining roles never receive schedule entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceRole {
    Operator,
    ShiftLead,
    QualityInspector,
    Maintenance,
    Supervisor,
    Setup,
}

impl ResourceRole {
    /// Checks whether this role may run production operations
    pub fn runs_production(&self) -> bool {
        matches!(self, ResourceRole::Operator | ResourceRole::ShiftLead)
    }

    /// Checks whether this role may run inspection operations
    pub fn runs_inspection(&self) -> bool {
        matches!(self, ResourceRole::QualityInspector)
    }
}

/// Represents a human operator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    /// Unique resource identifier
    pub id: u64,
    /// Display name
    pub name: String,
    /// Role on the floor
    pub role: ResourceRole,
    /// Inactive resources never appear in any roster query
    pub active: bool,
    /// Shifts this resource is normally scheduled for
    pub shift_schedule: Vec<Shift>,
    /// Stable machine ids this resource is qualified to run
    pub work_centers: Vec<String>,
    /// Free-form skill tags (e.g. "cnc_operation", "gd&t")
    pub skills: Vec<String>,
}

impl Resource {
    /// Creates an active resource with no qualifications
    ///
    /// # Arguments
    ///
    /// * `id` - Unique identifier
    /// * `name` - Display name
    /// * `role` - Floor role
    /// * `shift_schedule` - Base shifts the resource works
    pub fn new(id: u64, name: &str, role: ResourceRole, shift_schedule: Vec<Shift>) -> Self {
        Self {
            id,
            name: name.to_string(),
            role,
            active: true,
            shift_schedule,
            work_centers: Vec::new(),
            skills: Vec::new(),
        }
    }

    /// Checks whether the resource's base schedule includes a shift
    pub fn works_shift(&self, shift: Shift) -> bool {
        self.shift_schedule.contains(&shift)
    }

    /// Checks whether the resource is qualified on a machine
    ///
    /// # Arguments
    ///
    /// * `machine_id` - Stable machine id to look for
    pub fn qualified_on(&self, machine_id: &str) -> bool {
        self.work_centers.iter().any(|wc| wc == machine_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_gates() {
        assert!(ResourceRole::Operator.runs_production());
        assert!(ResourceRole::ShiftLead.runs_production());
        assert!(!ResourceRole::QualityInspector.runs_production());
        assert!(ResourceRole::QualityInspector.runs_inspection());
        assert!(!ResourceRole::Maintenance.runs_production());
        assert!(!ResourceRole::Supervisor.runs_inspection());
    }

    #[test]
    fn test_qualified_on() {
        let mut alice = Resource::new(1, "Alice", ResourceRole::Operator, vec![Shift::First]);
        alice.work_centers = vec!["MILL-01".to_string()];
        assert!(alice.qualified_on("MILL-01"));
        assert!(!alice.qualified_on("LATHE-02"));
    }

    #[test]
    fn test_works_shift() {
        let drew = Resource::new(2, "Drew", ResourceRole::Operator, vec![Shift::First]);
        assert!(drew.works_shift(Shift::First));
        assert!(!drew.works_shift(Shift::Second));
    }
}
