//! Machine entity module
//!
//! This module defines the Machine entity. Machines are identified by a
//! stable string id (e.g. "MILL-01") used everywhere an operation, operator
//! work-center list, or schedule entry refers to a machine.

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{MachineType, Shift};

/// Operational status of a machine
///
/// Only Available machines participate in candidate selection; everything
/// else is excluded from placement outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MachineStatus {
    Available,
    Busy,
    Maintenance,
    Offline,
}

/// Represents one machine on the shop floor
///
/// Substitution groups are named equivalence classes of machines that may
/// stand in for one another; a machine may belong to several. A 4-axis mill
/// carries both the 4-axis and the 3-axis group so it can absorb 3-axis
/// work, while plain 3-axis mills carry only the 3-axis group and never
/// receive 4-axis operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Machine {
    /// Unique numeric identifier
    pub id: u64,
    /// Stable machine id referenced by routings and work-center lists
    pub machine_id: String,
    /// Kind of work center this machine provides
    pub machine_type: MachineType,
    /// Substitution groups this machine belongs to
    pub substitution_groups: Vec<String>,
    /// Operational status
    pub status: MachineStatus,
    /// Shifts during which this machine is staffed/run
    pub available_shifts: Vec<Shift>,
    /// Informational efficiency factor
    pub efficiency_factor: f64,
    /// Capability flags (e.g. "fourth_axis", "live_tooling", "bar_feeder")
    pub capabilities: Vec<String>,
}

impl Machine {
    /// Creates an Available machine running both shifts
    ///
    /// # Arguments
    ///
    /// * `id` - Unique numeric identifier
    /// * `machine_id` - Stable machine id (e.g. "MILL-01")
    /// * `machine_type` - Work-center kind
    pub fn new(id: u64, machine_id: &str, machine_type: MachineType) -> Self {
        Self {
            id,
            machine_id: machine_id.to_string(),
            machine_type,
            substitution_groups: Vec::new(),
            status: MachineStatus::Available,
            available_shifts: vec![Shift::First, Shift::Second],
            efficiency_factor: 1.0,
            capabilities: Vec::new(),
        }
    }

    /// Checks whether the machine may receive new schedule entries
    pub fn is_available(&self) -> bool {
        self.status == MachineStatus::Available
    }

    /// Checks whether the machine runs during the given shift
    pub fn runs_shift(&self, shift: Shift) -> bool {
        self.available_shifts.contains(&shift)
    }

    /// Checks whether this machine shares a substitution group with another
    ///
    /// # Arguments
    ///
    /// * `other` - The machine to compare groups with
    ///
    /// # Returns
    ///
    /// `true` if any group name appears in both membership lists
    pub fn shares_group_with(&self, other: &Machine) -> bool {
        self.substitution_groups
            .iter()
            .any(|g| other.substitution_groups.contains(g))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_machine_defaults() {
        let machine = Machine::new(1, "MILL-01", MachineType::Mill);
        assert!(machine.is_available());
        assert!(machine.runs_shift(Shift::First));
        assert!(machine.runs_shift(Shift::Second));
    }

    #[test]
    fn test_offline_machine_not_available() {
        let mut machine = Machine::new(1, "MILL-01", MachineType::Mill);
        machine.status = MachineStatus::Offline;
        assert!(!machine.is_available());
    }

    #[test]
    fn test_shares_group_with() {
        let mut four_axis = Machine::new(1, "HMC-05", MachineType::Mill);
        four_axis.substitution_groups = vec!["mill-4ax".to_string(), "mill-3ax".to_string()];

        let mut three_axis = Machine::new(2, "VMC-01", MachineType::Mill);
        three_axis.substitution_groups = vec!["mill-3ax".to_string()];

        let mut lathe = Machine::new(3, "LATHE-02", MachineType::Lathe);
        lathe.substitution_groups = vec!["lathe".to_string()];

        assert!(four_axis.shares_group_with(&three_axis));
        assert!(three_axis.shares_group_with(&four_axis));
        assert!(!lathe.shares_group_with(&four_axis));
    }
}
