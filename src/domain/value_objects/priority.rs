//! Job Priority value object module
//!
//! This module defines the JobPriority value object which determines
//! the order in which unscheduled jobs are placed during a batch pass.

use serde::{Deserialize, Serialize};

/// Represents the scheduling priority of a job
///
/// Priorities order the batch "schedule all" pass: Critical jobs are placed
/// first, Low jobs last. The derived ordering is ascending (Low < Normal <
/// High < Critical) so that `Ord::max` and descending sorts behave naturally.
/// Critical and High jobs are also the only ones allowed to displace
/// lower-priority schedule entries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum JobPriority {
    /// Lowest priority; scheduled last, displaceable by anything above it
    Low,
    /// Default priority for routine work
    Normal,
    /// Elevated priority; may displace Normal and Low entries
    High,
    /// Highest priority; placed first in every batch pass
    Critical,
}

impl JobPriority {
    /// Returns the numeric rank of the priority
    ///
    /// # Returns
    ///
    /// 0 for Low up to 3 for Critical
    pub fn rank(&self) -> u8 {
        match self {
            JobPriority::Low => 0,
            JobPriority::Normal => 1,
            JobPriority::High => 2,
            JobPriority::Critical => 3,
        }
    }

    /// Checks whether jobs of this priority may displace lower-priority work
    ///
    /// Only Critical and High jobs are permitted to evict existing schedule
    /// entries when every candidate machine is saturated.
    ///
    /// # Returns
    ///
    /// `true` for Critical and High, `false` otherwise
    pub fn may_displace(&self) -> bool {
        matches!(self, JobPriority::Critical | JobPriority::High)
    }

    /// Parses a priority from its string form
    ///
    /// Matching is case-insensitive. Unknown strings fall back to Normal,
    /// mirroring how externally imported jobs arrive with free-form tags.
    ///
    /// # Arguments
    ///
    /// * `value` - The string to parse
    ///
    /// # Returns
    ///
    /// The parsed JobPriority
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "critical" => JobPriority::Critical,
            "high" => JobPriority::High,
            "low" => JobPriority::Low,
            _ => JobPriority::Normal,
        }
    }
}

impl Default for JobPriority {
    fn default() -> Self {
        JobPriority::Normal
    }
}

impl std::fmt::Display for JobPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            JobPriority::Low => "Low",
            JobPriority::Normal => "Normal",
            JobPriority::High => "High",
            JobPriority::Critical => "Critical",
        };
        write!(f, "{}", label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordering() {
        assert!(JobPriority::Critical > JobPriority::High);
        assert!(JobPriority::High > JobPriority::Normal);
        assert!(JobPriority::Normal > JobPriority::Low);
    }

    #[test]
    fn test_may_displace() {
        assert!(JobPriority::Critical.may_displace());
        assert!(JobPriority::High.may_displace());
        assert!(!JobPriority::Normal.may_displace());
        assert!(!JobPriority::Low.may_displace());
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!(JobPriority::parse("CRITICAL"), JobPriority::Critical);
        assert_eq!(JobPriority::parse("high"), JobPriority::High);
        assert_eq!(JobPriority::parse("nonsense"), JobPriority::Normal);
    }
}
