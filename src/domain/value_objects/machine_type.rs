//! Machine Type value object module
//!
//! This module defines the machine-type tag carried by machines and routing
//! operations. Imported routings arrive with free-form type strings; known
//! tags become enum variants and everything else is preserved under `Other`
//! so it can still be matched by the type-fallback candidate rule.

use serde::{Deserialize, Serialize};

/// The kind of work center an operation requires
///
/// The tag decides which operators may run the operation: INSPECT work is
/// restricted to quality inspectors, OUTSOURCE work is scheduled with no
/// operator at all, and every other tag is a production type staffed by
/// operators and shift leads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MachineType {
    Mill,
    Lathe,
    Saw,
    Deburr,
    Inspect,
    Outsource,
    /// Unrecognized tag, preserved verbatim (uppercased) for type matching
    Other(String),
}

impl MachineType {
    /// Parses a machine type from its free-form string tag
    ///
    /// Matching is case-insensitive; unknown tags are preserved uppercased
    /// under `Other` so two occurrences of the same unknown tag still
    /// compare equal.
    ///
    /// # Arguments
    ///
    /// * `tag` - The raw type string (e.g. "MILL", "lathe", "WELD")
    ///
    /// # Returns
    ///
    /// The parsed MachineType
    pub fn parse(tag: &str) -> Self {
        match tag.trim().to_ascii_uppercase().as_str() {
            "MILL" => MachineType::Mill,
            "LATHE" => MachineType::Lathe,
            "SAW" => MachineType::Saw,
            "DEBURR" => MachineType::Deburr,
            "INSPECT" => MachineType::Inspect,
            "OUTSOURCE" => MachineType::Outsource,
            other => MachineType::Other(other.to_string()),
        }
    }

    /// Returns the canonical uppercase tag for this type
    pub fn tag(&self) -> &str {
        match self {
            MachineType::Mill => "MILL",
            MachineType::Lathe => "LATHE",
            MachineType::Saw => "SAW",
            MachineType::Deburr => "DEBURR",
            MachineType::Inspect => "INSPECT",
            MachineType::Outsource => "OUTSOURCE",
            MachineType::Other(tag) => tag,
        }
    }

    /// Checks whether operations of this type are sent to outside vendors
    ///
    /// OUTSOURCE operations are scheduled without an operator and without a
    /// per-machine capacity ceiling.
    pub fn is_outsource(&self) -> bool {
        matches!(self, MachineType::Outsource)
    }

    /// Checks whether operations of this type are quality inspections
    ///
    /// INSPECT operations may only be staffed by quality inspectors.
    pub fn is_inspect(&self) -> bool {
        matches!(self, MachineType::Inspect)
    }

    /// Checks whether this is an in-house production type
    ///
    /// # Returns
    ///
    /// `true` for everything except INSPECT and OUTSOURCE
    pub fn is_production(&self) -> bool {
        !self.is_inspect() && !self.is_outsource()
    }
}

impl From<String> for MachineType {
    fn from(value: String) -> Self {
        MachineType::parse(&value)
    }
}

impl From<MachineType> for String {
    fn from(value: MachineType) -> Self {
        value.tag().to_string()
    }
}

impl std::fmt::Display for MachineType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_tags() {
        assert_eq!(MachineType::parse("MILL"), MachineType::Mill);
        assert_eq!(MachineType::parse("lathe"), MachineType::Lathe);
        assert_eq!(MachineType::parse(" Inspect "), MachineType::Inspect);
        assert_eq!(MachineType::parse("OUTSOURCE"), MachineType::Outsource);
    }

    #[test]
    fn test_parse_unknown_tag_preserved() {
        let weld = MachineType::parse("weld");
        assert_eq!(weld, MachineType::Other("WELD".to_string()));
        assert_eq!(weld, MachineType::parse("WELD"));
        assert_eq!(weld.tag(), "WELD");
    }

    #[test]
    fn test_role_classification() {
        assert!(MachineType::Mill.is_production());
        assert!(MachineType::Other("WELD".to_string()).is_production());
        assert!(MachineType::Inspect.is_inspect());
        assert!(!MachineType::Inspect.is_production());
        assert!(MachineType::Outsource.is_outsource());
        assert!(!MachineType::Outsource.is_production());
    }
}
