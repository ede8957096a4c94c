pub mod job;
pub mod machine;
pub mod resource;
pub mod routing;
pub mod schedule_entry;
pub mod unavailability;

pub use job::{Job, JobStatus};
pub use machine::{Machine, MachineStatus};
pub use resource::{Resource, ResourceRole};
pub use routing::{validate_routing, RoutingError, RoutingOperation};
pub use schedule_entry::{EntryStatus, ScheduleEntry};
pub use unavailability::ResourceUnavailability;
