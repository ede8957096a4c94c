pub mod availability;
pub mod calendar;
pub mod compatibility;
pub mod placement;
pub mod shift_capacity;
pub mod substitution;

pub use availability::AvailabilityService;
pub use compatibility::CompatibilityFilter;
pub use placement::{PlacementEngine, PlacementFailure, PlacementRequest, PlacementResult};
pub use shift_capacity::{ShiftCapacityService, ShiftMetrics};
pub use substitution::SubstitutionResolver;
