pub mod machine_type;
pub mod priority;
pub mod shift;

pub use machine_type::MachineType;
pub use priority::JobPriority;
pub use shift::Shift;
