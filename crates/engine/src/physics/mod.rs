pub mod data;
pub mod worklist;

pub use data::PhysData;
pub use worklist::{
    CapacityPolicy, EntryState, PassWindow, PhysInfo, PhysicsWorklist, ScheduleResult,
};
