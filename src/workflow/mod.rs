pub mod scan_scheduler;

pub use scan_scheduler::{ScanMode, ScanScheduler, SchedulerState, Settled, TickDecision};
