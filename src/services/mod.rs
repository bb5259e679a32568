pub mod capture_store;
pub mod scan_reporter;

pub use capture_store::CaptureStore;
pub use scan_reporter::{ConsoleReporter, ScanObserver};
