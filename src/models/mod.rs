pub mod capture;
pub mod outcome;
pub mod sheet_ctx;
pub mod template;

pub use capture::{Capture, ImagePayload};
pub use outcome::{BatchSummary, ScanResult, Score, SubmissionOutcome};
pub use sheet_ctx::SheetCtx;
pub use template::SheetTemplate;
