// Runtime services shared by the widgets. Constructed once in `Site::bootstrap`.
pub mod contact_client;
pub mod error_boundary;
pub mod integration;
pub mod page;
pub mod performance;
pub mod preferences;

pub use contact_client::{ContactClient, SubmissionError};
pub use error_boundary::{BoundaryState, ErrorBoundaryManager, RecoveryOutcome};
pub use integration::{ComponentIntegration, IntegrationStatus, SLOW_INTEGRATION};
pub use page::{DegradedView, FlashSet, HeadlessPage, PageHost, Surface};
pub use performance::{Capabilities, ErrorSink, Feature, LoadReducer, NoopSink, PerformanceMonitor, Reduction};
pub use preferences::{FilePreferenceStore, MemoryPreferenceStore, PreferenceStore};
