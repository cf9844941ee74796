//! Services for the dashboard
//!
//! Intake, the two external service clients, the in-memory stores and the
//! result presenter.

pub mod claim_client;
pub mod detection_client;
pub mod intake;
pub mod presenter;
pub mod preview_store;
pub mod record_store;
pub mod samples;
pub mod submission;

pub use claim_client::{ClaimClient, ClaimError};
pub use detection_client::{endpoint_for, DetectionClient, PendingDetection, SubmissionError};
pub use intake::{
    mime_from_extension, resolve_mime, AcceptList, AcceptedFile, FileIntake, IncomingFile,
    IntakeBatch, IntakeError, MediaFile, Rejection,
};
pub use presenter::{present, present_claim, ClaimView, ResultView};
pub use preview_store::{PreviewHandle, PreviewStore};
pub use record_store::RecordStore;
pub use samples::{SampleCatalog, SampleEntry, SampleError};
pub use submission::Submitter;
