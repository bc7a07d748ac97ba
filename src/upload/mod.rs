//! Single-file upload coordination.
//!
//! * [`UploadCoordinator`] — validates and tracks the one in-flight upload.
//! * [`UploadValidationError`] — local rejections, raised before any network
//!   traffic.

pub mod coordinator;

pub use coordinator::{UploadCoordinator, UploadValidationError, ALLOWED_EXTENSIONS, MAX_FILE_MB};
