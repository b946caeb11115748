//! User profiles: provisioning from the identity provider and onboarding.

pub mod onboarding;
pub mod resume_storage;
pub mod webhook;

pub use resume_storage::{ResumeStorage, S3ResumeStorage};
