//! Two-factor authentication enrollment

mod enrollment;
pub mod totp;

pub use enrollment::{EnrollmentError, PendingEnrollment, TwoFactorEnrollment, TwoFactorRecord};
