//! Boundary to external collaborators
//!
//! Every external system the engine talks to (persistence, text rewrite,
//! toasts, OTP verification, billing) is reached through a trait in
//! [`traits`], so flows can be driven by mocks in tests and by real clients
//! in the frontend.

mod json_store;
mod messages;
mod traits;

pub use json_store::JsonFileStore;
pub use messages::{user_message, GENERIC_MESSAGE};
pub use traits::{
    BillingProvider, Notice, NoticeLevel, Notifier, OtpVerifier, RewriteRequest, SectionStore,
    TextRewriter, TwoFactorStore,
};

#[cfg(test)]
pub use traits::{
    MockBillingProvider, MockNotifier, MockOtpVerifier, MockSectionStore, MockTextRewriter,
    MockTwoFactorStore,
};
