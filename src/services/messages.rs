//! User-facing messages for provider error codes

/// Fallback for codes the table does not know
pub const GENERIC_MESSAGE: &str = "Something went wrong. Please try again.";

/// Map a provider error code to the message shown in a toast
pub fn user_message(code: &str) -> &'static str {
    match code {
        // Authentication
        "auth/wrong-password" | "auth/invalid-credential" => {
            "Incorrect password. Please try again."
        }
        "auth/user-not-found" => "No account found with this email.",
        "auth/email-already-in-use" => "An account with this email already exists.",
        "auth/invalid-email" => "Please enter a valid email address.",
        "auth/weak-password" => "Password should be at least 6 characters.",
        "auth/too-many-requests" => "Too many attempts. Please wait a moment and try again.",
        "auth/network-request-failed" | "network" => {
            "Network error. Check your connection and try again."
        }
        "auth/requires-recent-login" => "Please sign in again to continue.",
        "auth/popup-closed-by-user" => "Sign-in was cancelled.",

        // Two-factor
        "otp/invalid-code" => "Invalid verification code. Please try again.",
        "otp/not-enrolled" => "Start two-factor setup before verifying a code.",

        // Billing
        "card_declined" => "Your card was declined.",
        "expired_card" => "Your card has expired.",
        "incorrect_cvc" => "Your card's security code is incorrect.",
        "processing_error" => "An error occurred while processing your card. Please try again.",
        "resource_missing" => "The requested billing record could not be found.",
        "billing/no-customer" => "No billing account exists yet.",
        "billing/no-email" => "Add an email address to your account before adding billing details.",

        // Storage and rewrite
        "storage/unavailable" => "Could not save your changes. Please try again.",
        "storage/invalid-section" => "This section cannot be saved.",
        "storage/file-source" => "A selected file can no longer be read. Please choose it again.",
        "rewrite/failed" => "Could not enhance the text right now.",

        _ => GENERIC_MESSAGE,
    }
}
