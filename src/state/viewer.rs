//! The signed-in user a form is rendered for

use serde::{Deserialize, Serialize};

/// How the account was created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityProvider {
    #[default]
    Password,
    Google,
}

impl IdentityProvider {
    /// Accounts whose email is owned by an external identity provider
    pub fn is_third_party(self) -> bool {
        matches!(self, IdentityProvider::Google)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    pub uid: String,
    pub email: Option<String>,
    #[serde(default)]
    pub provider: IdentityProvider,
}

impl Viewer {
    pub fn new(uid: &str, email: Option<&str>, provider: IdentityProvider) -> Self {
        Self {
            uid: uid.to_string(),
            email: email.map(str::to_string),
            provider,
        }
    }

    /// The account email is owned by the identity provider for third-party
    /// sign-ins; the `email` question is then read-only and never validated
    pub fn locks(&self, question_id: &str) -> bool {
        question_id == "email" && self.provider.is_third_party()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_google_is_third_party() {
        assert!(IdentityProvider::Google.is_third_party());
        assert!(!IdentityProvider::Password.is_third_party());
    }

    #[test]
    fn test_google_viewer_locks_email_only() {
        let viewer = Viewer::new("u", None, IdentityProvider::Google);
        assert!(viewer.locks("email"));
        assert!(!viewer.locks("phoneNumber"));
        assert!(!Viewer::default().locks("email"));
    }

    #[test]
    fn test_provider_defaults_when_missing() {
        let viewer: Viewer = serde_json::from_str(r#"{"uid": "u1", "email": null}"#).unwrap();
        assert_eq!(viewer.provider, IdentityProvider::Password);
    }
}
