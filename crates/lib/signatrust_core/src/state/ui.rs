//! Transient UI flags.

use url::Url;

use crate::models::UserIdentity;

/// Login progress, identity and modal state shared by the views.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiState {
    identity: Option<UserIdentity>,
    is_logging_in: bool,
    login_frame_url: Option<Url>,
    dialog_image_url: Option<String>,
}

impl UiState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn identity(&self) -> Option<&UserIdentity> {
        self.identity.as_ref()
    }

    pub fn is_logging_in(&self) -> bool {
        self.is_logging_in
    }

    pub fn login_frame_url(&self) -> Option<&Url> {
        self.login_frame_url.as_ref()
    }

    pub fn dialog_image_url(&self) -> Option<&str> {
        self.dialog_image_url.as_deref()
    }

    /// Marks a login as started against `frame_url`.
    pub fn begin_login(&mut self, frame_url: Url) {
        self.is_logging_in = true;
        self.login_frame_url = Some(frame_url);
    }

    /// Marks the login as finished, with the identity when it succeeded.
    pub fn finish_login(&mut self, identity: Option<UserIdentity>) {
        self.is_logging_in = false;
        self.login_frame_url = None;
        self.identity = identity;
    }

    pub fn set_identity(&mut self, identity: UserIdentity) {
        self.identity = Some(identity);
    }

    /// Forgets the identity after the session was rejected.
    pub fn reset_identity(&mut self) {
        self.identity = None;
        self.is_logging_in = false;
    }

    pub fn show_image(&mut self, url: impl Into<String>) {
        self.dialog_image_url = Some(url.into());
    }

    pub fn close_image(&mut self) {
        self.dialog_image_url = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_lifecycle() {
        let mut ui = UiState::new();
        ui.begin_login(Url::parse("https://id.example.com/login").unwrap());
        assert!(ui.is_logging_in());
        assert!(ui.login_frame_url().is_some());

        ui.finish_login(Some(UserIdentity {
            id: 1,
            email: "ops@example.com".into(),
        }));
        assert!(!ui.is_logging_in());
        assert!(ui.login_frame_url().is_none());
        assert_eq!(ui.identity().map(|u| u.id), Some(1));

        ui.reset_identity();
        assert!(ui.identity().is_none());
    }

    #[test]
    fn image_dialog() {
        let mut ui = UiState::new();
        ui.show_image("https://cdn.example.com/logo.png");
        assert_eq!(ui.dialog_image_url(), Some("https://cdn.example.com/logo.png"));
        ui.close_image();
        assert!(ui.dialog_image_url().is_none());
    }
}
