//! Settings screen form state.
//!
//! Lives only as long as the settings screen is mounted. Nothing here is
//! validated or persisted.

use serde::Serialize;

/// Mail domain used for the default address shown on the settings form.
const DEFAULT_MAIL_DOMAIN: &str = "hoh.com";

/// Editable profile and preference fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preferences {
    pub display_name: String,
    pub email: String,
    pub dark_mode: bool,
    pub notifications: bool,
}

impl Preferences {
    /// Defaults derived from the signed-in username.
    #[must_use]
    pub fn for_user(username: &str) -> Self {
        Self {
            display_name: username.to_string(),
            email: format!("{}@{DEFAULT_MAIL_DOMAIN}", username.to_lowercase()),
            dark_mode: false,
            notifications: true,
        }
    }

    /// Overwrite with a submitted form.
    pub fn apply(&mut self, update: Preferences) {
        *self = update;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_for_user() {
        let prefs = Preferences::for_user("HanuShri");

        assert_eq!(prefs.display_name, "HanuShri");
        assert_eq!(prefs.email, "hanushri@hoh.com");
        assert!(!prefs.dark_mode);
        assert!(prefs.notifications);
    }

    #[test]
    fn test_apply_replaces_all_fields() {
        let mut prefs = Preferences::for_user("alice");
        prefs.apply(Preferences {
            display_name: String::new(),
            email: "not-an-email".to_string(),
            dark_mode: true,
            notifications: false,
        });

        assert_eq!(prefs.display_name, "");
        assert_eq!(prefs.email, "not-an-email");
        assert!(prefs.dark_mode);
        assert!(!prefs.notifications);
    }
}
