//! Reusable precondition flows shared across scenarios

use serde::{Deserialize, Serialize};

use crate::scenario::{Step, Target, FIRST_ELEMENT_TIMEOUT_MS};

/// Account used to establish an authenticated session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Default for Credentials {
    fn default() -> Self {
        // The seed account provisioned in the application's test fixtures.
        Self {
            username: "mt".to_string(),
            password: "mt".to_string(),
        }
    }
}

/// The shared login fragment: navigate to the login page, submit the
/// credentials, and wait until the address settles on the application root.
///
/// Scenarios declaring `login: true` get these steps prepended before their
/// own. The first field waits longer than the step default because it races
/// the application's first render after a cold navigation.
pub fn login_steps(credentials: &Credentials) -> Vec<Step> {
    vec![
        Step::Navigate { path: "/login".to_string() },
        Step::Fill {
            selector: "input[name=\"username\"]".to_string(),
            value: credentials.username.clone(),
            timeout_ms: Some(FIRST_ELEMENT_TIMEOUT_MS),
        },
        Step::Fill {
            selector: "input[name=\"password\"]".to_string(),
            value: credentials.password.clone(),
            timeout_ms: None,
        },
        Step::Click { target: Target::css("#login-button"), timeout_ms: None },
        Step::AssertUrl {
            equals: Some("/".to_string()),
            contains: None,
            timeout_ms: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_fragment_shape() {
        let steps = login_steps(&Credentials::default());
        assert_eq!(steps.len(), 5);

        assert!(matches!(&steps[0], Step::Navigate { path } if path == "/login"));
        assert!(matches!(
            &steps[1],
            Step::Fill { value, timeout_ms: Some(FIRST_ELEMENT_TIMEOUT_MS), .. } if value == "mt"
        ));
        assert!(matches!(
            &steps[3],
            Step::Click { target, .. } if target.selector.as_deref() == Some("#login-button")
        ));
        assert!(matches!(
            &steps[4],
            Step::AssertUrl { equals: Some(path), contains: None, .. } if path == "/"
        ));
    }

    #[test]
    fn login_fragment_uses_given_credentials() {
        let credentials = Credentials {
            username: "testuser_123456".to_string(),
            password: "testpassword".to_string(),
        };
        let steps = login_steps(&credentials);

        let Step::Fill { selector, value, .. } = &steps[1] else {
            panic!("expected username fill");
        };
        assert_eq!(selector, "input[name=\"username\"]");
        assert_eq!(value, "testuser_123456");

        let Step::Fill { value, .. } = &steps[2] else {
            panic!("expected password fill");
        };
        assert_eq!(value, "testpassword");
    }
}
