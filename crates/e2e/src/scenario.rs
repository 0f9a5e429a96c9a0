//! Declarative YAML scenario model

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{E2eError, E2eResult};

/// Default bounded wait for element and URL conditions.
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Wait applied to the first interactive element after the initial
/// navigation, which may race the application's first render.
pub const FIRST_ELEMENT_TIMEOUT_MS: u64 = 10_000;

/// A complete scenario parsed from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Unique name for this scenario
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Tags for filtering scenarios
    #[serde(default)]
    pub tags: Vec<String>,

    /// Clear cookies and local storage before the first step
    #[serde(default)]
    pub clean_session: bool,

    /// Establish an authenticated session before the first step
    #[serde(default)]
    pub login: bool,

    /// Viewport size for the browser
    #[serde(default = "default_viewport")]
    pub viewport: Viewport,

    /// Steps to execute in order
    pub steps: Vec<Step>,
}

fn default_viewport() -> Viewport {
    Viewport { width: 1280, height: 720 }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// A single step in a scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Navigate to a path (relative to the base URL)
    Navigate { path: String },

    /// Clear an input field and fill it with a value
    Fill {
        selector: String,
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },

    /// Click an element
    Click {
        #[serde(flatten)]
        target: Target,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },

    /// Assert that an element is visible
    AssertVisible {
        #[serde(flatten)]
        target: Target,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },

    /// Assert that an element is absent from the DOM
    AssertAbsent {
        #[serde(flatten)]
        target: Target,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },

    /// Assert the current address, by exact match against the base URL
    /// plus `equals`, or by substring match against `contains`
    AssertUrl {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        equals: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        contains: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },

    /// Assert an attribute value on an element
    AssertAttribute {
        #[serde(flatten)]
        target: Target,
        name: String,
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },
}

/// How an element step addresses the DOM: a CSS selector, a visible-text
/// match, or both (CSS narrowed by contained text, the shape the
/// application's text-labelled buttons require).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Target {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Target {
    pub fn css(selector: impl Into<String>) -> Self {
        Self { selector: Some(selector.into()), text: None }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self { selector: None, text: Some(text.into()) }
    }

    pub fn css_with_text(selector: impl Into<String>, text: impl Into<String>) -> Self {
        Self { selector: Some(selector.into()), text: Some(text.into()) }
    }

    /// Resolve into a concrete locator, rejecting targetless steps
    pub fn locator(&self) -> E2eResult<Locator> {
        match (&self.selector, &self.text) {
            (Some(css), Some(text)) => Ok(Locator::CssWithText {
                css: css.clone(),
                text: text.clone(),
            }),
            (Some(css), None) => Ok(Locator::Css(css.clone())),
            (None, Some(text)) => Ok(Locator::Text(text.clone())),
            (None, None) => Err(E2eError::ScenarioParse(
                "element step needs a selector, a text match, or both".to_string(),
            )),
        }
    }
}

/// A resolved element locator; the first matching element wins
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// CSS selector (e.g. `#login-button`)
    Css(String),
    /// Visible text content (e.g. `Workspace Info`)
    Text(String),
    /// CSS selector narrowed by contained text (e.g. `button` + `View`)
    CssWithText { css: String, text: String },
}

impl Locator {
    /// Short form used in step names and diagnostics
    pub fn describe(&self) -> String {
        match self {
            Locator::Css(css) => css.clone(),
            Locator::Text(text) => format!("text={}", text),
            Locator::CssWithText { css, text } => format!("{} >> text={}", css, text),
        }
    }
}

impl Step {
    /// Short name for logs and step results
    pub fn name(&self) -> String {
        match self {
            Step::Navigate { path } => format!("navigate:{}", path),
            Step::Fill { selector, .. } => format!("fill:{}", selector),
            Step::Click { target, .. } => format!("click:{}", describe_target(target)),
            Step::AssertVisible { target, .. } => {
                format!("assert_visible:{}", describe_target(target))
            }
            Step::AssertAbsent { target, .. } => {
                format!("assert_absent:{}", describe_target(target))
            }
            Step::AssertUrl { equals, contains, .. } => match (equals, contains) {
                (Some(path), _) => format!("assert_url:={}", path),
                (None, Some(fragment)) => format!("assert_url:~{}", fragment),
                (None, None) => "assert_url".to_string(),
            },
            Step::AssertAttribute { target, name, .. } => {
                format!("assert_attribute:{}[{}]", describe_target(target), name)
            }
        }
    }
}

fn describe_target(target: &Target) -> String {
    target
        .locator()
        .map(|l| l.describe())
        .unwrap_or_else(|_| "<no target>".to_string())
}

impl Scenario {
    /// Parse a scenario from a YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        let scenario: Scenario = serde_yaml::from_str(yaml)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Parse a scenario from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content).map_err(|e| match e {
            E2eError::ScenarioParse(msg) => {
                E2eError::ScenarioParse(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// Load all scenarios from a directory, sorted by file name
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        let mut scenarios = Vec::new();
        for entry in walkdir::WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
        {
            scenarios.push(Self::from_file(entry.path())?);
        }
        Ok(scenarios)
    }

    /// Filter scenarios by tag
    pub fn filter_by_tag<'a>(scenarios: &'a [Self], tag: &str) -> Vec<&'a Self> {
        scenarios
            .iter()
            .filter(|s| s.tags.iter().any(|t| t == tag))
            .collect()
    }

    /// Reject scenarios a runner could not execute meaningfully
    pub fn validate(&self) -> E2eResult<()> {
        if self.name.trim().is_empty() {
            return Err(E2eError::ScenarioParse("scenario name is empty".to_string()));
        }
        if self.steps.is_empty() {
            return Err(E2eError::ScenarioParse(format!(
                "scenario '{}' has no steps",
                self.name
            )));
        }

        for (index, step) in self.steps.iter().enumerate() {
            self.validate_step(index, step)?;
        }
        Ok(())
    }

    fn validate_step(&self, index: usize, step: &Step) -> E2eResult<()> {
        let fail = |msg: String| {
            Err(E2eError::ScenarioParse(format!(
                "scenario '{}', step {}: {}",
                self.name, index, msg
            )))
        };

        match step {
            Step::Navigate { path } => {
                if !path.starts_with('/') {
                    return fail(format!("path '{}' must start with '/'", path));
                }
            }
            Step::Fill { selector, .. } => {
                if selector.trim().is_empty() {
                    return fail("fill selector is empty".to_string());
                }
            }
            Step::Click { target, .. }
            | Step::AssertVisible { target, .. }
            | Step::AssertAbsent { target, .. }
            | Step::AssertAttribute { target, .. } => {
                if let Err(e) = target.locator() {
                    return fail(e.to_string());
                }
            }
            Step::AssertUrl { equals, contains, .. } => match (equals, contains) {
                (Some(_), Some(_)) => {
                    return fail("assert_url takes either 'equals' or 'contains', not both".to_string());
                }
                (None, None) => {
                    return fail("assert_url needs 'equals' or 'contains'".to_string());
                }
                _ => {}
            },
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn parse_login_scenario() {
        let yaml = r#"
name: login
description: Login with the seeded credentials
tags:
  - auth
  - smoke
steps:
  - action: navigate
    path: /login
  - action: fill
    selector: 'input[name="username"]'
    value: mt
  - action: fill
    selector: 'input[name="password"]'
    value: mt
  - action: click
    selector: '#login-button'
  - action: assert_url
    equals: /
"#;
        let scenario = Scenario::from_yaml(yaml).unwrap();
        assert_eq!(scenario.name, "login");
        assert_eq!(scenario.steps.len(), 5);
        assert!(!scenario.login);
        assert!(matches!(
            &scenario.steps[4],
            Step::AssertUrl { equals: Some(path), contains: None, .. } if path == "/"
        ));
    }

    #[test]
    fn parse_preconditions_and_text_targets() {
        let yaml = r#"
name: view-dialog
clean_session: true
login: true
viewport:
  width: 1920
  height: 1080
steps:
  - action: navigate
    path: /workspaces
  - action: click
    selector: button
    text: View
  - action: assert_visible
    text: Workspace Info
  - action: assert_attribute
    text: My Workspaces
    name: aria-selected
    value: 'true'
"#;
        let scenario = Scenario::from_yaml(yaml).unwrap();
        assert!(scenario.clean_session);
        assert!(scenario.login);
        assert_eq!(scenario.viewport.width, 1920);

        let Step::Click { target, .. } = &scenario.steps[1] else {
            panic!("expected click step");
        };
        assert_eq!(
            target.locator().unwrap(),
            Locator::CssWithText { css: "button".to_string(), text: "View".to_string() }
        );

        let Step::AssertVisible { target, .. } = &scenario.steps[2] else {
            panic!("expected assert_visible step");
        };
        assert_eq!(target.locator().unwrap(), Locator::Text("Workspace Info".to_string()));
    }

    #[test_case(
        "name: empty\nsteps: []\n";
        "empty step list"
    )]
    #[test_case(
        "name: no-target\nsteps:\n  - action: click\n";
        "click without target"
    )]
    #[test_case(
        "name: both-url\nsteps:\n  - action: assert_url\n    equals: /\n    contains: login\n";
        "url assertion with both matchers"
    )]
    #[test_case(
        "name: no-url\nsteps:\n  - action: assert_url\n";
        "url assertion without matcher"
    )]
    #[test_case(
        "name: bad-path\nsteps:\n  - action: navigate\n    path: workspaces\n";
        "relative navigate path"
    )]
    fn validation_rejects(yaml: &str) {
        assert!(matches!(
            Scenario::from_yaml(yaml),
            Err(E2eError::ScenarioParse(_))
        ));
    }

    #[test]
    fn tag_filtering() {
        let yaml_a = "name: a\ntags: [smoke]\nsteps:\n  - action: navigate\n    path: /\n";
        let yaml_b = "name: b\ntags: [dialog]\nsteps:\n  - action: navigate\n    path: /\n";
        let scenarios = vec![
            Scenario::from_yaml(yaml_a).unwrap(),
            Scenario::from_yaml(yaml_b).unwrap(),
        ];

        let smoke = Scenario::filter_by_tag(&scenarios, "smoke");
        assert_eq!(smoke.len(), 1);
        assert_eq!(smoke[0].name, "a");
        assert!(Scenario::filter_by_tag(&scenarios, "missing").is_empty());
    }

    #[test]
    fn step_names_carry_targets() {
        let step = Step::Click {
            target: Target::css_with_text("button", "Edit"),
            timeout_ms: None,
        };
        assert_eq!(step.name(), "click:button >> text=Edit");

        let step = Step::AssertUrl {
            equals: None,
            contains: Some("/login".to_string()),
            timeout_ms: None,
        };
        assert_eq!(step.name(), "assert_url:~/login");
    }
}
