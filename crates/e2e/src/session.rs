//! Playwright session control
//!
//! One `Session` owns one browser context for the duration of one scenario.
//! The declarative steps are compiled into a single Playwright program so
//! that navigation state, cookies, and local storage flow from step to step;
//! the program emits one JSON event per step on stdout, which is how the
//! runner learns the failing step index and its diagnostic.

use std::process::{Command, Stdio};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::process::Command as TokioCommand;
use tracing::debug;

use crate::error::{E2eError, E2eResult};
use crate::scenario::{Locator, Step, DEFAULT_TIMEOUT_MS};

/// Browser session handle, scoped to one scenario run
pub struct Session {
    config: SessionConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

/// Result of executing a single step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub index: usize,
    pub step_name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// One JSON line printed by the generated program per executed step
#[derive(Debug, Deserialize)]
struct StepEvent {
    step: usize,
    name: String,
    ok: bool,
    #[serde(default)]
    ms: u64,
    #[serde(default)]
    error: Option<String>,
}

impl Session {
    /// Create a new session handle
    pub fn new(mut config: SessionConfig) -> E2eResult<Self> {
        Self::check_playwright_installed()?;

        while config.base_url.ends_with('/') {
            config.base_url.pop();
        }

        Ok(Self { config })
    }

    /// Check if Playwright is installed
    fn check_playwright_installed() -> E2eResult<()> {
        let output = Command::new("npx")
            .args(["playwright", "--version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match output {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Execute a step sequence in one browser context.
    ///
    /// Steps run strictly in declared order; the first failure aborts the
    /// remaining steps, and the returned results end at the failing step.
    pub async fn run(&self, clean_session: bool, steps: &[Step]) -> E2eResult<Vec<StepResult>> {
        let script = self.build_script(clean_session, steps)?;

        let temp_dir = tempfile::tempdir()?;
        let script_path = temp_dir.path().join("scenario.js");
        std::fs::write(&script_path, &script)?;

        debug!("Running Playwright script: {}", script_path.display());

        let output = TokioCommand::new("node")
            .arg(&script_path)
            .current_dir(temp_dir.path())
            .output()
            .await?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut results = Vec::new();
        for line in stdout.lines() {
            let Ok(event) = serde_json::from_str::<StepEvent>(line) else {
                continue;
            };
            results.push(self.step_result(event));
        }

        if results.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(E2eError::Playwright(format!(
                "script produced no step events:\nstdout: {}\nstderr: {}",
                stdout, stderr
            )));
        }

        Ok(results)
    }

    fn step_result(&self, event: StepEvent) -> StepResult {
        let error = if event.ok {
            None
        } else {
            let raw = event.error.unwrap_or_else(|| "unknown failure".to_string());
            Some(classify_failure(&event.name, &raw).to_string())
        };

        StepResult {
            index: event.step,
            step_name: event.name,
            success: event.ok,
            duration_ms: event.ms,
            error,
        }
    }

    /// Build the Playwright program for a step sequence
    pub fn build_script(&self, clean_session: bool, steps: &[Step]) -> E2eResult<String> {
        let mut script = String::new();

        script.push_str(&format!(
            r#"const {{ chromium, firefox, webkit }} = require('playwright');

(async () => {{
  const browser = await {browser}.launch({{ headless: {headless} }});
  const context = await browser.newContext({{
    viewport: {{ width: {width}, height: {height} }}
  }});
  const page = await context.newPage();
  const baseUrl = {base_url};

  const report = (event) => console.log(JSON.stringify(event));
  const waitForAttribute = async (locator, name, expected, timeoutMs) => {{
    const deadline = Date.now() + timeoutMs;
    let observed = null;
    for (;;) {{
      observed = await locator.getAttribute(name);
      if (observed === expected) return;
      if (Date.now() >= deadline) {{
        throw new Error('attribute ' + name + ': expected "' + expected + '", got "' + observed + '"');
      }}
      await new Promise((resolve) => setTimeout(resolve, 100));
    }}
  }};
  const waitForUrl = async (predicate, expected, timeoutMs) => {{
    try {{
      await page.waitForURL(predicate, {{ timeout: timeoutMs }});
    }} catch (error) {{
      throw new Error('url: expected "' + expected + '", got "' + page.url() + '"');
    }}
  }};

  const steps = [];
"#,
            browser = self.config.browser.as_str(),
            headless = self.config.headless,
            width = self.config.viewport_width,
            height = self.config.viewport_height,
            base_url = js_string(&self.config.base_url),
        ));

        if clean_session {
            script.push_str(
                r#"  steps.push({
    name: "clean_session",
    run: async () => {
      await context.clearCookies();
      await page.goto(baseUrl + "/");
      await page.evaluate(() => { localStorage.clear(); sessionStorage.clear(); });
    }
  });
"#,
            );
        }

        for step in steps {
            script.push_str(&format!(
                "  steps.push({{\n    name: {name},\n    run: async () => {{\n{body}    }}\n  }});\n",
                name = js_string(&step.name()),
                body = self.step_to_js(step)?,
            ));
        }

        script.push_str(
            r#"
  let failed = false;
  for (let i = 0; i < steps.length; i += 1) {
    const started = Date.now();
    try {
      await steps[i].run();
      report({ step: i, name: steps[i].name, ok: true, ms: Date.now() - started });
    } catch (error) {
      report({
        step: i,
        name: steps[i].name,
        ok: false,
        ms: Date.now() - started,
        error: String((error && error.message) || error),
      });
      failed = true;
      break;
    }
  }

  await browser.close();
  process.exit(failed ? 1 : 0);
})();
"#,
        );

        Ok(script)
    }

    /// Convert a step to the body of its generated closure
    fn step_to_js(&self, step: &Step) -> E2eResult<String> {
        let js = match step {
            Step::Navigate { path } => {
                format!("      await page.goto(baseUrl + {});\n", js_string(path))
            }
            Step::Fill { selector, value, timeout_ms } => {
                let timeout = timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS);
                format!(
                    "      await page.locator({}).first().fill({}, {{ timeout: {} }});\n",
                    js_string(selector),
                    js_string(value),
                    timeout
                )
            }
            Step::Click { target, timeout_ms } => {
                let timeout = timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS);
                format!(
                    "      await {}.first().click({{ timeout: {} }});\n",
                    locator_js(&target.locator()?),
                    timeout
                )
            }
            Step::AssertVisible { target, timeout_ms } => {
                let timeout = timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS);
                format!(
                    "      await {}.first().waitFor({{ state: \"visible\", timeout: {} }});\n",
                    locator_js(&target.locator()?),
                    timeout
                )
            }
            Step::AssertAbsent { target, timeout_ms } => {
                let timeout = timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS);
                format!(
                    "      await {}.first().waitFor({{ state: \"detached\", timeout: {} }});\n",
                    locator_js(&target.locator()?),
                    timeout
                )
            }
            Step::AssertUrl { equals, contains, timeout_ms } => {
                let timeout = timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS);
                match (equals, contains) {
                    (Some(path), _) => {
                        let absolute = format!("{}{}", self.config.base_url, path);
                        format!(
                            "      await waitForUrl((url) => url.href === {abs}, {abs}, {timeout});\n",
                            abs = js_string(&absolute),
                            timeout = timeout
                        )
                    }
                    (None, Some(fragment)) => format!(
                        "      await waitForUrl((url) => url.href.includes({frag}), {desc}, {timeout});\n",
                        frag = js_string(fragment),
                        desc = js_string(&format!("contains {}", fragment)),
                        timeout = timeout
                    ),
                    (None, None) => {
                        return Err(E2eError::ScenarioParse(
                            "assert_url needs 'equals' or 'contains'".to_string(),
                        ));
                    }
                }
            }
            Step::AssertAttribute { target, name, value, timeout_ms } => {
                let timeout = timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS);
                format!(
                    "      const target = {}.first();\n      await target.waitFor({{ state: \"visible\", timeout: {timeout} }});\n      await waitForAttribute(target, {name}, {value}, {timeout});\n",
                    locator_js(&target.locator()?),
                    name = js_string(name),
                    value = js_string(value),
                    timeout = timeout
                )
            }
        };
        Ok(js)
    }
}

/// Render a locator as a Playwright locator expression
fn locator_js(locator: &Locator) -> String {
    match locator {
        Locator::Css(css) => format!("page.locator({})", js_string(css)),
        Locator::Text(text) => format!("page.getByText({})", js_string(text)),
        Locator::CssWithText { css, text } => format!(
            "page.locator({}, {{ hasText: {} }})",
            js_string(css),
            js_string(text)
        ),
    }
}

/// Encode a string as a JS string literal
fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

fn mismatch_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^(?P<subject>url|attribute \S+): expected "(?P<expected>.*)", got "(?P<observed>.*)"$"#)
            .expect("mismatch regex is valid")
    })
}

fn wait_timeout_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"Timeout (?P<ms>\d+)ms exceeded").expect("timeout regex is valid")
    })
}

/// Map a raw Playwright failure message onto the error taxonomy.
///
/// Messages produced by the generated mismatch helpers carry an
/// expected/observed pair; element-wait expiries surface as Playwright
/// timeouts mentioning the awaited locator.
pub(crate) fn classify_failure(step_name: &str, message: &str) -> E2eError {
    let first_line = message.lines().next().unwrap_or(message);

    if let Some(caps) = mismatch_re().captures(first_line) {
        return E2eError::StateMismatch {
            subject: caps["subject"].to_string(),
            expected: caps["expected"].to_string(),
            observed: caps["observed"].to_string(),
        };
    }

    if let Some(caps) = wait_timeout_re().captures(message) {
        let timeout_ms = caps["ms"].parse().unwrap_or(0);

        if message.contains("waiting for") {
            if let Some(locator) = step_name.strip_prefix("assert_absent:") {
                return E2eError::StateMismatch {
                    subject: locator.to_string(),
                    expected: "absent".to_string(),
                    observed: "present".to_string(),
                };
            }
            let locator = step_name
                .split_once(':')
                .map(|(_, target)| target.to_string())
                .unwrap_or_else(|| step_name.to_string());
            return E2eError::ElementNotFound { locator, timeout_ms };
        }

        return E2eError::Timeout(step_name.to_string());
    }

    E2eError::Playwright(message.to_string())
}

/// Configuration for a browser session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub base_url: String,
    pub browser: Browser,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".to_string(),
            browser: Browser::Chromium,
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
        }
    }
}
