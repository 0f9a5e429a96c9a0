//! E2E harness entry point
//!
//! This file is the test binary that runs scenarios from YAML files against
//! a live application instance.
//! Run with: cargo test --package workspaces-e2e --test e2e

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use workspaces_e2e::flows::Credentials;
use workspaces_e2e::runner::{RunnerConfig, SuiteResult};
use workspaces_e2e::session::{Browser, SessionConfig};
use workspaces_e2e::{E2eResult, ScenarioRunner};

#[derive(Parser, Debug)]
#[command(name = "workspaces-e2e")]
#[command(about = "E2E scenario runner for the Workspaces Management System")]
struct Args {
    /// Base URL of the running application
    #[arg(short, long, default_value = "http://127.0.0.1:3000")]
    base_url: String,

    /// Path to the scenario directory
    #[arg(short, long, default_value = "specs")]
    specs: PathBuf,

    /// Run only scenarios matching this tag
    #[arg(short, long)]
    tag: Option<String>,

    /// Run only a specific scenario by name
    #[arg(short, long)]
    name: Option<String>,

    /// Browser to use (chromium, firefox, webkit)
    #[arg(long, default_value = "chromium")]
    browser: String,

    /// Run with a visible browser window
    #[arg(long)]
    headed: bool,

    /// Viewport width
    #[arg(long, default_value = "1280")]
    viewport_width: u32,

    /// Viewport height
    #[arg(long, default_value = "720")]
    viewport_height: u32,

    /// Username of the seeded login account
    #[arg(long, default_value = "mt")]
    username: String,

    /// Password of the seeded login account
    #[arg(long, default_value = "mt")]
    password: String,

    /// Seconds to wait for the application to answer
    #[arg(long, default_value = "30")]
    app_ready_timeout: u64,

    /// Output directory for results
    #[arg(short, long, default_value = "test-results")]
    output: PathBuf,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    let args = Args::parse();

    // Opt-in: these scenarios need a live application and Playwright, so a
    // plain `cargo test` skips them instead of failing.
    if std::env::var_os("WORKSPACES_E2E").is_none() {
        eprintln!("skipping e2e scenarios: set WORKSPACES_E2E=1 with the application running");
        return;
    }

    // Run async main
    let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
    let result = rt.block_on(async_main(args));

    match result {
        Ok(success) => {
            if success {
                std::process::exit(0);
            } else {
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}

async fn async_main(args: Args) -> E2eResult<bool> {
    let browser = match args.browser.as_str() {
        "firefox" => Browser::Firefox,
        "webkit" => Browser::Webkit,
        _ => Browser::Chromium,
    };

    let config = RunnerConfig {
        session: SessionConfig {
            base_url: args.base_url,
            browser,
            headless: !args.headed,
            viewport_width: args.viewport_width,
            viewport_height: args.viewport_height,
        },
        credentials: Credentials {
            username: args.username,
            password: args.password,
        },
        specs_dir: args.specs,
        output_dir: args.output,
        app_ready_timeout: Duration::from_secs(args.app_ready_timeout),
    };

    let runner = ScenarioRunner::with_config(config);

    let results = if let Some(name) = args.name {
        let result = runner.run_scenario(&name).await?;
        SuiteResult {
            total: 1,
            passed: if result.passed { 1 } else { 0 },
            failed: if result.passed { 0 } else { 1 },
            duration_ms: result.duration_ms,
            results: vec![result],
        }
    } else if let Some(tag) = args.tag {
        runner.run_tagged(&tag).await?
    } else {
        runner.run_all().await?
    };

    runner.write_results(&results)?;

    Ok(results.failed == 0)
}
