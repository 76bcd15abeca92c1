//! Demo command - Run a monitored sample main loop and trigger a failure.

use std::io;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, ValueEnum};

use bloodhound::prelude::*;
use bloodhound_core::HostAction;

use crate::OutputFormat;

/// Failure to trigger.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Scenario {
    /// Stall the main loop past the hang threshold
    Hang,
    /// Panic on a worker thread
    Panic,
    /// Deliver an error to the session
    Error,
}

/// Recovery policy options.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum PolicyArg {
    /// Relaunch this command, then exit
    Restart,
    /// Exit
    Terminate,
}

impl From<PolicyArg> for RecoveryPolicy {
    fn from(policy: PolicyArg) -> Self {
        match policy {
            PolicyArg::Restart => RecoveryPolicy::Restart,
            PolicyArg::Terminate => RecoveryPolicy::Terminate,
        }
    }
}

/// Arguments for the demo command.
#[derive(Args)]
pub struct DemoArgs {
    /// Failure to trigger
    #[arg(value_enum)]
    pub scenario: Scenario,

    /// Recovery policy (default: terminate, or the settings file value)
    #[arg(long)]
    pub policy: Option<PolicyArg>,

    /// Hang threshold in milliseconds
    #[arg(long)]
    pub threshold_ms: Option<u64>,

    /// Record recovery actions instead of performing them
    #[arg(long)]
    pub dry_run: bool,
}

/// Execute the demo command.
pub fn execute(
    args: DemoArgs,
    config_path: Option<&Path>,
    format: OutputFormat,
    quiet: bool,
) -> Result<()> {
    let mut settings = match config_path {
        Some(path) => MonitorSettings::load(path)
            .with_context(|| format!("Failed to load settings: {}", path.display()))?,
        None => MonitorSettings::new(env!("CARGO_CRATE_NAME"))
            .with_policy(RecoveryPolicy::Terminate)
            .with_threshold(Duration::from_millis(1000)),
    };
    if let Some(policy) = args.policy {
        settings = settings.with_policy(policy.into());
    }
    if let Some(threshold_ms) = args.threshold_ms {
        settings = settings.with_threshold(Duration::from_millis(threshold_ms));
    }

    let recorder = Arc::new(RecordingHost::new());
    let host: Arc<dyn ProcessHost> = if args.dry_run {
        Arc::clone(&recorder) as Arc<dyn ProcessHost>
    } else {
        Arc::new(SystemHost)
    };

    let (queue, main_loop) = MainQueue::new("main");
    let config = MonitorConfig::from_settings(queue.clone(), &settings)
        .with_application("bloodhound-demo")
        .with_observer(Arc::new(LoggingObserver::new()))
        .with_sink(Arc::new(JsonLinesSink::new(io::stderr()).with_name("stderr")))
        .with_host(host);
    let session = MonitorSession::new(config).context("Invalid monitor configuration")?;
    session.start().context("Failed to start monitor session")?;

    if !quiet {
        eprintln!(
            "Watching main loop (policy: {}, threshold: {}ms)",
            settings.policy, settings.threshold_ms
        );
    }

    match args.scenario {
        Scenario::Hang => {
            let stall = settings.threshold() + settings.probe_interval() * 3;
            queue
                .post(Box::new(move || stall_main_loop(stall)))
                .context("Failed to post to main loop")?;
        }
        Scenario::Panic => {
            let joined = thread::Builder::new()
                .name("demo-worker".to_string())
                .spawn(worker_panics)
                .context("Failed to spawn worker")?
                .join();
            if joined.is_ok() {
                bail!("Worker finished without panicking");
            }
        }
        Scenario::Error => {
            let error = io::Error::new(io::ErrorKind::NotFound, "demo settings file missing");
            session.report_error(&error);
        }
    }

    queue.shutdown();
    main_loop.run();
    session.stop();

    let Some(report) = session.last_report() else {
        bail!("No failure was captured");
    };

    match format {
        OutputFormat::Human => {
            println!("{}", report.to_text());
            println!("Recovery actions: {}", describe(&recorder.actions()));
        }
        OutputFormat::Json => {
            println!("{}", report.to_json_pretty());
        }
        OutputFormat::JsonCompact => {
            println!("{}", report.to_json());
        }
    }

    Ok(())
}

fn stall_main_loop(duration: Duration) {
    tracing::info!(stall_ms = duration.as_millis(), "Stalling main loop");
    thread::sleep(duration);
}

fn worker_panics() {
    let settings: Vec<u32> = Vec::new();
    let first = settings[0];
    tracing::info!(first, "Unreachable");
}

fn describe(actions: &[HostAction]) -> String {
    if actions.is_empty() {
        return "none".to_string();
    }
    actions
        .iter()
        .map(|action| match action {
            HostAction::Relaunch => "relaunch".to_string(),
            HostAction::Terminate(code) => format!("terminate({})", code),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
