//! Analyze command - Extract application frames from a fault trace.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use bloodhound_observe::{Frame, StackTraceAnalyzer};

use crate::OutputFormat;

/// Arguments for the analyze command.
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Trace file to read, or `-` for stdin
    #[arg(required = true)]
    pub input: PathBuf,

    /// Prefix identifying application frames (crate name or package)
    #[arg(short, long)]
    pub prefix: String,
}

/// Analysis result.
#[derive(Debug, Serialize)]
struct AnalysisResult<'a> {
    source: String,
    prefix: &'a str,
    line_numbers: &'a [u32],
    frames: &'a [Frame],
}

/// Execute the analyze command.
pub fn execute(args: AnalyzeArgs, format: OutputFormat) -> Result<()> {
    let raw_text = read_input(&args.input)?;

    let analyzer = StackTraceAnalyzer::new(&args.prefix)
        .with_context(|| format!("Invalid prefix '{}'", args.prefix))?;
    let trace = analyzer.analyze(&raw_text);

    tracing::debug!(
        prefix = analyzer.prefix(),
        frames = trace.len(),
        "Analyzed trace"
    );

    let result = AnalysisResult {
        source: args.input.display().to_string(),
        prefix: analyzer.prefix(),
        line_numbers: trace.line_numbers(),
        frames: trace.frames(),
    };

    match format {
        OutputFormat::Human => {
            if trace.is_empty() {
                println!("No frames matching '{}' in {}", result.prefix, result.source);
            } else {
                println!(
                    "Found {} frame(s) matching '{}' in {}:",
                    trace.len(),
                    result.prefix,
                    result.source
                );
                for (i, frame) in trace.frames().iter().enumerate() {
                    println!("  #{:<3} {}", i, frame);
                }
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::JsonCompact => {
            println!("{}", serde_json::to_string(&result)?);
        }
    }

    Ok(())
}

fn read_input(input: &Path) -> Result<String> {
    if input.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read trace from stdin")?;
        return Ok(text);
    }

    std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read trace file: {}", input.display()))
}
