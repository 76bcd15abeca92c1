//! Stack trace filtering.
//!
//! A fault trace is mostly noise: runtime, framework and standard library
//! frames. [`StackTraceAnalyzer`] keeps only the frames that belong to the
//! monitored application, identified by a path prefix, so a report points at
//! lines a developer can act on.
//!
//! Two frame grammars are recognised:
//!
//! ```text
//! com.app.Foo.bar(Foo.kt:42)                 dotted: <prefix>.<path>(<file>:<line>)
//!   7: my_app::worker::run                   rust backtrace frame ...
//!              at ./src/worker.rs:42:9       ... followed by its location
//! ```
//!
//! Anything else is ignored. Finding no frames is a valid result.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{TraceError, TraceResult};

/// One application frame extracted from a fault trace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Frame {
    /// Method or function name, without its module path.
    pub method_name: String,
    /// Source file as printed in the trace.
    pub file_name: String,
    /// Line number within the file.
    pub line_number: u32,
}

impl Frame {
    /// Create a frame.
    pub fn new(method_name: impl Into<String>, file_name: impl Into<String>, line_number: u32) -> Self {
        Self {
            method_name: method_name.into(),
            file_name: file_name.into(),
            line_number,
        }
    }
}

impl std::fmt::Display for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}:{})", self.method_name, self.file_name, self.line_number)
    }
}

/// Application frames of a fault, in the order they appear in the trace.
///
/// `line_numbers()[i] == frames()[i].line_number` always holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackTrace {
    line_numbers: Vec<u32>,
    frames: Vec<Frame>,
}

impl StackTrace {
    /// Create an empty trace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a trace from frames.
    pub fn from_frames(frames: Vec<Frame>) -> Self {
        let line_numbers = frames.iter().map(|f| f.line_number).collect();
        Self {
            line_numbers,
            frames,
        }
    }

    /// Append a frame.
    pub fn push(&mut self, frame: Frame) {
        self.line_numbers.push(frame.line_number);
        self.frames.push(frame);
    }

    /// Line numbers of the application frames.
    pub fn line_numbers(&self) -> &[u32] {
        &self.line_numbers
    }

    /// The application frames.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether no application frame was found.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The first application frame, if any.
    pub fn top(&self) -> Option<&Frame> {
        self.frames.first()
    }
}

/// Filters fault traces down to the frames of one application.
///
/// The patterns are compiled once per prefix; [`analyze`](Self::analyze)
/// itself is pure.
#[derive(Debug, Clone)]
pub struct StackTraceAnalyzer {
    prefix: String,
    dotted: Regex,
    backtrace: Regex,
}

impl StackTraceAnalyzer {
    /// Create an analyzer for frames under `app_prefix`.
    ///
    /// Trailing `.` or `::` separators on the prefix are ignored.
    pub fn new(app_prefix: &str) -> TraceResult<Self> {
        let prefix = app_prefix
            .trim()
            .trim_end_matches(&['.', ':'][..])
            .to_string();
        if prefix.is_empty() {
            return Err(TraceError::EmptyPrefix);
        }

        let escaped = regex::escape(&prefix);
        // The prefix must start a token so `com.app` never matches `com.apple`
        // or `org.com.app`.
        let dotted = Regex::new(&format!(
            r"(?m)(?:^|[^\w.$:]){escaped}\.([\w$.<>\-]+)\(([^():\s]+):(\d+)\)"
        ))?;
        let backtrace = Regex::new(&format!(
            r"(?m)^\s*\d+:\s+<?{escaped}::(\S+)[ \t]*\r?\n\s+at\s+(.+?):(\d+)(?::\d+)?[ \t]*\r?$"
        ))?;

        Ok(Self {
            prefix,
            dotted,
            backtrace,
        })
    }

    /// The normalised application prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Extract the application frames from `raw_text`.
    pub fn analyze(&self, raw_text: &str) -> StackTrace {
        let mut found: Vec<(usize, Frame)> = Vec::new();

        for caps in self.dotted.captures_iter(raw_text) {
            let (Some(all), Some(path), Some(file), Some(line)) =
                (caps.get(0), caps.get(1), caps.get(2), caps.get(3))
            else {
                continue;
            };
            let Ok(line_number) = line.as_str().parse::<u32>() else {
                continue;
            };
            let method = path.as_str().rsplit('.').next().unwrap_or(path.as_str());
            found.push((all.start(), Frame::new(method, file.as_str(), line_number)));
        }

        for caps in self.backtrace.captures_iter(raw_text) {
            let (Some(all), Some(path), Some(file), Some(line)) =
                (caps.get(0), caps.get(1), caps.get(2), caps.get(3))
            else {
                continue;
            };
            let Ok(line_number) = line.as_str().parse::<u32>() else {
                continue;
            };
            found.push((
                all.start(),
                Frame::new(rust_function_name(path.as_str()), file.as_str(), line_number),
            ));
        }

        found.sort_by_key(|(offset, _)| *offset);
        StackTrace::from_frames(found.into_iter().map(|(_, frame)| frame).collect())
    }
}

/// Filter `raw_text` down to the frames under `app_prefix`.
///
/// An unusable prefix yields an empty trace.
pub fn analyze(raw_text: &str, app_prefix: &str) -> StackTrace {
    match StackTraceAnalyzer::new(app_prefix) {
        Ok(analyzer) => analyzer.analyze(raw_text),
        Err(e) => {
            warn!(prefix = app_prefix, error = %e, "Cannot analyze trace");
            StackTrace::default()
        }
    }
}

/// Last meaningful segment of a Rust symbol path.
///
/// Skips the `h0123456789abcdef` symbol hash and closure markers.
fn rust_function_name(path: &str) -> &str {
    path.rsplit("::")
        .find(|segment| !is_symbol_hash(segment) && *segment != "{{closure}}")
        .unwrap_or(path)
}

fn is_symbol_hash(segment: &str) -> bool {
    segment.len() == 17
        && segment.starts_with('h')
        && segment[1..].chars().all(|c| c.is_ascii_hexdigit())
}
