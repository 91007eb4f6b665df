//! Staging progress events with platform-contract rendering.
//!
//! The rendered lines are consumed verbatim by the calling platform's log
//! assertions, so they are emitted through an explicit sink rather than
//! through `tracing` — diagnostics and contract output must not mix.

use std::fmt;
use std::sync::Mutex;

/// A log-visible staging event. `Display` renders the exact line the
/// platform contract requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StagingEvent {
    /// Toolchain installation completed.
    Installing { name: String, version: String },
    /// Where the toolchain artifact came from: a `file://` locator on a
    /// cache hit, the remote URI on a fresh fetch.
    Downloaded { locator: String },
    /// Legacy `.godir` marker seen; app proceeds through the normal path.
    DeprecatedGodir,
    /// A line of output from an application sub-dependency build.
    DependencyOutput { line: String },
    /// The component failure message, passed through verbatim ahead of the
    /// fixed staging-failed line.
    FailureDetail { message: String },
    /// Terminal failure of the compile phase.
    StagingFailed,
    /// Terminal success; the built droplet is handed to the platform.
    UploadingDroplet,
}

impl fmt::Display for StagingEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Installing { name, version } => {
                write!(f, "Installing {name}{version}... done")
            }
            Self::Downloaded { locator } => write!(f, "Downloaded [{locator}]"),
            Self::DeprecatedGodir => write!(f, "Deprecated, .godir file found!"),
            Self::DependencyOutput { line } => f.write_str(line),
            Self::FailureDetail { message } => f.write_str(message),
            Self::StagingFailed => {
                write!(f, "App staging failed in the buildpack compile phase")
            }
            Self::UploadingDroplet => write!(f, "Uploading droplet"),
        }
    }
}

/// Observer of staging progress.
pub trait EventSink {
    fn emit(&self, event: StagingEvent);
}

/// Prints each event line to stdout — the production sink.
pub struct StdoutSink;

impl EventSink for StdoutSink {
    fn emit(&self, event: StagingEvent) {
        println!("{event}");
    }
}

/// Collects events in memory for inspection; the test sink.
#[derive(Default)]
pub struct MemorySink {
    events: Mutex<Vec<StagingEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<StagingEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Rendered lines, in emission order.
    pub fn lines(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: StagingEvent) {
        self.events.lock().unwrap().push(event);
    }
}
