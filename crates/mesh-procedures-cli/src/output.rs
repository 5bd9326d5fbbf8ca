// crates/mesh-procedures-cli/src/output.rs
// ============================================================================
// Module: CLI Run Output
// Description: JSON Lines call transcripts and stderr progress lines.
// Purpose: Make every API call and step outcome visible while a run executes.
// Dependencies: mesh-procedures-core, serde_json
// ============================================================================

//! ## Overview
//! [`JsonlCallSink`] appends one JSON object per API call to a transcript
//! file. Write failures do not interrupt the run; the first one is kept and
//! surfaced by [`JsonlCallSink::finish`]. [`ProgressObserver`] prints a
//! `[PASS]`/`[FAIL]`/`[SKIP]` line per step result.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use mesh_procedures_core::ApiCallRecord;
use mesh_procedures_core::ApiCallSink;
use mesh_procedures_core::RunObserver;
use mesh_procedures_core::StepResult;

// ============================================================================
// SECTION: Transcript Sink
// ============================================================================

/// Mutable transcript state.
struct TranscriptState {
    /// Buffered transcript file.
    writer: BufWriter<File>,
    /// First write failure, if any.
    error: Option<String>,
    /// Records written so far.
    written: usize,
}

/// Call sink writing JSON Lines.
pub(crate) struct JsonlCallSink {
    /// Writer and error state.
    state: Mutex<TranscriptState>,
}

impl JsonlCallSink {
    /// Creates or truncates the transcript file.
    pub(crate) fn create(path: &Path) -> std::io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            state: Mutex::new(TranscriptState {
                writer: BufWriter::new(file),
                error: None,
                written: 0,
            }),
        })
    }

    /// Flushes the transcript and returns the number of records written.
    pub(crate) fn finish(self) -> Result<usize, String> {
        let mut state = self.state.into_inner().map_err(|_| "transcript lock poisoned")?;
        if let Some(error) = state.error.take() {
            return Err(error);
        }
        state.writer.flush().map_err(|err| err.to_string())?;
        Ok(state.written)
    }
}

impl ApiCallSink for JsonlCallSink {
    fn record(&self, call: &ApiCallRecord) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        if state.error.is_some() {
            return;
        }
        let outcome = serde_json::to_vec(call)
            .map_err(|err| err.to_string())
            .and_then(|mut line| {
                line.push(b'\n');
                state.writer.write_all(&line).map_err(|err| err.to_string())
            });
        match outcome {
            Ok(()) => state.written += 1,
            Err(error) => state.error = Some(error),
        }
    }
}

// ============================================================================
// SECTION: Progress
// ============================================================================

/// Formats one progress line.
pub(crate) fn progress_line(result: &StepResult) -> String {
    let tag = result.status.tag();
    match &result.message {
        Some(message) => format!("[{tag}] {}: {message}", result.label),
        None => format!("[{tag}] {}", result.label),
    }
}

/// Observer printing one line per result to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ProgressObserver {
    /// Suppresses output when false.
    enabled: bool,
}

impl ProgressObserver {
    /// Creates an observer.
    pub(crate) const fn new(enabled: bool) -> Self {
        Self {
            enabled,
        }
    }
}

impl RunObserver for ProgressObserver {
    fn step_finished(&self, result: &StepResult) {
        if self.enabled {
            let mut stderr = std::io::stderr();
            let _ = writeln!(&mut stderr, "{}", progress_line(result));
        }
    }
}
