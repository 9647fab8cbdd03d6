use fluxbase_core::{ClassifiedLine, LineLevel};
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{ChildStderr, ChildStdout};
use tokio::sync::mpsc::UnboundedSender;

use crate::output::classify_line;

const RESULT_MARKER: &str = "__RESULT__::";
const PROGRESS_MARKER: &str = "__PROGRESS__::";

/// The decoded `__RESULT__::` payload (spec §6 child-process contract).
#[derive(Debug, Clone, Deserialize)]
pub struct FinalMarker {
    pub success: bool,
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default)]
    pub error: Option<ChildError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChildError {
    pub message: String,
    #[serde(default)]
    pub stack: Option<String>,
}

pub struct StdoutOutcome {
    pub buffer: String,
    pub truncated: bool,
    pub result: Option<FinalMarker>,
}

pub struct StderrOutcome {
    pub lines: Vec<ClassifiedLine>,
    pub truncated: bool,
}

/// Reads stdout line by line: result-marker lines decode the final
/// result (first one wins, later ones ignored per spec §5 ordering
/// guarantee), progress-marker lines publish to `progress_tx`, anything
/// else is appended to the bounded stdout buffer (spec §4.E step 6).
pub async fn pump_stdout(
    stdout: ChildStdout,
    max_output: usize,
    progress_tx: Option<UnboundedSender<serde_json::Value>>,
) -> StdoutOutcome {
    let mut lines = BufReader::new(stdout).lines();
    let mut buffer = String::new();
    let mut total_bytes: usize = 0;
    let mut truncated = false;
    let mut result = None;

    while let Ok(Some(line)) = lines.next_line().await {
        if let Some(json) = line.strip_prefix(RESULT_MARKER) {
            if result.is_none() {
                if let Ok(marker) = serde_json::from_str::<FinalMarker>(json) {
                    result = Some(marker);
                }
            }
            continue;
        }
        if let Some(json) = line.strip_prefix(PROGRESS_MARKER) {
            if let Some(tx) = &progress_tx {
                if let Ok(value) = serde_json::from_str::<serde_json::Value>(json) {
                    let _ = tx.send(value);
                }
            }
            continue;
        }

        total_bytes += line.len() + 1;
        if total_bytes <= max_output {
            buffer.push_str(&line);
            buffer.push('\n');
        } else {
            truncated = true;
        }
    }

    if truncated {
        buffer.push_str(&format!(
            "...(truncated {} bytes)",
            total_bytes.saturating_sub(max_output)
        ));
    }

    StdoutOutcome {
        buffer,
        truncated,
        result,
    }
}

/// Reads stderr line by line, classifying each (spec §4.D) and bounding
/// total accumulated size the same way as stdout.
pub async fn pump_stderr(stderr: ChildStderr, max_output: usize) -> StderrOutcome {
    let mut lines = BufReader::new(stderr).lines();
    let mut classified = Vec::new();
    let mut total_bytes: usize = 0;
    let mut truncated = false;

    while let Ok(Some(line)) = lines.next_line().await {
        total_bytes += line.len() + 1;
        if total_bytes <= max_output {
            classified.push(classify_line(&line));
        } else {
            truncated = true;
        }
    }

    if truncated {
        classified.push(ClassifiedLine {
            level: LineLevel::Error,
            text: format!(
                "...(truncated {} bytes)",
                total_bytes.saturating_sub(max_output)
            ),
        });
    }

    StderrOutcome {
        lines: classified,
        truncated,
    }
}
