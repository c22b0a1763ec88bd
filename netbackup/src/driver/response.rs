//! Response type for command execution results.

use std::time::Duration;

/// Response from a command execution.
#[derive(Debug, Clone)]
pub struct Response {
    /// The command that was executed.
    pub command: String,

    /// Output with the command echo and trailing prompt removed.
    pub result: String,

    /// The raw output before normalization.
    pub raw_result: String,

    /// The prompt the device returned to, empty if none was seen.
    pub prompt: String,

    /// Time taken to execute the command.
    pub elapsed: Duration,

    /// Failure string found in the output, if any.
    pub failure_message: Option<String>,
}

impl Response {
    pub fn new(
        command: impl Into<String>,
        result: impl Into<String>,
        raw_result: impl Into<String>,
        prompt: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            command: command.into(),
            result: result.into(),
            raw_result: raw_result.into(),
            prompt: prompt.into(),
            elapsed,
            failure_message: None,
        }
    }

    /// Mark the response as failed with the matched failure string.
    pub fn with_failure(mut self, failure_message: impl Into<String>) -> Self {
        self.failure_message = Some(failure_message.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.failure_message.is_none()
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.result)
    }
}

/// Strip the command echo and the trailing prompt from raw output.
///
/// `prompt_start` is the byte offset where the trailing prompt begins, when
/// one was found. Line endings are normalised to `\n`.
pub(crate) fn normalize_output(raw: &str, command: &str, prompt_start: Option<usize>) -> String {
    let body = match prompt_start {
        Some(start) if start <= raw.len() => &raw[..start],
        _ => raw,
    };

    let body = body.replace("\r\n", "\n").replace('\r', "");

    // The first line is the echoed command (sometimes behind a redrawn prompt)
    let body = match body.split_once('\n') {
        Some((first, rest)) if !command.is_empty() && first.trim_end().ends_with(command.trim()) => {
            rest
        }
        None if !command.is_empty() && body.trim_end().ends_with(command.trim()) => "",
        _ => body.as_str(),
    };

    let trimmed = body.trim_end_matches([' ', '\t', '\n']);
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}\n")
    }
}
