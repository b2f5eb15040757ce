use crate::archive::Dataset;
use crate::encoding::{decode_text, is_encoded, EncodingError};

use super::command::{CommandError, CommandRegistry};

/// Failures raised while replaying descriptor text
///
/// Replay is fail-fast: the first failing line aborts the whole replay and
/// no dataset is returned.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("unknown opcode '{opcode}' on line {line}")]
    UnknownOpcode { line: usize, opcode: String },
    #[error("malformed token on line {line}")]
    Encoding {
        line: usize,
        #[source]
        source: EncodingError,
    },
    #[error("command failed on line {line}")]
    Command {
        line: usize,
        #[source]
        source: CommandError,
    },
}

impl ReplayError {
    /// The 1-based descriptor line the failure occurred on
    pub fn line(&self) -> usize {
        match self {
            ReplayError::UnknownOpcode { line, .. } => *line,
            ReplayError::Encoding { line, .. } => *line,
            ReplayError::Command { line, .. } => *line,
        }
    }
}

/// Replay descriptor text against an empty dataset
pub fn execute(registry: &CommandRegistry, descriptor: &str) -> Result<Dataset, ReplayError> {
    let mut dataset = Dataset::default();
    execute_into(registry, &mut dataset, descriptor)?;
    Ok(dataset)
}

/// Replay descriptor text against an existing dataset
///
/// Applies lines in order until the first failure. Callers replaying into a
/// live dataset should treat a failed replay as fatal for that dataset;
/// [`execute`] discards the accumulator on failure and is the safe default.
pub fn execute_into(
    registry: &CommandRegistry,
    dataset: &mut Dataset,
    descriptor: &str,
) -> Result<(), ReplayError> {
    for (index, raw_line) in descriptor.lines().enumerate() {
        let line = index + 1;
        let mut parts = raw_line.split_whitespace();
        let Some(opcode) = parts.next() else {
            continue;
        };
        let mut args = Vec::new();
        for token in parts {
            if is_encoded(token) {
                let decoded = decode_text(token)
                    .map_err(|source| ReplayError::Encoding { line, source })?;
                args.push(decoded);
            } else {
                args.push(token.to_string());
            }
        }
        let command = registry
            .get(opcode)
            .ok_or_else(|| ReplayError::UnknownOpcode {
                line,
                opcode: opcode.to_string(),
            })?;
        command
            .apply(dataset, &args)
            .map_err(|source| ReplayError::Command { line, source })?;
        tracing::trace!(line, opcode, "replayed descriptor line");
    }
    Ok(())
}

/// Execute a single descriptor line against a dataset
pub fn execute_line(
    registry: &CommandRegistry,
    dataset: &mut Dataset,
    line: &str,
) -> Result<(), ReplayError> {
    execute_into(registry, dataset, line)
}
