//! Plain line prompts on stdin.

use std::io::{self, BufRead, Write};

use crate::cli::error::{CliError, CliResult};

/// Print `label`, then read one line from `input`. Trailing newline removed.
pub fn prompt_from<R: BufRead>(input: &mut R, label: &str) -> CliResult<String> {
    print!("{label}");
    io::stdout().flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(CliError::usage("Input closed"));
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

pub fn prompt(label: &str) -> CliResult<String> {
    prompt_from(&mut io::stdin().lock(), label)
}

/// Prompt for a required value, rejecting blank input.
pub fn prompt_required(label: &str, what: &str) -> CliResult<String> {
    let value = prompt(label)?;
    if value.trim().is_empty() {
        return Err(CliError::usage(format!("{what} cannot be empty")));
    }
    Ok(value)
}

/// Use `value` when given, otherwise ask for it.
pub fn value_or_prompt(value: Option<String>, label: &str, what: &str) -> CliResult<String> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        _ => prompt_required(label, what),
    }
}

pub fn confirm(label: &str) -> CliResult<bool> {
    let answer = prompt(&format!("{label} [y/N]: "))?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
