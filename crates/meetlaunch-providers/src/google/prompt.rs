//! Operator interaction during authorization.

use std::io::{BufRead, Write};

use crate::error::{ProviderError, ProviderResult};

/// Shows the consent URL and collects what the operator pastes back.
pub trait CodePrompt: Send + Sync {
    /// Presents `auth_url` and blocks until one line of input is available.
    fn prompt_for_code(&self, auth_url: &str) -> ProviderResult<String>;
}

/// Prompts on stdout and reads the reply from stdin.
///
/// Blocks the calling thread with no timeout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinPrompt;

impl StdinPrompt {
    /// Creates a new stdin prompt.
    pub fn new() -> Self {
        Self
    }
}

impl CodePrompt for StdinPrompt {
    fn prompt_for_code(&self, auth_url: &str) -> ProviderResult<String> {
        let stdout = std::io::stdout();
        let stdin = std::io::stdin();
        prompt_with(stdin.lock(), stdout.lock(), auth_url)
    }
}

/// Writes the prompt to `out` and reads a single line from `input`.
fn prompt_with<R: BufRead, W: Write>(mut input: R, mut out: W, auth_url: &str) -> ProviderResult<String> {
    writeln!(
        out,
        "Go to the following link in your browser, grant access, then paste \
         the authorization code (or the full URL you were redirected to):\n\n{}\n",
        auth_url
    )
    .and_then(|_| write!(out, "Authorization code: "))
    .and_then(|_| out.flush())
    .map_err(|e| ProviderError::internal(format!("failed to write prompt: {}", e)))?;

    let mut line = String::new();
    let read = input.read_line(&mut line).map_err(|e| {
        ProviderError::exchange(format!("unable to read authorization code: {}", e)).with_source(e)
    })?;
    if read == 0 {
        return Err(ProviderError::exchange(
            "unable to read authorization code: standard input closed",
        ));
    }

    Ok(line.trim().to_string())
}
