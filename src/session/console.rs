// Console - line input with keyboard interrupt detection

use std::io::Write;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// Outcome of one prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Line(String),
    /// Standard input was closed
    Eof,
    /// Ctrl+C while waiting for the line
    Interrupted,
}

#[async_trait]
pub trait Console: Send + Sync {
    /// Print `prompt` and wait for one line of input
    async fn read_line(&mut self, prompt: &str) -> Input;

    /// Resolves when the user presses Ctrl+C
    async fn interrupted(&self);
}

/// Interactive terminal on stdin/stdout
pub struct StdConsole {
    lines: Lines<BufReader<Stdin>>,
}

impl StdConsole {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

impl Default for StdConsole {
    fn default() -> Self {
        Self::new()
    }
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        // Without a handler there is nothing to wait for
        tracing::warn!(error = %e, "cannot listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

#[async_trait]
impl Console for StdConsole {
    async fn read_line(&mut self, prompt: &str) -> Input {
        print!("{}", prompt);
        let _ = std::io::stdout().flush();

        tokio::select! {
            line = self.lines.next_line() => match line {
                Ok(Some(line)) => Input::Line(line),
                Ok(None) => Input::Eof,
                Err(e) => {
                    tracing::warn!(error = %e, "stdin read failed");
                    Input::Eof
                }
            },
            _ = ctrl_c() => {
                println!();
                Input::Interrupted
            }
        }
    }

    async fn interrupted(&self) {
        ctrl_c().await
    }
}

/// Replays canned input and records every prompt shown
#[cfg(test)]
pub struct ScriptedConsole {
    inputs: std::collections::VecDeque<Input>,
    pub prompts: Vec<String>,
    /// Ctrl+C arrives while a backend call is still running
    interrupt_busy: bool,
}

#[cfg(test)]
impl ScriptedConsole {
    pub fn new(inputs: Vec<Input>) -> Self {
        Self {
            inputs: inputs.into(),
            prompts: Vec::new(),
            interrupt_busy: false,
        }
    }

    /// Interrupt any extraction or download that is not ready on first poll
    pub fn interrupt_busy(mut self) -> Self {
        self.interrupt_busy = true;
        self
    }

    pub fn lines(lines: &[&str]) -> Self {
        Self::new(lines.iter().map(|l| Input::Line(l.to_string())).collect())
    }
}

#[cfg(test)]
#[async_trait]
impl Console for ScriptedConsole {
    async fn read_line(&mut self, prompt: &str) -> Input {
        self.prompts.push(prompt.to_string());
        self.inputs.pop_front().unwrap_or(Input::Eof)
    }

    async fn interrupted(&self) {
        if self.interrupt_busy {
            tokio::task::yield_now().await
        } else {
            std::future::pending::<()>().await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_console_runs_dry() {
        let mut console = ScriptedConsole::lines(&["one"]);
        assert_eq!(console.read_line("a: ").await, Input::Line("one".into()));
        assert_eq!(console.read_line("b: ").await, Input::Eof);
        assert_eq!(console.prompts, vec!["a: ", "b: "]);
    }
}
