//! Notification transport boundary
//!
//! Delivery (e-mail, chat webhook) is an external concern. The run hands a
//! subject and the rendered summary to whatever transport is configured;
//! the default is to hand it to nobody.

use anyhow::{Context, Result};
use std::io::Write;
use std::process::{Command, Stdio};

/// Delivers a run summary to an external destination
pub trait Notifier {
    fn send(&self, subject: &str, body: &str) -> Result<()>;
}

impl Notifier for Box<dyn Notifier> {
    fn send(&self, subject: &str, body: &str) -> Result<()> {
        (**self).send(subject, body)
    }
}

/// Discards every notification
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn send(&self, _subject: &str, _body: &str) -> Result<()> {
        Ok(())
    }
}

/// Pipes the summary to an external command: subject as the argument, body
/// on stdin. The command owns the actual transport.
#[derive(Debug, Clone)]
pub struct ScriptNotifier {
    command: String,
}

impl ScriptNotifier {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Notifier for ScriptNotifier {
    fn send(&self, subject: &str, body: &str) -> Result<()> {
        let mut child = Command::new(&self.command)
            .arg(subject)
            .stdin(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to spawn notifier `{}`", self.command))?;

        if let Some(stdin) = child.stdin.as_mut() {
            stdin.write_all(body.as_bytes())?;
        }

        let status = child.wait()?;
        anyhow::ensure!(status.success(), "notifier `{}` exited with {}", self.command, status);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_always_succeeds() {
        assert!(NoopNotifier.send("subject", "body").is_ok());
    }

    #[test]
    fn test_script_notifier_success() {
        let notifier = ScriptNotifier::new("cat");
        assert!(notifier.send("subject", "body\n").is_ok());
    }

    #[test]
    fn test_script_notifier_failure_surfaces() {
        let notifier = ScriptNotifier::new("false");
        assert!(notifier.send("subject", "body").is_err());
    }

    #[test]
    fn test_script_notifier_missing_command() {
        let notifier = ScriptNotifier::new("/nonexistent/notifier");
        assert!(notifier.send("subject", "body").is_err());
    }
}
