use std::fmt;
use std::process::{Command, Stdio};

use anyhow::{bail, Context, Result};

use crate::error::LaunchError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchTarget {
    /// A user-configured command line; the URL is appended as the last argument.
    Command(String),
    /// Whatever the platform registers as the default browser.
    PlatformDefault,
}

impl fmt::Display for LaunchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaunchTarget::Command(command) => write!(f, "{command}"),
            LaunchTarget::PlatformDefault => f.write_str("default browser"),
        }
    }
}

pub trait Launcher: Send + Sync {
    fn launch(&self, url: &str, target: &LaunchTarget) -> Result<()>;
}

/// Runs configured commands to completion and defers to `webbrowser` for the
/// platform default.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn launch(&self, url: &str, target: &LaunchTarget) -> Result<()> {
        match target {
            LaunchTarget::Command(command) => run_command(command, url),
            LaunchTarget::PlatformDefault => {
                webbrowser::open(url).context("open with default browser")
            }
        }
    }
}

fn run_command(command: &str, url: &str) -> Result<()> {
    let mut parts = command.split_whitespace();
    let Some(program) = parts.next() else {
        bail!("empty launcher command");
    };
    let status = Command::new(program)
        .args(parts)
        .arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .with_context(|| format!("spawn {program}"))?;
    if !status.success() {
        bail!("{program} exited with {status}");
    }
    Ok(())
}

/// Preferred command first (when set), then the platform default.
pub fn fallback_chain(preferred: &str) -> Vec<LaunchTarget> {
    let mut chain = Vec::with_capacity(2);
    let preferred = preferred.trim();
    if !preferred.is_empty() {
        chain.push(LaunchTarget::Command(preferred.to_string()));
    }
    chain.push(LaunchTarget::PlatformDefault);
    chain
}

/// Tries each target in order and returns the one that worked.
pub fn open_with_fallback(
    launcher: &dyn Launcher,
    url: &str,
    chain: &[LaunchTarget],
) -> Result<LaunchTarget, LaunchError> {
    let mut attempts = Vec::with_capacity(chain.len());
    for target in chain {
        tracing::debug!(%url, %target, "launching");
        match launcher.launch(url, target) {
            Ok(()) => return Ok(target.clone()),
            Err(err) => {
                tracing::debug!(%url, %target, error = %format!("{err:#}"), "launch attempt failed");
                attempts.push(format!("{target}: {err:#}"));
            }
        }
    }
    let err = LaunchError {
        url: url.to_string(),
        attempts,
    };
    tracing::warn!(error = %err, "every launcher failed");
    Err(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Scripted {
        failing: Vec<LaunchTarget>,
        calls: Mutex<Vec<LaunchTarget>>,
    }

    impl Launcher for Scripted {
        fn launch(&self, _url: &str, target: &LaunchTarget) -> Result<()> {
            self.calls.lock().unwrap().push(target.clone());
            if self.failing.contains(target) {
                bail!("refused");
            }
            Ok(())
        }
    }

    #[test]
    fn chain_prefers_configured_command() {
        assert_eq!(
            fallback_chain("firefox"),
            vec![
                LaunchTarget::Command("firefox".into()),
                LaunchTarget::PlatformDefault
            ]
        );
        assert_eq!(fallback_chain("  "), vec![LaunchTarget::PlatformDefault]);
    }

    #[test]
    fn falls_back_after_command_failure() {
        let launcher = Scripted {
            failing: vec![LaunchTarget::Command("firefox".into())],
            ..Scripted::default()
        };
        let used = open_with_fallback(&launcher, "https://github.com/a/b", &fallback_chain("firefox"))
            .unwrap();
        assert_eq!(used, LaunchTarget::PlatformDefault);
        assert_eq!(launcher.calls.lock().unwrap().len(), 2);
    }

    #[test]
    fn stops_at_first_success() {
        let launcher = Scripted::default();
        let used = open_with_fallback(&launcher, "u", &fallback_chain("firefox")).unwrap();
        assert_eq!(used, LaunchTarget::Command("firefox".into()));
        assert_eq!(launcher.calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn reports_every_failed_attempt() {
        let launcher = Scripted {
            failing: vec![
                LaunchTarget::Command("firefox".into()),
                LaunchTarget::PlatformDefault,
            ],
            ..Scripted::default()
        };
        let err = open_with_fallback(&launcher, "u", &fallback_chain("firefox")).unwrap_err();
        assert_eq!(err.attempts.len(), 2);
        assert!(err.attempts[0].starts_with("firefox: "));
        assert!(err.attempts[1].starts_with("default browser: "));
    }

    #[test]
    fn missing_program_is_an_error() {
        let err = run_command("gh-trending-no-such-browser-binary", "https://example.com")
            .unwrap_err();
        assert!(format!("{err:#}").contains("spawn"));
    }
}
