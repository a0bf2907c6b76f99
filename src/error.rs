use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum FetchErrorKind {
    #[error("request failed: {0}")]
    Http(String),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("could not parse listing: {0}")]
    Parse(String),
    #[error("no response within {}", humantime::format_duration(*.0))]
    Timeout(Duration),
    #[error("fetch worker exited without a result")]
    Worker,
}

#[derive(Debug, thiserror::Error)]
#[error("fetch {category}: {kind}")]
pub struct FetchError {
    pub category: String,
    pub kind: FetchErrorKind,
}

impl FetchError {
    pub fn new(category: impl Into<String>, kind: FetchErrorKind) -> Self {
        Self {
            category: category.into(),
            kind,
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("could not open {url} ({})", .attempts.join("; "))]
pub struct LaunchError {
    pub url: String,
    pub attempts: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum UiInitError {
    #[error("enable raw mode: {0}")]
    RawMode(#[source] std::io::Error),
    #[error("enter alternate screen: {0}")]
    AlternateScreen(#[source] std::io::Error),
    #[error("create terminal: {0}")]
    Terminal(#[source] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config: unable to determine config directory")]
    NoConfigDir,
    #[error("config: failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config: failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("config: failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config: failed to serialize: {0}")]
    Serialize(#[source] serde_yaml::Error),
    #[error("Please specify languages.")]
    NoLanguages,
    #[error("config: invalid value for {key}: {value:?}")]
    InvalidEnv { key: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_error_lists_every_attempt() {
        let err = LaunchError {
            url: "https://github.com/a/b".into(),
            attempts: vec!["firefox: not found".into(), "default: no handler".into()],
        };
        let text = err.to_string();
        assert!(text.contains("https://github.com/a/b"));
        assert!(text.contains("firefox: not found; default: no handler"));
    }

    #[test]
    fn timeout_is_human_readable() {
        let err = FetchError::new("rust", FetchErrorKind::Timeout(Duration::from_secs(20)));
        assert_eq!(err.to_string(), "fetch rust: no response within 20s");
    }
}
