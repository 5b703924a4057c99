use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;

use serde::Deserialize;

/// Boxed, sendable future returned by the collaborator traits
/// (`Builder`, `Supervisor`, `Notifier`).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Where the supervised child's stdout/stderr go.
///
/// - `Inherit`: share kiln's own stdout/stderr (default; the developer sees
///   the server's output interleaved with build lines).
/// - `Discard`: drop everything (used by tests).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputSink {
    #[default]
    Inherit,
    Discard,
}

impl FromStr for OutputSink {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "inherit" => Ok(OutputSink::Inherit),
            "discard" => Ok(OutputSink::Discard),
            other => Err(format!(
                "invalid output sink: {other} (expected \"inherit\" or \"discard\")"
            )),
        }
    }
}

impl OutputSink {
    pub(crate) fn stdio(self) -> std::process::Stdio {
        match self {
            OutputSink::Inherit => std::process::Stdio::inherit(),
            OutputSink::Discard => std::process::Stdio::null(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_sink_parses_case_insensitively() {
        assert_eq!("Inherit".parse::<OutputSink>(), Ok(OutputSink::Inherit));
        assert_eq!(" discard ".parse::<OutputSink>(), Ok(OutputSink::Discard));
        assert!("pipe".parse::<OutputSink>().is_err());
    }
}
