//! Tracing subscriber setup
//!
//! Human-readable events go to stderr; when the data directory is writable a
//! JSON copy is appended to the log file there as well.

use std::ffi::OsStr;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable holding a filter directive such as `relfetch=debug`
pub const LOG_ENV: &str = "RELFETCH_LOG";

/// Verbosity requested on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    #[default]
    Quiet,
    Verbose,
    Details,
}

impl Verbosity {
    pub fn from_flags(verbose: bool, details: bool) -> Self {
        if details {
            Verbosity::Details
        } else if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Quiet
        }
    }
}

/// Picks the filter directive; explicit flags win over the environment
fn filter_directive(verbosity: Verbosity, env: Option<String>) -> String {
    match verbosity {
        Verbosity::Details => "debug".to_string(),
        Verbosity::Verbose => "info".to_string(),
        Verbosity::Quiet => env
            .filter(|directive| !directive.trim().is_empty())
            .unwrap_or_else(|| "warn".to_string()),
    }
}

/// Splits a log file path into its directory and file name, creating the
/// directory when missing
fn prepare_log_file(log_file: &Path) -> Option<(&Path, &OsStr)> {
    let dir = log_file.parent()?;
    let name = log_file.file_name()?;
    std::fs::create_dir_all(dir).ok()?;
    Some((dir, name))
}

/// Installs the global subscriber
///
/// Without a usable `log_file` only the stderr layer is installed. The
/// returned guard flushes the file writer on drop and must be held for the
/// lifetime of the program.
pub fn init(
    verbosity: Verbosity,
    log_file: Option<&Path>,
) -> Result<Option<WorkerGuard>, TryInitError> {
    let directive = filter_directive(verbosity, std::env::var(LOG_ENV).ok());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("warn"));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let (file_layer, guard) = match log_file.and_then(prepare_log_file) {
        Some((dir, name)) => {
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case(false, false, Verbosity::Quiet)]
    #[case(true, false, Verbosity::Verbose)]
    #[case(false, true, Verbosity::Details)]
    #[case(true, true, Verbosity::Details)]
    fn verbosity_from_flags(#[case] verbose: bool, #[case] details: bool, #[case] expected: Verbosity) {
        assert_eq!(Verbosity::from_flags(verbose, details), expected);
    }

    #[rstest]
    #[case(Verbosity::Quiet, None, "warn")]
    #[case(Verbosity::Quiet, Some("relfetch=trace"), "relfetch=trace")]
    #[case(Verbosity::Quiet, Some("  "), "warn")]
    #[case(Verbosity::Verbose, Some("relfetch=trace"), "info")]
    #[case(Verbosity::Details, None, "debug")]
    fn filter_directive_selection(
        #[case] verbosity: Verbosity,
        #[case] env: Option<&str>,
        #[case] expected: &str,
    ) {
        assert_eq!(
            filter_directive(verbosity, env.map(str::to_string)),
            expected
        );
    }

    #[test]
    fn prepare_log_file_creates_missing_directory() {
        let temp = TempDir::new().unwrap();
        let log_file = temp.path().join("nested/relfetch/relfetch.log");

        let (dir, name) = prepare_log_file(&log_file).unwrap();

        assert_eq!(dir, temp.path().join("nested/relfetch"));
        assert_eq!(name, "relfetch.log");
        assert!(dir.is_dir());
    }

    #[test]
    fn prepare_log_file_rejects_path_without_file_name() {
        assert!(prepare_log_file(Path::new("/")).is_none());
    }
}
