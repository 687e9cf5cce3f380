//! Unified logging initialization for OmniOut binaries
//!
//! The filter is resolved in this order:
//! 1. CLI flags (`-v/-q`) - highest priority
//! 2. RUST_LOG environment variable
//! 3. Binary-specific defaults - lowest priority

use anyhow::Result;
use clap_verbosity_flag::{LogLevel, Verbosity};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging with the specified verbosity level and default filter.
///
/// # Example
///
/// ```no_run
/// use clap::Parser;
/// use clap_verbosity_flag::{Verbosity, WarnLevel};
/// use omniout_common::logging;
///
/// #[derive(Parser)]
/// struct Args {
///     #[clap(flatten)]
///     verbosity: Verbosity<WarnLevel>,
/// }
///
/// let args = Args::parse();
/// logging::init_logging(&args.verbosity, "omniout=warn").unwrap();
/// ```
pub fn init_logging<L: LogLevel>(verbosity: &Verbosity<L>, default_filter: &str) -> Result<()> {
    let filter = resolve_filter(verbosity, default_filter)?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .try_init()?;

    Ok(())
}

/// Initialize logging only when explicitly requested via flags or RUST_LOG
///
/// Returns `true` if a subscriber was installed.
pub fn init_cli_logging<L: LogLevel>(
    verbosity: &Verbosity<L>,
    default_filter: &str,
) -> Result<bool> {
    if verbosity.is_present() || std::env::var("RUST_LOG").is_ok() {
        init_logging(verbosity, default_filter)?;
        Ok(true)
    } else {
        Ok(false)
    }
}

fn resolve_filter<L: LogLevel>(verbosity: &Verbosity<L>, default_filter: &str) -> Result<EnvFilter> {
    if verbosity.is_present() {
        let directive = match verbosity.log_level() {
            Some(level) => level.to_string().to_lowercase(),
            None => "off".to_string(),
        };
        return Ok(EnvFilter::try_new(directive)?);
    }

    Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use clap_verbosity_flag::WarnLevel;

    #[derive(Parser)]
    struct TestArgs {
        #[clap(flatten)]
        verbosity: Verbosity<WarnLevel>,
    }

    #[test]
    fn test_flags_override_default_filter() {
        let args = TestArgs::parse_from(["omniout", "-vv"]);
        let filter = resolve_filter(&args.verbosity, "omniout=warn").unwrap();
        assert_eq!(filter.to_string(), "debug");
    }

    #[test]
    fn test_quiet_disables_output() {
        let args = TestArgs::parse_from(["omniout", "-qq"]);
        let filter = resolve_filter(&args.verbosity, "omniout=warn").unwrap();
        assert_eq!(filter.to_string(), "off");
    }
}
