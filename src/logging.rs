use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "kindred=debug"
    } else {
        "kindred=warn"
    }
}

/// Install the global subscriber. Diagnostics go to stderr so they never mix
/// with command output. Calling this twice is harmless.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_raises_the_default_level() {
        assert_eq!(default_directive(false), "kindred=warn");
        assert_eq!(default_directive(true), "kindred=debug");
    }

    #[test]
    fn init_is_idempotent() {
        init(false);
        init(true);
    }
}
