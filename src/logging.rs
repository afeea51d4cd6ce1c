use std::sync::Once;

use tracing_error::ErrorLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::formatter;

static SUBSCRIBER_INIT: Once = Once::new();

/// Installs the global subscriber. Only the first call has any effect.
///
/// `RUST_LOG` takes precedence over `level`, which applies to this crate and to guest
/// `console` output; everything else logs at `warn`.
pub fn setup_logging(level: &str) {
    SUBSCRIBER_INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "warn,{name}={level},{guest}={level}",
                name = env!("CARGO_CRATE_NAME"),
                guest = formatter::GUEST_TARGET,
            ))
        });

        let subscriber = FmtSubscriber::builder()
            .with_target(true)
            .event_format(formatter::CustomFormatter)
            .with_env_filter(filter)
            .finish()
            .with(ErrorLayer::default());

        if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
            eprintln!("Failed to install the tracing subscriber: {e}");
        }
    });
}
