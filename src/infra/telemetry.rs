use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::application::api::METRIC_FALLBACK_READS;
use crate::config::{LogFormat, LoggingSettings};
use crate::store::{METRIC_LOCAL_MUTATIONS, METRIC_LOCAL_NOTIFICATIONS, METRIC_REMOTE_FAILURES};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
///
/// Logs go to stderr so command output on stdout stays machine-readable.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            METRIC_LOCAL_MUTATIONS,
            Unit::Count,
            "Successful mutations applied to the local store, by collection and operation."
        );
        describe_counter!(
            METRIC_LOCAL_NOTIFICATIONS,
            Unit::Count,
            "Change notifications broadcast by the local store."
        );
        describe_counter!(
            METRIC_REMOTE_FAILURES,
            Unit::Count,
            "Remote record store calls that returned an error."
        );
        describe_counter!(
            METRIC_FALLBACK_READS,
            Unit::Count,
            "Reads answered from the local store after a remote failure."
        );
    });
}
