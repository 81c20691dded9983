use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

pub(crate) fn install() -> Result<(), BuildError> {
    // install metrics collector and exporter
    freesmiley_shared::metrics::install(
        PrometheusBuilder::new().add_global_label("process", "handler"),
    )?;

    // define metrics
    metrics::describe_counter!(
        "settings_cache_hits_total",
        "guild documents served from the settings cache"
    );
    metrics::describe_counter!(
        "settings_cache_misses_total",
        "guild documents fetched from the settings backend"
    );
    metrics::describe_counter!(
        "settings_cache_evictions_total",
        "guild documents evicted from the settings cache to make room"
    );
    metrics::describe_counter!(
        "settings_writes_total",
        "setting writes by operation"
    );
    metrics::describe_counter!(
        "settings_backend_errors_total",
        "failed or timed out settings backend calls"
    );
    metrics::describe_counter!(
        "smileys_sent_total",
        "smileys sent or reacted with, by mode"
    );

    Ok(())
}
