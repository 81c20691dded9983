use std::time::Duration;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use metrics_process::Collector as ProcessCollector;

pub fn install(builder: PrometheusBuilder) -> Result<(), BuildError> {
    // install recorder and exporter
    builder.install()?;

    // define and start process metrics
    let proc_collector = ProcessCollector::default();
    proc_collector.describe();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(15));
        loop {
            interval.tick().await;
            proc_collector.collect();
        }
    });

    Ok(())
}
