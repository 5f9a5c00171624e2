//! Once command implementation.
//!
//! Runs a single collection cycle and prints the records.

use anyhow::Result;
use bcache_exporter::{BcacheCollector, MetricRecord};
use std::io::Write;
use tracing::warn;

use crate::cli::RecordFormat;
use crate::config::Config;

/// Collects once and writes the records to stdout.
pub fn command_once(format: RecordFormat, config: &Config) -> Result<()> {
    let collector = BcacheCollector::new(config.collector_config());
    let collection = collector.collect_with_errors();

    for e in &collection.errors {
        warn!("{}", e);
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    out.write_all(render_records(&collection.records, format)?.as_bytes())?;
    Ok(())
}

/// Renders records as `<name> <value> <type>` lines or as a JSON array.
pub fn render_records(records: &[MetricRecord], format: RecordFormat) -> Result<String> {
    match format {
        RecordFormat::Text => Ok(records
            .iter()
            .map(|r| format!("{} {} {}\n", r.name(), r.value, r.kind.as_str()))
            .collect()),
        RecordFormat::Json => {
            let views: Vec<_> = records.iter().map(MetricRecord::view).collect();
            Ok(serde_json::to_string_pretty(&views)? + "\n")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bcache_exporter::{MetricCategory, MetricKey};

    #[test]
    fn test_render_text() {
        let records = vec![MetricRecord::gauge(
            MetricKey::new("sda", MetricCategory::DirtyData),
            3072,
        )];
        let text = render_records(&records, RecordFormat::Text).unwrap();
        assert_eq!(text, "sda.df_complex-dirty_data 3072 gauge\n");
    }

    #[test]
    fn test_render_json_empty() {
        let json = render_records(&[], RecordFormat::Json).unwrap();
        assert_eq!(json.trim(), "[]");
    }
}
