use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Observability
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Logging and OpenTelemetry export.
///
/// Without `otlp_endpoint` the server only writes JSON log lines. With it,
/// every `tracing` span is also exported over OTLP/gRPC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// OTLP gRPC endpoint, e.g. `http://localhost:4317`.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,

    /// `service.name` resource attribute reported to the collector.
    #[serde(default = "d_service_name")]
    pub service_name: String,

    /// Trace sampling ratio in `[0.0, 1.0]`.
    #[serde(default = "d_sample_rate")]
    pub sample_rate: f64,

    /// Filter used when `RUST_LOG` is unset.
    #[serde(default = "d_log_filter")]
    pub log_filter: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            otlp_endpoint: None,
            service_name: d_service_name(),
            sample_rate: d_sample_rate(),
            log_filter: d_log_filter(),
        }
    }
}

fn d_service_name() -> String {
    "leadbot".into()
}

fn d_sample_rate() -> f64 {
    1.0
}

fn d_log_filter() -> String {
    "info,lb_gateway=debug".into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_section_disables_export() {
        let cfg: ObservabilityConfig = toml::from_str("").unwrap();
        assert!(cfg.otlp_endpoint.is_none());
        assert_eq!(cfg.service_name, "leadbot");
        assert!((cfg.sample_rate - 1.0).abs() < f64::EPSILON);
        assert_eq!(cfg.log_filter, "info,lb_gateway=debug");
    }

    #[test]
    fn endpoint_and_ratio_parse() {
        let cfg: ObservabilityConfig = toml::from_str(
            r#"
            otlp_endpoint = "http://otel:4317"
            sample_rate = 0.25
        "#,
        )
        .unwrap();
        assert_eq!(cfg.otlp_endpoint.as_deref(), Some("http://otel:4317"));
        assert!((cfg.sample_rate - 0.25).abs() < f64::EPSILON);
    }
}
