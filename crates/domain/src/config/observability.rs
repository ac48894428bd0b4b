use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Logging and trace export
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// How the binary logs and whether spans leave the process.
///
/// Logs always go to stderr. Span export over OTLP/gRPC starts only when
/// `otlp_endpoint` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Collector address, e.g. `http://localhost:4317`.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,

    /// Reported as the `service.name` resource attribute.
    #[serde(default = "d_service_name")]
    pub service_name: String,

    /// Fraction of traces exported, `0.0..=1.0`. Decided per trace id.
    #[serde(default = "d_sample_rate")]
    pub sample_rate: f64,

    /// JSON log lines instead of the compact human format.
    #[serde(default)]
    pub json_logs: bool,

    /// `EnvFilter` directives used when `RUST_LOG` is unset. Defaults to
    /// `warn` for compact logs and `info,lg_pipeline=debug` for JSON logs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
}

impl ObservabilityConfig {
    /// The filter directives to fall back on.
    pub fn default_filter(&self) -> &str {
        match (&self.log_filter, self.json_logs) {
            (Some(filter), _) => filter,
            (None, true) => "info,lg_pipeline=debug",
            (None, false) => "warn",
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            otlp_endpoint: None,
            service_name: d_service_name(),
            sample_rate: d_sample_rate(),
            json_logs: false,
            log_filter: None,
        }
    }
}

fn d_service_name() -> String {
    "leadgraph".into()
}

fn d_sample_rate() -> f64 {
    1.0
}
