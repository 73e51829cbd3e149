use serde::Serialize;

/// Exposition type of a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleKind {
    Gauge,
    Counter,
}

/// One metric sample produced during a scrape
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub name: String,
    pub help: String,
    pub kind: SampleKind,
    /// Label pairs, in a fixed order per metric name
    pub labels: Vec<(String, String)>,
    pub value: f64,
}

impl Sample {
    pub fn gauge(name: impl Into<String>, help: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            kind: SampleKind::Gauge,
            labels: Vec::new(),
            value,
        }
    }

    pub fn counter(name: impl Into<String>, help: impl Into<String>, value: f64) -> Self {
        Self {
            kind: SampleKind::Counter,
            ..Self::gauge(name, help, value)
        }
    }

    pub fn with_labels(mut self, labels: Vec<(String, String)>) -> Self {
        self.labels = labels;
        self
    }

    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn label_names(&self) -> Vec<&str> {
        self.labels.iter().map(|(k, _)| k.as_str()).collect()
    }

    pub fn descriptor(&self) -> Descriptor {
        Descriptor {
            name: self.name.clone(),
            help: self.help.clone(),
            kind: self.kind,
            label_names: self.labels.iter().map(|(k, _)| k.clone()).collect(),
        }
    }
}

/// Static description of a metric family, derived from observed samples
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Descriptor {
    pub name: String,
    pub help: String,
    pub kind: SampleKind,
    pub label_names: Vec<String>,
}

/// Map an arbitrary string onto the metric-name alphabet `[a-zA-Z0-9_:]`
pub fn sanitize_metric_name(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == ':' { c } else { '_' })
        .collect();
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_metric_name() {
        assert_eq!(sanitize_metric_name("Query"), "Query");
        assert_eq!(sanitize_metric_name("jemalloc.background_thread.num"), "jemalloc_background_thread_num");
        assert_eq!(sanitize_metric_name("1min-load"), "_1min_load");
    }

    #[test]
    fn test_descriptor_from_sample() {
        let sample = Sample::gauge("chi_clickhouse_table_parts", "Parts", 3.0)
            .with_labels(vec![("chi".into(), "chi1".into()), ("table".into(), "t".into())]);
        let desc = sample.descriptor();
        assert_eq!(desc.name, "chi_clickhouse_table_parts");
        assert_eq!(desc.label_names, vec!["chi", "table"]);
        assert_eq!(sample.label("table"), Some("t"));
    }
}
