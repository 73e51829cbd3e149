use std::collections::hash_map::Entry;
use std::collections::HashMap;

use prometheus::{CounterVec, Encoder, GaugeVec, Opts, Registry, TextEncoder};
use thiserror::Error;
use tracing::debug;

use crate::domain::{Sample, SampleKind};

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    #[error("exposition is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

enum Vector {
    Gauge(GaugeVec),
    Counter(CounterVec),
}

struct Family {
    kind: SampleKind,
    label_names: Vec<String>,
    vector: Vector,
}

impl Family {
    fn register(registry: &Registry, sample: &Sample) -> Result<Self, prometheus::Error> {
        let opts = Opts::new(sample.name.clone(), sample.help.clone());
        let label_names = sample.label_names();
        let vector = match sample.kind {
            SampleKind::Gauge => {
                let vec = GaugeVec::new(opts, &label_names)?;
                registry.register(Box::new(vec.clone()))?;
                Vector::Gauge(vec)
            }
            SampleKind::Counter => {
                let vec = CounterVec::new(opts, &label_names)?;
                registry.register(Box::new(vec.clone()))?;
                Vector::Counter(vec)
            }
        };
        Ok(Self {
            kind: sample.kind,
            label_names: label_names.into_iter().map(String::from).collect(),
            vector,
        })
    }

    fn accepts(&self, sample: &Sample) -> bool {
        self.kind == sample.kind
            && self
                .label_names
                .iter()
                .map(String::as_str)
                .eq(sample.labels.iter().map(|(k, _)| k.as_str()))
    }

    fn record(&self, sample: &Sample) -> Result<(), prometheus::Error> {
        let values: Vec<&str> = sample.labels.iter().map(|(_, v)| v.as_str()).collect();
        match &self.vector {
            Vector::Gauge(vec) => vec.get_metric_with_label_values(&values)?.set(sample.value),
            Vector::Counter(vec) => {
                if sample.value.is_nan() || sample.value < 0.0 {
                    debug!(name = %sample.name, value = sample.value, "Skipping counter sample with negative or NaN value");
                    return Ok(());
                }
                // Counters carry the server-side running total; the last sample wins
                let counter = vec.get_metric_with_label_values(&values)?;
                counter.reset();
                counter.inc_by(sample.value);
            }
        }
        Ok(())
    }
}

/// Render samples in the Prometheus text exposition format.
///
/// The first sample seen for a name fixes that family's type and label schema;
/// later samples that disagree are dropped.
pub fn encode_text(samples: &[Sample]) -> Result<String, EncodeError> {
    let registry = Registry::new();
    let mut families: HashMap<&str, Family> = HashMap::new();

    for sample in samples {
        let family = match families.entry(sample.name.as_str()) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => match Family::register(&registry, sample) {
                Ok(family) => e.insert(family),
                Err(err) => {
                    debug!(name = %sample.name, error = %err, "Skipping unregistrable sample");
                    continue;
                }
            },
        };

        if !family.accepts(sample) {
            debug!(name = %sample.name, "Skipping sample with conflicting schema");
            continue;
        }
        if let Err(err) = family.record(sample) {
            debug!(name = %sample.name, error = %err, "Skipping sample");
        }
    }

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
