mod encoder;
mod writer;

pub use encoder::{encode_text, EncodeError};
pub use writer::PrometheusWriter;
