pub mod ndjson;
pub mod writer;

pub use ndjson::EventCodec;
pub use writer::EventWriter;
