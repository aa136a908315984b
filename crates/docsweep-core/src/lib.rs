pub mod document;
pub mod error;
pub mod record;

pub use document::{count_words, object_key, Document, OBJECT_SUFFIX};
pub use error::{Error, Result};
pub use record::LogRecord;
