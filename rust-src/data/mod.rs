//! Decoding of seed files and collection naming.

mod extjson;
mod naming;
mod record_parser;

#[allow(unused_imports)]
pub use extjson::{decode_document, ExtJsonError, ExtJsonMode};
pub use naming::extract_collection_name;
#[allow(unused_imports)]
pub use record_parser::{parse_records, ParseError, RecordLocation};
