mod write_json;
mod write_tsv;

pub use write_json::{read_json, write_json, RunReport};
pub use write_tsv::TsvWriter;
