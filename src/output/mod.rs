pub mod report;
pub mod writer_csv;
pub mod writer_jsonl;

pub use report::Report;
pub use writer_csv::{read_report, write_report};
pub use writer_jsonl::{read_jsonl, write_jsonl};
