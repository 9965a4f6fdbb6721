pub mod message;
pub mod reader;

pub use message::{GatewayMetadata, UplinkError, UplinkMessage};
pub use reader::{process_line, run, to_json_lines, RunStats};
