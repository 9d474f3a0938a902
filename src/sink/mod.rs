pub mod file;
#[cfg(test)]
pub mod memory;
pub mod traits;

pub use file::FileSink;
#[cfg(test)]
pub use memory::MemorySink;
pub use traits::{AppendSink, SinkError};
