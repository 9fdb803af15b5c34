pub mod memory;

pub use memory::{MemoryWorkbook, MemoryWorkbookError};
