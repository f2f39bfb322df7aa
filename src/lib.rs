pub mod error;
pub mod instruction;
pub mod trace;
pub mod vip8;

pub use crate::error::{Error, Result};
pub use crate::instruction::Instruction;
pub use crate::trace::{Trace, TraceRecord, VIP8_TRACE_SIZE};
pub use crate::vip8::*;
