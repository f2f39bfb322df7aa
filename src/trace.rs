use std::fmt;

use crate::instruction::Instruction;

pub const VIP8_TRACE_SIZE: usize = 16;

/// One executed instruction, as shown in the debug trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceRecord {
    pub address: u16,
    pub opcode: u16,
    pub instruction: Instruction,
}

impl fmt::Display for TraceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03X}-{:04X} {}", self.address, self.opcode, self.instruction)
    }
}

/// Ring buffer holding the last `VIP8_TRACE_SIZE` executed instructions.
#[derive(Debug, Clone, Default)]
pub struct Trace {
    records: [Option<TraceRecord>; VIP8_TRACE_SIZE],
    index: usize,
}

impl Trace {
    pub fn push(&mut self, record: TraceRecord) {
        self.records[self.index] = Some(record);
        self.index = (self.index + 1) % VIP8_TRACE_SIZE;
    }

    /// Slot the next record will be written to.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Recorded instructions, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &TraceRecord> + '_ {
        (0..VIP8_TRACE_SIZE)
            .filter_map(move |i| self.records[(self.index + i) % VIP8_TRACE_SIZE].as_ref())
    }

    pub fn last(&self) -> Option<&TraceRecord> {
        self.records[(self.index + VIP8_TRACE_SIZE - 1) % VIP8_TRACE_SIZE].as_ref()
    }
}
