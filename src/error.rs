/// Errors that stop the Vip8 from executing any further
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Not implemented {opcode:04X} at {address:03X}")]
    UnimplementedInstruction { address: u16, opcode: u16 },

    #[error("Program is too large ({size} bytes), max size is {max_size} bytes")]
    ProgramTooLarge { size: usize, max_size: usize },

    #[error("Stack overflow calling from {address:03X}")]
    StackOverflow { address: u16 },

    #[error("Stack underflow returning from {address:03X}")]
    StackUnderflow { address: u16 },

    #[error("Memory access out of range at {address:#06X}")]
    AddressOutOfRange { address: usize },

    #[error("Key {key:#04X} does not exist")]
    InvalidKey { key: u8 },
}

pub type Result<T> = std::result::Result<T, Error>;
