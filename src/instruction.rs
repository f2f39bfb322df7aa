// Instruction set as described in:
// - https://github.com/mattmikolay/chip-8/wiki/CHIP%E2%80%908-Instruction-Set
// - http://devernay.free.fr/hacks/chip8/C8TECH10.HTM

use std::fmt;

/// A decoded opcode. `x` and `y` select registers, `nn` is an immediate byte,
/// `n` a 4 bit count and `addr` a 12 bit address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// 00E0
    ClearDisplay,
    /// 00EE
    Return,
    /// 1NNN
    Jump { addr: u16 },
    /// 2NNN
    Call { addr: u16 },
    /// 3XNN
    SkipEqImm { x: u8, nn: u8 },
    /// 4XNN
    SkipNeImm { x: u8, nn: u8 },
    /// 5XY0
    SkipEqReg { x: u8, y: u8 },
    /// 6XNN
    LoadImm { x: u8, nn: u8 },
    /// 7XNN, VF untouched
    AddImm { x: u8, nn: u8 },
    /// 8XY0
    Move { x: u8, y: u8 },
    /// 8XY1
    Or { x: u8, y: u8 },
    /// 8XY2
    And { x: u8, y: u8 },
    /// 8XY3
    Xor { x: u8, y: u8 },
    /// 8XY4
    AddReg { x: u8, y: u8 },
    /// 8XY5
    Sub { x: u8, y: u8 },
    /// 8XY6
    ShiftRight { x: u8 },
    /// 8XY7
    SubReversed { x: u8, y: u8 },
    /// 8XYE
    ShiftLeft { x: u8 },
    /// 9XY0
    SkipNeReg { x: u8, y: u8 },
    /// ANNN
    SetIndex { addr: u16 },
    /// BNNN
    JumpOffset { addr: u16 },
    /// CXNN
    Random { x: u8, nn: u8 },
    /// DXYN
    Draw { x: u8, y: u8, n: u8 },
    /// EX9E
    SkipKeyPressed { x: u8 },
    /// EXA1
    SkipKeyNotPressed { x: u8 },
    /// FX07
    LoadDelay { x: u8 },
    /// FX0A
    WaitKey { x: u8 },
    /// FX15
    SetDelay { x: u8 },
    /// FX18
    SetSound { x: u8 },
    /// FX1E
    AddIndex { x: u8 },
    /// FX29
    LoadGlyph { x: u8 },
    /// FX33
    StoreBcd { x: u8 },
    /// FX55
    StoreRegisters { x: u8 },
    /// FX65
    LoadRegisters { x: u8 },
}

impl Instruction {
    /// Decodes a raw opcode, `None` when no instruction matches it.
    pub fn decode(op: u16) -> Option<Self> {
        let addr = op & 0x0fff;
        let nn = (op & 0x00ff) as u8;
        let x = ((op & 0x0f00) >> 8) as u8;
        let y = ((op & 0x00f0) >> 4) as u8;
        let n = (op & 0x000f) as u8;

        let instruction = match op >> 12 {
            0x0 => match op {
                0x00e0 => Self::ClearDisplay,
                0x00ee => Self::Return,
                _ => return None,
            },
            0x1 => Self::Jump { addr },
            0x2 => Self::Call { addr },
            0x3 => Self::SkipEqImm { x, nn },
            0x4 => Self::SkipNeImm { x, nn },
            0x5 => Self::SkipEqReg { x, y },
            0x6 => Self::LoadImm { x, nn },
            0x7 => Self::AddImm { x, nn },
            0x8 => match n {
                0x0 => Self::Move { x, y },
                0x1 => Self::Or { x, y },
                0x2 => Self::And { x, y },
                0x3 => Self::Xor { x, y },
                0x4 => Self::AddReg { x, y },
                0x5 => Self::Sub { x, y },
                0x6 => Self::ShiftRight { x },
                0x7 => Self::SubReversed { x, y },
                0xe => Self::ShiftLeft { x },
                _ => return None,
            },
            0x9 => Self::SkipNeReg { x, y },
            0xa => Self::SetIndex { addr },
            0xb => Self::JumpOffset { addr },
            0xc => Self::Random { x, nn },
            0xd => Self::Draw { x, y, n },
            0xe => match nn {
                0x9e => Self::SkipKeyPressed { x },
                0xa1 => Self::SkipKeyNotPressed { x },
                _ => return None,
            },
            0xf => match nn {
                0x07 => Self::LoadDelay { x },
                0x0a => Self::WaitKey { x },
                0x15 => Self::SetDelay { x },
                0x18 => Self::SetSound { x },
                0x1e => Self::AddIndex { x },
                0x29 => Self::LoadGlyph { x },
                0x33 => Self::StoreBcd { x },
                0x55 => Self::StoreRegisters { x },
                0x65 => Self::LoadRegisters { x },
                _ => return None,
            },
            _ => unreachable!("top nibble of a u16 is at most 0xf"),
        };
        Some(instruction)
    }
}

/// Assembly-like mnemonic, columns aligned for the trace view.
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::ClearDisplay => write!(f, "CLS  "),
            Self::Return => write!(f, "RET  "),
            Self::Jump { addr } => write!(f, "GOTO {:03X}", addr),
            Self::Call { addr } => write!(f, "CALL {:03X}", addr),
            Self::SkipEqImm { x, nn } => write!(f, "SE   V{:X},#{:02X}", x, nn),
            Self::SkipNeImm { x, nn } => write!(f, "SNE  V{:X},#{:02X}", x, nn),
            Self::SkipEqReg { x, y } => write!(f, "SE   V{:X},V{:X}", x, y),
            Self::LoadImm { x, nn } => write!(f, "LD   V{:X},#{:02X}", x, nn),
            Self::AddImm { x, nn } => write!(f, "ADD  V{:X},#{:02X}", x, nn),
            Self::Move { x, y } => write!(f, "LD   V{:X},V{:X}", x, y),
            Self::Or { x, y } => write!(f, "OR   V{:X},V{:X}", x, y),
            Self::And { x, y } => write!(f, "AND  V{:X},V{:X}", x, y),
            Self::Xor { x, y } => write!(f, "XOR  V{:X},V{:X}", x, y),
            Self::AddReg { x, y } => write!(f, "ADD  V{:X},V{:X}", x, y),
            Self::Sub { x, y } => write!(f, "SUB  V{:X},V{:X}", x, y),
            Self::ShiftRight { x } => write!(f, "SHR  V{:X}", x),
            Self::SubReversed { x, y } => write!(f, "SUBN V{:X},V{:X}", x, y),
            Self::ShiftLeft { x } => write!(f, "SHL  V{:X}", x),
            Self::SkipNeReg { x, y } => write!(f, "SNE  V{:X},V{:X}", x, y),
            Self::SetIndex { addr } => write!(f, "LD   I,#{:04X}", addr),
            Self::JumpOffset { addr } => write!(f, "JP   V0,#{:04X}", addr),
            Self::Random { x, nn } => write!(f, "RND  V{:X},#{:02X}", x, nn),
            Self::Draw { x, y, n } => write!(f, "DRW  V{:X},V{:X},{}", x, y, n),
            Self::SkipKeyPressed { x } => write!(f, "SKP  V{:X}", x),
            Self::SkipKeyNotPressed { x } => write!(f, "SKNP V{:X}", x),
            Self::LoadDelay { x } => write!(f, "LD   V{:X},DT", x),
            Self::WaitKey { x } => write!(f, "LD   V{:X},K", x),
            Self::SetDelay { x } => write!(f, "LD   DT,V{:X}", x),
            Self::SetSound { x } => write!(f, "LD   ST,V{:X}", x),
            Self::AddIndex { x } => write!(f, "ADD  I,V{:X}", x),
            Self::LoadGlyph { x } => write!(f, "LD   F,V{:X}", x),
            Self::StoreBcd { x } => write!(f, "LD   B,V{:X}", x),
            Self::StoreRegisters { x } => write!(f, "LD   [I],V{:X}", x),
            Self::LoadRegisters { x } => write!(f, "LD   V{:X},[I]", x),
        }
    }
}
