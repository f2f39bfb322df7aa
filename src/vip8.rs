// Implementation of Chip8 based on:
// - RCA COSMAC VIP CDP18S711 Instruction Manual
// - https://github.com/mattmikolay/chip-8/wiki/CHIP%E2%80%908-Instruction-Set
// - http://devernay.free.fr/hacks/chip8/C8TECH10.HTM

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::error::{Error, Result};
use crate::instruction::Instruction;
use crate::trace::{Trace, TraceRecord};

pub const VIP8_MEMORY_SIZE: usize = 0x1000;
pub const VIP8_ROM_START: u16 = 0x200;
pub const VIP8_MAX_ROM_SIZE: usize = VIP8_MEMORY_SIZE - VIP8_ROM_START as usize;
pub const VIP8_FONT_START: u16 = 0x100;
pub const VIP8_FONT_GLYPH_SIZE: u16 = 5;
pub const VIP8_STACK_SIZE: usize = 0x10;
pub const VIP8_REGISTER_COUNT: usize = 0x10;
pub const VIP8_DISPLAY_WIDTH: usize = 64;
pub const VIP8_DISPLAY_HEIGHT: usize = 32;
pub const VIP8_DISPLAY_SIZE: usize = VIP8_DISPLAY_WIDTH * VIP8_DISPLAY_HEIGHT;
pub const VIP8_KEY_COUNT: usize = 0x10;

const FLAG: usize = 0xf;

const FONT_DATA: [u8; VIP8_KEY_COUNT * VIP8_FONT_GLYPH_SIZE as usize] = [
    0xf0, 0x90, 0x90, 0x90, 0xf0,
    0x20, 0x60, 0x20, 0x20, 0x70,
    0xf0, 0x10, 0xf0, 0x80, 0xf0,
    0xf0, 0x10, 0xf0, 0x10, 0xf0,
    0x90, 0x90, 0xf0, 0x10, 0x10,
    0xf0, 0x80, 0xf0, 0x10, 0xf0,
    0xf0, 0x80, 0xf0, 0x90, 0xf0,
    0xf0, 0x10, 0x20, 0x40, 0x40,
    0xf0, 0x90, 0xf0, 0x90, 0xf0,
    0xf0, 0x90, 0xf0, 0x10, 0xf0,
    0xf0, 0x90, 0xf0, 0x90, 0x90,
    0xe0, 0x90, 0xe0, 0x90, 0xe0,
    0xf0, 0x80, 0x80, 0x80, 0xf0,
    0xe0, 0x90, 0x90, 0x90, 0xe0,
    0xf0, 0x80, 0xf0, 0x80, 0xf0,
    0xf0, 0x80, 0xf0, 0x80, 0x80];

pub struct Vip8 {
    program: Vec<u8>,
    memory: [u8; VIP8_MEMORY_SIZE],
    pc: u16,
    v: [u8; VIP8_REGISTER_COUNT],
    i: u16,
    dt: u8,
    st: u8,
    sp: u8,          // descending, the stack grows from the last slot down
    stack: [u16; VIP8_STACK_SIZE],
    keyboard: [bool; VIP8_KEY_COUNT],
    display: [u8; VIP8_DISPLAY_SIZE],
    trace: Trace,
    rng: StdRng,
}

impl Vip8 {
    /// Loads `program` at `VIP8_ROM_START`, random numbers are seeded from the OS.
    pub fn new(program: &[u8]) -> Result<Self> {
        Self::with_rng(program, StdRng::from_entropy())
    }

    /// Same as `new` but with a reproducible random number sequence.
    pub fn with_seed(program: &[u8], seed: u64) -> Result<Self> {
        Self::with_rng(program, StdRng::seed_from_u64(seed))
    }

    fn with_rng(program: &[u8], rng: StdRng) -> Result<Self> {
        if program.len() > VIP8_MAX_ROM_SIZE {
            return Err(Error::ProgramTooLarge {
                size: program.len(),
                max_size: VIP8_MAX_ROM_SIZE,
            });
        }

        let mut vip8 = Self {
            program: program.to_vec(),
            memory: [0x00; VIP8_MEMORY_SIZE],
            pc: VIP8_ROM_START,
            v: [0x00; VIP8_REGISTER_COUNT],
            i: 0x00,
            dt: 0x00,
            st: 0x00,
            sp: (VIP8_STACK_SIZE - 1) as u8,
            stack: [0x00; VIP8_STACK_SIZE],
            keyboard: [false; VIP8_KEY_COUNT],
            display: [0x00; VIP8_DISPLAY_SIZE],
            trace: Trace::default(),
            rng,
        };
        vip8.reset();
        Ok(vip8)
    }

    /// Throws away the running state and reloads the program it was created with.
    /// The random number generator keeps going.
    pub fn reset(&mut self) {
        let font_start = VIP8_FONT_START as usize;
        let rom_start = VIP8_ROM_START as usize;

        self.memory = [0x00; VIP8_MEMORY_SIZE];
        self.memory[font_start..font_start + FONT_DATA.len()].copy_from_slice(&FONT_DATA);
        self.memory[rom_start..rom_start + self.program.len()].copy_from_slice(&self.program);

        self.pc = VIP8_ROM_START;
        self.v = [0x00; VIP8_REGISTER_COUNT];
        self.i = 0x00;
        self.dt = 0x00;
        self.st = 0x00;
        self.sp = (VIP8_STACK_SIZE - 1) as u8;
        self.stack = [0x00; VIP8_STACK_SIZE];
        self.keyboard = [false; VIP8_KEY_COUNT];
        self.display = [0x00; VIP8_DISPLAY_SIZE];
        self.trace = Trace::default();

        log::debug!("Loaded {} program bytes at {:03X}", self.program.len(), VIP8_ROM_START);
    }

    pub fn set_keydown(&mut self, k: usize, v: bool) {
        if k < VIP8_KEY_COUNT {
            self.keyboard[k] = v;
        } else {
            log::warn!("Ignoring state of unknown key {:#X}", k);
        }
    }

    pub fn get_display_spot(&self, x: usize, y: usize) -> bool {
        if x < VIP8_DISPLAY_WIDTH && y < VIP8_DISPLAY_HEIGHT {
            self.display[y * VIP8_DISPLAY_WIDTH + x] != 0
        } else {
            false
        }
    }

    pub fn is_tone_on(&self) -> bool {
        self.st != 0
    }

    /// Row-major framebuffer, one byte (0 or 1) per pixel.
    pub fn display(&self) -> &[u8; VIP8_DISPLAY_SIZE] {
        &self.display
    }

    pub fn registers(&self) -> &[u8; VIP8_REGISTER_COUNT] {
        &self.v
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn i(&self) -> u16 {
        self.i
    }

    pub fn sp(&self) -> u8 {
        self.sp
    }

    pub fn dt(&self) -> u8 {
        self.dt
    }

    pub fn st(&self) -> u8 {
        self.st
    }

    pub fn stack(&self) -> &[u16; VIP8_STACK_SIZE] {
        &self.stack
    }

    pub fn keys(&self) -> &[bool; VIP8_KEY_COUNT] {
        &self.keyboard
    }

    pub fn memory(&self) -> &[u8; VIP8_MEMORY_SIZE] {
        &self.memory
    }

    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    /// Counts both timers down, meant to be called at 60hz.
    pub fn tick(&mut self) {
        self.dt = self.dt.saturating_sub(1);
        self.st = self.st.saturating_sub(1);
    }

    /// Executes a single instruction. Any error is terminal, the state is left
    /// as it was at the point of failure for inspection.
    pub fn step(&mut self) -> Result<()> {
        let address = self.pc;
        let opcode = self.fetch()?;
        let instruction = Instruction::decode(opcode)
            .ok_or(Error::UnimplementedInstruction { address, opcode })?;

        self.execute(address, instruction)?;

        let record = TraceRecord { address, opcode, instruction };
        log::trace!("{}", record);
        self.trace.push(record);
        Ok(())
    }

    fn fetch(&mut self) -> Result<u16> {
        let ir = memory_slice(&self.memory, self.pc, 2)?;
        let ir = u16::from_be_bytes([ir[0], ir[1]]);
        self.pc = self.pc.wrapping_add(2);
        Ok(ir)
    }

    fn execute(&mut self, address: u16, instruction: Instruction) -> Result<()> {
        match instruction {
            Instruction::ClearDisplay => {
                self.display = [0x00; VIP8_DISPLAY_SIZE];
            }
            Instruction::Return => {
                self.pc = self.pop_stack(address)?;
            }
            Instruction::Jump { addr } => {
                self.pc = addr;
            }
            Instruction::Call { addr } => {
                self.push_stack(address, self.pc)?;
                self.pc = addr;
            }
            Instruction::SkipEqImm { x, nn } => {
                self.skip_if(self.v[x as usize] == nn);
            }
            Instruction::SkipNeImm { x, nn } => {
                self.skip_if(self.v[x as usize] != nn);
            }
            Instruction::SkipEqReg { x, y } => {
                self.skip_if(self.v[x as usize] == self.v[y as usize]);
            }
            Instruction::LoadImm { x, nn } => {
                self.v[x as usize] = nn;
            }
            Instruction::AddImm { x, nn } => {
                self.v[x as usize] = self.v[x as usize].wrapping_add(nn);
            }
            Instruction::Move { x, y } => {
                self.v[x as usize] = self.v[y as usize];
            }
            Instruction::Or { x, y } => {
                self.v[x as usize] |= self.v[y as usize];
            }
            Instruction::And { x, y } => {
                self.v[x as usize] &= self.v[y as usize];
            }
            Instruction::Xor { x, y } => {
                self.v[x as usize] ^= self.v[y as usize];
            }
            Instruction::AddReg { x, y } => {
                let (v, o) = self.v[x as usize].overflowing_add(self.v[y as usize]);
                self.v[x as usize] = v;
                self.set_flag(o);
            }
            Instruction::Sub { x, y } => {
                let (v, o) = self.v[x as usize].overflowing_sub(self.v[y as usize]);
                self.v[x as usize] = v;
                self.set_flag(!o);
            }
            Instruction::ShiftRight { x } => {
                let vx = self.v[x as usize];
                self.v[x as usize] = vx >> 1;
                self.set_flag(vx & 0x01 != 0);
            }
            Instruction::SubReversed { x, y } => {
                let (v, o) = self.v[y as usize].overflowing_sub(self.v[x as usize]);
                self.v[x as usize] = v;
                self.set_flag(!o);
            }
            Instruction::ShiftLeft { x } => {
                let vx = self.v[x as usize];
                self.v[x as usize] = vx << 1;
                self.set_flag(vx & 0x80 != 0);
            }
            Instruction::SkipNeReg { x, y } => {
                self.skip_if(self.v[x as usize] != self.v[y as usize]);
            }
            Instruction::SetIndex { addr } => {
                self.i = addr;
            }
            Instruction::JumpOffset { addr } => {
                self.pc = addr.wrapping_add(self.v[0] as u16);
            }
            Instruction::Random { x, nn } => {
                self.v[x as usize] = (self.rng.next_u32() & nn as u32) as u8;
            }
            Instruction::Draw { x, y, n } => {
                let collided = self.draw(self.v[x as usize], self.v[y as usize], n)?;
                self.set_flag(collided);
            }
            Instruction::SkipKeyPressed { x } => {
                let pressed = self.is_key_down(self.v[x as usize])?;
                self.skip_if(pressed);
            }
            Instruction::SkipKeyNotPressed { x } => {
                let pressed = self.is_key_down(self.v[x as usize])?;
                self.skip_if(!pressed);
            }
            Instruction::LoadDelay { x } => {
                self.v[x as usize] = self.dt;
            }
            Instruction::WaitKey { x } => {
                match self.keyboard.iter().position(|&down| down) {
                    Some(k) => self.v[x as usize] = k as u8,
                    // spin on this instruction until the host reports a key
                    None => self.pc = self.pc.wrapping_sub(2),
                }
            }
            Instruction::SetDelay { x } => {
                self.dt = self.v[x as usize];
            }
            Instruction::SetSound { x } => {
                self.st = self.v[x as usize];
            }
            Instruction::AddIndex { x } => {
                self.i = self.i.wrapping_add(self.v[x as usize] as u16);
            }
            Instruction::LoadGlyph { x } => {
                self.i = VIP8_FONT_START + self.v[x as usize] as u16 * VIP8_FONT_GLYPH_SIZE;
            }
            Instruction::StoreBcd { x } => {
                let vx = self.v[x as usize];
                let digits = memory_slice_mut(&mut self.memory, self.i, 3)?;
                digits.copy_from_slice(&[vx / 100, (vx / 10) % 10, vx % 10]);
            }
            Instruction::StoreRegisters { x } => {
                let count = x as usize + 1;
                let dest = memory_slice_mut(&mut self.memory, self.i, count)?;
                dest.copy_from_slice(&self.v[..count]);
            }
            Instruction::LoadRegisters { x } => {
                let count = x as usize + 1;
                let src = memory_slice(&self.memory, self.i, count)?;
                self.v[..count].copy_from_slice(src);
            }
        }
        Ok(())
    }

    fn skip_if(&mut self, condition: bool) {
        if condition {
            self.pc = self.pc.wrapping_add(2);
        }
    }

    // VF is written last so the flag wins when VF is also the destination
    fn set_flag(&mut self, flag: bool) {
        self.v[FLAG] = if flag { 1 } else { 0 };
    }

    fn is_key_down(&self, k: u8) -> Result<bool> {
        self.keyboard.get(k as usize).copied().ok_or(Error::InvalidKey { key: k })
    }

    fn push_stack(&mut self, address: u16, value: u16) -> Result<()> {
        let slot = self
            .stack
            .get_mut(self.sp as usize)
            .ok_or(Error::StackOverflow { address })?;
        *slot = value;
        self.sp = self.sp.wrapping_sub(1);
        Ok(())
    }

    fn pop_stack(&mut self, address: u16) -> Result<u16> {
        let sp = self.sp.wrapping_add(1);
        let value = *self
            .stack
            .get(sp as usize)
            .ok_or(Error::StackUnderflow { address })?;
        self.sp = sp;
        Ok(value)
    }

    /// XORs an 8 pixel wide, `n` rows high sprite from I onto the display.
    /// Pixels falling off the right or bottom edge are dropped. Returns whether
    /// any lit pixel was turned off.
    fn draw(&mut self, x: u8, y: u8, n: u8) -> Result<bool> {
        let sprite = memory_slice(&self.memory, self.i, n as usize)?;
        let mut unset_bits = false;

        for (row, bits) in sprite.iter().enumerate() {
            let ty = y as usize + row;
            if ty >= VIP8_DISPLAY_HEIGHT {
                break;
            }
            for col in 0..8 {
                let tx = x as usize + col;
                if tx >= VIP8_DISPLAY_WIDTH {
                    break;
                }
                let bit = (bits >> (7 - col)) & 0x01;
                let spot = &mut self.display[ty * VIP8_DISPLAY_WIDTH + tx];
                unset_bits |= *spot == 1 && bit == 1;
                *spot ^= bit;
            }
        }
        Ok(unset_bits)
    }
}

fn memory_slice(memory: &[u8; VIP8_MEMORY_SIZE], start: u16, len: usize) -> Result<&[u8]> {
    let start = start as usize;
    memory
        .get(start..start + len)
        .ok_or(Error::AddressOutOfRange { address: start.max(VIP8_MEMORY_SIZE) })
}

fn memory_slice_mut(memory: &mut [u8; VIP8_MEMORY_SIZE], start: u16, len: usize) -> Result<&mut [u8]> {
    let start = start as usize;
    memory
        .get_mut(start..start + len)
        .ok_or(Error::AddressOutOfRange { address: start.max(VIP8_MEMORY_SIZE) })
}
