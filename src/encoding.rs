//! Instruction word encoding shared by the assembler, disassembler, and
//! emulator. A word is interpreted under one of two layouts selected by
//! the top 4 bits (`spec.md` §3):
//!
//! - opcode 13 ("load-immediate"): `[op:4][A:3][imm25:25]`
//! - every other opcode: `[op:4][unused:19][A:3][B:3][C:3]`

const OPCODE_SHIFT: u32 = 28;
const LOADIMM_A_SHIFT: u32 = 25;
const LOADIMM_IMM_MASK: u32 = 0x01FF_FFFF; // 25 bits
const ABC_A_SHIFT: u32 = 6;
const ABC_B_SHIFT: u32 = 3;
const ABC_C_SHIFT: u32 = 0;
const REG_MASK: u32 = 0b111;

/// The fourteen opcodes of the Universal Machine, numbered exactly as in
/// `spec.md` §3/§4.4.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum Opcode {
    ConditionalMove = 0,
    ArrayIndex = 1,
    ArrayAmend = 2,
    Addition = 3,
    Multiplication = 4,
    Division = 5,
    NotAnd = 6,
    Halt = 7,
    Allocation = 8,
    Abandonment = 9,
    Output = 10,
    Input = 11,
    LoadProgram = 12,
    LoadImmediate = 13,
}

impl Opcode {
    /// Recovers an `Opcode` from the top nibble of an instruction word.
    /// Returns `None` for the two unassigned opcodes (14, 15) and any
    /// value above 15 cannot occur since the nibble is 4 bits wide.
    pub fn from_nibble(n: u32) -> Option<Opcode> {
        use Opcode::*;
        Some(match n {
            0 => ConditionalMove,
            1 => ArrayIndex,
            2 => ArrayAmend,
            3 => Addition,
            4 => Multiplication,
            5 => Division,
            6 => NotAnd,
            7 => Halt,
            8 => Allocation,
            9 => Abandonment,
            10 => Output,
            11 => Input,
            12 => LoadProgram,
            13 => LoadImmediate,
            _ => return None,
        })
    }

    pub fn as_nibble(self) -> u32 {
        self as u32
    }
}

/// A decoded instruction word. Both layouts are extracted unconditionally;
/// the caller selects which fields to trust based on `op`.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub struct Decoded {
    pub op: u32,
    pub a: u32,
    pub b: u32,
    pub c: u32,
    pub loadimm_a: u32,
    pub imm25: u32,
}

/// Packs a three-register instruction. `op` must be one of 0..=12; the
/// caller (the assembler, or the emulator's own re-encode in tests) is
/// responsible for only ever calling this with a register 0..=7 and a
/// valid ABC opcode.
pub fn encode_abc(op: Opcode, a: u8, b: u8, c: u8) -> u32 {
    debug_assert!(a < 8 && b < 8 && c < 8);
    ((op.as_nibble()) << OPCODE_SHIFT)
        | (((a as u32) & REG_MASK) << ABC_A_SHIFT)
        | (((b as u32) & REG_MASK) << ABC_B_SHIFT)
        | (((c as u32) & REG_MASK) << ABC_C_SHIFT)
}

/// Packs a load-immediate instruction. Fails if `imm25` needs more than 25
/// bits or `a` is not a valid register id.
pub fn encode_loadimm(a: u8, imm25: u32) -> Result<u32, LoadImmediateError> {
    if a >= 8 {
        return Err(LoadImmediateError::RegisterOutOfRange);
    }
    if imm25 > LOADIMM_IMM_MASK {
        return Err(LoadImmediateError::ImmediateTooLarge);
    }
    Ok((Opcode::LoadImmediate.as_nibble() << OPCODE_SHIFT)
        | ((a as u32) << LOADIMM_A_SHIFT)
        | (imm25 & LOADIMM_IMM_MASK))
}

#[derive(thiserror::Error, Clone, Copy, Eq, PartialEq, Debug)]
pub enum LoadImmediateError {
    #[error("register operand out of range (must be 0..=7)")]
    RegisterOutOfRange,
    #[error("immediate exceeds 25 bits")]
    ImmediateTooLarge,
}

/// Decodes a word under both layouts. Use `op` to pick which of
/// `{a, b, c}` or `{loadimm_a, imm25}` applies.
pub fn decode(word: u32) -> Decoded {
    Decoded {
        op: word >> OPCODE_SHIFT,
        a: (word >> ABC_A_SHIFT) & REG_MASK,
        b: (word >> ABC_B_SHIFT) & REG_MASK,
        c: (word >> ABC_C_SHIFT) & REG_MASK,
        loadimm_a: (word >> LOADIMM_A_SHIFT) & REG_MASK,
        imm25: word & LOADIMM_IMM_MASK,
    }
}
