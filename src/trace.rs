//! The `--trace`/`UM_TRACE_LIMIT` per-instruction trace channel (`spec.md`
//! §5, §6). This is a user-facing protocol feature, not the ambient `log`
//! diagnostics used elsewhere in the crate, so it writes directly to
//! stderr in a fixed format instead of going through a log level filter.

use crate::encoding::{decode, Opcode};
use crate::machine::Registers;
use std::io::Write;

/// Controls whether and how long per-instruction tracing stays enabled.
pub struct Tracer {
    enabled: bool,
    limit: Option<u32>,
}

impl Tracer {
    /// `enabled` comes from `--trace`; `UM_TRACE_LIMIT` is read from the
    /// environment only when tracing is requested, matching the reference
    /// loader's behavior of ignoring the variable otherwise.
    pub fn new(enabled: bool) -> Tracer {
        let limit = if enabled {
            std::env::var("UM_TRACE_LIMIT")
                .ok()
                .and_then(|s| s.parse::<u32>().ok())
        } else {
            None
        };
        Tracer { enabled, limit }
    }

    pub fn is_active(&self, pc: u32) -> bool {
        self.enabled && self.limit.map_or(true, |limit| pc < limit)
    }

    /// Prints the pre-execution decode line, mirroring the reference
    /// loader's `[pc=... ] 0x... mnemonic ...` format.
    pub fn trace_fetch(&self, pc: u32, word: u32, regs: &Registers) {
        if !self.is_active(pc) {
            return;
        }
        let d = decode(word);
        let mut stderr = std::io::stderr();
        let result = if d.op == Opcode::LoadImmediate.as_nibble() {
            writeln!(
                stderr,
                "[pc={}] 0x{:08x} {:<8} A={} imm={}",
                pc, word, "loadimm", d.loadimm_a, d.imm25
            )
        } else {
            writeln!(
                stderr,
                "[pc={}] 0x{:08x} {:<8} A={} B={} C={} | rA={} rB={} rC={}",
                pc,
                word,
                opname(d.op),
                d.a,
                d.b,
                d.c,
                regs[d.a as usize],
                regs[d.b as usize],
                regs[d.c as usize],
            )
        };
        let _ = result;
        let _ = stderr.flush();
    }

    /// Prints every register that changed between `before` and `after`.
    pub fn trace_register_changes(&self, pc: u32, before: &Registers, after: &Registers) {
        if !self.is_active(pc) {
            return;
        }
        let mut stderr = std::io::stderr();
        for i in 0..8 {
            if before[i] != after[i] {
                let _ = writeln!(stderr, "   r{}: {} -> {}", i, before[i], after[i]);
            }
        }
        let _ = stderr.flush();
    }
}

fn opname(op: u32) -> &'static str {
    match Opcode::from_nibble(op) {
        Some(Opcode::ConditionalMove) => "cmov",
        Some(Opcode::ArrayIndex) => "aidx",
        Some(Opcode::ArrayAmend) => "aupd",
        Some(Opcode::Addition) => "add",
        Some(Opcode::Multiplication) => "mul",
        Some(Opcode::Division) => "div",
        Some(Opcode::NotAnd) => "nand",
        Some(Opcode::Halt) => "halt",
        Some(Opcode::Allocation) => "alloc",
        Some(Opcode::Abandonment) => "dealloc",
        Some(Opcode::Output) => "out",
        Some(Opcode::Input) => "in",
        Some(Opcode::LoadProgram) => "loadprog",
        Some(Opcode::LoadImmediate) => "loadimm",
        None => "?",
    }
}
