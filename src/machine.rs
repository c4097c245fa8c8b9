//! The emulator core: fetch/decode/execute loop, trap semantics, and the
//! three-state machine `Run` / `Halted` / `Failed` (`spec.md` §4.4).

use crate::encoding::{decode, Opcode};
use crate::error::Trap;
use crate::pool::ArrayPool;
use crate::trace::Tracer;
use std::io::{Read, Write};

/// The eight general-purpose registers, r0..r7.
pub type Registers = [u32; 8];

/// Where execution stands after a run. `Halted` and `Failed` are terminal;
/// `run` only returns once one of them is reached.
#[derive(Debug)]
pub enum Outcome {
    Halted,
    Failed(Trap),
}

impl Outcome {
    /// The process exit code `spec.md` §7 assigns to this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Halted => 0,
            Outcome::Failed(_) => 1,
        }
    }
}

/// Owns the register file, the array pool, and the program counter for one
/// run. Not reentrant and not `Send`-shared; one `Machine` lives the
/// lifetime of one program run (`spec.md` §5).
pub struct Machine<In, Out> {
    registers: Registers,
    pool: ArrayPool,
    pc: u32,
    input: In,
    output: Out,
}

impl<In: Read, Out: Write> Machine<In, Out> {
    /// Boots a machine with `program` installed as array 0, registers
    /// zeroed, and PC at 0.
    pub fn new(program: Vec<u32>, input: In, output: Out) -> Machine<In, Out> {
        log::debug!("boot: program is {} words", program.len());
        Machine {
            registers: [0; 8],
            pool: ArrayPool::boot(program),
            pc: 0,
            input,
            output,
        }
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    /// Runs until halt or trap, calling `tracer` around each cycle.
    pub fn run(&mut self, tracer: &Tracer) -> Outcome {
        loop {
            match self.step(tracer) {
                Ok(true) => continue,
                Ok(false) => return Outcome::Halted,
                Err(trap) => return Outcome::Failed(trap),
            }
        }
    }

    /// Executes one cycle. Returns `Ok(true)` to keep running, `Ok(false)`
    /// on halt, or `Err(trap)` on a trapping condition.
    fn step(&mut self, tracer: &Tracer) -> Result<bool, Trap> {
        let pc = self.pc;
        let word = self.pool.array0_word(pc).ok_or(Trap::PcOutOfBounds)?;
        let before = self.registers;

        tracer.trace_fetch(pc, word, &self.registers);

        let d = decode(word);
        let keep_running = if d.op == Opcode::LoadImmediate.as_nibble() {
            self.registers[d.loadimm_a as usize] = d.imm25;
            self.pc += 1;
            true
        } else {
            let op = Opcode::from_nibble(d.op).ok_or(Trap::InvalidOpcode)?;
            self.execute(op, d.a as usize, d.b as usize, d.c as usize)?
        };

        tracer.trace_register_changes(pc, &before, &self.registers);
        Ok(keep_running)
    }

    /// Dispatches one ABC-layout opcode. Returns `Ok(false)` only for
    /// `Halt`; every other non-trapping opcode returns `Ok(true)`.
    /// `LoadProgram` advances `self.pc` itself and must not fall through to
    /// the caller's `pc += 1`.
    fn execute(&mut self, op: Opcode, a: usize, b: usize, c: usize) -> Result<bool, Trap> {
        let r = self.registers;
        match op {
            Opcode::ConditionalMove => {
                if r[c] != 0 {
                    self.registers[a] = r[b];
                }
                self.pc += 1;
            }
            Opcode::ArrayIndex => {
                self.registers[a] = self.pool.index(r[b], r[c])?;
                self.pc += 1;
            }
            Opcode::ArrayAmend => {
                self.pool.amend(r[a], r[b], r[c])?;
                self.pc += 1;
            }
            Opcode::Addition => {
                self.registers[a] = r[b].wrapping_add(r[c]);
                self.pc += 1;
            }
            Opcode::Multiplication => {
                self.registers[a] = r[b].wrapping_mul(r[c]);
                self.pc += 1;
            }
            Opcode::Division => {
                if r[c] == 0 {
                    return Err(Trap::DivideByZero);
                }
                self.registers[a] = r[b] / r[c];
                self.pc += 1;
            }
            Opcode::NotAnd => {
                self.registers[a] = !(r[b] & r[c]);
                self.pc += 1;
            }
            Opcode::Halt => {
                return Ok(false);
            }
            Opcode::Allocation => {
                let id = self.pool.allocate(r[c])?;
                self.registers[b] = id;
                self.pc += 1;
            }
            Opcode::Abandonment => {
                self.pool.abandon(r[c])?;
                self.pc += 1;
            }
            Opcode::Output => {
                let v = r[c];
                if v > 0xFF {
                    return Err(Trap::OutputOutOfRange);
                }
                self.output
                    .write_all(&[v as u8])
                    .and_then(|_| self.output.flush())
                    .map_err(|_| Trap::OutputWriteFailed)?;
                self.pc += 1;
            }
            Opcode::Input => {
                let mut byte = [0u8; 1];
                self.registers[c] = match self.input.read(&mut byte) {
                    Ok(1) => byte[0] as u32,
                    _ => 0xFFFF_FFFF,
                };
                self.pc += 1;
            }
            Opcode::LoadProgram => {
                if r[b] != 0 {
                    self.pool
                        .duplicate_into_array0(r[b])
                        .map_err(|_| Trap::LoadProgInactiveId)?;
                    log::debug!("loadprog: replaced array 0 with a copy of id={}", r[b]);
                }
                self.pc = r[c];
            }
            Opcode::LoadImmediate => unreachable!("handled by the caller"),
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::encode_abc;
    use crate::encoding::encode_loadimm;

    fn run_program(words: Vec<u32>, input: &[u8]) -> (Outcome, Registers, Vec<u8>) {
        let mut output = Vec::new();
        let outcome;
        let regs;
        {
            let mut machine = Machine::new(words, input, &mut output);
            outcome = machine.run(&Tracer::new(false));
            regs = *machine.registers();
        }
        (outcome, regs, output)
    }

    #[test]
    fn halt_only() {
        let (outcome, _, out) = run_program(vec![encode_abc(Opcode::Halt, 0, 0, 0)], &[]);
        assert!(matches!(outcome, Outcome::Halted));
        assert_eq!(outcome.exit_code(), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn hello_byte() {
        let program = vec![
            encode_loadimm(0, 65).unwrap(),
            encode_abc(Opcode::Output, 0, 0, 0),
            encode_abc(Opcode::Halt, 0, 0, 0),
        ];
        let (outcome, _, out) = run_program(program, &[]);
        assert!(matches!(outcome, Outcome::Halted));
        assert_eq!(out, vec![0x41]);
    }

    #[test]
    fn divide_trap() {
        let program = vec![
            encode_loadimm(0, 10).unwrap(),
            encode_loadimm(1, 0).unwrap(),
            encode_abc(Opcode::Division, 2, 0, 1),
            encode_abc(Opcode::Halt, 0, 0, 0),
        ];
        let (outcome, _, _) = run_program(program, &[]);
        assert!(matches!(outcome, Outcome::Failed(Trap::DivideByZero)));
        assert_eq!(outcome.exit_code(), 1);
    }

    #[test]
    fn alloc_index_amend_dealloc_cycle() {
        let program = vec![
            encode_loadimm(1, 3).unwrap(),               // r1 = 3 (length)
            encode_abc(Opcode::Allocation, 0, 2, 1),      // r2 = alloc(r1)
            encode_loadimm(3, 1).unwrap(),                // r3 = 1 (offset)
            encode_loadimm(4, 99).unwrap(),                // r4 = 99
            encode_abc(Opcode::ArrayAmend, 2, 3, 4),      // arr[r2][r3] = r4
            encode_abc(Opcode::ArrayIndex, 5, 2, 3),      // r5 = arr[r2][r3]
            encode_abc(Opcode::Abandonment, 0, 0, 2),     // dealloc(r2)
            encode_abc(Opcode::Halt, 0, 0, 0),
        ];
        let (outcome, regs, _) = run_program(program, &[]);
        assert!(matches!(outcome, Outcome::Halted));
        assert_eq!(regs[5], 99);
    }

    #[test]
    fn self_modifying_jump() {
        // Allocate a 1-word array, plant `halt` at offset 0 via `amend`
        // (its word, 0x7000_0000, exceeds the 25-bit loadimm range), then
        // loadprog into it.
        let program = vec![
            encode_loadimm(1, 1).unwrap(),           // r1 = 1 (length)
            encode_abc(Opcode::Allocation, 0, 2, 1), // r2 = alloc(1)
        ];
        let mut output = Vec::new();
        let mut machine = Machine::new(program, std::io::empty(), &mut output);
        let tracer = Tracer::new(false);
        for _ in 0..2 {
            assert!(machine.step(&tracer).unwrap());
        }
        let id = machine.registers[2];
        machine
            .pool
            .amend(id, 0, encode_abc(Opcode::Halt, 0, 0, 0))
            .unwrap();
        machine.registers[5] = 0; // new pc
        let outcome = machine.execute(Opcode::LoadProgram, 0, 2, 5);
        assert_eq!(outcome, Ok(true));
        assert_eq!(machine.pool.array0_len(), 1, "array 0 replaced by the copy");
        assert_eq!(machine.pc, 0);
        let outcome = machine.run(&tracer);
        assert!(matches!(outcome, Outcome::Halted));
    }

    #[test]
    fn eof_input_yields_all_ones() {
        let program = vec![
            encode_abc(Opcode::Input, 0, 0, 0),
            encode_abc(Opcode::Halt, 0, 0, 0),
        ];
        let (outcome, regs, _) = run_program(program, &[]);
        assert!(matches!(outcome, Outcome::Halted));
        assert_eq!(regs[0], 0xFFFF_FFFF);
    }

    #[test]
    fn pc_out_of_bounds_traps() {
        let (outcome, _, _) = run_program(vec![], &[]);
        assert!(matches!(outcome, Outcome::Failed(Trap::PcOutOfBounds)));
    }

    #[test]
    fn output_above_255_traps() {
        let program = vec![
            encode_loadimm(0, 256).unwrap(),
            encode_abc(Opcode::Output, 0, 0, 0),
        ];
        let (outcome, _, _) = run_program(program, &[]);
        assert!(matches!(outcome, Outcome::Failed(Trap::OutputOutOfRange)));
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed"))
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn output_write_failure_is_not_reported_as_range_trap() {
        let program = vec![
            encode_loadimm(0, 65).unwrap(),
            encode_abc(Opcode::Output, 0, 0, 0),
        ];
        let mut machine = Machine::new(program, std::io::empty(), FailingWriter);
        let outcome = machine.run(&Tracer::new(false));
        assert!(matches!(outcome, Outcome::Failed(Trap::OutputWriteFailed)));
    }
}
