//! Two-pass assembler: textual Universal Machine source to packed 32-bit
//! instruction words. Pass one walks the source counting instruction words
//! to resolve label PCs; pass two re-scans and emits one word per
//! instruction line, now able to resolve `@label` forward references.

pub mod error;

use error::{AssembleError, Result};
use std::collections::HashMap;
use um::encoding::{encode_abc, encode_loadimm, Opcode};

fn is_label_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '.' | '-')
}

fn strip_comment(line: &str) -> &str {
    match line.find(";;") {
        Some(idx) => &line[..idx],
        None => line,
    }
}

/// `label @name` recognized with whitespace-delimited keyword and sigil,
/// matching the reference scanner exactly.
fn parse_label_line(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("label")?;
    let rest = rest.strip_prefix(char::is_whitespace)?;
    let rest = rest.trim_start();
    let name = rest.strip_prefix('@')?;
    if name.is_empty() || !name.chars().all(is_label_char) {
        None
    } else {
        Some(name)
    }
}

fn tokenize(line: &str) -> Vec<&str> {
    line.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .collect()
}

fn parse_register(line: usize, text: &str) -> Result<u8> {
    let digits = text
        .strip_prefix('r')
        .or_else(|| text.strip_prefix('R'))
        .unwrap_or(text);
    let value: u32 = digits
        .parse()
        .map_err(|_| AssembleError::BadRegister {
            line,
            text: text.to_string(),
        })?;
    if value > 7 {
        return Err(AssembleError::BadRegister {
            line,
            text: text.to_string(),
        });
    }
    Ok(value as u8)
}

fn parse_char_literal(line: usize, text: &str) -> Result<u32> {
    let bad = || AssembleError::BadImmediate {
        line,
        text: text.to_string(),
    };
    let inner = text
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .ok_or_else(bad)?;
    let mut chars = inner.chars();
    let value = match chars.next().ok_or_else(bad)? {
        '\\' => match chars.next().ok_or_else(bad)? {
            'n' => b'\n' as u32,
            't' => b'\t' as u32,
            'r' => b'\r' as u32,
            '0' => 0,
            '\\' => b'\\' as u32,
            '\'' => b'\'' as u32,
            'x' => {
                let hex: String = chars.by_ref().collect();
                u32::from_str_radix(&hex, 16).map_err(|_| bad())?
            }
            _ => return Err(bad()),
        },
        c if chars.next().is_none() => c as u32,
        _ => return Err(bad()),
    };
    Ok(value)
}

fn parse_immediate(line: usize, text: &str, labels: &HashMap<String, u32>) -> Result<u32> {
    if let Some(name) = text.strip_prefix('@') {
        return labels
            .get(name)
            .copied()
            .ok_or_else(|| AssembleError::UndefinedLabel {
                line,
                name: name.to_string(),
            });
    }
    if text.starts_with('\'') {
        return parse_char_literal(line, text);
    }
    let bad = || AssembleError::BadImmediate {
        line,
        text: text.to_string(),
    };
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return u32::from_str_radix(hex, 16).map_err(|_| bad());
    }
    text.parse::<u32>().map_err(|_| bad())
}

struct Operands<'a> {
    line: usize,
    mnemonic: &'a str,
    tokens: &'a [&'a str],
}

impl<'a> Operands<'a> {
    fn expect(&self, n: usize, syntax: &'static str) -> Result<()> {
        if self.tokens.len() != n {
            return Err(AssembleError::BadSyntax {
                line: self.line,
                mnemonic: self.mnemonic.to_string(),
                expected: syntax,
            });
        }
        Ok(())
    }

    fn reg(&self, i: usize) -> Result<u8> {
        parse_register(self.line, self.tokens[i])
    }
}

fn assemble_line(
    line: usize,
    mnemonic: &str,
    tokens: &[&str],
    labels: &HashMap<String, u32>,
) -> Result<u32> {
    let ops = Operands {
        line,
        mnemonic,
        tokens,
    };
    let abc = |op: Opcode, a: u8, b: u8, c: u8| Ok(encode_abc(op, a, b, c));
    match mnemonic {
        "cmov" => {
            ops.expect(3, "cmov A B C")?;
            abc(Opcode::ConditionalMove, ops.reg(0)?, ops.reg(1)?, ops.reg(2)?)
        }
        "aidx" => {
            ops.expect(3, "aidx A B C")?;
            abc(Opcode::ArrayIndex, ops.reg(0)?, ops.reg(1)?, ops.reg(2)?)
        }
        "aupd" => {
            ops.expect(3, "aupd A B C")?;
            abc(Opcode::ArrayAmend, ops.reg(0)?, ops.reg(1)?, ops.reg(2)?)
        }
        "add" => {
            ops.expect(3, "add A B C")?;
            abc(Opcode::Addition, ops.reg(0)?, ops.reg(1)?, ops.reg(2)?)
        }
        "mul" => {
            ops.expect(3, "mul A B C")?;
            abc(Opcode::Multiplication, ops.reg(0)?, ops.reg(1)?, ops.reg(2)?)
        }
        "div" => {
            ops.expect(3, "div A B C")?;
            abc(Opcode::Division, ops.reg(0)?, ops.reg(1)?, ops.reg(2)?)
        }
        "nand" => {
            ops.expect(3, "nand A B C")?;
            abc(Opcode::NotAnd, ops.reg(0)?, ops.reg(1)?, ops.reg(2)?)
        }
        "halt" => {
            ops.expect(0, "halt")?;
            abc(Opcode::Halt, 0, 0, 0)
        }
        "alloc" => {
            ops.expect(2, "alloc B C")?;
            abc(Opcode::Allocation, 0, ops.reg(0)?, ops.reg(1)?)
        }
        "dealloc" => {
            ops.expect(1, "dealloc C")?;
            abc(Opcode::Abandonment, 0, 0, ops.reg(0)?)
        }
        "out" => {
            ops.expect(1, "out C")?;
            abc(Opcode::Output, 0, 0, ops.reg(0)?)
        }
        "in" => {
            ops.expect(1, "in C")?;
            abc(Opcode::Input, 0, 0, ops.reg(0)?)
        }
        "loadprog" => {
            ops.expect(2, "loadprog B C")?;
            abc(Opcode::LoadProgram, 0, ops.reg(0)?, ops.reg(1)?)
        }
        "loadimm" => {
            ops.expect(2, "loadimm A IMM")?;
            let a = ops.reg(0)?;
            let imm = parse_immediate(line, tokens[1], labels)?;
            encode_loadimm(a, imm).map_err(|_| AssembleError::ImmediateTooLarge {
                line,
                value: imm,
            })
        }
        other => Err(AssembleError::UnknownMnemonic {
            line,
            mnemonic: other.to_string(),
        }),
    }
}

/// Assembles `source` into a sequence of big-endian-ready words, ready for
/// [`um::image::write`].
pub fn assemble(source: &str) -> Result<Vec<u32>> {
    let mut labels = HashMap::new();
    let mut pc: u32 = 0;
    for (lineno, raw_line) in source.lines().enumerate() {
        let lineno = lineno + 1;
        let line = strip_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }
        if let Some(name) = parse_label_line(line) {
            if labels.contains_key(name) {
                return Err(AssembleError::DuplicateLabel {
                    line: lineno,
                    name: name.to_string(),
                });
            }
            labels.insert(name.to_string(), pc);
            continue;
        }
        pc += 1;
    }

    let mut words = Vec::with_capacity(pc as usize);
    for (lineno, raw_line) in source.lines().enumerate() {
        let lineno = lineno + 1;
        let line = strip_comment(raw_line).trim();
        if line.is_empty() || parse_label_line(line).is_some() {
            continue;
        }
        let tokens = tokenize(line);
        let mnemonic = tokens
            .first()
            .ok_or(AssembleError::MissingMnemonic { line: lineno })?;
        let word = assemble_line(lineno, mnemonic, &tokens[1..], &labels)?;
        words.push(word);
    }
    log::debug!("assembled {} words, {} labels", words.len(), labels.len());
    Ok(words)
}
