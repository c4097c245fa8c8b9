use thiserror::Error;

/// A failure during assembly, always anchored to a source line so the CLI
/// can report `file:line: message`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssembleError {
    #[error("{line}: missing mnemonic")]
    MissingMnemonic { line: usize },

    #[error("{line}: unknown mnemonic '{mnemonic}'")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("{line}: {mnemonic} syntax: {expected}")]
    BadSyntax {
        line: usize,
        mnemonic: String,
        expected: &'static str,
    },

    #[error("{line}: invalid register operand '{text}' (want 0..=7 or r0..=r7)")]
    BadRegister { line: usize, text: String },

    #[error("{line}: invalid immediate '{text}'")]
    BadImmediate { line: usize, text: String },

    #[error("{line}: immediate {value} exceeds 25 bits")]
    ImmediateTooLarge { line: usize, value: u32 },

    #[error("{line}: undefined label '@{name}'")]
    UndefinedLabel { line: usize, name: String },

    #[error("{line}: duplicate label '@{name}'")]
    DuplicateLabel { line: usize, name: String },
}

pub type Result<T> = std::result::Result<T, AssembleError>;
