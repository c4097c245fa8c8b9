use thiserror::Error;

/// A trap terminates the machine's `Run` state and transitions it to
/// `Failed`. Every variant corresponds to one of the conditions in
/// `spec.md` §4.4; the `Display` text is the short identifier printed to
/// stderr as `fail: <identifier>`.
#[derive(Error, Clone, Copy, Eq, PartialEq, Debug)]
pub enum Trap {
    #[error("PC out of bounds")]
    PcOutOfBounds,

    #[error("index: inactive array")]
    IndexInactiveArray,

    #[error("index: offset OOB")]
    IndexOffsetOob,

    #[error("update: inactive array")]
    UpdateInactiveArray,

    #[error("update: offset OOB")]
    UpdateOffsetOob,

    #[error("divide by zero")]
    DivideByZero,

    #[error("alloc: id 0 reserved")]
    AllocIdZeroReserved,

    #[error("alloc: out of memory")]
    AllocOutOfMemory,

    #[error("dealloc: invalid or inactive id")]
    DeallocInvalidId,

    #[error("output: value > 255")]
    OutputOutOfRange,

    #[error("output: write failed")]
    OutputWriteFailed,

    #[error("loadprog: inactive id")]
    LoadProgInactiveId,

    #[error("invalid opcode")]
    InvalidOpcode,
}
