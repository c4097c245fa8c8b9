//! Core library for the Universal Machine: the shared instruction
//! encoding, the `.um` binary image format, the array pool, the
//! fetch/decode/execute loop, and the `--trace` protocol channel.
//!
//! `umasm` and `umdisasm` depend on this crate for [`encoding`] so the
//! three tools agree on one binary format without duplicating it.

pub mod encoding;
pub mod error;
pub mod image;
pub mod machine;
pub mod pool;
pub mod trace;

pub use error::Trap;
pub use machine::{Machine, Outcome, Registers};
