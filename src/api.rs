//! Wire-level API implementations.

pub mod openai;
