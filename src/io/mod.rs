//! Audio I/O modules
//!
//! Raw 16-bit PCM decoding and the streaming byte-to-peaks driver.

pub mod pcm;
pub mod stream;
