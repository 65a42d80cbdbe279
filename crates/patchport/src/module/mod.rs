mod buffer;
mod fingerprint;

pub use buffer::*;
pub use fingerprint::Fingerprint;

#[cfg(test)]
pub(crate) use fingerprint::fake_pe;
