//! Byte-level codecs for the recording container.

pub mod header;
