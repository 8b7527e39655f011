//! Serial transport seam.
//!
//! This module defines:
//! - `SerialLink` / `LinkOpener` traits - Interface for line-oriented serial links
//! - `LinkError` enum - Transport and protocol errors
//! - `LineLink` - Newline framing over any bounded byte stream (`LineStream`)
//! - `protocol` - Encoding of angle commands and decoding of distance readings

pub mod line;
pub mod link;
pub mod protocol;

pub use line::{LineLink, LineStream};
pub use link::{LinkError, LinkOpener, SerialLink, SerialSettings};
