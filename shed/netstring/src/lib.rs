/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is dual-licensed under either the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree or the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree. You may select, at your option, one of the
 * above-listed licenses.
 */

#![deny(warnings, missing_docs, clippy::all, rustdoc::broken_intra_doc_links)]

//! Incremental parser and serializer for netstrings
//!
//! [Netstring](http://cr.yp.to/proto/netstrings.txt) is an extremely simple mechanism for
//! delimiting messages in a stream.
//!
//! Each message has the form "7:message," where the initial decimal number is the size of the
//! payload, followed by a ':', then the payload, and a terminating ','. There is no error
//! checking or correction other than the requirement that the message be followed by a comma.
//!
//! [parse()] pulls one netstring at a time from any [ByteSource], reading only the bytes it needs
//! and leaving the source at a well-defined position whatever the outcome. Payloads over the
//! configured [ParseConfig::max_length] are reported as [ParseOutcome::Rejected] before they are
//! read, and can be drained without buffering them. [Netstring::export] produces the wire form.
//!
//! For `tokio_util::codec` framing, [NetstringEncoder] and [NetstringDecoder] apply the same
//! rules to a buffered stream.
//!
//! ```
//! use netstring::{parse, Netstring, ParseConfig, ParseOutcome, SliceSource};
//!
//! let mut src = SliceSource::new(&b"5:hello,3:abc,"[..]);
//! let config = ParseConfig::default().with_max_length(Some(4));
//!
//! assert_eq!(parse(&mut src, &config), ParseOutcome::Rejected(5));
//! assert_eq!(
//!     parse(&mut src, &config),
//!     ParseOutcome::Success(Netstring::from(&b"abc"[..]))
//! );
//! assert_eq!(Netstring::from(&b"abc"[..]).export(), &b"3:abc,"[..]);
//! ```

use thiserror::Error;

/// Errors that can originate from this crate
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from the underlying stream
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Error while decoding netstring
    #[error("malformed netstring: {0}")]
    Malformed(#[from] Malformed),
    /// Netstring declared a payload longer than the configured maximum
    #[error("netstring payload of {0} bytes exceeds the maximum length")]
    Rejected(usize),
    /// Stream ended in the middle of a netstring
    #[error("stream ended inside a netstring")]
    Truncated,
}

pub mod ascii;
mod config;
mod decode;
mod encode;
mod frame;
mod parse;
mod source;

pub use crate::config::ParseConfig;
pub use crate::config::DEFAULT_MAX_LENGTH;
pub use crate::decode::NetstringDecoder;
pub use crate::encode::NetstringEncoder;
pub use crate::frame::Netstring;
pub use crate::parse::parse;
pub use crate::parse::Malformed;
pub use crate::parse::ParseOutcome;
pub use crate::parse::MAX_LENGTH_DIGITS;
pub use crate::parse::SKIP_CHUNK_SIZE;
pub use crate::source::from_fn;
pub use crate::source::ByteSource;
pub use crate::source::FnSource;
pub use crate::source::IoSource;
pub use crate::source::SliceSource;
