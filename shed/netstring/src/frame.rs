/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is dual-licensed under either the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree or the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree. You may select, at your option, one of the
 * above-listed licenses.
 */

use bytes::BufMut;
use bytes::Bytes;
use bytes::BytesMut;

use crate::ascii::ascii_digits_len;
use crate::ascii::write_ascii_digits;
use crate::config::ParseConfig;
use crate::parse::parse;
use crate::parse::ParseOutcome;
use crate::source::ByteSource;
use crate::source::SliceSource;

pub(crate) const COLON: u8 = b':';
pub(crate) const COMMA: u8 = b',';

/// A single netstring payload.
///
/// Values built with [Netstring::new] or the `From` impls are not validated; values returned by
/// the parser always had a length prefix equal to the payload length.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Netstring {
    payload: Bytes,
}

impl Netstring {
    /// Wrap a payload.
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// Parse one netstring from `source`.
    pub fn parse(source: impl ByteSource, config: &ParseConfig) -> ParseOutcome {
        parse(source, config)
    }

    /// Parse one netstring from the start of `bytes` using the default config.
    pub fn parse_slice(bytes: &[u8]) -> ParseOutcome {
        parse(SliceSource::new(Bytes::copy_from_slice(bytes)), &ParseConfig::default())
    }

    /// The payload bytes.
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Consume the netstring, returning its payload.
    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// True if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Size of the wire encoding produced by [Netstring::export].
    pub fn encoded_len(&self) -> usize {
        ascii_digits_len(self.payload.len() as u64) + 1 + self.payload.len() + 1
    }

    /// Write `<len>:<payload>,` to `buf`.
    pub fn write_to(&self, buf: &mut impl BufMut) {
        write_frame(&self.payload, buf);
    }

    /// The wire encoding `<len>:<payload>,`.
    pub fn export(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.write_to(&mut buf);
        buf.freeze()
    }
}

pub(crate) fn write_frame(payload: &[u8], buf: &mut impl BufMut) {
    write_ascii_digits(payload.len() as u64, buf);
    buf.put_u8(COLON);
    buf.put_slice(payload);
    buf.put_u8(COMMA);
}

impl AsRef<[u8]> for Netstring {
    fn as_ref(&self) -> &[u8] {
        &self.payload
    }
}

impl From<Bytes> for Netstring {
    fn from(payload: Bytes) -> Self {
        Self { payload }
    }
}

impl From<Vec<u8>> for Netstring {
    fn from(payload: Vec<u8>) -> Self {
        Self::new(payload)
    }
}

impl From<&[u8]> for Netstring {
    fn from(payload: &[u8]) -> Self {
        Self::new(Bytes::copy_from_slice(payload))
    }
}

impl From<Netstring> for Bytes {
    fn from(ns: Netstring) -> Self {
        ns.payload
    }
}
