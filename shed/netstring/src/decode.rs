/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is dual-licensed under either the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree or the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree. You may select, at your option, one of the
 * above-listed licenses.
 */

use bytes::Buf;
use bytes::BytesMut;
use tokio_util::codec::Decoder;
use tracing::debug;
use tracing::trace;

use crate::ascii::from_ascii_digits;
use crate::ascii::is_ascii_digit;
use crate::config::ParseConfig;
use crate::frame::Netstring;
use crate::frame::COLON;
use crate::frame::COMMA;
use crate::parse::Malformed;
use crate::parse::MAX_LENGTH_DIGITS;
use crate::Error;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum State {
    Length,
    Payload { length: usize },
    Skip { length: usize, remaining: usize },
    SkipTrailer { length: usize },
}

/// A Netstring decoder.
///
/// Applies the same grammar and [ParseConfig] as [crate::parse()], but works incrementally over
/// whatever has been buffered so far. Over-long netstrings are drained and dropped when
/// `skip_too_long` is set, otherwise they fail the stream with [Error::Rejected].
#[derive(Debug)]
pub struct NetstringDecoder {
    config: ParseConfig,
    state: State,
}

impl Default for NetstringDecoder {
    fn default() -> Self {
        Self::new(ParseConfig::default())
    }
}

impl NetstringDecoder {
    /// Create a decoder applying `config`.
    pub fn new(config: ParseConfig) -> Self {
        NetstringDecoder {
            config,
            state: State::Length,
        }
    }

    /// The config this decoder applies.
    pub fn config(&self) -> &ParseConfig {
        &self.config
    }
}

/// Consume `digit+ ':'` from the buffer once it is all there.
fn decode_length(buf: &mut BytesMut) -> Result<Option<usize>, Error> {
    let scan = buf.len().min(MAX_LENGTH_DIGITS);
    let end = buf[..scan].iter().position(|&b| !is_ascii_digit(b));
    let digits = end.unwrap_or(scan);

    if digits >= 2 && buf[0] == b'0' {
        return Err(malformed(Malformed::LeadingZero));
    }
    let idx = match end {
        Some(idx) => idx,
        None if digits == MAX_LENGTH_DIGITS => {
            return Err(malformed(Malformed::LengthTooLong));
        }
        None => return Ok(None),
    };

    let b = buf[idx];
    if b != COLON {
        return Err(malformed(Malformed::ExpectedColon { found: Some(b) }));
    }
    if idx == 0 {
        return Err(malformed(Malformed::MissingLength));
    }
    let length = from_ascii_digits(&buf[..idx])
        .and_then(|length| usize::try_from(length).ok())
        .ok_or_else(|| malformed(Malformed::InvalidLength))?;
    buf.advance(idx + 1);
    Ok(Some(length))
}

fn malformed(reason: Malformed) -> Error {
    debug!(%reason, "malformed netstring");
    Error::Malformed(reason)
}

impl Decoder for NetstringDecoder {
    type Item = Netstring;
    type Error = Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Netstring>, Error> {
        loop {
            match self.state {
                State::Length => match decode_length(buf)? {
                    None => return Ok(None),
                    Some(length) if self.config.is_too_long(length) => {
                        if !self.config.skip_too_long {
                            debug!(
                                length,
                                max_length = ?self.config.max_length,
                                "rejected over-long netstring"
                            );
                            return Err(Error::Rejected(length));
                        }
                        self.state = State::Skip {
                            length,
                            remaining: length,
                        };
                    }
                    Some(length) => self.state = State::Payload { length },
                },
                State::Payload { length } => {
                    if buf.len() <= length {
                        buf.reserve(length + 1 - buf.len());
                        return Ok(None);
                    }
                    if buf[length] != COMMA {
                        return Err(malformed(Malformed::ExpectedComma {
                            found: Some(buf[length]),
                        }));
                    }
                    let payload = buf.split_to(length).freeze();
                    buf.advance(1);
                    self.state = State::Length;

                    trace!(length, "decoded netstring");
                    return Ok(Some(Netstring::from(payload)));
                }
                State::Skip { length, remaining } => {
                    let n = remaining.min(buf.len());
                    buf.advance(n);
                    if n < remaining {
                        self.state = State::Skip {
                            length,
                            remaining: remaining - n,
                        };
                        return Ok(None);
                    }
                    self.state = State::SkipTrailer { length };
                }
                State::SkipTrailer { length } => {
                    let found = match buf.first() {
                        None => return Ok(None),
                        Some(&b) => b,
                    };
                    if found != COMMA {
                        return Err(malformed(Malformed::ExpectedComma { found: Some(found) }));
                    }
                    buf.advance(1);
                    self.state = State::Length;
                    debug!(
                        length,
                        max_length = ?self.config.max_length,
                        "skipped over-long netstring"
                    );
                }
            }
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Netstring>, Error> {
        match self.decode(buf)? {
            Some(ns) => Ok(Some(ns)),
            None if buf.is_empty() && self.state == State::Length => Ok(None),
            None => {
                debug!(
                    buffered = buf.len(),
                    state = ?self.state,
                    "stream ended inside a netstring"
                );
                Err(Error::Truncated)
            }
        }
    }
}
