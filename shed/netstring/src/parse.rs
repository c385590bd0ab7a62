/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is dual-licensed under either the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree or the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree. You may select, at your option, one of the
 * above-listed licenses.
 */

//! Pull parser driving a [ByteSource] through `digits ':' payload ','`.
//!
//! The parser reads one byte at a time through the length prefix and then exactly as many bytes
//! as the prefix declares, so after every outcome the source is left at a known position:
//!
//! * [ParseOutcome::Success]: just after the trailing `','`.
//! * [ParseOutcome::Rejected] with `skip_too_long`: just after the trailing `','`.
//! * [ParseOutcome::Rejected] without `skip_too_long`: just after the `':'`.

use tracing::debug;
use tracing::trace;

use crate::ascii::from_ascii_digits;
use crate::ascii::is_ascii_digit;
use crate::config::ParseConfig;
use crate::frame::Netstring;
use crate::frame::COLON;
use crate::frame::COMMA;
use crate::source::ByteSource;
use crate::Error;

/// Length prefixes may have at most this many digits minus one. Reaching it is a failure, so the
/// parser never reads more than this many bytes looking for the `':'`.
pub const MAX_LENGTH_DIGITS: usize = 9;

/// Largest read issued while discarding an over-long payload.
pub const SKIP_CHUNK_SIZE: usize = 1024;

/// Why a netstring failed to parse.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Malformed {
    /// The `':'` was not preceded by any digits.
    #[error("missing length prefix")]
    MissingLength,
    /// The length prefix reached [MAX_LENGTH_DIGITS] digits.
    #[error("length prefix has {} or more digits", MAX_LENGTH_DIGITS)]
    LengthTooLong,
    /// A multi-digit length prefix started with `'0'`.
    #[error("length prefix has a leading zero")]
    LeadingZero,
    /// The length prefix could not be decoded.
    #[error("invalid length prefix")]
    InvalidLength,
    /// The length prefix was not terminated by `':'`.
    #[error("expected ':' after length prefix, found {}", describe(.found))]
    ExpectedColon {
        /// The terminating byte, or `None` at end of stream.
        found: Option<u8>,
    },
    /// The payload was not followed by `','`.
    #[error("expected ',' after payload, found {}", describe(.found))]
    ExpectedComma {
        /// The byte after the payload, or `None` at end of stream.
        found: Option<u8>,
    },
    /// The stream ended inside the payload.
    #[error("payload truncated: expected {expected} bytes, got {actual}")]
    TruncatedPayload {
        /// Declared payload length.
        expected: usize,
        /// Bytes available before end of stream.
        actual: usize,
    },
}

fn describe(found: &Option<u8>) -> String {
    match found {
        Some(b) => format!("{:?}", char::from(*b)),
        None => "end of stream".to_string(),
    }
}

/// Result of parsing one netstring.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParseOutcome {
    /// A complete, well-formed netstring.
    Success(Netstring),
    /// Malformed input or premature end of stream.
    Failure(Malformed),
    /// Well-formed prefix declaring a payload longer than the configured maximum.
    Rejected(usize),
}

impl ParseOutcome {
    /// True for [ParseOutcome::Success].
    pub fn is_success(&self) -> bool {
        matches!(self, ParseOutcome::Success(_))
    }

    /// True for [ParseOutcome::Failure].
    pub fn is_failure(&self) -> bool {
        matches!(self, ParseOutcome::Failure(_))
    }

    /// True for [ParseOutcome::Rejected].
    pub fn is_rejected(&self) -> bool {
        matches!(self, ParseOutcome::Rejected(_))
    }

    /// The parsed netstring, if there is one.
    pub fn success(self) -> Option<Netstring> {
        match self {
            ParseOutcome::Success(ns) => Some(ns),
            _ => None,
        }
    }

    /// Convert into a `Result`, treating rejection as an error.
    pub fn into_result(self) -> Result<Netstring, Error> {
        match self {
            ParseOutcome::Success(ns) => Ok(ns),
            ParseOutcome::Failure(reason) => Err(Error::Malformed(reason)),
            ParseOutcome::Rejected(length) => Err(Error::Rejected(length)),
        }
    }
}

/// Parse one netstring from `source`.
///
/// No state is kept between calls: parsing a stream of netstrings is a matter of calling this
/// repeatedly on the same source.
pub fn parse(mut source: impl ByteSource, config: &ParseConfig) -> ParseOutcome {
    match parse_frame(&mut source, config) {
        Ok(outcome) => outcome,
        Err(reason) => {
            debug!(%reason, "malformed netstring");
            ParseOutcome::Failure(reason)
        }
    }
}

fn parse_frame(
    source: &mut impl ByteSource,
    config: &ParseConfig,
) -> Result<ParseOutcome, Malformed> {
    let length = read_length(source)?;

    if config.is_too_long(length) {
        if config.skip_too_long {
            skip_payload(source, length)?;
        }
        debug!(
            length,
            max_length = ?config.max_length,
            skipped = config.skip_too_long,
            "rejected over-long netstring"
        );
        return Ok(ParseOutcome::Rejected(length));
    }

    let payload = source.read(length);
    if payload.len() != length {
        return Err(Malformed::TruncatedPayload {
            expected: length,
            actual: payload.len(),
        });
    }
    expect_comma(source)?;

    trace!(length, "parsed netstring");
    Ok(ParseOutcome::Success(Netstring::from(payload)))
}

/// Read a single byte, or `None` if the source is exhausted.
fn read_byte(source: &mut impl ByteSource) -> Option<u8> {
    let next = source.read(1);
    if next.len() == 1 {
        Some(next[0])
    } else {
        None
    }
}

/// Read `digit+ ':'` and return the declared length.
fn read_length(source: &mut impl ByteSource) -> Result<usize, Malformed> {
    let mut digits = [0u8; MAX_LENGTH_DIGITS];
    let mut count = 0;

    let terminator = loop {
        match read_byte(source) {
            Some(b) if is_ascii_digit(b) => {
                if count == 1 && digits[0] == b'0' {
                    return Err(Malformed::LeadingZero);
                }
                digits[count] = b;
                count += 1;
                if count == MAX_LENGTH_DIGITS {
                    return Err(Malformed::LengthTooLong);
                }
            }
            other => break other,
        }
    };

    if terminator != Some(COLON) {
        return Err(Malformed::ExpectedColon { found: terminator });
    }
    if count == 0 {
        return Err(Malformed::MissingLength);
    }

    let length = from_ascii_digits(&digits[..count]).ok_or(Malformed::InvalidLength)?;
    usize::try_from(length).map_err(|_| Malformed::InvalidLength)
}

fn expect_comma(source: &mut impl ByteSource) -> Result<(), Malformed> {
    match read_byte(source) {
        Some(COMMA) => Ok(()),
        found => Err(Malformed::ExpectedComma { found }),
    }
}

/// Discard `length` payload bytes and the trailing `','` without buffering the payload.
fn skip_payload(source: &mut impl ByteSource, length: usize) -> Result<(), Malformed> {
    let mut remaining = length;
    while remaining > 0 {
        let want = remaining.min(SKIP_CHUNK_SIZE);
        let got = source.read(want).len();
        if got != want {
            return Err(Malformed::TruncatedPayload {
                expected: length,
                actual: length - remaining + got,
            });
        }
        remaining -= want;
    }
    expect_comma(source)
}

#[cfg(test)]
mod test {
    use std::cell::Cell;
    use std::io::Cursor;

    use assert_matches::assert_matches;
    use bytes::Bytes;

    use super::*;
    use crate::source::from_fn;
    use crate::source::IoSource;
    use crate::source::SliceSource;

    fn parse_bytes(input: &'static [u8], config: &ParseConfig) -> (ParseOutcome, Bytes) {
        let mut src = SliceSource::new(input);
        let outcome = parse(&mut src, config);
        (outcome, src.into_remaining())
    }

    fn parse_default(input: &'static [u8]) -> ParseOutcome {
        parse_bytes(input, &ParseConfig::default()).0
    }

    #[test]
    fn valid_empty() {
        assert_eq!(
            parse_default(b"0:,"),
            ParseOutcome::Success(Netstring::new(Bytes::new()))
        );
    }

    #[test]
    fn successful_read() {
        assert_eq!(
            parse_default(b"3:abc,"),
            ParseOutcome::Success(Netstring::from(&b"abc"[..]))
        );
    }

    #[test]
    fn only_number() {
        assert_eq!(
            parse_default(b"4"),
            ParseOutcome::Failure(Malformed::ExpectedColon { found: None })
        );
    }

    #[test]
    fn number_colon() {
        assert_eq!(
            parse_default(b"2:"),
            ParseOutcome::Failure(Malformed::TruncatedPayload {
                expected: 2,
                actual: 0
            })
        );
    }

    #[test]
    fn missing_colon() {
        assert_eq!(
            parse_default(b"1a"),
            ParseOutcome::Failure(Malformed::ExpectedColon { found: Some(b'a') })
        );
    }

    #[test]
    fn end_before_comma() {
        assert_eq!(
            parse_default(b"1:a"),
            ParseOutcome::Failure(Malformed::ExpectedComma { found: None })
        );
    }

    #[test]
    fn missing_comma() {
        assert_eq!(
            parse_default(b"1:ab"),
            ParseOutcome::Failure(Malformed::ExpectedComma { found: Some(b'b') })
        );
    }

    #[test]
    fn empty_input() {
        assert_matches!(
            parse_default(b""),
            ParseOutcome::Failure(Malformed::ExpectedColon { found: None })
        );
    }

    #[test]
    fn missing_length() {
        assert_eq!(
            parse_default(b":abc,"),
            ParseOutcome::Failure(Malformed::MissingLength)
        );
    }

    #[test]
    fn sign_is_not_a_digit() {
        assert_matches!(
            parse_default(b"-1:a,"),
            ParseOutcome::Failure(Malformed::ExpectedColon { found: Some(b'-') })
        );
        assert_matches!(
            parse_default(b"+1:a,"),
            ParseOutcome::Failure(Malformed::ExpectedColon { found: Some(b'+') })
        );
    }

    #[test]
    fn leading_zero() {
        let (outcome, rest) = parse_bytes(b"007:abc,", &ParseConfig::default());
        assert_eq!(outcome, ParseOutcome::Failure(Malformed::LeadingZero));
        // Stops at the second digit.
        assert_eq!(rest, b"7:abc,"[..]);

        assert_matches!(
            parse_default(b"01:a,"),
            ParseOutcome::Failure(Malformed::LeadingZero)
        );
    }

    #[test]
    fn no_extra_read_with_zero() {
        let (outcome, rest) = parse_bytes(b"0:,Z", &ParseConfig::default());
        assert_matches!(outcome, ParseOutcome::Success(ref ns) if ns.is_empty());
        assert_eq!(rest, b"Z"[..]);
    }

    #[test]
    fn no_extra_read_with_nonzero() {
        let (outcome, rest) = parse_bytes(b"11:Hello world,Z", &ParseConfig::default());
        assert_eq!(
            outcome,
            ParseOutcome::Success(Netstring::from(&b"Hello world"[..]))
        );
        assert_eq!(rest, b"Z"[..]);
    }

    #[test]
    fn max_length_over_length() {
        let config = ParseConfig::default().with_max_length(Some(20));
        let (outcome, rest) = parse_bytes(b"11:Hello world,Z", &config);
        assert!(outcome.is_success());
        assert_eq!(rest, b"Z"[..]);
    }

    #[test]
    fn max_length_equal_to_length() {
        let config = ParseConfig::default().with_max_length(Some(11));
        let (outcome, rest) = parse_bytes(b"11:Hello world,Z", &config);
        assert_eq!(
            outcome.success().map(Netstring::into_payload),
            Some(Bytes::from_static(b"Hello world"))
        );
        assert_eq!(rest, b"Z"[..]);
    }

    #[test]
    fn max_length_under_length_no_skip() {
        let config = ParseConfig::default()
            .with_max_length(Some(10))
            .with_skip_too_long(false);
        let (outcome, rest) = parse_bytes(b"11:Hello world,Z", &config);
        assert_eq!(outcome, ParseOutcome::Rejected(11));
        assert_eq!(rest, b"Hello world,Z"[..]);
    }

    #[test]
    fn max_length_under_length_skip() {
        let config = ParseConfig::default().with_max_length(Some(10));
        let (outcome, rest) = parse_bytes(b"11:Hello world,Z", &config);
        assert_eq!(outcome, ParseOutcome::Rejected(11));
        assert_eq!(rest, b"Z"[..]);
    }

    #[test]
    fn max_length_under_length_skip_bad_content() {
        let config = ParseConfig::default().with_max_length(Some(3));
        let (outcome, rest) = parse_bytes(b"5:Hello world,Z", &config);
        assert_eq!(
            outcome,
            ParseOutcome::Failure(Malformed::ExpectedComma { found: Some(b' ') })
        );
        assert_eq!(rest, b"world,Z"[..]);
    }

    #[test]
    fn skip_truncated() {
        let config = ParseConfig::default().with_max_length(Some(3));
        let (outcome, rest) = parse_bytes(b"11:Hello", &config);
        assert_eq!(
            outcome,
            ParseOutcome::Failure(Malformed::TruncatedPayload {
                expected: 11,
                actual: 5
            })
        );
        assert!(rest.is_empty());
    }

    #[test]
    fn skip_uses_bounded_chunks() {
        let payload = vec![b'x'; 3000];
        let wire = Netstring::from(payload).export();
        let mut inner = SliceSource::new([&wire[..], &b"Z"[..]].concat());

        let requests = Cell::new(Vec::new());
        let outcome = {
            let src = from_fn(|n| {
                let mut seen = requests.take();
                seen.push(n);
                requests.set(seen);
                inner.read(n).to_vec()
            });
            parse(src, &ParseConfig::default().with_max_length(Some(100)))
        };

        assert_eq!(outcome, ParseOutcome::Rejected(3000));
        assert_eq!(inner.remaining(), &b"Z"[..]);

        let requests = requests.take();
        let chunks: Vec<usize> = requests.into_iter().filter(|n| *n > 1).collect();
        assert_eq!(chunks, vec![1024, 1024, 952]);
    }

    #[test]
    fn too_long_length_prefix() {
        let mut inner = SliceSource::new(&b"1000000000:Hello world,Z"[..]);
        let mut position = 0;
        let outcome = parse(
            from_fn(|n| {
                position += n;
                inner.read(n).to_vec()
            }),
            &ParseConfig::unbounded(),
        );
        assert_eq!(outcome, ParseOutcome::Failure(Malformed::LengthTooLong));
        // Nothing beyond the ninth digit was requested, so the colon was never reached.
        assert_eq!(position, MAX_LENGTH_DIGITS);
        assert_eq!(inner.remaining(), &b"0:Hello world,Z"[..]);
    }

    #[test]
    fn longest_accepted_prefix() {
        // Eight digits is the longest prefix; the stream then ends inside the payload.
        let (outcome, _) = parse_bytes(b"99999999:abc", &ParseConfig::unbounded());
        assert_eq!(
            outcome,
            ParseOutcome::Failure(Malformed::TruncatedPayload {
                expected: 99_999_999,
                actual: 3
            })
        );
    }

    #[test]
    fn sequential_frames() {
        let mut src = SliceSource::new(&b"3:abc,0:,11:Hello world,2:hi,"[..]);
        let config = ParseConfig::default().with_max_length(Some(5));

        assert_matches!(
            parse(&mut src, &config),
            ParseOutcome::Success(ref ns) if ns.as_ref() == b"abc"
        );
        assert_matches!(
            parse(&mut src, &config),
            ParseOutcome::Success(ref ns) if ns.is_empty()
        );
        assert_matches!(parse(&mut src, &config), ParseOutcome::Rejected(11));
        assert_matches!(
            parse(&mut src, &config),
            ParseOutcome::Success(ref ns) if ns.as_ref() == b"hi"
        );
        assert_matches!(
            parse(&mut src, &config),
            ParseOutcome::Failure(Malformed::ExpectedColon { found: None })
        );
    }

    #[test]
    fn from_io_reader() {
        let mut src = IoSource::new(Cursor::new(b"5:hello,5:world,".to_vec()));
        let config = ParseConfig::default();
        let first = parse(&mut src, &config).into_result().expect("first frame");
        let second = parse(&mut src, &config).into_result().expect("second frame");
        assert_eq!(first.payload(), &b"hello"[..]);
        assert_eq!(second.payload(), &b"world"[..]);
    }

    #[test]
    fn into_result() {
        assert_matches!(
            parse_default(b"1:ab").into_result(),
            Err(Error::Malformed(Malformed::ExpectedComma { .. }))
        );
        let config = ParseConfig::default().with_max_length(Some(1));
        assert_matches!(
            parse_bytes(b"2:ab,", &config).0.into_result(),
            Err(Error::Rejected(2))
        );
    }

    #[test]
    fn outcome_predicates() {
        let failure = parse_default(b"x");
        assert!(failure.is_failure());
        assert!(!failure.is_success());
        assert!(!failure.is_rejected());
        assert_eq!(failure.success(), None);

        let config = ParseConfig::default().with_max_length(Some(0));
        assert!(parse_bytes(b"1:a,", &config).0.is_rejected());
    }

    #[test]
    fn malformed_display() {
        assert_eq!(
            Malformed::ExpectedColon { found: Some(b'a') }.to_string(),
            "expected ':' after length prefix, found 'a'"
        );
        assert_eq!(
            Malformed::ExpectedComma { found: None }.to_string(),
            "expected ',' after payload, found end of stream"
        );
        assert_eq!(
            Malformed::LengthTooLong.to_string(),
            "length prefix has 9 or more digits"
        );
    }
}
