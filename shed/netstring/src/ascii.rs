/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is dual-licensed under either the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree or the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree. You may select, at your option, one of the
 * above-listed licenses.
 */

//! Conversion between non-negative integers and their minimal ASCII decimal form.

use bytes::BufMut;

const ZERO: u8 = b'0';

/// Returns true if `b` is an ASCII decimal digit.
#[inline]
pub fn is_ascii_digit(b: u8) -> bool {
    b.is_ascii_digit()
}

/// Number of decimal digits needed to write `n`.
pub fn ascii_digits_len(n: u64) -> usize {
    let mut len = 1;
    let mut rest = n / 10;
    while rest > 0 {
        len += 1;
        rest /= 10;
    }
    len
}

/// Writes `n` most significant digit first, without leading zeros.
pub fn write_ascii_digits(n: u64, buf: &mut impl BufMut) {
    // u64::MAX has 20 digits
    let mut digits = [0u8; 20];
    let mut pos = digits.len();
    let mut rest = n;
    loop {
        pos -= 1;
        digits[pos] = ZERO + (rest % 10) as u8;
        rest /= 10;
        if rest == 0 {
            break;
        }
    }
    buf.put_slice(&digits[pos..]);
}

/// Minimal ASCII decimal representation of `n`.
///
/// Negative numbers have no representation and produce an empty vector.
pub fn to_ascii_digits(n: i64) -> Vec<u8> {
    match u64::try_from(n) {
        Ok(n) => {
            let mut out = Vec::with_capacity(ascii_digits_len(n));
            write_ascii_digits(n, &mut out);
            out
        }
        Err(_) => Vec::new(),
    }
}

/// Parses a run of ASCII decimal digits.
///
/// Returns `None` for empty input, for any byte outside `'0'..='9'`, and if
/// the value does not fit in a `u64`.
pub fn from_ascii_digits(bytes: &[u8]) -> Option<u64> {
    if bytes.is_empty() {
        return None;
    }
    bytes.iter().try_fold(0u64, |acc, &b| {
        if !is_ascii_digit(b) {
            return None;
        }
        acc.checked_mul(10)?.checked_add(u64::from(b - ZERO))
    })
}
