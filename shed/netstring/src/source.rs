/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is dual-licensed under either the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree or the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree. You may select, at your option, one of the
 * above-listed licenses.
 */

//! Byte sources the parser pulls from.

use std::io;
use std::io::Read;

use bytes::Bytes;
use tracing::warn;

/// A pull-based source of bytes.
///
/// `read(n)` returns the next bytes of the stream, in order, up to `n` of them. Returning fewer
/// than `n` means the stream is exhausted: the parser never retries a short read.
pub trait ByteSource {
    /// Read up to `n` bytes.
    fn read(&mut self, n: usize) -> Bytes;
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    #[inline]
    fn read(&mut self, n: usize) -> Bytes {
        (**self).read(n)
    }
}

/// In-memory source over a byte buffer.
#[derive(Clone, Debug, Default)]
pub struct SliceSource {
    buf: Bytes,
}

impl SliceSource {
    /// Create a source which yields the bytes of `buf`.
    pub fn new(buf: impl Into<Bytes>) -> Self {
        Self { buf: buf.into() }
    }

    /// The bytes which have not been read yet.
    pub fn remaining(&self) -> &Bytes {
        &self.buf
    }

    /// Consume the source, returning the unread bytes.
    pub fn into_remaining(self) -> Bytes {
        self.buf
    }
}

impl ByteSource for SliceSource {
    fn read(&mut self, n: usize) -> Bytes {
        let n = n.min(self.buf.len());
        self.buf.split_to(n)
    }
}

/// Adapts a [std::io::Read] into a [ByteSource].
///
/// Each request is filled completely unless the reader hits end of file. An I/O error also ends
/// the stream: it is logged, kept for [IoSource::take_error], and every later read returns
/// nothing.
#[derive(Debug)]
pub struct IoSource<R> {
    inner: R,
    error: Option<io::Error>,
    failed: bool,
}

impl<R: Read> IoSource<R> {
    /// Wrap a reader.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            error: None,
            failed: false,
        }
    }

    /// Take the I/O error that ended the stream, if there was one.
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    /// Get a reference to the inner reader.
    #[inline]
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Get a mutable reference to the inner reader.
    #[inline]
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Returns the inner reader, consuming this structure.
    #[inline]
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> ByteSource for IoSource<R> {
    fn read(&mut self, n: usize) -> Bytes {
        if self.failed || n == 0 {
            return Bytes::new();
        }
        // Grow with the data actually read rather than trusting `n`, which may come from an
        // untrusted length prefix.
        let mut buf = Vec::new();
        let limit = u64::try_from(n).unwrap_or(u64::MAX);
        if let Err(err) = (&mut self.inner).take(limit).read_to_end(&mut buf) {
            warn!(error = %err, read = buf.len(), wanted = n, "netstring source read failed");
            self.failed = true;
            self.error = Some(err);
        }
        Bytes::from(buf)
    }
}

/// A [ByteSource] backed by a closure, see [from_fn].
#[derive(Clone, Debug)]
pub struct FnSource<F> {
    f: F,
}

/// Create a [ByteSource] from a closure with the same contract as [ByteSource::read].
pub fn from_fn<F>(f: F) -> FnSource<F>
where
    F: FnMut(usize) -> Vec<u8>,
{
    FnSource { f }
}

impl<F> ByteSource for FnSource<F>
where
    F: FnMut(usize) -> Vec<u8>,
{
    fn read(&mut self, n: usize) -> Bytes {
        let mut out = (self.f)(n);
        // Never hand the parser more than it asked for.
        out.truncate(n);
        Bytes::from(out)
    }
}
