/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is dual-licensed under either the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree or the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree. You may select, at your option, one of the
 * above-listed licenses.
 */

use std::marker::PhantomData;

use bytes::BytesMut;
use tokio_util::codec::Encoder;

use crate::ascii::ascii_digits_len;
use crate::frame::write_frame;
use crate::Error;

/// A Netstring encoder.
///
/// The items can be anything that can be referenced as a `[u8]`, including [crate::Netstring].
#[derive(Debug)]
pub struct NetstringEncoder<Out>
where
    Out: AsRef<[u8]>,
{
    _marker: PhantomData<Out>,
}

impl<Out> Default for NetstringEncoder<Out>
where
    Out: AsRef<[u8]>,
{
    fn default() -> Self {
        NetstringEncoder {
            _marker: PhantomData,
        }
    }
}

impl<Out> Encoder<Out> for NetstringEncoder<Out>
where
    Out: AsRef<[u8]>,
{
    type Error = Error;

    fn encode(&mut self, msg: Out, buf: &mut BytesMut) -> Result<(), Error> {
        let msg = msg.as_ref();

        // <len> ':' <payload> ','
        buf.reserve(ascii_digits_len(msg.len() as u64) + 1 + msg.len() + 1);
        write_frame(msg, buf);
        Ok(())
    }
}
