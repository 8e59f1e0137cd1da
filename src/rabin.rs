// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Implementation of the Rabin fingerprint algorithm, known in the
//! [Avro specification](https://avro.apache.org/docs/++version++/specification/#schema-fingerprints)
//! as `CRC-64-AVRO`.

use std::sync::OnceLock;

/// The seed of the fingerprint, which is also the fingerprint of the empty
/// byte string.
const EMPTY: u64 = 0xc15d213aa4d7a795;

static FP_TABLE: OnceLock<[u64; 256]> = OnceLock::new();

fn fp_table() -> &'static [u64; 256] {
    FP_TABLE.get_or_init(|| {
        let mut table = [0u64; 256];
        for (i, entry) in table.iter_mut().enumerate() {
            let mut fp = i as u64;
            for _ in 0..8 {
                fp = (fp >> 1) ^ (EMPTY & (fp & 1).wrapping_neg());
            }
            *entry = fp;
        }
        table
    })
}

/// Compute the 64-bit Rabin fingerprint of `bytes`.
///
/// Schema fingerprints are computed over the Parsing Canonical Form, see
/// [`Schema::fingerprint`](crate::schema::Schema::fingerprint).
pub fn fingerprint(bytes: &[u8]) -> u64 {
    let table = fp_table();
    let mut fp = EMPTY;
    for byte in bytes {
        fp = (fp >> 8) ^ table[((fp ^ u64::from(*byte)) & 0xff) as usize];
    }
    fp
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fingerprint_of_empty_input_is_the_seed() {
        assert_eq!(fingerprint(b""), EMPTY);
    }

    #[test]
    fn test_fingerprint_differs_by_input() {
        assert_eq!(fingerprint(b"\"int\""), fingerprint(b"\"int\""));
        assert_ne!(fingerprint(b"\"int\""), fingerprint(b"\"long\""));
    }

    #[test]
    fn test_fingerprint_is_order_sensitive() {
        assert_ne!(fingerprint(b"ab"), fingerprint(b"ba"));
    }
}
