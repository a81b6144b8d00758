// Copyright 2015-2023 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! All record data structures for the DNSSEC record types

mod dnskey;
mod ds;
mod nsec;
mod nsec3;
mod rrsig;

pub use self::dnskey::DNSKEY;
pub use self::ds::DS;
pub use self::nsec::NSEC;
pub use self::nsec3::NSEC3;
pub use self::rrsig::RRSIG;

use crate::rr::RecordType;

/// Emits a type bit map field in the wire format shared by NSEC and NSEC3,
/// RFC 4034, section 4.1.2: window blocks of up to 32 bitmap octets.
pub(crate) fn emit_type_bit_maps(types: &[RecordType], buf: &mut Vec<u8>) {
    let mut codes: Vec<u16> = types.iter().map(|t| u16::from(*t)).collect();
    codes.sort_unstable();
    codes.dedup();

    let mut window: Option<(u8, [u8; 32], usize)> = None;
    for code in codes {
        let block = (code >> 8) as u8;
        let low = (code & 0xff) as u8;

        match &mut window {
            Some((current, bits, len)) if *current == block => {
                bits[usize::from(low / 8)] |= 0x80 >> (low % 8);
                *len = (*len).max(usize::from(low / 8) + 1);
            }
            _ => {
                if let Some((block, bits, len)) = window.take() {
                    buf.push(block);
                    buf.push(len as u8);
                    buf.extend_from_slice(&bits[..len]);
                }
                let mut bits = [0u8; 32];
                bits[usize::from(low / 8)] |= 0x80 >> (low % 8);
                window = Some((block, bits, usize::from(low / 8) + 1));
            }
        }
    }

    if let Some((block, bits, len)) = window {
        buf.push(block);
        buf.push(len as u8);
        buf.extend_from_slice(&bits[..len]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_bit_maps_wire_form() {
        // the RFC 4034 section 4.3 example bitmap: A MX RRSIG NSEC TYPE1234
        let mut buf = Vec::new();
        emit_type_bit_maps(
            &[
                RecordType::A,
                RecordType::MX,
                RecordType::RRSIG,
                RecordType::NSEC,
                RecordType::Unknown(1234),
            ],
            &mut buf,
        );

        let expected: &[u8] = &[
            0x00, 0x06, 0x40, 0x01, 0x00, 0x00, 0x00, 0x03, // window 0
            0x04, 0x1b, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x20, // window 4
        ];
        assert_eq!(buf, expected);
    }
}
