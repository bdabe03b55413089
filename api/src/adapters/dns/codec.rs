//! Minimal DNS wire format: single-question A queries and their answers

use std::net::Ipv4Addr;

use thiserror::Error;

const HEADER_LEN: usize = 12;
const TYPE_A: u16 = 1;
const CLASS_IN: u16 = 1;
const FLAG_RESPONSE: u16 = 0x8000;
const FLAG_TRUNCATED: u16 = 0x0200;
const FLAG_RECURSION_DESIRED: u16 = 0x0100;
const RCODE_MASK: u16 = 0x000F;
const MAX_LABEL_LEN: usize = 63;
/// Longest dotted name whose wire form fits in 255 bytes
const MAX_NAME_LEN: usize = 253;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    #[error("invalid domain name: {0}")]
    InvalidName(String),

    #[error("response packet is too short")]
    ShortPacket,

    #[error("response id {got} does not match query id {expected}")]
    IdMismatch { expected: u16, got: u16 },

    #[error("packet is not a response")]
    NotResponse,

    #[error("response was truncated")]
    Truncated,

    #[error("server answered with rcode {0}")]
    Rcode(u8),

    #[error("malformed name in response")]
    BadName,
}

/// Encode a recursive A query for `domain`.
pub fn encode_query(id: u16, domain: &str) -> Result<Vec<u8>, WireError> {
    let name = domain.trim_end_matches('.');
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(WireError::InvalidName(domain.to_string()));
    }

    let mut packet = Vec::with_capacity(HEADER_LEN + name.len() + 6);
    packet.extend_from_slice(&id.to_be_bytes());
    packet.extend_from_slice(&FLAG_RECURSION_DESIRED.to_be_bytes());
    // one question, no answer/authority/additional records
    packet.extend_from_slice(&1u16.to_be_bytes());
    packet.extend_from_slice(&[0; 6]);

    for label in name.split('.') {
        if label.is_empty() || label.len() > MAX_LABEL_LEN {
            return Err(WireError::InvalidName(domain.to_string()));
        }
        packet.push(label.len() as u8);
        packet.extend_from_slice(label.as_bytes());
    }
    packet.push(0);
    packet.extend_from_slice(&TYPE_A.to_be_bytes());
    packet.extend_from_slice(&CLASS_IN.to_be_bytes());

    Ok(packet)
}

/// Extract the IPv4 addresses from the answer section of a response to query `id`.
///
/// Non-A answers (CNAMEs on the way to the address) are skipped.
pub fn decode_a_records(id: u16, packet: &[u8]) -> Result<Vec<Ipv4Addr>, WireError> {
    let mut reader = Reader::new(packet);

    let got = reader.u16()?;
    if got != id {
        return Err(WireError::IdMismatch { expected: id, got });
    }

    let flags = reader.u16()?;
    if flags & FLAG_RESPONSE == 0 {
        return Err(WireError::NotResponse);
    }
    if flags & FLAG_TRUNCATED != 0 {
        return Err(WireError::Truncated);
    }
    let rcode = (flags & RCODE_MASK) as u8;
    if rcode != 0 {
        return Err(WireError::Rcode(rcode));
    }

    let questions = reader.u16()?;
    let answers = reader.u16()?;
    // authority and additional counts
    reader.take(4)?;

    for _ in 0..questions {
        reader.skip_name()?;
        reader.take(4)?;
    }

    let mut addrs = Vec::new();
    for _ in 0..answers {
        reader.skip_name()?;
        let rtype = reader.u16()?;
        let class = reader.u16()?;
        // ttl
        reader.take(4)?;
        let len = reader.u16()? as usize;
        let rdata = reader.take(len)?;

        if rtype == TYPE_A && class == CLASS_IN && len == 4 {
            addrs.push(Ipv4Addr::new(rdata[0], rdata[1], rdata[2], rdata[3]));
        }
    }

    Ok(addrs)
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], WireError> {
        let end = self.pos.checked_add(n).ok_or(WireError::ShortPacket)?;
        let slice = self.buf.get(self.pos..end).ok_or(WireError::ShortPacket)?;
        self.pos = end;
        Ok(slice)
    }

    fn u16(&mut self) -> Result<u16, WireError> {
        let bytes = self.take(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Skip a possibly compressed name. Pointers end the name, so they are not followed.
    fn skip_name(&mut self) -> Result<(), WireError> {
        loop {
            let len = self.take(1)?[0];
            match len & 0xC0 {
                0xC0 => {
                    self.take(1)?;
                    return Ok(());
                }
                0x00 if len == 0 => return Ok(()),
                0x00 => {
                    self.take(len as usize)?;
                }
                _ => return Err(WireError::BadName),
            }
        }
    }
}
