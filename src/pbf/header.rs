//! BlobHeader decoding
//!
//! The index only needs two fields of the BlobHeader message: `type`
//! (field 1, string) and `datasize` (field 3, int32). Field 2 (`indexdata`)
//! and anything unknown are skipped.

use bytes::{Buf, BufMut, Bytes};

use crate::error::{PbfError, Result};

const FIELD_TYPE: u64 = 1;
const FIELD_DATASIZE: u64 = 3;

const WIRE_VARINT: u64 = 0;
const WIRE_FIXED64: u64 = 1;
const WIRE_LENGTH_DELIMITED: u64 = 2;
const WIRE_FIXED32: u64 = 5;

/// The parts of a BlobHeader the index needs
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlobHeader {
    pub blob_type: String,
    /// `None` if the field was absent
    pub datasize: Option<i32>,
}

impl BlobHeader {
    pub fn new(blob_type: impl Into<String>, datasize: i32) -> Self {
        Self {
            blob_type: blob_type.into(),
            datasize: Some(datasize),
        }
    }

    /// Encode as a protobuf BlobHeader message
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(16 + self.blob_type.len());
        encode_varint(&mut buf, FIELD_TYPE << 3 | WIRE_LENGTH_DELIMITED);
        encode_varint(&mut buf, self.blob_type.len() as u64);
        buf.put_slice(self.blob_type.as_bytes());
        if let Some(datasize) = self.datasize {
            encode_varint(&mut buf, FIELD_DATASIZE << 3 | WIRE_VARINT);
            // int32 is sign-extended to 64 bits on the wire
            encode_varint(&mut buf, datasize as i64 as u64);
        }
        buf
    }

    /// Encode with the 4 byte big-endian length prefix used in files
    pub fn encode_with_length(&self) -> Vec<u8> {
        let message = self.encode();
        let mut framed = Vec::with_capacity(4 + message.len());
        framed.put_u32(message.len() as u32);
        framed.extend_from_slice(&message);
        framed
    }
}

/// Decodes the BlobHeader message that precedes every blob body
pub trait HeaderDecoder {
    fn decode_header(&self, data: &[u8]) -> Result<BlobHeader>;
}

/// Minimal protobuf decoder for BlobHeader
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtoHeaderDecoder;

impl HeaderDecoder for ProtoHeaderDecoder {
    fn decode_header(&self, data: &[u8]) -> Result<BlobHeader> {
        let mut buf = Bytes::copy_from_slice(data);
        let mut header = BlobHeader::default();

        while buf.has_remaining() {
            let key = decode_varint(&mut buf)?;
            let (field, wire_type) = (key >> 3, key & 0x7);
            match (field, wire_type) {
                (FIELD_TYPE, WIRE_LENGTH_DELIMITED) => {
                    let bytes = take_length_delimited(&mut buf)?;
                    header.blob_type = String::from_utf8(bytes.to_vec())
                        .map_err(|_| invalid("type is not valid UTF-8"))?;
                }
                (FIELD_DATASIZE, WIRE_VARINT) => {
                    header.datasize = Some(decode_varint(&mut buf)? as i32);
                }
                (_, WIRE_VARINT) => {
                    decode_varint(&mut buf)?;
                }
                (_, WIRE_FIXED64) => skip(&mut buf, 8)?,
                (_, WIRE_LENGTH_DELIMITED) => {
                    take_length_delimited(&mut buf)?;
                }
                (_, WIRE_FIXED32) => skip(&mut buf, 4)?,
                (_, other) => {
                    return Err(invalid(&format!("unsupported wire type {}", other)));
                }
            }
        }

        Ok(header)
    }
}

fn invalid(reason: &str) -> crate::error::OsmError {
    PbfError::InvalidHeader(reason.to_string()).into()
}

fn skip(buf: &mut Bytes, len: usize) -> Result<()> {
    if buf.remaining() < len {
        return Err(invalid("field runs past end of message"));
    }
    buf.advance(len);
    Ok(())
}

fn take_length_delimited(buf: &mut Bytes) -> Result<Bytes> {
    let len = decode_varint(buf)? as usize;
    if buf.remaining() < len {
        return Err(invalid("field runs past end of message"));
    }
    Ok(buf.split_to(len))
}

fn decode_varint(buf: &mut impl Buf) -> Result<u64> {
    let mut value: u64 = 0;
    let mut shift = 0;

    loop {
        if !buf.has_remaining() {
            return Err(invalid("truncated varint"));
        }
        let byte = buf.get_u8();
        value |= ((byte & 0x7F) as u64) << shift;

        if (byte & 0x80) == 0 {
            return Ok(value);
        }

        shift += 7;
        if shift >= 64 {
            return Err(invalid("varint too large"));
        }
    }
}

fn encode_varint(buf: &mut impl BufMut, mut value: u64) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;

        if value != 0 {
            byte |= 0x80; // Set continuation bit
        }

        buf.put_u8(byte);

        if value == 0 {
            break;
        }
    }
}
