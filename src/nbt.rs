use std::collections::HashMap;
use std::io::{Cursor, Read};

use ::nbt::{Error as NbtError, Value};
use byteorder::{BigEndian, ByteOrder, ReadBytesExt};
use flate2::read::{GzDecoder, ZlibDecoder};

use crate::error::{DecodeError, Result};

/// Size of the per-chunk header: 4 byte length followed by the compression byte.
const PAYLOAD_HEADER_LEN: usize = 5;

/// One node of a decoded tag tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Tag {
    End,
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    List(Vec<Tag>),
    Compound(Compound),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl Tag {
    pub const END: u8 = 0;
    pub const BYTE: u8 = 1;
    pub const SHORT: u8 = 2;
    pub const INT: u8 = 3;
    pub const LONG: u8 = 4;
    pub const FLOAT: u8 = 5;
    pub const DOUBLE: u8 = 6;
    pub const BYTE_ARRAY: u8 = 7;
    pub const STRING: u8 = 8;
    pub const LIST: u8 = 9;
    pub const COMPOUND: u8 = 10;
    pub const INT_ARRAY: u8 = 11;
    pub const LONG_ARRAY: u8 = 12;

    /// The one byte type id this tag is written with.
    pub fn id(&self) -> u8 {
        match self {
            Tag::End => Tag::END,
            Tag::Byte(_) => Tag::BYTE,
            Tag::Short(_) => Tag::SHORT,
            Tag::Int(_) => Tag::INT,
            Tag::Long(_) => Tag::LONG,
            Tag::Float(_) => Tag::FLOAT,
            Tag::Double(_) => Tag::DOUBLE,
            Tag::ByteArray(_) => Tag::BYTE_ARRAY,
            Tag::String(_) => Tag::STRING,
            Tag::List(_) => Tag::LIST,
            Tag::Compound(_) => Tag::COMPOUND,
            Tag::IntArray(_) => Tag::INT_ARRAY,
            Tag::LongArray(_) => Tag::LONG_ARRAY,
        }
    }

    /// Looks up a named child. Only compounds have children.
    pub fn get(&self, name: &str) -> Option<&Tag> {
        self.as_compound().and_then(|c| c.get(name))
    }

    pub fn as_compound(&self) -> Option<&Compound> {
        match self {
            Tag::Compound(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Tag]> {
        match self {
            Tag::List(items) => Some(items),
            _ => None,
        }
    }

    /// Any integral tag, widened.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Tag::Byte(v) => Some(v as i64),
            Tag::Short(v) => Some(v as i64),
            Tag::Int(v) => Some(v as i64),
            Tag::Long(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Tag::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_byte_array(&self) -> Option<&[i8]> {
        match self {
            Tag::ByteArray(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_int_array(&self) -> Option<&[i32]> {
        match self {
            Tag::IntArray(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_long_array(&self) -> Option<&[i64]> {
        match self {
            Tag::LongArray(v) => Some(v),
            _ => None,
        }
    }
}

/// Named children of a compound tag. Names are unique; a repeated name keeps
/// the value read last.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Compound(HashMap<String, Tag>);

impl Compound {
    pub fn get(&self, name: &str) -> Option<&Tag> {
        self.0.get(name)
    }
}

impl FromIterator<(String, Tag)> for Compound {
    fn from_iter<I: IntoIterator<Item = (String, Tag)>>(iter: I) -> Compound {
        Compound(iter.into_iter().collect())
    }
}

/// Chunk payload compression, as named by the byte after the length prefix.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Compression {
    Gzip = 1,
    Zlib = 2,
    Uncompressed = 3,
}

impl TryFrom<u8> for Compression {
    type Error = DecodeError;

    fn try_from(scheme: u8) -> Result<Compression> {
        match scheme {
            1 => Ok(Compression::Gzip),
            2 => Ok(Compression::Zlib),
            3 => Ok(Compression::Uncompressed),
            other => Err(DecodeError::UnknownCompression(other)),
        }
    }
}

/// Inflates `data` according to `scheme`.
pub fn decompress(scheme: Compression, data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    match scheme {
        Compression::Gzip => GzDecoder::new(data)
            .read_to_end(&mut out)
            .map_err(DecodeError::CorruptPayload)?,
        Compression::Zlib => ZlibDecoder::new(data)
            .read_to_end(&mut out)
            .map_err(DecodeError::CorruptPayload)?,
        Compression::Uncompressed => {
            out.extend_from_slice(data);
            data.len()
        }
    };
    Ok(out)
}

/// Decodes the bytes of one chunk slot: length prefix, compression byte and
/// compressed tree. Returns the root compound.
pub fn decode_payload(bytes: &[u8]) -> Result<Tag> {
    if bytes.len() < PAYLOAD_HEADER_LEN {
        return Err(DecodeError::corrupt("chunk header cut short"));
    }
    let length = BigEndian::read_u32(&bytes[..4]) as usize;
    let scheme = Compression::try_from(bytes[4])?;
    if length == 0 || length > bytes.len() - 4 {
        return Err(DecodeError::corrupt("chunk length does not fit its slot"));
    }
    let raw = decompress(scheme, &bytes[PAYLOAD_HEADER_LEN..4 + length])?;
    let (_, root) = read_root(&mut Cursor::new(raw))?;
    Ok(root)
}

/// Reads one named root compound from an uncompressed stream.
pub fn read_root<R: Read>(reader: &mut R) -> Result<(String, Tag)> {
    let id = reader.read_u8().map_err(|_| DecodeError::TruncatedTree)?;
    match id {
        Tag::COMPOUND => {}
        id if id > Tag::LONG_ARRAY => return Err(DecodeError::UnknownTag(id)),
        _ => return Err(DecodeError::NotCompound),
    }
    // The root name is laid out like a string payload.
    let name = match Value::from_reader(Tag::STRING, reader).map_err(tree_error)? {
        Value::String(name) => name,
        _ => return Err(DecodeError::corrupt("root name is not a string")),
    };
    let root = Value::from_reader(Tag::COMPOUND, reader).map_err(tree_error)?;
    Ok((name, Tag::from(root)))
}

fn tree_error(err: NbtError) -> DecodeError {
    match err {
        NbtError::InvalidTypeId(id) => DecodeError::UnknownTag(id),
        NbtError::IncompleteNbtValue | NbtError::IoError(_) => DecodeError::TruncatedTree,
        NbtError::NoRootCompound => DecodeError::NotCompound,
        _ => DecodeError::corrupt("malformed tag tree"),
    }
}

impl From<Value> for Tag {
    fn from(value: Value) -> Tag {
        match value {
            Value::Byte(v) => Tag::Byte(v),
            Value::Short(v) => Tag::Short(v),
            Value::Int(v) => Tag::Int(v),
            Value::Long(v) => Tag::Long(v),
            Value::Float(v) => Tag::Float(v),
            Value::Double(v) => Tag::Double(v),
            Value::ByteArray(v) => Tag::ByteArray(v),
            Value::String(s) => Tag::String(s),
            Value::List(items) => Tag::List(items.into_iter().map(Tag::from).collect()),
            Value::Compound(map) => {
                Tag::Compound(map.into_iter().map(|(k, v)| (k, Tag::from(v))).collect())
            }
            Value::IntArray(v) => Tag::IntArray(v),
            Value::LongArray(v) => Tag::LongArray(v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::{GzEncoder, ZlibEncoder};
    use std::io::Write;

    fn name(out: &mut Vec<u8>, s: &str) {
        out.extend_from_slice(&(s.len() as u16).to_be_bytes());
        out.extend_from_slice(s.as_bytes());
    }

    /// `{ "": { "Y": 4b, "Status": "full", "Data": [L; 1, -1], "List": [1, 2] } }`
    fn sample_tree() -> Vec<u8> {
        let mut out = vec![Tag::COMPOUND];
        name(&mut out, "");
        out.push(Tag::BYTE);
        name(&mut out, "Y");
        out.push(4);
        out.push(Tag::STRING);
        name(&mut out, "Status");
        name(&mut out, "full");
        out.push(Tag::LONG_ARRAY);
        name(&mut out, "Data");
        out.extend_from_slice(&2i32.to_be_bytes());
        out.extend_from_slice(&1i64.to_be_bytes());
        out.extend_from_slice(&(-1i64).to_be_bytes());
        out.push(Tag::LIST);
        name(&mut out, "List");
        out.push(Tag::INT);
        out.extend_from_slice(&2i32.to_be_bytes());
        out.extend_from_slice(&1i32.to_be_bytes());
        out.extend_from_slice(&2i32.to_be_bytes());
        out.push(Tag::END);
        out
    }

    fn framed(scheme: u8, body: &[u8]) -> Vec<u8> {
        let mut out = ((body.len() + 1) as u32).to_be_bytes().to_vec();
        out.push(scheme);
        out.extend_from_slice(body);
        out
    }

    #[test]
    fn reads_root_compound() {
        let (root_name, root) = read_root(&mut Cursor::new(sample_tree())).unwrap();
        assert_eq!(root_name, "");
        assert_eq!(root.get("Y"), Some(&Tag::Byte(4)));
        assert_eq!(root.get("Status").and_then(Tag::as_str), Some("full"));
        assert_eq!(root.get("Data").and_then(Tag::as_long_array), Some(&[1, -1][..]));
        let list = root.get("List").and_then(Tag::as_list).unwrap();
        assert_eq!(list, &[Tag::Int(1), Tag::Int(2)]);
    }

    #[test]
    fn decodes_zlib_and_gzip_payloads() {
        let mut zlib = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        zlib.write_all(&sample_tree()).unwrap();
        let zlib = framed(2, &zlib.finish().unwrap());

        let mut gzip = GzEncoder::new(Vec::new(), flate2::Compression::default());
        gzip.write_all(&sample_tree()).unwrap();
        let gzip = framed(1, &gzip.finish().unwrap());

        let a = decode_payload(&zlib).unwrap();
        let b = decode_payload(&gzip).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.get("Y").and_then(Tag::as_i64), Some(4));
    }

    #[test]
    fn accepts_uncompressed_payloads() {
        let root = decode_payload(&framed(3, &sample_tree())).unwrap();
        assert_eq!(root.id(), Tag::COMPOUND);
    }

    #[test]
    fn rejects_unknown_compression() {
        let err = decode_payload(&framed(4, &sample_tree())).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownCompression(4)));
    }

    #[test]
    fn garbage_zlib_is_corrupt() {
        let err = decode_payload(&framed(2, &[0xde, 0xad, 0xbe, 0xef])).unwrap_err();
        assert!(matches!(err, DecodeError::CorruptPayload(_)));
    }

    #[test]
    fn oversized_length_is_corrupt() {
        let mut bytes = framed(3, &sample_tree());
        bytes[..4].copy_from_slice(&10_000u32.to_be_bytes());
        let err = decode_payload(&bytes).unwrap_err();
        assert!(matches!(err, DecodeError::CorruptPayload(_)));
    }

    #[test]
    fn cut_tree_is_truncated() {
        let tree = sample_tree();
        for cut in [1, 5, 12, tree.len() - 1] {
            let err = read_root(&mut Cursor::new(&tree[..cut])).unwrap_err();
            assert!(matches!(err, DecodeError::TruncatedTree), "cut at {cut}: {err}");
        }
    }

    #[test]
    fn unknown_child_tag_is_reported() {
        let mut out = vec![Tag::COMPOUND];
        name(&mut out, "");
        out.push(42);
        name(&mut out, "x");
        out.push(Tag::END);
        let err = read_root(&mut Cursor::new(out)).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownTag(42)));
    }

    #[test]
    fn non_compound_root_is_rejected() {
        let mut out = vec![Tag::INT];
        name(&mut out, "");
        out.extend_from_slice(&7i32.to_be_bytes());
        let err = read_root(&mut Cursor::new(out)).unwrap_err();
        assert!(matches!(err, DecodeError::NotCompound));
    }

    #[test]
    fn repeated_names_keep_the_last_value() {
        let mut out = vec![Tag::COMPOUND];
        name(&mut out, "");
        for v in [1u8, 2] {
            out.push(Tag::BYTE);
            name(&mut out, "a");
            out.push(v);
        }
        out.push(Tag::END);
        let (_, root) = read_root(&mut Cursor::new(out)).unwrap();
        assert_eq!(root.get("a"), Some(&Tag::Byte(2)));
    }

    #[test]
    fn strings_are_java_modified_utf8() {
        // U+1F600 as a surrogate pair, then 'a', then NUL as C0 80
        let text = [0xED, 0xA0, 0xBD, 0xED, 0xB8, 0x80, b'a', 0xC0, 0x80];
        let mut out = vec![Tag::COMPOUND];
        name(&mut out, "");
        out.push(Tag::STRING);
        name(&mut out, "Name");
        out.extend_from_slice(&(text.len() as u16).to_be_bytes());
        out.extend_from_slice(&text);
        out.push(Tag::END);

        let (_, root) = read_root(&mut Cursor::new(out)).unwrap();
        assert_eq!(root.get("Name").and_then(Tag::as_str), Some("\u{1F600}a\0"));
    }
}
