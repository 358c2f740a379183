use std::{fmt, mem::size_of};

/// Width of every length field in the row header.
const LENGTH_FIELD_SIZE: usize = size_of::<u32>();
/// Length fields: field width, id length, username length, email length.
const ROW_HEADER_SIZE: usize = 4 * LENGTH_FIELD_SIZE;

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Row {
    pub id: u32,
    pub username: String,
    pub email: String,
}

impl Row {
    pub fn new(id: u32, username: &str, email: &str) -> Self {
        Self {
            id,
            username: String::from(username),
            email: String::from(email),
        }
    }

    pub fn serialized_size(&self) -> usize {
        ROW_HEADER_SIZE + size_of::<u32>() + self.username.len() + self.email.len()
    }

    /// Encodes the row as its length header followed by the id, username and
    /// email bytes, all little-endian and without delimiters.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.serialized_size());
        buf.extend_from_slice(&(LENGTH_FIELD_SIZE as u32).to_le_bytes());
        buf.extend_from_slice(&(size_of::<u32>() as u32).to_le_bytes());
        buf.extend_from_slice(&(self.username.len() as u32).to_le_bytes());
        buf.extend_from_slice(&(self.email.len() as u32).to_le_bytes());
        buf.extend_from_slice(&self.id.to_le_bytes());
        buf.extend_from_slice(self.username.as_bytes());
        buf.extend_from_slice(self.email.as_bytes());
        buf
    }

    /// Decodes a row from the front of `data`; trailing bytes are ignored.
    ///
    /// Returns `None` for empty input and for anything whose embedded lengths
    /// don't describe a row that fits in `data`.
    pub fn deserialize(data: &[u8]) -> Option<Self> {
        if data.is_empty() {
            return None;
        }

        let field_size = read_u32(data, 0)? as usize;
        if field_size != LENGTH_FIELD_SIZE {
            return None;
        }
        let id_size = read_u32(data, field_size)? as usize;
        let username_size = read_u32(data, 2 * field_size)? as usize;
        let email_size = read_u32(data, 3 * field_size)? as usize;
        if id_size != size_of::<u32>() {
            return None;
        }

        let id_offset = 4 * field_size;
        let username_offset = id_offset + id_size;
        let email_offset = username_offset.checked_add(username_size)?;
        let end = email_offset.checked_add(email_size)?;
        if end > data.len() {
            return None;
        }

        let id = read_u32(data, id_offset)?;
        let username = String::from_utf8(data[username_offset..email_offset].to_vec()).ok()?;
        let email = String::from_utf8(data[email_offset..end].to_vec()).ok()?;
        Some(Self {
            id,
            username,
            email,
        })
    }
}

fn read_u32(data: &[u8], pos: usize) -> Option<u32> {
    let bytes = data.get(pos..pos + size_of::<u32>())?;
    let mut buf = [0; 4];
    buf.copy_from_slice(bytes);
    Some(u32::from_le_bytes(buf))
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.id, self.username, self.email)
    }
}
