use std::fmt::{Debug, Display, Formatter};

/// A four byte SFNT table tag, such as `glyf` or `cmap`.
///
/// Tags read from font files are not validated; the table directory of a
/// damaged font may contain arbitrary bytes and we still need to be able to
/// report them in errors.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "bytemuck", derive(bytemuck_derive::Zeroable, bytemuck_derive::Pod))]
#[repr(transparent)]
pub struct Tag([u8; 4]);

impl Tag {
    /// Construct a `Tag` from raw bytes.
    pub const fn new(src: &[u8; 4]) -> Tag {
        Tag(*src)
    }

    /// Construct a `Tag` from a big-endian `u32`.
    pub const fn from_u32(src: u32) -> Self {
        Self(src.to_be_bytes())
    }

    /// Create a tag from raw big-endian bytes.
    pub const fn from_be_bytes(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// Return the memory representation of this tag.
    pub const fn to_be_bytes(self) -> [u8; 4] {
        self.0
    }

    /// Returns the tag as a big-endian `u32`.
    pub const fn to_u32(self) -> u32 {
        u32::from_be_bytes(self.0)
    }
}

impl crate::raw::Scalar for Tag {
    type Raw = [u8; 4];

    fn to_raw(self) -> Self::Raw {
        self.0
    }

    fn from_raw(raw: Self::Raw) -> Self {
        Self(raw)
    }
}

impl PartialEq<[u8; 4]> for Tag {
    fn eq(&self, other: &[u8; 4]) -> bool {
        &self.0 == other
    }
}

impl PartialEq<&str> for Tag {
    fn eq(&self, other: &&str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl AsRef<[u8]> for Tag {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

// printable ascii is written as-is, anything else as an escaped hex byte
impl Display for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for byte in self.0 {
            if (0x20..=0x7E).contains(&byte) {
                write!(f, "{}", byte as char)?;
            } else {
                write!(f, "{{0x{byte:02X}}}")?;
            }
        }
        Ok(())
    }
}

impl Debug for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Tag({self})")
    }
}

impl Default for Tag {
    fn default() -> Self {
        Tag([b' '; 4])
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Tag {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        if serializer.is_human_readable() {
            serializer.collect_str(self)
        } else {
            serde::Serialize::serialize(&self.0, serializer)
        }
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Tag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            let s = <std::borrow::Cow<'de, str> as serde::Deserialize>::deserialize(deserializer)?;
            let bytes: [u8; 4] = s
                .as_bytes()
                .try_into()
                .map_err(|_| serde::de::Error::custom("tag must be four bytes"))?;
            Ok(Tag(bytes))
        } else {
            <[u8; 4] as serde::Deserialize>::deserialize(deserializer).map(Tag)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u32_conversion() {
        let tag = Tag::new(b"glyf");
        assert_eq!(tag.to_u32(), 0x676C7966);
        assert_eq!(Tag::from_u32(0x676C7966), tag);
        assert_eq!(tag, *b"glyf");
        assert_eq!(tag, "glyf");
    }

    #[test]
    fn display() {
        let bad_tag = Tag::new(&[0x19, b'z', b'@', 0x7F]);
        assert_eq!(bad_tag.to_string(), "{0x19}z@{0x7F}");
        assert_eq!(format!("{:?}", Tag::new(b"ttcf")), "Tag(ttcf)");
    }
}
