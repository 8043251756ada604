// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed-capacity newtype IDs.
//!
//! Every entity ID in this crate is a prefix (`bd-`, `col-`, ...) followed by
//! a nanoid suffix, stored inline in a 23-byte buffer so IDs are `Copy` and
//! never allocate after construction.

use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

/// Total capacity of an ID's inline buffer: enough for the longest prefix
/// used in this crate plus a 12-character nanoid suffix.
const ID_CAPACITY: usize = 23;

/// Fixed-capacity inline string buffer backing every ID newtype.
///
/// Never heap-allocates; IDs longer than [`ID_CAPACITY`] are truncated at
/// construction, which would only happen if a prefix were misconfigured.
#[derive(Clone, Copy)]
pub struct IdBuf {
    buf: [u8; ID_CAPACITY],
    len: u8,
}

impl IdBuf {
    pub fn new(prefix: &str) -> Self {
        let suffix = nanoid::nanoid!(12);
        Self::from_parts(prefix, &suffix)
    }

    fn from_parts(prefix: &str, suffix: &str) -> Self {
        let mut buf = [0u8; ID_CAPACITY];
        let mut len = 0usize;
        for part in [prefix, suffix] {
            let bytes = part.as_bytes();
            let take = bytes.len().min(ID_CAPACITY - len);
            buf[len..len + take].copy_from_slice(&bytes[..take]);
            len += take;
        }
        Self {
            buf,
            len: len as u8,
        }
    }

    pub fn from_string(s: &str) -> Self {
        let mut buf = [0u8; ID_CAPACITY];
        let bytes = s.as_bytes();
        let len = bytes.len().min(ID_CAPACITY);
        buf[..len].copy_from_slice(&bytes[..len]);
        Self {
            buf,
            len: len as u8,
        }
    }

    pub fn as_str(&self) -> &str {
        // Construction only ever copies from valid &str slices.
        std::str::from_utf8(&self.buf[..self.len as usize]).unwrap_or_default()
    }

    /// The nanoid portion after the prefix, or the whole id if no `-` is present.
    pub fn suffix(&self) -> &str {
        let s = self.as_str();
        s.split_once('-').map(|(_, suf)| suf).unwrap_or(s)
    }

    /// First 8 characters of the suffix, for compact log lines.
    pub fn short(&self) -> &str {
        let suf = self.suffix();
        &suf[..suf.len().min(8)]
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for IdBuf {
    fn default() -> Self {
        Self {
            buf: [0u8; ID_CAPACITY],
            len: 0,
        }
    }
}

impl fmt::Display for IdBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for IdBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialEq for IdBuf {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}
impl Eq for IdBuf {}

impl std::hash::Hash for IdBuf {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.as_str().hash(state)
    }
}

impl PartialEq<str> for IdBuf {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}
impl PartialEq<&str> for IdBuf {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl From<&str> for IdBuf {
    fn from(s: &str) -> Self {
        Self::from_string(s)
    }
}
impl From<String> for IdBuf {
    fn from(s: String) -> Self {
        Self::from_string(&s)
    }
}

impl AsRef<str> for IdBuf {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
impl Borrow<str> for IdBuf {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}
impl Deref for IdBuf {
    type Target = str;
    fn deref(&self) -> &str {
        self.as_str()
    }
}

impl serde::Serialize for IdBuf {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for IdBuf {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from_string(&s))
    }
}

/// Define a `Copy`, hashable, prefixed ID newtype backed by [`IdBuf`].
///
/// ```ignore
/// define_id!(BoardId, "bd-");
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident, $prefix:expr) => {
        #[derive(Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name($crate::id::IdBuf);

        impl $name {
            pub fn new() -> Self {
                Self($crate::id::IdBuf::new($prefix))
            }

            pub fn from_string(s: impl AsRef<str>) -> Self {
                Self($crate::id::IdBuf::from_string(s.as_ref()))
            }

            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }

            pub fn short(&self) -> &str {
                self.0.short()
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.0, f)
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::from_string(s)
            }
        }
        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::from_string(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.0.as_str()
            }
        }
        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                self.0.as_str()
            }
        }
        impl std::ops::Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                self.0.as_str()
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0.as_str() == other
            }
        }
    };
}

define_id!(BoardId, "bd-");
define_id!(ColumnId, "col-");
define_id!(HookId, "hk-");
define_id!(ColumnHookId, "chk-");
define_id!(TaskId, "tsk-");
define_id!(ExecutionId, "exe-");

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;