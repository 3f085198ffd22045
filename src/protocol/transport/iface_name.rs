//! Inline storage for host interface names, sized for Linux `IFNAMSIZ`.

/// Maximum stored length of an interface name (IFNAMSIZ minus the NUL).
pub const MAX_IFACE_NAME: usize = 15;

#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Interface name held inline, without allocation. Longer names are
/// clamped on a character boundary.
pub struct IfaceName {
    len: u8,
    bytes: [u8; MAX_IFACE_NAME],
}

impl IfaceName {
    /// The empty name, usable as an array filler.
    pub const EMPTY: Self = Self {
        len: 0,
        bytes: [0; MAX_IFACE_NAME],
    };

    /// Store a name, clamping it to [`MAX_IFACE_NAME`] bytes.
    pub fn new(name: &str) -> Self {
        let mut end = name.len().min(MAX_IFACE_NAME);
        // Walk back to a character boundary so the clamp stays valid UTF-8.
        while end > 0 && !name.is_char_boundary(end) {
            end -= 1;
        }
        let mut bytes = [0; MAX_IFACE_NAME];
        bytes[..end].copy_from_slice(&name.as_bytes()[..end]);
        Self {
            len: end as u8,
            bytes,
        }
    }

    /// View over the stored name.
    #[inline]
    pub fn as_str(&self) -> &str {
        // Only `new` writes the buffer and it preserves UTF-8 validity.
        core::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or("")
    }

    /// Checks whether the name is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl From<&str> for IfaceName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl PartialEq<str> for IfaceName {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl core::fmt::Debug for IfaceName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl core::fmt::Display for IfaceName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
