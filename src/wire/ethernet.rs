use core::fmt;

/// A six-octet Ethernet II address.
#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Default)]
pub struct Address(pub [u8; 6]);

impl Address {
    /// Construct an Ethernet address from a sequence of octets, in big-endian.
    ///
    /// # Panics
    /// The function panics if `data` is not six octets long.
    pub fn from_bytes(data: &[u8]) -> Address {
        let mut bytes = [0; 6];
        bytes.copy_from_slice(data);
        Address(bytes)
    }

    /// Return an Ethernet address as a sequence of octets, in big-endian.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Query whether the address is all zeroes, meaning no address is known.
    pub fn is_unspecified(&self) -> bool {
        self.0 == [0; 6]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let bytes = self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5]
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_unspecified() {
        assert!(Address::default().is_unspecified());
        // Only the all-zero address counts, whatever the group bit says.
        assert!(!Address([b'A', b'B', b'C', b'1', b'2', b'3']).is_unspecified());
        assert!(!Address([0x52, 0x54, 0x00, 0x12, 0x34, 0x56]).is_unspecified());
    }

    #[test]
    fn test_display() {
        let addr = Address([0x78, 0x2b, 0xcb, 0xb3, 0x6d, 0x53]);
        assert_eq!(format!("{addr}"), "78:2b:cb:b3:6d:53");
    }
}
