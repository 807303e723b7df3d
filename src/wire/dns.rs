use alloc::vec::Vec;

use super::{Error, Result};

/// The longest textual domain name, without a trailing dot.
pub const DOMAIN_NAME_MAX_LEN: usize = 253;
/// The longest single label.
pub const LABEL_MAX_LEN: usize = 63;

/// A domain name in dotted text form, e.g. `lab.intra`.
pub type DomainName = heapless::String<DOMAIN_NAME_MAX_LEN>;

// Search list labels are restricted to hostname characters.
fn is_label_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'-' || c == b'_'
}

/// Decode the name area of a DNS Search List option.
///
/// The area is a concatenation of uncompressed, length-prefixed label
/// sequences, each closed by a zero-length label. Zero octets between or
/// after names are padding. Compression pointers are not allowed here, so a
/// length octet above 63 is an error like any other overrun.
pub fn parse_search_list(mut bytes: &[u8]) -> Result<Vec<DomainName>> {
    let mut names = Vec::new();
    let mut name = DomainName::new();
    let mut in_name = false;

    while let Some((&len, rest)) = bytes.split_first() {
        bytes = rest;
        let len = len as usize;

        if len == 0 {
            if in_name {
                names.push(core::mem::take(&mut name));
                in_name = false;
            }
            continue;
        }

        if len > LABEL_MAX_LEN {
            return Err(Error::InvalidDomainName);
        }
        let label = bytes.get(..len).ok_or(Error::InvalidDomainName)?;
        bytes = &bytes[len..];

        if !label.iter().copied().all(is_label_char) {
            return Err(Error::InvalidDomainName);
        }
        let label = core::str::from_utf8(label).map_err(|_| Error::InvalidDomainName)?;

        if in_name {
            name.push('.').map_err(|_| Error::InvalidDomainName)?;
        }
        name.push_str(label).map_err(|_| Error::InvalidDomainName)?;
        in_name = true;
    }

    // A name must be closed by its zero-length label before the option ends.
    if in_name || names.is_empty() {
        return Err(Error::InvalidDomainName);
    }

    Ok(names)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_single_name_with_padding() {
        let bytes = [
            0x03, b'l', b'a', b'b', 0x05, b'i', b'n', b't', b'r', b'a', 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00,
        ];
        let names = parse_search_list(&bytes).unwrap();
        assert_eq!(names.len(), 1);
        assert_eq!(names[0].as_str(), "lab.intra");
    }

    #[test]
    fn test_parse_multiple_names() {
        let bytes = [
            0x01, b'a', 0x00, 0x03, b'e', b'x', b'a', 0x03, b'o', b'r', b'g', 0x00,
        ];
        let names = parse_search_list(&bytes).unwrap();
        assert_eq!(
            names.iter().map(|n| n.as_str()).collect::<Vec<_>>(),
            ["a", "exa.org"]
        );
    }

    #[test]
    fn test_label_overrun() {
        assert_eq!(
            parse_search_list(&[0x05, b'a', b'b', 0x00]),
            Err(Error::InvalidDomainName)
        );
    }

    #[test]
    fn test_compression_pointer_rejected() {
        assert_eq!(
            parse_search_list(&[0xc0, 0x0c, 0x00]),
            Err(Error::InvalidDomainName)
        );
    }

    #[test]
    fn test_forbidden_characters() {
        assert_eq!(
            parse_search_list(&[0x03, b'a', b'.', b'b', 0x00]),
            Err(Error::InvalidDomainName)
        );
        assert_eq!(
            parse_search_list(&[0x02, b'a', 0x07, 0x00]),
            Err(Error::InvalidDomainName)
        );
    }

    #[test]
    fn test_unterminated_name() {
        assert_eq!(
            parse_search_list(&[0x03, b'l', b'a', b'b']),
            Err(Error::InvalidDomainName)
        );
    }

    #[test]
    fn test_only_padding() {
        assert_eq!(parse_search_list(&[0; 8]), Err(Error::InvalidDomainName));
    }

    #[test]
    fn test_name_too_long() {
        // Five 63-octet labels make a 319 character name.
        let mut bytes = Vec::new();
        for _ in 0..5 {
            bytes.push(63);
            bytes.extend_from_slice(&[b'x'; 63]);
        }
        bytes.push(0);
        assert_eq!(parse_search_list(&bytes), Err(Error::InvalidDomainName));

        // Four of them (255 characters with dots) are still too long; three
        // plus a 61-octet label is exactly 253.
        let mut bytes = Vec::new();
        for _ in 0..3 {
            bytes.push(63);
            bytes.extend_from_slice(&[b'x'; 63]);
        }
        bytes.push(61);
        bytes.extend_from_slice(&[b'y'; 61]);
        bytes.push(0);
        let names = parse_search_list(&bytes).unwrap();
        assert_eq!(names[0].len(), DOMAIN_NAME_MAX_LEN);
    }
}
