use alloc::vec::Vec;

const RA_HEADER: [u8; 16] = [
    0x86, 0x00, 0xde, 0x83, 0x40, 0xc0, 0x00, 0xb4, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

// 2001:db8:dead:beef::/64, on-link and autonomous, valid 500s, preferred 440s.
const PREFIX_INFORMATION: [u8; 32] = [
    0x03, 0x04, 0x40, 0xc0, 0x00, 0x00, 0x01, 0xf4, 0x00, 0x00, 0x01, 0xb8, 0x00, 0x00, 0x00, 0x00,
    0x20, 0x01, 0x0d, 0xb8, 0xde, 0xad, 0xbe, 0xef, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

// 2001:db8:dead:beef::1 for 60s.
const RDNSS: [u8; 24] = [
    0x19, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x3c, 0x20, 0x01, 0x0d, 0xb8, 0xde, 0xad, 0xbe, 0xef,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01,
];

// lab.intra for 60s.
const DNSSL: [u8; 24] = [
    0x1f, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x3c, 0x03, 0x6c, 0x61, 0x62, 0x05, 0x69, 0x6e, 0x74,
    0x72, 0x61, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

// Well-framed, but the search list is garbage.
const DNSSL_GARBAGE: [u8; 112] = [
    0x1f, 0x0e, 0xee, 0x68, 0xb0, 0xf4, 0x36, 0x39, 0x2c, 0xbc, 0x0b, 0xbc, 0xa9, 0x97, 0x71, 0x37,
    0xad, 0x86, 0x80, 0x14, 0x2e, 0x58, 0xaa, 0x8a, 0xb7, 0xa1, 0xbe, 0x91, 0x59, 0x00, 0xc4, 0xe8,
    0xdd, 0xd8, 0x6d, 0xe5, 0x4a, 0x7a, 0x71, 0x42, 0x74, 0x45, 0x9e, 0x2e, 0xfd, 0x9d, 0x71, 0x1d,
    0xd0, 0xc0, 0x54, 0x0c, 0x4d, 0x1f, 0xbf, 0x90, 0xd9, 0x79, 0x58, 0xc0, 0x1d, 0xa3, 0x39, 0xcf,
    0xb8, 0xec, 0xd2, 0xe4, 0xcd, 0xb6, 0x13, 0x2f, 0xc0, 0x46, 0xe8, 0x07, 0x3f, 0xaa, 0x28, 0xa5,
    0x23, 0xf1, 0xf0, 0xca, 0xd3, 0x19, 0x3f, 0xfa, 0x6c, 0x7c, 0xec, 0x1b, 0xcf, 0x71, 0xeb, 0xba,
    0x68, 0x1b, 0x8e, 0x7d, 0x93, 0x7e, 0x0b, 0x9f, 0xdb, 0x12, 0x9c, 0x75, 0x22, 0x5f, 0x12, 0x00,
];

// 78:2b:cb:b3:6d:53
const SOURCE_LLADDR: [u8; 8] = [0x01, 0x01, 0x78, 0x2b, 0xcb, 0xb3, 0x6d, 0x53];

/// A router advertisement with the given flags byte, carrying prefix
/// information, RDNSS, DNSSL and source link-layer address options.
pub(crate) fn router_advert(flags: u8) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&RA_HEADER);
    bytes[5] = flags;
    bytes.extend_from_slice(&PREFIX_INFORMATION);
    bytes.extend_from_slice(&RDNSS);
    bytes.extend_from_slice(&DNSSL);
    bytes.extend_from_slice(&SOURCE_LLADDR);
    bytes
}

/// Same as [router_advert], with a search list that does not decode.
pub(crate) fn router_advert_invalid_dnssl() -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&RA_HEADER);
    bytes[5] = 0;
    bytes.extend_from_slice(&PREFIX_INFORMATION);
    bytes.extend_from_slice(&RDNSS);
    bytes.extend_from_slice(&DNSSL_GARBAGE);
    bytes.extend_from_slice(&SOURCE_LLADDR);
    bytes
}
