use alloc::vec::Vec;
use bitflags::bitflags;
use byteorder::{ByteOrder, NetworkEndian};
use core::fmt;

use super::dns::{self, DomainName};
use super::{EthernetAddress, Error, Ipv6Address, Result};
use crate::time::{Duration, Timestamp};

enum_with_unknown! {
    /// NDISC Option Type
    pub enum Type(u8) {
        /// Source Link-layer Address
        SourceLinkLayerAddr = 0x01,
        /// Target Link-layer Address
        TargetLinkLayerAddr = 0x02,
        /// Prefix Information
        PrefixInformation = 0x03,
        /// MTU
        Mtu = 0x05,
        /// Recursive DNS Server
        Rdnss = 0x19,
        /// DNS Search List
        Dnssl = 0x1f,
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Type::SourceLinkLayerAddr => write!(f, "source link-layer address"),
            Type::TargetLinkLayerAddr => write!(f, "target link-layer address"),
            Type::PrefixInformation => write!(f, "prefix information"),
            Type::Mtu => write!(f, "mtu"),
            Type::Rdnss => write!(f, "rdnss"),
            Type::Dnssl => write!(f, "dnssl"),
            Type::Unknown(id) => write!(f, "{id}"),
        }
    }
}

bitflags! {
    pub struct PrefixInfoFlags: u8 {
        const ON_LINK    = 0b10000000;
        const AUTONOMOUS = 0b01000000;
    }
}

/// A read/write wrapper around a single [NDISC Option].
///
/// The buffer spans exactly one option, prefix included. Use
/// [NdiscOptionCursor] to carve options out of a datagram.
///
/// [NDISC Option]: https://tools.ietf.org/html/rfc4861#section-4.6
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct NdiscOption<T: AsRef<[u8]>> {
    buffer: T,
}

// Format of an NDISC Option
//
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |     Type      |    Length     |              ...              |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// ~                              ...                              ~
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//
// See https://tools.ietf.org/html/rfc4861#section-4.6 for details.
mod field {
    #![allow(non_snake_case)]
    #![allow(unused)]

    use crate::wire::field::*;

    // 8-bit identifier of the type of option.
    pub const TYPE: usize = 0;
    // 8-bit unsigned integer. Length of the option, in units of 8 octets.
    pub const LENGTH: usize = 1;
    // Length unit, and the minimum length of an option.
    pub const UNIT: usize = 8;
    // Variable-length field. Option-Type-specific data.
    pub const fn DATA(length: u8) -> Field {
        2..length as usize * UNIT
    }

    // Source/Target Link-layer Option fields.
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    // |     Type      |    Length     |    Link-Layer Address ...
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    pub const LL_ADDR: Field = 2..8;

    // Prefix Information Option fields.
    //  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    //  |     Type      |    Length     | Prefix Length |L|A| Reserved1 |
    //  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    //  |                         Valid Lifetime                        |
    //  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    //  |                       Preferred Lifetime                      |
    //  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    //  |                           Reserved2                           |
    //  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    //  |                                                               |
    //  +                            Prefix                             +
    //  |                                                               |
    //  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    pub const PREFIX_LEN: usize = 2;
    pub const FLAGS: usize = 3;
    pub const VALID_LT: Field = 4..8;
    pub const PREF_LT: Field = 8..12;
    pub const PREF_RESERVED: Field = 12..16;
    pub const PREFIX: Field = 16..32;

    // MTU Option fields
    //  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    //  |     Type      |    Length     |           Reserved            |
    //  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    //  |                              MTU                              |
    //  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    pub const MTU: Field = 4..8;

    // RDNSS (RFC 8106 section 5.1) and DNSSL (section 5.2) share a header.
    //  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    //  |     Type      |     Length    |           Reserved            |
    //  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    //  |                           Lifetime                            |
    //  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    //  :            Addresses of IPv6 Recursive DNS Servers            :
    //  :           or Domain Names of DNS Search List                  :
    //  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    pub const DNS_LT: Field = 4..8;
    pub const DNS_DATA: usize = 8;
}

/// Core getter methods relevant to any type of NDISC option.
impl<T: AsRef<[u8]>> NdiscOption<T> {
    /// Create a raw octet buffer with an NDISC Option structure.
    pub const fn new_unchecked(buffer: T) -> NdiscOption<T> {
        NdiscOption { buffer }
    }

    /// Shorthand for a combination of [new_unchecked] and [check_len].
    ///
    /// [new_unchecked]: #method.new_unchecked
    /// [check_len]: #method.check_len
    pub fn new_checked(buffer: T) -> Result<NdiscOption<T>> {
        let opt = Self::new_unchecked(buffer);
        opt.check_len()?;
        Ok(opt)
    }

    /// Ensure that no accessor method will panic if called.
    ///
    /// Returns `Err(Error::MalformedOption)` if the buffer is shorter than
    /// one unit, the length field is zero, or the length field points past
    /// the end of the buffer. Type-specific layout is checked by [RaOption].
    pub fn check_len(&self) -> Result<()> {
        let data = self.buffer.as_ref();
        if data.len() < field::UNIT {
            return Err(Error::MalformedOption);
        }
        let length = data[field::LENGTH];
        if length == 0 || data.len() < field::DATA(length).end {
            return Err(Error::MalformedOption);
        }
        Ok(())
    }

    /// Consume the NDISC option, returning the underlying buffer.
    pub fn into_inner(self) -> T {
        self.buffer
    }

    /// Return the option type.
    #[inline]
    pub fn option_type(&self) -> Type {
        Type::from(self.buffer.as_ref()[field::TYPE])
    }

    /// Return the length field, in units of 8 octets.
    #[inline]
    pub fn data_len(&self) -> u8 {
        self.buffer.as_ref()[field::LENGTH]
    }

    /// Return the length of the whole option in octets.
    #[inline]
    pub fn total_len(&self) -> usize {
        self.data_len() as usize * field::UNIT
    }

    /// Return the prefix length.
    #[inline]
    pub fn prefix_len(&self) -> u8 {
        self.buffer.as_ref()[field::PREFIX_LEN]
    }

    /// Return the prefix information flags.
    #[inline]
    pub fn prefix_flags(&self) -> PrefixInfoFlags {
        PrefixInfoFlags::from_bits_truncate(self.buffer.as_ref()[field::FLAGS])
    }

    /// Return the valid lifetime of the prefix.
    #[inline]
    pub fn valid_lifetime(&self) -> Lifetime {
        Lifetime::from_secs(NetworkEndian::read_u32(&self.buffer.as_ref()[field::VALID_LT]))
    }

    /// Return the preferred lifetime of the prefix.
    #[inline]
    pub fn preferred_lifetime(&self) -> Lifetime {
        Lifetime::from_secs(NetworkEndian::read_u32(&self.buffer.as_ref()[field::PREF_LT]))
    }

    /// Return the prefix.
    #[inline]
    pub fn prefix(&self) -> Ipv6Address {
        ipv6_from_bytes(&self.buffer.as_ref()[field::PREFIX])
    }

    /// Return the MTU value.
    #[inline]
    pub fn mtu(&self) -> u32 {
        NetworkEndian::read_u32(&self.buffer.as_ref()[field::MTU])
    }

    /// Return the lifetime of an RDNSS or DNSSL option.
    #[inline]
    pub fn dns_lifetime(&self) -> Lifetime {
        Lifetime::from_secs(NetworkEndian::read_u32(&self.buffer.as_ref()[field::DNS_LT]))
    }
}

impl<'a, T: AsRef<[u8]> + ?Sized> NdiscOption<&'a T> {
    /// Return the option data, everything after the type and length octets.
    #[inline]
    pub fn data(&self) -> &'a [u8] {
        let len = self.data_len();
        &self.buffer.as_ref()[field::DATA(len)]
    }

    /// Return the addresses or encoded names following an RDNSS or DNSSL
    /// lifetime.
    #[inline]
    pub fn dns_data(&self) -> &'a [u8] {
        let len = self.total_len();
        &self.buffer.as_ref()[field::DNS_DATA..len]
    }
}

/// Core setter methods relevant to any type of NDISC option.
impl<T: AsRef<[u8]> + AsMut<[u8]>> NdiscOption<T> {
    /// Set the option type.
    #[inline]
    pub fn set_option_type(&mut self, value: Type) {
        self.buffer.as_mut()[field::TYPE] = value.into();
    }

    /// Set the option data length, in units of 8 octets.
    #[inline]
    pub fn set_data_len(&mut self, value: u8) {
        self.buffer.as_mut()[field::LENGTH] = value;
    }

    /// Set the Source/Target Link-layer Address.
    #[inline]
    pub fn set_link_layer_addr(&mut self, addr: EthernetAddress) {
        self.buffer.as_mut()[field::LL_ADDR].copy_from_slice(addr.as_bytes())
    }
}

fn ipv6_from_bytes(data: &[u8]) -> Ipv6Address {
    let mut bytes = [0; 16];
    bytes.copy_from_slice(data);
    Ipv6Address::from(bytes)
}

/// A restartable cursor over the option area of a router discovery message.
///
/// Each step validates TLV framing and yields a view of exactly one option.
/// A framing error is yielded once and then the cursor stays exhausted:
/// after a bad length the position of every later option is unknown.
/// [rewind](#method.rewind) starts over from the first option.
#[derive(Debug, Clone)]
pub struct NdiscOptionCursor<'a> {
    buffer: &'a [u8],
    start: usize,
    offset: usize,
    failed: bool,
}

impl<'a> NdiscOptionCursor<'a> {
    /// Create a cursor over `buffer` whose first option begins at `start`.
    pub fn new(buffer: &'a [u8], start: usize) -> NdiscOptionCursor<'a> {
        let start = start.min(buffer.len());
        NdiscOptionCursor {
            buffer,
            start,
            offset: start,
            failed: false,
        }
    }

    /// Reset iteration to the first option.
    pub fn rewind(&mut self) {
        self.offset = self.start;
        self.failed = false;
    }

    /// Return the offset of the next option within the buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl<'a> Iterator for NdiscOptionCursor<'a> {
    type Item = Result<NdiscOption<&'a [u8]>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let rest = &self.buffer[self.offset..];
        if rest.is_empty() {
            return None;
        }

        let opt = NdiscOption::new_unchecked(rest);
        if let Err(err) = opt.check_len() {
            self.failed = true;
            return Some(Err(err));
        }

        let len = opt.total_len();
        self.offset += len;
        Some(Ok(NdiscOption::new_unchecked(&rest[..len])))
    }
}

impl core::iter::FusedIterator for NdiscOptionCursor<'_> {}

/// An advertised lifetime, as carried in prefix and DNS options.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Lifetime {
    Finite(Duration),
    Infinite,
}

impl Lifetime {
    /// The on-wire encoding of an infinite lifetime.
    pub const INFINITY: u32 = 0xffff_ffff;

    /// Decode a lifetime in seconds.
    pub const fn from_secs(secs: u32) -> Lifetime {
        if secs == Self::INFINITY {
            Lifetime::Infinite
        } else {
            Lifetime::Finite(Duration::from_secs(secs as u64))
        }
    }

    pub const fn is_infinite(&self) -> bool {
        matches!(self, Lifetime::Infinite)
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Lifetime::Finite(d) if d.is_zero())
    }

    /// The moment this lifetime runs out, counting from `received_at`.
    /// An infinite lifetime never expires.
    pub fn expiry(&self, received_at: Timestamp) -> Option<Timestamp> {
        match *self {
            Lifetime::Finite(d) => Some(received_at + d),
            Lifetime::Infinite => None,
        }
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Lifetime::Finite(d) => write!(f, "{d}"),
            Lifetime::Infinite => write!(f, "infinity"),
        }
    }
}

fn fmt_expiry(f: &mut fmt::Formatter, until: &Option<Timestamp>) -> fmt::Result {
    match until {
        Some(ts) => write!(f, " (until {})", ts.realtime),
        None => Ok(()),
    }
}

/// Whether a link-layer address option names the sender or the target.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Direction {
    Source,
    Target,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct PrefixInformation {
    /// Not validated; values above 128 are reported as received.
    pub prefix_len: u8,
    pub flags: PrefixInfoFlags,
    pub valid_lifetime: Lifetime,
    pub valid_until: Option<Timestamp>,
    pub preferred_lifetime: Lifetime,
    pub preferred_until: Option<Timestamp>,
    pub prefix: Ipv6Address,
}

impl PrefixInformation {
    pub fn parse<T: AsRef<[u8]> + ?Sized>(
        opt: &NdiscOption<&T>,
        received_at: Timestamp,
    ) -> Result<PrefixInformation> {
        if opt.total_len() != field::PREFIX.end {
            return Err(Error::MalformedOption);
        }
        let valid_lifetime = opt.valid_lifetime();
        let preferred_lifetime = opt.preferred_lifetime();
        Ok(PrefixInformation {
            prefix_len: opt.prefix_len(),
            flags: opt.prefix_flags(),
            valid_lifetime,
            valid_until: valid_lifetime.expiry(received_at),
            preferred_lifetime,
            preferred_until: preferred_lifetime.expiry(received_at),
            prefix: opt.prefix(),
        })
    }
}

/// Recursive DNS Server option contents.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Rdnss {
    pub lifetime: Lifetime,
    pub valid_until: Option<Timestamp>,
    /// Never empty.
    pub addresses: Vec<Ipv6Address>,
}

impl Rdnss {
    pub fn parse<T: AsRef<[u8]> + ?Sized>(
        opt: &NdiscOption<&T>,
        received_at: Timestamp,
    ) -> Result<Rdnss> {
        // Eight octets of header followed by at least one address.
        let len = opt.data_len();
        if len < 3 || len % 2 == 0 {
            return Err(Error::MalformedOption);
        }
        let lifetime = opt.dns_lifetime();
        let addresses = opt.dns_data().chunks_exact(16).map(ipv6_from_bytes).collect();
        Ok(Rdnss {
            lifetime,
            valid_until: lifetime.expiry(received_at),
            addresses,
        })
    }
}

/// DNS Search List option contents.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Dnssl {
    pub lifetime: Lifetime,
    pub valid_until: Option<Timestamp>,
    /// Never empty.
    pub domains: Vec<DomainName>,
}

impl Dnssl {
    /// Decode a DNSSL option.
    ///
    /// Returns `Err(Error::MalformedOption)` if the option is too short to
    /// hold a lifetime and `Err(Error::InvalidDomainName)` if the name area
    /// does not decode to at least one well-formed name.
    pub fn parse<T: AsRef<[u8]> + ?Sized>(
        opt: &NdiscOption<&T>,
        received_at: Timestamp,
    ) -> Result<Dnssl> {
        if opt.data_len() < 2 {
            return Err(Error::MalformedOption);
        }
        let lifetime = opt.dns_lifetime();
        let domains = dns::parse_search_list(opt.dns_data())?;
        Ok(Dnssl {
            lifetime,
            valid_until: lifetime.expiry(received_at),
            domains,
        })
    }
}

/// A decoded Router Advertisement option.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum RaOption<'a> {
    LinkLayerAddress {
        direction: Direction,
        /// Everything after the type and length octets, padding included.
        addr: &'a [u8],
    },
    PrefixInformation(PrefixInformation),
    Rdnss(Rdnss),
    Dnssl(Dnssl),
    /// A DNSSL option whose names could not be decoded. The rest of the
    /// advertisement is unaffected.
    InvalidDnssl {
        data: &'a [u8],
    },
    Mtu(u32),
    Unknown {
        type_: u8,
        data: &'a [u8],
    },
}

impl<'a> RaOption<'a> {
    /// Decode one option yielded by [NdiscOptionCursor].
    ///
    /// Only a layout violation is an error; it is always
    /// `Error::MalformedOption`.
    pub fn parse<T: AsRef<[u8]> + ?Sized>(
        opt: &NdiscOption<&'a T>,
        received_at: Timestamp,
    ) -> Result<RaOption<'a>> {
        match opt.option_type() {
            Type::SourceLinkLayerAddr | Type::TargetLinkLayerAddr => {
                let direction = if opt.option_type() == Type::SourceLinkLayerAddr {
                    Direction::Source
                } else {
                    Direction::Target
                };
                let addr = opt.data();
                if addr.is_empty() {
                    return Err(Error::MalformedOption);
                }
                Ok(RaOption::LinkLayerAddress { direction, addr })
            }
            Type::PrefixInformation => Ok(RaOption::PrefixInformation(PrefixInformation::parse(
                opt,
                received_at,
            )?)),
            Type::Mtu => {
                if opt.data_len() != 1 {
                    return Err(Error::MalformedOption);
                }
                Ok(RaOption::Mtu(opt.mtu()))
            }
            Type::Rdnss => Ok(RaOption::Rdnss(Rdnss::parse(opt, received_at)?)),
            Type::Dnssl => match Dnssl::parse(opt, received_at) {
                Ok(dnssl) => Ok(RaOption::Dnssl(dnssl)),
                Err(Error::InvalidDomainName) => {
                    net_debug!("ndisc: ignoring dnssl option with invalid domain name");
                    Ok(RaOption::InvalidDnssl { data: opt.data() })
                }
                Err(err) => Err(err),
            },
            Type::Unknown(type_) => Ok(RaOption::Unknown {
                type_,
                data: opt.data(),
            }),
        }
    }

    /// Return the address of a link-layer address option on an Ethernet
    /// link.
    pub fn ethernet_address(&self) -> Option<EthernetAddress> {
        match self {
            RaOption::LinkLayerAddress { addr, .. } if addr.len() == 6 => {
                Some(EthernetAddress::from_bytes(addr))
            }
            _ => None,
        }
    }
}

impl fmt::Display for RaOption<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RaOption::LinkLayerAddress { direction, addr } => {
                let kind = match direction {
                    Direction::Source => "SourceLinkLayerAddr",
                    Direction::Target => "TargetLinkLayerAddr",
                };
                write!(f, "{kind} lladdr=")?;
                match self.ethernet_address() {
                    Some(mac) => write!(f, "{mac}"),
                    None => {
                        for (i, b) in addr.iter().enumerate() {
                            if i != 0 {
                                write!(f, ":")?;
                            }
                            write!(f, "{b:02x}")?;
                        }
                        Ok(())
                    }
                }
            }
            RaOption::PrefixInformation(pi) => {
                write!(f, "PrefixInformation prefix={}/{}", pi.prefix, pi.prefix_len)?;
                if pi.flags.contains(PrefixInfoFlags::ON_LINK) {
                    write!(f, " onlink")?;
                }
                if pi.flags.contains(PrefixInfoFlags::AUTONOMOUS) {
                    write!(f, " autonomous")?;
                }
                write!(f, " valid={}", pi.valid_lifetime)?;
                fmt_expiry(f, &pi.valid_until)?;
                write!(f, " preferred={}", pi.preferred_lifetime)?;
                fmt_expiry(f, &pi.preferred_until)
            }
            RaOption::Rdnss(rdnss) => {
                write!(f, "RDNSS lifetime={}", rdnss.lifetime)?;
                fmt_expiry(f, &rdnss.valid_until)?;
                for addr in &rdnss.addresses {
                    write!(f, " {addr}")?;
                }
                Ok(())
            }
            RaOption::Dnssl(dnssl) => {
                write!(f, "DNSSL lifetime={}", dnssl.lifetime)?;
                fmt_expiry(f, &dnssl.valid_until)?;
                for domain in &dnssl.domains {
                    write!(f, " {domain}")?;
                }
                Ok(())
            }
            RaOption::InvalidDnssl { data } => {
                write!(f, "DNSSL ({}, {} octets)", Error::InvalidDomainName, data.len())
            }
            RaOption::Mtu(mtu) => write!(f, "MTU mtu={mtu}"),
            RaOption::Unknown { type_, data } => {
                write!(f, "Unknown({}) length={}", type_, data.len())
            }
        }
    }
}
