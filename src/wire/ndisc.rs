// See https://tools.ietf.org/html/rfc4861 for the Neighbor Discovery
// specification, and https://tools.ietf.org/html/rfc4191 for router
// preferences.

use alloc::vec::Vec;
use bitflags::bitflags;
use byteorder::{ByteOrder, NetworkEndian};
use core::fmt;

use super::ndiscoption::{NdiscOption, NdiscOptionCursor, RaOption, Type as OptionType};
use super::{EthernetAddress, Error, Ipv6Address, Result};
use crate::time::{Clock, Duration, Instant, Timestamp};

enum_with_unknown! {
    /// ICMPv6 message types used by router discovery.
    pub enum Message(u8) {
        /// Router Solicitation
        RouterSolicit = 0x85,
        /// Router Advertisement
        RouterAdvert = 0x86,
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Message::RouterSolicit => write!(f, "router solicitation"),
            Message::RouterAdvert => write!(f, "router advertisement"),
            Message::Unknown(id) => write!(f, "{id}"),
        }
    }
}

bitflags! {
    pub struct RouterFlags: u8 {
        const MANAGED = 0b10000000;
        const OTHER   = 0b01000000;
    }
}

/// Default router preference, from the two `Prf` bits of the flags octet.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Default)]
pub enum RouterPreference {
    Low,
    #[default]
    Medium,
    High,
}

impl RouterPreference {
    const MASK: u8 = 0b00011000;

    /// Decode the preference bits of a flags octet. The reserved encoding
    /// `10` is treated as medium.
    pub const fn from_flags(flags: u8) -> RouterPreference {
        match (flags & Self::MASK) >> 3 {
            0b01 => RouterPreference::High,
            0b11 => RouterPreference::Low,
            _ => RouterPreference::Medium,
        }
    }
}

impl fmt::Display for RouterPreference {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RouterPreference::Low => write!(f, "low"),
            RouterPreference::Medium => write!(f, "medium"),
            RouterPreference::High => write!(f, "high"),
        }
    }
}

/// A read/write wrapper around a router discovery ICMPv6 message buffer.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Packet<T: AsRef<[u8]>> {
    buffer: T,
}

// Router Solicitation Message
//  0                   1                   2                   3
//  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |     Type      |     Code      |          Checksum             |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                            Reserved                           |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |   Options ...
// +-+-+-+-+-+-+-+-+-+-+-+-
//
// Router Advertisement Message
//  0                   1                   2                   3
//  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |     Type      |     Code      |          Checksum             |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// | Cur Hop Limit |M|O|Prf|Reservd|       Router Lifetime         |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                         Reachable Time                        |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                          Retrans Timer                        |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |   Options ...
// +-+-+-+-+-+-+-+-+-+-+-+-
mod field {
    #![allow(unused)]

    use crate::wire::field::*;

    pub const TYPE: usize = 0;
    pub const CODE: usize = 1;
    pub const CHECKSUM: Field = 2..4;

    // Router Solicitation
    pub const RS_RESERVED: Field = 4..8;
    pub const RS_OPTIONS: usize = 8;

    // Router Advertisement
    pub const CUR_HOP_LIMIT: usize = 4;
    pub const ROUTER_FLAGS: usize = 5;
    pub const ROUTER_LT: Field = 6..8;
    pub const REACHABLE_TM: Field = 8..12;
    pub const RETRANS_TM: Field = 12..16;
    pub const RA_OPTIONS: usize = 16;
}

/// Length of the fixed Router Advertisement header.
pub const HEADER_LEN: usize = field::RA_OPTIONS;

impl<T: AsRef<[u8]>> Packet<T> {
    /// Imbue a raw octet buffer with router discovery message structure.
    pub const fn new_unchecked(buffer: T) -> Packet<T> {
        Packet { buffer }
    }

    /// Shorthand for a combination of [new_unchecked] and [check_len].
    ///
    /// [new_unchecked]: #method.new_unchecked
    /// [check_len]: #method.check_len
    pub fn new_checked(buffer: T) -> Result<Packet<T>> {
        let packet = Self::new_unchecked(buffer);
        packet.check_len()?;
        Ok(packet)
    }

    /// Ensure that no accessor method will panic if called.
    /// Returns `Err(Error::Truncated)` if the buffer is shorter than the
    /// fixed header of its message type.
    pub fn check_len(&self) -> Result<()> {
        let len = self.buffer.as_ref().len();
        if len < field::CHECKSUM.end {
            return Err(Error::Truncated);
        }
        let header_len = match self.msg_type() {
            Message::RouterSolicit => field::RS_OPTIONS,
            Message::RouterAdvert => field::RA_OPTIONS,
            Message::Unknown(_) => field::CHECKSUM.end,
        };
        if len < header_len {
            Err(Error::Truncated)
        } else {
            Ok(())
        }
    }

    /// Consume the packet, returning the underlying buffer.
    pub fn into_inner(self) -> T {
        self.buffer
    }

    /// Return the message type field.
    #[inline]
    pub fn msg_type(&self) -> Message {
        Message::from(self.buffer.as_ref()[field::TYPE])
    }

    /// Return the message code field.
    #[inline]
    pub fn msg_code(&self) -> u8 {
        self.buffer.as_ref()[field::CODE]
    }

    /// Return the checksum field.
    #[inline]
    pub fn checksum(&self) -> u16 {
        NetworkEndian::read_u16(&self.buffer.as_ref()[field::CHECKSUM])
    }

    /// Return the current hop limit field.
    #[inline]
    pub fn current_hop_limit(&self) -> u8 {
        self.buffer.as_ref()[field::CUR_HOP_LIMIT]
    }

    /// Return the managed and other configuration flags.
    #[inline]
    pub fn router_flags(&self) -> RouterFlags {
        RouterFlags::from_bits_truncate(self.buffer.as_ref()[field::ROUTER_FLAGS])
    }

    /// Return the default router preference.
    #[inline]
    pub fn router_preference(&self) -> RouterPreference {
        RouterPreference::from_flags(self.buffer.as_ref()[field::ROUTER_FLAGS])
    }

    /// Return the router lifetime field.
    #[inline]
    pub fn router_lifetime(&self) -> Duration {
        let data = self.buffer.as_ref();
        Duration::from_secs(NetworkEndian::read_u16(&data[field::ROUTER_LT]) as u64)
    }

    /// Return the reachable time field.
    #[inline]
    pub fn reachable_time(&self) -> Duration {
        let data = self.buffer.as_ref();
        Duration::from_millis(NetworkEndian::read_u32(&data[field::REACHABLE_TM]) as u64)
    }

    /// Return the retransmit time field.
    #[inline]
    pub fn retrans_time(&self) -> Duration {
        let data = self.buffer.as_ref();
        Duration::from_millis(NetworkEndian::read_u32(&data[field::RETRANS_TM]) as u64)
    }

    fn options_start(&self) -> usize {
        match self.msg_type() {
            Message::RouterSolicit => field::RS_OPTIONS,
            _ => field::RA_OPTIONS,
        }
    }
}

impl<'a, T: AsRef<[u8]> + ?Sized> Packet<&'a T> {
    /// Return a cursor over the options of the message.
    #[inline]
    pub fn options(&self) -> NdiscOptionCursor<'a> {
        NdiscOptionCursor::new(self.buffer.as_ref(), self.options_start())
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> Packet<T> {
    /// Set the message type field.
    #[inline]
    pub fn set_msg_type(&mut self, value: Message) {
        self.buffer.as_mut()[field::TYPE] = value.into();
    }

    /// Set the message code field.
    #[inline]
    pub fn set_msg_code(&mut self, value: u8) {
        self.buffer.as_mut()[field::CODE] = value;
    }

    /// Set the checksum field.
    #[inline]
    pub fn set_checksum(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.buffer.as_mut()[field::CHECKSUM], value);
    }

    /// Clear the reserved field of a router solicitation.
    #[inline]
    pub fn clear_rs_reserved(&mut self) {
        NetworkEndian::write_u32(&mut self.buffer.as_mut()[field::RS_RESERVED], 0);
    }

    /// Return a mutable slice covering the options of a router solicitation.
    #[inline]
    pub fn rs_options_mut(&mut self) -> &mut [u8] {
        &mut self.buffer.as_mut()[field::RS_OPTIONS..]
    }
}

/// A high-level representation of a Router Solicitation.
///
/// The checksum is left zero; raw ICMPv6 sockets fill it in.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct RouterSolicitRepr {
    pub lladdr: Option<EthernetAddress>,
}

impl RouterSolicitRepr {
    /// Parse a router solicitation and return a high-level representation.
    pub fn parse<T: AsRef<[u8]> + ?Sized>(packet: &Packet<&T>) -> Result<RouterSolicitRepr> {
        packet.check_len()?;
        if packet.msg_type() != Message::RouterSolicit || packet.msg_code() != 0 {
            return Err(Error::Unrecognized);
        }
        let mut lladdr = None;
        for opt in packet.options() {
            let opt = opt?;
            if opt.option_type() == OptionType::SourceLinkLayerAddr && opt.data_len() == 1 {
                lladdr = Some(EthernetAddress::from_bytes(&opt.data()[..6]));
            }
        }
        Ok(RouterSolicitRepr { lladdr })
    }

    /// Return the length of a packet that will be emitted from this
    /// high-level representation.
    pub const fn buffer_len(&self) -> usize {
        match self.lladdr {
            Some(_) => field::RS_OPTIONS + 8,
            None => field::RS_OPTIONS,
        }
    }

    /// Emit a high-level representation into a router solicitation buffer
    /// of at least [buffer_len](#method.buffer_len) octets.
    pub fn emit<T>(&self, packet: &mut Packet<&mut T>)
    where
        T: AsRef<[u8]> + AsMut<[u8]> + ?Sized,
    {
        packet.set_msg_type(Message::RouterSolicit);
        packet.set_msg_code(0);
        packet.set_checksum(0);
        packet.clear_rs_reserved();
        if let Some(lladdr) = self.lladdr {
            let mut opt = NdiscOption::new_unchecked(&mut packet.rs_options_mut()[..8]);
            opt.set_option_type(OptionType::SourceLinkLayerAddr);
            opt.set_data_len(1);
            opt.set_link_layer_addr(lladdr);
        }
    }
}

/// A decoded Router Advertisement.
///
/// Options borrow from the datagram they were decoded from and appear in
/// wire order, duplicates included.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct RouterAdvertisement<'a> {
    pub sender_address: Ipv6Address,
    pub received_at: Timestamp,
    /// `None` when the router left the hop limit unspecified.
    pub hop_limit: Option<u8>,
    pub flags: RouterFlags,
    pub preference: RouterPreference,
    /// Zero when the sender is not a default router.
    pub router_lifetime: Duration,
    /// Zero when unspecified.
    pub reachable_time: Duration,
    /// Zero when unspecified.
    pub retransmit_timer: Duration,
    /// The value of the first MTU option, if any.
    pub mtu: Option<u32>,
    pub options: Vec<RaOption<'a>>,
}

impl<'a> RouterAdvertisement<'a> {
    /// Decode a router advertisement.
    ///
    /// Fails only if the header is unusable. An option with broken framing
    /// or layout ends option processing; everything decoded before it is
    /// kept.
    pub fn parse<T: AsRef<[u8]> + ?Sized>(
        packet: &Packet<&'a T>,
        sender_address: Ipv6Address,
        received_at: Timestamp,
    ) -> Result<RouterAdvertisement<'a>> {
        packet.check_len()?;
        if packet.msg_type() != Message::RouterAdvert || packet.msg_code() != 0 {
            return Err(Error::Unrecognized);
        }

        let hop_limit = match packet.current_hop_limit() {
            0 => None,
            n => Some(n),
        };

        let mut mtu = None;
        let mut options = Vec::new();
        for opt in packet.options() {
            let parsed = opt.and_then(|opt| RaOption::parse(&opt, received_at));
            match parsed {
                Ok(option) => {
                    if let (RaOption::Mtu(value), None) = (&option, mtu) {
                        mtu = Some(*value);
                    }
                    options.push(option);
                }
                Err(err) => {
                    net_debug!(
                        "ndisc: {}: {}, ignoring remaining options",
                        sender_address,
                        err
                    );
                    break;
                }
            }
        }

        Ok(RouterAdvertisement {
            sender_address,
            received_at,
            hop_limit,
            flags: packet.router_flags(),
            preference: packet.router_preference(),
            router_lifetime: packet.router_lifetime(),
            reachable_time: packet.reachable_time(),
            retransmit_timer: packet.retrans_time(),
            mtu,
            options,
        })
    }

    /// Return the reception time as read from `clock`.
    pub fn timestamp(&self, clock: Clock) -> Instant {
        self.received_at.get(clock)
    }

    /// Return the moment this router stops being a default router.
    pub fn router_lifetime_until(&self) -> Timestamp {
        self.received_at + self.router_lifetime
    }

    /// Whether the sender offers itself as a default router.
    pub fn is_default_router(&self) -> bool {
        !self.router_lifetime.is_zero()
    }
}

impl fmt::Display for RouterAdvertisement<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Received Router Advertisement from {}", self.sender_address)?;
        writeln!(f, "  Timestamp: {}", self.received_at)?;
        match self.hop_limit {
            Some(hop_limit) => writeln!(f, "  Hop limit: {hop_limit}")?,
            None => writeln!(f, "  Hop limit: unspecified")?,
        }
        writeln!(
            f,
            "  Flags: {}{}",
            if self.flags.contains(RouterFlags::MANAGED) {
                "MANAGED "
            } else {
                ""
            },
            if self.flags.contains(RouterFlags::OTHER) {
                "OTHER"
            } else {
                ""
            }
        )?;
        writeln!(f, "  Preference: {}", self.preference)?;
        writeln!(
            f,
            "  Lifetime: {} (until {})",
            self.router_lifetime,
            self.router_lifetime_until().realtime
        )?;
        writeln!(f, "  Reachable time: {}", self.reachable_time)?;
        writeln!(f, "  Retransmission time: {}", self.retransmit_timer)?;
        if let Some(mtu) = self.mtu {
            writeln!(f, "  MTU: {mtu}")?;
        }
        for option in &self.options {
            writeln!(f, "  Option: {option}")?;
        }
        Ok(())
    }
}
