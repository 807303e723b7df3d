/*! Low-level packet access and construction.

The `wire` module deals with the packet *representation* of IPv6 router
discovery. It provides two levels of functionality.

 * First, it provides functions to extract fields from sequences of octets,
   and to insert fields into sequences of octets. This happens in the
   [NdiscPacket] and [NdiscOption] structures.
 * Second, it decodes those fields into typed, owned-where-needed values:
   [RaOption] for a single option and [RouterAdvertisement] for a whole
   datagram, ready to be handed to an observer.

The [NdiscPacket] type guarantees that, if `check_len()` returned `Ok(())`,
no header accessor will panic. The option area is never indexed directly;
it is only reached through [NdiscOptionCursor], which validates the framing
of every option before yielding it.

```rust
use ndisc_client::time::{Instant, Timestamp};
use ndisc_client::wire::{Ipv6Address, NdiscPacket, RouterAdvertisement, RouterFlags};

let bytes = [
    0x86, 0x00, 0x00, 0x00, 0x40, 0x40, 0x07, 0x08,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x05, 0x01, 0x00, 0x00, 0x00, 0x00, 0x05, 0xdc,
];
let packet = NdiscPacket::new_checked(&bytes[..]).expect("truncated");
let received_at = Timestamp::new(Instant::from_secs(1_000), Instant::from_secs(10));
let ra = RouterAdvertisement::parse(&packet, Ipv6Address::LOCALHOST, received_at)
    .expect("not a router advertisement");
assert_eq!(ra.flags, RouterFlags::OTHER);
assert_eq!(ra.mtu, Some(1500));
```
*/

mod field {
    pub type Field = ::core::ops::Range<usize>;
}

pub(crate) mod dns;
mod ethernet;
mod ndisc;
mod ndiscoption;

use core::fmt;

pub use core::net::Ipv6Addr as Ipv6Address;

pub use self::ethernet::Address as EthernetAddress;

pub use self::ndisc::{
    Message as Icmpv6Message, Packet as NdiscPacket, RouterAdvertisement, RouterFlags,
    RouterPreference, RouterSolicitRepr, HEADER_LEN as NDISC_RA_HEADER_LEN,
};

pub use self::ndiscoption::{
    Direction as NdiscLinkLayerDirection, Dnssl as NdiscDnssl, Lifetime, NdiscOption,
    NdiscOptionCursor, PrefixInfoFlags as NdiscPrefixInfoFlags,
    PrefixInformation as NdiscPrefixInformation, RaOption, Rdnss as NdiscRdnss,
    Type as NdiscOptionType,
};

pub use self::dns::{DomainName, DOMAIN_NAME_MAX_LEN};

/// All-routers link-local multicast group, the destination of every solicitation.
pub const LINK_LOCAL_ALL_ROUTERS: Ipv6Address = Ipv6Address::new(0xff02, 0, 0, 0, 0, 0, 0, 2);

/// Parsing a router discovery datagram failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The datagram is shorter than the fixed header.
    Truncated,
    /// The datagram is not the ICMPv6 message type being decoded.
    Unrecognized,
    /// An option violates TLV framing or its own fixed layout. Options after
    /// it cannot be located.
    MalformedOption,
    /// A DNS Search List option carries a name that cannot be decoded.
    InvalidDomainName,
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// The result type for the wire module.
pub type Result<T> = core::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Truncated => write!(f, "truncated datagram"),
            Error::Unrecognized => write!(f, "unrecognized message"),
            Error::MalformedOption => write!(f, "malformed option"),
            Error::InvalidDomainName => write!(f, "invalid domain name"),
        }
    }
}
