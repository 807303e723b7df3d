/*! Access to the link the session solicits on.

The `phy` module defines the boundary between a discovery session and the
raw ICMPv6 socket underneath it. A [Transport] owns the socket: it joins the
right multicast groups on [open](Transport::open), sends solicitations to
the all-routers group, and is released on [close](Transport::close).
Received datagrams do not flow through the trait; the event loop reads them
and hands them to the session together with an [RxMeta].

Checksums, hop-limit filtering and multicast membership are the transport's
business. The session only ever sees complete ICMPv6 messages.

The [Loopback] transport keeps everything in memory and is what the tests
drive sessions with.
*/

use core::fmt;

use crate::time::Timestamp;
use crate::wire::Ipv6Address;

mod loopback;

pub use self::loopback::Loopback;

/// Opening or writing to the transport failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// The socket could not be acquired or its multicast group joined.
    Unavailable,
    /// A datagram could not be sent.
    Send,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TransportError::Unavailable => write!(f, "transport unavailable"),
            TransportError::Send => write!(f, "send failed"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TransportError {}

/// A raw ICMPv6 socket bound to one interface.
pub trait Transport {
    /// Acquire the socket on interface `ifindex`.
    fn open(&mut self, ifindex: u32) -> Result<(), TransportError>;

    /// Release the socket. Closing a closed transport does nothing.
    fn close(&mut self);

    /// Send one ICMPv6 message to [LINK_LOCAL_ALL_ROUTERS].
    ///
    /// [LINK_LOCAL_ALL_ROUTERS]: crate::wire::LINK_LOCAL_ALL_ROUTERS
    fn send_datagram(&mut self, datagram: &[u8]) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn open(&mut self, ifindex: u32) -> Result<(), TransportError> {
        (**self).open(ifindex)
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn send_datagram(&mut self, datagram: &[u8]) -> Result<(), TransportError> {
        (**self).send_datagram(datagram)
    }
}

/// Metadata of a received datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RxMeta {
    /// IPv6 source address of the datagram.
    pub src_addr: Ipv6Address,
    /// When the datagram was received.
    pub timestamp: Timestamp,
}
