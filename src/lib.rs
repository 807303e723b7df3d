#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

//! The _ndisc-client_ library is the host side of IPv6 router discovery
//! ([RFC 4861]). It solicits routers on a link, decodes the Router
//! Advertisements that come back, and paces Router Solicitations with
//! randomized exponential backoff until one arrives.
//!
//! The library does no I/O of its own. A [`socket::ndisc::Session`] is driven
//! from the outside: the event loop hands it received datagrams and expired
//! timers, and the session calls back into a [`phy::Transport`] to send and
//! into a [`iface::Timers`] implementation to arm and cancel its
//! retransmission timer.
//!
//! # The layers
//!
//! ## The wire layer
//! The `wire` module contains zero-copy views over Router Advertisement
//! datagrams ([`wire::NdiscPacket`]), an iterator over their TLV option area
//! ([`wire::NdiscOptionCursor`]), per-option decoders ([`wire::RaOption`]) and
//! the immutable snapshot handed to observers ([`wire::RouterAdvertisement`]).
//! Decoding never panics on untrusted input.
//!
//! ## The socket layer
//! The `socket` module contains the discovery session state machine and the
//! backoff computation that drives it.
//!
//! ## The interface and physical layers
//! The `iface` and `phy` modules define the seams to the surrounding event
//! loop and raw ICMPv6 socket, and ship small in-memory implementations of
//! both that are suitable for tests and simulations.
//!
//! [RFC 4861]: https://tools.ietf.org/html/rfc4861

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(not(feature = "alloc"))]
compile_error!("the `alloc` feature is required: decoded advertisements own their option lists");

#[macro_use]
mod macros;
mod rand;

pub mod iface;
pub mod phy;
pub mod socket;
pub mod time;
pub mod wire;

#[cfg(test)]
mod tests;
