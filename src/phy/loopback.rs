use alloc::collections::VecDeque;
use alloc::vec::Vec;

use super::{Transport, TransportError};

/// An in-memory transport.
///
/// Every datagram sent through it is queued in FIFO order and can be taken
/// back out with [pop_sent](#method.pop_sent). Failures can be injected for
/// opening and sending.
#[derive(Debug, Default)]
pub struct Loopback {
    ifindex: Option<u32>,
    sent: VecDeque<Vec<u8>>,
    open_count: usize,
    fail_open: bool,
    fail_send: bool,
}

impl Loopback {
    /// Creates a closed loopback transport.
    pub fn new() -> Loopback {
        Loopback::default()
    }

    /// Make subsequent [open](Transport::open) calls fail with
    /// `TransportError::Unavailable`.
    pub fn set_fail_open(&mut self, fail: bool) {
        self.fail_open = fail;
    }

    /// Make subsequent sends fail with `TransportError::Send`.
    pub fn set_fail_send(&mut self, fail: bool) {
        self.fail_send = fail;
    }

    /// Return the interface the transport is open on, if any.
    pub fn ifindex(&self) -> Option<u32> {
        self.ifindex
    }

    pub fn is_open(&self) -> bool {
        self.ifindex.is_some()
    }

    /// Return how many times the transport was successfully opened.
    pub fn open_count(&self) -> usize {
        self.open_count
    }

    /// Return the number of queued datagrams.
    pub fn sent_len(&self) -> usize {
        self.sent.len()
    }

    /// Dequeue the oldest sent datagram.
    pub fn pop_sent(&mut self) -> Option<Vec<u8>> {
        self.sent.pop_front()
    }
}

impl Transport for Loopback {
    fn open(&mut self, ifindex: u32) -> Result<(), TransportError> {
        if self.fail_open {
            return Err(TransportError::Unavailable);
        }
        self.ifindex = Some(ifindex);
        self.open_count += 1;
        Ok(())
    }

    fn close(&mut self) {
        self.ifindex = None;
    }

    fn send_datagram(&mut self, datagram: &[u8]) -> Result<(), TransportError> {
        if self.ifindex.is_none() {
            return Err(TransportError::Unavailable);
        }
        if self.fail_send {
            return Err(TransportError::Send);
        }
        self.sent.push_back(datagram.to_vec());
        Ok(())
    }
}
