use alloc::boxed::Box;
use core::fmt;

use crate::iface::{TimerHandle, Timers};
use crate::phy::{RxMeta, Transport, TransportError};
use crate::rand::Rand;
use crate::wire::{EthernetAddress, NdiscPacket, RouterAdvertisement, RouterSolicitRepr};

mod backoff;

pub use self::backoff::{
    BackoffState, RetransmitConfig, DEFAULT_INITIAL_INTERVAL, DEFAULT_MAX_INTERVAL,
};

/// Largest solicitation this session emits: header plus one link-layer
/// address option.
const MAX_SOLICIT_LEN: usize = 16;

/// Error returned by [Session] lifecycle operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// `start` was called before `configure`.
    NotConfigured,
    /// The interface index is zero, or the retransmission intervals are
    /// zero or out of order.
    InvalidConfig,
    /// The session must be stopped to be reconfigured.
    Busy,
    /// The transport could not be opened.
    Transport(TransportError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NotConfigured => write!(f, "not configured"),
            Error::InvalidConfig => write!(f, "invalid configuration"),
            Error::Busy => write!(f, "session is running"),
            Error::Transport(err) => write!(f, "transport: {err}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        Error::Transport(err)
    }
}

/// Lifecycle state of a [Session].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Not started, or stopped. The transport is closed.
    Stopped,
    /// Sending solicitations on the backoff schedule.
    Soliciting,
    /// An advertisement arrived; further ones are still delivered but no
    /// more solicitations are sent until the next `start`.
    Listening,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SessionState::Stopped => write!(f, "stopped"),
            SessionState::Soliciting => write!(f, "soliciting"),
            SessionState::Listening => write!(f, "listening"),
        }
    }
}

/// Notification delivered to the observer of a [Session].
#[derive(Debug, PartialEq, Eq)]
pub enum Event<'a> {
    /// A router advertisement was decoded. It borrows the datagram and is
    /// only valid for the duration of the callback.
    RouterAdvertisementReceived(RouterAdvertisement<'a>),
    /// The session was stopped.
    Stopped,
    /// The external watchdog expired.
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Config {
    ifindex: u32,
    lladdr: EthernetAddress,
}

type Observer<'a> = Box<dyn FnMut(Event<'_>) + 'a>;

/// Router discovery client session.
///
/// The session solicits routers on one interface and decodes the
/// advertisements they send back. It performs no I/O of its own accord:
///
/// * solicitations go out through the [Transport] it owns,
/// * retransmissions are scheduled on the [Timers] passed to each call, and
///   the event loop must report firings with [on_timer](#method.on_timer),
/// * received datagrams are fed in with [process](#method.process).
///
/// Decoded advertisements and lifecycle changes are reported to the
/// observer set with [set_observer](#method.set_observer).
pub struct Session<'a, T: Transport> {
    transport: T,
    config: Option<Config>,
    retransmit_config: RetransmitConfig,
    observer: Option<Observer<'a>>,
    rand: Rand,
    state: SessionState,
    backoff: BackoffState,
    timer: Option<TimerHandle>,
}

impl<'a, T: Transport> Session<'a, T> {
    /// Create a stopped session on `transport`.
    ///
    /// `random_seed` seeds the retransmission jitter. Sessions on
    /// different hosts should use different seeds.
    pub fn new(transport: T, random_seed: u64) -> Session<'a, T> {
        Session {
            transport,
            config: None,
            retransmit_config: RetransmitConfig::default(),
            observer: None,
            rand: Rand::new(random_seed),
            state: SessionState::Stopped,
            backoff: BackoffState::new(),
            timer: None,
        }
    }

    /// Set the interface to solicit on and the link-layer address to
    /// advertise in solicitations.
    ///
    /// An all-zero `lladdr` is not advertised.
    pub fn configure(&mut self, ifindex: u32, lladdr: EthernetAddress) -> Result<(), Error> {
        if self.state != SessionState::Stopped {
            return Err(Error::Busy);
        }
        if ifindex == 0 {
            return Err(Error::InvalidConfig);
        }
        self.config = Some(Config { ifindex, lladdr });
        Ok(())
    }

    /// Set the retransmission configuration. It takes effect at the next
    /// retransmission.
    ///
    /// The initial interval must be nonzero and no larger than the maximum
    /// interval, otherwise `Error::InvalidConfig` is returned and the
    /// current configuration is kept.
    pub fn set_retransmit_config(&mut self, config: RetransmitConfig) -> Result<(), Error> {
        if config.initial_interval.is_zero() || config.max_interval < config.initial_interval {
            return Err(Error::InvalidConfig);
        }
        self.retransmit_config = config;
        Ok(())
    }

    pub fn retransmit_config(&self) -> RetransmitConfig {
        self.retransmit_config
    }

    /// Set the observer, replacing the previous one.
    pub fn set_observer<F>(&mut self, observer: F)
    where
        F: FnMut(Event<'_>) + 'a,
    {
        self.observer = Some(Box::new(observer));
    }

    /// Remove the observer.
    pub fn clear_observer(&mut self) {
        self.observer = None;
    }

    /// Return the interface the session is configured for.
    pub fn ifindex(&self) -> Option<u32> {
        self.config.map(|config| config.ifindex)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Return a copy of the backoff progress of the current cycle.
    pub fn backoff(&self) -> BackoffState {
        self.backoff
    }

    /// Return the handle of the armed retransmission timer, if any.
    pub fn armed_timer(&self) -> Option<TimerHandle> {
        self.timer
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Start soliciting.
    ///
    /// Sends a solicitation right away and arms the retransmission timer.
    /// Starting a session that is already soliciting does nothing. Starting
    /// a listening session begins a new soliciting cycle.
    pub fn start<Tm>(&mut self, timers: &mut Tm) -> Result<(), Error>
    where
        Tm: Timers + ?Sized,
    {
        let config = self.config.ok_or(Error::NotConfigured)?;

        match self.state {
            SessionState::Soliciting => {
                net_trace!("ndisc: already soliciting on {}", config.ifindex);
                return Ok(());
            }
            SessionState::Listening => {
                self.cancel_timer(timers);
            }
            SessionState::Stopped => {
                if let Err(err) = self.transport.open(config.ifindex) {
                    net_debug!("ndisc: cannot open transport on {}: {}", config.ifindex, err);
                    return Err(err.into());
                }
            }
        }

        net_debug!("ndisc: started on {}", config.ifindex);
        self.state = SessionState::Soliciting;
        self.backoff.reset();
        self.send_solicit(config);
        self.arm_timer(timers);
        Ok(())
    }

    /// Stop the session.
    ///
    /// Cancels the retransmission timer, closes the transport and reports
    /// [Event::Stopped]. Stopping a stopped session does nothing.
    pub fn stop<Tm>(&mut self, timers: &mut Tm)
    where
        Tm: Timers + ?Sized,
    {
        if self.state == SessionState::Stopped {
            return;
        }

        net_debug!("ndisc: stopped");
        self.cancel_timer(timers);
        self.transport.close();
        self.state = SessionState::Stopped;
        self.backoff.reset();
        self.dispatch(Event::Stopped);
    }

    /// Report that a timer scheduled by this session fired.
    ///
    /// Handles that are not the armed retransmission timer are ignored.
    pub fn on_timer<Tm>(&mut self, timers: &mut Tm, handle: TimerHandle)
    where
        Tm: Timers + ?Sized,
    {
        if self.timer != Some(handle) {
            net_trace!("ndisc: ignoring stale timer {}", handle);
            return;
        }
        self.timer = None;

        let config = match (self.state, self.config) {
            (SessionState::Soliciting, Some(config)) => config,
            _ => return,
        };

        self.backoff.record_attempt();
        self.send_solicit(config);
        self.arm_timer(timers);
    }

    /// Feed a received ICMPv6 datagram to the session.
    ///
    /// A router advertisement is decoded and reported to the observer; the
    /// first one ends the soliciting cycle. Anything else is dropped.
    pub fn process<Tm>(&mut self, timers: &mut Tm, meta: &RxMeta, datagram: &[u8])
    where
        Tm: Timers + ?Sized,
    {
        if self.state == SessionState::Stopped {
            net_debug!("ndisc: not started, dropping datagram from {}", meta.src_addr);
            return;
        }

        let packet = match NdiscPacket::new_checked(datagram) {
            Ok(packet) => packet,
            Err(err) => {
                net_debug!("ndisc: dropping datagram from {}: {}", meta.src_addr, err);
                return;
            }
        };
        let ra = match RouterAdvertisement::parse(&packet, meta.src_addr, meta.timestamp) {
            Ok(ra) => ra,
            Err(err) => {
                net_debug!("ndisc: dropping datagram from {}: {}", meta.src_addr, err);
                return;
            }
        };

        net_debug!(
            "ndisc: router advertisement from {}, flags {:?}, lifetime {}",
            ra.sender_address,
            ra.flags,
            ra.router_lifetime
        );
        net_trace!("{}", ra);

        if self.state == SessionState::Soliciting {
            self.cancel_timer(timers);
            self.state = SessionState::Listening;
        }

        self.dispatch(Event::RouterAdvertisementReceived(ra));
    }

    /// Report that the caller's supervisory timeout expired.
    ///
    /// The session keeps running; it is up to the observer to stop it.
    pub fn on_watchdog_timeout(&mut self) {
        if self.state == SessionState::Stopped {
            return;
        }
        net_debug!("ndisc: timed out");
        self.dispatch(Event::TimedOut);
    }

    fn send_solicit(&mut self, config: Config) {
        let repr = RouterSolicitRepr {
            lladdr: Some(config.lladdr).filter(|lladdr| !lladdr.is_unspecified()),
        };
        let mut buffer = [0u8; MAX_SOLICIT_LEN];
        let buffer = &mut buffer[..repr.buffer_len()];
        repr.emit(&mut NdiscPacket::new_unchecked(&mut *buffer));

        // A lost solicitation is covered by the next retransmission.
        match self.transport.send_datagram(buffer) {
            Ok(()) => net_debug!(
                "ndisc: sent router solicitation on {} (attempt {})",
                config.ifindex,
                self.backoff.attempt_count
            ),
            Err(err) => net_debug!("ndisc: failed to send router solicitation: {}", err),
        }
    }

    fn arm_timer<Tm>(&mut self, timers: &mut Tm)
    where
        Tm: Timers + ?Sized,
    {
        let delay = self.backoff.next_delay(&self.retransmit_config, &mut self.rand);
        let handle = timers.schedule_once(delay);
        net_trace!("ndisc: next solicitation in {} (timer {})", delay, handle);
        self.timer = Some(handle);
    }

    fn cancel_timer<Tm>(&mut self, timers: &mut Tm)
    where
        Tm: Timers + ?Sized,
    {
        if let Some(handle) = self.timer.take() {
            timers.cancel(handle);
        }
    }

    fn dispatch(&mut self, event: Event<'_>) {
        if let Some(observer) = self.observer.as_mut() {
            observer(event);
        }
    }
}

impl<'a, T: Transport + fmt::Debug> fmt::Debug for Session<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Session")
            .field("transport", &self.transport)
            .field("config", &self.config)
            .field("retransmit_config", &self.retransmit_config)
            .field("observer", &self.observer.is_some())
            .field("state", &self.state)
            .field("backoff", &self.backoff)
            .field("timer", &self.timer)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::iface::TimerSet;
    use crate::phy::Loopback;
    use crate::tests::*;
    use crate::time::{Duration, Instant, Timestamp};
    use crate::wire::{Icmpv6Message, Ipv6Address, RouterFlags};
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    #[derive(Debug, PartialEq, Eq)]
    enum Seen {
        Advert(RouterFlags),
        Stopped,
        TimedOut,
    }

    const LLADDR: EthernetAddress = EthernetAddress([b'A', b'B', b'C', b'1', b'2', b'3']);

    fn meta() -> RxMeta {
        RxMeta {
            src_addr: Ipv6Address::new(0xfe80, 0, 0, 0, 0, 0, 0, 1),
            timestamp: Timestamp::new(Instant::from_secs(1_700_000_000), Instant::from_secs(1)),
        }
    }

    fn setup<'a>() -> (Session<'a, Loopback>, TimerSet<'static>, Rc<RefCell<Vec<Seen>>>) {
        let mut session = Session::new(Loopback::new(), 0x5eed);
        session.configure(42, LLADDR).unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        session.set_observer(move |event| {
            log.borrow_mut().push(match event {
                Event::RouterAdvertisementReceived(ra) => Seen::Advert(ra.flags),
                Event::Stopped => Seen::Stopped,
                Event::TimedOut => Seen::TimedOut,
            })
        });
        (session, TimerSet::new(vec![], Instant::ZERO), seen)
    }

    #[test]
    fn test_start_requires_config() {
        let mut session = Session::new(Loopback::new(), 1);
        let mut timers = TimerSet::new(vec![], Instant::ZERO);
        assert_eq!(session.start(&mut timers), Err(Error::NotConfigured));
        assert_eq!(session.state(), SessionState::Stopped);
        assert!(timers.is_empty());
        assert!(!session.transport().is_open());
    }

    #[test]
    fn test_configure() {
        let (mut session, mut timers, _) = setup();
        assert_eq!(session.configure(0, LLADDR), Err(Error::InvalidConfig));
        assert_eq!(session.ifindex(), Some(42));

        session.start(&mut timers).unwrap();
        assert_eq!(session.configure(7, LLADDR), Err(Error::Busy));

        session.stop(&mut timers);
        session.configure(7, LLADDR).unwrap();
        assert_eq!(session.ifindex(), Some(7));
    }

    #[test]
    fn test_start_sends_and_arms() {
        let (mut session, mut timers, _) = setup();
        session.start(&mut timers).unwrap();

        assert_eq!(session.state(), SessionState::Soliciting);
        assert_eq!(session.transport().ifindex(), Some(42));

        let rs = session.transport_mut().pop_sent().unwrap();
        let packet = NdiscPacket::new_checked(&rs[..]).unwrap();
        assert_eq!(packet.msg_type(), Icmpv6Message::RouterSolicit);
        assert_eq!(
            RouterSolicitRepr::parse(&packet),
            Ok(RouterSolicitRepr {
                lladdr: Some(LLADDR)
            })
        );

        let handle = session.armed_timer().unwrap();
        let expires_at = timers.expires_at(handle).unwrap();
        assert!(expires_at >= Instant::from_millis(3600));
        assert!(expires_at <= Instant::from_millis(4400));
        assert_eq!(
            session.backoff().previous_delay,
            expires_at - Instant::ZERO
        );
        assert_eq!(session.backoff().attempt_count, 0);
    }

    #[test]
    fn test_start_twice() {
        let (mut session, mut timers, _) = setup();
        session.start(&mut timers).unwrap();
        let handle = session.armed_timer();
        session.start(&mut timers).unwrap();

        assert_eq!(session.armed_timer(), handle);
        assert_eq!(timers.len(), 1);
        assert_eq!(session.transport().sent_len(), 1);
        assert_eq!(session.transport().open_count(), 1);
    }

    #[test]
    fn test_stop_twice() {
        let (mut session, mut timers, seen) = setup();
        session.stop(&mut timers);
        assert!(seen.borrow().is_empty());

        session.start(&mut timers).unwrap();
        session.stop(&mut timers);
        session.stop(&mut timers);
        assert_eq!(*seen.borrow(), [Seen::Stopped]);
        assert_eq!(session.state(), SessionState::Stopped);
        assert!(!session.transport().is_open());
    }

    #[test]
    fn test_stop_cancels_retransmission() {
        let (mut session, mut timers, _) = setup();
        session.start(&mut timers).unwrap();
        let handle = session.armed_timer().unwrap();
        session.stop(&mut timers);

        assert_eq!(session.armed_timer(), None);
        assert_eq!(timers.poll(Instant::from_secs(3600)), None);

        // Even a late report of the old timer sends nothing.
        session.on_timer(&mut timers, handle);
        assert_eq!(session.transport().sent_len(), 1);
        assert_eq!(session.backoff(), BackoffState::default());
    }

    #[test]
    fn test_retransmission() {
        let (mut session, mut timers, _) = setup();
        session.start(&mut timers).unwrap();
        let first_delay = session.backoff().previous_delay;

        let handle = timers.poll(Instant::from_secs(10)).unwrap();
        session.on_timer(&mut timers, handle);

        assert_eq!(session.backoff().attempt_count, 1);
        assert_eq!(session.transport().sent_len(), 2);
        let second_delay = session.backoff().previous_delay;
        assert!(second_delay >= first_delay * 2 - first_delay / 10);
        assert!(second_delay <= first_delay * 2 + first_delay / 10);
        assert_ne!(session.armed_timer(), Some(handle));
        assert_eq!(timers.len(), 1);
    }

    #[test]
    fn test_stale_timer_ignored() {
        let (mut session, mut timers, _) = setup();
        session.start(&mut timers).unwrap();
        session.on_timer(&mut timers, TimerHandle::new(1000));
        assert_eq!(session.transport().sent_len(), 1);
        assert_eq!(session.backoff().attempt_count, 0);
    }

    #[test]
    fn test_advertisement_stops_soliciting() {
        let (mut session, mut timers, seen) = setup();
        session.start(&mut timers).unwrap();

        session.process(&mut timers, &meta(), &router_advert(0x40));
        assert_eq!(session.state(), SessionState::Listening);
        assert_eq!(session.armed_timer(), None);
        assert!(timers.is_empty());
        assert_eq!(*seen.borrow(), [Seen::Advert(RouterFlags::OTHER)]);

        // Later advertisements are still delivered.
        session.process(&mut timers, &meta(), &router_advert(0x80));
        assert_eq!(seen.borrow().len(), 2);
        assert_eq!(session.transport().sent_len(), 1);
    }

    #[test]
    fn test_restart_from_listening() {
        let (mut session, mut timers, _) = setup();
        session.start(&mut timers).unwrap();
        let handle = timers.poll(Instant::from_secs(10)).unwrap();
        session.on_timer(&mut timers, handle);
        session.process(&mut timers, &meta(), &router_advert(0));

        session.start(&mut timers).unwrap();
        assert_eq!(session.state(), SessionState::Soliciting);
        assert_eq!(session.backoff().attempt_count, 0);
        assert_eq!(session.transport().sent_len(), 3);
        assert_eq!(session.transport().open_count(), 1);
        assert_eq!(timers.len(), 1);
    }

    #[test]
    fn test_bad_datagrams_dropped() {
        let (mut session, mut timers, seen) = setup();
        session.start(&mut timers).unwrap();

        let ra = router_advert(0);
        session.process(&mut timers, &meta(), &ra[..8]);
        session.process(&mut timers, &meta(), &[]);
        let mut ns = ra.clone();
        ns[0] = 0x87;
        session.process(&mut timers, &meta(), &ns);

        assert!(seen.borrow().is_empty());
        assert_eq!(session.state(), SessionState::Soliciting);
        assert!(session.armed_timer().is_some());
    }

    #[test]
    fn test_not_started_drops_datagrams() {
        let (mut session, mut timers, seen) = setup();
        session.process(&mut timers, &meta(), &router_advert(0));
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_open_failure() {
        let (mut session, mut timers, _) = setup();
        session.transport_mut().set_fail_open(true);
        assert_eq!(
            session.start(&mut timers),
            Err(Error::Transport(TransportError::Unavailable))
        );
        assert_eq!(session.state(), SessionState::Stopped);
        assert!(timers.is_empty());
    }

    #[test]
    fn test_send_failure_keeps_schedule() {
        let (mut session, mut timers, _) = setup();
        session.transport_mut().set_fail_send(true);
        session.start(&mut timers).unwrap();
        assert_eq!(session.transport().sent_len(), 0);
        assert!(session.armed_timer().is_some());

        session.transport_mut().set_fail_send(false);
        let handle = timers.poll(Instant::from_secs(10)).unwrap();
        session.on_timer(&mut timers, handle);
        assert_eq!(session.transport().sent_len(), 1);
    }

    #[test]
    fn test_watchdog() {
        let (mut session, mut timers, seen) = setup();
        session.on_watchdog_timeout();
        assert!(seen.borrow().is_empty());

        session.start(&mut timers).unwrap();
        session.on_watchdog_timeout();
        assert_eq!(*seen.borrow(), [Seen::TimedOut]);
        assert_eq!(session.state(), SessionState::Soliciting);
    }

    #[test]
    fn test_no_lladdr_advertised_for_zero_address() {
        let mut session = Session::new(Loopback::new(), 1);
        let mut timers = TimerSet::new(vec![], Instant::ZERO);
        session.configure(3, EthernetAddress::default()).unwrap();
        session.start(&mut timers).unwrap();
        let rs = session.transport_mut().pop_sent().unwrap();
        assert_eq!(rs.len(), 8);
    }

    #[test]
    fn test_retransmit_config() {
        let (mut session, mut timers, _) = setup();
        session
            .set_retransmit_config(RetransmitConfig {
                initial_interval: Duration::from_millis(10),
                max_interval: Duration::from_millis(20),
            })
            .unwrap();
        session.start(&mut timers).unwrap();
        let delay = session.backoff().previous_delay;
        assert!(delay >= Duration::from_millis(9) && delay <= Duration::from_millis(11));
    }

    #[test]
    fn test_retransmit_config_rejected() {
        let (mut session, mut timers, _) = setup();
        assert_eq!(
            session.set_retransmit_config(RetransmitConfig {
                initial_interval: Duration::ZERO,
                max_interval: Duration::from_secs(1),
            }),
            Err(Error::InvalidConfig)
        );
        assert_eq!(
            session.set_retransmit_config(RetransmitConfig {
                initial_interval: Duration::from_secs(10),
                max_interval: Duration::from_secs(1),
            }),
            Err(Error::InvalidConfig)
        );
        assert_eq!(session.retransmit_config(), RetransmitConfig::default());

        // With the defaults kept, every firing pushes the next one out and
        // polling at a fixed instant drains.
        session.start(&mut timers).unwrap();
        let now = timers.poll_at().unwrap();
        let mut fired = 0;
        while let Some(handle) = timers.poll(now) {
            session.on_timer(&mut timers, handle);
            fired += 1;
            assert!(fired < 10);
        }
        assert_eq!(fired, 1);
        assert!(timers.poll_at().unwrap() > now);
    }
}
