#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use ndisc_client::iface::TimerSet;
use ndisc_client::phy::{Loopback, RxMeta};
use ndisc_client::socket::ndisc::Session;
use ndisc_client::time::{Duration, Instant, Timestamp};
use ndisc_client::wire::{EthernetAddress, Ipv6Address};

#[derive(Debug, Arbitrary)]
enum Step {
    Start,
    Stop,
    Advance(u16),
    Datagram(Vec<u8>),
    Watchdog,
}

#[derive(Debug, Arbitrary)]
struct Input {
    seed: u64,
    lladdr: [u8; 6],
    steps: Vec<Step>,
}

fuzz_target!(|input: Input| {
    let mut session = Session::new(Loopback::new(), input.seed);
    if session.configure(1, EthernetAddress(input.lladdr)).is_err() {
        return;
    }
    session.set_observer(|event| {
        let _ = format!("{event:?}");
    });
    let mut timers = TimerSet::new(vec![], Instant::ZERO);
    let mut now = Instant::ZERO;

    for step in input.steps {
        match step {
            Step::Start => {
                let _ = session.start(&mut timers);
            }
            Step::Stop => session.stop(&mut timers),
            Step::Advance(secs) => {
                now = now + Duration::from_secs(secs as u64);
                while let Some(handle) = timers.poll(now) {
                    session.on_timer(&mut timers, handle);
                }
            }
            Step::Datagram(data) => {
                let meta = RxMeta {
                    src_addr: Ipv6Address::UNSPECIFIED,
                    timestamp: Timestamp::new(now, now),
                };
                session.process(&mut timers, &meta, &data);
            }
            Step::Watchdog => session.on_watchdog_timeout(),
        }
        while session.transport_mut().pop_sent().is_some() {}
    }
});
