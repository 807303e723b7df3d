#![no_main]
use libfuzzer_sys::fuzz_target;
use ndisc_client::time::{Instant, Timestamp};
use ndisc_client::wire::{Ipv6Address, NdiscPacket, RaOption, RouterAdvertisement};

fuzz_target!(|data: &[u8]| {
    let received_at = Timestamp::new(Instant::from_secs(1_700_000_000), Instant::from_secs(1));

    if let Ok(packet) = NdiscPacket::new_checked(data) {
        if let Ok(ra) = RouterAdvertisement::parse(&packet, Ipv6Address::UNSPECIFIED, received_at) {
            let _ = format!("{ra}");
        }

        // Walk the option area directly as well, rewinding once.
        let mut cursor = packet.options();
        for _ in 0..2 {
            for opt in cursor.by_ref() {
                match opt {
                    Ok(opt) => {
                        if let Ok(opt) = RaOption::parse(&opt, received_at) {
                            let _ = format!("{opt}");
                        }
                    }
                    Err(_) => break,
                }
            }
            cursor.rewind();
        }
    }
});
