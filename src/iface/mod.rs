/*! Event loop plumbing.

The `iface` module holds what a session needs from the event loop that
drives it. Sessions never read a clock or sleep; they arm one-shot timers
through the [Timers] trait and are told when one fires. [TimerSet] is a
ready-made implementation an event loop can poll.
*/

mod timer_set;

pub use self::timer_set::{TimerHandle, TimerSet, TimerStorage, Timers};
