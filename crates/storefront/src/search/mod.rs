//! Debounced catalog search.
//!
//! Keystrokes are fed to a [`Debouncer`], which coalesces a burst of input
//! into a single [`SearchTicket`] once the input goes quiet. Tickets carry a
//! sequence number so that a response to a superseded search can be told
//! apart from the current one and dropped.
//!
//! Time comes from a [`Clock`]. [`TokioClock`] follows the tokio timer (and so
//! respects `tokio::time::pause`); [`ManualClock`] is advanced by hand.

mod clock;
mod debounce;

pub use clock::{Clock, ManualClock, TokioClock};
pub use debounce::{Debouncer, SearchTicket};
