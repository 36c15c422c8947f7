// Library surface for the binary, headless drivers and integration tests.
pub mod app;
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod countdown;
pub mod event_log;
pub mod history;
pub mod input;
pub mod modes;
pub mod replay;
pub mod round;
pub mod runtime;
pub mod session;
pub mod store;
pub mod ui;
pub mod util;

pub use clock::{Clock, ManualClock, SystemClock};
pub use round::{Mode, Round, RoundState, Winner};
pub use session::{HitResponse, Session, SessionSettings};
