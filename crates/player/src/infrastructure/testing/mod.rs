//! Test doubles shared by unit tests and downstream crates (`testing` feature).

mod fixtures;

pub use fixtures::{frame, RecordingAuthority, ScriptedChannel};
