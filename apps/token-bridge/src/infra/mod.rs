//! Infrastructure layer - clock and state assembly.

pub mod clock;
pub mod state;
