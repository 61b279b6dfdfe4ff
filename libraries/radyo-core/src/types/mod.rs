//! Domain types for Radyo Player

mod frequency;
mod handle;
mod session;
mod station;

pub use frequency::Frequency;
pub use handle::HandleId;
pub use session::AudioSessionConfig;
pub use station::Station;
