//! Domain models for the Shamba yield dashboard

mod climate;
mod crop;
mod prediction;
mod user;

pub use climate::*;
pub use crop::*;
pub use prediction::*;
pub use user::*;
