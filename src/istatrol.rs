mod error;
mod identity;
pub mod protocol;
mod sample;
mod session;

pub use error::*;
pub use identity::*;
pub use sample::*;
pub use session::*;
