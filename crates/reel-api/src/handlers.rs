//! Request handlers.

pub mod health;
pub mod status;
pub mod stream;
pub mod submit;

pub use health::*;
pub use status::*;
pub use stream::*;
pub use submit::*;
