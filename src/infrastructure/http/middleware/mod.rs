pub mod error;
pub mod locale;

pub use error::*;
pub use locale::*;
