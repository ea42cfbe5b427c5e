pub mod cache;
pub mod mail;
pub mod search;

pub use cache::*;
pub use mail::*;
pub use search::*;
