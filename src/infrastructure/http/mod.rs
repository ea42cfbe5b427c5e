pub mod blueprint;
pub mod controllers;
pub mod middleware;
pub mod router;

pub use blueprint::*;
pub use router::build_router;
