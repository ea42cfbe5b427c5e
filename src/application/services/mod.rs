pub mod localization;
pub mod login_manager;
pub mod moment;

pub use localization::*;
pub use login_manager::*;
pub use moment::*;
