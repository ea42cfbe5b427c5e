pub mod task_queue;

pub use task_queue::*;
