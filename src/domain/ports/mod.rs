pub mod mail_transport;
pub mod task_queue;
