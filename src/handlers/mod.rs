pub mod message;

pub use message::event_handler;
