#![forbid(unsafe_code)]

pub mod captions;
pub mod error;
pub mod input;
pub mod model;
pub mod navigation;
pub mod quiz;
pub mod time;

pub use error::Error;
pub use time::Clock;
