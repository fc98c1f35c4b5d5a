pub mod frame_getter;

pub use frame_getter::*;
