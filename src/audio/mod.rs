pub mod buffer;
pub mod fragment;

pub use buffer::SessionBuffer;
pub use fragment::{decode, AudioFragment};
