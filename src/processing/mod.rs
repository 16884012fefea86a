mod audio;
mod format;
mod metadata;
mod muxer;
mod video;

pub use audio::*;
pub use format::*;
pub use metadata::*;
pub use muxer::*;
pub use video::*;
