pub mod frame;
pub mod handle;
pub mod pool;
pub mod process;

pub use frame::{zip_channels, Frame, FrameRef, ZipChannels};
pub use handle::BufferHandle;
pub use pool::BufferPool;
pub use process::{MidiData, MonoData, ProcessData, StereoData};
