pub mod client;
pub mod decode;
pub mod event;
pub mod transport;

pub use client::{ExportStreamClient, JobOutcome};
pub use decode::SseDecoder;
pub use event::ExportEvent;
pub use transport::{decode_frames, open_event_stream, FrameStream};
