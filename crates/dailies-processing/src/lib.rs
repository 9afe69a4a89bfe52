//! Dailies Processing Library
//!
//! Rendition and upload machinery of the dailies media engine: external
//! tool invocation, probe output parsing, image and video renditions, the
//! render dispatch policy, and the end-to-end upload pipeline.

pub mod command;
pub mod image_ops;
pub mod pipeline;
pub mod probe;
pub mod render;
pub mod video_ops;

// Re-export commonly used types
pub use command::{CommandOptions, OptionValue, ToolRunner};
pub use pipeline::UploadPipeline;
pub use probe::{MediaProber, StreamRecord};
pub use render::{MediaKind, MediaRenderer};
pub use video_ops::VideoRenderer;
