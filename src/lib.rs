pub mod api;
pub mod containers;
pub mod convert;
pub mod error;
pub mod format;
pub mod registry;
pub mod texture;

pub use api::{Context, DEFAULT_QUALITY, MipmapInfo, ProgressCallback, TextureInfo, export_formats};
pub use convert::{ProgressContext, ProgressSink, convert, convert_silent};
pub use error::{Result, TexError};
pub use format::Format;
pub use texture::{Layout, Texture};
