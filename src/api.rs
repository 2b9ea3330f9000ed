//! The ABI-shaped surface. A [`Context`] owns everything a binding
//! needs: the texture registry, the last-error string, the progress
//! callback and the named integer parameters. Methods mirror the C ABI
//! one-to-one: failures return `0`/`false`/`None`, store the message
//! for [`Context::last_error`], and never panic across the boundary.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::containers::{ContainerRegistry, NpyOptions, broadcast_grayscale};
use crate::convert::{ProgressContext, convert, convert_silent};
use crate::error::{Result, TexError};
use crate::format::Format;
use crate::registry::Registry;
use crate::texture::Texture;

pub type ProgressCallback = Box<dyn FnMut(f32, &str) -> bool + Send>;

/// Encoder quality used when a caller does not specify one.
pub const DEFAULT_QUALITY: u8 = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureInfo {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub layers: u32,
    pub faces: u32,
    pub mipmaps: u32,
    pub format: Format,
    pub original_format: Format,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MipmapInfo {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub byte_size: usize,
}

#[derive(Default)]
pub struct Context {
    registry: Registry,
    last_error: Mutex<String>,
    // double-wrapped so a running conversion holds only the inner lock
    // and the callback itself may re-enter the context
    progress: Mutex<Option<Arc<Mutex<ProgressCallback>>>>,
    parameters: Mutex<HashMap<String, i32>>,
}

impl Context {
    pub fn new() -> Context {
        Context::default()
    }

    /// The message from the most recent failed call.
    pub fn last_error(&self) -> String {
        self.last_error.lock().unwrap().clone()
    }

    pub fn set_progress_callback(&self, callback: Option<ProgressCallback>) {
        *self.progress.lock().unwrap() = callback.map(|c| Arc::new(Mutex::new(c)));
    }

    pub fn set_global_parameter(&self, name: &str, value: i32) {
        self.parameters
            .lock()
            .unwrap()
            .insert(name.to_string(), value);
    }

    pub fn global_parameter(&self, name: &str) -> i32 {
        self.parameters
            .lock()
            .unwrap()
            .get(name)
            .copied()
            .unwrap_or(0)
    }

    /// Loads a file into the registry and returns its handle, 0 on
    /// failure. The texture lands in its staging format; compressed
    /// container payloads are decompressed here.
    pub fn image_open(&self, path: impl AsRef<Path>) -> u32 {
        let path = path.as_ref();
        match self.open_inner(path) {
            Ok(id) => {
                log::info!("opened {} as texture {id}", path.display());
                id
            }
            Err(e) => self.fail(e),
        }
    }

    fn open_inner(&self, path: &Path) -> Result<u32> {
        if !path.is_file() {
            return Err(TexError::NotFound(path.display().to_string()));
        }
        let containers = ContainerRegistry::new(self.npy_options());
        let mut tex = containers.find_reader(path)?.read(path)?;

        let staging = tex.format().nearest_supported_internal();
        if staging != tex.format() {
            tex = self.run_convert(&tex, staging, DEFAULT_QUALITY)?;
        }
        if tex.requires_grayscale_postprocess() {
            broadcast_grayscale(&mut tex)?;
        }
        Ok(self.registry.insert(tex))
    }

    /// Allocates a zero-filled texture, staging formats only. Returns
    /// the handle, 0 on failure.
    pub fn image_allocate(
        &self,
        format: Format,
        width: u32,
        height: u32,
        depth: u32,
        layers: u32,
        mipmaps: u32,
    ) -> u32 {
        if !format.is_supported_internal() {
            return self.fail(TexError::Unsupported(format!(
                "{format:?} is not an allocatable working format"
            )));
        }
        match Texture::new(format, width, height, depth, layers, mipmaps) {
            Ok(tex) => self.registry.insert(tex),
            Err(e) => self.fail(e),
        }
    }

    pub fn image_release(&self, id: u32) -> bool {
        match self.registry.remove(id) {
            Ok(()) => true,
            Err(e) => {
                self.fail(e);
                false
            }
        }
    }

    pub fn image_info(&self, id: u32) -> Option<TextureInfo> {
        let info = self.registry.with(id, |tex| TextureInfo {
            width: tex.width(0),
            height: tex.height(0),
            depth: tex.depth(0),
            layers: tex.num_layers(),
            faces: tex.num_faces(),
            mipmaps: tex.num_mipmaps(),
            format: tex.format(),
            original_format: tex.original_format(),
        });
        match info {
            Ok(info) => Some(info),
            Err(e) => {
                self.fail(e);
                None
            }
        }
    }

    pub fn image_info_mipmap(&self, id: u32, mip: u32) -> Option<MipmapInfo> {
        let info = self.registry.with(id, |tex| {
            if mip >= tex.num_mipmaps() {
                return Err(TexError::NotFound(format!("mipmap {mip}")));
            }
            Ok(MipmapInfo {
                width: tex.width(mip),
                height: tex.height(mip),
                depth: tex.depth(mip),
                byte_size: tex.byte_size(mip),
            })
        });
        match info {
            Ok(Ok(info)) => Some(info),
            Ok(Err(e)) | Err(e) => {
                self.fail(e);
                None
            }
        }
    }

    /// Closure access to one subresource's bytes.
    pub fn with_mipmap_mut(
        &self,
        id: u32,
        layer: u32,
        mip: u32,
        f: impl FnOnce(&mut [u8]),
    ) -> bool {
        let outcome = self.registry.with_mut(id, |tex| {
            tex.data_mut(layer, mip).map(f)
        });
        match outcome {
            Ok(Ok(())) => true,
            Ok(Err(e)) | Err(e) => {
                self.fail(e);
                false
            }
        }
    }

    /// Exports a texture, converting to `format` first when it differs
    /// from the working format. The export list for the target
    /// extension is checked before any conversion or I/O happens. On
    /// success the registry entry is replaced by the converted texture.
    pub fn image_save(
        &self,
        id: u32,
        path: impl AsRef<Path>,
        format: Format,
        quality: u8,
    ) -> bool {
        let path = path.as_ref();
        match self.save_inner(id, path, format, quality) {
            Ok(()) => {
                log::info!("saved texture {id} to {}", path.display());
                true
            }
            Err(e) => {
                self.fail(e);
                false
            }
        }
    }

    fn save_inner(&self, id: u32, path: &Path, format: Format, quality: u8) -> Result<()> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        if !export_formats(&extension).contains(&format) {
            return Err(TexError::Unsupported(format!(
                "{format:?} cannot be exported to .{extension} files"
            )));
        }
        let containers = ContainerRegistry::new(self.npy_options());
        let writer = containers.find_writer(path)?;

        let tex = self.registry.with(id, Texture::clone)?;
        let tex = if tex.format() != format {
            self.run_convert(&tex, format, quality)?
        } else {
            tex
        };
        writer.write(path, &tex)?;
        self.registry.replace(id, tex)
    }

    fn npy_options(&self) -> NpyOptions {
        let params = self.parameters.lock().unwrap();
        let channel = params.get("npy useChannel").copied().unwrap_or(-1);
        NpyOptions {
            volume: params.get("npy is3D").copied().unwrap_or(0) != 0,
            channel: u32::try_from(channel).ok(),
        }
    }

    fn run_convert(&self, tex: &Texture, target: Format, quality: u8) -> Result<Texture> {
        let callback = self.progress.lock().unwrap().clone();
        match callback {
            Some(cell) => {
                let mut callback = cell.lock().unwrap();
                let mut ctx = ProgressContext::new(Some(&mut **callback));
                convert(tex, target, quality, &mut ctx)
            }
            None => convert_silent(tex, target, quality),
        }
    }

    /// Stores the error message and returns the ABI failure value.
    fn fail(&self, err: TexError) -> u32 {
        log::warn!("{err}");
        *self.last_error.lock().unwrap() = err.to_string();
        0
    }
}

const LDR_EXPORTS: &[Format] = &[Format::Rgba8Unorm, Format::Rgba8Srgb];
const FLOAT_EXPORTS: &[Format] = &[Format::Rgba32Float];
const GPU_EXPORTS: &[Format] = &[
    Format::Rgba8Unorm,
    Format::Rgba8Snorm,
    Format::Rgba8Srgb,
    Format::Rgba32Float,
    Format::Bc1Unorm,
    Format::Bc1Srgb,
    Format::Bc3Unorm,
    Format::Bc3Srgb,
    Format::Bc6hUfloat,
    Format::Bc7Unorm,
    Format::Bc7Srgb,
];

/// The formats a file extension can be exported in.
pub fn export_formats(extension: &str) -> &'static [Format] {
    match extension {
        "png" | "jpg" | "jpeg" | "bmp" | "tga" => LDR_EXPORTS,
        "hdr" | "exr" | "pfm" => FLOAT_EXPORTS,
        "dds" | "ktx2" => GPU_EXPORTS,
        _ => &[],
    }
}
