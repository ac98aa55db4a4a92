//! Postercraft Render - deterministic raster export of poster documents.
//!
//! Rendering runs in two phases: every image source in the document is
//! decoded first, then the element tree is drawn onto a CPU surface and
//! optionally encoded as PNG.

pub mod error;
pub mod export;
pub mod fonts;
pub mod images;
pub mod raster;

pub use error::{RenderError, RenderResult};
pub use export::{
    PngExport, encode_png, export_dimensions, export_file_name, export_png, export_png_blocking,
    render, render_blocking,
};
pub use fonts::{DEFAULT_FAMILY, FontBook};
pub use images::{
    DataUriLoader, ImageCache, ImageLoader, apply_filters, collect_image_sources, load_images,
};
pub use raster::{output_size, rasterize};

pub use tiny_skia::Pixmap;
