//! Adapters from host image representations to the RGBA8 rasters that frames are built from.

mod decode;

pub use decode::{decode_image, load_image};

use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};

/// Conversion from a host image type into a straight-alpha RGBA8 raster.
pub trait IntoRaster {
    fn into_raster(self) -> RgbaImage;
}

impl IntoRaster for RgbaImage {
    fn into_raster(self) -> RgbaImage {
        self
    }
}

impl IntoRaster for DynamicImage {
    fn into_raster(self) -> RgbaImage {
        self.into_rgba8()
    }
}

impl IntoRaster for &DynamicImage {
    fn into_raster(self) -> RgbaImage {
        self.to_rgba8()
    }
}

impl IntoRaster for RgbImage {
    fn into_raster(self) -> RgbaImage {
        DynamicImage::ImageRgb8(self).into_rgba8()
    }
}

impl IntoRaster for GrayImage {
    fn into_raster(self) -> RgbaImage {
        DynamicImage::ImageLuma8(self).into_rgba8()
    }
}
