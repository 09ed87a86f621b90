//! Turns an image into the intensity grid the numeric pipeline consumes.

use crate::dct::IntensityGrid;
use crate::error::{PhashError, Result};
use crate::matrix::Matrix;
use image::imageops::{self, FilterType};
use image::io::Reader as ImageReader;
use image::{DynamicImage, GenericImageView, GrayImage, Luma};
use std::path::Path;

/// ITU-R 601-2 luma in 16-bit fixed point, rounded to nearest.
///
/// `L = (19595 R + 38470 G + 7471 B + 2^15) >> 16`, the conversion the
/// reference tooling applies before resizing.
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    let weighted = 19595 * u32::from(r) + 38470 * u32::from(g) + 7471 * u32::from(b) + 0x8000;
    (weighted >> 16) as u8
}

/// Grayscale `img` and resample it to `size x size` with Lanczos3.
pub fn grid_from_image(img: &DynamicImage, size: usize) -> Result<IntensityGrid> {
    let edge = u32::try_from(size)
        .ok()
        .filter(|&e| e > 0)
        .ok_or_else(|| PhashError::dimension(format!("cannot resize to {}x{}", size, size)))?;

    let rgb = img.to_rgb8();
    let gray = GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        Luma([luma(r, g, b)])
    });
    let resized = imageops::resize(&gray, edge, edge, FilterType::Lanczos3);
    Matrix::new(size, size, resized.into_raw())
}

/// Decode the image at `path` and build its intensity grid.
pub fn load_grid(path: &Path, size: usize) -> Result<IntensityGrid> {
    let img = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    log::trace!(
        "decoded {} ({}x{})",
        path.display(),
        img.width(),
        img.height()
    );
    grid_from_image(&img, size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn luma_uses_601_weights() {
        assert_eq!(luma(0, 0, 0), 0);
        assert_eq!(luma(255, 255, 255), 255);
        assert_eq!(luma(255, 0, 0), 76);
        assert_eq!(luma(0, 255, 0), 150);
        assert_eq!(luma(0, 0, 255), 29);
    }

    #[test]
    fn constant_image_gives_constant_grid() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(100, 60, Rgb([10, 200, 30])));
        let grid = grid_from_image(&img, 32).unwrap();
        assert_eq!((grid.rows(), grid.cols()), (32, 32));
        let expected = luma(10, 200, 30);
        assert!(grid.as_slice().iter().all(|&v| v == expected));
    }

    #[test]
    fn rejects_zero_size() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([0, 0, 0])));
        assert!(matches!(
            grid_from_image(&img, 0),
            Err(PhashError::InvalidDimension { .. })
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_grid(Path::new("/nonexistent/zkphash.png"), 32).unwrap_err();
        assert!(matches!(err, PhashError::Io(_)));
    }
}
