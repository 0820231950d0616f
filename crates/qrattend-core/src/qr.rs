//! QR code decoding and encoding.
//!
//! Decoding runs `rqrr` over a grayscale frame. Encoding renders a
//! `qrcode` symbol into a PNG with a white quiet zone.

use std::path::{Path, PathBuf};

use image::{GrayImage, Luma};
use qrcode::{Color, QrCode};
use thiserror::Error;
use tracing::debug;

/// Pixels per QR module in generated images
const MODULE_PIXELS: u32 = 10;

/// Quiet zone around generated symbols, in modules
const QUIET_ZONE_MODULES: u32 = 4;

const DARK: Luma<u8> = Luma([0]);
const LIGHT: Luma<u8> = Luma([255]);

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("failed to read image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// A symbol was located but its payload could not be recovered.
    #[error("QR code found but could not be decoded: {0}")]
    Symbol(#[from] rqrr::DeQRError),
}

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("cannot encode value as QR code: {0}")]
    Qr(#[from] qrcode::types::QrError),

    #[error("failed to save QR image to {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Decode the first readable QR code in `frame`.
///
/// `Ok(None)` means no code is visible, the normal case for most frames.
/// An error is returned only when codes were found and none of them decoded.
pub fn decode_frame(frame: &GrayImage) -> Result<Option<String>, DecodeError> {
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        frame.width() as usize,
        frame.height() as usize,
        |x, y| frame.get_pixel(x as u32, y as u32).0[0],
    );
    let grids = prepared.detect_grids();

    let mut last_error = None;
    for grid in &grids {
        match grid.decode() {
            Ok((_meta, content)) => {
                debug!(grids = grids.len(), "Decoded QR code");
                return Ok(Some(content));
            }
            Err(e) => {
                debug!(error = %e, "Skipping unreadable QR grid");
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(e) => Err(e.into()),
        None => Ok(None),
    }
}

/// Decode the first QR code in the image file at `path`.
pub fn read_qr_code(path: &Path) -> Result<Option<String>, DecodeError> {
    let image = image::open(path).map_err(|source| DecodeError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    decode_frame(&image.to_luma8())
}

/// Render `value` as a black-on-white QR code.
pub fn render_qr_code(value: &str) -> Result<GrayImage, EncodeError> {
    let code = QrCode::new(value.as_bytes())?;
    let modules = code.width() as u32;
    let colors = code.to_colors();
    let side = (modules + 2 * QUIET_ZONE_MODULES) * MODULE_PIXELS;

    Ok(GrayImage::from_fn(side, side, |x, y| {
        let mx = (x / MODULE_PIXELS).checked_sub(QUIET_ZONE_MODULES);
        let my = (y / MODULE_PIXELS).checked_sub(QUIET_ZONE_MODULES);
        match (mx, my) {
            (Some(mx), Some(my)) if mx < modules && my < modules => {
                match colors[(my * modules + mx) as usize] {
                    Color::Dark => DARK,
                    Color::Light => LIGHT,
                }
            }
            _ => LIGHT,
        }
    }))
}

/// Render `value` as a QR code and save it as an image at `path`.
pub fn write_qr_code(value: &str, path: &Path) -> Result<(), EncodeError> {
    render_qr_code(value)?
        .save(path)
        .map_err(|source| EncodeError::Save {
            path: path.to_path_buf(),
            source,
        })
}
