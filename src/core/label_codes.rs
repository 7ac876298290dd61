//! Code128 and QR rendering to `data:image/png;base64,...` URIs.

use std::io::Cursor;

use anyhow::{anyhow, Context};
use barcoders::sym::code128::Code128;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{DynamicImage, GrayImage, ImageOutputFormat, Luma};
use qrcode::{Color, EcLevel, QrCode};

use crate::error::Error;

const DATA_URI_PREFIX: &str = "data:image/png;base64,";

// Roughly 0.25mm bars, 20mm height and 3mm quiet zone at 300 dpi.
const BAR_PX: u32 = 3;
const BAR_HEIGHT_PX: u32 = 236;
const BAR_QUIET_PX: u32 = 35;

const QR_MODULE_PX: u32 = 10;
const QR_QUIET_MODULES: u32 = 4;

const BLACK: Luma<u8> = Luma([0]);
const WHITE: Luma<u8> = Luma([255]);

fn png_data_uri(img: GrayImage) -> Result<String, Error> {
    let mut buf = Vec::new();
    DynamicImage::ImageLuma8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Png)
        .context("failed to encode png")?;
    Ok(format!("{}{}", DATA_URI_PREFIX, STANDARD.encode(buf)))
}

/// Code128 (character set B) barcode.
pub fn barcode_png(data: &str) -> Result<String, Error> {
    let code = Code128::new(format!("\u{0181}{}", data)).map_err(|e| anyhow!("cannot encode {:?} as code128: {:?}", data, e))?;
    let modules = code.encode();
    let width = modules.len() as u32 * BAR_PX + 2 * BAR_QUIET_PX;
    let mut img = GrayImage::from_pixel(width, BAR_HEIGHT_PX, WHITE);
    for (i, _) in modules.iter().enumerate().filter(|(_, m)| **m == 1) {
        let left = BAR_QUIET_PX + i as u32 * BAR_PX;
        for x in left..left + BAR_PX {
            for y in 0..BAR_HEIGHT_PX {
                img.put_pixel(x, y, BLACK);
            }
        }
    }
    png_data_uri(img)
}

/// QR code at error-correction level H.
pub fn qr_png(data: &str) -> Result<String, Error> {
    let code = QrCode::with_error_correction_level(data.as_bytes(), EcLevel::H).map_err(|e| anyhow!("cannot encode qr code: {:?}", e))?;
    let modules = code.width() as u32;
    let side = (modules + 2 * QR_QUIET_MODULES) * QR_MODULE_PX;
    let mut img = GrayImage::from_pixel(side, side, WHITE);
    for (i, color) in code.to_colors().into_iter().enumerate() {
        if color != Color::Dark {
            continue;
        }
        let col = i as u32 % modules;
        let row = i as u32 / modules;
        let left = (col + QR_QUIET_MODULES) * QR_MODULE_PX;
        let top = (row + QR_QUIET_MODULES) * QR_MODULE_PX;
        for x in left..left + QR_MODULE_PX {
            for y in top..top + QR_MODULE_PX {
                img.put_pixel(x, y, BLACK);
            }
        }
    }
    png_data_uri(img)
}
