// File: brewbot-core/src/notifier/qr.rs

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Luma};
use qrcode::QrCode;

use crate::Error;

/// Renders a voucher barcode into a PNG QR image suitable for inline
/// embedding in a message.
pub fn render_qr_png(barcode: &str) -> Result<Vec<u8>, Error> {
    let code = QrCode::new(barcode.as_bytes())
        .map_err(|e| Error::Notification(format!("QR encoding failed: {e}")))?;

    let img = code.render::<Luma<u8>>().min_dimensions(240, 240).build();

    let mut png = Vec::new();
    DynamicImage::ImageLuma8(img)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| Error::Notification(format!("QR render failed: {e}")))?;

    Ok(png)
}
