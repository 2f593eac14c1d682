use base64::{engine::general_purpose::STANDARD, Engine};
use image::{
    codecs::jpeg::JpegEncoder, imageops::FilterType, DynamicImage, ExtendedColorType, ImageEncoder,
};

use super::CameraError;

/// A frame ready for `/analyze_frame`: base64 JPEG without a data-URI prefix.
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    pub base64: String,
    pub width: u32,
    pub height: u32,
    pub jpeg_len: usize,
}

/// Draw `image` into a fixed `width × height` buffer and JPEG-encode it.
pub fn encode_frame(
    image: &DynamicImage,
    width: u32,
    height: u32,
    quality: u8,
) -> Result<EncodedFrame, CameraError> {
    let rgb = image.resize_exact(width, height, FilterType::Triangle).to_rgb8();

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, quality.clamp(1, 100))
        .write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
        .map_err(|err| CameraError::Encode(err.to_string()))?;

    Ok(EncodedFrame {
        base64: STANDARD.encode(&jpeg),
        width,
        height,
        jpeg_len: jpeg.len(),
    })
}
