//! 纹理内容

use std::io::Cursor;

use anyhow::Context;

use super::Content;
use crate::core::math::Color;

/// 解码后的 RGBA8 纹理
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    key: String,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Texture {
    /// 创建纯色纹理
    pub fn solid(key: impl Into<String>, width: u32, height: u32, color: Color) -> Self {
        let rgba = color.to_rgba_u8();
        let pixels = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            key: key.into(),
            width,
            height,
            pixels,
        }
    }

    /// 从 PNG 等图像格式的字节解码
    pub fn from_bytes(key: impl Into<String>, bytes: &[u8]) -> anyhow::Result<Self> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();

        Ok(Self {
            key: key.into(),
            width,
            height,
            pixels: rgba.into_raw(),
        })
    }

    /// 编码为 PNG
    pub fn to_png_bytes(&self) -> anyhow::Result<Vec<u8>> {
        let buffer = image::RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
            .context("pixel buffer does not match texture dimensions")?;

        let mut bytes = Cursor::new(Vec::new());
        buffer.write_to(&mut bytes, image::ImageOutputFormat::Png)?;
        Ok(bytes.into_inner())
    }

    /// 内容键
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// RGBA8 像素数据，按行存储
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// 读取一个像素
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = ((y * self.width + x) * 4) as usize;
        let p = &self.pixels[offset..offset + 4];
        Some([p[0], p[1], p[2], p[3]])
    }
}

impl Content for Texture {
    const EXTENSION: &'static str = "png";

    fn decode(key: &str, bytes: Vec<u8>) -> anyhow::Result<Self> {
        Texture::from_bytes(key, &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_texture() {
        let texture = Texture::solid("flash", 2, 3, Color::from_rgba_u8(255, 0, 0, 255));
        assert_eq!(texture.width(), 2);
        assert_eq!(texture.height(), 3);
        assert_eq!(texture.pixels().len(), 24);
        assert_eq!(texture.pixel(1, 2), Some([255, 0, 0, 255]));
        assert_eq!(texture.pixel(2, 0), None);
    }

    #[test]
    fn test_png_decode() {
        let original = Texture::solid("ship", 4, 2, Color::from_rgba_u8(10, 20, 30, 255));
        let png = original.to_png_bytes().unwrap();

        let decoded = Texture::decode("ship", png).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(Texture::decode("broken", vec![0, 1, 2, 3]).is_err());
    }
}
