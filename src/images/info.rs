// Image header probing
//
// Reads the pixel size and resolution of a bitmap payload without decoding
// it. Used to compute the natural size of a picture when resizing its anchor.
// Images that declare no resolution, or a resolution of zero, report `None`
// and are treated as 96 DPI by callers.

use super::blip::PictureType;
use crate::common::binary::{read_i32_le, read_u32_le};

/// Resolution assumed when an image does not declare a usable one.
pub const DEFAULT_DPI: u32 = 96;

const INCHES_PER_METER: f64 = 39.3701;

/// Pixel dimensions and resolution of a bitmap picture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Horizontal resolution, if declared and non-zero
    pub dpi_x: Option<u32>,
    /// Vertical resolution, if declared and non-zero
    pub dpi_y: Option<u32>,
}

impl ImageInfo {
    /// Probe the header of `data`. Returns `None` for metafiles, TIFF and
    /// headers that cannot be read.
    pub fn probe(picture_type: PictureType, data: &[u8]) -> Option<Self> {
        match picture_type {
            PictureType::Png => probe_png(data),
            PictureType::Jpeg => probe_jpeg(data),
            PictureType::Dib => probe_dib(data),
            _ => None,
        }
    }

    /// Resolution to use for layout, falling back to [`DEFAULT_DPI`].
    pub fn effective_dpi(&self) -> (u32, u32) {
        (
            self.dpi_x.unwrap_or(DEFAULT_DPI),
            self.dpi_y.unwrap_or(DEFAULT_DPI),
        )
    }

    /// Size in screen pixels (96 DPI), scaled from the declared resolution.
    pub fn screen_size(&self) -> (f64, f64) {
        let (dpi_x, dpi_y) = self.effective_dpi();
        (
            self.width as f64 * DEFAULT_DPI as f64 / dpi_x as f64,
            self.height as f64 * DEFAULT_DPI as f64 / dpi_y as f64,
        )
    }
}

fn be_u16(data: &[u8], offset: usize) -> Option<u16> {
    let bytes = data.get(offset..offset + 2)?;
    Some(u16::from_be_bytes([bytes[0], bytes[1]]))
}

fn be_u32(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset + 4)?;
    Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn non_zero(dpi: u32) -> Option<u32> {
    (dpi > 0).then_some(dpi)
}

fn per_meter_to_dpi(per_meter: u32) -> Option<u32> {
    non_zero((per_meter as f64 / INCHES_PER_METER).round() as u32)
}

fn probe_png(data: &[u8]) -> Option<ImageInfo> {
    // Signature (8) + IHDR length (4) + "IHDR" (4)
    if data.get(12..16)? != b"IHDR" {
        return None;
    }
    let mut info = ImageInfo {
        width: be_u32(data, 16)?,
        height: be_u32(data, 20)?,
        dpi_x: None,
        dpi_y: None,
    };

    let mut offset = 8;
    while let Some(length) = be_u32(data, offset) {
        let chunk_type = data.get(offset + 4..offset + 8)?;
        let body = offset + 8;
        match chunk_type {
            b"pHYs" => {
                // Unit 1 means pixels per meter; unit 0 is an aspect ratio only.
                if data.get(body + 8) == Some(&1) {
                    info.dpi_x = per_meter_to_dpi(be_u32(data, body)?);
                    info.dpi_y = per_meter_to_dpi(be_u32(data, body + 4)?);
                }
                break;
            },
            b"IDAT" | b"IEND" => break,
            _ => {},
        }
        // body + crc
        offset = body.checked_add(length as usize)?.checked_add(4)?;
    }

    Some(info)
}

fn probe_jpeg(data: &[u8]) -> Option<ImageInfo> {
    if !data.starts_with(&[0xFF, 0xD8]) {
        return None;
    }

    let mut dpi = (None, None);
    let mut offset = 2;
    while offset + 4 <= data.len() {
        if data[offset] != 0xFF {
            return None;
        }
        let marker = data[offset + 1];
        if marker == 0xFF {
            // fill byte
            offset += 1;
            continue;
        }
        let length = be_u16(data, offset + 2)? as usize;
        let segment = offset + 4;

        match marker {
            0xE0 if data.get(segment..segment + 5) == Some(&b"JFIF\0"[..]) => {
                let units = *data.get(segment + 7)?;
                let x = be_u16(data, segment + 8)? as u32;
                let y = be_u16(data, segment + 10)? as u32;
                dpi = match units {
                    1 => (non_zero(x), non_zero(y)),
                    // dots per centimeter
                    2 => (
                        non_zero((x as f64 * 2.54).round() as u32),
                        non_zero((y as f64 * 2.54).round() as u32),
                    ),
                    _ => (None, None),
                };
            },
            0xC0..=0xCF if !matches!(marker, 0xC4 | 0xC8 | 0xCC) => {
                return Some(ImageInfo {
                    height: be_u16(data, segment + 1)? as u32,
                    width: be_u16(data, segment + 3)? as u32,
                    dpi_x: dpi.0,
                    dpi_y: dpi.1,
                });
            },
            0xD9 | 0xDA => return None,
            _ => {},
        }
        offset = (segment + length).checked_sub(2)?;
    }

    None
}

fn probe_dib(data: &[u8]) -> Option<ImageInfo> {
    // Skip a BITMAPFILEHEADER if the payload is a complete .bmp file
    let header = if data.starts_with(b"BM") {
        data.get(14..)?
    } else {
        data
    };
    if read_u32_le(header, 0).ok()? < 40 {
        return None;
    }

    let width = read_i32_le(header, 4).ok()?;
    let height = read_i32_le(header, 8).ok()?;
    let x_ppm = read_i32_le(header, 24).ok()?;
    let y_ppm = read_i32_le(header, 28).ok()?;

    Some(ImageInfo {
        width: width.unsigned_abs(),
        height: height.unsigned_abs(),
        dpi_x: per_meter_to_dpi(x_ppm.max(0) as u32),
        dpi_y: per_meter_to_dpi(y_ppm.max(0) as u32),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Minimal PNG header: signature, IHDR, optional pHYs.
    pub(crate) fn png_header(width: u32, height: u32, phys: Option<(u32, u32)>) -> Vec<u8> {
        let mut data = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        data.extend_from_slice(&13u32.to_be_bytes());
        data.extend_from_slice(b"IHDR");
        data.extend_from_slice(&width.to_be_bytes());
        data.extend_from_slice(&height.to_be_bytes());
        data.extend_from_slice(&[8, 6, 0, 0, 0]);
        data.extend_from_slice(&[0; 4]);
        if let Some((x, y)) = phys {
            data.extend_from_slice(&9u32.to_be_bytes());
            data.extend_from_slice(b"pHYs");
            data.extend_from_slice(&x.to_be_bytes());
            data.extend_from_slice(&y.to_be_bytes());
            data.push(1);
            data.extend_from_slice(&[0; 4]);
        }
        data.extend_from_slice(&0u32.to_be_bytes());
        data.extend_from_slice(b"IEND");
        data.extend_from_slice(&[0; 4]);
        data
    }

    #[test]
    fn test_png_without_phys() {
        let info = ImageInfo::probe(PictureType::Png, &png_header(100, 50, None)).unwrap();
        assert_eq!((info.width, info.height), (100, 50));
        assert_eq!(info.dpi_x, None);
        assert_eq!(info.effective_dpi(), (96, 96));
    }

    #[test]
    fn test_png_with_phys() {
        // 3780 px/m = 96 DPI, 7559 px/m = 192 DPI
        let data = png_header(200, 100, Some((3780, 7559)));
        let info = ImageInfo::probe(PictureType::Png, &data).unwrap();
        assert_eq!(info.dpi_x, Some(96));
        assert_eq!(info.dpi_y, Some(192));
        assert_eq!(info.screen_size(), (200.0, 50.0));
    }

    #[test]
    fn test_png_with_zero_dpi() {
        let data = png_header(64, 64, Some((0, 0)));
        let info = ImageInfo::probe(PictureType::Png, &data).unwrap();
        assert_eq!(info.dpi_x, None);
        assert_eq!(info.screen_size(), (64.0, 64.0));
    }

    #[test]
    fn test_jpeg() {
        let mut data = vec![0xFF, 0xD8];
        // APP0 JFIF, 72 DPI
        data.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x10]);
        data.extend_from_slice(b"JFIF\0");
        data.extend_from_slice(&[1, 1, 1, 0, 72, 0, 72, 0, 0]);
        // SOF0: precision, height=30, width=40
        data.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x0B, 8, 0, 30, 0, 40, 1, 1, 0x11, 0]);

        let info = ImageInfo::probe(PictureType::Jpeg, &data).unwrap();
        assert_eq!((info.width, info.height), (40, 30));
        assert_eq!(info.effective_dpi(), (72, 72));
    }

    #[test]
    fn test_dib() {
        let mut data = vec![0u8; 40];
        data[0] = 40;
        data[4..8].copy_from_slice(&16i32.to_le_bytes());
        data[8..12].copy_from_slice(&(-8i32).to_le_bytes());
        let info = ImageInfo::probe(PictureType::Dib, &data).unwrap();
        assert_eq!((info.width, info.height), (16, 8));
        assert_eq!(info.dpi_x, None);
    }

    #[test]
    fn test_unreadable() {
        assert_eq!(ImageInfo::probe(PictureType::Png, &[1, 2, 3]), None);
        assert_eq!(ImageInfo::probe(PictureType::Jpeg, &[0xFF, 0xD8]), None);
        assert_eq!(ImageInfo::probe(PictureType::Emf, &[0; 64]), None);
    }
}
