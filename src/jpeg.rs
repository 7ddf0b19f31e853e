//! 基于 `zune-jpeg` 的 JPEG 解码引擎
//!
//! `zune-jpeg` 没有解码期缩放，这里先整幅解码为 RGB，再按 1/2、1/4、1/8
//! 抽样成 RGB565 行块交给回调，对流水线而言和带硬件缩放的解码器等价。
//!
//! 代价是整幅 RGB 缓冲区，而 `zune-jpeg` 内部的分配失败无法恢复，所以解析头
//! 时按 [`decode_cost`] 估算峰值内存，超出 [`MAX_DECODE_BYTES`] 的图片直接报
//! `AllocationFailed`。预算约合 37 万像素，640x480 以内的图片可以加载。

use alloc::vec::Vec;

use zune_jpeg::JpegDecoder as ZuneJpeg;
use zune_jpeg::zune_core::colorspace::ColorSpace;
use zune_jpeg::zune_core::options::DecoderOptions;

use crate::decode::{DecodeError, DecodeScale, JpegDecoder, JpegHeader, Tile};

/// 解码器允许的最大边长，超出的图片在解析头时即被拒绝
pub const MAX_DIMENSION: usize = 4096;

/// 单次解码允许占用的堆内存上限
pub const MAX_DECODE_BYTES: usize = 1280 * 1024;

/// 输出按 RGB 三通道计
const OUTPUT_CHANNELS: usize = 3;

/// 整幅解码的峰值内存估算：RGB 输出缓冲区，外加每像素半字节的分量缓冲
pub const fn decode_cost(width: usize, height: usize) -> usize {
    let pixels = width.saturating_mul(height);
    pixels
        .saturating_mul(OUTPUT_CHANNELS)
        .saturating_add(pixels / 2)
}

/// 888 转 565
pub const fn rgb565(r: u8, g: u8, b: u8) -> u16 {
    ((r as u16 >> 3) << 11) | ((g as u16 >> 2) << 5) | (b as u16 >> 3)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ZuneDecoder;

impl ZuneDecoder {
    pub const fn new() -> Self {
        Self
    }

    fn options() -> DecoderOptions {
        DecoderOptions::default()
            .jpeg_set_out_colorspace(ColorSpace::RGB)
            .set_max_width(MAX_DIMENSION)
            .set_max_height(MAX_DIMENSION)
    }

    /// 解析头并检查内存预算
    fn checked_header(decoder: &mut ZuneJpeg<&[u8]>) -> Result<JpegHeader, DecodeError> {
        decoder
            .decode_headers()
            .map_err(|_| DecodeError::OpenFailed)?;
        let (width, height) = decoder.dimensions().ok_or(DecodeError::OpenFailed)?;

        let cost = decode_cost(width, height);
        if cost > MAX_DECODE_BYTES {
            warn!(
                "{}x{} needs ~{} KiB to decode, budget is {} KiB",
                width,
                height,
                cost / 1024,
                MAX_DECODE_BYTES / 1024
            );
            return Err(DecodeError::AllocationFailed);
        }

        Ok(JpegHeader {
            width: u16::try_from(width).map_err(|_| DecodeError::OpenFailed)?,
            height: u16::try_from(height).map_err(|_| DecodeError::OpenFailed)?,
        })
    }
}

impl JpegDecoder for ZuneDecoder {
    fn header(&mut self, data: &[u8]) -> Result<JpegHeader, DecodeError> {
        let mut decoder = ZuneJpeg::new_with_options(data, Self::options());
        Self::checked_header(&mut decoder)
    }

    fn decode(&mut self, data: &[u8], scale: DecodeScale, draw: &mut dyn FnMut(&Tile<'_>)) -> bool {
        let mut decoder = ZuneJpeg::new_with_options(data, Self::options());
        if Self::checked_header(&mut decoder).is_err() {
            return false;
        }
        let pixels = match decoder.decode() {
            Ok(pixels) => pixels,
            Err(_) => {
                warn!("zune-jpeg rejected the bitstream");
                return false;
            }
        };
        let Some((width, height)) = decoder.dimensions() else {
            return false;
        };
        if width == 0 || height == 0 {
            return false;
        }

        // 灰度图可能按单通道输出
        let channels = pixels.len() / (width * height);
        if channels == 0 {
            return false;
        }

        let step = scale.divisor();
        let out_width = width.div_ceil(step);
        let out_height = height.div_ceil(step);

        let mut line: Vec<u16> = Vec::new();
        if line.try_reserve_exact(out_width).is_err() {
            return false;
        }

        for out_y in 0..out_height {
            line.clear();
            let row = out_y * step * width;
            for out_x in 0..out_width {
                let at = (row + out_x * step) * channels;
                let color = match channels {
                    1 | 2 => rgb565(pixels[at], pixels[at], pixels[at]),
                    _ => rgb565(pixels[at], pixels[at + 1], pixels[at + 2]),
                };
                line.push(color);
            }
            draw(&Tile {
                x: 0,
                y: out_y,
                width: out_width,
                height: 1,
                pixels: &line,
            });
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{self, BACKGROUND};
    use crate::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
    use alloc::vec;

    /// 编码一幅纯灰（128）的基线灰度 JPEG
    ///
    /// 量化表全 1，DC 和 AC 表各只有两个 2 位码字：DC 类别 0 是 `00`，
    /// AC 的 EOB 也是 `00`，所以每个 8x8 块是 4 个零位。
    fn gray_jpeg(width: u16, height: u16) -> Vec<u8> {
        let mut out = vec![0xFF, 0xD8];

        out.extend_from_slice(&[0xFF, 0xDB, 0x00, 67, 0x00]);
        out.extend_from_slice(&[1u8; 64]);

        let [wh, wl] = width.to_be_bytes();
        let [hh, hl] = height.to_be_bytes();
        out.extend_from_slice(&[0xFF, 0xC0, 0x00, 11, 8, hh, hl, wh, wl, 1, 1, 0x11, 0]);

        for class in [0x00, 0x10] {
            out.extend_from_slice(&[0xFF, 0xC4, 0x00, 21, class]);
            let mut counts = [0u8; 16];
            counts[1] = 2;
            out.extend_from_slice(&counts);
            out.extend_from_slice(&[0x00, 0x01]);
        }

        out.extend_from_slice(&[0xFF, 0xDA, 0x00, 8, 1, 1, 0x00, 0, 63, 0]);
        let blocks = (width as usize).div_ceil(8) * (height as usize).div_ceil(8);
        let bits = blocks * 4;
        out.extend(core::iter::repeat_n(0x00, bits / 8));
        if bits % 8 != 0 {
            // 剩余位用 1 填充
            out.push(0x0F);
        }

        out.extend_from_slice(&[0xFF, 0xD9]);
        out
    }

    #[test]
    fn budget_admits_vga_and_rejects_larger() {
        assert!(decode_cost(640, 480) <= MAX_DECODE_BYTES);
        assert!(decode_cost(800, 600) > MAX_DECODE_BYTES);
        assert!(decode_cost(4000, 3000) > MAX_DECODE_BYTES);
        assert_eq!(decode_cost(usize::MAX, 2), usize::MAX);
    }

    #[test]
    fn reads_header_of_real_jpeg() {
        let jpg = gray_jpeg(64, 48);
        let mut decoder = ZuneDecoder::new();
        assert_eq!(
            decoder.header(&jpg),
            Ok(JpegHeader {
                width: 64,
                height: 48
            })
        );
    }

    #[test]
    fn decodes_real_jpeg_to_display_raster() {
        let jpg = gray_jpeg(64, 48);
        let raster = decode::decode(&mut ZuneDecoder::new(), &jpg).unwrap();
        assert_eq!((raster.width(), raster.height()), (DISPLAY_WIDTH, DISPLAY_HEIGHT));

        let gray = rgb565(128, 128, 128);
        let painted = raster.pixels().iter().filter(|&&c| c == gray).count();
        // 64x48 放大后稀疏写入，每个源像素落在一个目标像素上
        assert_eq!(painted, 64 * 48);
        assert!(raster.pixels().iter().all(|&c| c == gray || c == BACKGROUND));
    }

    #[test]
    fn oversized_real_jpeg_is_refused_before_decoding() {
        let jpg = gray_jpeg(1600, 1200);
        let mut decoder = ZuneDecoder::new();
        assert_eq!(decoder.header(&jpg), Err(DecodeError::AllocationFailed));
        assert_eq!(
            decode::decode(&mut decoder, &jpg),
            Err(DecodeError::AllocationFailed)
        );

        let mut tiles = 0;
        assert!(!decoder.decode(&jpg, DecodeScale::Eighth, &mut |_| tiles += 1));
        assert_eq!(tiles, 0);
    }

    #[test]
    fn converts_888_to_565() {
        assert_eq!(rgb565(0, 0, 0), 0x0000);
        assert_eq!(rgb565(255, 255, 255), 0xFFFF);
        assert_eq!(rgb565(255, 0, 0), 0xF800);
        assert_eq!(rgb565(0, 255, 0), 0x07E0);
        assert_eq!(rgb565(0, 0, 255), 0x001F);
        // FlipperZero 橙
        assert_eq!(rgb565(255, 140, 0), 0xFC60);
    }

    #[test]
    fn garbage_has_no_header() {
        let mut decoder = ZuneDecoder::new();
        assert_eq!(decoder.header(b"not a jpeg at all"), Err(DecodeError::OpenFailed));
        assert_eq!(decoder.header(&[]), Err(DecodeError::OpenFailed));
    }

    #[test]
    fn garbage_fails_to_decode() {
        let mut decoder = ZuneDecoder::new();
        let mut tiles = 0;
        let ok = decoder.decode(b"\x89PNG\r\n\x1a\n", DecodeScale::Full, &mut |_| tiles += 1);
        assert!(!ok);
        assert_eq!(tiles, 0);
    }
}
