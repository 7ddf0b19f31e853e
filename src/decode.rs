//! JPEG 解码变换流水线
//!
//! 流程：解析 JPEG 头 -> 选择解码器内置缩放 -> 解码到临时缓冲区 ->
//! 旋转 270°（顺时针）-> 等比缩放 -> 居中贴入 135x240 黑底画布（letterbox）。
//!
//! 重采样是最近邻前向映射，放大时目标像素之间会留下空隙，这是已知的画质限制。

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::{DISPLAY_HEIGHT, DISPLAY_WIDTH};

/// letterbox 背景色（RGB565 黑色）
pub const BACKGROUND: u16 = 0x0000;

/// 解码错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// JPEG 头无法解析
    OpenFailed,
    /// 码流解码失败
    DecodeFailed,
    /// 缓冲区分配失败
    AllocationFailed,
}

/// JPEG 头信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegHeader {
    pub width: u16,
    pub height: u16,
}

/// 解码器内置的 2 的幂次缩放
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeScale {
    Full,
    Half,
    Quarter,
    Eighth,
}

impl DecodeScale {
    pub const fn divisor(self) -> usize {
        match self {
            DecodeScale::Full => 1,
            DecodeScale::Half => 2,
            DecodeScale::Quarter => 4,
            DecodeScale::Eighth => 8,
        }
    }

    /// 选择比例不大于 `num / den` 的最粗缩放
    pub fn coarsest_within(num: usize, den: usize) -> DecodeScale {
        [DecodeScale::Eighth, DecodeScale::Quarter, DecodeScale::Half]
            .into_iter()
            .find(|scale| scale.divisor() * num <= den)
            .unwrap_or(DecodeScale::Full)
    }

    /// 下一档更精细的缩放，`Full` 没有更精细的一档
    pub const fn finer(self) -> Option<DecodeScale> {
        match self {
            DecodeScale::Full => None,
            DecodeScale::Half => Some(DecodeScale::Full),
            DecodeScale::Quarter => Some(DecodeScale::Half),
            DecodeScale::Eighth => Some(DecodeScale::Quarter),
        }
    }
}

/// 解码回调交付的一块像素
///
/// `pixels` 按行存放，行宽为 `width`。
#[derive(Debug, Clone, Copy)]
pub struct Tile<'a> {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
    pub pixels: &'a [u16],
}

/// JPEG 码流解码引擎
pub trait JpegDecoder {
    /// 解析 JPEG 头
    ///
    /// 头无法解析时返回 `OpenFailed`；图片超出引擎的内存预算时返回
    /// `AllocationFailed`，调用方据此跳过而不去尝试解码。
    fn header(&mut self, data: &[u8]) -> Result<JpegHeader, DecodeError>;

    /// 以 `scale` 解码整幅图片，按块回调 `draw`；码流错误时返回 `false`
    fn decode(&mut self, data: &[u8], scale: DecodeScale, draw: &mut dyn FnMut(&Tile<'_>)) -> bool;
}

/// 固定尺寸的 RGB565 光栅，像素按行存放
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: usize,
    height: usize,
    pixels: Box<[u16]>,
}

impl Raster {
    /// 分配并填充背景色；内存不足时返回 `AllocationFailed`
    pub fn try_new(width: usize, height: usize, fill: u16) -> Result<Self, DecodeError> {
        let len = width * height;
        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(len)
            .map_err(|_| DecodeError::AllocationFailed)?;
        pixels.resize(len, fill);
        Ok(Self {
            width,
            height,
            pixels: pixels.into_boxed_slice(),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[u16] {
        &self.pixels
    }

    #[cfg(test)]
    pub fn pixel(&self, x: usize, y: usize) -> Option<u16> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[y * self.width + x])
    }

    pub fn into_pixels(self) -> Box<[u16]> {
        self.pixels
    }

    /// 把一块解码输出拷入光栅，越界部分裁掉
    fn blit(&mut self, tile: &Tile<'_>) {
        if tile.x >= self.width || tile.y >= self.height {
            return;
        }
        let copy_width = tile.width.min(self.width - tile.x);
        let rows = tile.height.min(self.height - tile.y);
        for row in 0..rows {
            let src = row * tile.width;
            let Some(line) = tile.pixels.get(src..src + copy_width) else {
                break;
            };
            let dst = (tile.y + row) * self.width + tile.x;
            self.pixels[dst..dst + copy_width].copy_from_slice(line);
        }
    }
}

/// 旋转后贴入画布所需的几何参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub scale: DecodeScale,
    /// 临时缓冲区尺寸（解码器缩放后的原始方向）
    pub temp_width: usize,
    pub temp_height: usize,
    /// 旋转缩放后的图像尺寸
    pub final_width: usize,
    pub final_height: usize,
    pub offset_x: usize,
    pub offset_y: usize,
}

impl Placement {
    /// 计算 `src_width x src_height` 的图片旋转后放进 `display_width x display_height` 的布局
    ///
    /// 旋转 90° 后宽高互换，所以缩放比取 `display_width / src_height` 与
    /// `display_height / src_width` 的较小者，以有理数 `num / den` 表示避免浮点。
    pub fn compute(
        src_width: usize,
        src_height: usize,
        display_width: usize,
        display_height: usize,
    ) -> Option<Self> {
        if src_width == 0 || src_height == 0 {
            return None;
        }

        let (num, den) = if display_width * src_width <= display_height * src_height {
            (display_width, src_height)
        } else {
            (display_height, src_width)
        };

        // 极细长的图片短边会缩到 0，至少保留一行
        let final_width = rounded_ratio(src_height, num, den).clamp(1, display_width);
        let final_height = rounded_ratio(src_width, num, den).clamp(1, display_height);

        // 短边在粗缩放下不足一个像素时退回更精细的一档
        let mut scale = DecodeScale::coarsest_within(num, den);
        while src_width / scale.divisor() == 0 || src_height / scale.divisor() == 0 {
            scale = scale.finer()?;
        }
        let temp_width = src_width / scale.divisor();
        let temp_height = src_height / scale.divisor();

        Some(Self {
            scale,
            temp_width,
            temp_height,
            final_width,
            final_height,
            offset_x: (display_width - final_width) / 2,
            offset_y: (display_height - final_height) / 2,
        })
    }

    /// 临时缓冲区坐标映射到画布坐标（270° 顺时针旋转 + 缩放 + 居中）
    pub fn map(&self, src_x: usize, src_y: usize) -> (usize, usize) {
        let rotated_x = self.temp_height - 1 - src_y;
        let rotated_y = src_x;
        let x = rotated_x * self.final_width / self.temp_height + self.offset_x;
        let y = rotated_y * self.final_height / self.temp_width + self.offset_y;
        (x, y)
    }
}

fn rounded_ratio(value: usize, num: usize, den: usize) -> usize {
    (2 * value * num + den) / (2 * den)
}

/// 解码到 135x240 显示画布
pub fn decode<J: JpegDecoder + ?Sized>(decoder: &mut J, data: &[u8]) -> Result<Raster, DecodeError> {
    decode_to(decoder, data, DISPLAY_WIDTH, DISPLAY_HEIGHT)
}

/// 解码到任意尺寸的画布
///
/// 临时缓冲区只在本函数内存活，任何出错路径都会随作用域释放。
pub fn decode_to<J: JpegDecoder + ?Sized>(
    decoder: &mut J,
    data: &[u8],
    display_width: usize,
    display_height: usize,
) -> Result<Raster, DecodeError> {
    let header = decoder.header(data)?;
    debug!("JPEG header: {}x{}", header.width, header.height);

    let placement = Placement::compute(
        header.width as usize,
        header.height as usize,
        display_width,
        display_height,
    )
    .ok_or(DecodeError::OpenFailed)?;
    debug!(
        "target {}x{} at ({}, {}), decode scale 1/{}",
        placement.final_width,
        placement.final_height,
        placement.offset_x,
        placement.offset_y,
        placement.scale.divisor()
    );

    let mut canvas = Raster::try_new(display_width, display_height, BACKGROUND)?;
    let mut temp = Raster::try_new(placement.temp_width, placement.temp_height, BACKGROUND)?;

    if !decoder.decode(data, placement.scale, &mut |tile| temp.blit(tile)) {
        return Err(DecodeError::DecodeFailed);
    }

    for src_y in 0..placement.temp_height {
        let row = &temp.pixels[src_y * placement.temp_width..(src_y + 1) * placement.temp_width];
        for (src_x, &color) in row.iter().enumerate() {
            let (x, y) = placement.map(src_x, src_y);
            if x < display_width && y < display_height {
                canvas.pixels[y * display_width + x] = color;
            }
        }
    }

    Ok(canvas)
}
