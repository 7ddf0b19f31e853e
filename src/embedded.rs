//! 编译进固件的图片
//!
//! 启用 `embedded-images` feature 时提供一张 135x240 的彩条测试卡，
//! 否则列表为空，目录只从 SD 卡加载。

use crate::FRAME_PIXELS;
#[cfg(any(feature = "embedded-images", test))]
use crate::{DISPLAY_HEIGHT, DISPLAY_WIDTH};

/// 内置图片：已经是显示方向的 RGB565 数据
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedImage {
    pub name: &'static str,
    pub pixels: &'static [u16],
    pub width: u16,
    pub height: u16,
}

/// 彩条，横屏观看时从左到右依次排列
#[cfg_attr(not(any(feature = "embedded-images", test)), allow(dead_code))]
const BARS: [u16; 8] = [
    0xFFFF, // 白
    0xFFE0, // 黄
    0x07FF, // 青
    0x07E0, // 绿
    0xF81F, // 品红
    0xF800, // 红
    0x001F, // 蓝
    0x0000, // 黑
];

/// 生成彩条测试卡
///
/// 横屏的 x 轴对应竖屏的 y 轴，所以按行（y）分条。
#[cfg_attr(not(any(feature = "embedded-images", test)), allow(dead_code))]
const fn color_bars<const W: usize, const H: usize>() -> [u16; FRAME_PIXELS] {
    let mut pixels = [0u16; FRAME_PIXELS];
    let mut y = 0;
    while y < H {
        let color = BARS[y * BARS.len() / H];
        let mut x = 0;
        while x < W {
            pixels[y * W + x] = color;
            x += 1;
        }
        y += 1;
    }
    pixels
}

#[cfg(feature = "embedded-images")]
static TEST_CARD: [u16; FRAME_PIXELS] = color_bars::<DISPLAY_WIDTH, DISPLAY_HEIGHT>();

#[cfg(feature = "embedded-images")]
pub static EMBEDDED_IMAGES: &[EmbeddedImage] = &[EmbeddedImage {
    name: "test-card",
    pixels: &TEST_CARD,
    width: DISPLAY_WIDTH as u16,
    height: DISPLAY_HEIGHT as u16,
}];

#[cfg(not(feature = "embedded-images"))]
pub static EMBEDDED_IMAGES: &[EmbeddedImage] = &[];
