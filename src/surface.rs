//! 绘图表面
//!
//! [`Landscape`] 把任意竖屏 `DrawTarget` 包装成 240x135 的横屏坐标系，
//! 旋转方向与图片流水线一致。

use embedded_graphics::{
    draw_target::DrawTarget,
    pixelcolor::Rgb565,
    prelude::*,
    primitives::Rectangle,
};

#[cfg(test)]
pub(crate) use canvas::{Canvas, to_raw};

/// 内存中的 135x240 RGB565 帧缓冲，测试里代替屏幕
#[cfg(test)]
mod canvas {
    use alloc::vec;
    use alloc::vec::Vec;
    use core::convert::Infallible;

    use embedded_graphics::{
        pixelcolor::{Rgb565, raw::RawU16},
        prelude::*,
    };

    use crate::{DISPLAY_HEIGHT, DISPLAY_WIDTH};

    pub fn to_raw(color: Rgb565) -> u16 {
        RawU16::from(color).into_inner()
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Canvas {
        width: usize,
        height: usize,
        pixels: Vec<u16>,
    }

    impl Default for Canvas {
        fn default() -> Self {
            Self::new(DISPLAY_WIDTH, DISPLAY_HEIGHT)
        }
    }

    impl Canvas {
        pub fn new(width: usize, height: usize) -> Self {
            Self {
                width,
                height,
                pixels: vec![0; width * height],
            }
        }

        pub fn pixels(&self) -> &[u16] {
            &self.pixels
        }

        pub fn pixel(&self, x: usize, y: usize) -> Option<u16> {
            if x >= self.width || y >= self.height {
                return None;
            }
            Some(self.pixels[y * self.width + x])
        }

        /// 整帧拷入，长度不符时只拷重叠部分
        pub fn blit_frame(&mut self, frame: &[u16]) {
            let len = frame.len().min(self.pixels.len());
            self.pixels[..len].copy_from_slice(&frame[..len]);
        }
    }

    impl DrawTarget for Canvas {
        type Color = Rgb565;
        type Error = Infallible;

        fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
        where
            I: IntoIterator<Item = Pixel<Self::Color>>,
        {
            for Pixel(coord, color) in pixels {
                if coord.x < 0 || coord.y < 0 {
                    continue;
                }
                let (x, y) = (coord.x as usize, coord.y as usize);
                if x < self.width && y < self.height {
                    self.pixels[y * self.width + x] = to_raw(color);
                }
            }
            Ok(())
        }
    }

    impl OriginDimensions for Canvas {
        fn size(&self) -> Size {
            Size::new(self.width as u32, self.height as u32)
        }
    }
}

/// 横屏视图
///
/// 横屏坐标 `(x, y)` 映射到竖屏 `(W - 1 - y, x)`，W 为竖屏宽度。
pub struct Landscape<'a, D> {
    target: &'a mut D,
}

impl<'a, D> Landscape<'a, D>
where
    D: DrawTarget<Color = Rgb565> + OriginDimensions,
{
    pub fn new(target: &'a mut D) -> Self {
        Self { target }
    }

    fn portrait_width(&self) -> i32 {
        self.target.size().width as i32
    }

    fn to_portrait(&self, point: Point) -> Point {
        Point::new(self.portrait_width() - 1 - point.y, point.x)
    }
}

impl<D> DrawTarget for Landscape<'_, D>
where
    D: DrawTarget<Color = Rgb565> + OriginDimensions,
{
    type Color = Rgb565;
    type Error = D::Error;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let width = self.portrait_width();
        self.target.draw_iter(
            pixels
                .into_iter()
                .map(|Pixel(p, color)| Pixel(Point::new(width - 1 - p.y, p.x), color)),
        )
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let area = area.intersection(&self.bounding_box());
        let Some(bottom_right) = area.bottom_right() else {
            return Ok(());
        };
        // 横屏矩形的左下角是竖屏矩形的左上角
        let top_left = self.to_portrait(Point::new(area.top_left.x, bottom_right.y));
        let rotated = Rectangle::new(top_left, Size::new(area.size.height, area.size.width));
        self.target.fill_solid(&rotated, color)
    }
}

impl<D> OriginDimensions for Landscape<'_, D>
where
    D: DrawTarget<Color = Rgb565> + OriginDimensions,
{
    fn size(&self) -> Size {
        let size = self.target.size();
        Size::new(size.height, size.width)
    }
}
