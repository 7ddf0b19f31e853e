//! ST7789 SPI Display Driver
//!
//! Driver for the 135x240 ST7789 panel on the frame board. The visible area
//! sits at an offset inside the controller's 240x320 RAM, and the panel
//! needs colour inversion to show true colours.

use embedded_graphics::{
    draw_target::DrawTarget,
    pixelcolor::{Rgb565, raw::RawU16},
    prelude::*,
    primitives::Rectangle,
};
use esp_hal::{
    Blocking,
    delay::Delay,
    gpio::{Level, Output, OutputPin},
    spi::master::Spi,
};

// Command definitions for ST7789
const CMD_SWRESET: u8 = 0x01; // Software Reset
const CMD_SLPOUT: u8 = 0x11; // Sleep Out
const CMD_NORON: u8 = 0x13; // Normal Display Mode ON
const CMD_INVON: u8 = 0x21; // Display Inversion ON
const CMD_DISPON: u8 = 0x29; // Display ON
const CMD_CASET: u8 = 0x2A; // Column Address Set
const CMD_RASET: u8 = 0x2B; // Row Address Set
const CMD_RAMWR: u8 = 0x2C; // Memory Write
const CMD_MADCTL: u8 = 0x36; // Memory Data Access Control
const CMD_COLMOD: u8 = 0x3A; // Interface Pixel Format

/// 可见区域在显存中的偏移
const X_OFFSET: u16 = 52;
const Y_OFFSET: u16 = 40;

/// 批量写入的字节缓冲，512 个像素
const CHUNK_BYTES: usize = 1024;

/// ST7789 display driver
pub struct ST7789<'d> {
    spi: Spi<'d, Blocking>,
    cs: Output<'static>,
    dc: Output<'static>,
    rst: Option<Output<'static>>,
    backlight: Option<Output<'static>>,
    width: u16,
    height: u16,
    delay: Delay,
}

impl<'d> ST7789<'d> {
    /// Create a new ST7789 driver instance
    pub fn new(
        spi: Spi<'d, Blocking>,
        cs: impl OutputPin + 'static,
        dc: impl OutputPin + 'static,
        rst: Option<impl OutputPin + 'static>,
        width: u16,
        height: u16,
    ) -> Self {
        let cs = Output::new(cs, Level::High, Default::default());
        let dc = Output::new(dc, Level::Low, Default::default());
        let rst = rst.map(|rst| Output::new(rst, Level::High, Default::default()));

        Self {
            spi,
            cs,
            dc,
            rst,
            backlight: None,
            width,
            height,
            delay: Delay::new(),
        }
    }

    /// 背光引脚，初始为关闭
    pub fn with_backlight(mut self, pin: impl OutputPin + 'static) -> Self {
        self.backlight = Some(Output::new(pin, Level::Low, Default::default()));
        self
    }

    /// Initialize the display with default settings
    pub fn init(&mut self) -> Result<(), esp_hal::spi::Error> {
        // 1. 硬件复位，没有复位脚时用软件复位
        if let Some(rst) = &mut self.rst {
            rst.set_low();
            self.delay.delay_millis(10);
            rst.set_high();
            self.delay.delay_millis(120);
        } else {
            self.write_command(CMD_SWRESET, &[])?;
            self.delay.delay_millis(150);
        }

        // 2. 退出睡眠模式
        self.write_command(CMD_SLPOUT, &[])?;
        self.delay.delay_millis(120);

        // 3. 竖屏方向，RGB 顺序
        self.write_command(CMD_MADCTL, &[0x00])?;
        // 16-bit/pixel (RGB565)
        self.write_command(CMD_COLMOD, &[0x55])?;

        // PORCTRK: Porch Setting
        self.write_command(0xB2, &[0x0C, 0x0C, 0x00, 0x33, 0x33])?;
        // GATECTRL: Gate Control
        self.write_command(0xB7, &[0x35])?;
        // VCOMS: VCOM Setting
        self.write_command(0xBB, &[0x19])?;
        // LCMCTRL: LCM Control
        self.write_command(0xC0, &[0x2C])?;
        // VDVVRHEN: VDV and VRH Command Enable
        self.write_command(0xC2, &[0x01, 0xFF])?;
        // VRHS: VRH Set
        self.write_command(0xC3, &[0x12])?;
        // VDVS: VDV Set
        self.write_command(0xC4, &[0x20])?;
        // FRCTRL2: 60Hz
        self.write_command(0xC6, &[0x0F])?;
        // PWCTR1: Power Control 1
        self.write_command(0xD0, &[0xA4, 0xA1])?;

        // 正电压伽马校正
        self.write_command(
            0xE0,
            &[0xD0, 0x04, 0x0D, 0x11, 0x13, 0x2B, 0x3F, 0x54, 0x4C, 0x18, 0x0D, 0x0B, 0x1F, 0x23],
        )?;
        // 负电压伽马校正
        self.write_command(
            0xE1,
            &[0xD0, 0x04, 0x0C, 0x11, 0x13, 0x2C, 0x3F, 0x44, 0x51, 0x2F, 0x1F, 0x1F, 0x20, 0x23],
        )?;

        // 这块屏需要反色才能显示正确的颜色
        self.write_command(CMD_INVON, &[])?;
        self.write_command(CMD_NORON, &[])?;

        // 4. 开启显示
        self.write_command(CMD_DISPON, &[])?;
        self.delay.delay_millis(100);

        Ok(())
    }

    pub fn set_backlight(&mut self, on: bool) {
        if let Some(backlight) = &mut self.backlight {
            backlight.set_level(Level::from(on));
        }
    }

    /// Write a command to the display
    fn write_command(&mut self, cmd: u8, data: &[u8]) -> Result<(), esp_hal::spi::Error> {
        self.cs.set_low();
        self.dc.set_low(); // Command mode
        let mut result = self.spi.write(&[cmd]);

        if result.is_ok() && !data.is_empty() {
            self.dc.set_high(); // Data mode
            result = self.spi.write(data);
        }
        self.cs.set_high();

        result
    }

    /// 设置绘制窗口（可见区域坐标，含两端）并开始写显存
    fn begin_window(&mut self, x0: u16, y0: u16, x1: u16, y1: u16) -> Result<(), esp_hal::spi::Error> {
        let (x0, x1) = (x0 + X_OFFSET, x1 + X_OFFSET);
        let (y0, y1) = (y0 + Y_OFFSET, y1 + Y_OFFSET);

        self.write_command(
            CMD_CASET,
            &[(x0 >> 8) as u8, (x0 & 0xFF) as u8, (x1 >> 8) as u8, (x1 & 0xFF) as u8],
        )?;
        self.write_command(
            CMD_RASET,
            &[(y0 >> 8) as u8, (y0 & 0xFF) as u8, (y1 >> 8) as u8, (y1 & 0xFF) as u8],
        )?;
        self.write_command(CMD_RAMWR, &[])
    }

    /// 以大端序写入一串像素
    fn write_pixels(
        &mut self,
        pixels: impl IntoIterator<Item = u16>,
    ) -> Result<(), esp_hal::spi::Error> {
        let mut buffer = [0u8; CHUNK_BYTES];
        let mut len = 0;

        self.cs.set_low();
        self.dc.set_high(); // Data mode
        let mut result = Ok(());
        for color in pixels {
            buffer[len..len + 2].copy_from_slice(&color.to_be_bytes());
            len += 2;
            if len == buffer.len() {
                result = self.spi.write(&buffer);
                len = 0;
                if result.is_err() {
                    break;
                }
            }
        }
        if result.is_ok() && len > 0 {
            result = self.spi.write(&buffer[..len]);
        }
        self.cs.set_high();

        result
    }

    /// Draw a single pixel
    pub fn draw_pixel(&mut self, x: u16, y: u16, color: Rgb565) -> Result<(), esp_hal::spi::Error> {
        if x >= self.width || y >= self.height {
            return Ok(());
        }

        self.begin_window(x, y, x, y)?;
        self.write_pixels([RawU16::from(color).into_inner()])
    }

    /// Fill a rectangular region with a color, clipped to the screen
    pub fn fill_rectangle(
        &mut self,
        x: u16,
        y: u16,
        w: u16,
        h: u16,
        color: Rgb565,
    ) -> Result<(), esp_hal::spi::Error> {
        if x >= self.width || y >= self.height || w == 0 || h == 0 {
            return Ok(());
        }
        let x1 = x.saturating_add(w - 1).min(self.width - 1);
        let y1 = y.saturating_add(h - 1).min(self.height - 1);
        let count = (x1 - x + 1) as usize * (y1 - y + 1) as usize;

        self.begin_window(x, y, x1, y1)?;
        let color = RawU16::from(color).into_inner();
        self.write_pixels(core::iter::repeat_n(color, count))
    }

    /// 整屏写入一帧 RGB565，长度应为 `width * height`
    pub fn write_frame(&mut self, frame: &[u16]) -> Result<(), esp_hal::spi::Error> {
        let count = self.width as usize * self.height as usize;
        self.begin_window(0, 0, self.width - 1, self.height - 1)?;
        self.write_pixels(frame.iter().copied().take(count))
    }
}

impl<'d> DrawTarget for ST7789<'d> {
    type Color = Rgb565;
    type Error = esp_hal::spi::Error;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels.into_iter() {
            if coord.x < 0 || coord.y < 0 {
                continue;
            }
            self.draw_pixel(coord.x as u16, coord.y as u16, color)?;
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let area = area.intersection(&self.bounding_box());
        if area.is_zero_sized() {
            return Ok(());
        }
        self.fill_rectangle(
            area.top_left.x as u16,
            area.top_left.y as u16,
            area.size.width as u16,
            area.size.height as u16,
            color,
        )
    }
}

impl<'d> OriginDimensions for ST7789<'d> {
    fn size(&self) -> Size {
        Size::new(self.width as u32, self.height as u32)
    }
}
