//! 状态画面与速度指示的绘制
//!
//! 全部以横屏（240x135）坐标绘制，橙底黑字的 FlipperZero 风格。

use core::fmt::Write;

use embedded_graphics::{
    mono_font::{
        MonoTextStyle,
        ascii::{FONT_6X10, FONT_10X20},
    },
    pixelcolor::Rgb565,
    prelude::*,
    primitives::{
        Line, PrimitiveStyle, PrimitiveStyleBuilder, Rectangle, StrokeAlignment, Triangle,
    },
    text::{Alignment, Text},
};

use crate::overlay::SpeedIndicator;
use crate::slideshow::{Mode, SPEED_LABELS, SpeedDirection};
use crate::surface::Landscape;

/// 前景橙色 (255, 140, 0)
pub const ORANGE: Rgb565 = Rgb565::new(31, 35, 0);
pub const BACKDROP: Rgb565 = Rgb565::BLACK;

const ICON_CENTER: Point = Point::new(120, 30);

/// 代替图片显示的全屏状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StatusScreen {
    NoCard,
    NoImages,
    Scanning,
    ManualMode,
    SlideshowMode,
}

impl StatusScreen {
    pub fn for_mode(mode: Mode) -> StatusScreen {
        match mode {
            Mode::Manual => StatusScreen::ManualMode,
            Mode::Slideshow => StatusScreen::SlideshowMode,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            StatusScreen::NoCard => "NO SD CARD",
            StatusScreen::NoImages => "NO IMAGES",
            StatusScreen::Scanning => "SCANNING",
            StatusScreen::ManualMode => "MANUAL MODE",
            StatusScreen::SlideshowMode => "SLIDESHOW",
        }
    }

    pub fn subtitle(self) -> &'static str {
        match self {
            StatusScreen::NoCard => "Insert SD card",
            StatusScreen::NoImages => "Add JPEG files",
            StatusScreen::Scanning => "Please wait...",
            StatusScreen::ManualMode => "Press to advance",
            StatusScreen::SlideshowMode => "Auto-advancing",
        }
    }
}

/// 在竖屏目标上绘制横屏状态画面
pub fn draw_status<D>(target: &mut D, status: StatusScreen) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565> + OriginDimensions,
{
    let mut view = Landscape::new(target);
    view.clear(BACKDROP)?;

    let size = view.size();
    Rectangle::new(Point::new(2, 2), Size::new(size.width - 4, size.height - 4))
        .into_styled(
            PrimitiveStyleBuilder::new()
                .stroke_color(ORANGE)
                .stroke_width(1)
                .stroke_alignment(StrokeAlignment::Inside)
                .build(),
        )
        .draw(&mut view)?;

    draw_icon(&mut view, status)?;

    let center_x = size.width as i32 / 2;
    Text::with_alignment(
        status.title(),
        Point::new(center_x, ICON_CENTER.y + 50),
        MonoTextStyle::new(&FONT_10X20, ORANGE),
        Alignment::Center,
    )
    .draw(&mut view)?;
    Text::with_alignment(
        status.subtitle(),
        Point::new(center_x, ICON_CENTER.y + 72),
        MonoTextStyle::new(&FONT_6X10, ORANGE),
        Alignment::Center,
    )
    .draw(&mut view)?;
    Ok(())
}

fn draw_icon<D>(view: &mut D, status: StatusScreen) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    let c = ICON_CENTER;
    let outline = PrimitiveStyle::with_stroke(ORANGE, 2);
    let cross = PrimitiveStyle::with_stroke(ORANGE, 3);
    let fill = PrimitiveStyle::with_fill(ORANGE);

    match status {
        StatusScreen::NoCard => {
            let card = Rectangle::with_center(c, Size::new(40, 30));
            card.into_styled(outline).draw(view)?;
            Rectangle::new(card.top_left + Point::new(32, -4), Size::new(8, 8))
                .into_styled(outline)
                .draw(view)?;
            draw_cross(view, card, cross)?;
        }
        StatusScreen::NoImages => {
            let folder = Rectangle::with_center(c, Size::new(36, 28));
            Rectangle::new(folder.top_left + Point::new(0, 6), Size::new(36, 22))
                .into_styled(outline)
                .draw(view)?;
            Rectangle::new(folder.top_left, Size::new(12, 8))
                .into_styled(outline)
                .draw(view)?;
            draw_cross(view, folder, cross)?;
        }
        StatusScreen::Scanning => {
            let start_x = c.x - 5 * 14 / 2;
            for i in 0..5 {
                let height = 10 + (i % 3) * 8;
                Rectangle::new(
                    Point::new(start_x + i as i32 * 14, c.y - height as i32 / 2),
                    Size::new(6, height),
                )
                .into_styled(fill)
                .draw(view)?;
            }
        }
        StatusScreen::ManualMode => {
            let palm = Point::new(c.x - 8, c.y + 5);
            Rectangle::new(palm, Size::new(16, 20))
                .into_styled(fill)
                .draw(view)?;
            for i in 0..4 {
                Rectangle::new(palm + Point::new(2 + i * 3, -12), Size::new(2, 12))
                    .into_styled(fill)
                    .draw(view)?;
            }
            Rectangle::new(palm + Point::new(-6, 5), Size::new(4, 10))
                .into_styled(fill)
                .draw(view)?;
        }
        StatusScreen::SlideshowMode => {
            Triangle::new(
                c + Point::new(-15, -12),
                c + Point::new(-15, 12),
                c + Point::new(10, 0),
            )
            .into_styled(fill)
            .draw(view)?;
            let speed_line = PrimitiveStyle::with_stroke(ORANGE, 2);
            for i in 0..3 {
                let x = c.x + 20 + i * 6;
                for dy in [-8, 0, 8] {
                    Line::new(Point::new(x, c.y + dy), Point::new(x + 8, c.y + dy))
                        .into_styled(speed_line)
                        .draw(view)?;
                }
            }
        }
    }
    Ok(())
}

fn draw_cross<D>(
    view: &mut D,
    around: Rectangle,
    style: PrimitiveStyle<Rgb565>,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    let tl = around.top_left - Point::new(5, 5);
    let br = around.top_left + around.size + Point::new(5, 5);
    Line::new(tl, br).into_styled(style).draw(view)?;
    Line::new(Point::new(br.x, tl.y), Point::new(tl.x, br.y))
        .into_styled(style)
        .draw(view)?;
    Ok(())
}

/// 速度指示面板在横屏上的位置
pub const SPEED_PANEL: Rectangle = Rectangle::new(Point::new(40, 92), Size::new(160, 32));

const LONGEST_LABEL: usize = {
    let mut longest = 0;
    let mut i = 0;
    while i < SPEED_LABELS.len() {
        if SPEED_LABELS[i].len() > longest {
            longest = SPEED_LABELS[i].len();
        }
        i += 1;
    }
    longest
};

/// "<< " + 档位 + " MAX"
const SPEED_TEXT_LEN: usize = 3 + LONGEST_LABEL + 4;

/// 面板文字，例如 `>> 0.5s MAX`
fn speed_text(indicator: &SpeedIndicator) -> heapless::String<SPEED_TEXT_LEN> {
    let (arrow, limit) = match indicator.direction {
        SpeedDirection::Faster => (">>", " MAX"),
        SpeedDirection::Slower => ("<<", " MIN"),
    };
    let mut text = heapless::String::new();
    let complete = write!(text, "{} {}", arrow, indicator.label()).is_ok()
        && (!indicator.limit_hit || text.push_str(limit).is_ok());
    if !complete {
        warn!("speed label truncated: {}", text.as_str());
    }
    text
}

/// 在当前画面上叠加速度指示面板
pub fn draw_speed<D>(target: &mut D, indicator: &SpeedIndicator) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565> + OriginDimensions,
{
    let mut view = Landscape::new(target);
    SPEED_PANEL
        .into_styled(
            PrimitiveStyleBuilder::new()
                .fill_color(BACKDROP)
                .stroke_color(ORANGE)
                .stroke_width(2)
                .stroke_alignment(StrokeAlignment::Inside)
                .build(),
        )
        .draw(&mut view)?;

    let text = speed_text(indicator);
    Text::with_alignment(
        &text,
        SPEED_PANEL.center() + Point::new(0, 6),
        MonoTextStyle::new(&FONT_10X20, ORANGE),
        Alignment::Center,
    )
    .draw(&mut view)?;
    Ok(())
}
