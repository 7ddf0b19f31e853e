//! ESP32-S3 相框固件的核心逻辑
//!
//! 本 crate 不依赖任何硬件：JPEG 解码变换流水线、图片目录、按键手势状态机、
//! 幻灯片与叠加层控制都在这里实现，通过 [`JpegDecoder`](decode::JpegDecoder)、
//! [`Storage`](storage::Storage) 和 [`Screen`](app::Screen) 三个 trait 与板级代码对接。
//! 固件入口见 `src/main.rs`（需要启用 `firmware` feature）。

#![no_std]

extern crate alloc;

#[macro_use]
mod fmt;

pub mod app;
pub mod catalog;
pub mod decode;
pub mod embedded;
pub mod gesture;
pub mod jpeg;
pub mod overlay;
pub mod slideshow;
pub mod storage;
pub mod surface;
pub mod ui;

/// 屏幕物理宽度（竖屏方向）
pub const DISPLAY_WIDTH: usize = 135;
/// 屏幕物理高度（竖屏方向）
pub const DISPLAY_HEIGHT: usize = 240;
/// 一帧 RGB565 像素数
pub const FRAME_PIXELS: usize = DISPLAY_WIDTH * DISPLAY_HEIGHT;
