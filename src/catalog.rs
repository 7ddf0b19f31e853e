//! 图片目录
//!
//! 固定容量的有序列表：先放内置图片，再按 SD 卡目录顺序追加解码成功的 JPEG。
//! SD 卡图片独占自己的像素缓冲区，描述符被移除时缓冲区随之释放。

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use crate::decode::{self, DecodeError, JpegDecoder, Raster};
use crate::embedded::EmbeddedImage;
use crate::storage::{FileKind, Storage};

/// 目录最多容纳的图片数
pub const CATALOG_CAPACITY: usize = 10;

/// 图片来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ImageSource {
    Embedded,
    SdCard,
}

/// 像素所有权：内置图片借用静态数据，SD 卡图片独占堆缓冲区
#[derive(Debug)]
enum Pixels {
    Embedded(&'static [u16]),
    SdCard(Box<[u16]>),
}

/// 目录中的一张图片
#[derive(Debug)]
pub struct ImageDescriptor {
    name: String,
    pixels: Pixels,
    width: u16,
    height: u16,
}

impl ImageDescriptor {
    pub fn embedded(image: &EmbeddedImage) -> Self {
        Self {
            name: image.name.into(),
            pixels: Pixels::Embedded(image.pixels),
            width: image.width,
            height: image.height,
        }
    }

    /// 接管解码结果的缓冲区
    pub fn from_card(name: &str, raster: Raster) -> Self {
        let width = raster.width() as u16;
        let height = raster.height() as u16;
        Self {
            name: name.into(),
            pixels: Pixels::SdCard(raster.into_pixels()),
            width,
            height,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> ImageSource {
        match self.pixels {
            Pixels::Embedded(_) => ImageSource::Embedded,
            Pixels::SdCard(_) => ImageSource::SdCard,
        }
    }

    pub fn pixels(&self) -> &[u16] {
        match &self.pixels {
            Pixels::Embedded(data) => data,
            Pixels::SdCard(data) => data,
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CatalogError {
    CapacityExceeded,
}

/// 单个文件加载失败的原因
#[derive(Debug, PartialEq, Eq)]
pub enum LoadError<E> {
    Storage(E),
    /// 文件读缓冲区分配失败
    AllocationFailed,
    Decode(DecodeError),
}

impl<E> LoadError<E> {
    pub fn describe(&self) -> &'static str {
        match self {
            LoadError::Storage(_) => "storage read failed",
            LoadError::AllocationFailed => "out of memory for file buffer",
            LoadError::Decode(DecodeError::OpenFailed) => "cannot open JPEG",
            LoadError::Decode(DecodeError::DecodeFailed) => "JPEG decode failed",
            LoadError::Decode(DecodeError::AllocationFailed) => "out of memory while decoding",
        }
    }
}

impl<E> From<DecodeError> for LoadError<E> {
    fn from(err: DecodeError) -> Self {
        LoadError::Decode(err)
    }
}

/// 一次目录扫描的统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScanReport {
    pub loaded: usize,
    pub unsupported: usize,
    pub failed: usize,
    /// 因目录已满提前结束
    pub stopped_full: bool,
}

/// 读入整个文件并解码
pub fn load_file<S, J>(storage: &mut S, decoder: &mut J, name: &str) -> Result<Raster, LoadError<S::Error>>
where
    S: Storage + ?Sized,
    J: JpegDecoder + ?Sized,
{
    let size = storage.file_size(name).map_err(LoadError::Storage)?;

    let mut data = Vec::new();
    data.try_reserve_exact(size)
        .map_err(|_| LoadError::AllocationFailed)?;
    data.resize(size, 0u8);

    let read = storage.read(name, &mut data).map_err(LoadError::Storage)?;
    data.truncate(read);

    Ok(decode::decode(decoder, &data)?)
}

pub struct Catalog {
    images: heapless::Vec<ImageDescriptor, CATALOG_CAPACITY>,
    current: usize,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    pub const fn new() -> Self {
        Self {
            images: heapless::Vec::new(),
            current: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.images.is_full()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> Option<&ImageDescriptor> {
        self.images.get(self.current)
    }

    pub fn get(&self, index: usize) -> Option<&ImageDescriptor> {
        self.images.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageDescriptor> {
        self.images.iter()
    }

    /// 切到下一张（循环），返回新的下标；目录为空时返回 `None`
    pub fn next(&mut self) -> Option<usize> {
        if self.images.is_empty() {
            return None;
        }
        self.current = (self.current + 1) % self.images.len();
        Some(self.current)
    }

    pub fn push(&mut self, image: ImageDescriptor) -> Result<(), CatalogError> {
        self.images
            .push(image)
            .map_err(|_| CatalogError::CapacityExceeded)
    }

    /// 追加内置图片，返回追加的数量
    pub fn scan_embedded(&mut self, images: &[EmbeddedImage]) -> usize {
        let mut added = 0;
        for image in images {
            if self.push(ImageDescriptor::embedded(image)).is_err() {
                break;
            }
            added += 1;
        }
        info!("{} embedded images registered", added);
        added
    }

    /// 扫描存储卡根目录，逐个解码 JPEG 并追加
    ///
    /// 单个文件失败只会被跳过；目录满时停止扫描。只有列目录失败才返回错误。
    pub fn scan_directory<S, J>(&mut self, storage: &mut S, decoder: &mut J) -> Result<ScanReport, S::Error>
    where
        S: Storage + ?Sized,
        J: JpegDecoder + ?Sized,
    {
        let mut report = ScanReport::default();
        if self.is_full() {
            report.stopped_full = true;
            return Ok(report);
        }

        let entries = storage.list_root()?;
        for entry in entries.iter().filter(|e| !e.is_dir) {
            if self.is_full() {
                info!("catalog full, scan stopped");
                report.stopped_full = true;
                break;
            }

            match FileKind::of(&entry.name) {
                FileKind::Jpeg => {
                    info!("loading JPEG: {}", entry.name.as_str());
                    match load_file(storage, decoder, &entry.name) {
                        Ok(raster) => {
                            // 上面已检查容量，这里不会失败
                            if self.push(ImageDescriptor::from_card(&entry.name, raster)).is_ok() {
                                report.loaded += 1;
                            }
                        }
                        Err(err) => {
                            warn!("skipping {}: {}", entry.name.as_str(), err.describe());
                            report.failed += 1;
                        }
                    }
                }
                FileKind::Unsupported => {
                    warn!("PNG/BMP not supported: {}", entry.name.as_str());
                    report.unsupported += 1;
                }
                FileKind::Other => {}
            }
        }

        info!("SD scan complete, loaded {} JPEG images", report.loaded);
        Ok(report)
    }

    /// 只保留内置图片，释放所有 SD 卡缓冲区，返回释放的数量
    pub fn retain_embedded(&mut self) -> usize {
        let before = self.images.len();
        self.images
            .retain(|image| image.source() == ImageSource::Embedded);
        self.current = 0;
        before - self.images.len()
    }

    pub fn rebuild_on_card_removed(&mut self) {
        let released = self.retain_embedded();
        info!("SD card removed, released {} images", released);
    }

    pub fn rebuild_on_card_inserted<S, J>(&mut self, storage: &mut S, decoder: &mut J) -> Result<ScanReport, S::Error>
    where
        S: Storage + ?Sized,
        J: JpegDecoder + ?Sized,
    {
        self.retain_embedded();
        self.scan_directory(storage, decoder)
    }
}
