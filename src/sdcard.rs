//! SD 卡存储
//!
//! 通过 `embedded-sdmmc` 访问 FAT 卷的根目录。每次操作都重新打开卷和目录，
//! 句柄在作用域结束时关闭，拔卡后不会留下悬空句柄。

use alloc::string::ToString;
use alloc::vec::Vec;
use core::cell::RefCell;

use defmt::info;
use embassy_embedded_hal::shared_bus::blocking::spi::SpiDevice;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embedded_sdmmc::{Mode, SdCard, SdCardError, TimeSource, Timestamp, VolumeIdx, VolumeManager};
use esp_hal::Blocking;
use esp_hal::delay::Delay;
use esp_hal::gpio::Output;
use esp_hal::spi::master::Spi;

use esp_photo_frame::storage::{DirEntry, Storage};

pub type SdBus = Mutex<NoopRawMutex, RefCell<Spi<'static, Blocking>>>;
type SdSpi = SpiDevice<'static, NoopRawMutex, Spi<'static, Blocking>, Output<'static>>;
type Card = SdCard<SdSpi, Delay>;

/// 没有 RTC，文件时间戳固定为 FAT 零点
pub struct DummyTime;

impl TimeSource for DummyTime {
    fn get_timestamp(&self) -> Timestamp {
        Timestamp::from_fat(0, 0)
    }
}

#[derive(Debug)]
pub enum SdError {
    NotMounted,
    Fs(embedded_sdmmc::Error<SdCardError>),
}

impl defmt::Format for SdError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            SdError::NotMounted => defmt::write!(f, "card not mounted"),
            SdError::Fs(e) => defmt::write!(f, "filesystem error: {}", defmt::Debug2Format(e)),
        }
    }
}

impl From<embedded_sdmmc::Error<SdCardError>> for SdError {
    fn from(e: embedded_sdmmc::Error<SdCardError>) -> Self {
        SdError::Fs(e)
    }
}

pub struct SdStorage {
    manager: Option<VolumeManager<Card, DummyTime>>,
    mounted: bool,
}

impl SdStorage {
    pub fn new(bus: &'static SdBus, cs: Output<'static>) -> Self {
        let card = SdCard::new(SpiDevice::new(bus, cs), Delay::new());
        Self {
            manager: Some(VolumeManager::new(card, DummyTime)),
            mounted: false,
        }
    }

    fn manager(&self) -> Result<&VolumeManager<Card, DummyTime>, SdError> {
        match &self.manager {
            Some(manager) if self.mounted => Ok(manager),
            _ => Err(SdError::NotMounted),
        }
    }
}

impl Storage for SdStorage {
    type Error = SdError;

    /// 检测卡是否在位
    ///
    /// 已挂载时只读一次 CSD；未挂载时强制重新初始化卡，再确认卷 0 可以打开。
    fn mount(&mut self) -> bool {
        let Some(manager) = self.manager.take() else {
            return false;
        };
        let (card, time) = manager.free();

        if !self.mounted {
            card.mark_card_uninit();
        }
        let present = match card.num_bytes() {
            Ok(bytes) => {
                if !self.mounted {
                    info!("SD card detected, {} MiB", bytes / (1024 * 1024));
                }
                true
            }
            Err(_) => {
                card.mark_card_uninit();
                false
            }
        };

        let manager = VolumeManager::new(card, time);
        self.mounted = present && manager.open_volume(VolumeIdx(0)).is_ok();
        self.manager = Some(manager);
        self.mounted
    }

    fn list_root(&mut self) -> Result<Vec<DirEntry>, SdError> {
        let volume = self.manager()?.open_volume(VolumeIdx(0))?;
        let root = volume.open_root_dir()?;

        let mut entries = Vec::new();
        root.iterate_dir(|entry| {
            entries.push(DirEntry {
                name: entry.name.to_string(),
                is_dir: entry.attributes.is_directory(),
            });
        })?;
        Ok(entries)
    }

    fn file_size(&mut self, name: &str) -> Result<usize, SdError> {
        let volume = self.manager()?.open_volume(VolumeIdx(0))?;
        let root = volume.open_root_dir()?;
        let file = root.open_file_in_dir(name, Mode::ReadOnly)?;
        Ok(file.length() as usize)
    }

    fn read(&mut self, name: &str, buf: &mut [u8]) -> Result<usize, SdError> {
        let volume = self.manager()?.open_volume(VolumeIdx(0))?;
        let root = volume.open_root_dir()?;
        let file = root.open_file_in_dir(name, Mode::ReadOnly)?;

        let mut total = 0;
        while total < buf.len() {
            let n = file.read(&mut buf[total..])?;
            if n == 0 {
                break;
            }
            total += n;
        }
        Ok(total)
    }
}
