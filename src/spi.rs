use esp_hal::gpio::interconnect::{PeripheralInput, PeripheralOutput};
use esp_hal::spi::master::{Config, ConfigError, Instance, Spi};
use esp_hal::spi::Mode;
use esp_hal::time::Rate;
use esp_hal::Blocking;

/// LCD 总线：只写，ST7789 使用 SPI 模式 3
pub fn lcd_bus(
    spi: impl Instance + 'static,
    sck: impl PeripheralOutput<'static>,
    mosi: impl PeripheralOutput<'static>,
) -> Result<Spi<'static, Blocking>, ConfigError> {
    let spi = Spi::new(
        spi,
        Config::default()
            .with_frequency(Rate::from_mhz(40))
            .with_mode(Mode::_3),
    )?
    .with_sck(sck)
    .with_mosi(mosi);
    Ok(spi)
}

/// SD 卡总线，片选由 `SpiDevice` 控制
pub fn sd_bus(
    spi: impl Instance + 'static,
    sck: impl PeripheralOutput<'static>,
    mosi: impl PeripheralOutput<'static>,
    miso: impl PeripheralInput<'static>,
) -> Result<Spi<'static, Blocking>, ConfigError> {
    let spi = Spi::new(
        spi,
        Config::default()
            .with_frequency(Rate::from_mhz(10))
            .with_mode(Mode::_0),
    )?
    .with_sck(sck)
    .with_mosi(mosi)
    .with_miso(miso);
    Ok(spi)
}
