use std::fs::OpenOptions;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::time::Duration;

use serialport::SerialPort;
use tracing::debug;

use crate::core::{Error, Result, UartSettings};

/// Raw byte channel to the companion radio plus its power-enable control
///
/// Implementations must not block on reads: [`Transport::read_available`]
/// returns whatever is pending, possibly nothing, so the command engine can
/// poll on its own schedule.
pub trait Transport: Send {
    /// Enables module power and (re)configures the UART
    fn power_on(&mut self) -> Result<()>;

    /// Drops the UART and cuts module power
    fn power_off(&mut self) -> Result<()>;

    /// Whether the module is currently powered
    fn is_powered(&self) -> bool;

    /// Writes raw bytes to the module
    fn write(&mut self, bytes: &[u8]) -> Result<()>;

    /// Reads pending bytes without blocking, returning how many were read
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize>;
}

/// Controls the module's power-enable line
pub trait PowerSwitch: Send {
    /// Drives the enable line high or low
    fn set(&mut self, enabled: bool) -> Result<()>;
}

/// Power-enable line exposed through the sysfs GPIO interface
pub struct SysfsPowerPin {
    value_path: PathBuf,
}

impl SysfsPowerPin {
    /// Creates a switch writing to `/sys/class/gpio/gpio<N>/value`
    pub fn new(gpio: u32) -> Self {
        SysfsPowerPin {
            value_path: PathBuf::from(format!("/sys/class/gpio/gpio{}/value", gpio)),
        }
    }
}

impl PowerSwitch for SysfsPowerPin {
    fn set(&mut self, enabled: bool) -> Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .open(&self.value_path)
            .map_err(|e| {
                Error::transport(format!(
                    "failed to open power pin {}: {}",
                    self.value_path.display(),
                    e
                ))
            })?;
        file.write_all(if enabled { b"1" } else { b"0" })?;
        Ok(())
    }
}

/// Serial transport to the companion radio
///
/// The UART is opened on power-up and dropped on power-down; reopening
/// reapplies the configured settings, so a module that was power-cycled for
/// idle savings comes back with a freshly configured port.
pub struct SerialTransport {
    settings: UartSettings,
    power: Option<Box<dyn PowerSwitch>>,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialTransport {
    /// Creates a transport without a power-enable line
    pub fn new(settings: UartSettings) -> Self {
        SerialTransport {
            settings,
            power: None,
            port: None,
        }
    }

    /// Creates a transport that toggles `power` around the UART lifetime
    pub fn with_power_switch(settings: UartSettings, power: Box<dyn PowerSwitch>) -> Self {
        SerialTransport {
            settings,
            power: Some(power),
            port: None,
        }
    }
}

impl Transport for SerialTransport {
    fn power_on(&mut self) -> Result<()> {
        if self.port.is_some() {
            return Ok(());
        }
        if let Some(power) = self.power.as_mut() {
            power.set(true)?;
        }
        let port = serialport::new(&self.settings.device, self.settings.baud_rate)
            .timeout(Duration::from_millis(10))
            .open()
            .map_err(|e| {
                Error::transport(format!("failed to open {}: {}", self.settings.device, e))
            })?;
        debug!(
            "opened {} at {} baud",
            self.settings.device, self.settings.baud_rate
        );
        self.port = Some(port);
        Ok(())
    }

    fn power_off(&mut self) -> Result<()> {
        if self.port.take().is_some() {
            debug!("closed {}", self.settings.device);
        }
        if let Some(power) = self.power.as_mut() {
            power.set(false)?;
        }
        Ok(())
    }

    fn is_powered(&self) -> bool {
        self.port.is_some()
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        match self.port.as_mut() {
            Some(port) => {
                port.write_all(bytes)?;
                Ok(())
            }
            None => Err(Error::invalid_state("write while module is powered off")),
        }
    }

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize> {
        let port = match self.port.as_mut() {
            Some(port) => port,
            None => return Err(Error::invalid_state("read while module is powered off")),
        };
        let pending = port
            .bytes_to_read()
            .map_err(|e| Error::transport(format!("serial status: {}", e)))?
            as usize;
        if pending == 0 {
            return Ok(0);
        }
        let limit = pending.min(buf.len());
        match port.read(&mut buf[..limit]) {
            Ok(count) => Ok(count),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e.into()),
        }
    }
}
