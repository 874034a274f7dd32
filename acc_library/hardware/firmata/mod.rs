//! Arduino board driven over Firmata
//!
//! The sketch on the board is FirmataExpress (StandardFirmata plus HC-SR04
//! support). Analog and sonar samples stream in continuously at the
//! configured sampling interval; reads return the most recent sample and
//! only block until the first one arrives.

pub mod protocol;

use acc_core::config::{AccConfig, PinConfig};
use acc_core::error::{AccError, AccResult};
use acc_core::hal::{
    AnalogInput, Board, Delay, DigitalOutput, DistanceSensor, Pin, PinMode, PwmOutput,
    StdDelay,
};
use protocol::{FirmataEvent, FirmataParser};
use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

const ANALOG_CHANNELS: usize = 16;
const READ_CHUNK: usize = 64;
const POLL_BACKOFF: Duration = Duration::from_millis(1);

/// Firmware identity reported during the handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareInfo {
    pub name: String,
    pub major: u8,
    pub minor: u8,
}

/// Firmata host over any byte transport
pub struct FirmataBoard<T: Read + Write> {
    transport: T,
    parser: FirmataParser,
    label: String,
    firmware: Option<FirmwareInfo>,

    analog: [Option<u16>; ANALOG_CHANNELS],
    sonar_trigger: u8,
    sonar_cm: Option<u16>,

    read_timeout: Duration,
    delay: StdDelay,
}

impl<T: Read + Write> FirmataBoard<T> {
    /// Wrap a transport without talking to the board yet
    pub fn new(transport: T, label: &str, config: &AccConfig) -> Self {
        Self {
            transport,
            parser: FirmataParser::new(),
            label: label.to_string(),
            firmware: None,
            analog: [None; ANALOG_CHANNELS],
            sonar_trigger: config.pins.ultrasonic_trigger.number(),
            sonar_cm: None,
            read_timeout: Duration::from_millis(config.board.read_timeout_ms),
            delay: StdDelay,
        }
    }

    /// Wrap a transport and run the handshake.
    ///
    /// Queries the firmware, sets the sampling interval and enables the
    /// ultrasonic sensor. Pin modes for buttons and outputs are left to
    /// `configure_pin`.
    pub fn connect(transport: T, label: &str, config: &AccConfig) -> AccResult<Self> {
        let mut board = Self::new(transport, label, config);
        board.handshake(config)?;
        Ok(board)
    }

    fn handshake(&mut self, config: &AccConfig) -> AccResult<()> {
        self.send(&protocol::query_firmware())
            .map_err(|e| AccError::Communication(format!("{}: {}", self.label, e)))?;

        let deadline = Instant::now() + self.read_timeout;
        while self.firmware.is_none() {
            self.poll()?;
            if self.firmware.is_some() {
                break;
            }
            if Instant::now() >= deadline {
                return Err(AccError::Communication(format!(
                    "no Firmata reply from {} within {} ms; is FirmataExpress flashed?",
                    self.label,
                    self.read_timeout.as_millis()
                )));
            }
            std::thread::sleep(POLL_BACKOFF);
        }

        if let Some(fw) = &self.firmware {
            tracing::info!(
                port = %self.label,
                firmware = %fw.name,
                version = %format!("{}.{}", fw.major, fw.minor),
                "board connected"
            );
        }

        self.send(&protocol::sampling_interval(config.board.sampling_interval_ms))
            .map_err(|e| AccError::Communication(e.to_string()))?;
        self.enable_sonar(&config.pins)
    }

    fn enable_sonar(&mut self, pins: &PinConfig) -> AccResult<()> {
        let trigger = pins.ultrasonic_trigger.number();
        let echo = pins.ultrasonic_echo.number();
        self.sonar_trigger = trigger;
        self.send(&protocol::sonar_config(trigger, echo))
            .map_err(|e| AccError::sensor("ultrasonic", e))
    }

    pub fn firmware(&self) -> Option<&FirmwareInfo> {
        self.firmware.as_ref()
    }

    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.transport.write_all(bytes)?;
        self.transport.flush()
    }

    /// Drain whatever the transport has buffered and apply the events
    fn poll(&mut self) -> AccResult<()> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match self.transport.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => {
                    let dropped = self.parser.dropped_bytes();
                    for event in self.parser.feed(&chunk[..n]) {
                        self.apply(event);
                    }
                    if self.parser.dropped_bytes() > dropped {
                        tracing::debug!(
                            port = %self.label,
                            dropped = self.parser.dropped_bytes() - dropped,
                            "discarded bytes outside a firmata message"
                        );
                    }
                    if n < chunk.len() {
                        break;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
                    ) =>
                {
                    break
                }
                Err(e) => {
                    return Err(AccError::Communication(format!(
                        "read from {} failed: {}",
                        self.label, e
                    )))
                }
            }
        }
        Ok(())
    }

    fn apply(&mut self, event: FirmataEvent) {
        match event {
            FirmataEvent::Analog { channel, value } => {
                if let Some(slot) = self.analog.get_mut(channel as usize) {
                    *slot = Some(value);
                }
            }
            FirmataEvent::Sonar {
                trigger,
                centimeters,
            } if trigger == self.sonar_trigger => {
                self.sonar_cm = Some(centimeters);
            }
            FirmataEvent::Firmware { major, minor, name } => {
                self.firmware = Some(FirmwareInfo { name, major, minor });
            }
            FirmataEvent::ProtocolVersion { major, minor } => {
                tracing::debug!(major, minor, "firmata protocol version");
            }
            other => tracing::trace!(event = ?other, "ignored firmata event"),
        }
    }

    /// Poll until `sample` yields a value or the read timeout passes
    fn wait_for<F>(&mut self, source: &str, sample: F) -> AccResult<u16>
    where
        F: Fn(&Self) -> Option<u16>,
    {
        self.poll().map_err(|e| AccError::sensor(source, e))?;
        if let Some(value) = sample(self) {
            return Ok(value);
        }

        let deadline = Instant::now() + self.read_timeout;
        loop {
            std::thread::sleep(POLL_BACKOFF);
            self.poll().map_err(|e| AccError::sensor(source, e))?;
            if let Some(value) = sample(self) {
                return Ok(value);
            }
            if Instant::now() >= deadline {
                return Err(AccError::sensor(
                    source,
                    format!("no sample within {} ms", self.read_timeout.as_millis()),
                ));
            }
        }
    }
}

#[cfg(feature = "serial-hardware")]
impl FirmataBoard<Box<dyn serialport::SerialPort>> {
    /// Open the configured serial port and run the handshake.
    ///
    /// Opening the port resets the Uno, so this waits `startup_delay_ms`
    /// before the first byte is sent.
    pub fn open(config: &AccConfig) -> AccResult<Self> {
        let port = serialport::new(&config.board.port, config.board.baud_rate)
            .timeout(POLL_BACKOFF)
            .open()
            .map_err(|e| {
                AccError::Communication(format!(
                    "failed to open {} at {} baud: {}",
                    config.board.port, config.board.baud_rate, e
                ))
            })?;

        tracing::debug!(
            port = %config.board.port,
            delay_ms = config.board.startup_delay_ms,
            "waiting for board reset"
        );
        std::thread::sleep(Duration::from_millis(config.board.startup_delay_ms));

        Self::connect(port, &config.board.port, config)
    }
}

/// A serial port the OS reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortListing {
    pub name: String,
    pub description: String,
}

/// Serial ports currently present, for picking `board.port`
#[cfg(feature = "serial-hardware")]
pub fn list_ports() -> AccResult<Vec<PortListing>> {
    use serialport::SerialPortType;

    let ports = serialport::available_ports()
        .map_err(|e| AccError::Communication(format!("failed to enumerate ports: {}", e)))?;

    Ok(ports
        .into_iter()
        .map(|info| {
            let description = match info.port_type {
                SerialPortType::UsbPort(usb) => {
                    let product = usb
                        .product
                        .or(usb.manufacturer)
                        .unwrap_or_else(|| "USB serial".to_string());
                    format!("{} ({:04x}:{:04x})", product, usb.vid, usb.pid)
                }
                SerialPortType::PciPort => "PCI".to_string(),
                SerialPortType::BluetoothPort => "Bluetooth".to_string(),
                SerialPortType::Unknown => "unknown".to_string(),
            };
            PortListing {
                name: info.port_name,
                description,
            }
        })
        .collect())
}

impl<T: Read + Write> AnalogInput for FirmataBoard<T> {
    fn read_voltage(&mut self, pin: Pin) -> AccResult<f64> {
        let channel = pin
            .analog_channel()
            .ok_or_else(|| AccError::sensor(pin, "not an analog pin"))?;
        let raw = self.wait_for(&pin.to_string(), |board| {
            board.analog.get(channel as usize).copied().flatten()
        })?;
        Ok(protocol::analog_to_volts(raw))
    }
}

impl<T: Read + Write> DistanceSensor for FirmataBoard<T> {
    fn read_distance(&mut self) -> AccResult<f64> {
        let cm = self.wait_for("ultrasonic", |board| board.sonar_cm)?;
        Ok(f64::from(cm) / 100.0)
    }
}

impl<T: Read + Write> DigitalOutput for FirmataBoard<T> {
    fn write_digital(&mut self, pin: Pin, high: bool) -> AccResult<()> {
        self.send(&protocol::set_digital_pin_value(pin.number(), high))
            .map_err(|e| AccError::actuator(pin, e))
    }
}

impl<T: Read + Write> PwmOutput for FirmataBoard<T> {
    fn write_pwm_duty_cycle(&mut self, pin: Pin, duty: f64) -> AccResult<()> {
        let value = protocol::duty_to_pwm(duty);
        self.send(&protocol::analog_write(pin.number(), value))
            .map_err(|e| AccError::actuator(pin, e))
    }
}

impl<T: Read + Write> Delay for FirmataBoard<T> {
    fn pause(&mut self, duration: Duration) {
        self.delay.pause(duration);
    }
}

impl<T: Read + Write + Send> Board for FirmataBoard<T> {
    fn board_name(&self) -> &str {
        &self.label
    }

    fn configure_pin(&mut self, pin: Pin, mode: PinMode) -> AccResult<()> {
        let number = pin.number();
        let result = match mode {
            PinMode::DigitalOutput => {
                self.send(&protocol::set_pin_mode(number, protocol::PIN_MODE_OUTPUT))
            }
            PinMode::Pwm => self.send(&protocol::set_pin_mode(number, protocol::PIN_MODE_PWM)),
            PinMode::AnalogInput => {
                let channel = pin.analog_channel().ok_or_else(|| {
                    AccError::config(format!("{} has no analog channel", pin))
                })?;
                self.send(&protocol::set_pin_mode(number, protocol::PIN_MODE_ANALOG))
                    .and_then(|_| self.send(&protocol::report_analog(channel, true)))
            }
        };
        result.map_err(|e| AccError::Communication(format!("configure {}: {}", pin, e)))
    }
}
