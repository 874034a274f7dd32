//! Firmata wire format
//!
//! Host side of Firmata 2.x as spoken by StandardFirmata and FirmataExpress.
//! Encoders return the exact bytes to put on the wire. `FirmataParser`
//! turns the board's byte stream back into events one byte at a time.

// Message commands (high nibble carries the command, low nibble the pin/port)
pub const DIGITAL_MESSAGE: u8 = 0x90;
pub const ANALOG_MESSAGE: u8 = 0xE0;
pub const REPORT_ANALOG: u8 = 0xC0;

pub const SET_PIN_MODE: u8 = 0xF4;
pub const SET_DIGITAL_PIN_VALUE: u8 = 0xF5;
pub const REPORT_VERSION: u8 = 0xF9;
pub const START_SYSEX: u8 = 0xF0;
pub const END_SYSEX: u8 = 0xF7;

// Sysex commands
pub const SONAR_CONFIG: u8 = 0x62;
pub const SONAR_DATA: u8 = 0x63;
pub const EXTENDED_ANALOG: u8 = 0x6F;
pub const REPORT_FIRMWARE: u8 = 0x79;
pub const SAMPLING_INTERVAL: u8 = 0x7A;

// Pin modes
pub const PIN_MODE_OUTPUT: u8 = 0x01;
pub const PIN_MODE_ANALOG: u8 = 0x02;
pub const PIN_MODE_PWM: u8 = 0x03;

/// Full scale of the Uno's 10-bit ADC
pub const ANALOG_MAX: u16 = 1023;
/// Full scale of an 8-bit PWM write
pub const PWM_MAX: u16 = 255;

/// Longest sysex payload kept; anything beyond is dropped
const MAX_SYSEX_LEN: usize = 256;

fn lsb(value: u16) -> u8 {
    (value & 0x7F) as u8
}

fn msb(value: u16) -> u8 {
    ((value >> 7) & 0x7F) as u8
}

fn join7(lsb: u8, msb: u8) -> u16 {
    u16::from(lsb & 0x7F) | (u16::from(msb & 0x7F) << 7)
}

pub fn set_pin_mode(pin: u8, mode: u8) -> [u8; 3] {
    [SET_PIN_MODE, pin & 0x7F, mode & 0x7F]
}

pub fn set_digital_pin_value(pin: u8, high: bool) -> [u8; 3] {
    [SET_DIGITAL_PIN_VALUE, pin & 0x7F, u8::from(high)]
}

/// PWM (or servo) write. Pins above 15 need the extended sysex form.
pub fn analog_write(pin: u8, value: u16) -> Vec<u8> {
    let value = value & 0x3FFF;
    if pin <= 0x0F {
        vec![ANALOG_MESSAGE | pin, lsb(value), msb(value)]
    } else {
        vec![
            START_SYSEX,
            EXTENDED_ANALOG,
            pin & 0x7F,
            lsb(value),
            msb(value),
            END_SYSEX,
        ]
    }
}

pub fn report_analog(channel: u8, enable: bool) -> [u8; 2] {
    [REPORT_ANALOG | (channel & 0x0F), u8::from(enable)]
}

pub fn sampling_interval(ms: u16) -> [u8; 5] {
    [START_SYSEX, SAMPLING_INTERVAL, lsb(ms), msb(ms), END_SYSEX]
}

pub fn query_firmware() -> [u8; 3] {
    [START_SYSEX, REPORT_FIRMWARE, END_SYSEX]
}

/// FirmataExpress HC-SR04 setup; the board then streams SONAR_DATA
pub fn sonar_config(trigger: u8, echo: u8) -> [u8; 5] {
    [START_SYSEX, SONAR_CONFIG, trigger & 0x7F, echo & 0x7F, END_SYSEX]
}

/// Something the board told us
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FirmataEvent {
    /// 10-bit ADC sample for an analog channel
    Analog { channel: u8, value: u16 },
    /// Bitmask of the eight pins of a digital port
    DigitalPort { port: u8, mask: u16 },
    ProtocolVersion { major: u8, minor: u8 },
    Firmware { major: u8, minor: u8, name: String },
    /// Ultrasonic echo distance in centimeters
    Sonar { trigger: u8, centimeters: u16 },
    /// Sysex the host does not interpret
    Sysex { command: u8, data: Vec<u8> },
}

/// Incremental decoder for the board-to-host stream
#[derive(Debug, Default)]
pub struct FirmataParser {
    command: Option<u8>,
    in_sysex: bool,
    buffer: Vec<u8>,
    dropped: u64,
}

impl FirmataParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes discarded because they arrived outside a message
    pub fn dropped_bytes(&self) -> u64 {
        self.dropped
    }

    /// Decode every complete message in `bytes`
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<FirmataEvent> {
        bytes.iter().filter_map(|&b| self.push(b)).collect()
    }

    pub fn push(&mut self, byte: u8) -> Option<FirmataEvent> {
        if self.in_sysex {
            match byte {
                END_SYSEX => {
                    self.in_sysex = false;
                    let payload = std::mem::take(&mut self.buffer);
                    return decode_sysex(&payload);
                }
                b if b & 0x80 == 0 => {
                    if self.buffer.len() < MAX_SYSEX_LEN {
                        self.buffer.push(b);
                    } else {
                        self.dropped += 1;
                    }
                    return None;
                }
                // Unterminated sysex, start over on this command byte
                _ => {
                    self.dropped += self.buffer.len() as u64;
                    self.in_sysex = false;
                    self.buffer.clear();
                }
            }
        }

        if byte & 0x80 != 0 {
            self.dropped += self.buffer.len() as u64;
            self.buffer.clear();
            if byte == START_SYSEX {
                self.in_sysex = true;
                self.command = None;
            } else {
                self.command = Some(byte);
            }
            return None;
        }

        let Some(command) = self.command else {
            self.dropped += 1;
            return None;
        };
        self.buffer.push(byte);
        if self.buffer.len() < 2 {
            return None;
        }

        let (first, second) = (self.buffer[0], self.buffer[1]);
        self.buffer.clear();
        self.command = None;
        decode_message(command, first, second)
    }
}

fn decode_message(command: u8, first: u8, second: u8) -> Option<FirmataEvent> {
    match command & 0xF0 {
        ANALOG_MESSAGE => Some(FirmataEvent::Analog {
            channel: command & 0x0F,
            value: join7(first, second),
        }),
        DIGITAL_MESSAGE => Some(FirmataEvent::DigitalPort {
            port: command & 0x0F,
            mask: join7(first, second),
        }),
        _ if command == REPORT_VERSION => Some(FirmataEvent::ProtocolVersion {
            major: first,
            minor: second,
        }),
        _ => None,
    }
}

fn decode_sysex(payload: &[u8]) -> Option<FirmataEvent> {
    let (&command, data) = payload.split_first()?;
    match command {
        REPORT_FIRMWARE if data.len() >= 2 => {
            let name = data[2..]
                .chunks_exact(2)
                .filter_map(|pair| char::from_u32(u32::from(join7(pair[0], pair[1]))))
                .collect();
            Some(FirmataEvent::Firmware {
                major: data[0],
                minor: data[1],
                name,
            })
        }
        SONAR_DATA if data.len() >= 3 => Some(FirmataEvent::Sonar {
            trigger: data[0],
            centimeters: join7(data[1], data[2]),
        }),
        _ => Some(FirmataEvent::Sysex {
            command,
            data: data.to_vec(),
        }),
    }
}

/// Raw 10-bit ADC reading to volts on a 5 V board
pub fn analog_to_volts(raw: u16) -> f64 {
    f64::from(raw.min(ANALOG_MAX)) * 5.0 / f64::from(ANALOG_MAX)
}

/// Duty cycle in [0, 1] to an 8-bit PWM value
pub fn duty_to_pwm(duty: f64) -> u16 {
    if duty.is_nan() {
        return 0;
    }
    (duty.clamp(0.0, 1.0) * f64::from(PWM_MAX)).round() as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_output_commands() {
        assert_eq!(set_pin_mode(13, PIN_MODE_OUTPUT), [0xF4, 13, 0x01]);
        assert_eq!(set_digital_pin_value(12, true), [0xF5, 12, 1]);
        assert_eq!(analog_write(9, 255), vec![0xE9, 0x7F, 0x01]);
        assert_eq!(
            analog_write(20, 128),
            vec![0xF0, 0x6F, 20, 0x00, 0x01, 0xF7]
        );
        assert_eq!(report_analog(3, true), [0xC3, 1]);
        assert_eq!(sampling_interval(19), [0xF0, 0x7A, 19, 0, 0xF7]);
        assert_eq!(sonar_config(10, 8), [0xF0, 0x62, 10, 8, 0xF7]);
    }

    #[test]
    fn test_parse_analog_and_version() {
        let mut parser = FirmataParser::new();
        let events = parser.feed(&[0xE2, 0x7F, 0x07, 0xF9, 2, 5]);
        assert_eq!(
            events,
            vec![
                FirmataEvent::Analog {
                    channel: 2,
                    value: 1023
                },
                FirmataEvent::ProtocolVersion { major: 2, minor: 5 },
            ]
        );
    }

    #[test]
    fn test_parse_firmware_name() {
        let mut parser = FirmataParser::new();
        let events = parser.feed(&[
            0xF0, 0x79, 1, 2, b'F', 0, b'E', 0, 0xF7,
        ]);
        assert_eq!(
            events,
            vec![FirmataEvent::Firmware {
                major: 1,
                minor: 2,
                name: "FE".to_string()
            }]
        );
    }

    #[test]
    fn test_parse_sonar_distance() {
        let mut parser = FirmataParser::new();
        // 150 cm = 0x16 + (0x01 << 7)
        let events = parser.feed(&[0xF0, 0x63, 10, 0x16, 0x01, 0xF7]);
        assert_eq!(
            events,
            vec![FirmataEvent::Sonar {
                trigger: 10,
                centimeters: 150
            }]
        );
    }

    #[test]
    fn test_parser_resyncs_after_garbage() {
        let mut parser = FirmataParser::new();
        // Stray data bytes, then a message cut short by a new command
        let events = parser.feed(&[0x12, 0x34, 0xE0, 0x10, 0xE1, 0x05, 0x00]);
        assert_eq!(
            events,
            vec![FirmataEvent::Analog {
                channel: 1,
                value: 5
            }]
        );
        assert_eq!(parser.dropped_bytes(), 3);

        // A sysex broken by a command byte is abandoned
        let events = parser.feed(&[0xF0, 0x63, 10, 0xE0, 0x01, 0x00]);
        assert_eq!(
            events,
            vec![FirmataEvent::Analog {
                channel: 0,
                value: 1
            }]
        );
    }

    #[test]
    fn test_unit_conversions() {
        assert_relative_eq!(analog_to_volts(0), 0.0);
        assert_relative_eq!(analog_to_volts(1023), 5.0);
        assert_relative_eq!(analog_to_volts(819), 819.0 * 5.0 / 1023.0);
        assert_eq!(duty_to_pwm(0.0), 0);
        assert_eq!(duty_to_pwm(1.0), 255);
        assert_eq!(duty_to_pwm(0.5), 128);
        assert_eq!(duty_to_pwm(1.7), 255);
        assert_eq!(duty_to_pwm(f64::NAN), 0);
    }
}
