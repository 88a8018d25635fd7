//! Growatt inverter adapter (Modbus-RTU over the service-port UART).
//!
//! One poll is a single "read input registers" exchange:
//!
//! ```text
//!   request:  [addr][0x04][start hi][start lo][count hi][count lo][crc lo][crc hi]
//!   reply:    [addr][0x04][byte count][reg0 hi][reg0 lo] ... [crc lo][crc hi]
//!   error:    [addr][0x84][exception code][crc lo][crc hi]
//! ```
//!
//! Frame handling and register scaling live in plain functions
//! ([`build_request`], [`decode_reply`]) so they run on the host; only
//! [`GrowattInverter`] touches the UART.

use crate::app::ports::InverterPort;
use crate::error::AcquisitionError;
use crate::telemetry::{InverterStatus, Reading};

/// Modbus "read input registers".
pub const FUNCTION_READ_INPUT: u8 = 0x04;
pub const FIRST_REGISTER: u16 = 0;
/// Registers 0..=32.
pub const REGISTER_COUNT: u16 = 33;
/// Length of a complete, successful reply.
pub const REPLY_LEN: usize = 3 + 2 * REGISTER_COUNT as usize + 2;
const EXCEPTION_LEN: usize = 5;

// Input register map.
const REG_STATUS: usize = 0;
const REG_PV1_VOLTAGE: usize = 3;
const REG_AC_POWER: usize = 11;
const REG_AC_FREQUENCY: usize = 13;
const REG_AC_VOLTAGE: usize = 14;
const REG_ENERGY_TODAY: usize = 26;
const REG_ENERGY_TOTAL: usize = 28;
const REG_OPERATING_TIME: usize = 30;
const REG_TEMPERATURE: usize = 32;

/// CRC-16/MODBUS (poly 0xA001 reflected, init 0xFFFF).
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in data {
        crc ^= u16::from(byte);
        for _ in 0..8 {
            crc = if crc & 1 != 0 { (crc >> 1) ^ 0xA001 } else { crc >> 1 };
        }
    }
    crc
}

/// Request frame for the full register block.
pub fn build_request(address: u8) -> [u8; 8] {
    let mut frame = [
        address,
        FUNCTION_READ_INPUT,
        (FIRST_REGISTER >> 8) as u8,
        FIRST_REGISTER as u8,
        (REGISTER_COUNT >> 8) as u8,
        REGISTER_COUNT as u8,
        0,
        0,
    ];
    let [lo, hi] = crc16(&frame[..6]).to_le_bytes();
    frame[6] = lo;
    frame[7] = hi;
    frame
}

fn crc_ok(frame: &[u8]) -> bool {
    let (body, tail) = frame.split_at(frame.len() - 2);
    crc16(body) == u16::from_le_bytes([tail[0], tail[1]])
}

/// Number of bytes the reader should wait for, given what has arrived.
pub fn expected_len(received: &[u8]) -> usize {
    match received.get(1) {
        Some(function) if function & 0x80 != 0 => EXCEPTION_LEN,
        _ => REPLY_LEN,
    }
}

/// Validate a reply frame and return its registers.
pub fn parse_registers(
    address: u8,
    frame: &[u8],
) -> Result<[u16; REGISTER_COUNT as usize], AcquisitionError> {
    if frame.is_empty() {
        return Err(AcquisitionError::NoResponse);
    }
    if frame.len() >= EXCEPTION_LEN && frame[1] == FUNCTION_READ_INPUT | 0x80 {
        let exception = &frame[..EXCEPTION_LEN];
        if !crc_ok(exception) {
            return Err(AcquisitionError::BadChecksum);
        }
        if exception[0] != address {
            return Err(AcquisitionError::Malformed);
        }
        return Err(AcquisitionError::DeviceException(exception[2]));
    }
    if frame.len() < REPLY_LEN {
        return Err(AcquisitionError::Malformed);
    }
    let frame = &frame[..REPLY_LEN];
    if !crc_ok(frame) {
        return Err(AcquisitionError::BadChecksum);
    }
    if frame[0] != address
        || frame[1] != FUNCTION_READ_INPUT
        || usize::from(frame[2]) != 2 * REGISTER_COUNT as usize
    {
        return Err(AcquisitionError::Malformed);
    }

    let mut regs = [0u16; REGISTER_COUNT as usize];
    for (reg, pair) in regs.iter_mut().zip(frame[3..REPLY_LEN - 2].chunks_exact(2)) {
        *reg = u16::from_be_bytes([pair[0], pair[1]]);
    }
    Ok(regs)
}

fn pair(regs: &[u16], at: usize) -> u32 {
    (u32::from(regs[at]) << 16) | u32::from(regs[at + 1])
}

/// Scale raw registers into engineering units.
pub fn decode_registers(regs: &[u16; REGISTER_COUNT as usize]) -> Result<Reading, AcquisitionError> {
    let status = InverterStatus::from_code(regs[REG_STATUS]).ok_or(AcquisitionError::Malformed)?;
    Ok(Reading {
        status,
        dc_voltage: f32::from(regs[REG_PV1_VOLTAGE]) / 10.0,
        ac_frequency: f32::from(regs[REG_AC_FREQUENCY]) / 100.0,
        ac_voltage: f32::from(regs[REG_AC_VOLTAGE]) / 10.0,
        ac_power: pair(regs, REG_AC_POWER) as f32 / 10.0,
        energy_today: pair(regs, REG_ENERGY_TODAY) as f32 / 10.0,
        energy_total: pair(regs, REG_ENERGY_TOTAL) as f32 / 10.0,
        // Half-second ticks.
        operating_time: pair(regs, REG_OPERATING_TIME) / 2,
        temperature: f32::from(regs[REG_TEMPERATURE] as i16) / 10.0,
    })
}

/// Frame check plus scaling.
pub fn decode_reply(address: u8, frame: &[u8]) -> Result<Reading, AcquisitionError> {
    decode_registers(&parse_registers(address, frame)?)
}

/// Encode registers as a reply frame.  Used by the simulator and tests.
pub fn encode_reply(address: u8, regs: &[u16; REGISTER_COUNT as usize]) -> [u8; REPLY_LEN] {
    let mut frame = [0u8; REPLY_LEN];
    frame[0] = address;
    frame[1] = FUNCTION_READ_INPUT;
    frame[2] = (2 * REGISTER_COUNT) as u8;
    for (i, reg) in regs.iter().enumerate() {
        frame[3 + 2 * i..5 + 2 * i].copy_from_slice(&reg.to_be_bytes());
    }
    let [lo, hi] = crc16(&frame[..REPLY_LEN - 2]).to_le_bytes();
    frame[REPLY_LEN - 2] = lo;
    frame[REPLY_LEN - 1] = hi;
    frame
}

// ═══════════════════════════════════════════════════════════════
//  Simulated inverter (host tests and `simulate` builds)
// ═══════════════════════════════════════════════════════════════

/// Register image of a healthy inverter at dusk.
const DEMO_REGISTERS: [u16; REGISTER_COUNT as usize] = {
    let mut r = [0u16; REGISTER_COUNT as usize];
    r[REG_STATUS] = 1;
    r[REG_PV1_VOLTAGE] = 705;
    r[REG_AC_FREQUENCY] = 5000;
    r[REG_AC_VOLTAGE] = 2300;
    r[REG_ENERGY_TODAY + 1] = 3;
    r[REG_ENERGY_TOTAL + 1] = 491;
    // 246_912 half-second ticks = 123_456 s.
    r[REG_OPERATING_TIME] = 0x0003;
    r[REG_OPERATING_TIME + 1] = 0xC480;
    r[REG_TEMPERATURE] = 211;
    r
};

/// Answers every poll with the same demo reading, through the real
/// frame decoder.
pub struct SimulatedInverter {
    address: u8,
    last_status: Option<InverterStatus>,
}

impl Default for SimulatedInverter {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedInverter {
    pub fn new() -> Self {
        Self {
            address: 1,
            last_status: None,
        }
    }
}

impl InverterPort for SimulatedInverter {
    fn poll(&mut self) -> Result<Reading, AcquisitionError> {
        let reply = encode_reply(self.address, &DEMO_REGISTERS);
        let reading = decode_reply(self.address, &reply)?;
        self.last_status = Some(reading.status);
        Ok(reading)
    }

    fn last_status(&self) -> Option<InverterStatus> {
        self.last_status
    }
}

// ═══════════════════════════════════════════════════════════════
//  UART-backed inverter (ESP-IDF only)
// ═══════════════════════════════════════════════════════════════

#[cfg(target_os = "espidf")]
pub use esp_impl::GrowattInverter;

#[cfg(target_os = "espidf")]
mod esp_impl {
    use esp_idf_hal::delay::TickType;
    use esp_idf_hal::uart::UartDriver;
    use log::{debug, warn};

    use super::*;

    /// Gap after which a partial reply is considered abandoned.
    const REPLY_TIMEOUT_MS: u64 = 500;

    pub struct GrowattInverter {
        uart: UartDriver<'static>,
        address: u8,
        last_status: Option<InverterStatus>,
    }

    impl GrowattInverter {
        /// Take ownership of an already-configured UART (9600 8N1).
        pub fn begin(uart: UartDriver<'static>, address: u8) -> Self {
            Self {
                uart,
                address,
                last_status: None,
            }
        }

        fn exchange(&mut self, reply: &mut [u8; REPLY_LEN]) -> Result<usize, AcquisitionError> {
            let request = build_request(self.address);
            self.uart.clear_rx().map_err(|_| AcquisitionError::Transport)?;
            self.uart.write(&request).map_err(|_| AcquisitionError::Transport)?;
            let ticks = TickType::new_millis(REPLY_TIMEOUT_MS).ticks();
            self.uart
                .wait_tx_done(ticks)
                .map_err(|_| AcquisitionError::Transport)?;

            let mut received = 0;
            while received < expected_len(&reply[..received]) {
                let n = self
                    .uart
                    .read(&mut reply[received..], ticks)
                    .map_err(|_| AcquisitionError::Transport)?;
                if n == 0 {
                    break;
                }
                received += n;
            }
            debug!("Inverter reply: {} bytes", received);
            Ok(received)
        }
    }

    impl InverterPort for GrowattInverter {
        fn poll(&mut self) -> Result<Reading, AcquisitionError> {
            let mut reply = [0u8; REPLY_LEN];
            let received = self.exchange(&mut reply)?;
            match decode_reply(self.address, &reply[..received]) {
                Ok(reading) => {
                    self.last_status = Some(reading.status);
                    Ok(reading)
                }
                Err(e) => {
                    warn!("Inverter reply rejected: {}", e);
                    Err(e)
                }
            }
        }

        fn last_status(&self) -> Option<InverterStatus> {
            self.last_status
        }
    }
}
