//! Telemetry uplink payload.
//!
//! Fixed 21-byte layout, big endian, no length prefix; the application port
//! selects this layout on the receiving side.
//!
//! | offset | field              | type | unit        |
//! |--------|--------------------|------|-------------|
//! | 0      | pressure           | u16  | hPa × 10    |
//! | 2      | temperature        | i16  | °C × 100    |
//! | 4      | humidity           | u16  | %RH × 10    |
//! | 6      | accelerometer xyz  | i16  | mg          |
//! | 12     | gyroscope xyz      | i16  | mdps        |
//! | 18     | heading            | i16  | degrees×100 |
//! | 20     | battery level      | u8   | 0..=254     |

use crate::config::MAX_BATTERY_LEVEL;
use crate::error::DecodeError;
use crate::state::{Axes, SensorSnapshot};

pub const FRAME_LEN: usize = 21;

// ── Encoder ───────────────────────────────────────────────────────────────────

/// Pack one snapshot. Float fields are truncated toward zero.
pub fn encode(snapshot: &SensorSnapshot, heading: f32, battery_level: u8) -> [u8; FRAME_LEN] {
    let pressure = (snapshot.pressure * 10.0) as u16;
    let temperature = (snapshot.temperature * 100.0) as i16;
    let humidity = (snapshot.humidity * 10.0) as u16;
    let accelero = snapshot.accelero.map(|v| v as i16);
    // mdps readings are narrowed like the sensor's 16-bit register
    let gyro = snapshot.gyro.map(|v| v as i16);
    let heading = (heading * 100.0) as i16;

    let mut buf = [0u8; FRAME_LEN];
    buf[0..2].copy_from_slice(&pressure.to_be_bytes());
    buf[2..4].copy_from_slice(&temperature.to_be_bytes());
    buf[4..6].copy_from_slice(&humidity.to_be_bytes());
    buf[6..8].copy_from_slice(&accelero.x.to_be_bytes());
    buf[8..10].copy_from_slice(&accelero.y.to_be_bytes());
    buf[10..12].copy_from_slice(&accelero.z.to_be_bytes());
    buf[12..14].copy_from_slice(&gyro.x.to_be_bytes());
    buf[14..16].copy_from_slice(&gyro.y.to_be_bytes());
    buf[16..18].copy_from_slice(&gyro.z.to_be_bytes());
    buf[18..20].copy_from_slice(&heading.to_be_bytes());
    buf[20] = battery_level;
    buf
}

// ── Decoder ───────────────────────────────────────────────────────────────────

/// A telemetry frame as the network side sees it.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Telemetry {
    pub pressure_hpa: f32,
    pub temperature_c: f32,
    pub humidity_pct: f32,
    pub accelero_mg: Axes<i16>,
    pub gyro_mdps: Axes<i16>,
    pub heading_deg: f32,
    pub battery_level: u8,
}

pub fn decode(payload: &[u8]) -> Result<Telemetry, DecodeError> {
    if payload.len() != FRAME_LEN {
        return Err(DecodeError::Length {
            expected: FRAME_LEN,
            found: payload.len(),
        });
    }
    let be_u16 = |i: usize| u16::from_be_bytes([payload[i], payload[i + 1]]);
    let be_i16 = |i: usize| i16::from_be_bytes([payload[i], payload[i + 1]]);

    Ok(Telemetry {
        pressure_hpa: f32::from(be_u16(0)) / 10.0,
        temperature_c: f32::from(be_i16(2)) / 100.0,
        humidity_pct: f32::from(be_u16(4)) / 10.0,
        accelero_mg: Axes::new(be_i16(6), be_i16(8), be_i16(10)),
        gyro_mdps: Axes::new(be_i16(12), be_i16(14), be_i16(16)),
        heading_deg: f32::from(be_i16(18)) / 100.0,
        battery_level: payload[20],
    })
}

// ── Battery ───────────────────────────────────────────────────────────────────

/// Battery voltage calibration supplied by the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BatteryCalibration {
    /// Reading at full charge
    pub full_charge_mv: u16,
    /// Reading at which the battery counts as empty
    pub min_charge_mv: u16,
}

/// Map a battery reading onto the LoRaWAN 0..=254 scale, rounding to nearest.
pub fn battery_level(millivolts: u16, calibration: BatteryCalibration) -> u8 {
    let BatteryCalibration {
        full_charge_mv,
        min_charge_mv,
    } = calibration;

    if millivolts >= full_charge_mv {
        return MAX_BATTERY_LEVEL;
    }
    if millivolts <= min_charge_mv {
        return 0;
    }
    let span = u32::from(full_charge_mv - min_charge_mv);
    let above_min = u32::from(millivolts - min_charge_mv);
    let level = (above_min * u32::from(MAX_BATTERY_LEVEL) + span / 2) / span;
    level.min(u32::from(MAX_BATTERY_LEVEL)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const CAL: BatteryCalibration = BatteryCalibration {
        full_charge_mv: 3000,
        min_charge_mv: 1800,
    };

    fn sample() -> SensorSnapshot {
        SensorSnapshot {
            humidity: 45.67,
            temperature: -12.345,
            pressure: 1013.25,
            magneto: Axes::new(100, 200, 300),
            accelero: Axes::new(-15.9, 3.2, 998.7),
            accelero_raw: Axes::new(-16, 3, 999),
            gyro: Axes::new(-700, 1400, 70),
        }
    }

    #[test]
    fn test_layout() {
        let frame = encode(&sample(), -135.256, 200);
        assert_eq!(frame.len(), FRAME_LEN);
        // 10132 = 0x2794
        assert_eq!(&frame[0..2], &[0x27, 0x94]);
        // -1234 = 0xFB2E
        assert_eq!(&frame[2..4], &[0xFB, 0x2E]);
        // 456 = 0x01C8
        assert_eq!(&frame[4..6], &[0x01, 0xC8]);
        // -15 = 0xFFF1, 3, 998 = 0x03E6
        assert_eq!(&frame[6..12], &[0xFF, 0xF1, 0x00, 0x03, 0x03, 0xE6]);
        // -700 = 0xFD44, 1400 = 0x0578, 70 = 0x0046
        assert_eq!(&frame[12..18], &[0xFD, 0x44, 0x05, 0x78, 0x00, 0x46]);
        // -13525 = 0xCB2B
        assert_eq!(&frame[18..20], &[0xCB, 0x2B]);
        assert_eq!(frame[20], 200);
    }

    #[test]
    fn test_truncates_toward_zero() {
        let snapshot = SensorSnapshot {
            temperature: -0.019,
            accelero: Axes::new(-0.99, 0.99, -1.5),
            ..Default::default()
        };
        let decoded = decode(&encode(&snapshot, -0.009, 0)).unwrap();
        assert_eq!(decoded.temperature_c, -0.01);
        assert_eq!(decoded.accelero_mg, Axes::new(0, 0, -1));
        assert_eq!(decoded.heading_deg, 0.0);
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        assert_eq!(
            decode(&[0u8; 18]),
            Err(DecodeError::Length {
                expected: FRAME_LEN,
                found: 18
            })
        );
        assert!(decode(&[0u8; 20]).is_err());
    }

    #[test]
    fn test_battery_level_clamps() {
        assert_eq!(battery_level(3000, CAL), 254);
        assert_eq!(battery_level(3300, CAL), 254);
        assert_eq!(battery_level(1800, CAL), 0);
        assert_eq!(battery_level(900, CAL), 0);
    }

    #[test]
    fn test_battery_level_rounds_to_nearest() {
        // 600 / 1200 * 254 = 127
        assert_eq!(battery_level(2400, CAL), 127);
        // 1 / 1200 * 254 = 0.21
        assert_eq!(battery_level(1801, CAL), 0);
        // 3 / 1200 * 254 = 0.635
        assert_eq!(battery_level(1803, CAL), 1);
        // 1199 / 1200 * 254 = 253.79
        assert_eq!(battery_level(2999, CAL), 254);
    }

    #[test]
    fn test_battery_level_degenerate_calibration() {
        let flat = BatteryCalibration {
            full_charge_mv: 2000,
            min_charge_mv: 2000,
        };
        assert_eq!(battery_level(2000, flat), 254);
        assert_eq!(battery_level(1999, flat), 0);
    }

    proptest! {
        #[test]
        fn prop_decode_recovers_fields(
            pressure in 0.0f32..6500.0,
            temperature in -300.0f32..300.0,
            humidity in 0.0f32..100.0,
            acc in prop::array::uniform3(-16000.0f32..16000.0),
            gyro in prop::array::uniform3(-32768i32..=32767),
            heading in -180.0f32..180.0,
            battery in any::<u8>(),
        ) {
            let snapshot = SensorSnapshot {
                humidity,
                temperature,
                pressure,
                accelero: Axes::new(acc[0], acc[1], acc[2]),
                gyro: Axes::new(gyro[0], gyro[1], gyro[2]),
                ..Default::default()
            };
            let frame = encode(&snapshot, heading, battery);
            prop_assert_eq!(frame.len(), FRAME_LEN);

            let t = decode(&frame).unwrap();
            prop_assert!((t.pressure_hpa - pressure).abs() <= 0.1 + 1e-3);
            prop_assert!((t.temperature_c - temperature).abs() <= 0.01 + 1e-4);
            prop_assert!((t.humidity_pct - humidity).abs() <= 0.1 + 1e-4);
            prop_assert!((f32::from(t.accelero_mg.x) - acc[0]).abs() < 1.0);
            prop_assert!((f32::from(t.accelero_mg.y) - acc[1]).abs() < 1.0);
            prop_assert!((f32::from(t.accelero_mg.z) - acc[2]).abs() < 1.0);
            prop_assert_eq!(i32::from(t.gyro_mdps.x), gyro[0]);
            prop_assert_eq!(i32::from(t.gyro_mdps.y), gyro[1]);
            prop_assert_eq!(i32::from(t.gyro_mdps.z), gyro[2]);
            prop_assert!((t.heading_deg - heading).abs() <= 0.01 + 1e-4);
            prop_assert_eq!(t.battery_level, battery);
        }
    }
}
