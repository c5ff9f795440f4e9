// This file is part of rc_drive.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use config::{File, FileFormat};
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::{
    CHANNEL_DRIVE, CHANNEL_STEER, DEFAULT_ACCELERATION_LIMIT, DEFAULT_BAUD_RATE,
    DEFAULT_JOYSTICK_PATH, DEFAULT_MAESTRO_PATH, DEFAULT_READ_TIMEOUT, DEFAULT_SPEED_LIMIT,
    DEFAULT_TICK_INTERVAL, DRIVE_OFFSET, DRIVE_SCALE, STEER_OFFSET, STEER_SCALE, TARGET_NEUTRAL,
};
use crate::enums::Axis;
use crate::error::DriveError;

/// Affine map from an axis value to a channel target.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug)]
pub struct AxisMapping {
    // Axis to read.
    pub axis: Axis,
    // Target change per unit of the axis. The sign follows the polarity of
    // the actuator.
    pub scale: f64,
    // Target when the axis is centered.
    pub offset: f64,
}

impl AxisMapping {
    /// Map the axis value to the channel target.
    ///
    /// # Arguments
    /// * `value` - Axis value.
    ///
    /// # Returns
    /// Rounded target. Values below 0 or above u16::MAX saturate.
    pub fn to_target(&self, value: f64) -> u16 {
        (value * self.scale + self.offset).round() as u16
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(default)]
pub struct Config {
    // Input device of the gamepad.
    pub joystick_path: String,
    // Serial device of the controller.
    pub maestro_path: String,
    pub baud_rate: u32,
    // Timeout of the protocol responses in milliseconds.
    pub read_timeout_ms: u64,
    // Period of the control loop in milliseconds.
    pub tick_interval_ms: u64,
    pub channel_steer: u8,
    pub channel_drive: u8,
    // Initial target of both channels.
    pub neutral_target: u16,
    // Speed limit in 0.25 us / 10 ms.
    pub speed_limit: u16,
    // Acceleration limit in 0.25 us / 10 ms / 80 ms.
    pub acceleration_limit: u16,
    pub drive: AxisMapping,
    pub steer: AxisMapping,
    // Clamp the axis values outside of the calibration range or not.
    pub clamp_axis: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            joystick_path: String::from(DEFAULT_JOYSTICK_PATH),
            maestro_path: String::from(DEFAULT_MAESTRO_PATH),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout_ms: DEFAULT_READ_TIMEOUT,
            tick_interval_ms: DEFAULT_TICK_INTERVAL,
            channel_steer: CHANNEL_STEER,
            channel_drive: CHANNEL_DRIVE,
            neutral_target: TARGET_NEUTRAL,
            speed_limit: DEFAULT_SPEED_LIMIT,
            acceleration_limit: DEFAULT_ACCELERATION_LIMIT,
            drive: AxisMapping {
                axis: Axis::LeftY,
                scale: DRIVE_SCALE,
                offset: DRIVE_OFFSET,
            },
            steer: AxisMapping {
                axis: Axis::RightX,
                scale: STEER_SCALE,
                offset: STEER_OFFSET,
            },
            clamp_axis: false,
        }
    }
}

impl Config {
    /// Read the configuration from a YAML file. The file is layered over the
    /// default values, so any missing key (including a single field of a
    /// mapping) keeps its default value.
    ///
    /// # Arguments
    /// * `filepath` - Path to the configuration file.
    ///
    /// # Returns
    /// The configuration.
    pub fn from_file(filepath: &Path) -> Result<Self, DriveError> {
        let config = config::Config::builder()
            .add_source(config::Config::try_from(&Self::default())?)
            .add_source(File::from(filepath).format(FileFormat::Yaml))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Read the configuration file if it exists. Otherwise, use the default
    /// values.
    ///
    /// # Arguments
    /// * `filepath` - Path to the configuration file.
    ///
    /// # Returns
    /// The configuration.
    pub fn from_file_or_default(filepath: &Path) -> Result<Self, DriveError> {
        if filepath.exists() {
            Self::from_file(filepath)
        } else {
            warn!("No configuration file {:?}. Use the default values.", filepath);
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();

        file
    }

    #[test]
    fn test_default() {
        let config = Config::default();

        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.tick_interval_ms, 10);
        assert_eq!(config.channel_steer, 0);
        assert_eq!(config.channel_drive, 1);
        assert_eq!(config.neutral_target, 6000);
        assert_eq!(config.drive.axis, Axis::LeftY);
        assert_eq!(config.steer.axis, Axis::RightX);
        assert!(!config.clamp_axis);
    }

    #[test]
    fn test_to_target() {
        let config = Config::default();

        assert_eq!(config.drive.to_target(0.0), 6000);
        assert_eq!(config.steer.to_target(0.0), 6300);

        assert_eq!(config.drive.to_target(1.0), 5500);
        assert_eq!(config.drive.to_target(-1.0), 6500);
        assert_eq!(config.steer.to_target(-1.0), 7300);
        assert_eq!(config.steer.to_target(1.0), 5300);

        // Rounded to the nearest quarter microsecond.
        assert_eq!(config.drive.to_target(0.0011), 5999);
        assert_eq!(config.drive.to_target(-0.0011), 6001);
    }

    #[test]
    fn test_to_target_saturates() {
        let mapping = AxisMapping {
            axis: Axis::LeftY,
            scale: -10000.0,
            offset: 6000.0,
        };

        assert_eq!(mapping.to_target(1.0), 0);
        assert_eq!(mapping.to_target(-10.0), u16::MAX);
    }

    #[test]
    fn test_from_file() {
        let file = write_config(
            "maestro_path: /dev/ttyUSB1\n\
             baud_rate: 115200\n\
             speed_limit: 50\n\
             steer:\n  axis: left_x\n  scale: 800.0\n  offset: 6100.0\n\
             clamp_axis: true\n",
        );

        let config = Config::from_file(file.path()).unwrap();

        assert_eq!(config.maestro_path, "/dev/ttyUSB1");
        assert_eq!(config.baud_rate, 115200);
        assert_eq!(config.speed_limit, 50);
        assert_eq!(
            config.steer,
            AxisMapping {
                axis: Axis::LeftX,
                scale: 800.0,
                offset: 6100.0,
            }
        );
        assert!(config.clamp_axis);

        // Keys not in the file keep the default values.
        assert_eq!(config.joystick_path, DEFAULT_JOYSTICK_PATH);
        assert_eq!(config.acceleration_limit, 100);
        assert_eq!(config.drive, Config::default().drive);
    }

    #[test]
    fn test_from_file_partial_mapping() {
        let file = write_config("drive:\n  scale: -400.0\n");

        let config = Config::from_file(file.path()).unwrap();

        assert_eq!(
            config.drive,
            AxisMapping {
                axis: Axis::LeftY,
                scale: -400.0,
                offset: 6000.0,
            }
        );
        assert_eq!(config.steer, Config::default().steer);
        assert_eq!(config.drive.to_target(1.0), 5600);
    }

    #[test]
    fn test_from_file_bad_value() {
        let file = write_config("baud_rate: fast\n");

        assert!(matches!(
            Config::from_file(file.path()),
            Err(DriveError::Config(_))
        ));
    }

    #[test]
    fn test_from_file_or_default() {
        let config =
            Config::from_file_or_default(Path::new("config/does_not_exist.yaml")).unwrap();

        assert_eq!(config, Config::default());
    }
}
