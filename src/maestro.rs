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

use log::{debug, info, warn};
use std::io;

use crate::constants::{LENGTH_RESPONSE, THRESHOLD_DIGITAL_HIGH};
use crate::enums::CommandId;
use crate::protocol::{
    decode_response, encode_get_errors, encode_get_position, encode_go_home, encode_set_command,
};
use crate::transport::ByteTransport;

/// Servo controller that talks the compact protocol. Only one controller can
/// be on the bus.
pub struct Maestro<T: ByteTransport> {
    _transport: T,
    _is_open: bool,
}

impl<T: ByteTransport> Maestro<T> {
    /// Create a new controller on an opened transport.
    ///
    /// # Arguments
    /// * `transport` - Opened byte transport. The controller owns it.
    ///
    /// # Returns
    /// A new controller.
    pub fn new(transport: T) -> Self {
        Self {
            _transport: transport,
            _is_open: true,
        }
    }

    /// The connection is open or not.
    pub fn is_open(&self) -> bool {
        self._is_open
    }

    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        if !self._is_open {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "Controller connection is closed",
            ));
        }

        self._transport.write_all(bytes)
    }

    fn receive(&mut self) -> io::Result<u16> {
        let mut buffer = [0; LENGTH_RESPONSE];
        self._transport.read_exact(&mut buffer)?;

        Ok(decode_response(buffer))
    }

    /// Set the target of a channel.
    ///
    /// For a servo channel, the target is the pulse width in quarter
    /// microseconds and 0 stops the pulses. For a digital output, a target
    /// below 6000 drives the line low and otherwise high.
    ///
    /// # Arguments
    /// * `channel` - Channel index.
    /// * `target` - Target. Only the lower 14 bits are used.
    pub fn set_target(&mut self, channel: u8, target: u16) -> io::Result<()> {
        self.send(&encode_set_command(CommandId::SetTarget, channel, target))
    }

    /// Set the speed limit of a channel in 0.25 us / 10 ms.
    ///
    /// # Arguments
    /// * `channel` - Channel index.
    /// * `speed` - Speed limit. Only the lower 14 bits are used.
    pub fn set_speed(&mut self, channel: u8, speed: u16) -> io::Result<()> {
        self.send(&encode_set_command(CommandId::SetSpeed, channel, speed))
    }

    /// Set the acceleration limit of a channel in 0.25 us / 10 ms / 80 ms.
    ///
    /// # Arguments
    /// * `channel` - Channel index.
    /// * `acceleration` - Acceleration limit. Only the lower 14 bits are used.
    pub fn set_acceleration(&mut self, channel: u8, acceleration: u16) -> io::Result<()> {
        self.send(&encode_set_command(
            CommandId::SetAcceleration,
            channel,
            acceleration,
        ))
    }

    /// Get the current position of a channel.
    ///
    /// # Arguments
    /// * `channel` - Channel index.
    ///
    /// # Returns
    /// Pulse width in quarter microseconds for a servo channel. For a digital
    /// output, see `is_digital_high()`.
    pub fn get_position(&mut self, channel: u8) -> io::Result<u16> {
        self.send(&encode_get_position(channel))?;
        self.receive()
    }

    /// Get the error register. The controller clears it after the read.
    ///
    /// # Returns
    /// Error bitmask. 0 means no error.
    pub fn get_errors(&mut self) -> io::Result<u16> {
        self.send(&encode_get_errors())?;
        self.receive()
    }

    /// Send all the channels to their home positions configured in the
    /// controller.
    pub fn go_home(&mut self) -> io::Result<()> {
        debug!("Send all channels home.");
        self.send(&encode_go_home())
    }

    /// Close the connection. It is fine to call this more than once.
    pub fn close(&mut self) -> io::Result<()> {
        if !self._is_open {
            return Ok(());
        }

        self._is_open = false;
        self._transport.close()?;

        info!("Controller connection is closed.");

        Ok(())
    }
}

impl<T: ByteTransport> Drop for Maestro<T> {
    fn drop(&mut self) {
        if let Err(error) = self.close() {
            warn!("Failed to close the controller connection: {error}.");
        }
    }
}

/// The position of a digital output reads as high or not.
///
/// # Arguments
/// * `position` - Position of the channel.
///
/// # Returns
/// True if the line is driven high.
pub fn is_digital_high(position: u16) -> bool {
    position >= THRESHOLD_DIGITAL_HIGH
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::mock::mock_transport::MockTransport;

    fn create_maestro() -> (Maestro<MockTransport>, MockTransport) {
        let transport = MockTransport::new();
        let handle = transport.clone();

        (Maestro::new(transport), handle)
    }

    #[test]
    fn test_set_commands() {
        let (mut maestro, handle) = create_maestro();

        assert!(maestro.set_target(0, 6000).is_ok());
        assert!(maestro.set_speed(0, 100).is_ok());
        assert!(maestro.set_acceleration(1, 20).is_ok());

        assert_eq!(
            handle.written(),
            vec![
                0x84, 0x00, 0x70, 0x2E, 0x87, 0x00, 0x64, 0x00, 0x89, 0x01, 0x14, 0x00,
            ]
        );

        let device = handle.device();
        assert_eq!(device.targets[0], 6000);
        assert_eq!(device.speeds[0], 100);
        assert_eq!(device.accelerations[1], 20);
    }

    #[test]
    fn test_get_position() {
        let (mut maestro, _) = create_maestro();

        maestro.set_target(2, 7300).unwrap();

        assert_eq!(maestro.get_position(2).unwrap(), 7300);
        assert_eq!(maestro.get_position(3).unwrap(), 0);
    }

    #[test]
    fn test_get_errors() {
        let (mut maestro, handle) = create_maestro();

        assert_eq!(maestro.get_errors().unwrap(), 0);

        handle.push_errors(0x0040);
        assert_eq!(maestro.get_errors().unwrap(), 0x0040);

        // The register is cleared after the read.
        assert_eq!(maestro.get_errors().unwrap(), 0);
    }

    #[test]
    fn test_go_home() {
        let (mut maestro, handle) = create_maestro();

        maestro.go_home().unwrap();

        assert_eq!(handle.written(), vec![0xA2]);
        assert_eq!(handle.device().count_home, 1);
    }

    #[test]
    fn test_write_failure() {
        let (mut maestro, handle) = create_maestro();

        handle.fail_after_writes(1);

        assert!(maestro.set_target(0, 6000).is_ok());

        let error = maestro.set_target(1, 6000).unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_read_failure() {
        let (mut maestro, handle) = create_maestro();

        handle.fail_reads();

        let error = maestro.get_errors().unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::TimedOut);
    }

    #[test]
    fn test_close() {
        let (mut maestro, handle) = create_maestro();

        assert!(maestro.close().is_ok());
        assert!(!maestro.is_open());

        // Closing again does not touch the transport.
        assert!(maestro.close().is_ok());
        assert_eq!(handle.device().count_close, 1);

        assert_eq!(
            maestro.set_target(0, 6000).unwrap_err().kind(),
            io::ErrorKind::NotConnected
        );
    }

    #[test]
    fn test_drop_closes() {
        let (maestro, handle) = create_maestro();

        drop(maestro);

        assert_eq!(handle.device().count_close, 1);
    }

    #[test]
    fn test_is_digital_high() {
        assert!(!is_digital_high(5999));
        assert!(is_digital_high(6000));
        assert!(is_digital_high(8000));
    }
}
