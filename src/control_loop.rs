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

use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::sleep;
use std::time::Duration;

use crate::config::Config;
use crate::enums::{DeviceError, LoopState};
use crate::error::DriveError;
use crate::input::InputEventSource;
use crate::joystick::Joystick;
use crate::maestro::Maestro;
use crate::transport::ByteTransport;

/// Loop that drives the steering and the drive channels from the gamepad.
pub struct ControlLoop<T: ByteTransport, S: InputEventSource> {
    pub config: Config,
    _maestro: Maestro<T>,
    _joystick: Joystick<S>,
    _state: LoopState,
}

impl<T: ByteTransport, S: InputEventSource> ControlLoop<T, S> {
    /// Create a new control loop.
    ///
    /// # Arguments
    /// * `config` - Configuration.
    /// * `maestro` - Controller. The loop owns it.
    /// * `joystick` - Joystick. The loop owns it.
    ///
    /// # Returns
    /// A new control loop in the Init state.
    pub fn new(config: &Config, maestro: Maestro<T>, joystick: Joystick<S>) -> Self {
        Self {
            config: config.clone(),
            _maestro: maestro,
            _joystick: joystick,
            _state: LoopState::Init,
        }
    }

    /// Get the current state.
    pub fn state(&self) -> LoopState {
        self._state
    }

    fn transition(&mut self, state: LoopState) {
        info!(
            "Control loop: {} -> {}.",
            self._state.as_ref(),
            state.as_ref()
        );
        self._state = state;
    }

    /// Configure the limits of both channels and center them.
    pub fn init(&mut self) -> Result<(), DriveError> {
        for channel in [self.config.channel_steer, self.config.channel_drive] {
            self._maestro
                .set_target(channel, self.config.neutral_target)?;
            self._maestro.set_speed(channel, self.config.speed_limit)?;
            self._maestro
                .set_acceleration(channel, self.config.acceleration_limit)?;
        }

        Ok(())
    }

    /// Run one cycle: sample the joystick, command both channels and check
    /// the error register of the controller.
    ///
    /// # Returns
    /// Drive and steer targets that were sent. DriveError::Device if the
    /// controller reports any error.
    pub fn step(&mut self) -> Result<(u16, u16), DriveError> {
        let input_drive = self._joystick.get_abs(self.config.drive.axis)?;
        let input_steer = self._joystick.get_abs(self.config.steer.axis)?;

        let target_drive = self.config.drive.to_target(input_drive);
        let target_steer = self.config.steer.to_target(input_steer);

        self._maestro
            .set_target(self.config.channel_drive, target_drive)?;
        self._maestro
            .set_target(self.config.channel_steer, target_steer)?;

        debug!("drive: {target_drive}, steer: {target_steer}");

        let errors = self._maestro.get_errors()?;
        if errors != 0 {
            return Err(DriveError::Device { errors });
        }

        Ok((target_drive, target_steer))
    }

    /// Run the loop until the stop flag is set or an error happens. Both the
    /// controller and the joystick are closed on return.
    ///
    /// # Arguments
    /// * `stop` - Flag to stop the loop. It is checked once per cycle.
    ///
    /// # Returns
    /// Ok after the graceful shutdown. Otherwise, the error that stopped the
    /// loop.
    pub fn run(&mut self, stop: &AtomicBool) -> Result<(), DriveError> {
        let result = self.run_until_exit(stop);

        if let Err(error) = &result {
            error!("Control loop is stopped: {error}.");
        }

        self.close();

        result
    }

    fn run_until_exit(&mut self, stop: &AtomicBool) -> Result<(), DriveError> {
        self.init()?;
        self.transition(LoopState::Running);

        let period = Duration::from_millis(self.config.tick_interval_ms);
        loop {
            if stop.load(Ordering::Relaxed) {
                self.transition(LoopState::ShuttingDown);
                self._maestro.go_home()?;

                return Ok(());
            }

            match self.step() {
                Ok(_) => {}
                Err(DriveError::Device { errors }) => {
                    self.transition(LoopState::Fault);
                    DeviceError::from_bitmask(errors)
                        .iter()
                        .for_each(|device_error| {
                            error!("Controller reports {}.", device_error.as_ref())
                        });

                    // Already failing, so the home command is best-effort.
                    if let Err(error) = self._maestro.go_home() {
                        warn!("Failed to send the channels home: {error}.");
                    }

                    return Err(DriveError::Device { errors });
                }
                Err(error) => return Err(error),
            }

            sleep(period);
        }
    }

    /// Close the controller and the joystick.
    pub fn close(&mut self) {
        if let Err(error) = self._maestro.close() {
            warn!("Failed to close the controller: {error}.");
        }

        if let Err(error) = self._joystick.close() {
            warn!("Failed to close the joystick: {error}.");
        }

        if self._state != LoopState::Closed {
            self.transition(LoopState::Closed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io;
    use std::sync::Arc;
    use std::thread::spawn;

    use crate::enums::{Axis, CommandId};
    use crate::mock::mock_constants::{MOCK_AXIS_MAXIMUM, MOCK_AXIS_MINIMUM};
    use crate::mock::mock_input_device::MockInputDevice;
    use crate::mock::mock_transport::MockTransport;
    use crate::protocol::encode_set_command;

    // Bytes written by init().
    const LENGTH_INIT: usize = 6 * 4;

    fn create_control_loop() -> (
        ControlLoop<MockTransport, MockInputDevice>,
        MockTransport,
        MockInputDevice,
    ) {
        let transport = MockTransport::new();
        let device = MockInputDevice::new();

        let control_loop = ControlLoop::new(
            &Config::default(),
            Maestro::new(transport.clone()),
            Joystick::new(device.clone(), false).unwrap(),
        );

        (control_loop, transport, device)
    }

    fn count_command(transport: &MockTransport, command: CommandId) -> usize {
        transport
            .written()
            .iter()
            .filter(|byte| **byte == command as u8)
            .count()
    }

    #[test]
    fn test_init() {
        let (mut control_loop, transport, _) = create_control_loop();

        assert!(control_loop.init().is_ok());

        let device = transport.device();
        for channel in [0, 1] {
            assert_eq!(device.targets[channel], 6000);
            assert_eq!(device.speeds[channel], 100);
            assert_eq!(device.accelerations[channel], 100);
        }

        assert_eq!(transport.written().len(), LENGTH_INIT);
        assert_eq!(control_loop.state(), LoopState::Init);
    }

    #[test]
    fn test_step_centered() {
        let (mut control_loop, transport, _) = create_control_loop();

        assert_eq!(control_loop.step().unwrap(), (6000, 6300));

        // Drive first, then steer, then the error query.
        let mut expected = Vec::new();
        expected.extend(encode_set_command(CommandId::SetTarget, 1, 6000));
        expected.extend(encode_set_command(CommandId::SetTarget, 0, 6300));
        expected.push(0xA1);

        assert_eq!(transport.written(), expected);
    }

    #[test]
    fn test_step_full_deflection() {
        let (mut control_loop, transport, device) = create_control_loop();

        device.push_axis(Axis::LeftY, MOCK_AXIS_MAXIMUM);
        device.push_axis(Axis::RightX, MOCK_AXIS_MINIMUM);

        assert_eq!(control_loop.step().unwrap(), (5500, 7300));

        let device = transport.device();
        assert_eq!(device.targets[1], 5500);
        assert_eq!(device.targets[0], 7300);
    }

    #[test]
    fn test_step_device_fault() {
        let (mut control_loop, transport, _) = create_control_loop();

        transport.push_errors(0x0002);

        assert!(matches!(
            control_loop.step(),
            Err(DriveError::Device { errors: 0x0002 })
        ));

        // step() itself does not send the channels home.
        assert_eq!(transport.device().count_home, 0);
    }

    #[test]
    fn test_run_stop_before_start() {
        let (mut control_loop, transport, device) = create_control_loop();

        let stop = AtomicBool::new(true);
        assert!(control_loop.run(&stop).is_ok());

        assert_eq!(count_command(&transport, CommandId::GetErrors), 0);
        assert_eq!(transport.device().count_home, 1);
        assert_eq!(transport.device().count_close, 1);
        assert_eq!(device.count_close(), 1);
        assert_eq!(control_loop.state(), LoopState::Closed);
    }

    #[test]
    fn test_run_stop() {
        let (mut control_loop, transport, device) = create_control_loop();

        let stop = Arc::new(AtomicBool::new(false));
        let stop_loop = stop.clone();

        let handle = spawn(move || {
            let result = control_loop.run(&stop_loop);
            (result, control_loop.state())
        });

        sleep(Duration::from_millis(200));
        device.push_axis(Axis::LeftY, MOCK_AXIS_MAXIMUM);
        sleep(Duration::from_millis(100));

        stop.store(true, Ordering::Relaxed);

        let (result, state) = handle.join().unwrap();
        assert!(result.is_ok());
        assert_eq!(state, LoopState::Closed);

        assert!(count_command(&transport, CommandId::GetErrors) > 1);
        assert_eq!(transport.device().count_home, 1);
        assert_eq!(transport.device().count_close, 1);
        assert_eq!(device.count_close(), 1);

        // The last command before the home is the error query.
        let written = transport.written();
        assert_eq!(written[written.len() - 2..], [0xA1, 0xA2]);
    }

    #[test]
    fn test_run_device_fault() {
        let (mut control_loop, transport, device) = create_control_loop();

        transport.push_errors(0);
        transport.push_errors(0);
        transport.push_errors(0x0040);

        let stop = AtomicBool::new(false);
        let result = control_loop.run(&stop);

        assert!(matches!(result, Err(DriveError::Device { errors: 0x0040 })));
        assert_eq!(result.unwrap_err().exit_code(), 3);

        assert_eq!(count_command(&transport, CommandId::GetErrors), 3);
        assert_eq!(transport.device().count_home, 1);
        assert_eq!(*transport.written().last().unwrap(), 0xA2);

        assert_eq!(transport.device().count_close, 1);
        assert_eq!(device.count_close(), 1);
        assert_eq!(control_loop.state(), LoopState::Closed);
    }

    #[test]
    fn test_run_device_fault_home_failure() {
        let (mut control_loop, transport, device) = create_control_loop();

        transport.push_errors(0x0040);

        // Init and the first cycle go through, then the home command fails.
        transport.fail_after_writes(9);

        let stop = AtomicBool::new(false);
        let result = control_loop.run(&stop);

        // The device fault is still reported, not the failed home command.
        assert!(matches!(result, Err(DriveError::Device { errors: 0x0040 })));

        assert_eq!(transport.device().count_home, 0);
        assert_eq!(*transport.written().last().unwrap(), 0xA1);

        assert_eq!(transport.device().count_close, 1);
        assert_eq!(device.count_close(), 1);
        assert_eq!(control_loop.state(), LoopState::Closed);
    }

    #[test]
    fn test_run_write_failure() {
        let (mut control_loop, transport, device) = create_control_loop();

        // Init and the drive target of the first cycle go through.
        transport.fail_after_writes(7);

        let stop = AtomicBool::new(false);
        let result = control_loop.run(&stop);

        match result {
            Err(DriveError::Transport(error)) => {
                assert_eq!(error.kind(), io::ErrorKind::BrokenPipe)
            }
            _ => panic!("Should be a transport fault."),
        }

        // Nothing more is sent after the failure.
        assert_eq!(transport.written().len(), LENGTH_INIT + 4);
        assert_eq!(transport.device().count_home, 0);

        assert_eq!(transport.device().count_close, 1);
        assert_eq!(device.count_close(), 1);
    }

    #[test]
    fn test_run_init_failure() {
        let (mut control_loop, transport, device) = create_control_loop();

        transport.fail_after_writes(0);

        let stop = AtomicBool::new(false);
        assert!(matches!(
            control_loop.run(&stop),
            Err(DriveError::Transport(_))
        ));

        assert!(transport.written().is_empty());
        assert_eq!(transport.device().count_close, 1);
        assert_eq!(device.count_close(), 1);
        assert_eq!(control_loop.state(), LoopState::Closed);
    }

    #[test]
    fn test_run_read_failure() {
        let (mut control_loop, transport, device) = create_control_loop();

        transport.fail_reads();

        let stop = AtomicBool::new(false);
        assert!(matches!(
            control_loop.run(&stop),
            Err(DriveError::Transport(_))
        ));

        assert_eq!(transport.device().count_home, 0);
        assert_eq!(count_command(&transport, CommandId::GetErrors), 1);
        assert_eq!(transport.device().count_close, 1);
        assert_eq!(device.count_close(), 1);
    }

    #[test]
    fn test_run_input_failure() {
        let (mut control_loop, transport, device) = create_control_loop();

        device.fail_reads();

        let stop = AtomicBool::new(false);
        assert!(matches!(
            control_loop.run(&stop),
            Err(DriveError::Transport(_))
        ));

        // Only the init commands are sent.
        assert_eq!(transport.written().len(), LENGTH_INIT);
        assert_eq!(transport.device().count_close, 1);
        assert_eq!(device.count_close(), 1);
    }
}
