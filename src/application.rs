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

use log::{info, warn};
use signal_hook::{
    consts::{SIGINT, SIGTERM},
    flag::register,
};
use std::sync::{atomic::AtomicBool, Arc};

use crate::config::Config;
use crate::control_loop::ControlLoop;
use crate::error::DriveError;
use crate::input::{EvdevSource, InputEventSource};
use crate::joystick::Joystick;
use crate::maestro::Maestro;
use crate::mock::{mock_input_device::MockInputDevice, mock_transport::MockTransport};
use crate::transport::{ByteTransport, SerialTransport};

/// Run the application until SIGINT/SIGTERM or an error.
///
/// # Arguments
/// * `config` - Configuration.
/// * `is_simulation_mode` - Is the simulation mode or not.
///
/// # Returns
/// Ok after the graceful shutdown.
pub fn run(config: &Config, is_simulation_mode: bool) -> Result<(), DriveError> {
    // Register the signals that stop the application
    let stop = Arc::new(AtomicBool::new(false));
    for signal in [SIGTERM, SIGINT].iter() {
        if let Err(error) = register(*signal, stop.clone()) {
            warn!("Failed to register the signal {signal}: {error}.");
        }
    }

    run_with_stop(config, is_simulation_mode, &stop)
}

/// Open the devices and run the control loop.
///
/// # Arguments
/// * `config` - Configuration.
/// * `is_simulation_mode` - Use the simulated controller and gamepad or not.
/// * `stop` - Flag to stop the control loop.
///
/// # Returns
/// Ok after the graceful shutdown.
pub fn run_with_stop(
    config: &Config,
    is_simulation_mode: bool,
    stop: &AtomicBool,
) -> Result<(), DriveError> {
    // Log the running mode
    let mode = if is_simulation_mode {
        "simulation mode"
    } else {
        "hardware mode"
    };
    info!("Run the drive in {mode}.");

    if is_simulation_mode {
        let joystick = Joystick::new(MockInputDevice::new(), config.clamp_axis)?;
        let maestro = Maestro::new(MockTransport::new());

        return run_control_loop(config, maestro, joystick, stop);
    }

    // The joystick is closed by its drop if the serial port fails to open.
    let joystick = Joystick::new(EvdevSource::open(&config.joystick_path)?, config.clamp_axis)?;
    let maestro = Maestro::new(SerialTransport::open(
        &config.maestro_path,
        config.baud_rate,
        config.read_timeout_ms,
    )?);

    run_control_loop(config, maestro, joystick, stop)
}

fn run_control_loop<T: ByteTransport, S: InputEventSource>(
    config: &Config,
    maestro: Maestro<T>,
    joystick: Joystick<S>,
    stop: &AtomicBool,
) -> Result<(), DriveError> {
    let mut control_loop = ControlLoop::new(config, maestro, joystick);
    control_loop.run(stop)?;

    info!("Drive is stopped.");

    Ok(())
}
