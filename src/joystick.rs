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
use std::collections::{HashMap, HashSet};
use std::io;
use strum::IntoEnumIterator;

use crate::constants::EVENT_TYPE_ABSOLUTE;
use crate::enums::Axis;
use crate::input::{AbsRange, InputEventSource};

/// Gamepad that keeps the latest normalized value of each stick axis.
pub struct Joystick<S: InputEventSource> {
    _source: S,
    // Calibration range read when the joystick is opened.
    _ranges: HashMap<Axis, AbsRange>,
    // Latest value in [-1, 1] as long as the calibration range holds.
    _values: HashMap<Axis, f64>,
    // Clamp the values that leave the calibration range or not.
    _clamp: bool,
    // Axes already reported out of the calibration range.
    _out_of_range: HashSet<Axis>,
    _is_open: bool,
}

impl<S: InputEventSource> Joystick<S> {
    /// Create a new joystick and read the calibration ranges of the axes.
    ///
    /// # Arguments
    /// * `source` - Opened input event source. The joystick owns it.
    /// * `clamp` - Clamp the normalized value to [-1, 1] or not.
    ///
    /// # Returns
    /// A new joystick with all the axes at 0.
    pub fn new(mut source: S, clamp: bool) -> io::Result<Self> {
        let mut ranges = HashMap::new();
        for axis in Axis::iter() {
            let range = source.abs_range(axis.code())?;
            if range.maximum <= range.minimum {
                warn!(
                    "Axis {} has an empty calibration range [{}, {}] and will read as 0.",
                    axis.as_ref(),
                    range.minimum,
                    range.maximum
                );
            }

            ranges.insert(axis, range);
        }

        info!("Joystick calibration: {:?}.", ranges);

        Ok(Self {
            _source: source,
            _ranges: ranges,
            _values: Axis::iter().map(|axis| (axis, 0.0)).collect(),
            _clamp: clamp,
            _out_of_range: HashSet::new(),
            _is_open: true,
        })
    }

    /// Drain all the pending events without blocking and update the values of
    /// the tracked axes.
    fn update(&mut self) -> io::Result<()> {
        while let Some(event) = self._source.read_one()? {
            if event.event_type != EVENT_TYPE_ABSOLUTE {
                continue;
            }

            let axis = match Axis::from_repr(event.code) {
                Some(axis) => axis,
                None => continue,
            };

            if let Some(range) = self._ranges.get(&axis) {
                let mut value = normalize(event.value, range);

                if !(-1.0..=1.0).contains(&value) {
                    if self._out_of_range.insert(axis) {
                        warn!(
                            "Axis {} reads {} outside of the calibration range [{}, {}].",
                            axis.as_ref(),
                            event.value,
                            range.minimum,
                            range.maximum
                        );
                    }

                    if self._clamp {
                        value = value.clamp(-1.0, 1.0);
                    }
                }

                self._values.insert(axis, value);
            }
        }

        Ok(())
    }

    /// Get the current value of an axis.
    ///
    /// # Arguments
    /// * `axis` - Axis.
    ///
    /// # Returns
    /// Value in [-1, 1]. An axis without any event reads as 0.
    pub fn get_abs(&mut self, axis: Axis) -> io::Result<f64> {
        if !self._is_open {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "Joystick is closed",
            ));
        }

        self.update()?;

        Ok(self._values.get(&axis).copied().unwrap_or(0.0))
    }

    /// The joystick is open or not.
    pub fn is_open(&self) -> bool {
        self._is_open
    }

    /// Close the joystick. It is fine to call this more than once.
    pub fn close(&mut self) -> io::Result<()> {
        if !self._is_open {
            return Ok(());
        }

        self._is_open = false;
        self._source.close()?;

        debug!("Joystick is closed.");

        Ok(())
    }
}

impl<S: InputEventSource> Drop for Joystick<S> {
    fn drop(&mut self) {
        if let Err(error) = self.close() {
            warn!("Failed to close the joystick: {error}.");
        }
    }
}

/// Normalize the raw value of an axis.
///
/// # Arguments
/// * `value` - Raw value.
/// * `range` - Calibration range of the axis.
///
/// # Returns
/// -1.0 at the minimum and 1.0 at the maximum. Values outside of the range
/// map outside of [-1, 1]. An empty range gives 0.
pub fn normalize(value: i32, range: &AbsRange) -> f64 {
    if range.maximum <= range.minimum {
        return 0.0;
    }

    let span = (range.maximum as f64) - (range.minimum as f64);
    ((value as f64) - (range.minimum as f64)) / span * 2.0 - 1.0
}
