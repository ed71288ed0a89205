/*
    Magswim, adaptive charged-particle swimming through magnetic fields
    Copyright (C) 2018-onwards Christopher Rabotin <christopher.rabotin@gmail.com>

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/


use crate::errors::{InvalidTolerancesSnafu, SwimError};
use crate::io::SwimConfig;
use serde_derive::{Deserialize, Serialize};
use snafu::ensure;

/// The per-swim tolerances, in the external length unit of the swimmer.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tolerances {
    /// Requested distance to the target
    pub accuracy: f64,
    /// The swim fails if the target is not crossed within this path length
    pub max_path_length: f64,
    /// Initial step size
    pub init_step: f64,
    /// Local truncation error tolerance of the integrator
    pub tolerance: f64,
}

impl Tolerances {
    pub fn new(accuracy: f64, max_path_length: f64, init_step: f64, tolerance: f64) -> Self {
        Self {
            accuracy,
            max_path_length,
            init_step,
            tolerance,
        }
    }

    /// The tolerances set in a swimmer configuration.
    pub fn from_config(cfg: &SwimConfig) -> Self {
        Self::new(cfg.accuracy, cfg.max_path_length, cfg.init_step, cfg.tolerance)
    }

    /// Same tolerances with another accuracy.
    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = accuracy;
        self
    }

    /// Same tolerances with another maximum path length.
    pub fn with_max_path_length(mut self, max_path_length: f64) -> Self {
        self.max_path_length = max_path_length;
        self
    }

    pub fn validate(&self) -> Result<(), SwimError> {
        for (name, value) in [
            ("accuracy", self.accuracy),
            ("max_path_length", self.max_path_length),
            ("init_step", self.init_step),
            ("tolerance", self.tolerance),
        ] {
            ensure!(
                value.is_finite() && value > 0.0,
                InvalidTolerancesSnafu {
                    msg: format!("{name} must be positive and finite (got {value})")
                }
            );
        }
        Ok(())
    }
}

impl Default for Tolerances {
    fn default() -> Self {
        Self::from_config(&SwimConfig::default())
    }
}

#[test]
fn tolerances_validation() {
    let tol = Tolerances::default();
    assert_eq!(tol.accuracy, 20e-4);
    assert_eq!(tol.max_path_length, 900.0);
    assert!(tol.validate().is_ok());
    assert!(tol.with_accuracy(0.0).validate().is_err());
    assert!(tol
        .with_max_path_length(f64::INFINITY)
        .validate()
        .is_err());
    assert!(Tolerances::new(1e-3, 100.0, -1.0, 1e-6).validate().is_err());
}
