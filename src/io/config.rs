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


use super::{ConfigError, ConfigRepr, InvalidSnafu};
use crate::propagators::{ErrorCtrl, IntegratorKind, PropOpts};
use crate::units::LengthUnit;
use serde_derive::{Deserialize, Serialize};
use snafu::ensure;
use std::fmt;
use typed_builder::TypedBuilder;

/// The configuration of a swimmer.
///
/// All lengths are expressed in `length_unit`, centimeters by default, and the momenta in GeV/c.
/// Every field has a default, so a YAML file only needs to list what it changes.
///
/// ```
/// use magswim::io::{ConfigRepr, SwimConfig};
/// use magswim::units::LengthUnit;
///
/// let cfg = SwimConfig::loads("length_unit: Millimeter\naccuracy: 0.01\n").unwrap();
/// assert_eq!(cfg.length_unit, LengthUnit::Millimeter);
/// assert_eq!(cfg.accuracy, 0.01);
/// assert_eq!(cfg.refine_divisor, 100.0);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[serde(default)]
#[builder(doc)]
pub struct SwimConfig {
    /// External length unit of positions, path lengths and accuracies
    #[builder(default)]
    pub length_unit: LengthUnit,
    /// Requested distance to the target
    #[builder(default = 20e-4)]
    pub accuracy: f64,
    /// Initial step size
    #[builder(default = 500e-4)]
    pub init_step: f64,
    /// Smallest step size, below which steps are accepted regardless of their error
    #[builder(default = 1e-7)]
    pub min_step: f64,
    #[builder(default = 50.0)]
    pub max_step: f64,
    /// Local truncation error tolerance of the integrator
    #[builder(default = 1e-6)]
    pub tolerance: f64,
    /// Swims stop once this path length is travelled
    #[builder(default = 900.0)]
    pub max_path_length: f64,
    /// Tracks starting further from the z axis than this are unphysical
    #[builder(default = 800.0)]
    pub max_start_radius: f64,
    /// Tracks with a momentum below this, in GeV/c, are unphysical
    #[builder(default = 0.05)]
    pub min_momentum: f64,
    /// The initial step of a refinement is the bracket divided by this
    #[builder(default = 100.0)]
    pub refine_divisor: f64,
    #[builder(default = 100)]
    pub max_refinements: usize,
    /// Maximum number of attempts of a single step
    #[builder(default = 50)]
    pub attempts: u8,
    #[builder(default)]
    pub integrator: IntegratorKind,
    /// Return the trajectory of each swim
    #[builder(default = false)]
    pub keep_trajectory: bool,
    /// Accumulate the transverse field integral of each swim
    #[builder(default = true)]
    pub compute_field_integral: bool,
}

impl Default for SwimConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ConfigRepr for SwimConfig {}

impl SwimConfig {
    /// Rejects non-finite and non-positive settings, and inconsistent step bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("accuracy", self.accuracy),
            ("init_step", self.init_step),
            ("min_step", self.min_step),
            ("max_step", self.max_step),
            ("tolerance", self.tolerance),
            ("max_path_length", self.max_path_length),
            ("max_start_radius", self.max_start_radius),
            ("min_momentum", self.min_momentum),
            ("refine_divisor", self.refine_divisor),
        ] {
            ensure!(
                value.is_finite() && value > 0.0,
                InvalidSnafu {
                    msg: format!("{name} must be positive and finite (got {value})")
                }
            );
        }
        ensure!(
            self.min_step <= self.max_step,
            InvalidSnafu {
                msg: format!(
                    "min_step ({}) exceeds max_step ({})",
                    self.min_step, self.max_step
                )
            }
        );
        ensure!(
            self.refine_divisor >= 1.0,
            InvalidSnafu {
                msg: format!("refine_divisor must be at least 1 (got {})", self.refine_divisor)
            }
        );
        ensure!(
            self.attempts > 0 && self.max_refinements > 0,
            InvalidSnafu {
                msg: "attempts and max_refinements must be at least 1".to_string()
            }
        );
        Ok(())
    }

    /// Integrator options of a swim, in meters, with the provided tolerance and initial step
    /// (in the external unit).
    pub fn prop_opts<E: ErrorCtrl>(&self, init_step: f64, tolerance: f64) -> PropOpts<E> {
        let unit = self.length_unit;
        let min_step = unit.to_internal(self.min_step);
        let max_step = unit.to_internal(self.max_step);
        PropOpts::builder()
            .init_step(unit.to_internal(init_step).clamp(min_step, max_step))
            .min_step(min_step)
            .max_step(max_step)
            .tolerance(tolerance)
            .attempts(self.attempts)
            .build()
    }
}

impl fmt::Display for SwimConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} swimmer in {} (accuracy {:e}, steps in [{:e}, {:e}], tol {:e}, max path length {})",
            self.integrator,
            self.length_unit,
            self.accuracy,
            self.min_step,
            self.max_step,
            self.tolerance,
            self.max_path_length
        )
    }
}
