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


use std::fmt;

use super::{ErrorCtrl, RSSPosDir};
use typed_builder::TypedBuilder;

/// PropOpts stores the integrator options, including the minimum and maximum step sizes, and the
/// max error size. All step sizes are path lengths in meters.
///
/// Note that different step sizes and max errors are only used for adaptive
/// methods. To use a fixed step integrator, initialize the options using `with_fixed_step`, and
/// use whichever adaptive step integrator is desired.
#[derive(Clone, Copy, Debug, TypedBuilder)]
#[builder(doc)]
pub struct PropOpts<E: ErrorCtrl> {
    #[builder(default = 5e-4)]
    pub init_step: f64,
    #[builder(default = 1e-9)]
    pub min_step: f64,
    #[builder(default = 0.5)]
    pub max_step: f64,
    #[builder(default = 1e-6)]
    pub tolerance: f64,
    #[builder(default = 50)]
    pub attempts: u8,
    #[builder(default = false)]
    pub fixed_step: bool,
    #[builder(default)]
    pub error_ctrl: E,
}

impl<E: ErrorCtrl> PropOpts<E> {
    /// `with_adaptive_step` initializes an `PropOpts` such that the integrator is used with an
    ///  adaptive step size. The number of attempts is currently fixed to 50 (as in GMAT).
    pub fn with_adaptive_step(min_step: f64, max_step: f64, tolerance: f64, error_ctrl: E) -> Self {
        PropOpts {
            init_step: max_step,
            min_step,
            max_step,
            tolerance,
            attempts: 50,
            fixed_step: false,
            error_ctrl,
        }
    }

    /// Returns a string with the information about these options
    pub fn info(&self) -> String {
        format!("{self}")
    }

    /// Set the maximum step size and sets the initial step to that value if currently greater
    pub fn set_max_step(&mut self, max_step: f64) {
        if self.init_step > max_step {
            self.init_step = max_step;
        }
        self.max_step = max_step;
    }

    /// Set the minimum step size and sets the initial step to that value if currently smaller
    pub fn set_min_step(&mut self, min_step: f64) {
        if self.init_step < min_step {
            self.init_step = min_step;
        }
        self.min_step = min_step;
    }
}

impl<E: ErrorCtrl> fmt::Display for PropOpts<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fixed_step {
            write!(f, "fixed step: {:e} m", self.min_step,)
        } else {
            write!(
                f,
                "min_step: {:e} m, max_step: {:e} m, tol: {:e}, attempts: {}",
                self.min_step, self.max_step, self.tolerance, self.attempts,
            )
        }
    }
}

impl PropOpts<RSSPosDir> {
    /// `with_fixed_step` initializes an `PropOpts` such that the integrator is used with a fixed
    ///  step size.
    pub fn with_fixed_step(step: f64) -> Self {
        PropOpts {
            init_step: step,
            min_step: step,
            max_step: step,
            tolerance: 0.0,
            fixed_step: true,
            attempts: 0,
            error_ctrl: RSSPosDir {},
        }
    }

    /// Returns the default options with a specific tolerance.
    #[allow(clippy::field_reassign_with_default)]
    pub fn with_tolerance(tolerance: f64) -> Self {
        let mut opts = Self::default();
        opts.tolerance = tolerance;
        opts
    }
}

impl Default for PropOpts<RSSPosDir> {
    /// `default` returns the options of a swim with the default swimmer configuration.
    fn default() -> PropOpts<RSSPosDir> {
        Self::builder().build()
    }
}

#[test]
fn test_options() {
    use super::error_ctrl::RSSStep;

    let opts = PropOpts::with_fixed_step(1e-3);
    assert_eq!(opts.min_step, 1e-3);
    assert_eq!(opts.max_step, 1e-3);
    assert!(opts.tolerance.abs() < f64::EPSILON);
    assert!(opts.fixed_step);

    let opts = PropOpts::with_adaptive_step(1e-9, 0.5, 1e-8, RSSStep {});
    assert_eq!(opts.min_step, 1e-9);
    assert_eq!(opts.max_step, 0.5);
    assert_eq!(opts.init_step, 0.5);
    assert!((opts.tolerance - 1e-8).abs() < f64::EPSILON);
    assert!(!opts.fixed_step);

    let mut opts: PropOpts<RSSPosDir> = Default::default();
    assert_eq!(opts.init_step, 5e-4);
    assert_eq!(opts.min_step, 1e-9);
    assert_eq!(opts.max_step, 0.5);
    assert!((opts.tolerance - 1e-6).abs() < f64::EPSILON);
    assert_eq!(opts.attempts, 50);
    assert!(!opts.fixed_step);

    opts.set_max_step(1e-4);
    assert_eq!(opts.init_step, 1e-4);
    opts.set_min_step(2e-4);
    assert_eq!(opts.init_step, 2e-4);

    let opts = PropOpts::<RSSStep>::builder()
        .tolerance(1e-10)
        .max_step(0.1)
        .build();
    assert_eq!(opts.max_step, 0.1);
    assert_eq!(opts.attempts, 50);
}
