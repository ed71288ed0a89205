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

use crate::io::ConfigError;
use crate::md::trajectory::TrajError;
use crate::propagators::PropagationError;
use snafu::prelude::*;

/// Hard failures of a swim.
///
/// A track which misses its target, or which cannot be brought within the requested accuracy,
/// is *not* an error: those outcomes are reported in [`crate::SwimStatus`].
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SwimError {
    /// The integrator could not produce a finite step, even at the minimum step size.
    #[snafu(display("integration fault at s = {s} m: {source}"))]
    IntegrationFault { s: f64, source: PropagationError },
    #[snafu(display("trajectory bookkeeping failed: {source}"))]
    Trajectory { source: TrajError },
    #[snafu(display("invalid target: {msg}"))]
    InvalidTarget { msg: String },
    #[snafu(display("invalid tolerances: {msg}"))]
    InvalidTolerances { msg: String },
    #[snafu(display("swimmer configuration error: {source}"))]
    Config { source: ConfigError },
}

impl SwimError {
    /// Returns true if this error stems from a non-finite field, derivative or state.
    pub fn is_integration_fault(&self) -> bool {
        matches!(self, Self::IntegrationFault { .. })
    }
}
