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


use serde_derive::{Deserialize, Serialize};
use snafu::prelude::*;
use std::fmt;

/// Provides different methods for controlling the error computation of the integrator.
pub mod error_ctrl;
pub use self::error_ctrl::*;

// Re-Export
mod instance;
pub use instance::*;
mod propagator;
pub use propagator::*;
mod rk_methods;
pub use rk_methods::*;
mod options;
pub use options::*;

use crate::dynamics::DynamicsError;

/// Stores the details of the previous integration step of a given propagator. Access as `my_prop.clone().latest_details()`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IntegrationDetails {
    /// step size used, in meters of path length
    pub step: f64,
    /// error in the previous integration step
    pub error: f64,
    /// number of attempts needed by an adaptive step size to be within the tolerance
    pub attempts: u8,
}

impl fmt::Display for IntegrationDetails {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "IntegrationDetails {{step: {:.3e} m, error: {:.3e}, attempts: {}}}",
            self.step, self.error, self.attempts
        )
    }
}

#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PropagationError {
    #[snafu(display("encountered a dynamics error {source}"))]
    Dynamics { source: DynamicsError },
    #[snafu(display("no finite step could be taken from s = {s} m, even at {step} m"))]
    NonFiniteState { s: f64, step: f64 },
}

/// The Runge Kutta methods available to a swimmer, selectable from its configuration.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntegratorKind {
    #[default]
    Dormand45,
    CashKarp45,
    Fehlberg45,
    Verner56,
}

impl IntegratorKind {
    /// Builds the propagator of this kind for the provided dynamics and options.
    pub fn propagator<D, E>(self, dynamics: D, opts: PropOpts<E>) -> Propagator<D, E>
    where
        D: crate::dynamics::Dynamics,
        E: ErrorCtrl,
    {
        match self {
            Self::Dormand45 => Propagator::new::<Dormand45>(dynamics, opts),
            Self::CashKarp45 => Propagator::new::<CashKarp45>(dynamics, opts),
            Self::Fehlberg45 => Propagator::new::<Fehlberg45>(dynamics, opts),
            Self::Verner56 => Propagator::new::<Verner56>(dynamics, opts),
        }
    }
}

impl fmt::Display for IntegratorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::Dormand45 => "Dormand-Prince 4(5)",
            Self::CashKarp45 => "Cash-Karp 4(5)",
            Self::Fehlberg45 => "Fehlberg 4(5)",
            Self::Verner56 => "Verner 5(6)",
        };
        write!(f, "{name}")
    }
}
