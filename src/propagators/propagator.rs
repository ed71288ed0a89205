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


use super::error_ctrl::{ErrorCtrl, RSSPosDir};
use super::{Dormand45, IntegrationDetails, PropInstance, PropOpts, RK};
use crate::dynamics::Dynamics;
use crate::linalg::Vector6;
use crate::state::StateVector;

/// A Propagator allows propagating a set of dynamics forward along the path length.
/// It includes the options and the set of coefficients used for the monomorphic instance.
#[derive(Clone, Debug)]
pub struct Propagator<D: Dynamics, E: ErrorCtrl> {
    pub dynamics: D, // Stores the dynamics used. *Must* use this to get the latest values
    pub opts: PropOpts<E>, // Stores the integration options (tolerance, min/max step, init step, etc.)
    pub(crate) order: u8,  // Order of the integrator
    pub(crate) stages: usize, // Number of stages, i.e. how many times the derivatives will be called
    pub(crate) a_coeffs: &'static [f64],
    pub(crate) b_coeffs: &'static [f64],
}

impl<D: Dynamics, E: ErrorCtrl> Propagator<D, E> {
    /// Each propagator must be initialized with `new` which stores propagator information.
    pub fn new<T: RK>(dynamics: D, opts: PropOpts<E>) -> Self {
        Self {
            dynamics,
            opts,
            stages: T::STAGES,
            order: T::ORDER,
            a_coeffs: T::A_COEFFS,
            b_coeffs: T::B_COEFFS,
        }
    }

    /// Order of the propagated solution.
    pub fn order(&self) -> u8 {
        self.order
    }

    /// Starts a propagation of these dynamics from `state` at path length `s` (meters).
    pub fn with(&self, state: StateVector, s: f64) -> PropInstance<'_, D, E> {
        // Pre-allocate the k used in the propagator
        let k = vec![Vector6::<f64>::zeros(); self.stages];
        PropInstance {
            state,
            s,
            prop: self,
            details: IntegrationDetails {
                step: self.opts.init_step,
                error: 0.0,
                attempts: 1,
            },
            step_size: self.opts.init_step,
            max_step: self.opts.max_step,
            fixed_step: self.opts.fixed_step,
            k,
        }
    }
}

impl<D: Dynamics> Propagator<D, RSSPosDir> {
    /// Default propagator is a Dormand Prince 4-5 with the default PropOpts.
    pub fn default(dynamics: D) -> Self {
        Self::new::<Dormand45>(dynamics, PropOpts::default())
    }
}
