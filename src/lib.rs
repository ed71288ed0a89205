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

/*! # magswim

Adaptive swimming of charged particles through a magnetic field.

A swim integrates the equations of motion of a charged track, parameterized by its path length,
from a vertex to a geometric target (a plane, a cylinder, a sphere, a fixed z, a fixed rho, the
beamline or the trajectory of another track) to a requested spatial accuracy. Crossings are
bracketed by the adaptive integrator and then refined in place, without restarting the swim from
the vertex.

```
use magswim::field::UniformField;
use magswim::swim::{Swimmer, Tolerances};
use magswim::InitialConditions;

// 2 GeV/c positive track at 15 degrees in a 5 T solenoidal field
let swimmer = Swimmer::new(UniformField::solenoidal(50.0));
let track = InitialConditions::new(1, 0.0, 0.0, 0.0, 2.0, 15.0, 5.0);
let tol = Tolerances::new(1e-4, 1000.0, 0.5, 1e-8);

let rslt = swimmer.swim_to_z(&track, 300.0, Default::default(), &tol).unwrap();
assert!(rslt.is_success());
assert!((rslt.position.z - 300.0).abs() < 1e-4);
```
*/

/// Length units and the physical constants used to convert between them.
pub mod units;

/// The state vector of a swim and the initial conditions of a track.
pub mod state;

/// Magnetic field probes, i.e. the field collaborator of the swimmer.
pub mod field;

/// Equations of motion of a charged particle in a magnetic field.
pub mod dynamics;

/// Provides the adaptive Runge Kutta integrators used for swimming.
pub mod propagators;

/// Lines, planes, cylinders and polylines used to define swim targets, and the sector frames.
pub mod geometry;

/// Trajectories and swim targets (termination policies).
pub mod md;

/// The swimmer itself: swim to a target, crossing refinement and results.
pub mod swim;

/// Configuration loading.
pub mod io;

mod errors;
/// Functions which may fail return a [`SwimError`]; legitimate outcomes such as missing the target are statuses.
pub use self::errors::SwimError;

#[macro_use]
extern crate log;
extern crate nalgebra as na;

/// Re-export nalgebra
pub mod linalg {
    pub use na::base::*;
    pub use na::geometry::Rotation3;
}

/// Re-export some useful things
pub use self::field::FieldProbe;
pub use self::state::{InitialConditions, StateVector};
pub use self::swim::{SwimResult, SwimStatus, Swimmer, Tolerances};
