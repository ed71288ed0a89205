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


use crate::errors::{ConfigSnafu, InvalidTargetSnafu, SwimError};
use crate::field::FieldProbe;
use crate::geometry::{Cylinder, Line, Plane, Polyline, Sector};
use crate::io::{ConfigRepr, SwimConfig};
use crate::linalg::Vector3;
use crate::md::events::{CrossingDirection, Target};
use crate::md::trajectory::Traj;
use crate::propagators::{ErrorCtrl, RSSPosDir};
use crate::state::InitialConditions;
use crate::units::KILOGAUSS_TO_TESLA;
use rayon::prelude::*;
use serde_derive::{Deserialize, Serialize};
use snafu::{OptionExt, ResultExt};
use std::fmt;
use std::marker::PhantomData;

mod refine;
mod result;
mod tolerances;

pub use result::{SwimResult, SwimStatus};
pub use tolerances::Tolerances;

/// The swimmer: integrates charged tracks through the field of its probe until they reach a target.
///
/// A swimmer holds no mutable state: the same swimmer may be used from many threads at once,
/// each swim owning its own trajectory and crossing tracker.
///
/// All positions, path lengths and accuracies at this interface are in the length unit of the
/// configuration (centimeters by default), the angles in degrees and the momenta in GeV/c.
pub struct Swimmer<F: FieldProbe, E: ErrorCtrl = RSSPosDir> {
    probe: F,
    config: SwimConfig,
    _error_ctrl: PhantomData<E>,
}

impl<F: FieldProbe> Swimmer<F, RSSPosDir> {
    /// A swimmer with the default configuration.
    pub fn new(probe: F) -> Self {
        Self {
            probe,
            config: SwimConfig::default(),
            _error_ctrl: PhantomData,
        }
    }

    /// A swimmer with the provided configuration, which is validated.
    pub fn with_config(probe: F, config: SwimConfig) -> Result<Self, SwimError> {
        Self::with_error_ctrl(probe, config)
    }
}

impl<F: FieldProbe, E: ErrorCtrl> Swimmer<F, E> {
    /// A swimmer with the provided configuration and a specific error control.
    pub fn with_error_ctrl(probe: F, config: SwimConfig) -> Result<Self, SwimError> {
        config.validate().context(ConfigSnafu)?;
        Ok(Self {
            probe,
            config,
            _error_ctrl: PhantomData,
        })
    }

    pub fn config(&self) -> &SwimConfig {
        &self.config
    }

    pub fn probe(&self) -> &F {
        &self.probe
    }

    /// The tolerances of this swimmer's configuration.
    pub fn tolerances(&self) -> Tolerances {
        Tolerances::from_config(&self.config)
    }

    /// Field in tesla at a position in the external length unit.
    pub fn field_at(&self, x: f64, y: f64, z: f64) -> Vector3<f64> {
        let to_cm = self.config.length_unit.in_meters() * crate::units::CENTIMETERS_PER_METER;
        self.probe.field(x * to_cm, y * to_cm, z * to_cm) * KILOGAUSS_TO_TESLA
    }

    /// Field in tesla in the tilted frame of `sector`, at a position in that frame.
    pub fn field_at_sector(
        &self,
        sector: u8,
        x: f64,
        y: f64,
        z: f64,
    ) -> Result<Vector3<f64>, SwimError> {
        let sector = Self::sector(sector)?;
        let lab = sector.to_lab(&Vector3::new(x, y, z));
        Ok(sector.from_lab(&self.field_at(lab.x, lab.y, lab.z)))
    }

    fn sector(sector: u8) -> Result<Sector, SwimError> {
        Sector::new(sector).context(InvalidTargetSnafu {
            msg: format!("sector must be in 1 to {} (got {sector})", Sector::COUNT),
        })
    }

    /// Swims to the plane through `point` with the provided `normal`.
    pub fn swim_to_plane(
        &self,
        initial: &InitialConditions,
        normal: Vector3<f64>,
        point: Vector3<f64>,
        tol: &Tolerances,
    ) -> Result<SwimResult, SwimError> {
        let plane = Plane::new(normal, point).context(InvalidTargetSnafu {
            msg: "plane normal must be non-zero and finite",
        })?;
        self.swim(initial, &Target::Plane(plane), tol)
    }

    /// Swims to the cylinder of `radius` around the `axis` line.
    pub fn swim_to_cylinder(
        &self,
        initial: &InitialConditions,
        axis: Line,
        radius: f64,
        tol: &Tolerances,
    ) -> Result<SwimResult, SwimError> {
        self.swim(initial, &Target::Cylinder(Cylinder::new(axis, radius)), tol)
    }

    /// Swims to the cylinder of `radius` whose axis goes through `axis_start` and `axis_end`.
    pub fn swim_to_general_cylinder(
        &self,
        initial: &InitialConditions,
        axis_start: Vector3<f64>,
        axis_end: Vector3<f64>,
        radius: f64,
        tol: &Tolerances,
    ) -> Result<SwimResult, SwimError> {
        self.swim(
            initial,
            &Target::GeneralCylinder {
                axis_start,
                axis_end,
                radius,
            },
            tol,
        )
    }

    /// Swims to the cylindrical radius `rho` around the z axis.
    pub fn swim_to_rho(
        &self,
        initial: &InitialConditions,
        rho: f64,
        tol: &Tolerances,
    ) -> Result<SwimResult, SwimError> {
        self.swim(initial, &Target::FixedRho { rho }, tol)
    }

    /// Swims to the sphere of `radius` centered on the origin.
    pub fn swim_to_sphere(
        &self,
        initial: &InitialConditions,
        radius: f64,
        tol: &Tolerances,
    ) -> Result<SwimResult, SwimError> {
        self.swim(initial, &Target::Sphere { radius }, tol)
    }

    /// Swims to the fixed `z`, counting only the crossings in `direction`.
    pub fn swim_to_z(
        &self,
        initial: &InitialConditions,
        z: f64,
        direction: CrossingDirection,
        tol: &Tolerances,
    ) -> Result<SwimResult, SwimError> {
        self.swim(initial, &Target::FixedZ { z, direction }, tol)
    }

    /// Swims to the distance of closest approach to the beamline parallel to z through `(x, y)`.
    pub fn swim_to_beamline(
        &self,
        initial: &InitialConditions,
        x: f64,
        y: f64,
        tol: &Tolerances,
    ) -> Result<SwimResult, SwimError> {
        self.swim(initial, &Target::Beamline { x, y }, tol)
    }

    /// Swims to the distance of closest approach to the trajectory of another track, e.g. one kept
    /// by a previous swim. The trajectory may be in any length unit.
    pub fn swim_to_trajectory(
        &self,
        initial: &InitialConditions,
        other: &Traj,
        tol: &Tolerances,
    ) -> Result<SwimResult, SwimError> {
        let poly = Polyline::from_traj(other).context(InvalidTargetSnafu {
            msg: format!("{other} needs two distinct finite positions"),
        })?;
        let factor = other.unit.in_meters() / self.config.length_unit.in_meters();
        self.swim(initial, &Target::Trajectory(poly.scaled(factor)), tol)
    }

    /// Swims to the plane at `z` in the tilted frame of `sector`.
    ///
    /// The initial conditions and the result are both in that tilted frame, and so is the field
    /// integral.
    pub fn swim_to_plane_tilted(
        &self,
        initial: &InitialConditions,
        sector: u8,
        z: f64,
        tol: &Tolerances,
    ) -> Result<SwimResult, SwimError> {
        let sector = Self::sector(sector)?;
        let to_lab = sector.rotation();
        let plane = Plane::new(to_lab * Vector3::z(), to_lab * Vector3::new(0.0, 0.0, z))
            .context(InvalidTargetSnafu {
                msg: format!("z = {z} is not a valid plane of {sector}"),
            })?;
        let rslt = self.swim(&initial.rotated(&to_lab), &Target::Plane(plane), tol)?;
        Ok(rslt.rotated(&to_lab.inverse()))
    }

    /// Swims the full maximum path length of the tolerances, without a target.
    pub fn swim_max_path_length(
        &self,
        initial: &InitialConditions,
        tol: &Tolerances,
    ) -> Result<SwimResult, SwimError> {
        self.run(initial, None, tol)
    }

    /// Swims to any target.
    pub fn swim(
        &self,
        initial: &InitialConditions,
        target: &Target,
        tol: &Tolerances,
    ) -> Result<SwimResult, SwimError> {
        self.run(initial, Some(target), tol)
    }

    /// Performs a swim request.
    pub fn swim_request(&self, request: &SwimRequest) -> Result<SwimResult, SwimError> {
        let tol = request.tolerances.unwrap_or_else(|| self.tolerances());
        self.run(&request.initial, request.target.as_ref(), &tol)
    }

    /// Swims independent requests in parallel. The results are in the order of the requests.
    pub fn swim_batch(&self, requests: &[SwimRequest]) -> Vec<Result<SwimResult, SwimError>> {
        info!("Swimming {} tracks with {}", requests.len(), self.config);
        requests
            .par_iter()
            .map(|request| self.swim_request(request))
            .collect()
    }
}

impl<F: FieldProbe, E: ErrorCtrl> fmt::Display for Swimmer<F, E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.config)
    }
}

/// One swim of a batch: the initial conditions, the target (or none to swim the full path length),
/// and optionally specific tolerances instead of those of the swimmer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SwimRequest {
    pub initial: InitialConditions,
    #[serde(default)]
    pub target: Option<Target>,
    #[serde(default)]
    pub tolerances: Option<Tolerances>,
}

impl SwimRequest {
    pub fn new(initial: InitialConditions, target: Target) -> Self {
        Self {
            initial,
            target: Some(target),
            tolerances: None,
        }
    }

    pub fn with_tolerances(mut self, tolerances: Tolerances) -> Self {
        self.tolerances = Some(tolerances);
        self
    }
}

impl ConfigRepr for SwimRequest {}
