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


use crate::errors::{InvalidTargetSnafu, SwimError};
use crate::geometry::{Cylinder, Line, Plane, Polyline, DEGENERATE_NORM};
use crate::linalg::Vector3;
use crate::state::StateVector;
use serde_derive::{Deserialize, Serialize};
use snafu::ensure;
use std::fmt;

mod tracker;
pub use tracker::{BoundaryTracker, SwimPhase};

/// Which sign changes of the event function count as a crossing.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrossingDirection {
    /// Any sign change
    #[default]
    Any,
    /// Only when the event function goes from negative to positive
    Increasing,
    /// Only when the event function goes from positive to negative
    Decreasing,
}

/// A trait to specify how a swim target must be evaluated.
pub trait SwimEvent: fmt::Display + Send + Sync {
    /// Evaluation of the event, whose sign flips exactly at the target surface.
    fn eval(&self, state: &StateVector) -> f64;

    /// Distance from the state to the target, used for the accuracy test.
    fn distance_to_target(&self, state: &StateVector) -> f64;

    /// Path length along the straight line from this state to the target, and the point reached,
    /// if the geometry admits a closed form and the target is ahead.
    fn analytic_crossing(&self, _state: &StateVector) -> Option<(f64, StateVector)> {
        None
    }

    /// Sign changes which count as a crossing.
    fn crossing_direction(&self) -> CrossingDirection {
        CrossingDirection::Any
    }

    /// Evaluation of event crossing, returns whether a counted sign change happened between both states.
    fn eval_crossing(&self, prev_state: &StateVector, next_state: &StateVector) -> bool {
        let prev = self.eval(prev_state);
        let next = self.eval(next_state);
        match self.crossing_direction() {
            CrossingDirection::Any => (prev < 0.0) != (next < 0.0),
            CrossingDirection::Increasing => prev < 0.0 && next >= 0.0,
            CrossingDirection::Decreasing => prev >= 0.0 && next < 0.0,
        }
    }
}

/// The targets a track can be swum to.
///
/// Lengths are in the swimmer's external unit when provided by a caller, and converted into
/// meters with [`Target::scaled`] before the swim.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Target {
    /// A plane; the crossing is a change of side.
    Plane(Plane),
    /// An infinite cylinder around any axis.
    Cylinder(Cylinder),
    /// An infinite cylinder whose axis goes through two points.
    GeneralCylinder {
        axis_start: Vector3<f64>,
        axis_end: Vector3<f64>,
        radius: f64,
    },
    /// A sphere centered on the origin.
    Sphere { radius: f64 },
    /// A fixed z, optionally crossed in a given direction only.
    FixedZ {
        z: f64,
        #[serde(default)]
        direction: CrossingDirection,
    },
    /// A fixed cylindrical radius around the z axis.
    FixedRho { rho: f64 },
    /// The closest approach to a beamline parallel to z through `(x, y)`.
    Beamline { x: f64, y: f64 },
    /// The closest approach to the trajectory of another track.
    Trajectory(Polyline),
}

impl Target {
    /// Returns a copy of this target with all lengths multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        match *self {
            Self::Plane(plane) => Self::Plane(plane.scaled(factor)),
            Self::Cylinder(cyl) => Self::Cylinder(cyl.scaled(factor)),
            Self::GeneralCylinder {
                axis_start,
                axis_end,
                radius,
            } => Self::GeneralCylinder {
                axis_start: axis_start * factor,
                axis_end: axis_end * factor,
                radius: radius * factor,
            },
            Self::Sphere { radius } => Self::Sphere {
                radius: radius * factor,
            },
            Self::FixedZ { z, direction } => Self::FixedZ {
                z: z * factor,
                direction,
            },
            Self::FixedRho { rho } => Self::FixedRho { rho: rho * factor },
            Self::Beamline { x, y } => Self::Beamline {
                x: x * factor,
                y: y * factor,
            },
            Self::Trajectory(ref poly) => Self::Trajectory(poly.scaled(factor)),
        }
    }

    /// Checks that this target is well formed: finite, positive radii and distinct axis points.
    pub fn validate(&self) -> Result<(), SwimError> {
        let finite = |v: &Vector3<f64>| v.iter().all(|x| x.is_finite());
        let radius_ok = |r: f64| r.is_finite() && r > 0.0;
        match self {
            Self::Plane(plane) => ensure!(
                finite(&plane.point) && (plane.normal.norm() - 1.0).abs() < 1e-9,
                InvalidTargetSnafu {
                    msg: format!("{plane} is not well formed")
                }
            ),
            Self::Cylinder(cyl) => ensure!(
                radius_ok(cyl.radius)
                    && finite(&cyl.axis.origin)
                    && (cyl.axis.dir.norm() - 1.0).abs() < 1e-9,
                InvalidTargetSnafu {
                    msg: format!("{cyl} is not well formed")
                }
            ),
            Self::GeneralCylinder {
                axis_start,
                axis_end,
                radius,
            } => ensure!(
                radius_ok(*radius)
                    && finite(axis_start)
                    && finite(axis_end)
                    && (axis_end - axis_start).norm() > DEGENERATE_NORM,
                InvalidTargetSnafu {
                    msg: format!(
                        "cylinder axis points must be distinct and finite, radius must be positive (got {radius})"
                    )
                }
            ),
            Self::Sphere { radius } => ensure!(
                radius_ok(*radius),
                InvalidTargetSnafu {
                    msg: format!("sphere radius must be positive (got {radius})")
                }
            ),
            Self::FixedZ { z, .. } => ensure!(
                z.is_finite(),
                InvalidTargetSnafu {
                    msg: format!("target z must be finite (got {z})")
                }
            ),
            Self::FixedRho { rho } => ensure!(
                radius_ok(*rho),
                InvalidTargetSnafu {
                    msg: format!("target rho must be positive (got {rho})")
                }
            ),
            Self::Beamline { x, y } => ensure!(
                x.is_finite() && y.is_finite(),
                InvalidTargetSnafu {
                    msg: format!("beamline position must be finite (got {x}, {y})")
                }
            ),
            Self::Trajectory(poly) => ensure!(
                poly.is_well_formed(),
                InvalidTargetSnafu {
                    msg: format!("{poly} needs two distinct finite points")
                }
            ),
        }
        Ok(())
    }

    /// The cylinder equivalent to this target, if any.
    fn cylinder(&self) -> Option<Cylinder> {
        match *self {
            Self::Cylinder(cyl) => Some(cyl),
            Self::GeneralCylinder {
                axis_start,
                axis_end,
                radius,
            } => Cylinder::from_axis_points(axis_start, axis_end, radius),
            Self::FixedRho { rho } => Some(Cylinder::around_z(rho)),
            _ => None,
        }
    }

    /// The beamline through `(x, y)`, parallel to z.
    fn beamline(x: f64, y: f64) -> Line {
        Line {
            origin: Vector3::new(x, y, 0.0),
            dir: Vector3::z(),
        }
    }

    /// Signed path length to the closest approach of the straight line to a line or polyline
    /// target, and the event function there: the rate of change of the distance to that target,
    /// negative while approaching it.
    fn approach(&self, state: &StateVector) -> Option<(f64, f64)> {
        let (position, dir) = (state.position(), state.direction());
        let (closest, line) = match *self {
            Self::Beamline { x, y } => {
                let line = Self::beamline(x, y);
                (position - line.perpendicular(&position), line)
            }
            Self::Trajectory(ref poly) => poly.closest(&position)?,
            _ => return None,
        };
        Some((
            line.approach_offset(&position, &dir),
            (position - closest).dot(&dir),
        ))
    }
}

/// Moves the state along its straight line by `ds`.
fn straight(state: &StateVector, ds: f64) -> StateVector {
    let dir = state.direction();
    StateVector::from_parts(&(state.position() + ds * dir), &dir)
}

impl SwimEvent for Target {
    fn eval(&self, state: &StateVector) -> f64 {
        match *self {
            Self::Plane(plane) => plane.signed_distance(&state.position()),
            Self::Sphere { radius } => state.radius() - radius,
            Self::FixedZ { z, .. } => state.z() - z,
            Self::FixedRho { rho } => state.rho() - rho,
            Self::Beamline { .. } | Self::Trajectory(_) => {
                self.approach(state).map_or(f64::NAN, |(_, rate)| rate)
            }
            Self::Cylinder(_) | Self::GeneralCylinder { .. } => match self.cylinder() {
                Some(cyl) => cyl.signed_distance(&state.position()),
                None => f64::NAN,
            },
        }
    }

    fn distance_to_target(&self, state: &StateVector) -> f64 {
        match self {
            Self::Beamline { .. } | Self::Trajectory(_) => self
                .approach(state)
                .map_or(f64::INFINITY, |(offset, _)| offset.abs()),
            _ => self.eval(state).abs(),
        }
    }

    fn analytic_crossing(&self, state: &StateVector) -> Option<(f64, StateVector)> {
        let ds = match *self {
            Self::Sphere { .. } => None,
            Self::Plane(plane) => plane.ray_intersection(&state.position(), &state.direction()),
            Self::FixedZ { z, .. } => {
                let tz = state.direction().z;
                if tz.abs() < DEGENERATE_NORM {
                    None
                } else {
                    Some((z - state.z()) / tz).filter(|ds| *ds >= 0.0)
                }
            }
            Self::Beamline { .. } | Self::Trajectory(_) => self
                .approach(state)
                .map(|(offset, _)| offset)
                .filter(|ds| *ds >= 0.0),
            Self::Cylinder(_) | Self::GeneralCylinder { .. } | Self::FixedRho { .. } => self
                .cylinder()
                .and_then(|cyl| cyl.ray_intersection(&state.position(), &state.direction())),
        }?;
        Some((ds, straight(state, ds)))
    }

    fn crossing_direction(&self) -> CrossingDirection {
        match *self {
            Self::FixedZ { direction, .. } => direction,
            Self::Beamline { .. } | Self::Trajectory(_) => CrossingDirection::Increasing,
            _ => CrossingDirection::Any,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Plane(plane) => write!(f, "{plane}"),
            Self::Cylinder(cyl) => write!(f, "{cyl}"),
            Self::GeneralCylinder {
                axis_start,
                axis_end,
                radius,
            } => write!(
                f,
                "cylinder of radius {radius} with axis from ({}, {}, {}) to ({}, {}, {})",
                axis_start.x, axis_start.y, axis_start.z, axis_end.x, axis_end.y, axis_end.z
            ),
            Self::Sphere { radius } => write!(f, "sphere of radius {radius}"),
            Self::FixedZ { z, direction } => match direction {
                CrossingDirection::Any => write!(f, "z = {z}"),
                _ => write!(f, "z = {z} ({direction:?})"),
            },
            Self::FixedRho { rho } => write!(f, "rho = {rho}"),
            Self::Beamline { x, y } => write!(f, "beamline at ({x}, {y})"),
            Self::Trajectory(poly) => write!(f, "closest approach to a {poly}"),
        }
    }
}

impl From<Plane> for Target {
    fn from(plane: Plane) -> Self {
        Self::Plane(plane)
    }
}

impl From<Cylinder> for Target {
    fn from(cyl: Cylinder) -> Self {
        Self::Cylinder(cyl)
    }
}

impl From<Polyline> for Target {
    fn from(poly: Polyline) -> Self {
        Self::Trajectory(poly)
    }
}

impl From<Line> for Target {
    /// A line parallel to z is the beamline through its origin.
    fn from(line: Line) -> Self {
        Self::Beamline {
            x: line.origin.x,
            y: line.origin.y,
        }
    }
}
