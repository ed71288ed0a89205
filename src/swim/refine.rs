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

use super::{SwimResult, SwimStatus, Swimmer, Tolerances};
use crate::dynamics::LorentzDynamics;
use crate::errors::{IntegrationFaultSnafu, SwimError, TrajectorySnafu};
use crate::field::FieldProbe;
use crate::md::events::{BoundaryTracker, SwimEvent, Target};
use crate::md::trajectory::{EmptySnafu, Traj, TrajSample};
use crate::propagators::{ErrorCtrl, PropInstance};
use crate::state::{InitialConditions, StateVector};
use snafu::{OptionExt, ResultExt};

/// Bookkeeping of one swim: the trajectory in meters, the step count and the bracket residuals.
struct SwimRecord {
    traj: Traj,
    steps: usize,
    residuals: Vec<f64>,
}

impl SwimRecord {
    fn new(initial: &InitialConditions, state: StateVector) -> Result<Self, SwimError> {
        let mut traj = Traj::with_capacity(64);
        traj.name = Some(format!("{initial}"));
        traj.push(0.0, state).context(TrajectorySnafu)?;
        Ok(Self {
            traj,
            steps: 0,
            residuals: Vec::new(),
        })
    }

    /// Appends an accepted integration step.
    fn accept(&mut self, s: f64, state: StateVector) -> Result<(), SwimError> {
        self.steps += 1;
        self.traj.push(s, state).context(TrajectorySnafu)
    }

    /// Puts back a sample which was removed from the trajectory.
    fn restore(&mut self, sample: TrajSample) -> Result<(), SwimError> {
        self.traj
            .push(sample.s, sample.state)
            .context(TrajectorySnafu)
    }

    fn remove_last(&mut self) -> Result<TrajSample, SwimError> {
        self.traj
            .remove_last()
            .context(EmptySnafu)
            .context(TrajectorySnafu)
    }

    fn last(&self) -> Result<TrajSample, SwimError> {
        self.traj
            .last()
            .copied()
            .context(EmptySnafu)
            .context(TrajectorySnafu)
    }
}

/// Both ends of a crossing bracket and their distances to the target.
#[derive(Copy, Clone, Debug)]
struct Bracket {
    start: TrajSample,
    end: TrajSample,
    dist_start: f64,
    dist_end: f64,
}

impl SwimRecord {
    /// Ends the trajectory on the end of the bracket closer to the target, and returns its distance.
    fn settle(&mut self, bracket: &Bracket) -> Result<f64, SwimError> {
        self.traj.truncate_after(bracket.start.s);
        if bracket.dist_end < bracket.dist_start {
            self.restore(bracket.end)?;
            Ok(bracket.dist_end)
        } else {
            Ok(bracket.dist_start)
        }
    }
}

/// Integrates until `s_max` or until the tracker sees a crossing, and returns whether it did.
fn integrate_segment<D, E, T>(
    instance: &mut PropInstance<'_, D, E>,
    tracker: &mut BoundaryTracker<'_, T>,
    record: &mut SwimRecord,
    s_max: f64,
) -> Result<bool, SwimError>
where
    D: crate::dynamics::Dynamics,
    E: ErrorCtrl,
    T: SwimEvent + ?Sized,
{
    loop {
        let done = instance
            .step_toward(s_max)
            .context(IntegrationFaultSnafu { s: instance.s })?;
        record.accept(instance.s, instance.state)?;
        if tracker.observe(&instance.state) {
            return Ok(true);
        }
        if done {
            return Ok(false);
        }
    }
}

impl<F: FieldProbe, E: ErrorCtrl> Swimmer<F, E> {
    /// Returns why these initial conditions cannot be swum, if they cannot.
    fn unphysical(&self, initial: &InitialConditions, tol: &Tolerances) -> Option<String> {
        if !initial.is_finite() {
            Some("non finite initial conditions".to_string())
        } else if initial.momentum < self.config.min_momentum {
            Some(format!(
                "momentum {} GeV/c is below {} GeV/c",
                initial.momentum, self.config.min_momentum
            ))
        } else if initial.x.hypot(initial.y) > self.config.max_start_radius {
            Some(format!(
                "starting radius {} {} exceeds {}",
                initial.x.hypot(initial.y),
                self.config.length_unit,
                self.config.max_start_radius
            ))
        } else if initial.vertex().norm() > tol.max_path_length {
            Some(format!(
                "vertex is further than the maximum path length of {} {}",
                tol.max_path_length, self.config.length_unit
            ))
        } else {
            None
        }
    }

    /// Swims to the optional target: integration, then crossing refinement within the bracket.
    pub(super) fn run(
        &self,
        initial: &InitialConditions,
        target: Option<&Target>,
        tol: &Tolerances,
    ) -> Result<SwimResult, SwimError> {
        tol.validate()?;
        if let Some(target) = target {
            target.validate()?;
        }

        let cfg = &self.config;
        let unit = cfg.length_unit;

        if let Some(reason) = self.unphysical(initial, tol) {
            debug!("rejecting {initial}: {reason}");
            let direction = initial.direction();
            return Ok(SwimResult {
                status: SwimStatus::Unphysical,
                charge: initial.charge,
                position: initial.vertex(),
                direction,
                momentum: initial.momentum * direction,
                path_length: 0.0,
                field_integral: None,
                distance_to_target: None,
                refinements: 0,
                steps: 0,
                refinement_residuals: Vec::new(),
                trajectory: None,
                unit,
            });
        }

        let s_max = unit.to_internal(tol.max_path_length);
        let accuracy = unit.to_internal(tol.accuracy);
        let min_step = unit.to_internal(cfg.min_step);

        let dynamics = LorentzDynamics::new(&self.probe, initial.charge, initial.momentum);
        let prop = cfg
            .integrator
            .propagator(dynamics, cfg.prop_opts::<E>(tol.init_step, tol.tolerance));
        let mut instance = prop.with(initial.state_vector(unit), 0.0);
        instance
            .prepare()
            .context(IntegrationFaultSnafu { s: 0.0 })?;

        let mut record = SwimRecord::new(initial, instance.state)?;

        let Some(target) = target else {
            // No target: the whole path length is travelled
            while !instance
                .step_toward(s_max)
                .context(IntegrationFaultSnafu { s: instance.s })?
            {
                record.accept(instance.s, instance.state)?;
            }
            record.accept(instance.s, instance.state)?;
            return self.conclude(initial, SwimStatus::Success, record, None, 0);
        };

        let target = target.scaled(unit.in_meters());
        let mut tracker = BoundaryTracker::new(&target, accuracy, &instance.state);

        if tracker.accuracy_reached(&instance.state) {
            tracker.finish();
            let distance = tracker.distance(&instance.state);
            return self.conclude(initial, SwimStatus::Success, record, Some(distance), 0);
        }

        let mut last_bracket: Option<Bracket> = None;
        loop {
            if !integrate_segment(&mut instance, &mut tracker, &mut record, s_max)? {
                tracker.exhaust();
                let (status, distance) = match last_bracket {
                    // A refinement pass lost the crossing: fall back on the previous bracket
                    Some(bracket) => (SwimStatus::AccuracyNotAchieved, record.settle(&bracket)?),
                    None => (
                        SwimStatus::TargetMissed,
                        tracker.distance(&record.last()?.state),
                    ),
                };
                debug!("{target} not reached after {} steps: {status}", record.steps);
                return self.conclude(
                    initial,
                    status,
                    record,
                    Some(distance),
                    tracker.refinements(),
                );
            }

            // The last sample lies past the target: the crossing is bracketed by [s1, s2]
            let past = record.remove_last()?;
            let TrajSample { s: s1, state: u1 } = record.last()?;
            let s2 = past.s;
            let (dist1, dist2) = (tracker.distance(&u1), tracker.distance(&past.state));
            record.residuals.push(dist1);
            let bracket = Bracket {
                start: TrajSample { s: s1, state: u1 },
                end: past,
                dist_start: dist1,
                dist_end: dist2,
            };

            if dist2 < accuracy || dist1 < accuracy {
                tracker.finish();
                let distance = if dist2 < accuracy {
                    record.restore(past)?;
                    dist2
                } else {
                    dist1
                };
                return self.conclude(
                    initial,
                    SwimStatus::Success,
                    record,
                    Some(distance),
                    tracker.refinements(),
                );
            }

            // Try to land on the target in one go along the straight line from the bracket start
            if let Some((ds, _)) = target.analytic_crossing(&u1) {
                if ds > min_step && ds <= 2.0 * (s2 - s1) {
                    // Adaptive steps no longer than the bracket, only the remainder is a fixed step
                    instance.reset(u1, s1, s2 - s1);
                    let mut landing = Vec::new();
                    loop {
                        let done = instance
                            .step_toward(s1 + ds)
                            .context(IntegrationFaultSnafu { s: instance.s })?;
                        landing.push(TrajSample {
                            s: instance.s,
                            state: instance.state,
                        });
                        if done {
                            break;
                        }
                    }
                    record.steps += landing.len();
                    if tracker.accuracy_reached(&instance.state) {
                        tracker.finish();
                        let distance = tracker.distance(&instance.state);
                        for sample in landing {
                            record.restore(sample)?;
                        }
                        return self.conclude(
                            initial,
                            SwimStatus::Success,
                            record,
                            Some(distance),
                            tracker.refinements(),
                        );
                    }
                    debug!(
                        "straight line landing on {target} off by {:.3e} m, refining instead",
                        tracker.distance(&instance.state)
                    );
                }
            }

            let width = s2 - s1;
            if width < min_step || tracker.refinements() >= cfg.max_refinements {
                tracker.finish();
                let distance = record.settle(&bracket)?;
                debug!(
                    "bracket of {width:.3e} m around {target} cannot be refined further ({} refinements)",
                    tracker.refinements()
                );
                return self.conclude(
                    initial,
                    SwimStatus::AccuracyNotAchieved,
                    record,
                    Some(distance),
                    tracker.refinements(),
                );
            }

            // Restart from the bracket start with steps small enough to resolve the bracket
            instance.set_max_step(width / 10.0);
            instance.reset(u1, s1, width / cfg.refine_divisor);
            tracker.begin_segment(&u1);
            last_bracket = Some(bracket);
            debug!(
                "refinement #{} of {target}: bracket [{s1:.9}, {s2:.9}] m, {dist1:.3e} m away",
                tracker.refinements()
            );
        }
    }

    /// Builds the result in the external length unit from the last sample of the trajectory.
    fn conclude(
        &self,
        initial: &InitialConditions,
        status: SwimStatus,
        record: SwimRecord,
        distance_m: Option<f64>,
        refinements: usize,
    ) -> Result<SwimResult, SwimError> {
        let unit = self.config.length_unit;
        let last = record.last()?;
        let direction = last.state.direction();

        let field_integral = if self.config.compute_field_integral {
            let bdl = record
                .traj
                .field_integral(&self.probe)
                .context(TrajectorySnafu)?;
            Some(unit.field_integral_from_internal(bdl))
        } else {
            None
        };

        Ok(SwimResult {
            status,
            charge: initial.charge,
            position: last.state.position() / unit.in_meters(),
            direction,
            momentum: initial.momentum * direction,
            path_length: unit.from_internal(last.s),
            field_integral,
            distance_to_target: distance_m.map(|d| unit.from_internal(d)),
            refinements,
            steps: record.steps,
            refinement_residuals: record
                .residuals
                .iter()
                .map(|d| unit.from_internal(*d))
                .collect(),
            trajectory: self
                .config
                .keep_trajectory
                .then(|| record.traj.to_external(unit)),
            unit,
        })
    }
}
