mod analytic;
mod batch;
mod robustness;
mod sectors;
mod targets;

use magswim::swim::Tolerances;
use magswim::InitialConditions;
use rstest::*;

/// Solenoidal field of the uniform field tests, in kG
pub(crate) const BZ: f64 = 50.0;

#[fixture]
pub(crate) fn tol() -> Tolerances {
    Tolerances::new(1e-4, 1000.0, 0.5, 1e-10)
}

/// Positive 2 GeV/c track at 15 degrees, starting next to the origin.
#[fixture]
pub(crate) fn forward_track() -> InitialConditions {
    InitialConditions::new(1, 0.01, 0.02, -0.01, 2.0, 15.0, 5.0)
}

/// Same track, from the origin.
#[fixture]
pub(crate) fn origin_track() -> InitialConditions {
    InitialConditions::new(1, 0.0, 0.0, 0.0, 2.0, 15.0, 5.0)
}
