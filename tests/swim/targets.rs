use super::{forward_track, origin_track, tol, BZ};
use magswim::field::{SolenoidField, UniformField, ZeroField};
use magswim::geometry::{Cylinder, Line, Plane};
use magswim::md::{CrossingDirection, SwimEvent, Target};
use magswim::swim::{SwimStatus, Swimmer, Tolerances};
use magswim::{InitialConditions, SwimError};
use na::Vector3;
use rstest::*;

#[rstest]
fn plane_across_the_field(origin_track: InitialConditions, tol: Tolerances) {
    let swimmer = Swimmer::new(UniformField::solenoidal(BZ));
    let as_z = swimmer
        .swim_to_z(&origin_track, 250.0, CrossingDirection::Any, &tol)
        .unwrap();
    let as_plane = swimmer
        .swim_to_plane(
            &origin_track,
            Vector3::new(0.0, 0.0, 2.0),
            Vector3::new(10.0, -4.0, 250.0),
            &tol,
        )
        .unwrap();
    assert!(as_plane.is_success());
    assert!((as_plane.path_length - as_z.path_length).abs() < 2.0 * tol.accuracy);
    assert!((as_plane.position - as_z.position).amax() < 1e-3);

    // A tilted plane: the final position must lie on it
    let normal = Vector3::new(0.0, 1.0, 1.0);
    let point = Vector3::new(0.0, 0.0, 150.0);
    let tilted = swimmer
        .swim_to_plane(&origin_track, normal, point, &tol)
        .unwrap();
    println!("{tilted}");
    assert!(tilted.is_success());
    let plane = Plane::new(normal, point).unwrap();
    assert!(plane.distance(&tilted.position) < tol.accuracy);
}

#[rstest]
fn plane_parallel_to_track(tol: Tolerances) {
    let swimmer = Swimmer::new(ZeroField);
    let along_x = InitialConditions::new(1, 0.0, 0.0, 0.0, 1.0, 90.0, 0.0);
    let rslt = swimmer
        .swim_to_plane(
            &along_x,
            Vector3::z(),
            Vector3::new(0.0, 0.0, 10.0),
            &tol,
        )
        .unwrap();
    assert_eq!(rslt.status, SwimStatus::TargetMissed);
    assert!((rslt.distance_to_target.unwrap() - 10.0).abs() < 1e-9);
}

#[rstest]
fn degenerate_plane_is_an_error(origin_track: InitialConditions, tol: Tolerances) {
    let swimmer = Swimmer::new(ZeroField);
    let err = swimmer
        .swim_to_plane(&origin_track, Vector3::zeros(), Vector3::zeros(), &tol)
        .unwrap_err();
    assert!(matches!(err, SwimError::InvalidTarget { .. }), "{err}");
}

#[rstest]
fn cylinders_around_z_are_rho(forward_track: InitialConditions, tol: Tolerances) {
    let swimmer = Swimmer::new(UniformField::solenoidal(BZ));
    let rho = 40.0;
    let rslt_rho = swimmer.swim_to_rho(&forward_track, rho, &tol).unwrap();
    let rslt_cyl = swimmer
        .swim_to_cylinder(&forward_track, Line::z_axis(), rho, &tol)
        .unwrap();
    let rslt_gen = swimmer
        .swim_to_general_cylinder(
            &forward_track,
            Vector3::new(0.0, 0.0, -100.0),
            Vector3::new(0.0, 0.0, 100.0),
            rho,
            &tol,
        )
        .unwrap();
    for rslt in [&rslt_rho, &rslt_cyl, &rslt_gen] {
        println!("{rslt}");
        assert!(rslt.is_success());
        assert!((rslt.position.x.hypot(rslt.position.y) - rho).abs() < tol.accuracy);
        assert!((rslt.path_length - rslt_rho.path_length).abs() < 1e-3);
    }
}

#[rstest]
fn tilted_cylinder(forward_track: InitialConditions, tol: Tolerances) {
    let swimmer = Swimmer::new(ZeroField);
    // Axis along x, through z = 50
    let axis = Line::new(Vector3::new(0.0, 0.0, 50.0), Vector3::x()).unwrap();
    let rslt = swimmer
        .swim_to_cylinder(&forward_track, axis, 20.0, &tol)
        .unwrap();
    println!("{rslt}");
    assert!(rslt.is_success());
    let cylinder = Cylinder::new(axis, 20.0);
    assert!(cylinder.distance(&rslt.position) < tol.accuracy);
    // Nearest crossing along the track: the entry into the cylinder, below its axis
    assert!(rslt.position.z < 50.0);
}

#[rstest]
fn sphere_is_refined(origin_track: InitialConditions, tol: Tolerances) {
    let swimmer = Swimmer::new(ZeroField);
    let rslt = swimmer.swim_to_sphere(&origin_track, 200.0, &tol).unwrap();
    println!("{rslt}");
    assert!(rslt.is_success());
    assert!((rslt.position.norm() - 200.0).abs() < tol.accuracy);
    assert!((rslt.path_length - 200.0).abs() < tol.accuracy);
    // No closed form for spheres: the crossing is refined within its bracket
    assert!(rslt.refinements > 0);
    assert!(!rslt.refinement_residuals.is_empty());
    for pair in rslt.refinement_residuals.windows(2) {
        assert!(
            pair[1] <= pair[0],
            "residuals increase: {:?}",
            rslt.refinement_residuals
        );
    }
}

#[rstest]
fn sphere_in_solenoid(origin_track: InitialConditions, tol: Tolerances) {
    let swimmer = Swimmer::new(SolenoidField::new(20.0, 100.0, 150.0));
    let rslt = swimmer.swim_to_sphere(&origin_track, 400.0, &tol).unwrap();
    println!("{rslt}");
    assert!(rslt.is_success());
    assert!((rslt.position.norm() - 400.0).abs() < tol.accuracy);
    for pair in rslt.refinement_residuals.windows(2) {
        assert!(pair[1] <= pair[0]);
    }
}

#[rstest]
fn beamline_closest_approach(tol: Tolerances) {
    let swimmer = Swimmer::new(ZeroField);
    // From x = 5 cm, heading back toward the beamline at 135 degrees in the transverse plane
    let track = InitialConditions::new(1, 5.0, 0.0, 0.0, 1.0, 60.0, 135.0);
    let rslt = swimmer.swim_to_beamline(&track, 0.0, 0.0, &tol).unwrap();
    println!("{rslt}");
    assert!(rslt.is_success());
    assert!((rslt.position.x - 2.5).abs() < 1e-3);
    assert!((rslt.position.y - 2.5).abs() < 1e-3);
    let expected_s = 5.0 / (2.0_f64.sqrt() * 60.0_f64.to_radians().sin());
    assert!((rslt.path_length - expected_s).abs() < 1e-3);
}

#[rstest]
fn beamline_in_field(forward_track: InitialConditions, tol: Tolerances) {
    let swimmer = Swimmer::new(UniformField::solenoidal(BZ));
    // Start off the beamline and swim backward along the track to its closest approach
    let out = swimmer
        .swim_to_z(&forward_track, 100.0, CrossingDirection::Any, &tol)
        .unwrap();
    let back = InitialConditions::from_momentum(
        -out.charge,
        out.position.x,
        out.position.y,
        out.position.z,
        -out.momentum.x,
        -out.momentum.y,
        -out.momentum.z,
    );
    let rslt = swimmer.swim_to_beamline(&back, 0.0, 0.0, &tol).unwrap();
    println!("{rslt}");
    assert!(rslt.is_success());
    // The vertex of the forward track was 0.022 cm from the beamline
    assert!(rslt.position.x.hypot(rslt.position.y) < 0.03);
}

#[rstest]
fn start_on_target(origin_track: InitialConditions, tol: Tolerances) {
    let swimmer = Swimmer::new(UniformField::solenoidal(BZ));
    let on_plane = InitialConditions {
        z: 100.0,
        ..origin_track
    };
    let rslt = swimmer
        .swim_to_z(&on_plane, 100.0, CrossingDirection::Any, &tol)
        .unwrap();
    assert!(rslt.is_success());
    assert_eq!(rslt.path_length, 0.0);
    assert_eq!(rslt.steps, 0);
    assert!((rslt.position - on_plane.vertex()).amax() < 1e-12);
}

#[test]
fn target_functions() {
    let target = Target::FixedZ {
        z: 1.0,
        direction: CrossingDirection::Increasing,
    };
    let below = magswim::StateVector::new(0.0, 0.0, 0.5, 0.0, 0.0, 1.0);
    let above = magswim::StateVector::new(0.0, 0.0, 1.5, 0.0, 0.0, 1.0);
    assert!(target.eval_crossing(&below, &above));
    assert!(!target.eval_crossing(&above, &below));
    assert_eq!(target.distance_to_target(&below), 0.5);
    let (ds, landing) = target.analytic_crossing(&below).unwrap();
    assert_eq!(ds, 0.5);
    assert_eq!(landing.z(), 1.0);
    assert!(target.analytic_crossing(&above).is_none());
}
