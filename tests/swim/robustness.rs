use super::{forward_track, origin_track, tol, BZ};
use magswim::field::{FnField, UniformField, ZeroField};
use magswim::io::{ConfigRepr, SwimConfig};
use magswim::md::CrossingDirection;
use magswim::swim::{SwimStatus, Swimmer, Tolerances};
use magswim::units::LengthUnit;
use magswim::{InitialConditions, SwimError};
use na::Vector3;
use rstest::*;

#[rstest]
fn swims_are_deterministic(forward_track: InitialConditions, tol: Tolerances) {
    let swimmer = Swimmer::new(UniformField::new(1.0, -2.0, BZ));
    let first = swimmer.swim_to_sphere(&forward_track, 150.0, &tol).unwrap();
    let second = swimmer.swim_to_sphere(&forward_track, 150.0, &tol).unwrap();
    assert!(first.is_success());
    assert!((first.path_length - second.path_length).abs() < tol.accuracy / 10.0);
    assert_eq!(first, second);
}

#[rstest]
fn trajectory_is_kept_normalized(origin_track: InitialConditions, tol: Tolerances) {
    let cfg = SwimConfig::builder().keep_trajectory(true).build();
    let swimmer = Swimmer::with_config(UniformField::new(3.0, 0.0, BZ), cfg).unwrap();
    let rslt = swimmer.swim_to_sphere(&origin_track, 250.0, &tol).unwrap();
    assert!(rslt.is_success());

    let traj = rslt.trajectory.as_ref().unwrap();
    println!("{traj}");
    assert_eq!(traj.unit, LengthUnit::Centimeter);
    assert!(traj.len() > 2);
    for sample in traj.iter() {
        assert!(
            (sample.state.direction_norm() - 1.0).abs() < 1e-9,
            "|t| = {} at s = {}",
            sample.state.direction_norm(),
            sample.s
        );
    }
    for pair in traj.samples().windows(2) {
        assert!(pair[1].s > pair[0].s);
    }
    let last = traj.last().unwrap();
    assert!((last.s - rslt.path_length).abs() < 1e-9);
    assert!((last.state.position() - rslt.position).amax() < 1e-9);

    // Interpolating between the samples stays on the trajectory
    let mid = traj.at(0.5 * rslt.path_length).unwrap();
    assert!((mid.direction_norm() - 1.0).abs() < 1e-9);
    assert!(mid.radius() < 250.0);
}

#[rstest]
#[case(InitialConditions::new(1, 0.0, 0.0, 0.0, 0.01, 15.0, 5.0))]
#[case(InitialConditions::new(1, 0.0, 0.0, 0.0, 2.0, f64::NAN, 5.0))]
#[case(InitialConditions::new(-1, 900.0, 0.0, 0.0, 2.0, 15.0, 5.0))]
#[case(InitialConditions::new(-1, 0.0, 0.0, 2000.0, 2.0, 15.0, 5.0))]
fn unphysical_tracks(#[case] track: InitialConditions, tol: Tolerances) {
    let swimmer = Swimmer::new(UniformField::solenoidal(BZ));
    let rslt = swimmer
        .swim_to_z(&track, 300.0, CrossingDirection::Any, &tol)
        .unwrap();
    assert_eq!(rslt.status, SwimStatus::Unphysical);
    assert_eq!(rslt.path_length, 0.0);
    assert_eq!(rslt.steps, 0);
    assert!(rslt.field_integral.is_none());
}

#[rstest]
fn non_finite_field_is_a_fault(origin_track: InitialConditions, tol: Tolerances) {
    // The field breaks down past z = 50 cm
    let probe = FnField(|_x, _y, z| {
        if z > 50.0 {
            Vector3::new(f64::NAN, 0.0, BZ)
        } else {
            Vector3::new(0.0, 0.0, BZ)
        }
    });
    let swimmer = Swimmer::new(probe);
    let err = swimmer
        .swim_to_z(&origin_track, 300.0, CrossingDirection::Any, &tol)
        .unwrap_err();
    println!("{err}");
    assert!(err.is_integration_fault());
    match err {
        SwimError::IntegrationFault { s, .. } => assert!(s > 0.5),
        other => panic!("unexpected error {other}"),
    }

    // Before the breakdown, swims are unaffected
    let rslt = swimmer
        .swim_to_z(&origin_track, 40.0, CrossingDirection::Any, &tol)
        .unwrap();
    assert!(rslt.is_success());
}

#[rstest]
fn invalid_inputs_are_errors(origin_track: InitialConditions) {
    let swimmer = Swimmer::new(ZeroField);
    let bad_tol = Tolerances::new(0.0, 100.0, 0.5, 1e-8);
    assert!(matches!(
        swimmer.swim_to_rho(&origin_track, 10.0, &bad_tol),
        Err(SwimError::InvalidTolerances { .. })
    ));

    let tol = Tolerances::default();
    assert!(matches!(
        swimmer.swim_to_rho(&origin_track, -10.0, &tol),
        Err(SwimError::InvalidTarget { .. })
    ));
    assert!(matches!(
        swimmer.swim_to_general_cylinder(
            &origin_track,
            Vector3::z(),
            Vector3::z(),
            10.0,
            &tol
        ),
        Err(SwimError::InvalidTarget { .. })
    ));

    let bad_cfg = SwimConfig::builder().max_step(0.0).build();
    assert!(matches!(
        Swimmer::with_config(ZeroField, bad_cfg),
        Err(SwimError::Config { .. })
    ));
}

#[rstest]
fn accuracy_not_achieved(origin_track: InitialConditions) {
    // The minimum step is so large that the bracket cannot be shrunk to the accuracy
    let cfg = SwimConfig::builder().min_step(5.0).build();
    let swimmer = Swimmer::with_config(UniformField::solenoidal(BZ), cfg).unwrap();
    let tol = Tolerances::new(1e-6, 1000.0, 5.0, 1e-8);
    let rslt = swimmer.swim_to_sphere(&origin_track, 120.0, &tol).unwrap();
    println!("{rslt}");
    assert_eq!(rslt.status, SwimStatus::AccuracyNotAchieved);
    // The closest end of the bracket is reported
    let distance = rslt.distance_to_target.unwrap();
    assert!(distance >= tol.accuracy);
    assert!((rslt.position.norm() - 120.0).abs() - distance < 1e-9);
    assert!(distance < 5.0);
}

#[test]
fn yaml_configured_swimmer() {
    let cfg = SwimConfig::loads(
        "length_unit: Millimeter\naccuracy: 0.001\ninit_step: 5.0\nmin_step: 1.0e-6\nmax_step: 500.0\nmax_path_length: 9000.0\nmax_start_radius: 8000.0\nintegrator: Verner56\n",
    )
    .unwrap();
    assert_eq!(cfg.length_unit, LengthUnit::Millimeter);
    assert!(cfg.compute_field_integral);

    let swimmer = Swimmer::with_config(UniformField::solenoidal(BZ), cfg).unwrap();
    assert_eq!(swimmer.field_at(0.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 5.0));

    let track = InitialConditions::new(-1, 0.0, 0.0, 0.0, 1.0, 30.0, 0.0);
    let tol = swimmer.tolerances();
    assert_eq!(tol.accuracy, 0.001);
    let rslt = swimmer
        .swim_to_z(&track, 1000.0, CrossingDirection::Any, &tol)
        .unwrap();
    println!("{rslt}");
    assert!(rslt.is_success());
    assert_eq!(rslt.unit, LengthUnit::Millimeter);
    assert!((rslt.position.z - 1000.0).abs() < 0.001);
    let expected_s = 1000.0 / 30.0_f64.to_radians().cos();
    assert!((rslt.path_length - expected_s).abs() < 0.002);
    // 5 T sin(30 deg) along the path, in T mm
    let bdl = rslt.field_integral.unwrap();
    assert!((bdl - 2.5 * rslt.path_length).abs() < 1e-6 * bdl);
}
