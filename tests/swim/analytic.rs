use super::{forward_track, origin_track, tol, BZ};
use crate::{helix, transverse_radius};
use magswim::field::{UniformField, ZeroField};
use magswim::io::SwimConfig;
use magswim::md::CrossingDirection;
use magswim::propagators::IntegratorKind;
use magswim::swim::{SwimStatus, Swimmer, Tolerances};
use magswim::InitialConditions;
use rstest::*;

#[rstest]
fn zero_field_fixed_z(forward_track: InitialConditions, tol: Tolerances) {
    if pretty_env_logger::try_init().is_err() {
        println!("could not init env_logger");
    }
    let swimmer = Swimmer::new(ZeroField);
    let target_z = 500.0;
    let rslt = swimmer
        .swim_to_z(&forward_track, target_z, CrossingDirection::Any, &tol)
        .unwrap();
    println!("{rslt}");

    let expected_s = (target_z - forward_track.z) / forward_track.theta_deg.to_radians().cos();
    assert_eq!(rslt.status, SwimStatus::Success);
    assert!((rslt.position.z - target_z).abs() < tol.accuracy);
    assert!(
        (rslt.path_length - expected_s).abs() < tol.accuracy,
        "path length {} instead of {expected_s}",
        rslt.path_length
    );
    assert!(rslt.distance_to_target.unwrap() < tol.accuracy);
    // No field, no bending
    assert!((rslt.direction - forward_track.direction()).amax() < 1e-12);
    assert_eq!(rslt.field_integral, Some(0.0));
}

#[rstest]
fn zero_field_fixed_rho(forward_track: InitialConditions, tol: Tolerances) {
    let swimmer = Swimmer::new(ZeroField);
    let rho = 100.0;
    let rslt = swimmer.swim_to_rho(&forward_track, rho, &tol).unwrap();
    println!("{rslt}");

    // Line and circle intersection
    let dir = forward_track.direction();
    let a = dir.x * dir.x + dir.y * dir.y;
    let b = 2.0 * (forward_track.x * dir.x + forward_track.y * dir.y);
    let c = forward_track.x.powi(2) + forward_track.y.powi(2) - rho * rho;
    let expected_s = (-b + (b * b - 4.0 * a * c).sqrt()) / (2.0 * a);

    assert!(rslt.is_success());
    assert!((rslt.position.x.hypot(rslt.position.y) - rho).abs() < tol.accuracy);
    assert!(
        (rslt.path_length - expected_s).abs() < tol.accuracy,
        "path length {} instead of {expected_s}",
        rslt.path_length
    );
}

#[rstest]
fn zero_field_never_reaches(tol: Tolerances) {
    let swimmer = Swimmer::new(ZeroField);
    // Along the z axis, the radius never changes
    let along_z = InitialConditions::new(-1, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
    let rslt = swimmer.swim_to_rho(&along_z, 50.0, &tol).unwrap();
    assert_eq!(rslt.status, SwimStatus::TargetMissed);
    assert!((rslt.path_length - tol.max_path_length).abs() < 1e-9);
    assert_eq!(rslt.refinements, 0);

    // Moving toward larger z only, so z = 100 is never crossed downward
    let rslt = swimmer
        .swim_to_z(&along_z, 100.0, CrossingDirection::Decreasing, &tol)
        .unwrap();
    assert_eq!(rslt.status, SwimStatus::TargetMissed);
}

#[rstest]
#[case(IntegratorKind::Dormand45)]
#[case(IntegratorKind::CashKarp45)]
#[case(IntegratorKind::Fehlberg45)]
#[case(IntegratorKind::Verner56)]
fn helix_to_fixed_z(origin_track: InitialConditions, tol: Tolerances, #[case] kind: IntegratorKind) {
    let cfg = SwimConfig::builder().integrator(kind).build();
    let swimmer = Swimmer::with_config(UniformField::solenoidal(BZ), cfg).unwrap();
    let target_z = 300.0;
    let rslt = swimmer
        .swim_to_z(&origin_track, target_z, CrossingDirection::Any, &tol)
        .unwrap();
    println!("{kind}: {rslt}");

    let expected_s = target_z / origin_track.theta_deg.to_radians().cos();
    let (expected, expected_dir) = helix(&origin_track, BZ, expected_s);

    assert!(rslt.is_success());
    assert!((rslt.position.z - target_z).abs() < tol.accuracy);
    assert!((rslt.path_length - expected_s).abs() < 2.0 * tol.accuracy);
    for i in 0..3 {
        assert!(
            (rslt.position[i] - expected[i]).abs() < 1e-3,
            "{kind}: position {} instead of {expected:?}",
            rslt.position
        );
        assert!((rslt.direction[i] - expected_dir[i]).abs() < 1e-6);
    }
    // The momentum magnitude is conserved
    assert!((rslt.momentum.norm() - origin_track.momentum).abs() < 1e-9);

    // |t × B| is constant on a helix along the field: 5 T sin(15 deg) per cm
    let expected_bdl = BZ * 0.1 * origin_track.theta_deg.to_radians().sin() * rslt.path_length;
    let bdl = rslt.field_integral.unwrap();
    assert!(
        (bdl - expected_bdl).abs() < 1e-6 * expected_bdl,
        "field integral {bdl} T cm instead of {expected_bdl} T cm"
    );
    assert_eq!(rslt.to_array8()[7], bdl);
}

#[rstest]
fn helix_to_fixed_rho(origin_track: InitialConditions, tol: Tolerances) {
    let swimmer = Swimmer::new(UniformField::solenoidal(BZ));
    let radius = transverse_radius(&origin_track, BZ);
    let rho = 30.0;
    assert!(rho < 2.0 * radius);

    let rslt = swimmer.swim_to_rho(&origin_track, rho, &tol).unwrap();
    println!("{rslt}");

    // The chord of the transverse circle is the cylindrical radius
    let expected_s = 2.0 * radius * (rho / (2.0 * radius)).asin()
        / origin_track.theta_deg.to_radians().sin();
    assert!(rslt.is_success());
    assert!((rslt.position.x.hypot(rslt.position.y) - rho).abs() < tol.accuracy);
    assert!(
        (rslt.path_length - expected_s).abs() < 1e-3,
        "path length {} instead of {expected_s}",
        rslt.path_length
    );
    let (expected, _) = helix(&origin_track, BZ, rslt.path_length);
    assert!((rslt.position.x - expected[0]).abs() < 1e-3);
    assert!((rslt.position.y - expected[1]).abs() < 1e-3);
}

#[rstest]
fn helix_curls_below_rho(origin_track: InitialConditions, tol: Tolerances) {
    let swimmer = Swimmer::new(UniformField::solenoidal(BZ));
    // The helix never gets further than its diameter from the z axis
    let rho = 2.5 * transverse_radius(&origin_track, BZ);
    let rslt = swimmer.swim_to_rho(&origin_track, rho, &tol).unwrap();
    assert_eq!(rslt.status, SwimStatus::TargetMissed);
    assert!(rslt.position.x.hypot(rslt.position.y) < rho);
    assert!((rslt.path_length - tol.max_path_length).abs() < 1e-9);
}

#[rstest]
#[case(1)]
#[case(-1)]
fn bending_direction(#[case] charge: i32) {
    let swimmer = Swimmer::new(UniformField::solenoidal(BZ));
    let along_x = InitialConditions::new(charge, 0.0, 0.0, 0.0, 1.0, 90.0, 0.0);
    let tol = Tolerances::new(1e-4, 5.0, 0.5, 1e-10);
    let rslt = swimmer.swim_max_path_length(&along_x, &tol).unwrap();

    assert!(rslt.is_success());
    assert!((rslt.path_length - 5.0).abs() < 1e-12);
    assert!(rslt.distance_to_target.is_none());
    // Positive tracks moving along +x in a field along +z bend toward -y
    assert_eq!(rslt.position.y.signum(), -f64::from(charge));
    assert_eq!(rslt.direction.y.signum(), -f64::from(charge));
    assert!(rslt.position.z.abs() < 1e-12);
    assert_eq!(rslt.charge, charge);
}

#[rstest]
#[case(0.15, 85.0)]
#[case(0.1, 80.0)]
fn landing_on_fixed_z_matches_the_helix(#[case] momentum: f64, #[case] theta_deg: f64) {
    // Slow tracks curling several times before they reach z, with a loose integrator tolerance
    let track = InitialConditions::new(1, 0.0, 0.0, 0.0, momentum, theta_deg, 30.0);
    let tol = Tolerances::new(1e-4, 1000.0, 0.5, 1e-6);
    let swimmer = Swimmer::new(UniformField::solenoidal(BZ));
    let target_z = 30.0;

    let rslt = swimmer
        .swim_to_z(&track, target_z, CrossingDirection::Any, &tol)
        .unwrap();
    println!("{rslt}");
    assert!(rslt.is_success());
    assert!((rslt.position.z - target_z).abs() < tol.accuracy);

    let (expected, _) = helix(&track, BZ, rslt.path_length);
    let error = (0..3)
        .map(|i| (rslt.position[i] - expected[i]).abs())
        .fold(0.0, f64::max);
    assert!(
        error < tol.accuracy,
        "{error:.3e} cm from the helix after s = {} cm",
        rslt.path_length
    );
}
