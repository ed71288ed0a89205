use super::{tol, BZ};
use magswim::field::{UniformField, ZeroField};
use magswim::geometry::{Sector, SECTOR_TILT_DEG};
use magswim::io::SwimConfig;
use magswim::swim::{Swimmer, Tolerances};
use magswim::{InitialConditions, SwimError};
use na::Vector3;
use rstest::*;

#[test]
fn field_in_the_sector_frames() {
    let (sin_tilt, cos_tilt) = SECTOR_TILT_DEG.to_radians().sin_cos();

    // A solenoid field along the beamline looks the same from every sector
    let solenoid = Swimmer::new(UniformField::solenoidal(BZ));
    for sector in 1..=Sector::COUNT {
        let b = solenoid.field_at_sector(sector, 10.0, -20.0, 30.0).unwrap();
        assert!((b - Vector3::new(-5.0 * sin_tilt, 0.0, 5.0 * cos_tilt)).amax() < 1e-12);
    }

    // A 1 T field along the lab x axis, seen from sector 2 centered at 60 degrees
    let along_x = Swimmer::new(UniformField::new(10.0, 0.0, 0.0));
    let b = along_x.field_at_sector(2, 0.0, 0.0, 0.0).unwrap();
    let (sin60, cos60) = 60.0_f64.to_radians().sin_cos();
    let expected = Vector3::new(cos60 * cos_tilt, -sin60, cos60 * sin_tilt);
    assert!((b - expected).amax() < 1e-12, "{b}");

    for sector in [0, 7] {
        assert!(matches!(
            solenoid.field_at_sector(sector, 0.0, 0.0, 0.0),
            Err(SwimError::InvalidTarget { .. })
        ));
    }
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(5)]
fn straight_to_a_tilted_plane(tol: Tolerances, #[case] sector: u8) {
    let cfg = SwimConfig::builder().keep_trajectory(true).build();
    let swimmer = Swimmer::with_config(ZeroField, cfg).unwrap();
    // Along the z axis of the tilted frame, from its origin
    let track = InitialConditions::new(1, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0);
    let rslt = swimmer.swim_to_plane_tilted(&track, sector, 100.0, &tol).unwrap();
    println!("{rslt}");

    assert!(rslt.is_success());
    assert!((rslt.position - Vector3::new(0.0, 0.0, 100.0)).amax() < 1e-9);
    assert!((rslt.direction - Vector3::z()).amax() < 1e-12);
    assert!((rslt.path_length - 100.0).abs() < 1e-9);
    // The kept trajectory is in the tilted frame too
    for sample in rslt.trajectory.as_ref().unwrap().iter() {
        assert!(sample.state.x().abs() < 1e-9 && sample.state.y().abs() < 1e-9);
    }
}

#[rstest]
fn tilted_plane_in_a_solenoid(tol: Tolerances) {
    let swimmer = Swimmer::new(UniformField::solenoidal(BZ));
    let track = InitialConditions::new(-1, 1.0, -2.0, 0.5, 2.0, 10.0, 30.0);
    let z = 200.0;
    let tilted = swimmer.swim_to_plane_tilted(&track, 3, z, &tol).unwrap();
    println!("{tilted}");
    assert!(tilted.is_success());
    assert!((tilted.position.z - z).abs() < tol.accuracy);
    assert!((tilted.momentum.norm() - track.momentum).abs() < 1e-9);

    // Same swim in the lab frame
    let sector = Sector::new(3).unwrap();
    let lab = swimmer
        .swim_to_plane(
            &track.rotated(&sector.rotation()),
            sector.to_lab(&Vector3::z()),
            sector.to_lab(&Vector3::new(0.0, 0.0, z)),
            &tol,
        )
        .unwrap();
    assert!((sector.to_lab(&tilted.position) - lab.position).amax() < 1e-9);
    assert!((tilted.path_length - lab.path_length).abs() < 1e-12);
    // The field integral does not depend on the frame
    assert_eq!(tilted.field_integral, lab.field_integral);
    assert!(tilted.field_integral.unwrap() > 0.0);

    assert!(matches!(
        swimmer.swim_to_plane_tilted(&track, 9, z, &tol),
        Err(SwimError::InvalidTarget { .. })
    ));
}
