use crate::helix;
use magswim::dynamics::{DynamicsError, LorentzDynamics};
use magswim::field::{FnField, UniformField, ZeroField};
use magswim::propagators::error_ctrl::{LargestError, RSSStep};
use magswim::propagators::{
    IntegratorKind, PropOpts, PropagationError, Propagator, RSSPosDir,
};
use magswim::units::LengthUnit;
use magswim::InitialConditions;
use na::Vector3;
use rstest::*;

const BZ: f64 = 20.0;

#[fixture]
fn track() -> InitialConditions {
    InitialConditions::new(-1, 1.0, -2.0, 0.5, 1.0, 60.0, 30.0)
}

/// Returns the largest position error in cm after propagating `s` cm through the uniform field.
fn position_error<E: magswim::propagators::ErrorCtrl>(
    kind: IntegratorKind,
    opts: PropOpts<E>,
    initial: &InitialConditions,
    s: f64,
) -> f64 {
    let dynamics = LorentzDynamics::new(UniformField::solenoidal(BZ), initial.charge, initial.momentum);
    let prop = kind.propagator(dynamics, opts);
    let end = prop
        .with(initial.state_vector(LengthUnit::Centimeter), 0.0)
        .for_path_length(s / 100.0)
        .unwrap();
    let (expected, expected_dir) = helix(initial, BZ, s);
    let end_cm = end.scaled(100.0);
    assert!(
        (end.direction_norm() - 1.0).abs() < 1e-12,
        "direction is not normalized"
    );
    for i in 0..3 {
        assert!(
            (end.direction()[i] - expected_dir[i]).abs() < 1e-6,
            "{kind}: direction {} instead of {:?}",
            end,
            expected_dir
        );
    }
    (end_cm.position() - Vector3::from(expected)).amax()
}

#[rstest]
#[case(IntegratorKind::Dormand45)]
#[case(IntegratorKind::CashKarp45)]
#[case(IntegratorKind::Fehlberg45)]
#[case(IntegratorKind::Verner56)]
fn helix_in_uniform_field(track: InitialConditions, #[case] kind: IntegratorKind) {
    if pretty_env_logger::try_init().is_err() {
        println!("could not init env_logger");
    }
    // More than half a turn of the transverse circle
    let err = position_error(kind, PropOpts::with_tolerance(1e-10), &track, 600.0);
    println!("{kind}: {err:.3e} cm");
    assert!(err < 1e-4, "{kind} is {err} cm off the helix");
}

#[rstest]
fn error_controls(track: InitialConditions) {
    let err = position_error(
        IntegratorKind::Dormand45,
        PropOpts::with_adaptive_step(1e-9, 0.5, 1e-10, RSSStep),
        &track,
        300.0,
    );
    assert!(err < 1e-4, "RSS step control is {err} cm off the helix");

    let err = position_error(
        IntegratorKind::Dormand45,
        PropOpts::with_adaptive_step(1e-9, 0.5, 1e-10, LargestError),
        &track,
        300.0,
    );
    assert!(err < 1e-4, "largest error control is {err} cm off the helix");
}

#[rstest]
fn fixed_step(track: InitialConditions) {
    let err = position_error(
        IntegratorKind::Dormand45,
        PropOpts::with_fixed_step(1e-3),
        &track,
        100.0,
    );
    assert!(err < 1e-6, "fixed step is {err} cm off the helix");
}

#[rstest]
fn oversized_steps_are_rejected(track: InitialConditions) {
    // A 0.1 GeV/c track curls on a few centimeters: a half meter step cannot be accepted
    let slow = InitialConditions {
        momentum: 0.1,
        ..track
    };
    let dynamics = LorentzDynamics::new(UniformField::solenoidal(50.0), slow.charge, slow.momentum);
    let prop = Propagator::new::<magswim::propagators::Dormand45>(
        dynamics,
        PropOpts::with_tolerance(1e-10),
    );
    let mut instance = prop.with(slow.state_vector(LengthUnit::Centimeter), 0.0);
    instance.set_step(0.5, false);
    instance.single_step().unwrap();

    let details = instance.latest_details();
    println!("{details}");
    assert!(details.attempts > 1);
    assert!(details.step < 0.5);
    assert!(details.error <= 1e-10);
    assert!((instance.s - details.step).abs() < f64::EPSILON);
}

#[rstest]
fn steps_grow_in_zero_field(track: InitialConditions) {
    let dynamics = LorentzDynamics::new(ZeroField, track.charge, track.momentum);
    let prop = Propagator::default(dynamics);
    let mut instance = prop.with(track.state_vector(LengthUnit::Centimeter), 0.0);
    let mut prev_step = instance.step_size();
    let mut reached = false;
    for _ in 0..20 {
        reached = instance.step_toward(2.0).unwrap();
        if reached {
            break;
        }
        assert!(instance.step_size() >= prev_step);
        prev_step = instance.step_size();
    }
    assert!(reached);
    // The last step lands exactly on the requested path length
    assert_eq!(instance.s, 2.0);
    let expected = track.vertex() / 100.0 + 2.0 * track.direction();
    assert!((instance.state.position() - expected).amax() < 1e-12);
    assert!(instance.step_size() <= prop.opts.max_step);
}

#[test]
fn non_finite_field_is_a_fault() {
    let probe = FnField(|_x, _y, _z| Vector3::new(f64::NAN, 0.0, 10.0));
    let dynamics = LorentzDynamics::new(probe, 1, 1.0);
    let prop = Propagator::default(dynamics);
    let initial = InitialConditions::new(1, 0.0, 0.0, 0.0, 1.0, 45.0, 0.0);
    let err = prop
        .with(initial.state_vector(LengthUnit::Centimeter), 0.0)
        .for_path_length(1.0)
        .unwrap_err();
    assert!(
        matches!(
            err,
            PropagationError::Dynamics {
                source: DynamicsError::NonFiniteField { .. }
            }
        ),
        "unexpected error {err}"
    );
}

#[test]
fn default_propagator() {
    let dynamics = LorentzDynamics::new(ZeroField, 0, 1.0);
    let prop: Propagator<_, RSSPosDir> = Propagator::default(dynamics);
    assert_eq!(prop.order(), 5);
    assert_eq!(prop.opts.min_step, 1e-9);
}
