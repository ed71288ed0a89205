use super::{tol, BZ};
use magswim::field::UniformField;
use magswim::io::ConfigRepr;
use magswim::md::{CrossingDirection, Target};
use magswim::swim::{SwimRequest, Swimmer, Tolerances};
use magswim::InitialConditions;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use rstest::*;

fn random_requests(count: usize, seed: u64) -> Vec<SwimRequest> {
    let mut rng = Pcg64Mcg::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let charge = if rng.gen_bool(0.5) { 1 } else { -1 };
            let initial = InitialConditions::new(
                charge,
                rng.gen_range(-0.5..0.5),
                rng.gen_range(-0.5..0.5),
                rng.gen_range(-5.0..5.0),
                rng.gen_range(0.3..3.0),
                rng.gen_range(10.0..60.0),
                rng.gen_range(-180.0..180.0),
            );
            SwimRequest::new(
                initial,
                Target::FixedZ {
                    z: 200.0,
                    direction: CrossingDirection::Any,
                },
            )
        })
        .collect()
}

#[rstest]
fn batch_matches_sequential(tol: Tolerances) {
    if pretty_env_logger::try_init().is_err() {
        println!("could not init env_logger");
    }
    let swimmer = Swimmer::new(UniformField::solenoidal(BZ));
    let requests: Vec<SwimRequest> = random_requests(24, 7)
        .into_iter()
        .map(|req| req.with_tolerances(tol))
        .collect();

    let batch = swimmer.swim_batch(&requests);
    assert_eq!(batch.len(), requests.len());
    for (request, rslt) in requests.iter().zip(batch) {
        let rslt = rslt.unwrap();
        let sequential = swimmer.swim_request(request).unwrap();
        assert_eq!(rslt, sequential, "batch and sequential swims differ");

        assert!(rslt.is_success(), "{}: {rslt}", request.initial);
        let expected_s =
            (200.0 - request.initial.z) / request.initial.theta_deg.to_radians().cos();
        assert!((rslt.path_length - expected_s).abs() < 2.0 * tol.accuracy);
    }
}

#[test]
fn requests_from_yaml() {
    let requests = random_requests(3, 42);
    let yaml = serde_yaml::to_string(&requests).unwrap();
    let loaded = SwimRequest::loads_many(&yaml).unwrap();
    assert_eq!(loaded, requests);

    // Requests without tolerances use those of the swimmer
    let swimmer = Swimmer::new(UniformField::solenoidal(BZ));
    for rslt in swimmer.swim_batch(&loaded) {
        let rslt = rslt.unwrap();
        assert!(rslt.is_success());
        assert!((rslt.position.z - 200.0).abs() < swimmer.tolerances().accuracy);
    }
}
