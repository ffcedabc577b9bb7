use sbm_core::rng::RngHandle;

use sbm_mcmc::tempering;
use sbm_mcmc::{LadderConfig, LadderPolicy};

#[test]
fn exchange_probabilities_land_in_target_band() {
    let acceptance = tempering::exchange_acceptance(10.0, 1.0, 12.0, 2.0);
    assert!(
        acceptance > 0.2 && acceptance < 0.5,
        "unexpected acceptance {acceptance}"
    );

    let mut rng = RngHandle::from_seed(0xDEADBEEF);
    let (_accepted, prob) = tempering::attempt_exchange(10.0, 1.0, 12.0, 2.0, &mut rng);
    assert!((prob - acceptance).abs() < 1e-12);

    // a colder replica holding the higher description length always swaps
    assert_eq!(tempering::exchange_acceptance(12.0, 1.0, 10.0, 2.0), 1.0);
    assert_eq!(tempering::exchange_acceptance(f64::NAN, 1.0, 10.0, 2.0), 0.0);
}

#[test]
fn ladders_follow_their_policy() {
    let geometric = LadderConfig {
        replicas: 4,
        base_temperature: 0.5,
        policy: LadderPolicy::Geometric { ratio: 2.0 },
        exchange_interval: 1,
    };
    assert_eq!(tempering::build_ladder(&geometric), vec![0.5, 1.0, 2.0, 4.0]);

    let manual = LadderConfig {
        policy: LadderPolicy::Manual {
            temperatures: vec![1.0, 1.3],
        },
        ..LadderConfig::default()
    };
    assert_eq!(tempering::build_ladder(&manual), vec![1.0, 1.3]);
}
