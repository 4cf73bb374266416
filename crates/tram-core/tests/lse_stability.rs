use proptest::prelude::*;
use tram_core::{logsumexp, logsumexp_pair};

#[test]
fn pair_matches_direct_evaluation() {
    let direct = (1.5_f64.exp() + (-0.25_f64).exp()).ln();
    assert!((logsumexp_pair(1.5, -0.25) - direct).abs() < 1e-14);
    assert!((logsumexp_pair(0.0, 0.0) - 2.0_f64.ln()).abs() < 1e-15);
}

#[test]
fn large_magnitudes_do_not_overflow() {
    let big = logsumexp_pair(800.0, 800.0);
    assert!((big - (800.0 + 2.0_f64.ln())).abs() < 1e-12);
    let small = logsumexp(&[-1000.0, -1000.0, -1000.0]);
    assert!((small - (-1000.0 + 3.0_f64.ln())).abs() < 1e-12);
}

#[test]
fn infinities_are_treated_as_data() {
    let neg = f64::NEG_INFINITY;
    assert_eq!(logsumexp_pair(neg, 3.0), 3.0);
    assert_eq!(logsumexp_pair(3.0, neg), 3.0);
    assert_eq!(logsumexp_pair(neg, neg), neg);
    assert_eq!(logsumexp_pair(f64::INFINITY, 3.0), f64::INFINITY);
    assert_eq!(logsumexp(&[neg, neg]), neg);
    assert_eq!(logsumexp(&[neg, 2.0]), 2.0);
    assert_eq!(logsumexp(&[1.0, f64::INFINITY]), f64::INFINITY);
    assert_eq!(logsumexp(&[]), neg);
}

#[test]
fn nan_is_never_masked() {
    assert!(logsumexp_pair(f64::NAN, 1.0).is_nan());
    assert!(logsumexp_pair(1.0, f64::NAN).is_nan());
    assert!(logsumexp(&[0.0, f64::NAN, f64::INFINITY]).is_nan());
}

#[test]
fn single_entry_is_returned_exactly() {
    assert_eq!(logsumexp(&[-23.025_850_929_940_457]), -23.025_850_929_940_457);
}

proptest! {
    #[test]
    fn slice_reduction_agrees_with_pairwise_folding(values in prop::collection::vec(-50.0f64..50.0, 1..12)) {
        let folded = values
            .iter()
            .fold(f64::NEG_INFINITY, |acc, &value| logsumexp_pair(acc, value));
        let reduced = logsumexp(&values);
        prop_assert!((folded - reduced).abs() < 1e-10);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(reduced >= max);
        prop_assert!(reduced <= max + (values.len() as f64).ln() + 1e-12);
    }

    #[test]
    fn pair_is_symmetric(a in -700.0f64..700.0, b in -700.0f64..700.0) {
        prop_assert_eq!(logsumexp_pair(a, b), logsumexp_pair(b, a));
    }
}
