use tram_core::{BiasEnergies, Dimensions, StateArray, StateSequence, TransitionCounts, VisitCounts};

#[test]
fn ensemble_index_is_slowest_varying() {
    let counts = TransitionCounts::from_nested(vec![
        vec![vec![5, 2], vec![1, 3]],
        vec![vec![4, 1], vec![2, 2]],
    ])
    .unwrap();
    assert_eq!(counts.dims(), Dimensions::new(2, 2));
    assert_eq!(counts.as_slice(), &[5, 2, 1, 3, 4, 1, 2, 2]);
    assert_eq!(counts[(1, 1, 0)], 2);
    assert_eq!(counts.row_sum(0, 0), 7);
    assert_eq!(counts.column_sum(0, 0), 6);

    let visits = counts.row_sums().unwrap();
    assert_eq!(visits.as_slice(), &[7, 4, 5, 4]);
    assert_eq!(visits, VisitCounts::from_rows(vec![vec![7, 4], vec![5, 4]]).unwrap());
}

#[test]
fn state_array_rows_and_differences() {
    let mut a = StateArray::from_rows(vec![vec![0.0, 1.0, 2.0], vec![3.0, 4.0, 5.0]]).unwrap();
    assert_eq!(a.row(1), &[3.0, 4.0, 5.0]);
    a[(0, 2)] = f64::INFINITY;
    let mut b = a.clone();
    assert_eq!(a.max_abs_difference(&b), 0.0);
    b[(1, 0)] = 3.5;
    assert_eq!(a.max_abs_difference(&b), 0.5);
    assert!(!a.all_finite());
    b[(0, 2)] = 1.0;
    assert_eq!(a.max_abs_difference(&b), f64::INFINITY);
    b[(0, 0)] = f64::NAN;
    assert!(a.max_abs_difference(&b).is_nan());
}

#[test]
fn state_biases_expand_onto_frames() {
    let b_k_i = StateArray::from_rows(vec![vec![0.0, 0.0, 0.0], vec![1.0, 0.0, 2.0]]).unwrap();
    let sequence = StateSequence::new(vec![2, 0, 1, 2]);
    let bias = BiasEnergies::from_state_biases(&b_k_i, &sequence).unwrap();
    assert_eq!(bias.n_therm_states(), 2);
    assert_eq!(bias.seq_length(), 4);
    assert_eq!(bias[(1, 0)], 2.0);
    assert_eq!(bias[(1, 1)], 1.0);
    assert_eq!(bias[(1, 2)], 0.0);
    assert_eq!(bias[(0, 3)], 0.0);

    let bad = StateSequence::new(vec![3]);
    assert!(BiasEnergies::from_state_biases(&b_k_i, &bad).is_err());
}

#[test]
fn histogram_counts_frames_per_state() {
    let sequence = StateSequence::new(vec![0, 1, 1, 3, 1]);
    assert_eq!(sequence.histogram(4), vec![1, 3, 0, 1]);
    assert_eq!(sequence.len(), 5);
    assert!(!sequence.is_empty());
}

#[test]
fn symmetric_counts_widen_before_adding() {
    let half = 1u32 << 31;
    let counts = TransitionCounts::from_nested(vec![vec![vec![1, half], vec![half, 1]]]).unwrap();
    assert_eq!(counts.symmetric_count(0, 0, 1), 1u64 << 32);
    assert_eq!(counts.symmetric_count(0, 1, 0), 1u64 << 32);
    assert_eq!(counts.row_sum(0, 0), u64::from(half) + 1);

    let err = counts.row_sums().unwrap_err();
    assert_eq!(err.info().code, "visit-overflow");
    assert_eq!(err.info().context["row_sum"], (u64::from(half) + 1).to_string());

    let fits = TransitionCounts::from_nested(vec![vec![vec![u32::MAX / 2, 3], vec![0, 0]]]).unwrap();
    assert!(fits.row_sums().is_ok());
}
