use tram_core::errors::{ErrorInfo, TramError};
use tram_core::{Dimensions, StateArray, StateSequence, TransitionCounts};

fn sample_info(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
        .with_context("ensemble", "1")
        .with_context("reason", "example")
}

#[test]
fn input_error_surface() {
    let err = TramError::Input(sample_info("I001", "ragged rows"));
    assert_eq!(err.info().code, "I001");
    assert!(err.info().context.contains_key("ensemble"));
}

#[test]
fn numerical_error_surface() {
    let err = TramError::Numerical(sample_info("N001", "nan").with_hint("inspect counts"));
    assert_eq!(err.info().hint.as_deref(), Some("inspect counts"));
    let rendered = err.to_string();
    assert!(rendered.starts_with("numerical error: nan (code: N001)"));
    assert!(rendered.contains("ensemble=1, reason=example"));
    assert!(rendered.ends_with("hint: inspect counts"));
}

#[test]
fn config_error_surface() {
    let err = TramError::Config(sample_info("C001", "bad yaml"));
    assert_eq!(err.info().code, "C001");
}

#[test]
fn shape_errors_report_expected_and_actual() {
    let err = StateArray::from_vec(Dimensions::new(2, 3), vec![0.0; 5]).unwrap_err();
    assert_eq!(err.info().code, "shape-mismatch");
    assert_eq!(err.info().context["expected"], "6");
    assert_eq!(err.info().context["actual"], "5");
}

#[test]
fn ragged_and_non_square_inputs_are_rejected() {
    let err = StateArray::from_rows(vec![vec![0.0, 1.0], vec![0.0]]).unwrap_err();
    assert_eq!(err.info().code, "ragged-rows");

    let err = TransitionCounts::from_nested(vec![vec![vec![1, 2], vec![3, 4]], vec![vec![1, 2]]])
        .unwrap_err();
    assert_eq!(err.info().code, "non-square-counts");
    assert_eq!(err.info().context["ensemble"], "1");
}

#[test]
fn out_of_range_states_are_located() {
    let sequence = StateSequence::new(vec![0, 1, 3, 0]);
    let err = sequence.validate(3).unwrap_err();
    assert_eq!(err.info().code, "state-out-of-range");
    assert_eq!(err.info().context["frame"], "2");
    assert!(sequence.validate(4).is_ok());
}
