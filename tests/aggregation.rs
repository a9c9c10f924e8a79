use anyhow::Result;
use groupbeam::testing::values_close;
use groupbeam::{Aggregation, GroupbyError, MergeRule};

fn run(agg: Aggregation, values: &[f64]) -> f64 {
    let mut acc = agg.create();
    for (i, &v) in values.iter().enumerate() {
        agg.add_input(&mut acc, i, v);
    }
    agg.finish(acc)
}

/// Split `values` at `at`, reduce both halves, merge in the given order.
fn run_split(agg: Aggregation, values: &[f64], at: usize, reversed: bool) -> Result<f64> {
    let mut left = agg.create();
    for (i, &v) in values[..at].iter().enumerate() {
        agg.add_input(&mut left, i, v);
    }
    let mut right = agg.create();
    for (i, &v) in values[at..].iter().enumerate() {
        agg.add_input(&mut right, at + i, v);
    }
    if reversed {
        agg.merge(&mut right, left)?;
        Ok(agg.finish(right))
    } else {
        agg.merge(&mut left, right)?;
        Ok(agg.finish(left))
    }
}

const DATA: [f64; 7] = [4.0, -1.0, 2.5, 8.0, 0.0, 3.0, -2.0];

#[test]
fn kernels_match_direct_formulas() {
    assert_eq!(run(Aggregation::Sum, &DATA), 14.5);
    assert_eq!(run(Aggregation::Prod, &[2.0, 3.0, 4.0]), 24.0);
    assert_eq!(run(Aggregation::Count, &DATA), 7.0);
    assert!(values_close(run(Aggregation::Mean, &DATA), 14.5 / 7.0, 1e-12));
    assert_eq!(run(Aggregation::Min, &DATA), -2.0);
    assert_eq!(run(Aggregation::Max, &DATA), 8.0);
    assert_eq!(run(Aggregation::First, &DATA), 4.0);
    assert_eq!(run(Aggregation::Last, &DATA), -2.0);
    assert_eq!(run(Aggregation::Median, &DATA), 2.5);
    assert_eq!(run(Aggregation::Median, &[1.0, 4.0, 2.0, 3.0]), 2.5);
}

#[test]
fn variance_and_std_with_ddof() {
    let xs = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
    assert!(values_close(run(Aggregation::Var { ddof: 0 }, &xs), 4.0, 1e-12));
    assert!(values_close(run(Aggregation::Std { ddof: 0 }, &xs), 2.0, 1e-12));
    assert!(values_close(run(Aggregation::Var { ddof: 1 }, &xs), 32.0 / 7.0, 1e-12));
    assert!(run(Aggregation::Var { ddof: 1 }, &[3.0]).is_nan());
}

#[test]
fn nan_inputs_are_skipped() {
    let xs = [1.0, f64::NAN, 3.0];
    assert_eq!(run(Aggregation::Sum, &xs), 4.0);
    assert_eq!(run(Aggregation::Count, &xs), 2.0);
    assert_eq!(run(Aggregation::Mean, &xs), 2.0);
    assert_eq!(run(Aggregation::First, &[f64::NAN, 5.0]), 5.0);
    assert_eq!(run(Aggregation::Max, &[f64::NAN, -5.0]), -5.0);
}

#[test]
fn empty_accumulators_finish_to_default_fill() {
    for agg in [
        Aggregation::Sum,
        Aggregation::Prod,
        Aggregation::Count,
        Aggregation::Mean,
        Aggregation::Var { ddof: 0 },
        Aggregation::Min,
        Aggregation::First,
        Aggregation::Median,
    ] {
        let got = run(agg, &[]);
        assert!(values_close(got, agg.fill_value(), 0.0), "{agg}: {got}");
    }
}

#[test]
fn merges_are_order_independent() -> Result<()> {
    for agg in [
        Aggregation::Sum,
        Aggregation::Count,
        Aggregation::Mean,
        Aggregation::Var { ddof: 1 },
        Aggregation::Std { ddof: 0 },
        Aggregation::Min,
        Aggregation::Max,
        Aggregation::First,
        Aggregation::Last,
    ] {
        let whole = run(agg, &DATA);
        for at in 0..=DATA.len() {
            for reversed in [false, true] {
                let split = run_split(agg, &DATA, at, reversed)?;
                assert!(
                    values_close(whole, split, 1e-9),
                    "{agg} split at {at} reversed={reversed}: {whole} vs {split}"
                );
            }
        }
    }
    Ok(())
}

#[test]
fn median_has_no_merge_rule() {
    let agg = Aggregation::Median;
    assert_eq!(agg.merge_rule(), MergeRule::NotMergeable);
    let mut a = agg.create();
    let err = agg.merge(&mut a, agg.create()).unwrap_err();
    assert!(matches!(err.downcast_ref::<GroupbyError>(), Some(GroupbyError::Aggregation(_))));
}

#[test]
fn mismatched_accumulators_are_an_invariant_violation() {
    let mut a = Aggregation::Sum.create();
    let err = Aggregation::Sum.merge(&mut a, Aggregation::Count.create()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<GroupbyError>(),
        Some(GroupbyError::InvariantViolation(_))
    ));
}

#[test]
fn plain_and_nan_prefixed_names_both_skip_nan() -> Result<()> {
    let xs = [1.0, f64::NAN, 3.0];
    for (plain, prefixed) in [("sum", "nansum"), ("mean", "nanmean"), ("max", "nanmax"), ("var", "nanvar")] {
        let a = Aggregation::from_name(plain)?;
        let b = Aggregation::from_name(prefixed)?;
        assert_eq!(a, b);
        assert!(!run(a, &xs).is_nan(), "{plain} propagated NaN");
    }
    Ok(())
}

#[test]
fn names_parse_and_unknown_names_fail() -> Result<()> {
    assert_eq!("sum".parse::<Aggregation>()?, Aggregation::Sum);
    assert_eq!("NanMean".parse::<Aggregation>()?, Aggregation::Mean);
    assert_eq!(Aggregation::from_name("nanvar")?, Aggregation::Var { ddof: 0 });
    assert_eq!(Aggregation::from_name("product")?, Aggregation::Prod);
    let err = Aggregation::from_name("argmedian").unwrap_err();
    assert!(matches!(err.downcast_ref::<GroupbyError>(), Some(GroupbyError::Aggregation(_))));
    Ok(())
}

#[test]
fn serde_round_trip_uses_lowercase_names() -> Result<()> {
    assert_eq!(serde_json::to_string(&Aggregation::Mean)?, "\"mean\"");
    let agg: Aggregation = serde_json::from_str(r#"{"var":{"ddof":1}}"#)?;
    assert_eq!(agg, Aggregation::Var { ddof: 1 });
    assert_eq!(agg.to_string(), "var(ddof=1)");
    Ok(())
}
