use anyhow::Result;
use groupbeam::testing::assert_dense_eq;
use groupbeam::{CanonicalResult, GroupValue, GroupbyError, PartialResult, densify};

fn partial(codes: &[i64], values: &[f64]) -> PartialResult {
    PartialResult {
        codes: codes.to_vec(),
        values: values.to_vec(),
    }
}

#[test]
fn sparse_codes_land_in_their_cells() -> Result<()> {
    let dense = densify(&[partial(&[1, 4], &[10.0, 40.0])], 1, &[2, 3], -1.0)?;
    let grouped = vec![
        ("a".to_string(), vec![GroupValue::Int(0), GroupValue::Int(1)]),
        ("b".to_string(), vec!["x".into(), "y".into(), "z".into()]),
    ];
    let out = CanonicalResult::from_dense(vec![], grouped, dense)?;
    assert_dense_eq(&out, &[2, 3], &[-1.0, 10.0, -1.0, -1.0, 40.0, -1.0]);
    assert_eq!(out.get(&[0, 1]), Some(10.0));
    assert_eq!(out.get(&[1, 1]), Some(40.0));
    let filled = out.values.iter().filter(|&&v| v != -1.0).count();
    assert_eq!(filled, 2);
    assert_eq!(out.coord("b").map(<[GroupValue]>::len), Some(3));
    Ok(())
}

#[test]
fn partial_order_does_not_matter() -> Result<()> {
    let p1 = partial(&[0, 2], &[1.0, 2.0, 3.0, 4.0]);
    let p2 = partial(&[3], &[5.0, 6.0]);
    let forward = densify(&[p1.clone(), p2.clone()], 2, &[4], f64::NAN)?;
    let backward = densify(&[p2, p1], 2, &[4], f64::NAN)?;
    assert_eq!(forward.len(), 8);
    for (a, b) in forward.iter().zip(&backward) {
        assert!(a == b || (a.is_nan() && b.is_nan()));
    }
    // partial values are rows x codes; output is rows x groups
    assert_eq!(forward[0], 1.0);
    assert_eq!(forward[2], 2.0);
    assert_eq!(forward[3], 5.0);
    assert_eq!(forward[4], 3.0);
    assert_eq!(forward[6], 4.0);
    assert_eq!(forward[7], 6.0);
    assert!(forward[1].is_nan() && forward[5].is_nan());
    Ok(())
}

#[test]
fn repeated_code_across_partials_is_an_invariant_violation() {
    let err = densify(&[partial(&[1], &[1.0]), partial(&[1], &[2.0])], 1, &[3], 0.0).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<GroupbyError>(),
        Some(GroupbyError::InvariantViolation(_))
    ));
}

#[test]
fn out_of_range_code_is_an_invariant_violation() {
    let err = densify(&[partial(&[3], &[1.0])], 1, &[3], 0.0).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<GroupbyError>(),
        Some(GroupbyError::InvariantViolation(_))
    ));
}

#[test]
fn value_count_mismatch_is_an_invariant_violation() {
    assert!(densify(&[partial(&[0, 1], &[1.0])], 1, &[3], 0.0).is_err());
}

#[test]
fn no_partials_gives_all_fill() -> Result<()> {
    assert_eq!(densify(&[], 2, &[2], 7.0)?, vec![7.0; 4]);
    Ok(())
}

#[test]
fn get_rejects_bad_indices() -> Result<()> {
    let out = CanonicalResult::from_dense(
        vec![("x".to_string(), 2)],
        vec![("g".to_string(), vec![GroupValue::Int(0)])],
        vec![1.0, 2.0],
    )?;
    assert_eq!(out.dims, vec!["x".to_string(), "g".to_string()]);
    assert_eq!(out.get(&[1, 0]), Some(2.0));
    assert_eq!(out.get(&[2, 0]), None);
    assert_eq!(out.get(&[0]), None);
    Ok(())
}
