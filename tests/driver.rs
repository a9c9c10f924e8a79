use anyhow::Result;
use groupbeam::testing::{ArrayBuilder, assert_values_close, station_readings, three_runs};
use groupbeam::{Aggregation, ExecMode, GroupbyError, NO_GROUP, Runner, align_to_groups, densify, reduce_partitions};

mod common;

#[test]
fn general_mode_merges_groups_spanning_partitions() -> Result<()> {
    common::init_tracing();
    let a = station_readings()?;
    let r = reduce_partitions(&a, "time", &three_runs(), 3, Aggregation::Sum, false, &Runner::sequential())?;
    assert_eq!(r.rows, 2);
    assert_eq!(r.observed, vec![0, 1, 2]);
    assert_eq!(r.partials.len(), 1);
    assert_eq!(r.partials[0].codes, vec![0, 1, 2]);
    assert_eq!(r.partials[0].values, vec![6.0, 22.0, 17.0, 60.0, 220.0, 170.0]);
    Ok(())
}

#[test]
fn blockwise_mode_rejects_a_split_group() -> Result<()> {
    let a = station_readings()?;
    let err = reduce_partitions(&a, "time", &three_runs(), 3, Aggregation::Sum, true, &Runner::sequential()).unwrap_err();
    assert_eq!(
        err.downcast_ref::<GroupbyError>(),
        Some(&GroupbyError::UnalignedPartitions {
            code: 1,
            first: 0,
            second: 1
        })
    );
    Ok(())
}

#[test]
fn blockwise_on_aligned_partitions_matches_general_mode() -> Result<()> {
    let a = align_to_groups(&station_readings()?, "time", &three_runs())?;
    assert_eq!(a.chunks("time")?, &[3, 4, 2]);
    let runner = Runner::sequential();
    for agg in [Aggregation::Sum, Aggregation::Mean, Aggregation::Var { ddof: 1 }, Aggregation::Last] {
        let block = reduce_partitions(&a, "time", &three_runs(), 3, agg, true, &runner)?;
        let general = reduce_partitions(&a, "time", &three_runs(), 3, agg, false, &runner)?;
        assert_eq!(block.partials.len(), 3);
        let block_dense = densify(&block.partials, block.rows, &[3], f64::NAN)?;
        let general_dense = densify(&general.partials, general.rows, &[3], f64::NAN)?;
        assert_values_close(&block_dense, &general_dense, 1e-9);
    }
    Ok(())
}

#[test]
fn median_needs_aligned_partitions_in_general_mode() -> Result<()> {
    let a = station_readings()?;
    let runner = Runner::sequential();
    let err = reduce_partitions(&a, "time", &three_runs(), 3, Aggregation::Median, false, &runner).unwrap_err();
    assert!(matches!(err.downcast_ref::<GroupbyError>(), Some(GroupbyError::Aggregation(_))));

    let aligned = align_to_groups(&a, "time", &three_runs())?;
    let r = reduce_partitions(&aligned, "time", &three_runs(), 3, Aggregation::Median, false, &runner)?;
    let dense = densify(&r.partials, r.rows, &[3], f64::NAN)?;
    assert_values_close(&dense, &[2.0, 5.5, 8.5, 20.0, 55.0, 85.0], 1e-12);
    Ok(())
}

#[test]
fn parallel_and_sequential_runs_agree() -> Result<()> {
    let a = ArrayBuilder::new()
        .dim("x", 3)
        .dim("time", 40)
        .chunks("time", &[7, 7, 7, 7, 7, 5])
        .build()?;
    let codes: Vec<i64> = (0..40).map(|i| (i * 7 % 5) as i64).collect();
    for agg in [Aggregation::Sum, Aggregation::Min, Aggregation::First, Aggregation::Std { ddof: 0 }] {
        let seq = reduce_partitions(&a, "time", &codes, 5, agg, false, &Runner::sequential())?;
        for mode in [ExecMode::Parallel { threads: None }, ExecMode::Parallel { threads: Some(3) }] {
            let par = reduce_partitions(&a, "time", &codes, 5, agg, false, &Runner::new(mode))?;
            assert_eq!(seq, par, "{agg} under {mode:?}");
        }
    }
    Ok(())
}

#[test]
fn inner_dimensions_become_rows() -> Result<()> {
    // group along the first axis; the trailing axis is kept
    let a = ArrayBuilder::new().dim("time", 4).dim("band", 2).chunks("time", &[2, 2]).build()?;
    let r = reduce_partitions(&a, "time", &[0, 0, 1, 1], 2, Aggregation::Sum, true, &Runner::sequential())?;
    assert_eq!(r.rows, 2);
    let dense = densify(&r.partials, r.rows, &[2], f64::NAN)?;
    // band 0: 0+2, 4+6; band 1: 1+3, 5+7
    assert_eq!(dense, vec![2.0, 10.0, 4.0, 12.0]);
    Ok(())
}

#[test]
fn sentinel_elements_are_ignored() -> Result<()> {
    let a = ArrayBuilder::new().dim("t", 5).chunks("t", &[2, 3]).build()?;
    let codes = [0, NO_GROUP, 0, NO_GROUP, 1];
    let r = reduce_partitions(&a, "t", &codes, 3, Aggregation::Count, false, &Runner::sequential())?;
    assert_eq!(r.observed, vec![0, 1]);
    let dense = densify(&r.partials, r.rows, &[3], 0.0)?;
    assert_eq!(dense, vec![2.0, 1.0, 0.0]);
    Ok(())
}

#[test]
fn bad_codes_are_rejected() -> Result<()> {
    let a = ArrayBuilder::new().dim("t", 3).build()?;
    let runner = Runner::sequential();
    for codes in [vec![0, 1, 3], vec![0, -2, 1], vec![0, 1]] {
        let err = reduce_partitions(&a, "t", &codes, 3, Aggregation::Sum, false, &runner).unwrap_err();
        assert!(
            matches!(err.downcast_ref::<GroupbyError>(), Some(GroupbyError::InvalidArgument(_))),
            "codes {codes:?}"
        );
    }
    Ok(())
}
