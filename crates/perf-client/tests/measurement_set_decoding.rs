// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use perf_client::decode_measurement_set;
use proptest::prelude::*;
use serde_json::{Value, json};

fn cell() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<u32>().prop_map(|n| json!(n)),
        (-1.0e9f64..1.0e9).prop_map(|n| json!(n)),
        "[0-9a-z.]{0,6}".prop_map(Value::String),
    ]
}

fn row() -> impl Strategy<Value = Value> {
    prop::collection::vec(cell(), 0..12).prop_map(Value::Array)
}

proptest! {
    #[test]
    fn arbitrary_rows_never_panic(rows in prop::collection::vec(row(), 0..16)) {
        let payload = json!({
            "status": "OK",
            "formatMap": ["id", "mean", "iterationCount", "sum", "squareSum", "markedOutlier", "revisions", "commitTime"],
            "configurations": {"current": rows}
        });
        let _ = decode_measurement_set(&payload);
    }

    #[test]
    fn well_formed_rows_decode_sorted_by_time(
        rows in prop::collection::vec((1u64..10_000, -1.0e3f64..1.0e3, 1i64..1_000_000), 1..32),
    ) {
        let encoded: Vec<Value> = rows
            .iter()
            .map(|(id, mean, time)| json!([id, mean, 1, mean, mean * mean, false, [], time]))
            .collect();
        let payload = json!({
            "status": "OK",
            "formatMap": ["id", "mean", "iterationCount", "sum", "squareSum", "markedOutlier", "revisions", "commitTime"],
            "configurations": {"current": encoded}
        });
        let decoded = decode_measurement_set(&payload).expect("well-formed rows decode");
        prop_assert_eq!(decoded.len(), 1);
        let points = decoded[0].series.points();
        prop_assert_eq!(points.len(), rows.len());
        prop_assert!(points.windows(2).all(|pair| pair[0].time <= pair[1].time));
        prop_assert!(points.iter().all(|point| point.interval.is_none()));
    }
}
