#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use fare_core::{run_pipeline, CsvRecordSource, PipelineConfig, PipelineStats, RideFare};

pub fn testdata(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("testdata")
        .join(name)
}

pub fn read_testdata(name: &str) -> String {
    fs::read_to_string(testdata(name)).expect("testdata file should exist")
}

/// Parses `ride_id,fare` lines into a ride-keyed map.
pub fn parse_fares(csv: &str) -> BTreeMap<u64, f64> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(csv.as_bytes())
        .deserialize::<RideFare>()
        .map(|row| {
            let fare = row.expect("fare row should parse");
            (fare.ride_id, fare.fare)
        })
        .collect()
}

/// Runs the pipeline over an in-memory path CSV and collects the fares.
pub fn price_paths(paths: &str, config: &PipelineConfig) -> (Vec<RideFare>, PipelineStats) {
    let mut source = CsvRecordSource::new(paths.as_bytes());
    let mut fares: Vec<RideFare> = Vec::new();
    let stats = run_pipeline(&mut source, &mut fares, config).expect("pipeline should succeed");
    (fares, stats)
}

pub fn by_ride(fares: &[RideFare]) -> BTreeMap<u64, f64> {
    fares.iter().map(|fare| (fare.ride_id, fare.fare)).collect()
}
