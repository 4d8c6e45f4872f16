//! Example: Full Index Reconstruction Pipeline
//!
//! This example demonstrates the complete capra workflow:
//! 1. Generating a synthetic record table (entity prices, market caps,
//!    sustainability scores, industry exposures)
//! 2. Computing quarterly rebalance dates
//! 3. Building capped per-factor index compositions
//! 4. Replicating the buy-and-hold return path into cumulative series
//!
//! Run with: `cargo run --example full_pipeline --features full`

use std::collections::BTreeSet;

use capra::calendar::SecondFridaySchedule;
use capra::capping::IterativeCapper;
use capra::composition::{
    CompositionBuilder, CompositionConfig, ExclusionRules, derive_returns, factor_snapshots,
    record_table,
};
use capra::primitives::{CumulativeIndex, EntityId, EntityRecord, FactorName};
use capra::replication::{ReplicationConfig, ReturnReplicator};
use capra::traits::RebalanceSchedule;
use chrono::{Datelike, NaiveDate, Weekday};
use polars::prelude::*;
use rand::{Rng, SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Normal};

/// Synthetic universe: (entity id, initial price, shares outstanding,
/// esg score, industry exposure).
const UNIVERSE: &[(&str, f64, f64, f64, Option<&str>)] = &[
    ("DE000A000001", 120.0, 900.0, 0.82, None),
    ("DE000A000002", 85.0, 1400.0, 0.71, None),
    ("DE000A000003", 240.0, 450.0, 0.64, None),
    ("DE000A000004", 60.0, 2100.0, 0.77, None),
    ("DE000A000005", 150.0, 700.0, 0.58, None),
    ("DE000A000006", 45.0, 1100.0, 0.69, Some("CW;NP")),
    ("DE000A000007", 310.0, 350.0, 0.74, None),
    ("DE000A000008", 95.0, 800.0, 0.61, None),
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    // Step 1: Synthetic record table
    let records = record_table(&generate_records())?;
    println!("record table: {} rows\n{}\n", records.height(), records.head(Some(5)));

    let records = derive_returns(&records)?;

    // Step 2: Rebalance dates
    let schedule = SecondFridaySchedule::quarterly(2020, 2021);
    let dates = schedule.reference_dates(&records)?;
    println!("rebalance dates: {dates:?}\n");

    // Step 3: Compositions (capped at 30% per entity)
    let snapshots = factor_snapshots(&records, &dates, &["market_cap", "esg"])?;
    let rules = ExclusionRules::new(
        vec!["DE000A000008".to_string()],
        vec!["CW".to_string(), "TC".to_string()],
    );
    let ineligible: BTreeSet<String> = rules.ineligible(&records)?;
    println!("ineligible entities: {ineligible:?}\n");

    let builder =
        CompositionBuilder::new(CompositionConfig::new(5), IterativeCapper::new(0.30));
    let compositions = builder.build(&snapshots, &ineligible)?;

    let mktcap = &compositions[&FactorName::market_cap()];
    println!("market cap composition:\n{}\n", mktcap.frame().head(Some(10)));

    // Step 4: Replication
    let horizon_end = NaiveDate::from_ymd_opt(2021, 12, 31).unwrap();
    let replicator = ReturnReplicator::new(ReplicationConfig::new(horizon_end));
    let series = replicator.replicate_all(&compositions, &records)?;

    for (factor, index) in &series {
        print_series(factor, index);
    }

    Ok(())
}

fn generate_records() -> Vec<EntityRecord> {
    let mut rng = StdRng::seed_from_u64(42);
    let step = Normal::new(0.0004, 0.012).expect("valid distribution parameters");
    let end = NaiveDate::from_ymd_opt(2021, 12, 31).unwrap();

    let mut records = Vec::new();
    for (entity, start_price, shares, esg, exposure) in UNIVERSE {
        let mut price = *start_price;
        let mut day = NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();

        while day <= end {
            if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
                price *= 1.0 + step.sample(&mut rng);
                records.push(EntityRecord::new(
                    EntityId::new(*entity),
                    day,
                    price,
                    None,
                    price * shares,
                    exposure.map(str::to_string),
                    vec![(FactorName::new("esg"), esg + rng.gen_range(-0.02..0.02))],
                ));
            }
            day = day.succ_opt().unwrap();
        }
    }
    records
}

fn print_series(factor: &FactorName, index: &CumulativeIndex) {
    let first = index.levels().first().copied().unwrap_or(f64::NAN);
    let last = index.last().unwrap_or(f64::NAN);
    println!("{factor:<12} {} trading days, {first:.2} -> {last:.2}", index.len());
}
