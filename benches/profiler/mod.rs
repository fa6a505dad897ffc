// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowplan-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowplan and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::str::FromStr;
use std::time::Duration;

use criterion::Criterion;

use pprof::criterion::{Output, PProfProfiler};

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(name).ok().and_then(|raw| raw.trim().parse().ok()).unwrap_or(default)
}

/// Shared criterion config for the layout and store benches.
///
/// The layout cases finish in microseconds and the store cases pay a disk
/// write per iteration, so sampling runs hotter and measurement shorter than
/// the criterion defaults. Overridable via `FLOWPLAN_PROFILE_FREQ`,
/// `FLOWPLAN_BENCH_SAMPLES`, `FLOWPLAN_BENCH_WARMUP_SECS`, and
/// `FLOWPLAN_BENCH_MEASUREMENT_SECS`.
pub fn criterion() -> Criterion {
    let frequency = env_or("FLOWPLAN_PROFILE_FREQ", 250_i32).clamp(1, 1000);
    let sample_size = env_or("FLOWPLAN_BENCH_SAMPLES", 50_usize).clamp(10, 200);
    let warmup_secs = env_or("FLOWPLAN_BENCH_WARMUP_SECS", 2_u64).clamp(1, 60);
    let measurement_secs = env_or("FLOWPLAN_BENCH_MEASUREMENT_SECS", 4_u64).clamp(1, 120);

    Criterion::default()
        .sample_size(sample_size)
        .warm_up_time(Duration::from_secs(warmup_secs))
        .measurement_time(Duration::from_secs(measurement_secs))
        .with_profiler(PProfProfiler::new(frequency, Output::Flamegraph(None)))
}
