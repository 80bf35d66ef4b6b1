// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use std::process::ExitCode;

use clap::Parser;
use heavyhitters::config::DEFAULT_MAX_BATCH_SIZE;
use heavyhitters::config::DEFAULT_MIN_BATCH_SIZE;
use heavyhitters::config::PipelineConfig;
use heavyhitters::error::Error;
use heavyhitters::pipeline::Pipeline;
use tracing::error;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Finds the values that occur more than n/k times in a stream written by concurrent producers.
#[derive(Debug, Parser)]
#[command(name = "heavyhitters", version, about)]
struct Args {
    /// Number of producer threads, in [1, 50]
    producers: usize,
    /// Threshold divisor k, greater than 1
    divisor: u64,
    /// Seed for the generated stream; random when omitted
    #[arg(long)]
    seed: Option<u64>,
    /// Smallest number of values a producer writes
    #[arg(long, default_value_t = DEFAULT_MIN_BATCH_SIZE)]
    min_batch: usize,
    /// Largest number of values a producer writes
    #[arg(long, default_value_t = DEFAULT_MAX_BATCH_SIZE)]
    max_batch: usize,
}

fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();
    match run(args) {
        Ok(rendered) => {
            println!("{rendered}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

// Diagnostics go to stderr; stdout only carries the result set.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "heavyhitters=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(args: Args) -> Result<String, Error> {
    let mut config = PipelineConfig::new(args.producers, args.divisor)
        .with_batch_size(args.min_batch..=args.max_batch);
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    let pipeline = Pipeline::new(config)?;
    let summary = pipeline.run()?;
    info!(
        total_bytes = summary.total_bytes(),
        appended = summary.appended().iter().sum::<u64>(),
        "stream consumed"
    );
    Ok(summary.heavy_hitters().to_string())
}
