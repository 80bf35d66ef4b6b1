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

use std::thread;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::error;
use tracing::info;

use crate::channel::SharedChannel;
use crate::config::PipelineConfig;
use crate::error::Error;
use crate::error::ErrorKind;
use crate::pipeline::AbortSignal;
use crate::pipeline::CompletionTracker;
use crate::pipeline::Consumer;
use crate::pipeline::Producer;
use crate::pipeline::RandomSource;
use crate::pipeline::ValueSource;
use crate::report::HeavyHitters;

/// Outcome of a successful pipeline run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    heavy_hitters: HeavyHitters,
    appended: Vec<u64>,
    total_bytes: u64,
}

impl RunSummary {
    /// Returns the heavy hitters of the stream.
    pub fn heavy_hitters(&self) -> &HeavyHitters {
        &self.heavy_hitters
    }

    /// Returns the number of values each producer appended, in producer order.
    pub fn appended(&self) -> &[u64] {
        &self.appended
    }

    /// Returns the number of bytes that went through the channel.
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }
}

/// Runs producers and the consumer over one shared channel.
///
/// A pipeline runs once: [`Pipeline::run`] and [`Pipeline::run_with_sources`] consume it, so its
/// abort signal covers exactly one run.
///
/// ```compile_fail
/// # use heavyhitters::config::PipelineConfig;
/// # use heavyhitters::pipeline::Pipeline;
/// let pipeline = Pipeline::new(PipelineConfig::new(1, 2).with_batch_size(5..=5)).unwrap();
/// let _first = pipeline.run();
/// let _second = pipeline.run();
/// ```
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    abort: AbortSignal,
}

impl Pipeline {
    /// Creates a pipeline after validating `config`.
    pub fn new(config: PipelineConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            config,
            abort: AbortSignal::new(),
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Returns a handle to the pipeline's abort signal.
    ///
    /// Take the handle before starting the run. Raising it makes the run fail with
    /// [`ErrorKind::Aborted`] within one iteration of every component.
    pub fn abort_signal(&self) -> AbortSignal {
        self.abort.clone()
    }

    /// Runs the pipeline with random producers.
    ///
    /// A single entropy source, seeded from the configured seed or from the OS, seeds one
    /// generator per producer.
    pub fn run(self) -> Result<RunSummary, Error> {
        let mut entropy = match self.config.seed() {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let sources = (0..self.config.producer_count())
            .map(|_| {
                Box::new(RandomSource::from_entropy(&mut entropy, self.config.batch_size()))
                    as Box<dyn ValueSource>
            })
            .collect();
        self.run_with_sources(sources)
    }

    /// Runs the pipeline with one producer per source.
    ///
    /// The number of sources must equal the configured producer count.
    pub fn run_with_sources(
        self,
        sources: Vec<Box<dyn ValueSource>>,
    ) -> Result<RunSummary, Error> {
        if sources.len() != self.config.producer_count() {
            return Err(Error::config("number of sources must match the producer count")
                .with_context("sources", sources.len())
                .with_context("producer_count", self.config.producer_count()));
        }
        info!(
            producers = sources.len(),
            divisor = self.config.threshold_divisor(),
            "pipeline starting"
        );

        let channel = SharedChannel::new();
        let tracker = CompletionTracker::new(sources.len());
        let divisor = self.config.threshold_divisor();
        let abort = &self.abort;

        let (consumer_result, producer_results, spawn_error) = thread::scope(|scope| {
            let consumer = Consumer::new(&channel, &tracker, abort.clone(), divisor);
            let consumer_handle = thread::Builder::new()
                .name("consumer".to_string())
                .spawn_scoped(scope, move || consumer.run())
                .map_err(|err| Error::thread_spawn("consumer", err))?;

            let mut handles = Vec::with_capacity(sources.len());
            let mut spawn_error = None;
            for (index, source) in sources.into_iter().enumerate() {
                let id = index + 1;
                let name = format!("producer-{id}");
                let producer = Producer::new(id, &channel, &tracker, abort.clone(), source);
                match thread::Builder::new()
                    .name(name.clone())
                    .spawn_scoped(scope, move || producer.run())
                {
                    Ok(handle) => handles.push(handle),
                    Err(err) => {
                        let err = Error::thread_spawn(name, err);
                        error!(error = %err, "failed to start producers");
                        abort.abort();
                        channel.notify();
                        spawn_error = Some(err);
                        break;
                    }
                }
            }

            let producer_results: Vec<Result<u64, Error>> = handles
                .into_iter()
                .map(|handle| {
                    handle.join().unwrap_or_else(|_| {
                        Err(Error::aborted("producer").with_context("panicked", true))
                    })
                })
                .collect();

            // Wakes a consumer that started waiting before the last completion was recorded.
            channel.notify();

            let consumer_result = consumer_handle.join().unwrap_or_else(|_| {
                Err(Error::aborted("consumer").with_context("panicked", true))
            });
            Ok::<_, Error>((consumer_result, producer_results, spawn_error))
        })?;

        if let Some(err) = spawn_error {
            return Err(err);
        }
        let mut appended = Vec::with_capacity(producer_results.len());
        let mut producer_error: Option<Error> = None;
        for result in producer_results {
            match result {
                Ok(count) => appended.push(count),
                Err(err) => {
                    appended.push(0);
                    // Keep the first root cause over errors that merely observed the abort.
                    let replace = match &producer_error {
                        None => true,
                        Some(current) => {
                            current.kind() == ErrorKind::Aborted && err.kind() != ErrorKind::Aborted
                        }
                    };
                    if replace {
                        producer_error = Some(err);
                    }
                }
            }
        }

        let heavy_hitters = match (producer_error, consumer_result) {
            (Some(err), Err(consumer_err)) if err.kind() == ErrorKind::Aborted => {
                return Err(consumer_err);
            }
            (Some(err), _) => return Err(err),
            (None, result) => result?,
        };
        let summary = RunSummary {
            heavy_hitters,
            appended,
            total_bytes: channel.total_bytes(),
        };
        info!(
            processed = summary.heavy_hitters.stream_length(),
            heavy_hitters = summary.heavy_hitters.rows().len(),
            "pipeline finished"
        );
        Ok(summary)
    }
}
