//! The run state machine: counting, per-file processing, export.
//!
//! States: Idle -> Counting -> Running -> {Completed | Canceled | FatalError}.
//! The per-file boundary inside the Running loop is load-bearing: nothing a
//! single file does (oversize, unreadable, refused by the server, timed
//! out) may take down the batch. Errors outside that boundary, such as the
//! walker itself failing, are fatal and end the run without an export.

use super::BatchDispatcher;
use crate::client::ArchiveCheckClient;
use crate::config::OutputMode;
use crate::debug_log::DebugLog;
use crate::enumerator;
use crate::export::{self, ResultExporter};
use crate::timing::{TimeoutPlanner, UploadPlan};
use crate::types::{CheckOutcome, FileDescriptor, ProgressState, ResultMap, RunReport, RunState};
use std::path::PathBuf;

impl BatchDispatcher {
    /// Execute the run to its terminal state.
    ///
    /// [`start`](Self::start) calls this on the worker task; tests may call
    /// it directly and inspect the returned [`RunReport`].
    pub async fn run(&self) -> RunReport {
        let config = &self.config;
        let run_stamp = export::capture_timestamp();

        let debug = if config.debug_log {
            match DebugLog::create(&config.effective_output_dir(), &run_stamp) {
                Ok(log) => Some(log),
                Err(e) => {
                    tracing::warn!(error = %e, "could not create debug log, continuing without");
                    None
                }
            }
        } else {
            None
        };
        let debug = debug.as_ref();

        tracing::info!(
            root = %config.root.display(),
            recursive = config.recursive,
            "starting batch run"
        );

        // Counting: a full pre-pass under the identical ignore policy, so
        // the percentages of the processing pass line up with reality.
        self.emit_progress(0);
        self.emit_status("Calculating file count...");
        self.log_debug(debug, "info", "counting files");

        let total = match enumerator::count(&config.root, config.recursive) {
            Ok(total) => total,
            Err(e) => {
                self.emit_error(format!("Error occurred: {}", e));
                self.log_debug(debug, "error", &format!("fatal enumeration error: {}", e));
                return self.finish(RunState::FatalError, ResultMap::new(), Vec::new());
            }
        };
        self.emit_status(format!("File count completed for {} files.", total));
        self.log_debug(debug, "info", &format!("counted {} files", total));

        if total == 0 {
            self.emit_status("No files found.");
            self.log_debug(debug, "info", "no files found");
            return self.finish(RunState::Completed, ResultMap::new(), Vec::new());
        }

        let client = match ArchiveCheckClient::new(config) {
            Ok(client) => client,
            Err(e) => {
                self.emit_error(format!("Error occurred: {}", e));
                self.log_debug(debug, "error", &format!("client construction failed: {}", e));
                return self.finish(RunState::FatalError, ResultMap::new(), Vec::new());
            }
        };
        let planner = TimeoutPlanner::new(config.max_file_size_mb);
        let mut progress = ProgressState::new(total);
        let mut results = ResultMap::new();

        for entry in enumerator::enumerate(&config.root, config.recursive) {
            // Cancellation is honored only here, between files; whatever was
            // in flight when the flag was raised has already been recorded.
            if self.cancel.is_cancelled() {
                self.emit_status("Process canceled.");
                self.emit_progress(100);
                self.log_debug(debug, "info", "canceled at file boundary");
                tracing::info!(processed = results.len(), "batch run canceled");
                return self.finish(RunState::Canceled, results, Vec::new());
            }

            let file = match entry {
                Ok(file) => file,
                Err(e) => {
                    // The walker itself faulted; this sits outside the
                    // per-file boundary, so the run ends without an export.
                    self.emit_error(format!("Error occurred: {}", e));
                    self.log_debug(debug, "error", &format!("fatal walk error: {}", e));
                    return self.finish(RunState::FatalError, results, Vec::new());
                }
            };

            let source = file.normalized_path();
            let outcome = match planner.plan(file.size) {
                UploadPlan::Skip { reason, size } => CheckOutcome::Skipped { reason, size },
                UploadPlan::Proceed(budgets) => client.check(&file, &budgets).await,
            };

            self.report_outcome(&file, &outcome);
            self.log_debug(
                debug,
                if matches!(outcome, CheckOutcome::Failed(_)) {
                    "error"
                } else {
                    "info"
                },
                &format!("{}: {}", source, outcome.tag()),
            );

            // Progress advances only once the outcome, success or failure,
            // is recorded, so the bar reflects genuinely settled files.
            results.insert(source, outcome);
            let percent = progress.advance();
            self.emit_progress(percent);
        }

        let exports = self.export_results(&results, &run_stamp, debug);
        self.emit_status("Search complete.");
        self.log_debug(debug, "info", "search complete");
        self.finish(RunState::Completed, results, exports)
    }

    fn finish(&self, state: RunState, results: ResultMap, exports: Vec<PathBuf>) -> RunReport {
        tracing::info!(?state, files = results.len(), "batch run finished");
        RunReport {
            state,
            results,
            exports,
        }
    }

    /// Status/error events for one settled file, shaped by verbosity mode:
    /// in only-missing mode, per-file headers appear only when the archive
    /// turned up nothing.
    fn report_outcome(&self, file: &FileDescriptor, outcome: &CheckOutcome) {
        let header = format!("Locations for {}", file.display_relative());
        match outcome {
            CheckOutcome::Found(locations) if !locations.is_empty() => {
                if !self.config.only_missing_files {
                    self.emit_status(header);
                    for location in locations {
                        self.emit_status(format!("    {}", location));
                    }
                }
            }
            CheckOutcome::Found(_) | CheckOutcome::NotFound => {
                self.emit_status(header);
                self.emit_status("    None");
            }
            CheckOutcome::Skipped { reason, .. } => {
                if !self.config.only_missing_files {
                    self.emit_status(header);
                }
                self.emit_status(format!("    {}", reason));
            }
            CheckOutcome::Failed(reason) => {
                self.emit_error(reason.clone());
            }
        }
    }

    /// Export per the configured mode. Failures surface as one error event;
    /// the in-memory results are untouched either way.
    fn export_results(
        &self,
        results: &ResultMap,
        timestamp: &str,
        debug: Option<&DebugLog>,
    ) -> Vec<PathBuf> {
        if self.config.output == OutputMode::None {
            return Vec::new();
        }

        let exporter = ResultExporter::new(self.config.output_dir.as_deref());
        match exporter.export(results, self.config.output, timestamp) {
            Ok(files) => {
                for file in &files {
                    self.emit_status(format!(
                        "Results {} file saved to:\n{}",
                        file.format.label(),
                        file.path.display()
                    ));
                    self.log_debug(
                        debug,
                        "info",
                        &format!("exported {} to {}", file.format.label(), file.path.display()),
                    );
                }
                files.into_iter().map(|f| f.path).collect()
            }
            Err(e) => {
                self.emit_error(format!(
                    "Error: Can't export file to requested location. {}.",
                    e
                ));
                self.log_debug(debug, "error", &format!("export failed: {}", e));
                Vec::new()
            }
        }
    }

    fn log_debug(&self, log: Option<&DebugLog>, level: &str, message: &str) {
        if let Some(log) = log {
            log.record(level, message);
        }
    }
}
