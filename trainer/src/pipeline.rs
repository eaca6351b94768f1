//! The training pipeline entry point.
//!
//! A [`Pipeline`] owns nothing but its configuration. Each call to
//! [`Pipeline::run`] loads one dataset, prepares it, trains and evaluates a
//! model, and hands exactly one [`ResultRecord`] to the sink, whether the
//! run succeeded or not.

use crate::config::PipelineConfig;
use crate::delivery::ResultSink;
use crate::error::PipelineError;
use crate::report::{ResultRecord, TrainingSummary};
use automl_learning::{ClassWeight, Task, Trainer, TrainingOutcome};
use automl_processing::{DatasetSource, PreparedTarget, ProblemType, prepare_dataset};
use std::time::Instant;
use tracing::{error, info, warn};

/// Stateless pipeline over a fixed configuration.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

static_assertions::assert_impl_all!(Pipeline: Send, Sync);

/// Everything a successful run produced.
#[derive(Debug, Clone)]
pub struct TrainedRun {
    pub problem_type: ProblemType,
    pub outcome: TrainingOutcome,
    pub summary: TrainingSummary,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the pipeline and deliver the resulting record.
    ///
    /// Never fails: every error becomes an `Error` record. A delivery
    /// failure is logged and does not change the returned record.
    pub fn run(
        &self,
        source: &dyn DatasetSource,
        identity: &str,
        sink: &dyn ResultSink,
    ) -> ResultRecord {
        let record = match self.execute(source) {
            Ok(run) => ResultRecord::complete(identity, run.problem_type, &run.outcome, run.summary),
            Err(e) => {
                error!(code = e.error_code(), "Pipeline error: {}", e);
                ResultRecord::failed(identity, &e)
            }
        };

        if let Err(e) = sink.deliver(&record) {
            warn!("{}", e);
        }
        record
    }

    /// Run every stage and return the trained outcome.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::Download`] / [`PipelineError::Parse`] when the source
    ///   cannot be loaded
    /// - [`PipelineError::Training`] for every later failure, including an
    ///   invalid configuration
    pub fn execute(&self, source: &dyn DatasetSource) -> Result<TrainedRun, PipelineError> {
        let started = Instant::now();
        self.config
            .validate()
            .map_err(|e| PipelineError::Training(format!("Invalid configuration: {e}")))?;

        info!(source = %source.describe(), row_cap = self.config.row_cap, "Loading dataset");
        let stage = Instant::now();
        let df = source.load(self.config.row_cap)?;
        info!(
            rows = df.height(),
            columns = df.width(),
            elapsed = stage.elapsed().as_secs_f64(),
            "Dataset loaded"
        );

        let stage = Instant::now();
        let dataset = prepare_dataset(df, &self.config.preparation())?;
        info!(
            target = %dataset.analysis.target,
            problem_type = %dataset.target.problem_type,
            rows = dataset.n_rows(),
            features = dataset.features.n_features(),
            dropped = dataset.analysis.dropped_columns().len(),
            elapsed = stage.elapsed().as_secs_f64(),
            "Dataset prepared"
        );

        let task = task_for(&dataset.target);
        let class_weight = class_weight_for(&dataset.target);

        let stage = Instant::now();
        let trainer = Trainer::new(self.config.training())?;
        let outcome = trainer.fit_evaluate(
            dataset.features.matrix.view(),
            &dataset.target.values,
            task,
            class_weight,
        )?;
        info!(
            model = %outcome.model,
            elapsed = stage.elapsed().as_secs_f64(),
            total = started.elapsed().as_secs_f64(),
            "Model trained"
        );

        let summary = TrainingSummary::new(&dataset, &outcome, class_weight);
        Ok(TrainedRun {
            problem_type: dataset.target.problem_type,
            outcome,
            summary,
        })
    }
}

fn task_for(target: &PreparedTarget) -> Task {
    match target.problem_type {
        ProblemType::Classification => Task::Classification {
            n_classes: target.n_classes(),
        },
        ProblemType::Regression => Task::Regression,
    }
}

/// Weight for the minority class of an imbalanced binary target.
fn class_weight_for(target: &PreparedTarget) -> Option<ClassWeight> {
    let class = target.minority_class?;
    (target.imbalance_ratio > 1.0).then_some(ClassWeight {
        class,
        weight: target.imbalance_ratio,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::NoopSink;
    use automl_processing::BytesSource;
    use ndarray::Array1;
    use std::sync::Mutex;

    fn classification_csv() -> Vec<u8> {
        let mut csv = String::from("a,b,label\n");
        for i in 0..60 {
            let label = i % 2;
            csv.push_str(&format!("{},{},{}\n", label * 10 + i % 5, i % 3, label));
        }
        csv.into_bytes()
    }

    fn target(minority: Option<usize>, ratio: f64) -> PreparedTarget {
        PreparedTarget {
            problem_type: ProblemType::Classification,
            values: Array1::zeros(4),
            classes: vec!["a".into(), "b".into()],
            kept_rows: None,
            removed_classes: Vec::new(),
            imbalance_ratio: ratio,
            minority_class: minority,
            coerced: false,
        }
    }

    #[test]
    fn test_class_weight_only_for_imbalanced_targets() {
        assert_eq!(
            class_weight_for(&target(Some(1), 3.0)),
            Some(ClassWeight { class: 1, weight: 3.0 })
        );
        assert_eq!(class_weight_for(&target(Some(1), 1.0)), None);
        assert_eq!(class_weight_for(&target(None, 3.0)), None);
    }

    #[test]
    fn test_task_mapping() {
        assert_eq!(
            task_for(&target(None, 1.0)),
            Task::Classification { n_classes: 2 }
        );
        let regression = PreparedTarget {
            problem_type: ProblemType::Regression,
            classes: Vec::new(),
            ..target(None, 1.0)
        };
        assert_eq!(task_for(&regression), Task::Regression);
    }

    #[test]
    fn test_run_delivers_complete_record() {
        let delivered = Mutex::new(Vec::new());
        let sink = |record: &ResultRecord| -> Result<(), PipelineError> {
            delivered.lock().unwrap().push(record.clone());
            Ok(())
        };

        let source = BytesSource::new("inline", classification_csv());
        let record = Pipeline::new(PipelineConfig::light()).run(&source, "user@x.io", &sink);

        assert!(record.is_complete(), "{}", record.message);
        assert_eq!(record.problem_type, Some(ProblemType::Classification));
        assert_eq!(delivered.lock().unwrap().len(), 1);
        assert_eq!(delivered.lock().unwrap()[0], record);
    }

    #[test]
    fn test_delivery_failure_is_swallowed() {
        let sink = |_: &ResultRecord| -> Result<(), PipelineError> {
            Err(PipelineError::CallbackDelivery("refused".into()))
        };
        let source = BytesSource::new("inline", classification_csv());

        let record = Pipeline::new(PipelineConfig::light()).run(&source, "e", &sink);
        assert!(record.is_complete());
    }

    #[test]
    fn test_invalid_config_is_training_error() {
        let config = PipelineConfig {
            test_size: 0.0,
            ..PipelineConfig::light()
        };
        let source = BytesSource::new("inline", classification_csv());

        let err = Pipeline::new(config).execute(&source).unwrap_err();
        assert_eq!(err.error_code(), "TRAINING_ERROR");
        assert!(err.to_string().starts_with("Invalid configuration"));

        let record = Pipeline::new(PipelineConfig {
            row_cap: 0,
            ..PipelineConfig::light()
        })
        .run(&source, "e", &NoopSink);
        assert!(!record.is_complete());
    }

    #[test]
    fn test_parse_failure_keeps_category() {
        let source = BytesSource::new("inline", Vec::<u8>::new());
        let err = Pipeline::new(PipelineConfig::light())
            .execute(&source)
            .unwrap_err();
        assert_eq!(err.error_code(), "PARSE_ERROR");
    }
}
