//! Orchestration of one analysis across the three-model panel
//!
//! The three classifier calls are issued concurrently and joined; none can
//! cancel or block another. Consensus and persistence run after the join.

use chorus_core::{
    now_timestamp, AnalysisBundle, ModelId, ModelResult, PanelResults, ResultStore,
    StoredTestResult,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, info_span, Instrument};

use crate::classifier::Classifier;
use crate::consensus::resolve_consensus;

/// Failure of an orchestrated analysis
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// Request text was empty or whitespace; no provider was invoked
    #[error("request text is empty")]
    EmptyInput,

    /// The analysis completed but could not be persisted
    ///
    /// The computed bundle is still valid and is carried here.
    #[error("analysis completed but storing it failed: {source}")]
    Storage {
        bundle: Box<AnalysisBundle>,
        #[source]
        source: chorus_core::Error,
    },
}

impl AnalysisError {
    /// The computed bundle, when the analysis itself succeeded
    pub fn bundle(&self) -> Option<&AnalysisBundle> {
        match self {
            Self::Storage { bundle, .. } => Some(bundle),
            Self::EmptyInput => None,
        }
    }
}

/// The three classifiers, one per panel seat
#[derive(Clone)]
pub struct Panel {
    claude: Arc<dyn Classifier>,
    gpt5: Arc<dyn Classifier>,
    llama: Arc<dyn Classifier>,
}

impl Panel {
    /// Seat three classifiers; each must report the model of its seat
    pub fn new(
        claude: Arc<dyn Classifier>,
        gpt5: Arc<dyn Classifier>,
        llama: Arc<dyn Classifier>,
    ) -> chorus_core::Result<Self> {
        for (seat, classifier) in ModelId::ALL.iter().zip([&claude, &gpt5, &llama]) {
            if classifier.model() != *seat {
                return Err(chorus_core::Error::config(format!(
                    "classifier '{}' reports model {} but was seated as {}",
                    classifier.name(),
                    classifier.model(),
                    seat
                )));
            }
        }

        Ok(Self { claude, gpt5, llama })
    }

    /// The classifier in a given seat
    pub fn get(&self, model: ModelId) -> &Arc<dyn Classifier> {
        match model {
            ModelId::Claude => &self.claude,
            ModelId::Gpt5 => &self.gpt5,
            ModelId::Llama => &self.llama,
        }
    }

    /// Human-readable names of the seated models, in panel order
    pub fn model_names(&self) -> Vec<String> {
        ModelId::ALL
            .iter()
            .map(|id| self.get(*id).name().to_string())
            .collect()
    }

    /// Run all three classifiers concurrently and wait for every one
    pub async fn classify_all(&self, text: &str) -> PanelResults {
        let (claude, gpt5, llama) = tokio::join!(
            self.claude.classify(text),
            self.gpt5.classify(text),
            self.llama.classify(text),
        );

        PanelResults { claude, gpt5, llama }
    }
}

/// Drives the panel, resolves consensus, and persists the outcome
#[derive(Clone)]
pub struct Orchestrator {
    panel: Panel,
    store: Arc<dyn ResultStore>,
}

impl Orchestrator {
    /// Create a new orchestrator
    pub fn new(panel: Panel, store: Arc<dyn ResultStore>) -> Self {
        Self { panel, store }
    }

    pub fn panel(&self) -> &Panel {
        &self.panel
    }

    pub fn store(&self) -> &Arc<dyn ResultStore> {
        &self.store
    }

    /// Analyse text with all three models, resolve consensus, and store it
    pub async fn analyze(&self, text: &str) -> Result<AnalysisBundle, AnalysisError> {
        ensure_not_empty(text)?;

        let span = info_span!("analysis", id = %uuid::Uuid::new_v4());
        async move {
            let start = Instant::now();
            metrics::counter!("chorus_analyses_total").increment(1);

            let results = self.panel.classify_all(text).await;
            let consensus = resolve_consensus(results.as_array());

            info!(
                verdict = %consensus.verdict,
                confidence = %consensus.confidence,
                flagged = consensus.dissenters.len(),
                "Consensus resolved"
            );
            metrics::counter!("chorus_verdicts_total", "verdict" => consensus.verdict.as_str())
                .increment(1);

            let bundle = AnalysisBundle {
                content: text.to_string(),
                results,
                consensus,
                timestamp: now_timestamp(),
            };

            let stored = self.store.append(&StoredTestResult::from_bundle(&bundle)).await;
            metrics::histogram!("chorus_analysis_latency_ms")
                .record(start.elapsed().as_millis() as f64);

            match stored {
                Ok(id) => {
                    debug!(row_id = id, "Analysis stored");
                    Ok(bundle)
                }
                Err(source) => {
                    error!("Failed to store analysis: {}", source);
                    metrics::counter!("chorus_storage_errors_total").increment(1);
                    Err(AnalysisError::Storage {
                        bundle: Box::new(bundle),
                        source,
                    })
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Ad-hoc check with a single model; nothing is stored
    pub async fn analyze_single(
        &self,
        model: ModelId,
        text: &str,
    ) -> Result<ModelResult, AnalysisError> {
        ensure_not_empty(text)?;
        Ok(self.panel.get(model).classify(text).await)
    }
}

fn ensure_not_empty(text: &str) -> Result<(), AnalysisError> {
    if text.trim().is_empty() {
        Err(AnalysisError::EmptyInput)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chorus_core::{StoreStats, StoredTestResult};
    use parking_lot::Mutex;

    struct Seat {
        model: ModelId,
        safe: bool,
    }

    #[async_trait]
    impl Classifier for Seat {
        async fn classify(&self, _text: &str) -> ModelResult {
            ModelResult {
                model: self.model,
                model_name: self.model.display_name().to_string(),
                safe: self.safe,
                concerns: Vec::new(),
                reasoning: String::new(),
            }
        }

        fn model(&self) -> ModelId {
            self.model
        }

        fn name(&self) -> &str {
            self.model.display_name()
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        rows: Mutex<Vec<StoredTestResult>>,
    }

    #[async_trait]
    impl ResultStore for MemoryStore {
        async fn append(&self, record: &StoredTestResult) -> chorus_core::Result<i64> {
            let mut rows = self.rows.lock();
            rows.push(record.clone());
            Ok(rows.len() as i64)
        }

        async fn read_all(&self) -> chorus_core::Result<Vec<StoredTestResult>> {
            Ok(self.rows.lock().iter().rev().cloned().collect())
        }

        async fn read_disagreements(&self) -> chorus_core::Result<Vec<StoredTestResult>> {
            Ok(Vec::new())
        }

        async fn read_stats(&self) -> chorus_core::Result<StoreStats> {
            Ok(StoreStats::default())
        }
    }

    fn panel(claude: bool, gpt5: bool, llama: bool) -> Panel {
        Panel::new(
            Arc::new(Seat { model: ModelId::Claude, safe: claude }),
            Arc::new(Seat { model: ModelId::Gpt5, safe: gpt5 }),
            Arc::new(Seat { model: ModelId::Llama, safe: llama }),
        )
        .unwrap()
    }

    #[test]
    fn test_panel_rejects_misseated_classifier() {
        let result = Panel::new(
            Arc::new(Seat { model: ModelId::Gpt5, safe: true }),
            Arc::new(Seat { model: ModelId::Gpt5, safe: true }),
            Arc::new(Seat { model: ModelId::Llama, safe: true }),
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_analyze_stores_one_row() {
        let store = Arc::new(MemoryStore::default());
        let orchestrator = Orchestrator::new(panel(true, false, true), store.clone());

        let bundle = orchestrator.analyze("some text").await.unwrap();
        assert_eq!(bundle.content, "some text");
        assert_eq!(bundle.consensus.dissenters, vec![ModelId::Gpt5]);

        let rows = store.rows.lock();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].prompt, "some text");
        assert_eq!(rows[0].flagged_by, vec![ModelId::Gpt5]);
    }

    #[tokio::test]
    async fn test_empty_input_rejected_before_panel() {
        let store = Arc::new(MemoryStore::default());
        let orchestrator = Orchestrator::new(panel(true, true, true), store.clone());

        assert!(matches!(
            orchestrator.analyze("  \n\t").await,
            Err(AnalysisError::EmptyInput)
        ));
        assert!(matches!(
            orchestrator.analyze_single(ModelId::Claude, "").await,
            Err(AnalysisError::EmptyInput)
        ));
        assert!(store.rows.lock().is_empty());
    }

    #[tokio::test]
    async fn test_single_model_check_is_not_stored() {
        let store = Arc::new(MemoryStore::default());
        let orchestrator = Orchestrator::new(panel(true, false, true), store.clone());

        let result = orchestrator.analyze_single(ModelId::Gpt5, "text").await.unwrap();
        assert_eq!(result.model, ModelId::Gpt5);
        assert!(!result.safe);
        assert!(store.rows.lock().is_empty());
    }
}
