use crate::core::error::AnalysisError;
use crate::core::model::AnalysisResult;
use crate::services::llm::LlmClient;
use crate::services::script::{parse_response, SYSTEM_INSTRUCTION};
use log::{debug, info};
use std::sync::atomic::{AtomicBool, Ordering};

/// Runs screenplay analyses, at most one at a time.
#[derive(Debug)]
pub struct ScriptAnalyzer {
    llm: Box<dyn LlmClient>,
    in_flight: AtomicBool,
}

/// Holds the in-flight slot; releasing it on drop covers every exit path.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ScriptAnalyzer {
    pub fn new(llm: Box<dyn LlmClient>) -> Self {
        Self {
            llm,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Whether an analysis call is outstanding.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn analyze(&self, script: &str) -> Result<AnalysisResult, AnalysisError> {
        if script.trim().is_empty() {
            return Err(AnalysisError::EmptyScript);
        }

        let response = {
            let _guard =
                InFlightGuard::acquire(&self.in_flight).ok_or(AnalysisError::AnalysisInFlight)?;
            info!("Sending script ({} chars) for analysis", script.chars().count());
            self.llm
                .chat(SYSTEM_INSTRUCTION, script)
                .await
                .map_err(AnalysisError::Generation)?
        };

        debug!("Raw analysis response: {}", response);
        let result = parse_response(&response)?;
        info!(
            "Analysis complete: {} scenes, {} characters, {} scene settings, {} props",
            result.scenes.len(),
            result.character_profiles.len(),
            result.scene_settings.len(),
            result.prop_settings.len()
        );
        Ok(result)
    }
}
