use crate::core::error::AnalysisError;
use crate::core::model::{AnalysisResult, TableKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppState {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

/// Everything the user sees during one session. Nothing here is persisted.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub script: String,
    pub state: AppState,
    pub result: AnalysisResult,
    pub active_tab: TableKind,
    pub error: Option<String>,
}

impl Session {
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            ..Default::default()
        }
    }

    /// Clears the previous result before a new analysis starts.
    pub fn begin_analysis(&mut self) {
        self.state = AppState::Loading;
        self.error = None;
        self.result = AnalysisResult::default();
    }

    pub fn finish_analysis(&mut self, outcome: Result<AnalysisResult, AnalysisError>) {
        match outcome {
            Ok(result) => {
                self.result = result;
                self.state = AppState::Success;
                self.active_tab = TableKind::Scenes;
            }
            Err(e) => {
                log::error!("Analysis failed: {}", e);
                self.error = Some(e.user_message());
                self.state = AppState::Error;
            }
        }
    }

    /// Takes the text of a freshly loaded file. On failure the current text stays.
    pub fn replace_script(&mut self, loaded: Result<String, AnalysisError>) {
        match loaded {
            Ok(text) => {
                self.script = text;
                self.error = None;
            }
            Err(e) => {
                log::warn!("File ingestion failed: {}", e);
                self.error = Some(e.user_message());
            }
        }
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn has_data(&self) -> bool {
        !self.result.is_empty()
    }
}
