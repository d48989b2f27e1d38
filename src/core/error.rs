use thiserror::Error;

/// Generic message shown for any failure of the generation round-trip.
pub const RETRY_MESSAGE: &str = "解析剧本时发生错误，请稍后重试。";

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Script text is empty")]
    EmptyScript,

    #[error("AI returned no content")]
    EmptyResponse,

    #[error("AI response is not a valid JSON payload: {0}")]
    MalformedPayload(String),

    #[error("An analysis is already in progress")]
    AnalysisInFlight,

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Failed to extract text from document: {0}")]
    ExtractionFailure(String),

    #[error("Generation request failed: {0:#}")]
    Generation(#[source] anyhow::Error),
}

impl AnalysisError {
    /// Text rendered in the dismissible message line.
    pub fn user_message(&self) -> String {
        match self {
            AnalysisError::EmptyResponse
            | AnalysisError::MalformedPayload(_)
            | AnalysisError::Generation(_) => RETRY_MESSAGE.to_string(),
            AnalysisError::EmptyScript => "请先输入或上传剧本内容。".to_string(),
            AnalysisError::AnalysisInFlight => "正在分析中，请等待当前分析完成。".to_string(),
            AnalysisError::UnsupportedFileType(_) => {
                "不支持的文件格式。请上传 .txt 或 .docx 文件。".to_string()
            }
            AnalysisError::ExtractionFailure(_) => {
                "读取文件失败，请确保文件未损坏。".to_string()
            }
        }
    }
}
