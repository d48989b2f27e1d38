use crate::core::config::Config;
use crate::core::error::AnalysisError;
use crate::core::io::Storage;
use crate::core::model::{AnalysisResult, TableKind};
use crate::core::state::{AppState, Session};
use crate::services::analyzer::ScriptAnalyzer;
use crate::services::export::{export_all, export_table};
use crate::services::ingest::{load_script, ScriptFormat};
use crate::services::llm::LlmClient;
use crate::services::script::SAMPLE_SCRIPT;
use crate::utils::table::{render_table, summary};
use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use inquire::{Confirm, Select};
use log::warn;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub struct WorkflowManager {
    config: Config,
    analyzer: ScriptAnalyzer,
    storage: Arc<dyn Storage>,
}

/// Choices offered after a successful analysis.
#[derive(Debug, Clone, Copy)]
enum BrowseAction {
    View(TableKind, usize),
    ExportActive(TableKind),
    ExportAll,
    Reanalyze,
    Done,
}

impl fmt::Display for BrowseAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrowseAction::View(kind, rows) => write!(f, "查看{} ({} 行)", kind.title(), rows),
            BrowseAction::ExportActive(kind) => write!(f, "导出当前表格 ({})", kind.file_name()),
            BrowseAction::ExportAll => f.write_str("导出全部表格"),
            BrowseAction::Reanalyze => f.write_str("重新分析"),
            BrowseAction::Done => f.write_str("完成"),
        }
    }
}

impl WorkflowManager {
    pub fn new(config: Config, llm: Box<dyn LlmClient>, storage: Arc<dyn Storage>) -> Self {
        Self {
            config,
            analyzer: ScriptAnalyzer::new(llm),
            storage,
        }
    }

    pub async fn run(&self) -> Result<()> {
        let scripts = self.list_scripts().await?;

        if scripts.is_empty() {
            println!(
                "No screenplays (.txt, .docx) found in '{}'.",
                self.config.input_folder
            );
            if !self.config.unattended
                && Confirm::new("Analyze the bundled sample screenplay?")
                    .with_default(true)
                    .prompt()
                    .unwrap_or(false)
            {
                let mut session = Session::new(SAMPLE_SCRIPT);
                self.analyze_session(&mut session, "sample").await?;
            }
            return Ok(());
        }

        let total = scripts.len();
        for (i, path_str) in scripts.iter().enumerate() {
            println!("Processing script: {}", path_str);
            self.process_script(path_str).await?;

            if !self.config.unattended && i < total - 1 {
                let ans = Confirm::new("Continue to next script?")
                    .with_default(true)
                    .prompt();

                match ans {
                    Ok(true) => {}
                    Ok(false) => {
                        println!("Stopping as requested.");
                        break;
                    }
                    Err(_) => {
                        println!("Error reading input, stopping.");
                        break;
                    }
                }
            }
        }

        println!("All scripts processed!");
        Ok(())
    }

    async fn list_scripts(&self) -> Result<Vec<String>> {
        let entries = self.storage.list(&self.config.input_folder).await?;
        let mut scripts: Vec<String> = entries
            .into_iter()
            .filter(|e| {
                let supported = ScriptFormat::is_supported(e);
                if !supported {
                    warn!("Skipping unsupported file: {}", e);
                }
                supported
            })
            .collect();
        scripts.sort();
        Ok(scripts)
    }

    /// Loads, analyzes and exports one screenplay file.
    ///
    /// Ingestion and analysis failures end up in the returned session rather
    /// than as an error; only storage failures while exporting are returned.
    pub async fn process_script(&self, path_str: &str) -> Result<Session> {
        let mut session = Session::default();
        session.replace_script(load_script(self.storage.as_ref(), path_str).await);
        if let Some(msg) = &session.error {
            println!("{}", msg);
            return Ok(session);
        }

        let stem = Path::new(path_str)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "script".to_string());

        self.analyze_session(&mut session, &stem).await?;
        Ok(session)
    }

    async fn analyze_session(&self, session: &mut Session, stem: &str) -> Result<()> {
        loop {
            session.begin_analysis();
            let outcome = self.analyze_with_spinner(&session.script).await;
            session.finish_analysis(outcome);

            if session.state == AppState::Success {
                println!("Analysis complete: {}", summary(&session.result));
                if self.config.unattended {
                    let written =
                        export_all(self.storage.as_ref(), &self.output_dir(stem), &session.result)
                            .await?;
                    for path in written {
                        println!("Exported {}", path);
                    }
                    return Ok(());
                }
                if !self.browse(session, stem).await? {
                    return Ok(());
                }
                continue;
            }

            println!("Error: {}", session.error.as_deref().unwrap_or_default());
            let retry = !self.config.unattended
                && Confirm::new("Retry the analysis?")
                    .with_default(true)
                    .prompt()
                    .unwrap_or(false);
            if !retry {
                return Ok(());
            }
        }
    }

    async fn analyze_with_spinner(&self, script: &str) -> Result<AnalysisResult, AnalysisError> {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}") {
            pb.set_style(style);
        }
        pb.set_message("Analyzing script...");
        pb.enable_steady_tick(Duration::from_millis(120));

        let outcome = self.analyzer.analyze(script).await;
        pb.finish_and_clear();
        outcome
    }

    fn output_dir(&self, stem: &str) -> String {
        Path::new(&self.config.output_folder)
            .join(stem)
            .to_string_lossy()
            .to_string()
    }

    /// Interactive table browser. Returns `true` when the user asks for a new analysis.
    async fn browse(&self, session: &mut Session, stem: &str) -> Result<bool> {
        let output_dir = self.output_dir(stem);

        loop {
            let mut options: Vec<BrowseAction> = TableKind::ALL
                .iter()
                .map(|kind| BrowseAction::View(*kind, session.result.len_of(*kind)))
                .collect();
            options.push(BrowseAction::ExportActive(session.active_tab));
            options.push(BrowseAction::ExportAll);
            options.push(BrowseAction::Reanalyze);
            options.push(BrowseAction::Done);

            let prompt = format!("[{}] 选择操作:", session.active_tab.title());
            let action = match Select::new(&prompt, options).prompt() {
                Ok(action) => action,
                Err(_) => {
                    println!("Error reading input, leaving the table view.");
                    return Ok(false);
                }
            };

            match action {
                BrowseAction::View(kind, _) => {
                    session.active_tab = kind;
                    println!("{}", render_table(&session.result, kind));
                }
                BrowseAction::ExportActive(kind) => {
                    match export_table(self.storage.as_ref(), &output_dir, &session.result, kind)
                        .await?
                    {
                        Some(path) => println!("Exported {}", path),
                        None => println!("{} is empty, nothing to export.", kind.title()),
                    }
                }
                BrowseAction::ExportAll => {
                    let written =
                        export_all(self.storage.as_ref(), &output_dir, &session.result).await?;
                    if written.is_empty() {
                        println!("All tables are empty, nothing to export.");
                    }
                    for path in written {
                        println!("Exported {}", path);
                    }
                }
                BrowseAction::Reanalyze => return Ok(true),
                BrowseAction::Done => return Ok(false),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::NativeStorage;
    use async_trait::async_trait;
    use std::fs;
    use std::sync::Mutex;

    const REPLY: &str = r#"```json
{
  "scenes": [
    { "time": "深夜", "location": "楼道", "characters": ["李明"], "sceneContent": "李明跑上楼梯" },
    { "time": "深夜", "location": "房间", "mainCharacters": ["李明"] }
  ],
  "characterProfiles": [{ "name": "李明", "gender": "男" }],
  "sceneSettings": [],
  "propSettings": [{ "name": "黑色信封" }]
}
```"#;

    #[derive(Debug)]
    struct MockLlmClient {
        call_count: Arc<Mutex<usize>>,
    }

    impl MockLlmClient {
        fn new() -> Self {
            Self {
                call_count: Arc::new(Mutex::new(0)),
            }
        }
    }

    #[async_trait]
    impl LlmClient for MockLlmClient {
        async fn chat(&self, _system: &str, user: &str) -> Result<String> {
            let mut count = self.call_count.lock().unwrap();
            *count += 1;

            if user.contains("乱码") {
                return Ok("I could not produce JSON for this one.".to_string());
            }
            Ok(REPLY.to_string())
        }
    }

    fn test_config(root: &Path) -> Result<Config> {
        let input_dir = root.join("input");
        let output_dir = root.join("output");
        fs::create_dir_all(&input_dir)?;
        fs::create_dir_all(&output_dir)?;

        Ok(Config {
            input_folder: input_dir.to_string_lossy().to_string(),
            output_folder: output_dir.to_string_lossy().to_string(),
            unattended: true,
            ..Config::default()
        })
    }

    #[tokio::test]
    async fn test_unattended_run_exports_tables() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let config = test_config(temp_dir.path())?;
        fs::write(
            Path::new(&config.input_folder).join("episode_1.txt"),
            "(深夜，楼道) 李明跑上楼梯。",
        )?;

        let mock_llm = Box::new(MockLlmClient::new());
        let call_count = mock_llm.call_count.clone();
        let storage = Arc::new(NativeStorage::new());

        let workflow = WorkflowManager::new(config.clone(), mock_llm, storage);
        workflow.run().await?;

        assert_eq!(*call_count.lock().unwrap(), 1, "Should call LLM once per script");

        let out = Path::new(&config.output_folder).join("episode_1");
        assert!(out.join("scenes_breakdown.csv").exists());
        assert!(out.join("character_profiles.csv").exists());
        assert!(out.join("prop_settings.csv").exists());
        assert!(
            !out.join("scene_settings.csv").exists(),
            "Empty table should not be exported"
        );

        let scenes = fs::read_to_string(out.join("scenes_breakdown.csv"))?;
        let mut reader = csv::Reader::from_reader(scenes.as_bytes());
        let rows: Vec<_> = reader.records().collect::<std::result::Result<_, _>>()?;
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[1][0], "2");
        assert_eq!(&rows[1][7], "李明");
        assert_eq!(&rows[1][4], "无描述");

        Ok(())
    }

    #[tokio::test]
    async fn test_unsupported_files_are_skipped() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let config = test_config(temp_dir.path())?;
        let input = Path::new(&config.input_folder);
        fs::write(input.join("notes.pdf"), "%PDF-1.4")?;
        fs::write(input.join("b.txt"), "李明关上门。")?;

        let mock_llm = Box::new(MockLlmClient::new());
        let call_count = mock_llm.call_count.clone();
        let workflow = WorkflowManager::new(config.clone(), mock_llm, Arc::new(NativeStorage::new()));

        let scripts = workflow.list_scripts().await?;
        assert_eq!(scripts.len(), 1);
        assert!(scripts[0].ends_with("b.txt"));

        workflow.run().await?;
        assert_eq!(*call_count.lock().unwrap(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_script_does_not_stop_run() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let config = test_config(temp_dir.path())?;
        let input = Path::new(&config.input_folder);
        fs::write(input.join("a_bad.txt"), "乱码")?;
        fs::write(input.join("b_good.txt"), "李明拆开信封。")?;

        let mock_llm = Box::new(MockLlmClient::new());
        let call_count = mock_llm.call_count.clone();
        let workflow = WorkflowManager::new(config.clone(), mock_llm, Arc::new(NativeStorage::new()));
        workflow.run().await?;

        assert_eq!(*call_count.lock().unwrap(), 2);
        let out = Path::new(&config.output_folder);
        assert!(!out.join("a_bad").exists());
        assert!(out.join("b_good").join("scenes_breakdown.csv").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_session_reports_failures() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let config = test_config(temp_dir.path())?;
        let input = Path::new(&config.input_folder);
        let broken = input.join("broken.docx");
        fs::write(&broken, "not a word document")?;
        let garbled = input.join("garbled.txt");
        fs::write(&garbled, "乱码")?;

        let mock_llm = Box::new(MockLlmClient::new());
        let call_count = mock_llm.call_count.clone();
        let workflow = WorkflowManager::new(config, mock_llm, Arc::new(NativeStorage::new()));

        let session = workflow.process_script(broken.to_str().unwrap()).await?;
        assert_eq!(session.state, AppState::Idle);
        assert!(session.error.is_some());
        assert!(session.script.is_empty());
        assert_eq!(*call_count.lock().unwrap(), 0, "Broken file should not reach the LLM");

        let session = workflow.process_script(garbled.to_str().unwrap()).await?;
        assert_eq!(session.state, AppState::Error);
        assert_eq!(session.error.as_deref(), Some(crate::core::error::RETRY_MESSAGE));
        assert!(!session.has_data());
        Ok(())
    }
}
