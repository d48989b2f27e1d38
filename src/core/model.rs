use serde::{Deserialize, Serialize};

/// Full-width separator used when a list is flattened into one cell.
pub const LIST_SEPARATOR: &str = "、";

/// Chinese and English image-generation prompts carried by every record.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PromptPair {
    #[serde(rename = "aiPromptCn")]
    pub cn: String,
    #[serde(rename = "aiPromptEn")]
    pub en: String,
}

/// One row of the shot breakdown.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScenePanel {
    pub id: usize,
    pub time: String,
    pub location: String,
    pub shot_type: String,
    pub scene_content: String,
    pub camera_movement: String,
    pub sound_description: String,
    pub characters: Vec<String>,
    pub costume: String,
    pub props: String,
    #[serde(flatten)]
    pub prompt: PromptPair,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CharacterProfile {
    pub name: String,
    pub gender: String,
    pub age: String,
    pub identity: String,
    pub appearance: String,
    pub background: String,
    #[serde(flatten)]
    pub prompt: PromptPair,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SceneSetting {
    pub location_name: String,
    pub style: String,
    pub structure: String,
    pub time_weather: String,
    pub atmosphere: String,
    pub details: String,
    #[serde(flatten)]
    pub prompt: PromptPair,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PropSetting {
    pub name: String,
    pub appearance: String,
    #[serde(flatten)]
    pub prompt: PromptPair,
}

/// The four collections produced by one analysis run.
///
/// Member names match the payload the model is asked to return, so a
/// serialized result can be normalized again without change.
#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub scenes: Vec<ScenePanel>,
    pub character_profiles: Vec<CharacterProfile>,
    pub scene_settings: Vec<SceneSetting>,
    pub prop_settings: Vec<PropSetting>,
}

impl AnalysisResult {
    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
            && self.character_profiles.is_empty()
            && self.scene_settings.is_empty()
            && self.prop_settings.is_empty()
    }

    pub fn len_of(&self, kind: TableKind) -> usize {
        match kind {
            TableKind::Scenes => self.scenes.len(),
            TableKind::Characters => self.character_profiles.len(),
            TableKind::SceneSettings => self.scene_settings.len(),
            TableKind::PropSettings => self.prop_settings.len(),
        }
    }

    /// Header plus one row of display cells per record of `kind`.
    pub fn table(&self, kind: TableKind) -> (&'static [&'static str], Vec<Vec<String>>) {
        match kind {
            TableKind::Scenes => (ScenePanel::HEADERS, rows(&self.scenes)),
            TableKind::Characters => (CharacterProfile::HEADERS, rows(&self.character_profiles)),
            TableKind::SceneSettings => (SceneSetting::HEADERS, rows(&self.scene_settings)),
            TableKind::PropSettings => (PropSetting::HEADERS, rows(&self.prop_settings)),
        }
    }
}

fn rows<T: TableRow>(records: &[T]) -> Vec<Vec<String>> {
    records.iter().map(TableRow::cells).collect()
}

/// The four browsable tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableKind {
    #[default]
    Scenes,
    Characters,
    SceneSettings,
    PropSettings,
}

impl TableKind {
    pub const ALL: [TableKind; 4] = [
        TableKind::Scenes,
        TableKind::Characters,
        TableKind::SceneSettings,
        TableKind::PropSettings,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            TableKind::Scenes => "分场景表",
            TableKind::Characters => "角色设定表",
            TableKind::SceneSettings => "场景设定表",
            TableKind::PropSettings => "道具设定表",
        }
    }

    /// Whether the first column is the positional scene number.
    pub fn numbered(&self) -> bool {
        matches!(self, TableKind::Scenes)
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            TableKind::Scenes => "scenes_breakdown.csv",
            TableKind::Characters => "character_profiles.csv",
            TableKind::SceneSettings => "scene_settings.csv",
            TableKind::PropSettings => "prop_settings.csv",
        }
    }
}

impl std::fmt::Display for TableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}

/// A record that can be shown as one table row.
pub trait TableRow {
    const HEADERS: &'static [&'static str];
    fn cells(&self) -> Vec<String>;
}

impl TableRow for ScenePanel {
    const HEADERS: &'static [&'static str] = &[
        "场次",
        "时间",
        "地点",
        "景别",
        "场景内容",
        "镜头运动",
        "声音描述",
        "角色",
        "服装",
        "道具",
        "AI提示词(中)",
        "AI提示词(英)",
    ];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.time.clone(),
            self.location.clone(),
            self.shot_type.clone(),
            self.scene_content.clone(),
            self.camera_movement.clone(),
            self.sound_description.clone(),
            self.characters.join(LIST_SEPARATOR),
            self.costume.clone(),
            self.props.clone(),
            self.prompt.cn.clone(),
            self.prompt.en.clone(),
        ]
    }
}

impl TableRow for CharacterProfile {
    const HEADERS: &'static [&'static str] = &[
        "角色姓名",
        "性别",
        "年龄",
        "身份",
        "人物外貌特征",
        "所在时代背景",
        "AI提示词(中)",
        "AI提示词(英)",
    ];

    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.gender.clone(),
            self.age.clone(),
            self.identity.clone(),
            self.appearance.clone(),
            self.background.clone(),
            self.prompt.cn.clone(),
            self.prompt.en.clone(),
        ]
    }
}

impl TableRow for SceneSetting {
    const HEADERS: &'static [&'static str] = &[
        "场景名称",
        "风格",
        "空间与结构",
        "时间与天气",
        "氛围与情绪",
        "场景道具与细节",
        "AI提示词(中)",
        "AI提示词(英)",
    ];

    fn cells(&self) -> Vec<String> {
        vec![
            self.location_name.clone(),
            self.style.clone(),
            self.structure.clone(),
            self.time_weather.clone(),
            self.atmosphere.clone(),
            self.details.clone(),
            self.prompt.cn.clone(),
            self.prompt.en.clone(),
        ]
    }
}

impl TableRow for PropSetting {
    const HEADERS: &'static [&'static str] = &["道具名称", "外观描述", "AI提示词(中)", "AI提示词(英)"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.appearance.clone(),
            self.prompt.cn.clone(),
            self.prompt.en.clone(),
        ]
    }
}
