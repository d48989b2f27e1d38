//! Coerces the loosely-typed JSON returned by the model into the four record
//! collections.
//!
//! Every record kind is described by a table of [`FieldRule`]s: the output
//! field, the payload keys to try in order, and what to use when none of them
//! holds a usable value. Adding a field or a legacy alias is a table edit.
//! Missing data never fails a record; only a payload that is not JSON, or is
//! neither an object nor an array, is rejected.

use crate::core::error::AnalysisError;
use crate::core::model::{
    AnalysisResult, CharacterProfile, PropSetting, ScenePanel, SceneSetting, LIST_SEPARATOR,
};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text, replaced by the placeholder when absent.
    Text(&'static str),
    /// Sequence of names, empty when absent.
    List,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: &'static str,
    pub keys: &'static [&'static str],
    pub kind: FieldKind,
}

const fn text(field: &'static str, keys: &'static [&'static str], default: &'static str) -> FieldRule {
    FieldRule {
        field,
        keys,
        kind: FieldKind::Text(default),
    }
}

const fn list(field: &'static str, keys: &'static [&'static str]) -> FieldRule {
    FieldRule {
        field,
        keys,
        kind: FieldKind::List,
    }
}

pub const SCENE_PANEL_FIELDS: &[FieldRule] = &[
    text("time", &["time"], "未知"),
    text("location", &["location"], "未知"),
    text("shotType", &["shotType"], "未知"),
    text("sceneContent", &["sceneContent", "action"], "无描述"),
    text("cameraMovement", &["cameraMovement"], "固定"),
    text("soundDescription", &["soundDescription"], "无声音描述"),
    list("characters", &["characters", "mainCharacters"]),
    text("costume", &["costume"], "无"),
    text("props", &["props"], "无"),
    text("aiPromptCn", &["aiPromptCn"], "无中文提示词"),
    text("aiPromptEn", &["aiPromptEn", "imagePrompt"], "No prompt generated"),
];

pub const CHARACTER_PROFILE_FIELDS: &[FieldRule] = &[
    text("name", &["name"], "未知角色"),
    text("gender", &["gender"], "未知"),
    text("age", &["age"], "未知"),
    text("identity", &["identity"], "未知"),
    text("appearance", &["appearance"], "无详细描述"),
    text("background", &["background"], "无背景描述"),
    text("aiPromptCn", &["aiPromptCn"], "无角色提示词"),
    text("aiPromptEn", &["aiPromptEn"], "No character prompt"),
];

pub const SCENE_SETTING_FIELDS: &[FieldRule] = &[
    text("locationName", &["locationName", "location"], "未知场景"),
    text("style", &["style"], "无风格描述"),
    text("structure", &["structure"], "无结构描述"),
    text("timeWeather", &["timeWeather"], "无时间天气"),
    text("atmosphere", &["atmosphere"], "无氛围描述"),
    text("details", &["details"], "无细节描述"),
    text("aiPromptCn", &["aiPromptCn"], "无场景提示词"),
    text("aiPromptEn", &["aiPromptEn"], "No scene prompt"),
];

pub const PROP_SETTING_FIELDS: &[FieldRule] = &[
    text("name", &["name"], "未知道具"),
    text("appearance", &["appearance"], "无描述"),
    text("aiPromptCn", &["aiPromptCn"], "无道具提示词"),
    text("aiPromptEn", &["aiPromptEn"], "No prop prompt"),
];

/// A record kind the normalizer knows how to build.
pub trait Record: DeserializeOwned {
    /// Payload member holding the source array.
    const MEMBER: &'static str;
    const FIELDS: &'static [FieldRule];
    /// Whether records receive a 1-based `id` from their position.
    const NUMBERED: bool = false;
}

impl Record for ScenePanel {
    const MEMBER: &'static str = "scenes";
    const FIELDS: &'static [FieldRule] = SCENE_PANEL_FIELDS;
    const NUMBERED: bool = true;
}

impl Record for CharacterProfile {
    const MEMBER: &'static str = "characterProfiles";
    const FIELDS: &'static [FieldRule] = CHARACTER_PROFILE_FIELDS;
}

impl Record for SceneSetting {
    const MEMBER: &'static str = "sceneSettings";
    const FIELDS: &'static [FieldRule] = SCENE_SETTING_FIELDS;
}

impl Record for PropSetting {
    const MEMBER: &'static str = "propSettings";
    const FIELDS: &'static [FieldRule] = PROP_SETTING_FIELDS;
}

/// Parses `json` and normalizes it. No partial result is produced on failure.
pub fn parse_payload(json: &str) -> Result<AnalysisResult, AnalysisError> {
    let payload: Value =
        serde_json::from_str(json).map_err(|e| AnalysisError::MalformedPayload(e.to_string()))?;
    normalize(&payload)
}

pub fn normalize(payload: &Value) -> Result<AnalysisResult, AnalysisError> {
    let members = match payload {
        Value::Object(map) => Some(map),
        Value::Array(_) => {
            // Ambiguous: a bare array is taken to be the scene list.
            warn!("Payload is a bare array; treating it as the scene list");
            None
        }
        other => {
            return Err(AnalysisError::MalformedPayload(format!(
                "expected an object or array, found {}",
                kind_name(other)
            )))
        }
    };

    let member = |name: &str| members.and_then(|m| m.get(name));
    let scenes_source = match members {
        Some(map) => map.get(ScenePanel::MEMBER),
        None => Some(payload),
    };

    let result = AnalysisResult {
        scenes: normalize_collection(scenes_source)?,
        character_profiles: normalize_collection(member(CharacterProfile::MEMBER))?,
        scene_settings: normalize_collection(member(SceneSetting::MEMBER))?,
        prop_settings: normalize_collection(member(PropSetting::MEMBER))?,
    };

    debug!(
        "Normalized {} scenes, {} characters, {} scene settings, {} props",
        result.scenes.len(),
        result.character_profiles.len(),
        result.scene_settings.len(),
        result.prop_settings.len()
    );
    Ok(result)
}

/// Builds one record per element of `source`, in source order.
pub fn normalize_collection<T: Record>(source: Option<&Value>) -> Result<Vec<T>, AnalysisError> {
    let items = match source {
        Some(Value::Array(items)) => items,
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(other) => {
            warn!(
                "Ignoring `{}`: expected an array, found {}",
                T::MEMBER,
                kind_name(other)
            );
            return Ok(Vec::new());
        }
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let mut row = fill_fields(item, T::FIELDS);
            if T::NUMBERED {
                row.insert("id".to_string(), Value::from(index + 1));
            }
            serde_json::from_value(Value::Object(row)).map_err(|e| {
                AnalysisError::MalformedPayload(format!("{}[{}]: {}", T::MEMBER, index, e))
            })
        })
        .collect()
}

/// Applies `rules` to one source element. Non-object elements act as `{}`.
pub fn fill_fields(item: &Value, rules: &[FieldRule]) -> Map<String, Value> {
    let source = item.as_object();

    rules
        .iter()
        .map(|rule| {
            let mut candidates = rule
                .keys
                .iter()
                .filter_map(|key| source.and_then(|m| m.get(*key)));

            let value = match rule.kind {
                FieldKind::Text(default) => Value::String(
                    candidates
                        .find_map(coerce_text)
                        .unwrap_or_else(|| default.to_string()),
                ),
                FieldKind::List => Value::Array(
                    candidates
                        .find_map(coerce_list)
                        .unwrap_or_default()
                        .into_iter()
                        .map(Value::String)
                        .collect(),
                ),
            };
            (rule.field.to_string(), value)
        })
        .collect()
}

fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(scalar_text).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(LIST_SEPARATOR))
            }
        }
        other => scalar_text(other),
    }
}

fn coerce_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => Some(items.iter().filter_map(scalar_text).collect()),
        _ => None,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assert_no_blank_fields(result: &AnalysisResult) {
        let value = serde_json::to_value(result).unwrap();
        for member in value.as_object().unwrap().values() {
            for record in member.as_array().unwrap() {
                for (key, field) in record.as_object().unwrap() {
                    if let Some(s) = field.as_str() {
                        assert!(!s.trim().is_empty(), "field {} is blank", key);
                    }
                }
            }
        }
    }

    #[test]
    fn test_scene_ids_are_dense_and_ordered() {
        for n in [0usize, 1, 2, 7] {
            let scenes: Vec<Value> = (0..n).map(|i| json!({ "time": format!("t{}", i) })).collect();
            let result = normalize(&json!({ "scenes": scenes })).unwrap();

            let ids: Vec<usize> = result.scenes.iter().map(|s| s.id).collect();
            assert_eq!(ids, (1..=n).collect::<Vec<_>>());
            for (i, scene) in result.scenes.iter().enumerate() {
                assert_eq!(scene.time, format!("t{}", i));
            }
        }
    }

    #[test]
    fn test_model_supplied_id_is_ignored() {
        let result = normalize(&json!({ "scenes": [{ "id": 42 }, { "id": 42 }] })).unwrap();
        assert_eq!(result.scenes[0].id, 1);
        assert_eq!(result.scenes[1].id, 2);
    }

    #[test]
    fn test_empty_objects_get_every_default() {
        let payload = json!({
            "scenes": [{}],
            "characterProfiles": [{}],
            "sceneSettings": [{}],
            "propSettings": [{}]
        });
        let result = normalize(&payload).unwrap();
        assert_no_blank_fields(&result);

        let scene = &result.scenes[0];
        assert_eq!(scene.time, "未知");
        assert_eq!(scene.location, "未知");
        assert_eq!(scene.shot_type, "未知");
        assert_eq!(scene.scene_content, "无描述");
        assert_eq!(scene.camera_movement, "固定");
        assert_eq!(scene.sound_description, "无声音描述");
        assert_eq!(scene.costume, "无");
        assert_eq!(scene.props, "无");
        assert!(scene.characters.is_empty());
        assert_eq!(scene.prompt.en, "No prompt generated");

        assert_eq!(result.character_profiles[0].name, "未知角色");
        assert_eq!(result.character_profiles[0].appearance, "无详细描述");
        assert_eq!(result.scene_settings[0].location_name, "未知场景");
        assert_eq!(result.scene_settings[0].prompt.cn, "无场景提示词");
        assert_eq!(result.prop_settings[0].name, "未知道具");
        assert_eq!(result.prop_settings[0].prompt.en, "No prop prompt");
    }

    #[test]
    fn test_partial_record_keeps_present_fields() {
        let payload = json!({
            "characterProfiles": [{
                "name": "李明",
                "gender": "男",
                "age": "28",
                "identity": "快递员",
                "appearance": "消瘦",
                "background": "现代都市",
                "aiPromptCn": "年轻男子"
            }]
        });
        let profile = &normalize(&payload).unwrap().character_profiles[0];
        assert_eq!(profile.name, "李明");
        assert_eq!(profile.background, "现代都市");
        assert_eq!(profile.prompt.cn, "年轻男子");
        assert_eq!(profile.prompt.en, "No character prompt");
    }

    #[test]
    fn test_legacy_keys() {
        let payload = json!({
            "scenes": [{
                "mainCharacters": ["李明", "王芳", "李明"],
                "action": "李明拆开信封",
                "imagePrompt": "A man opens an envelope"
            }],
            "sceneSettings": [{ "location": "公寓楼道" }]
        });
        let result = normalize(&payload).unwrap();
        let scene = &result.scenes[0];
        assert_eq!(scene.characters, vec!["李明", "王芳", "李明"]);
        assert_eq!(scene.scene_content, "李明拆开信封");
        assert_eq!(scene.prompt.en, "A man opens an envelope");
        assert_eq!(result.scene_settings[0].location_name, "公寓楼道");
    }

    #[test]
    fn test_legacy_and_canonical_characters_agree() {
        let canonical = normalize(&json!({ "scenes": [{ "characters": ["李明"] }] })).unwrap();
        let legacy = normalize(&json!({ "scenes": [{ "mainCharacters": ["李明"] }] })).unwrap();
        assert_eq!(canonical, legacy);
    }

    #[test]
    fn test_canonical_key_wins_over_alias() {
        let payload = json!({
            "scenes": [{ "sceneContent": "正文", "action": "旧字段", "characters": [], "mainCharacters": ["甲"] }]
        });
        let scene = &normalize(&payload).unwrap().scenes[0];
        assert_eq!(scene.scene_content, "正文");
        assert!(scene.characters.is_empty());
    }

    #[test]
    fn test_blank_and_null_values_fall_back() {
        let payload = json!({
            "scenes": [{ "time": "", "location": "   ", "shotType": null, "sceneContent": "", "action": "备用" }]
        });
        let scene = &normalize(&payload).unwrap().scenes[0];
        assert_eq!(scene.time, "未知");
        assert_eq!(scene.location, "未知");
        assert_eq!(scene.shot_type, "未知");
        assert_eq!(scene.scene_content, "备用");
    }

    #[test]
    fn test_non_string_values_are_coerced() {
        let payload = json!({
            "scenes": [{ "props": ["信封", "钥匙"], "costume": { "top": "外套" }, "characters": ["李明", 7, null, ""] }],
            "characterProfiles": [{ "age": 28, "gender": true }]
        });
        let result = normalize(&payload).unwrap();
        assert_eq!(result.scenes[0].props, "信封、钥匙");
        assert_eq!(result.scenes[0].costume, "无");
        assert_eq!(result.scenes[0].characters, vec!["李明", "7"]);
        assert_eq!(result.character_profiles[0].age, "28");
        assert_eq!(result.character_profiles[0].gender, "未知");
    }

    #[test]
    fn test_missing_or_invalid_members_degrade_to_empty() {
        let result = normalize(&json!({ "scenes": "none", "propSettings": null })).unwrap();
        assert!(result.is_empty());

        let result = normalize(&json!({})).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_non_object_elements_are_defaulted() {
        let result = normalize(&json!({ "scenes": ["oops", 3, { "time": "清晨" }] })).unwrap();
        assert_eq!(result.scenes.len(), 3);
        assert_eq!(result.scenes[0].time, "未知");
        assert_eq!(result.scenes[2].id, 3);
        assert_eq!(result.scenes[2].time, "清晨");
    }

    #[test]
    fn test_bare_array_is_scene_list() {
        let result = normalize(&json!([{ "time": "深夜" }, {}])).unwrap();
        assert_eq!(result.scenes.len(), 2);
        assert_eq!(result.scenes[0].time, "深夜");
        assert!(result.character_profiles.is_empty());
        assert!(result.prop_settings.is_empty());
    }

    #[test]
    fn test_scalar_payload_is_malformed() {
        for payload in [json!("text"), json!(12), json!(null), json!(true)] {
            assert!(matches!(
                normalize(&payload),
                Err(AnalysisError::MalformedPayload(_))
            ));
        }
    }

    #[test]
    fn test_unparseable_payload_is_malformed() {
        let err = parse_payload("{\"scenes\": [").unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedPayload(_)));
        assert!(matches!(
            parse_payload("not json at all"),
            Err(AnalysisError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_normalizing_output_again_is_identity() {
        let payload = json!({
            "scenes": [
                { "time": "深夜", "location": "楼道", "characters": ["李明"], "props": ["信封"] },
                { "action": "关门" },
                {}
            ],
            "characterProfiles": [{ "name": "李明", "age": 28 }, {}],
            "sceneSettings": [{ "location": "公寓" }],
            "propSettings": [{ "name": "黑色信封" }]
        });
        let first = normalize(&payload).unwrap();
        let second = normalize(&serde_json::to_value(&first).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_tables_cover_every_record_field() {
        // Each table must produce exactly what its record deserializes from.
        let empty = json!({});
        let _: CharacterProfile =
            serde_json::from_value(Value::Object(fill_fields(&empty, CHARACTER_PROFILE_FIELDS))).unwrap();
        let _: SceneSetting =
            serde_json::from_value(Value::Object(fill_fields(&empty, SCENE_SETTING_FIELDS))).unwrap();
        let _: PropSetting =
            serde_json::from_value(Value::Object(fill_fields(&empty, PROP_SETTING_FIELDS))).unwrap();
        assert_eq!(SCENE_PANEL_FIELDS.len(), 11);
    }
}
