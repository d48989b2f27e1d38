use crate::core::error::AnalysisError;
use crate::core::model::AnalysisResult;
use crate::services::normalizer;

/// Instruction sent with every analysis. The screenplay itself is the user turn.
pub const SYSTEM_INSTRUCTION: &str = "\
你是专业的影视统筹、动画导演、音效设计师、场景美术师和道具设计师。\
你的任务是将用户提供的剧本拆解为标准的“分场景表”、“角色设定表”、“场景设定表”和“道具设定表”。

第一部分：scenes (分场景表)
对于每一场戏，提取：
1. time: 时间
2. location: 地点
3. shotType: 景别 (全景/远景/中景/近景/特写)
4. soundDescription: 声音描述 (整合对白、环境音、音效、音乐)
5. sceneContent: 场景内容 (100字以内摘要)
6. cameraMovement: 镜头运动方式 (推/Push, 拉/Pull, 摇/Pan, 移/Truck, 跟/Follow, 升降/Crane, 甩/Whip Pan, 环绕/Arc, 手持/Handheld, 希区柯克变焦/Dolly Zoom, 固定/Static)
7. characters: 角色列表 (字符串数组)
8. costume: 服装
9. props: 道具 (本场出现的道具)
10. aiPromptCn: 画面描述 (中文，用于AI绘画)
11. aiPromptEn: Image Prompt (English, detailed, cinematic)

第二部分：characterProfiles (角色设定)
提取主要角色设定：
1. name: 姓名
2. gender: 性别
3. age: 年龄
4. identity: 身份
5. appearance: 外貌特征
6. background: 时代背景
7. aiPromptCn: 角色立绘提示词 (中文)
8. aiPromptEn: Character Sheet Prompt (English)

第三部分：sceneSettings (场景设定)
提取剧本中出现的主要场景（去重合并），生成美术概念设计方案：
1. locationName: 场景名称
2. style: 风格
3. structure: 空间与结构
4. timeWeather: 时间与天气
5. atmosphere: 氛围与情绪
6. details: 场景道具与细节
7. aiPromptCn: 场景概念图提示词 (中文)
8. aiPromptEn: Scene Concept Art Prompt (English)

第四部分：propSettings (道具设定)
提取剧本中出现的关键道具（去重合并），生成设计方案：
1. name: 道具名称
2. appearance: 外观描述 (形状、颜色、材质、纹理、尺寸等)
3. aiPromptCn: 道具概念图提示词 (中文，白底背景，高精度)
4. aiPromptEn: Prop Concept Art Prompt (English, white background, high detail, 8k)

请严格只返回一个有效的 JSON 对象（不可翻译 JSON key）：
{
  \"scenes\": [...],
  \"characterProfiles\": [...],
  \"sceneSettings\": [...],
  \"propSettings\": [
    {
      \"name\": \"黑色信封\",
      \"appearance\": \"黑色牛皮纸材质，表面粗糙，封口处有红色火漆印，边缘略有磨损。尺寸约为16x23cm。\",
      \"aiPromptCn\": \"黑色信封，牛皮纸材质，红色火漆印，做旧质感，白底\",
      \"aiPromptEn\": \"Black envelope, kraft paper texture, red wax seal, worn edges, white background\"
    }
  ]
}
";

/// Screenplay shown when there is nothing else to analyze.
pub const SAMPLE_SCRIPT: &str = "\
(深夜，破旧的公寓楼道，声控灯忽明忽暗)
李明气喘吁吁地跑上楼梯，手里紧紧攥着一个黑色的信封。他回头看了一眼，楼下空无一人，只有风吹动铁门的吱呀声。
他颤抖着掏出钥匙，插了几次才插进锁孔。
进屋后，他猛地关上门，背靠在门板上滑落坐在地上，大口喘气。
房间里很乱，泡面桶散落在茶几上。
李明拆开信封，里面是一张照片。
他瞳孔放大，惊恐地捂住了嘴。
";

/// Turns the raw model reply into the four collections.
pub fn parse_response(response: &str) -> Result<AnalysisResult, AnalysisError> {
    if response.trim().is_empty() {
        return Err(AnalysisError::EmptyResponse);
    }
    let clean_json = strip_code_blocks(response);
    normalizer::parse_payload(&clean_json)
}

pub fn strip_code_blocks(s: &str) -> String {
    let s = s.trim();
    if s.starts_with("```json") {
        s.trim_start_matches("```json").trim_end_matches("```").trim().to_string()
    } else if s.starts_with("```") {
        s.trim_start_matches("```").trim_end_matches("```").trim().to_string()
    } else {
        s.to_string()
    }
}
