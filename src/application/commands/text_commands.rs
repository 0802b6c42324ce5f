//! Text Commands - 文本生成相关命令

use serde::Serialize;
use serde_json::Value;

/// 模型档位
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    /// 长篇故事
    Story,
    /// 短输出：评分、角色
    Misc,
    /// 主题曲歌词
    Lyrics,
    /// 结构化抽取与改写
    Extract,
}

/// 各档位解析后的模型名
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextModels {
    pub story: String,
    pub misc: String,
    pub lyrics: String,
    pub extract: String,
}

impl TextModels {
    pub fn for_tier(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Story => &self.story,
            ModelTier::Misc => &self.misc,
            ModelTier::Lyrics => &self.lyrics,
            ModelTier::Extract => &self.extract,
        }
    }
}

impl Default for TextModels {
    fn default() -> Self {
        Self {
            story: "gpt-4o".to_string(),
            misc: "gpt-4o-mini".to_string(),
            lyrics: "gpt-4o".to_string(),
            extract: "gpt-3.5-turbo".to_string(),
        }
    }
}

/// 角色生成选项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacterOptions {
    /// 要求模型输出 JSON 对象
    pub use_json: bool,
    pub max_tokens: u32,
}

impl Default for CharacterOptions {
    fn default() -> Self {
        Self {
            use_json: false,
            max_tokens: 300,
        }
    }
}

/// 一类文本任务的调用参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextTask {
    Story,
    Character,
    Compatibility,
    StoryState,
    SceneMoments,
    VisualRewrite,
    ThemeLyrics,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaskProfile {
    pub tier: ModelTier,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
}

impl TextTask {
    pub fn profile(&self) -> TaskProfile {
        let (tier, max_tokens, temperature) = match self {
            TextTask::Story => (ModelTier::Story, 1200, None),
            TextTask::Character => (ModelTier::Misc, 300, Some(0.8)),
            TextTask::Compatibility => (ModelTier::Misc, 250, None),
            TextTask::StoryState => (ModelTier::Extract, 700, None),
            TextTask::SceneMoments => (ModelTier::Extract, 700, None),
            TextTask::VisualRewrite => (ModelTier::Extract, 300, None),
            TextTask::ThemeLyrics => (ModelTier::Lyrics, 80, None),
        };
        TaskProfile {
            tier,
            max_tokens,
            temperature,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TextTask::Story => "story",
            TextTask::Character => "character",
            TextTask::Compatibility => "compatibility",
            TextTask::StoryState => "story_state",
            TextTask::SceneMoments => "scene_moments",
            TextTask::VisualRewrite => "visual_rewrite",
            TextTask::ThemeLyrics => "theme_lyrics",
        }
    }
}

// ============================================================================
// Commands
// ============================================================================

#[derive(Debug, Clone)]
pub struct GenerateStory {
    pub prompt: String,
}

#[derive(Debug, Clone)]
pub struct GenerateCharacter {
    pub prompt: String,
}

#[derive(Debug, Clone)]
pub struct ScoreCompatibility {
    pub character: Value,
    pub world: Value,
}

#[derive(Debug, Clone)]
pub struct ExtractStoryState {
    pub story: String,
}

#[derive(Debug, Clone)]
pub struct ExtractSceneMoments {
    pub story: String,
}

#[derive(Debug, Clone)]
pub struct VisualRewrite {
    pub description: String,
}

#[derive(Debug, Clone, Default)]
pub struct GenerateThemeLyrics {
    pub character: Value,
    pub tone: String,
    pub world: String,
    pub duration_seconds: Option<f64>,
}

// ============================================================================
// Results
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct StoryResult {
    pub story: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CharacterResult {
    /// JSON 模式下为对象，否则为字符串
    pub character: Value,
    pub model: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompatibilityResult {
    pub score: u32,
    pub explanation: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryStateResult {
    pub story_state: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct SceneMomentsResult {
    pub moments: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualRewriteResult {
    pub visual_description: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeLyricsResult {
    pub lyrics: String,
    pub lines: usize,
    pub duration_seconds: f64,
    pub model: String,
}
