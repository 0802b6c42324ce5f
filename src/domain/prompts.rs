//! 提示词模板
//!
//! 儿童故事应用使用的所有文本生成提示词，以及主题歌词的长度规划

use serde_json::Value;

use crate::domain::job::clamp_seconds;

/// 角色描述系统提示词
pub const CHARACTER_SYSTEM_PROMPT: &str =
    "You are a creative assistant that writes character descriptions.";

/// JSON 模式下追加的格式约束
pub const CHARACTER_JSON_INSTRUCTION: &str = "Respond with a single JSON object describing the \
     character with the keys: name, species, role, traits (array of strings), appearance, \
     personality, backstory.";

pub fn compatibility_prompt(character: &Value, world: &Value) -> String {
    format!(
        "Score (0-100) and explain (2 sentences) compatibility between character and world. \
         Return JSON {{score, explanation}}.\n\nCharacter: {}\nWorld: {}",
        character, world
    )
}

pub fn story_state_prompt(story: &str) -> String {
    format!(
        r#"
You are an assistant that extracts structured story state data from children's bedtime stories.

Given the story, return a JSON object containing:
{{
  "currentLocation": "Where is the story taking place? Include world/setting details (time, mood, weather, etc.)",
  "knownCharacters": [
    {{
      "name": "...",
      "currentState": "...",
      "goal": "...",
      "relationships": "..."
    }}
  ],
  "importantObjects": [
    {{
      "name": "...",
      "description": "...",
      "possessedBy": "..."
    }}
  ],
  "moralsLearned": ["..."],
  "openPlotPoints": ["List unresolved mysteries, quests, or conflicts"],
  "latestEventSummary": "A 1-2 sentence summary of the most recent events.",
  "tone": "Overall tone/style of the story"
}}

Only return valid JSON.

STORY:
{}
"#,
        story
    )
}

pub fn scene_moments_prompt(story: &str) -> String {
    format!(
        r#"
You are an assistant that extracts visually interesting scene moments from children's stories.

Given the story, return a JSON array of 3 objects, each with:
  - "label": a short, catchy name for the scene (max 6 words)
  - "description": a 1-2 sentence description of the scene, suitable for illustration

Only return valid JSON.

STORY:
{}
"#,
        story
    )
}

pub fn visual_rewrite_prompt(description: &str) -> String {
    format!(
        "Rewrite the following as a purely visual, present-tense scene description for an \
         illustrator. Do not mention or imply any text, writing, labels, captions, or book pages. \
         Focus only on what should be seen, not read. Use a cinematic, child-friendly, colorful \
         style.\n\nDescription: {}",
        description
    )
}

/// 去掉模型偶尔包裹在 JSON 外面的 ``` 代码块
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

// ============================================================================
// Theme lyrics
// ============================================================================

pub const MIN_LYRIC_SECONDS: f64 = 8.0;
pub const MAX_LYRIC_SECONDS: f64 = 20.0;
pub const DEFAULT_LYRIC_SECONDS: f64 = 12.0;

/// 歌词长度规划
///
/// 8-13 秒一行，14-20 秒两行
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LyricPlan {
    pub duration_seconds: f64,
    pub lines: usize,
    pub words_per_line: &'static str,
    pub max_syllables: u32,
}

impl LyricPlan {
    pub fn for_duration(requested: Option<f64>) -> Self {
        let duration_seconds = clamp_seconds(
            requested,
            MIN_LYRIC_SECONDS,
            MAX_LYRIC_SECONDS,
            DEFAULT_LYRIC_SECONDS,
        );
        let short = duration_seconds <= 11.0;
        Self {
            duration_seconds,
            lines: if duration_seconds <= 13.0 { 1 } else { 2 },
            words_per_line: if short { "5-8" } else { "5-7" },
            max_syllables: if short { 18 } else { 28 },
        }
    }
}

/// 歌词描述对象（来自前端的角色 JSON）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LyricSubject {
    pub name: String,
    pub species: String,
    pub role: String,
    pub traits: String,
}

impl LyricSubject {
    pub fn from_character(character: &Value) -> Self {
        let text = |key: &str| {
            character
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let traits = match character.get("traits") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(", "),
            _ => text("personality"),
        };
        Self {
            name: text("name"),
            species: text("species"),
            role: text("role"),
            traits,
        }
    }
}

pub fn lyrics_prompt(plan: &LyricPlan, subject: &LyricSubject, tone: &str, world: &str) -> String {
    let one = plan.lines == 1;
    let who = [subject.species.as_str(), subject.role.as_str()]
        .into_iter()
        .find(|s| !s.is_empty())
        .unwrap_or("character");
    let or_default = |s: &str, fallback: &'static str| -> String {
        if s.is_empty() {
            fallback.to_string()
        } else {
            s.to_string()
        }
    };
    let name_hint = if subject.name.is_empty() {
        ".".to_string()
    } else {
        " (if you include a name, prefer an easy nickname or omit).".to_string()
    };

    format!(
        "Write {count} ultra-short, family-friendly lyric line{plural} for a child-safe character theme.\n\
         Character: {who}; traits: {traits}; tone: {tone}; world vibe: {world}.\n\
         Constraints: {only}, {words} words per line, <= {syllables} syllables per line, simple vocabulary, chantable, no tongue-twisters.\n\
         Safety: no brands, politics, violence, medical, or mature topics. No personal data. Avoid hard-to-sing proper names{name_hint}\n\
         Formatting: output ONLY the line{plural} with newline separation. No quotes, no punctuation except commas, no emojis.",
        count = if one { "ONE" } else { "TWO" },
        plural = if one { "" } else { "s" },
        who = who,
        traits = or_default(&subject.traits, "friendly"),
        tone = or_default(tone, "whimsical"),
        world = or_default(world, "storybook"),
        only = if one { "ONE line only" } else { "TWO lines only" },
        words = plan.words_per_line,
        syllables = plan.max_syllables,
        name_hint = name_hint,
    )
}

/// 清理模型输出：去掉空行，最多保留 `lines` 行
pub fn normalize_lyrics(text: &str, lines: usize) -> String {
    text.replace('\r', "")
        .split('\n')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(lines)
        .collect::<Vec<_>>()
        .join("\n")
}
