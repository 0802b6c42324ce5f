//! Text Generation Handler
//!
//! 所有 OpenAI 文本端点共用一个处理器，按 `TextTask` 选择模型与参数

use std::sync::Arc;

use serde_json::Value;

use crate::application::commands::text_commands::*;
use crate::application::error::ApplicationError;
use crate::application::ports::{ChatMessage, ChatRequest, TextGenerationPort, UpstreamError};
use crate::application::retry::{retry_bounded, RetryPolicy};
use crate::domain::prompts::{self, LyricPlan, LyricSubject};

pub struct TextGenerationHandler {
    client: Arc<dyn TextGenerationPort>,
    models: TextModels,
    character: CharacterOptions,
    retry: RetryPolicy,
}

impl TextGenerationHandler {
    pub fn new(
        client: Arc<dyn TextGenerationPort>,
        models: TextModels,
        character: CharacterOptions,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client,
            models,
            character,
            retry,
        }
    }

    pub fn models(&self) -> &TextModels {
        &self.models
    }

    pub fn character_options(&self) -> CharacterOptions {
        self.character
    }

    pub async fn generate_story(&self, cmd: GenerateStory) -> Result<StoryResult, ApplicationError> {
        require(&cmd.prompt, "Missing prompt")?;
        let (story, model) = self
            .run(TextTask::Story, vec![ChatMessage::user(cmd.prompt)], false)
            .await?;
        Ok(StoryResult {
            story: non_empty(TextTask::Story, story)?,
            model,
        })
    }

    pub async fn generate_character(
        &self,
        cmd: GenerateCharacter,
    ) -> Result<CharacterResult, ApplicationError> {
        require(&cmd.prompt, "Missing prompt")?;

        let json = self.character.use_json;
        let system = if json {
            format!(
                "{} {}",
                prompts::CHARACTER_SYSTEM_PROMPT,
                prompts::CHARACTER_JSON_INSTRUCTION
            )
        } else {
            prompts::CHARACTER_SYSTEM_PROMPT.to_string()
        };
        let (text, model) = self
            .run(
                TextTask::Character,
                vec![ChatMessage::system(system), ChatMessage::user(cmd.prompt)],
                json,
            )
            .await?;
        let text = non_empty(TextTask::Character, text)?;

        let character = if json {
            match serde_json::from_str::<Value>(prompts::strip_code_fence(&text)) {
                Ok(value @ Value::Object(_)) => value,
                Ok(_) | Err(_) => {
                    tracing::warn!("Character reply is not a JSON object, returning raw text");
                    Value::String(text)
                }
            }
        } else {
            Value::String(text)
        };

        Ok(CharacterResult { character, model })
    }

    /// 解析失败时按 0 分、空说明返回
    pub async fn score_compatibility(
        &self,
        cmd: ScoreCompatibility,
    ) -> Result<CompatibilityResult, ApplicationError> {
        if is_blank(&cmd.character) || is_blank(&cmd.world) {
            return Err(ApplicationError::validation("Missing character or world"));
        }
        let prompt = prompts::compatibility_prompt(&cmd.character, &cmd.world);
        let (text, model) = self
            .run(TextTask::Compatibility, vec![ChatMessage::user(prompt)], false)
            .await?;

        let parsed: Value =
            serde_json::from_str(prompts::strip_code_fence(&text)).unwrap_or(Value::Null);
        let score = match parsed.get("score") {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
            _ => 0.0,
        };
        let explanation = parsed
            .get("explanation")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Ok(CompatibilityResult {
            score: score.round().clamp(0.0, 100.0) as u32,
            explanation,
            model,
        })
    }

    pub async fn extract_story_state(
        &self,
        cmd: ExtractStoryState,
    ) -> Result<StoryStateResult, ApplicationError> {
        require(&cmd.story, "Missing story text")?;
        let prompt = prompts::story_state_prompt(&cmd.story);
        let story_state = self.run_json(TextTask::StoryState, prompt).await?;
        Ok(StoryStateResult { story_state })
    }

    pub async fn extract_scene_moments(
        &self,
        cmd: ExtractSceneMoments,
    ) -> Result<SceneMomentsResult, ApplicationError> {
        require(&cmd.story, "Missing story text")?;
        let prompt = prompts::scene_moments_prompt(&cmd.story);
        let moments = self.run_json(TextTask::SceneMoments, prompt).await?;
        Ok(SceneMomentsResult { moments })
    }

    pub async fn visual_rewrite(
        &self,
        cmd: VisualRewrite,
    ) -> Result<VisualRewriteResult, ApplicationError> {
        require(&cmd.description, "Missing description")?;
        let prompt = prompts::visual_rewrite_prompt(&cmd.description);
        let (text, _) = self
            .run(TextTask::VisualRewrite, vec![ChatMessage::user(prompt)], false)
            .await?;
        Ok(VisualRewriteResult {
            visual_description: non_empty(TextTask::VisualRewrite, text)?,
        })
    }

    /// 模型返回空文本时返回空歌词而不是错误
    pub async fn generate_theme_lyrics(
        &self,
        cmd: GenerateThemeLyrics,
    ) -> Result<ThemeLyricsResult, ApplicationError> {
        let plan = LyricPlan::for_duration(cmd.duration_seconds);
        let subject = LyricSubject::from_character(&cmd.character);
        let prompt = prompts::lyrics_prompt(&plan, &subject, &cmd.tone, &cmd.world);

        let (text, model) = self
            .run(TextTask::ThemeLyrics, vec![ChatMessage::user(prompt)], false)
            .await?;

        Ok(ThemeLyricsResult {
            lyrics: prompts::normalize_lyrics(&text, plan.lines),
            lines: plan.lines,
            duration_seconds: plan.duration_seconds,
            model,
        })
    }

    /// 抽取类任务：回复必须是合法 JSON
    async fn run_json(&self, task: TextTask, prompt: String) -> Result<Value, ApplicationError> {
        let (text, _) = self.run(task, vec![ChatMessage::user(prompt)], false).await?;
        let text = non_empty(task, text)?;
        serde_json::from_str(prompts::strip_code_fence(&text)).map_err(|e| {
            tracing::warn!(task = task.as_str(), error = %e, "Model reply is not valid JSON");
            ApplicationError::upstream(UpstreamError::InvalidOutput(format!(
                "model reply for {} is not valid JSON: {}",
                task.as_str(),
                e
            )))
        })
    }

    /// 调用补全接口（带有限重试），返回 (文本, 配置的模型名)
    async fn run(
        &self,
        task: TextTask,
        messages: Vec<ChatMessage>,
        json_mode: bool,
    ) -> Result<(String, String), ApplicationError> {
        let profile = task.profile();
        let model = self.models.for_tier(profile.tier).to_string();
        let max_tokens = match task {
            TextTask::Character => self.character.max_tokens,
            _ => profile.max_tokens,
        };
        let request = ChatRequest {
            model: model.clone(),
            messages,
            max_tokens,
            temperature: profile.temperature,
            json_mode,
        };

        tracing::debug!(task = task.as_str(), model = %model, max_tokens, "Running text generation");

        let completion = retry_bounded(&self.retry, UpstreamError::is_retryable, || {
            self.client.complete(request.clone())
        })
        .await
        .map_err(|e| {
            tracing::error!(task = task.as_str(), error = %e, "Text generation failed");
            ApplicationError::upstream(e)
        })?;

        Ok((completion.content.trim().to_string(), model))
    }
}

fn require(value: &str, message: &'static str) -> Result<(), ApplicationError> {
    if value.trim().is_empty() {
        return Err(ApplicationError::validation(message));
    }
    Ok(())
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Bool(b) => !b,
        _ => false,
    }
}

fn non_empty(task: TextTask, text: String) -> Result<String, ApplicationError> {
    if text.is_empty() {
        return Err(ApplicationError::upstream(UpstreamError::InvalidOutput(
            format!("empty completion for {}", task.as_str()),
        )));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::FakeTextGenerator;
    use serde_json::json;
    use std::time::Duration;

    fn handler(fake: Arc<FakeTextGenerator>, character: CharacterOptions) -> TextGenerationHandler {
        handler_with_models(fake, character, TextModels::default())
    }

    fn handler_with_models(
        fake: Arc<FakeTextGenerator>,
        character: CharacterOptions,
        models: TextModels,
    ) -> TextGenerationHandler {
        TextGenerationHandler::new(
            fake,
            models,
            character,
            RetryPolicy {
                max_retries: 2,
                base_delay: Duration::from_millis(1),
            },
        )
    }

    #[tokio::test]
    async fn test_story_uses_story_model() {
        let fake = Arc::new(FakeTextGenerator::replying("Once upon a time"));
        let h = handler(fake.clone(), CharacterOptions::default());

        let result = h
            .generate_story(GenerateStory {
                prompt: "A dragon who bakes".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(result.story, "Once upon a time");
        assert_eq!(result.model, "gpt-4o");

        let requests = fake.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].max_tokens, 1200);
    }

    #[tokio::test]
    async fn test_missing_prompt_is_validation() {
        let h = handler(Arc::new(FakeTextGenerator::replying("x")), CharacterOptions::default());
        let err = h
            .generate_story(GenerateStory {
                prompt: "   ".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::ValidationError(ref m) if m == "Missing prompt"));
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let fake = Arc::new(FakeTextGenerator::new(vec![
            Err(UpstreamError::from_status("openai", 503, "busy")),
            Ok("Once upon a time".to_string()),
        ]));
        let h = handler(fake.clone(), CharacterOptions::default());
        let result = h
            .generate_story(GenerateStory {
                prompt: "p".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(result.story, "Once upon a time");
        assert_eq!(fake.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_story_is_invalid_output() {
        let h = handler(Arc::new(FakeTextGenerator::replying("")), CharacterOptions::default());
        let err = h
            .generate_story(GenerateStory {
                prompt: "p".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::UpstreamError {
                error: UpstreamError::InvalidOutput(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_character_json_mode() {
        let fake = Arc::new(FakeTextGenerator::replying(
            "```json\n{\"name\":\"Pip\",\"traits\":[\"brave\"]}\n```",
        ));
        let h = handler(
            fake.clone(),
            CharacterOptions {
                use_json: true,
                max_tokens: 450,
            },
        );
        let result = h
            .generate_character(GenerateCharacter {
                prompt: "a brave mouse".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(result.character["name"], "Pip");

        let request = &fake.requests()[0];
        assert!(request.json_mode);
        assert_eq!(request.max_tokens, 450);
        assert_eq!(request.temperature, Some(0.8));
    }

    #[tokio::test]
    async fn test_compatibility_parse_failure_defaults_to_zero() {
        let h = handler(
            Arc::new(FakeTextGenerator::replying("I cannot score this")),
            CharacterOptions::default(),
        );
        let result = h
            .score_compatibility(ScoreCompatibility {
                character: json!({"name": "Pip"}),
                world: json!("Candy kingdom"),
            })
            .await
            .unwrap();
        assert_eq!(result.score, 0);
        assert_eq!(result.explanation, "");
        assert_eq!(result.model, "gpt-4o-mini");
    }

    #[tokio::test]
    async fn test_compatibility_parses_score() {
        let h = handler(
            Arc::new(FakeTextGenerator::replying(
                r#"{"score": 87, "explanation": "A perfect fit."}"#,
            )),
            CharacterOptions::default(),
        );
        let result = h
            .score_compatibility(ScoreCompatibility {
                character: json!({"name": "Pip"}),
                world: json!({"name": "Candy kingdom"}),
            })
            .await
            .unwrap();
        assert_eq!(result.score, 87);
        assert_eq!(result.explanation, "A perfect fit.");
    }

    #[tokio::test]
    async fn test_extraction_requires_json() {
        let h = handler(
            Arc::new(FakeTextGenerator::replying("not json")),
            CharacterOptions::default(),
        );
        let err = h
            .extract_scene_moments(ExtractSceneMoments {
                story: "story".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::UpstreamError {
                error: UpstreamError::InvalidOutput(_),
                ..
            }
        ));

        let h = handler(
            Arc::new(FakeTextGenerator::replying(r#"[{"label":"Sunrise","description":"d"}]"#)),
            CharacterOptions::default(),
        );
        let result = h
            .extract_scene_moments(ExtractSceneMoments {
                story: "story".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(result.moments[0]["label"], "Sunrise");
    }

    #[tokio::test]
    async fn test_lyrics_trimmed_to_plan() {
        let fake = Arc::new(FakeTextGenerator::replying("Hop along\n\nLittle bunny\nExtra"));
        let h = handler(fake.clone(), CharacterOptions::default());
        let result = h
            .generate_theme_lyrics(GenerateThemeLyrics {
                character: json!({"species": "bunny", "traits": ["kind", "quick"]}),
                duration_seconds: Some(15.0),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(result.lines, 2);
        assert_eq!(result.duration_seconds, 15.0);
        assert_eq!(result.lyrics, "Hop along\nLittle bunny");
        assert_eq!(fake.requests()[0].max_tokens, 80);
    }

    #[tokio::test]
    async fn test_empty_lyrics_is_not_an_error() {
        let h = handler(Arc::new(FakeTextGenerator::replying("  ")), CharacterOptions::default());
        let result = h
            .generate_theme_lyrics(GenerateThemeLyrics::default())
            .await
            .unwrap();
        assert_eq!(result.lyrics, "");
        assert_eq!(result.duration_seconds, 12.0);
    }

    #[tokio::test]
    async fn test_lyrics_and_compatibility_use_their_own_tiers() {
        let fake = Arc::new(FakeTextGenerator::replying("Score: 80\nGood friends"));
        let models = TextModels {
            misc: "misc-model".to_string(),
            lyrics: "lyrics-model".to_string(),
            ..Default::default()
        };
        let h = handler_with_models(fake.clone(), CharacterOptions::default(), models);

        let lyrics = h
            .generate_theme_lyrics(GenerateThemeLyrics::default())
            .await
            .unwrap();
        assert_eq!(lyrics.model, "lyrics-model");
        assert_eq!(fake.requests()[0].model, "lyrics-model");

        h.score_compatibility(ScoreCompatibility {
            character: json!({"name": "Pip"}),
            world: json!("Candy forest"),
        })
        .await
        .unwrap();
        assert_eq!(fake.requests()[1].model, "misc-model");
    }
}
