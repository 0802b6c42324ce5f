//! Google Cloud TTS Adapter

mod tts_client;

pub use tts_client::{language_code, GoogleTtsClient, GoogleTtsConfig, GOOGLE_PROVIDER};
