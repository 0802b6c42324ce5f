//! ElevenLabs Adapters - 语音合成与音乐生成

mod music_client;
mod tts_client;

pub use music_client::{ElevenLabsMusicClient, ElevenLabsMusicConfig, ELEVENLABS_MUSIC_PROVIDER};
pub use tts_client::{ElevenLabsConfig, ElevenLabsTtsClient, ELEVENLABS_PROVIDER};
