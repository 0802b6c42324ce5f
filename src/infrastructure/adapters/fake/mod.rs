//! Fake Adapters - 用于测试和本地联调的供应商替身
//!
//! 不发起任何网络请求，按配置的行为返回结果

mod fake_speech;
mod fake_text;
mod fake_upstream;

pub use fake_speech::FakeSpeechSynthesizer;
pub use fake_text::FakeTextGenerator;
pub use fake_upstream::{FakeBehavior, FakeUpstreamAdapter};
