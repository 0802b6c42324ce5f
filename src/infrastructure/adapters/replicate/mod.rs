//! Replicate Adapter - 图像与音乐预测

mod prediction_client;

pub use prediction_client::{
    InputStyle, ReplicateConfig, ReplicateModel, ReplicatePredictionClient, DEFAULT_IMAGE_VERSION,
};
