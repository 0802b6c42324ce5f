//! Provider Registry
//!
//! 供应商名称 -> Upstream Adapter 的映射，启动时构建一次

use std::collections::HashMap;
use std::sync::Arc;

use crate::application::ports::UpstreamAdapterPort;

#[derive(Default, Clone)]
pub struct ProviderRegistry {
    adapters: HashMap<&'static str, Arc<dyn UpstreamAdapterPort>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册适配器，同名时后注册的覆盖先注册的
    pub fn register(&mut self, adapter: Arc<dyn UpstreamAdapterPort>) {
        let name = adapter.name();
        if self.adapters.insert(name, adapter).is_some() {
            tracing::warn!(provider = %name, "Provider registered twice, keeping the latest");
        }
    }

    pub fn with(mut self, adapter: Arc<dyn UpstreamAdapterPort>) -> Self {
        self.register(adapter);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn UpstreamAdapterPort>> {
        self.adapters.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.adapters.contains_key(name)
    }

    /// 已注册的供应商名称（排序后）
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.adapters.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}
