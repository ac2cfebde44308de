//! 站点注册表
//!
//! 站点是引擎的配置实例：注册表按标识符把站点配置与任务参数
//! 装配成具体驱动，新站点只需注册一个工厂。

use std::collections::HashMap;

use crate::core::config::SiteConfig;
use crate::core::error::{GrabError, Result};
use crate::interfaces::{Driver, TaskArgs};

pub mod instagram;
pub mod liquge;
pub mod panlong;

type DriverFactory = Box<dyn Fn(SiteConfig, &TaskArgs) -> Result<Box<dyn Driver>> + Send + Sync>;

pub struct SiteRegistry {
    factories: HashMap<String, DriverFactory>,
}

impl SiteRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
        };
        registry.register("liquge", liquge::build);
        registry.register("panlong", panlong::build);
        registry.register("instagram", instagram::build);
        registry
    }

    pub fn register<F>(&mut self, id: &str, factory: F)
    where
        F: Fn(SiteConfig, &TaskArgs) -> Result<Box<dyn Driver>> + Send + Sync + 'static,
    {
        self.factories.insert(id.to_string(), Box::new(factory));
    }

    pub fn create(&self, id: &str, config: SiteConfig, args: &TaskArgs) -> Result<Box<dyn Driver>> {
        match self.factories.get(id) {
            Some(factory) => factory(config, args),
            None => Err(GrabError::Custom(format!("Unknown site: {}", id))),
        }
    }

    pub fn list(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.factories.keys().map(|s| s.as_str()).collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for SiteRegistry {
    fn default() -> Self {
        Self::new()
    }
}
