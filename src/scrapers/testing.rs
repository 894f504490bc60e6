//! Scripted driver for exercising adapters and the orchestrator without Chrome.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use super::traits::Driver;

/// Values a fake listing page answers with
#[derive(Debug, Default)]
pub struct FakePage {
    pub values: HashMap<String, Value>,
    pub texts: HashMap<String, String>,
    /// Evaluations that fail before the page starts answering
    pub unready_evaluations: AtomicU32,
}

impl FakePage {
    pub fn value(mut self, expression: &str, value: Value) -> Self {
        self.values.insert(expression.to_string(), value);
        self
    }

    pub fn text(mut self, selector: &str, text: &str) -> Self {
        self.texts.insert(selector.to_string(), text.to_string());
        self
    }

    pub fn unready_for(self, evaluations: u32) -> Self {
        self.unready_evaluations.store(evaluations, Ordering::SeqCst);
        self
    }
}

#[derive(Default)]
pub struct FakeDriver {
    pages: HashMap<String, FakePage>,
    current: Mutex<Option<String>>,
    /// Called with the URL before each navigation
    on_navigate: Option<Box<dyn Fn(&str) + Send + Sync>>,
    on_quit: Option<Box<dyn Fn() + Send + Sync>>,
    pub navigations: Mutex<Vec<String>>,
    pub evaluations: AtomicU32,
    pub quit_called: AtomicBool,
}

impl FakeDriver {
    /// Driver whose current page is `page`, as if it had already navigated
    pub fn on_page(page: FakePage) -> Self {
        let driver = Self::default().with_page("about:page", page);
        *driver.current.lock().unwrap() = Some("about:page".to_string());
        driver
    }

    pub fn with_page(mut self, url: &str, page: FakePage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    pub fn on_navigate(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_navigate = Some(Box::new(hook));
        self
    }

    pub fn on_quit(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_quit = Some(Box::new(hook));
        self
    }

    fn page(&self) -> Result<&FakePage> {
        let current = self.current.lock().unwrap().clone();
        current
            .and_then(|url| self.pages.get(&url))
            .ok_or_else(|| anyhow!("no page loaded"))
    }
}

#[async_trait]
impl Driver for FakeDriver {
    async fn navigate(&self, url: &str) -> Result<()> {
        if let Some(hook) = &self.on_navigate {
            hook(url);
        }
        self.navigations.lock().unwrap().push(url.to_string());
        if !self.pages.contains_key(url) {
            return Err(anyhow!("net::ERR_NAME_NOT_RESOLVED at {}", url));
        }
        *self.current.lock().unwrap() = Some(url.to_string());
        Ok(())
    }

    async fn evaluate(&self, expression: &str) -> Result<Value> {
        self.evaluations.fetch_add(1, Ordering::SeqCst);
        let page = self.page()?;

        let unready = page.unready_evaluations.load(Ordering::SeqCst);
        if unready > 0 {
            page.unready_evaluations.store(unready - 1, Ordering::SeqCst);
            return Err(anyhow!("TypeError: Cannot read properties of undefined"));
        }

        Ok(page.values.get(expression).cloned().unwrap_or(Value::Null))
    }

    async fn select_text(&self, selector: &str) -> Result<String> {
        self.page()?
            .texts
            .get(selector)
            .cloned()
            .ok_or_else(|| anyhow!("no element matches {}", selector))
    }

    async fn quit(&self) -> Result<()> {
        if let Some(hook) = &self.on_quit {
            hook();
        }
        self.quit_called.store(true, Ordering::SeqCst);
        Ok(())
    }
}
