//! Доступ к оконному менеджеру через i3-ipc (реализация - `swayipc-async`).
//!
//! Сервисы работают только с трейтами этого модуля: каждая операция открывает
//! новое соединение, поэтому переподключение - это просто повторный вызов.

mod sway;
#[cfg(test)]
pub mod test_utils;
mod tree;

use crate::error::Result;
use crate::events::{WindowDescriptor, WindowEvent};
use async_trait::async_trait;

pub use sway::SwayConnector;

/// Результат одной команды из ответа RUN_COMMAND
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutcome {
    pub success: bool,
    pub error: Option<String>,
}

impl CommandOutcome {
    pub fn ok() -> Self {
        Self { success: true, error: None }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

#[async_trait]
pub trait IpcConnector: Send + Sync {
    /// Новое соединение с подпиской на события окон
    async fn subscribe_windows(&self) -> Result<Box<dyn WindowEventSource>>;

    /// Снимок дерева в порядке обхода в глубину
    async fn get_tree(&self) -> Result<Vec<WindowDescriptor>>;

    /// Новое соединение для команд
    async fn command_channel(&self) -> Result<Box<dyn CommandChannel>>;
}

#[async_trait]
pub trait WindowEventSource: Send {
    /// Следующее интересное событие; `Ok(None)` - оконный менеджер закрыл поток
    async fn next_event(&mut self) -> Result<Option<WindowEvent>>;
}

#[async_trait]
pub trait CommandChannel: Send {
    async fn run_command(&mut self, command: &str) -> Result<Vec<CommandOutcome>>;
}
