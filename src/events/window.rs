use serde::{Deserialize, Serialize};
use std::fmt;

/// Идентификатор контейнера в дереве sway/i3
pub type WindowId = i64;

/// Тип контейнера. Отслеживаются только `Con` и `FloatingCon`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerKind {
    Con,
    FloatingCon,
    /// root, output, workspace и прочее
    Other(String),
}

impl ContainerKind {
    pub fn is_window(&self) -> bool {
        matches!(self, ContainerKind::Con | ContainerKind::FloatingCon)
    }

    pub fn is_floating(&self) -> bool {
        matches!(self, ContainerKind::FloatingCon)
    }
}

/// Информация об окне, достаточная для выбора правил и отправки команд
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowDescriptor {
    pub id: WindowId,
    pub app_id: String,
    pub kind: ContainerKind,
    pub focused: bool,
}

impl WindowDescriptor {
    pub fn new(id: WindowId, kind: ContainerKind) -> Self {
        Self {
            id,
            app_id: String::new(),
            kind,
            focused: false,
        }
    }

    pub fn with_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = app_id.into();
        self
    }

    pub fn with_focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    pub fn is_window(&self) -> bool {
        self.kind.is_window()
    }

    pub fn is_floating(&self) -> bool {
        self.kind.is_floating()
    }
}

impl fmt::Display for WindowDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.app_id.is_empty() {
            write!(f, "#{}", self.id)
        } else {
            write!(f, "#{} ({})", self.id, self.app_id)
        }
    }
}

/// События окон, которые доставляются в FadeScheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowEvent {
    FocusChanged(WindowDescriptor),
    BecameFloatingOrNew(WindowDescriptor),
}

impl fmt::Display for WindowEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowEvent::FocusChanged(container) => write!(f, "FocusChanged: {}", container),
            WindowEvent::BecameFloatingOrNew(container) => {
                write!(f, "BecameFloatingOrNew: {}", container)
            }
        }
    }
}
