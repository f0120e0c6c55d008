use crate::events::WindowId;
use crate::ipc::{CommandChannel, IpcConnector};
use crate::debug_if_enabled;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Приёмник команд изменения прозрачности.
///
/// Команды отправляются по принципу fire-and-forget: вызов не ждёт подтверждения
/// и никогда не блокирует, поэтому его можно делать под блокировкой состояния окна.
pub trait OpacitySink: Send + Sync {
    fn set_opacity(&self, window_id: WindowId, opacity: f64);
}

pub fn opacity_command(window_id: WindowId, opacity: f64) -> String {
    format!("[con_id={}] opacity {}", window_id, opacity)
}

/// Создать приёмник команд: без подключения - режим сухого запуска
pub fn create_opacity_sink(
    connector: Option<Arc<dyn IpcConnector>>,
) -> (Arc<dyn OpacitySink>, Option<JoinHandle<()>>) {
    match connector {
        Some(connector) => {
            let (sink, handle) = IpcOpacitySink::spawn(connector);
            let sink: Arc<dyn OpacitySink> = Arc::new(sink);
            (sink, Some(handle))
        }
        None => {
            let sink: Arc<dyn OpacitySink> = Arc::new(DryRunOpacitySink);
            (sink, None)
        }
    }
}

/// Отправляет команды через отдельное IPC соединение в фоновой задаче
pub struct IpcOpacitySink {
    sender: mpsc::UnboundedSender<String>,
}

impl IpcOpacitySink {
    pub fn spawn(connector: Arc<dyn IpcConnector>) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = tokio::spawn(command_writer(connector, receiver));
        (Self { sender }, handle)
    }
}

impl OpacitySink for IpcOpacitySink {
    fn set_opacity(&self, window_id: WindowId, opacity: f64) {
        if self.sender.send(opacity_command(window_id, opacity)).is_err() {
            warn!("Задача отправки команд завершена, команда для #{} потеряна", window_id);
        }
    }
}

/// Последовательно выполняет команды. Неудачная команда не повторяется;
/// при ошибке транспорта соединение пересоздаётся на следующей команде.
async fn command_writer(connector: Arc<dyn IpcConnector>, mut receiver: mpsc::UnboundedReceiver<String>) {
    let mut connection: Option<Box<dyn CommandChannel>> = None;

    while let Some(command) = receiver.recv().await {
        if connection.is_none() {
            match connector.command_channel().await {
                Ok(conn) => {
                    info!("Соединение для команд установлено");
                    connection = Some(conn);
                }
                Err(e) => {
                    warn!("Не удалось подключиться к оконному менеджеру: {}. Команда пропущена", e);
                    continue;
                }
            }
        }

        let Some(conn) = connection.as_mut() else {
            continue;
        };

        match conn.run_command(&command).await {
            Ok(outcomes) => {
                for outcome in outcomes.iter().filter(|outcome| !outcome.success) {
                    // обычно окно уже закрыто
                    debug_if_enabled!(
                        "Команда '{}' отклонена: {}",
                        command,
                        outcome.error.as_deref().unwrap_or("без описания")
                    );
                }
            }
            Err(e) => {
                warn!("Ошибка отправки команды '{}': {}", command, e);
                connection = None;
            }
        }
    }

    info!("Задача отправки команд завершена");
}

pub struct DryRunOpacitySink;

impl OpacitySink for DryRunOpacitySink {
    fn set_opacity(&self, window_id: WindowId, opacity: f64) {
        info!("[DRY RUN] {}", opacity_command(window_id, opacity));
    }
}
