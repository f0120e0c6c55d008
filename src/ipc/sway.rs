use super::tree::{descriptor, flatten};
use super::{CommandChannel, CommandOutcome, IpcConnector, WindowEventSource};
use crate::error::Result;
use crate::events::{WindowDescriptor, WindowEvent};
use crate::trace_if_enabled;
use async_trait::async_trait;
use futures_util::StreamExt;
use swayipc_async::{Connection, Event, EventStream, EventType, WindowChange};

/// Подключение к sway/i3. Сокет ищется в `SWAYSOCK`, `I3SOCK`,
/// затем через `sway --get-socketpath` / `i3 --get-socketpath`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SwayConnector;

#[async_trait]
impl IpcConnector for SwayConnector {
    async fn subscribe_windows(&self) -> Result<Box<dyn WindowEventSource>> {
        let events = Connection::new().await?.subscribe([EventType::Window]).await?;
        Ok(Box::new(SwayEventSource { events }))
    }

    async fn get_tree(&self) -> Result<Vec<WindowDescriptor>> {
        let root = Connection::new().await?.get_tree().await?;
        Ok(flatten(&root))
    }

    async fn command_channel(&self) -> Result<Box<dyn CommandChannel>> {
        let connection = Connection::new().await?;
        Ok(Box::new(SwayCommandChannel { connection }))
    }
}

struct SwayEventSource {
    events: EventStream,
}

#[async_trait]
impl WindowEventSource for SwayEventSource {
    async fn next_event(&mut self) -> Result<Option<WindowEvent>> {
        while let Some(event) = self.events.next().await {
            if let Event::Window(window_event) = event? {
                let container = descriptor(&window_event.container);
                match classify(&window_event.change, container) {
                    Some(event) => return Ok(Some(event)),
                    None => trace_if_enabled!("Пропуск события окна: {:?}", window_event.change),
                }
            }
        }
        Ok(None)
    }
}

struct SwayCommandChannel {
    connection: Connection,
}

#[async_trait]
impl CommandChannel for SwayCommandChannel {
    async fn run_command(&mut self, command: &str) -> Result<Vec<CommandOutcome>> {
        let outcomes = self.connection.run_command(command).await?;
        Ok(outcomes
            .into_iter()
            .map(|outcome| match outcome {
                Ok(()) => CommandOutcome::ok(),
                Err(e) => CommandOutcome::failed(e.to_string()),
            })
            .collect())
    }
}

/// Остальные изменения (title, close, move, ...) не интересны
fn classify(change: &WindowChange, container: WindowDescriptor) -> Option<WindowEvent> {
    match change {
        WindowChange::Focus => Some(WindowEvent::FocusChanged(container)),
        WindowChange::Floating | WindowChange::New => Some(WindowEvent::BecameFloatingOrNew(container)),
        _ => None,
    }
}
