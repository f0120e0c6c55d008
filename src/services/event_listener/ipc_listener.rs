use crate::error::{FadeError, Result};
use crate::fade_error;
use crate::ipc::{IpcConnector, WindowEventSource};
use crate::services::FadeScheduler;
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{info, warn};

use super::r#trait::EventListenerTrait;

const RECONNECT_DELAY: Duration = Duration::from_secs(1);

pub struct IpcEventListener {
    scheduler: Arc<FadeScheduler>,
    connector: Arc<dyn IpcConnector>,
    reconnect_delay: Duration,
}

impl IpcEventListener {
    pub fn new(scheduler: Arc<FadeScheduler>, connector: Arc<dyn IpcConnector>) -> Self {
        info!("Инициализация IpcEventListener");
        Self {
            scheduler,
            connector,
            reconnect_delay: RECONNECT_DELAY,
        }
    }

    #[cfg(test)]
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub async fn run(self) -> Result<()> {
        // первое подключение обязано пройти: это единственная фатальная ошибка
        let mut events = self.connect_and_sync().await?;
        info!("Подписка на события окон активна");

        loop {
            let error = self.dispatch(events.as_mut()).await;
            warn!("Поток событий прерван: {}. Переподключение...", error);
            events = self.reconnect().await;
        }
    }

    /// Подписка выполняется раньше снимка дерева, чтобы не потерять события между ними
    async fn connect_and_sync(&self) -> Result<Box<dyn WindowEventSource>> {
        let events = self.connector.subscribe_windows().await?;
        let tree = self.connector.get_tree().await?;
        self.scheduler.bootstrap(&tree);

        Ok(events)
    }

    async fn reconnect(&self) -> Box<dyn WindowEventSource> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            sleep(self.reconnect_delay).await;

            match self.connect_and_sync().await {
                Ok(events) => {
                    info!("Переподключение выполнено (попытка {})", attempt);
                    return events;
                }
                Err(e) => {
                    warn!("Попытка переподключения {} не удалась: {}", attempt, e);
                }
            }
        }
    }

    /// Доставляет события до первой ошибки транспорта или закрытия потока
    async fn dispatch(&self, events: &mut dyn WindowEventSource) -> FadeError {
        loop {
            match events.next_event().await {
                Ok(Some(event)) => self.scheduler.handle_event(event),
                Ok(None) => return fade_error!(service_unavailable, "оконный менеджер закрыл поток событий"),
                Err(e) => return e,
            }
        }
    }
}

#[async_trait::async_trait]
impl EventListenerTrait for IpcEventListener {
    async fn run(self: Box<Self>) -> Result<()> {
        (*self).run().await
    }
}
