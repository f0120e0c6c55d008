use crate::error::Result;
use crate::events::{ContainerKind, WindowDescriptor, WindowEvent};
use crate::services::FadeScheduler;
use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::info;

use super::r#trait::EventListenerTrait;

const FOCUS_PERIOD: Duration = Duration::from_secs(3);

pub struct DryRunListener {
    scheduler: Arc<FadeScheduler>,
}

impl DryRunListener {
    pub fn new(scheduler: Arc<FadeScheduler>) -> Self {
        Self { scheduler }
    }

    fn fake_windows() -> Vec<WindowDescriptor> {
        vec![
            WindowDescriptor::new(1, ContainerKind::Con)
                .with_app_id("foot")
                .with_focused(true),
            WindowDescriptor::new(2, ContainerKind::Con).with_app_id("firefox"),
            WindowDescriptor::new(3, ContainerKind::FloatingCon).with_app_id("mpv"),
        ]
    }

    pub async fn run(self) -> Result<()> {
        info!("Dry-run режим - EventListener работает в режиме эмуляции");

        let fake_windows = Self::fake_windows();
        self.scheduler.bootstrap(&fake_windows);

        let mut window_index = 0;
        let mut interval = interval(FOCUS_PERIOD);
        // первый тик срабатывает сразу, фокус при запуске уже выставлен
        interval.tick().await;

        loop {
            interval.tick().await;

            window_index = (window_index + 1) % fake_windows.len();
            let window = fake_windows[window_index].clone().with_focused(true);

            info!("Dry-run: эмулируем смену фокуса на {}", window);
            self.scheduler.handle_event(WindowEvent::FocusChanged(window));
        }
    }
}

#[async_trait::async_trait]
impl EventListenerTrait for DryRunListener {
    async fn run(self: Box<Self>) -> Result<()> {
        (*self).run().await
    }
}
