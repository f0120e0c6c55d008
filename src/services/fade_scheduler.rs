//! FadeScheduler: единственный владелец состояний окон и регистра фокуса.
//!
//! Поведенческие контракты:
//! - повторное событие фокуса для уже сфокусированного окна ничего не делает
//!   (sway присылает его, например, при переходе фокуса от родителя);
//! - при смене фокуса затухание уходящего окна запрашивается раньше,
//!   чем проявление нового, затем обновляется регистр;
//! - у окна не бывает двух пишущих анимаций: новая запускается только после
//!   того, как предыдущая отменена и лишена права записи.

use crate::config::Config;
use crate::debug_if_enabled;
use crate::events::{WindowDescriptor, WindowEvent, WindowId};
use crate::services::interpolator::Interpolator;
use crate::services::window_state::WindowStateStore;
use crate::services::OpacitySink;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info};

pub struct FadeScheduler {
    windows: WindowStateStore,
    interpolator: Interpolator,
    focused: RwLock<Option<WindowDescriptor>>,
}

impl FadeScheduler {
    pub fn new(config: Arc<Config>, sink: Arc<dyn OpacitySink>) -> Self {
        info!(
            "Инициализация FadeScheduler (шаг {:.4}, пауза {:?}, правил: {})",
            config.step_fraction(),
            config.step_interval(),
            config.rules.len()
        );

        let interpolator = Interpolator::new(sink, config.step_fraction(), config.step_interval());

        Self {
            windows: WindowStateStore::new(config),
            interpolator,
            focused: RwLock::new(None),
        }
    }

    /// Начальная синхронизация по снимку дерева: регистр фокуса и мгновенная
    /// установка прозрачности всем окнам
    pub fn bootstrap(&self, tree: &[WindowDescriptor]) {
        let focused = tree.iter().find(|node| node.focused).cloned();
        match &focused {
            Some(window) => info!("Окно в фокусе при запуске: {}", window),
            None => info!("В снимке дерева нет узла в фокусе"),
        }
        *self.focused.write() = focused;

        for node in tree {
            self.init_window(node);
        }

        info!("Отслеживается окон: {}", self.windows.len());
    }

    pub fn handle_event(&self, event: WindowEvent) {
        debug_if_enabled!("Обработка события окна: {}", event);

        match event {
            WindowEvent::FocusChanged(window) => self.on_focus(&window),
            WindowEvent::BecameFloatingOrNew(window) => self.init_window(&window),
        }
    }

    pub fn on_focus(&self, window: &WindowDescriptor) {
        let previous = {
            let focused = self.focused.read();
            match focused.as_ref() {
                None => {
                    debug!("Регистр фокуса пуст, событие для {} пропущено", window);
                    return;
                }
                Some(current) if current.id == window.id => {
                    debug_if_enabled!("Повторный фокус {} пропущен", window);
                    return;
                }
                Some(current) => current.clone(),
            }
        };

        debug!("Смена фокуса: {} -> {}", previous, window);

        self.transition(&previous, false);
        self.transition(window, true);
        *self.focused.write() = Some(window.clone());
    }

    /// Мгновенная установка прозрачности без анимации. Для уже известного окна
    /// правила пересчитываются: окно могло стать плавающим.
    pub fn init_window(&self, window: &WindowDescriptor) {
        if !window.is_window() {
            return;
        }

        let is_focused = self.is_focused(window.id);
        let mut state = self.windows.register(window);
        let opacity = state.target(is_focused);

        debug_if_enabled!("Начальная прозрачность {} = {}", window, opacity);
        state.snap(window.id, opacity, self.interpolator.sink());
    }

    /// Запускает анимацию окна к прозрачности фокуса или её отсутствия,
    /// предварительно отменив текущую анимацию этого окна
    pub fn transition(&self, window: &WindowDescriptor, becoming_focused: bool) {
        if !window.is_window() {
            debug_if_enabled!("{} не является окном, переход пропущен", window);
            return;
        }

        let mut state = self.windows.get_or_create(window);
        let ticket = state.begin_animation();
        let target = state.target(becoming_focused);

        debug_if_enabled!(
            "Переход {}: {} -> {}",
            window,
            ticket.start_opacity(),
            target
        );

        let handle = self.interpolator.spawn(window.id, ticket, target);
        state.set_active_animation(handle);
    }

    pub fn focused_window(&self) -> Option<WindowId> {
        self.focused.read().as_ref().map(|window| window.id)
    }

    #[cfg(test)]
    pub fn current_opacity(&self, window_id: WindowId) -> Option<f64> {
        self.windows.current_opacity(window_id)
    }

    #[cfg(test)]
    pub fn is_animating(&self, window_id: WindowId) -> bool {
        self.windows.is_animating(window_id)
    }

    pub fn tracked_windows(&self) -> usize {
        self.windows.len()
    }

    pub fn stop_all_fades(&self) {
        info!("Остановка всех анимаций");
        self.windows.cancel_all();
    }

    fn is_focused(&self, window_id: WindowId) -> bool {
        self.focused
            .read()
            .as_ref()
            .map_or(false, |focused| focused.id == window_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Rule;
    use crate::events::ContainerKind;
    use crate::services::opacity_sink::test_utils::RecordingSink;
    use tokio::time::{sleep, Duration};

    fn config(unfocused: f64, steps: f64) -> Config {
        let mut config = Config::default();
        config.unfocused = unfocused;
        config.steps = steps;
        config.rate = 0.01;
        config.build_derived_values();
        config
    }

    fn scheduler(config: Config) -> (FadeScheduler, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        (FadeScheduler::new(Arc::new(config), sink.clone()), sink)
    }

    fn con(id: WindowId, app_id: &str) -> WindowDescriptor {
        WindowDescriptor::new(id, ContainerKind::Con).with_app_id(app_id)
    }

    #[tokio::test(start_paused = true)]
    async fn bootstrap_snaps_without_animation() {
        let (scheduler, sink) = scheduler(config(0.5, 4.0));
        let tree = vec![
            WindowDescriptor::new(1, ContainerKind::Other("root".into())),
            WindowDescriptor::new(2, ContainerKind::Other("workspace".into())),
            con(10, "foot").with_focused(true),
            con(11, "firefox"),
        ];

        scheduler.bootstrap(&tree);

        assert_eq!(scheduler.focused_window(), Some(10));
        assert_eq!(scheduler.tracked_windows(), 2);
        assert_eq!(scheduler.current_opacity(10), Some(1.0));
        assert_eq!(scheduler.current_opacity(11), Some(0.5));
        assert_eq!(scheduler.current_opacity(2), None);
        assert_eq!(sink.commands(), vec![(10, 1.0), (11, 0.5)]);
        assert!(!scheduler.is_animating(10));
    }

    #[tokio::test(start_paused = true)]
    async fn focus_change_fades_out_then_in() {
        let (scheduler, sink) = scheduler(config(0.5, 4.0));
        scheduler.bootstrap(&[con(1, "a").with_focused(true), con(2, "b")]);
        sink.clear();

        scheduler.on_focus(&con(2, "b"));
        assert_eq!(scheduler.focused_window(), Some(2));
        sleep(Duration::from_millis(100)).await;

        assert_eq!(sink.commands_for(1), vec![0.875, 0.75, 0.625, 0.5]);
        assert_eq!(sink.commands_for(2), vec![0.625, 0.75, 0.875, 1.0]);
        // уходящее окно получает первую команду раньше нового
        assert_eq!(sink.commands()[0], (1, 0.875));
        assert_eq!(scheduler.current_opacity(1), Some(0.5));
        assert_eq!(scheduler.current_opacity(2), Some(1.0));
    }

    #[tokio::test(start_paused = true)]
    async fn refocus_of_same_window_is_noop() {
        let (scheduler, sink) = scheduler(config(0.5, 4.0));
        scheduler.bootstrap(&[con(1, "a").with_focused(true), con(2, "b")]);
        sink.clear();

        scheduler.handle_event(WindowEvent::FocusChanged(con(1, "a")));
        sleep(Duration::from_millis(100)).await;

        assert!(sink.commands().is_empty());
        assert_eq!(scheduler.focused_window(), Some(1));
        assert_eq!(scheduler.current_opacity(1), Some(1.0));
        assert!(!scheduler.is_animating(1));
    }

    #[tokio::test(start_paused = true)]
    async fn focus_event_without_register_is_ignored() {
        let (scheduler, sink) = scheduler(config(0.5, 4.0));

        scheduler.on_focus(&con(1, "a"));
        sleep(Duration::from_millis(100)).await;

        assert!(sink.commands().is_empty());
        assert_eq!(scheduler.focused_window(), None);
        assert_eq!(scheduler.tracked_windows(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_transition_cancels_first_run() {
        let (scheduler, sink) = scheduler(config(0.5, 4.0));
        let window = con(7, "foot");

        scheduler.transition(&window, true);
        scheduler.transition(&window, true);
        sleep(Duration::from_millis(100)).await;

        // первая анимация так и не успела записать ни одного значения
        assert_eq!(sink.commands_for(7), vec![0.625, 0.75, 0.875, 1.0]);
        assert_eq!(scheduler.current_opacity(7), Some(1.0));
    }

    #[tokio::test(start_paused = true)]
    async fn interrupted_fade_in_restarts_from_last_value() {
        let (scheduler, sink) = scheduler(config(0.5, 4.0));
        scheduler.bootstrap(&[
            WindowDescriptor::new(100, ContainerKind::Other("workspace".into())).with_focused(true),
            con(1, "a"),
            con(2, "b"),
        ]);
        sink.clear();

        // A начинает проявляться
        scheduler.on_focus(&con(1, "a"));
        sleep(Duration::from_millis(15)).await;
        assert_eq!(sink.commands_for(1), vec![0.625, 0.75]);
        assert_eq!(scheduler.current_opacity(1), Some(0.75));

        // фокус уходит на B, пока A ещё анимируется
        scheduler.on_focus(&con(2, "b"));
        sleep(Duration::from_millis(100)).await;

        assert_eq!(
            sink.commands_for(1),
            vec![0.625, 0.75, 0.6875, 0.625, 0.5625, 0.5]
        );
        assert_eq!(sink.commands_for(2), vec![0.625, 0.75, 0.875, 1.0]);
        assert_eq!(scheduler.current_opacity(1), Some(0.5));
    }

    #[tokio::test(start_paused = true)]
    async fn rules_are_resolved_per_window() {
        let mut config = config(0.7, 1.0);
        config.rules = vec![Rule {
            app_id: "firefox".to_string(),
            floating: Some(false),
            focused: Some(1.0),
            unfocused: Some(0.8),
        }];
        let (scheduler, sink) = scheduler(config);

        let tiled = con(1, "firefox");
        let floating = WindowDescriptor::new(2, ContainerKind::FloatingCon).with_app_id("firefox");
        scheduler.transition(&tiled, false);
        scheduler.transition(&floating, false);
        sleep(Duration::from_millis(10)).await;

        // steps = 1: сразу финальное значение
        assert_eq!(sink.commands_for(1), vec![0.8]);
        assert_eq!(sink.commands_for(2), vec![0.7]);
    }

    #[tokio::test(start_paused = true)]
    async fn became_floating_cancels_fade_and_snaps() {
        let mut config = config(0.5, 4.0);
        config.rules = vec![Rule {
            app_id: "mpv".to_string(),
            floating: Some(true),
            focused: Some(0.95),
            unfocused: Some(0.9),
        }];
        let (scheduler, sink) = scheduler(config);
        scheduler.bootstrap(&[con(1, "a").with_focused(true), con(2, "mpv")]);

        scheduler.on_focus(&con(2, "mpv"));
        sleep(Duration::from_millis(5)).await;
        sink.clear();

        let floating = WindowDescriptor::new(2, ContainerKind::FloatingCon).with_app_id("mpv");
        scheduler.handle_event(WindowEvent::BecameFloatingOrNew(floating));
        sleep(Duration::from_millis(100)).await;

        assert_eq!(sink.commands_for(2), vec![0.95]);
        assert_eq!(scheduler.current_opacity(2), Some(0.95));
    }
}
