use crate::config::Config;
use crate::events::{WindowDescriptor, WindowId};
use crate::services::OpacitySink;
use dashmap::mapref::one::RefMut;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Общая для окна и его анимации ячейка: последняя записанная прозрачность
/// и поколение, которому разрешено писать.
#[derive(Debug)]
struct FadeCell {
    opacity: f64,
    generation: u64,
}

/// Право на запись прозрачности для одного запуска анимации.
///
/// Запись проходит под блокировкой ячейки и только пока поколение билета совпадает
/// с текущим, поэтому после отмены отменённая анимация больше ничего не отправит.
pub struct FadeTicket {
    cell: Arc<Mutex<FadeCell>>,
    generation: u64,
    start: f64,
}

impl FadeTicket {
    /// Прозрачность на момент отмены предыдущей анимации
    pub fn start_opacity(&self) -> f64 {
        self.start
    }

    /// Отправляет значение и запоминает его. `false` - билет устарел, ничего не записано.
    pub fn write(&self, opacity: f64, send: impl FnOnce(f64)) -> bool {
        let mut cell = self.cell.lock();
        if cell.generation != self.generation {
            return false;
        }
        send(opacity);
        cell.opacity = opacity;
        true
    }
}

/// Состояние анимации одного окна
pub struct WindowState {
    pub focused_opacity: f64,
    pub unfocused_opacity: f64,
    fade: Arc<Mutex<FadeCell>>,
    active_animation: Option<JoinHandle<()>>,
}

impl WindowState {
    pub fn new(focused_opacity: f64, unfocused_opacity: f64, opacity: f64) -> Self {
        Self {
            focused_opacity,
            unfocused_opacity,
            fade: Arc::new(Mutex::new(FadeCell {
                opacity,
                generation: 0,
            })),
            active_animation: None,
        }
    }

    #[cfg(test)]
    pub fn current_opacity(&self) -> f64 {
        self.fade.lock().opacity
    }

    pub fn target(&self, focused: bool) -> f64 {
        if focused {
            self.focused_opacity
        } else {
            self.unfocused_opacity
        }
    }

    #[cfg(test)]
    pub fn has_active_animation(&self) -> bool {
        self.active_animation
            .as_ref()
            .map_or(false, |handle| !handle.is_finished())
    }

    /// Отменяет текущую анимацию и выдаёт билет для следующей.
    /// После возврата старая анимация уже не может записать ни одного значения.
    pub fn begin_animation(&mut self) -> FadeTicket {
        let (generation, start) = {
            let mut cell = self.fade.lock();
            cell.generation += 1;
            (cell.generation, cell.opacity)
        };

        if let Some(handle) = self.active_animation.take() {
            handle.abort();
        }

        FadeTicket {
            cell: Arc::clone(&self.fade),
            generation,
            start,
        }
    }

    pub fn set_active_animation(&mut self, handle: JoinHandle<()>) {
        if let Some(previous) = self.active_animation.replace(handle) {
            previous.abort();
        }
    }

    /// Мгновенно выставляет прозрачность без анимации
    pub fn snap(&mut self, window_id: WindowId, opacity: f64, sink: &dyn OpacitySink) {
        let ticket = self.begin_animation();
        ticket.write(opacity, |value| sink.set_opacity(window_id, value));
    }

    pub fn cancel_animation(&mut self) {
        self.fade.lock().generation += 1;
        if let Some(handle) = self.active_animation.take() {
            handle.abort();
        }
    }
}

/// Хранилище состояний окон. Записи живут до завершения процесса.
pub struct WindowStateStore {
    config: Arc<Config>,
    windows: DashMap<WindowId, WindowState>,
}

impl WindowStateStore {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            windows: DashMap::new(),
        }
    }

    /// Новое окно считается не в фокусе, пока не придёт явное событие фокуса
    pub fn get_or_create(&self, window: &WindowDescriptor) -> RefMut<'_, WindowId, WindowState> {
        self.windows.entry(window.id).or_insert_with(|| {
            let (focused, unfocused) = self.resolve(window);
            WindowState::new(focused, unfocused, unfocused)
        })
    }

    /// Заводит состояние заново или пересчитывает правила для уже известного окна
    /// (тип контейнера мог смениться). Текущая анимация отменяется.
    pub fn register(&self, window: &WindowDescriptor) -> RefMut<'_, WindowId, WindowState> {
        let (focused, unfocused) = self.resolve(window);
        let mut state = self
            .windows
            .entry(window.id)
            .or_insert_with(|| WindowState::new(focused, unfocused, unfocused));

        state.cancel_animation();
        state.focused_opacity = focused;
        state.unfocused_opacity = unfocused;
        state
    }

    #[cfg(test)]
    pub fn current_opacity(&self, window_id: WindowId) -> Option<f64> {
        self.windows.get(&window_id).map(|state| state.current_opacity())
    }

    #[cfg(test)]
    pub fn targets(&self, window_id: WindowId) -> Option<(f64, f64)> {
        self.windows
            .get(&window_id)
            .map(|state| (state.focused_opacity, state.unfocused_opacity))
    }

    #[cfg(test)]
    pub fn is_animating(&self, window_id: WindowId) -> bool {
        self.windows
            .get(&window_id)
            .map_or(false, |state| state.has_active_animation())
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn cancel_all(&self) {
        for mut entry in self.windows.iter_mut() {
            entry.value_mut().cancel_animation();
        }
    }

    fn resolve(&self, window: &WindowDescriptor) -> (f64, f64) {
        self.config.resolve_opacity(&window.app_id, window.is_floating())
    }
}
