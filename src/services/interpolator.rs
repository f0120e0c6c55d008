use crate::events::WindowId;
use crate::services::window_state::FadeTicket;
use crate::services::OpacitySink;
use crate::trace_if_enabled;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

/// Число шагов анимации для доли `step_fraction`: `ceil(1 / step_fraction)`
pub fn step_count(step_fraction: f64) -> usize {
    if !(step_fraction > 0.0) {
        return 1;
    }
    // допуск на погрешность деления, чтобы 1 / (1 / 14) давало ровно 14 шагов
    ((1.0 / step_fraction) - 1e-9).ceil().max(1.0) as usize
}

/// Значения прозрачности, которые анимация отправит от `start` к `end`.
///
/// Линейная интерполяция с шагом `step_fraction` от всего пути; последнее значение
/// всегда ровно `end`, независимо от накопленной погрешности. Значения считаются
/// по мере запроса.
pub fn fade_steps(start: f64, end: f64, step_fraction: f64) -> impl Iterator<Item = f64> {
    let steps = if start == end { 1 } else { step_count(step_fraction) };

    (1..=steps).map(move |k| {
        if k == steps {
            end
        } else {
            start + (k as f64 * step_fraction) * (end - start)
        }
    })
}

/// Запускает анимации прозрачности с фиксированным шагом и паузой между шагами
pub struct Interpolator {
    sink: Arc<dyn OpacitySink>,
    step_fraction: f64,
    step_interval: Duration,
}

impl Interpolator {
    pub fn new(sink: Arc<dyn OpacitySink>, step_fraction: f64, step_interval: Duration) -> Self {
        Self {
            sink,
            step_fraction,
            step_interval,
        }
    }

    pub fn sink(&self) -> &dyn OpacitySink {
        self.sink.as_ref()
    }

    pub fn spawn(&self, window_id: WindowId, ticket: FadeTicket, target: f64) -> JoinHandle<()> {
        let sink = Arc::clone(&self.sink);
        let step_fraction = self.step_fraction;
        let step_interval = self.step_interval;

        tokio::spawn(async move {
            Self::run(window_id, ticket, target, sink, step_fraction, step_interval).await;
        })
    }

    /// Работает до достижения цели или до отмены. Отменённая анимация
    /// ничего не пишет и оставляет последнее записанное значение.
    async fn run(
        window_id: WindowId,
        ticket: FadeTicket,
        target: f64,
        sink: Arc<dyn OpacitySink>,
        step_fraction: f64,
        step_interval: Duration,
    ) {
        let start = ticket.start_opacity();
        trace_if_enabled!("Анимация #{}: {} -> {}", window_id, start, target);

        let mut values = fade_steps(start, target, step_fraction).enumerate().peekable();
        while let Some((i, value)) = values.next() {
            if !ticket.write(value, |opacity| sink.set_opacity(window_id, opacity)) {
                trace_if_enabled!("Анимация #{} отменена на шаге {}", window_id, i);
                return;
            }

            if values.peek().is_some() {
                sleep(step_interval).await;
            }
        }

        trace_if_enabled!("Анимация #{} завершена на {}", window_id, target);
    }
}
