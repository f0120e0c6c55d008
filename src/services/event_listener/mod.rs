//! EventListener: ответственность и границы
//!
//! Этот модуль отвечает ТОЛЬКО за получение событий окон (подписка, начальный
//! снимок дерева, переподключение) и их доставку в FadeScheduler.
//! Никакой логики анимации и выбора прозрачности здесь нет: все решения
//! принимает FadeScheduler.

mod dry_run_listener;
mod ipc_listener;
mod r#trait;

pub use self::r#trait::{create_event_listener, EventListenerTrait};
