use super::{CommandChannel, CommandOutcome, IpcConnector, WindowEventSource};
use crate::error::Result;
use crate::events::{WindowDescriptor, WindowEvent};
use crate::fade_error;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Оконный менеджер по сценарию.
///
/// Каждая сессия - дерево для GET_TREE и события для подписки. Поток событий
/// сессии закрывается после последнего события, кроме последней сессии,
/// которая остаётся открытой. Когда сессии кончились, подключения отклоняются.
#[derive(Default)]
pub struct ScriptedConnector {
    subscriptions: Mutex<VecDeque<Vec<WindowEvent>>>,
    trees: Mutex<VecDeque<Vec<WindowDescriptor>>>,
    subscribe_calls: AtomicUsize,
    tree_calls: AtomicUsize,
    commands: Arc<Mutex<Vec<(usize, String)>>>,
    broken_commands: Arc<Mutex<HashSet<String>>>,
    refused_channels: AtomicUsize,
    channels_opened: AtomicUsize,
}

impl ScriptedConnector {
    pub fn with_session(self, tree: Vec<WindowDescriptor>, events: Vec<WindowEvent>) -> Self {
        self.trees.lock().push_back(tree);
        self.subscriptions.lock().push_back(events);
        self
    }

    /// Соединение рвётся на этой команде
    pub fn breaking_on(self, command: &str) -> Self {
        self.broken_commands.lock().insert(command.to_string());
        self
    }

    /// Первые `count` попыток открыть соединение для команд отклоняются
    pub fn refusing_channels(self, count: usize) -> Self {
        self.refused_channels.store(count, Ordering::SeqCst);
        self
    }

    pub fn subscribe_calls(&self) -> usize {
        self.subscribe_calls.load(Ordering::SeqCst)
    }

    pub fn tree_calls(&self) -> usize {
        self.tree_calls.load(Ordering::SeqCst)
    }

    /// Команды с номером соединения, через которое они были отправлены
    pub fn commands(&self) -> Vec<(usize, String)> {
        self.commands.lock().clone()
    }

    pub fn channels_opened(&self) -> usize {
        self.channels_opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IpcConnector for ScriptedConnector {
    async fn subscribe_windows(&self) -> Result<Box<dyn WindowEventSource>> {
        self.subscribe_calls.fetch_add(1, Ordering::SeqCst);
        let mut subscriptions = self.subscriptions.lock();
        let events = subscriptions
            .pop_front()
            .ok_or_else(|| fade_error!(service_unavailable, "сокет закрыт"))?;

        Ok(Box::new(ScriptedEvents {
            events: events.into(),
            hold_open: subscriptions.is_empty(),
        }))
    }

    async fn get_tree(&self) -> Result<Vec<WindowDescriptor>> {
        self.tree_calls.fetch_add(1, Ordering::SeqCst);
        self.trees
            .lock()
            .pop_front()
            .ok_or_else(|| fade_error!(service_unavailable, "сокет закрыт"))
    }

    async fn command_channel(&self) -> Result<Box<dyn CommandChannel>> {
        let refused = self
            .refused_channels
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if refused {
            return Err(fade_error!(service_unavailable, "подключение отклонено"));
        }

        let connection = self.channels_opened.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Box::new(ScriptedChannel {
            connection,
            commands: self.commands.clone(),
            broken_commands: self.broken_commands.clone(),
            broken: false,
        }))
    }
}

struct ScriptedEvents {
    events: VecDeque<WindowEvent>,
    hold_open: bool,
}

#[async_trait]
impl WindowEventSource for ScriptedEvents {
    async fn next_event(&mut self) -> Result<Option<WindowEvent>> {
        match self.events.pop_front() {
            Some(event) => Ok(Some(event)),
            None if self.hold_open => std::future::pending().await,
            None => Ok(None),
        }
    }
}

struct ScriptedChannel {
    connection: usize,
    commands: Arc<Mutex<Vec<(usize, String)>>>,
    broken_commands: Arc<Mutex<HashSet<String>>>,
    broken: bool,
}

#[async_trait]
impl CommandChannel for ScriptedChannel {
    async fn run_command(&mut self, command: &str) -> Result<Vec<CommandOutcome>> {
        if self.broken {
            return Err(fade_error!(service_unavailable, "соединение закрыто"));
        }

        self.commands.lock().push((self.connection, command.to_string()));
        if self.broken_commands.lock().contains(command) {
            self.broken = true;
            return Err(fade_error!(service_unavailable, "соединение закрыто посреди ответа"));
        }

        Ok(vec![CommandOutcome::ok()])
    }
}
