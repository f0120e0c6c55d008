use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
mod config;
mod error;
mod events;
mod ipc;
mod services;
mod utils;

use config::Config;
use ipc::{IpcConnector, SwayConnector};
use services::{create_event_listener, create_opacity_sink, FadeScheduler};

#[derive(Parser, Debug)]
#[command(name = "swayfade")]
#[command(about = "Плавное изменение прозрачности окон sway/i3 при смене фокуса")]
struct Args {
    /// Путь к файлу конфигурации (по умолчанию $XDG_CONFIG_HOME/swayfade.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Режим сухого запуска (команды только логируются, фокус эмулируется)
    #[arg(long)]
    dry_run: bool,

    /// Уровень логирования
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Инициализация системы логирования
    init_tracing(&args.log_level)?;

    info!("Запуск swayfade v{}", env!("CARGO_PKG_VERSION"));

    // Загрузка конфигурации: ошибка здесь фатальна до старта цикла событий
    let config_path = args.config.clone().unwrap_or_else(Config::default_path);
    let config = Arc::new(Config::load(&config_path)?);
    info!("Конфигурация загружена из: {:?}", config_path);

    // сокет берётся из $SWAYSOCK / $I3SOCK при каждом подключении
    let connector: Option<Arc<dyn IpcConnector>> = if args.dry_run {
        warn!("Режим сухого запуска - команды оконному менеджеру не отправляются");
        None
    } else {
        Some(Arc::new(SwayConnector))
    };

    // Инициализация компонентов
    let (sink, command_writer) = create_opacity_sink(connector.clone());
    let scheduler = Arc::new(FadeScheduler::new(config.clone(), sink));
    let event_listener = create_event_listener(scheduler.clone(), connector);

    info!("Все компоненты инициализированы");

    let mut listener_handle = tokio::spawn(async move { event_listener.run().await });
    let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())?;

    info!("Все сервисы запущены");

    // Ожидание сигнала завершения либо фатальной ошибки подключения
    tokio::select! {
        result = signal::ctrl_c() => match result {
            Ok(()) => info!("Получен сигнал завершения (Ctrl+C)"),
            Err(err) => error!("Ошибка при ожидании сигнала завершения: {}", err),
        },
        _ = terminate.recv() => info!("Получен сигнал завершения (SIGTERM)"),
        result = &mut listener_handle => match result {
            Ok(Ok(())) => info!("EventListener завершил работу"),
            Ok(Err(e)) => {
                error!("Ошибка в EventListener: {}", e);
                scheduler.stop_all_fades();
                return Err(e.into());
            }
            Err(e) => error!("Задача EventListener аварийно завершилась: {}", e),
        },
    }

    info!("Завершение работы... (отслеживалось окон: {})", scheduler.tracked_windows());

    scheduler.stop_all_fades();
    listener_handle.abort();

    if let Some(writer) = command_writer {
        // после остановки анимаций новых команд нет; даём дописать очередь
        drop(scheduler);
        let shutdown_timeout = tokio::time::Duration::from_secs(2);
        if tokio::time::timeout(shutdown_timeout, writer).await.is_err() {
            warn!("Таймаут при отправке оставшихся команд");
        }
    }

    info!("swayfade завершил работу");
    Ok(())
}

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().compact())
        .init();

    Ok(())
}
