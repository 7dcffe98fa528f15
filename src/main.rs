use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

mod config;
mod error;
mod events;
mod services;
mod utils;

use config::Config;
use services::{create_window_system, HintsService, PlacementRegistry};

#[derive(Parser, Debug)]
#[command(name = "hints-bridge")]
#[command(about = "D-Bus сервис информации о сфокусированном окне и позиционирования новых окон")]
struct Args {
    /// Путь к файлу конфигурации
    #[arg(short, long, default_value = "hints.toml")]
    config: String,

    /// Режим сухого запуска (без реальных действий)
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

    info!("Запуск hints-bridge v{}", env!("CARGO_PKG_VERSION"));

    // Загрузка конфигурации
    let config = Arc::new(Config::load(&args.config)?);
    info!("Конфигурация загружена из: {}", args.config);

    if args.dry_run {
        warn!("Режим сухого запуска - реальные действия отключены");
    }

    // Проверка окружения сессии
    utils::environment::check_environment(args.dry_run);

    // Инициализация компонентов
    let window_system = create_window_system(config.clone(), args.dry_run)?;
    let registry = Arc::new(PlacementRegistry::new());
    info!("Оконная система: {}", window_system.name());

    let service = HintsService::new(window_system.clone(), registry.clone());

    // Владение именем и экспорт объекта на сессионной шине
    let connection = zbus::connection::Builder::session()?
        .name(config.bus.service_name.as_str())?
        .serve_at(config.bus.object_path.as_str(), service)?
        .build()
        .await?;

    info!(
        "Имя {} получено, объект экспортирован в {}",
        config.bus.service_name, config.bus.object_path
    );

    // Поток событий оконной системы кормит реестр правил
    let watcher_handle = {
        let window_system = window_system.clone();
        let registry = registry.clone();
        tokio::spawn(async move {
            if let Err(e) = window_system.watch(registry).await {
                error!("Ошибка в наблюдателе событий окон: {}", e);
            }
        })
    };

    info!("Сервис запущен");

    // Ожидание сигнала завершения
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Получен сигнал завершения (Ctrl+C)");
        }
        Err(err) => {
            error!("Ошибка при ожидании сигнала завершения: {}", err);
        }
    }

    info!("Завершение работы...");

    // Подписки снимаются до разрушения источника событий
    registry.drain();

    watcher_handle.abort();

    // Ожидаем завершения наблюдателя (с таймаутом)
    let shutdown_timeout = tokio::time::Duration::from_secs(5);
    let shutdown_result = tokio::time::timeout(shutdown_timeout, async {
        let _ = watcher_handle.await;
    })
    .await;

    match shutdown_result {
        Ok(_) => info!("Наблюдатель событий завершил работу корректно"),
        Err(_) => warn!("Таймаут при завершении наблюдателя событий"),
    }

    // Отпускаем имя и объект на шине
    connection.graceful_shutdown().await;

    info!("hints-bridge завершил работу");
    Ok(())
}

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().compact())
        .init();

    Ok(())
}
