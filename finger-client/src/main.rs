//! Точка входа `finger-client`.
//!
//! Жизненный цикл:
//! - парсинг CLI и сборка итоговой строки запроса (-W добавляет /W)
//! - один запрос через фасад: новое TCP-соединение, ответ до закрытия
//! - тело ответа в stdout как есть
//! - код возврата: 0 при успехе, 1 при любой ошибке

mod cli;
mod client;
mod session;

use clap::Parser;
use log::info;

fn main() -> anyhow::Result<()> {
    // Логи через RUST_LOG=info/debug
    env_logger::init();

    let args = cli::Args::parse();
    args.validate()?;

    let query = args.effective_query();

    info!(
        "Starting finger-client: query={:?}, host={:?}, port={}, timeout={}s",
        query, args.host, args.port, args.timeout
    );

    let client = client::FingerClient::new();

    let response = client.query(
        &query,
        args.host.as_deref(),
        Some(args.port),
        Some(args.timeout_duration()),
    )?;

    info!(
        "response from {}:{} ({} bytes)",
        response.host(),
        response.port(),
        response.body().len()
    );

    print!("{response}");

    client.close();
    Ok(())
}
