use std::time::Duration;

/// Стандартный TCP-порт finger-сервера.
pub const DEFAULT_PORT: u16 = 79;

/// Сколько ждём полный ответ сервера по умолчанию.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Максимальный размер ответа. Протокол не ограничивает сервер ничем,
/// поэтому ограничиваем сами: больше — обрываем соединение.
pub const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024;

/// Терминатор строки запроса (протокол требует ровно CR LF).
pub const CRLF: &str = "\r\n";

/// Маркер verbose-запроса (whois-формат ответа).
pub const VERBOSE_PREFIX: &str = "/W";
