use std::time::Duration;

use anyhow::{Result, bail};
use clap::Parser;

use finger_core::constants::{DEFAULT_PORT, DEFAULT_TIMEOUT, VERBOSE_PREFIX};
use finger_core::request::FingerRequest;

/// Finger Client - одноразовый запрос к finger-серверу.
///
/// TCP-соединение живёт ровно один запрос: отправляем строку запроса,
/// читаем ответ до закрытия соединения сервером и печатаем тело в stdout.
#[derive(Parser, Debug, Clone)]
#[command(name = "finger-client", version, about)]
pub(crate) struct Args {
    /// Запрос: "", "user", "user@host", "@host" или цепочка user@h1@h2.
    /// Пустой запрос означает "все пользователи хоста"
    #[arg(default_value = "")]
    pub(crate) query: String,

    /// Хост finger-сервера; главнее хоста, зашитого в запрос
    #[arg(long)]
    pub(crate) host: Option<String>,

    /// TCP порт сервера
    #[arg(short, long, default_value_t = DEFAULT_PORT, value_parser = clap::value_parser!(u16).range(1..))]
    pub(crate) port: u16,

    /// Таймаут ожидания полного ответа, в секундах
    #[arg(short, long, default_value_t = DEFAULT_TIMEOUT.as_secs_f64())]
    pub(crate) timeout: f64,

    /// Verbose-запрос: добавляет префикс /W (whois-формат ответа)
    #[arg(short = 'W', long)]
    pub(crate) whois: bool,
}

impl Args {
    /// Валидация аргументов, которые clap сам не проверит.
    pub(crate) fn validate(&self) -> Result<()> {
        if !self.timeout.is_finite() || self.timeout <= 0.0 {
            bail!("--timeout must be positive seconds (got: {})", self.timeout);
        }

        if let Some(host) = &self.host {
            if host.trim().is_empty() {
                bail!("--host is empty");
            }
        }

        Ok(())
    }

    /// Итоговая строка запроса: `-W` добавляет `/W`, если его там ещё нет.
    pub(crate) fn effective_query(&self) -> String {
        if !self.whois {
            return self.query.clone();
        }

        // если /W уже стоит в самом запросе, второй раз не добавляем
        if let Ok(req) = FingerRequest::parse(&self.query) {
            if req.verbose() {
                return self.query.clone();
            }
        }

        let trimmed = self.query.trim();
        if trimmed.is_empty() {
            VERBOSE_PREFIX.to_string()
        } else {
            format!("{VERBOSE_PREFIX} {trimmed}")
        }
    }

    pub(crate) fn timeout_duration(&self) -> Duration {
        Duration::from_secs_f64(self.timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mk_args(query: &str, whois: bool) -> Args {
        Args {
            query: query.to_string(),
            host: None,
            port: DEFAULT_PORT,
            timeout: 30.0,
            whois,
        }
    }

    #[test]
    fn parse_defaults() {
        let args = Args::try_parse_from(["finger-client"]).unwrap();

        assert_eq!(args.query, "");
        assert_eq!(args.host, None);
        assert_eq!(args.port, 79);
        assert_eq!(args.timeout, 30.0);
        assert!(!args.whois);
    }

    #[test]
    fn parse_full_invocation() {
        let args = Args::try_parse_from([
            "finger-client",
            "--host",
            "example.com",
            "-p",
            "8079",
            "-t",
            "10.5",
            "-W",
            "alice",
        ])
        .unwrap();

        assert_eq!(args.query, "alice");
        assert_eq!(args.host.as_deref(), Some("example.com"));
        assert_eq!(args.port, 8079);
        assert_eq!(args.timeout, 10.5);
        assert!(args.whois);
    }

    #[test]
    fn parse_rejects_port_zero() {
        assert!(Args::try_parse_from(["finger-client", "-p", "0"]).is_err());
    }

    #[test]
    fn effective_query_without_flag_is_untouched() {
        assert_eq!(mk_args("alice", false).effective_query(), "alice");
    }

    #[test]
    fn effective_query_adds_verbose_prefix() {
        assert_eq!(mk_args("alice", true).effective_query(), "/W alice");
        assert_eq!(mk_args("alice@host", true).effective_query(), "/W alice@host");
    }

    #[test]
    fn effective_query_does_not_double_prefix() {
        assert_eq!(mk_args("/W alice", true).effective_query(), "/W alice");
    }

    #[test]
    fn effective_query_empty_becomes_bare_marker() {
        assert_eq!(mk_args("", true).effective_query(), "/W");
    }

    #[test]
    fn validate_rejects_bad_timeout() {
        assert!(mk_args("", false).validate().is_ok());

        let mut args = mk_args("", false);
        args.timeout = 0.0;
        assert!(args.validate().is_err());

        args.timeout = -1.0;
        assert!(args.validate().is_err());

        args.timeout = f64::NAN;
        assert!(args.validate().is_err());
    }

    #[test]
    fn validate_rejects_blank_host() {
        let mut args = mk_args("alice", false);
        args.host = Some("   ".to_string());
        assert!(args.validate().is_err());
    }
}
