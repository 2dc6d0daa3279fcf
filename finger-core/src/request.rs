use crate::constants::{CRLF, VERBOSE_PREFIX};
use crate::error::QueryError;

/// Форма запроса (определяется из разобранной строки).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// Пустой запрос: список всех пользователей хоста
    ListUsers,
    /// Пользователь без хоста
    UserLocal,
    /// user@host, включая цепочки user@h1@h2
    UserRemote,
    /// @host без пользователя
    HostOnly,
}

/// Разобранный finger-запрос.
///
/// Значение неизменяемое: создаётся через [`FingerRequest::parse`] или
/// [`FingerRequest::raw`] и дальше только читается.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerRequest {
    username: Option<String>,
    hosts: Vec<String>,
    verbose: bool,
    raw_query: Option<String>,
}

impl FingerRequest {
    /// Парсит строку запроса вида:
    /// `""`, `"alice"`, `"alice@host"`, `"@host"`, `"/W alice@h1@h2"`.
    ///
    /// Правила:
    /// - строка обрезается по краям;
    /// - ведущий `/W` + пробел (или конец строки) => verbose, префикс убираем;
    /// - остаток делится по первому `@`: слева username, справа цепочка хостов;
    /// - пустой остаток валиден и означает "все пользователи";
    /// - управляющие символы запрещены, пустые хосты в цепочке запрещены.
    pub fn parse(input: &str) -> Result<Self, QueryError> {
        validate_text(input)?;
        let input = input.trim();

        let (verbose, rest) = match strip_verbose(input) {
            Some(rest) => (true, rest),
            None => (false, input),
        };

        let (user_part, host_part) = match rest.split_once('@') {
            Some((user, chain)) => (user, Some(chain)),
            None => (rest, None),
        };

        let username = if user_part.is_empty() {
            None
        } else {
            Some(user_part.to_string())
        };

        let hosts = match host_part {
            Some(chain) => {
                let hosts: Vec<String> = chain.split('@').map(str::to_string).collect();
                if hosts.iter().any(|h| h.is_empty()) {
                    return Err(QueryError::EmptyHost);
                }
                hosts
            }
            None => Vec::new(),
        };

        Ok(Self {
            username,
            hosts,
            verbose,
            raw_query: None,
        })
    }

    /// Запрос "как есть": текст уходит на сервер без структурного разбора.
    /// Допускается хвостовой CRLF (он и так будет добавлен при отправке).
    pub fn raw(query: &str) -> Result<Self, QueryError> {
        let body = query.strip_suffix(CRLF).unwrap_or(query);
        validate_text(body)?;

        Ok(Self {
            username: None,
            hosts: Vec::new(),
            verbose: false,
            raw_query: Some(body.to_string()),
        })
    }

    /// Имя пользователя; `None` = "все пользователи".
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Цепочка хостов слева направо.
    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    /// Запрошен verbose-ответ (`/W`).
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Сырая строка запроса, если запрос создан через [`FingerRequest::raw`].
    pub fn raw_query(&self) -> Option<&str> {
        self.raw_query.as_deref()
    }

    /// Форма структурного запроса. Для raw-запросов строка не анализируется,
    /// поэтому они классифицируются как [`QueryKind::ListUsers`].
    pub fn kind(&self) -> QueryKind {
        match (&self.username, self.hosts.is_empty()) {
            (None, true) => QueryKind::ListUsers,
            (Some(_), true) => QueryKind::UserLocal,
            (Some(_), false) => QueryKind::UserRemote,
            (None, false) => QueryKind::HostOnly,
        }
    }

    /// Хост, к которому подключаемся: первый в цепочке.
    /// Остальные хосты пересылает уже он сам, не клиент.
    pub fn target_host(&self) -> Option<&str> {
        self.hosts.first().map(String::as_str)
    }

    /// Строка запроса в wire-форме, без терминатора.
    ///
    /// Одиночный хост пользовательского запроса — это цель подключения,
    /// обратно в запрос он не попадает: `alice@host` уходит как `alice`.
    /// Цепочка из двух и более хостов уходит целиком (`alice@h1@h2`),
    /// пересылку делает первый хост. Запросы без пользователя (`@host`)
    /// всегда несут цепочку целиком.
    pub fn wire_query(&self) -> String {
        if let Some(raw) = &self.raw_query {
            return raw.clone();
        }

        let mut body = String::new();
        if let Some(user) = &self.username {
            body.push_str(user);
        }

        let embed_hosts = match (&self.username, self.hosts.len()) {
            (_, 0) => false,
            (Some(_), 1) => false,
            _ => true,
        };
        if embed_hosts {
            for host in &self.hosts {
                body.push('@');
                body.push_str(host);
            }
        }

        let mut out = String::new();
        if self.verbose {
            out.push_str(VERBOSE_PREFIX);
            if !body.is_empty() {
                out.push(' ');
            }
        }
        out.push_str(&body);
        out
    }

    /// Байты запроса для отправки: wire-форма + CRLF.
    pub fn to_wire(&self) -> Vec<u8> {
        let mut line = self.wire_query();
        line.push_str(CRLF);
        line.into_bytes()
    }
}

/// `/W` считается маркером только если за ним пробел или конец строки:
/// `/Walice` — это имя пользователя, а не verbose-запрос.
fn strip_verbose(s: &str) -> Option<&str> {
    let rest = s.strip_prefix(VERBOSE_PREFIX)?;
    if rest.is_empty() {
        return Some(rest);
    }
    if rest.starts_with([' ', '\t']) {
        return Some(rest.trim_start());
    }
    None
}

fn validate_text(s: &str) -> Result<(), QueryError> {
    match s.chars().find(|c| c.is_control()) {
        Some(c) => Err(QueryError::ControlCharacter(c)),
        None => Ok(()),
    }
}
