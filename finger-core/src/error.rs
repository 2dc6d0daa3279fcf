use thiserror::Error;

/// Ошибки разбора finger-запроса
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// Управляющий символ внутри запроса
    #[error("control character in query: {0:?}")]
    ControlCharacter(char),

    /// Пустое имя хоста в цепочке пересылки
    #[error("empty host name in query")]
    EmptyHost,
}
