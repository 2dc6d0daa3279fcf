//! # finger-core
//!
//! Базовые типы и протокол для Finger Client.
//!
//! Этот крейт содержит:
//!
//! - [`request`] — парсинг строки запроса и сериализация в wire-форму
//! - [`response`] — ответ сервера плюс разбор тела на строки
//! - [`constants`] — константы протокола (порт, терминатор, лимиты)
//! - [`error`] — типы ошибок, которые возвращают компоненты `finger-core`
//!
//! ## Быстрый пример: разбор запроса
//!
//! ```rust
//! use finger_core::request::FingerRequest;
//!
//! let req = FingerRequest::parse("/W alice@host1@host2").unwrap();
//! assert!(req.verbose());
//! assert_eq!(req.username(), Some("alice"));
//! // подключаемся к первому хосту цепочки, остальное пересылает он
//! assert_eq!(req.target_host(), Some("host1"));
//! assert_eq!(req.wire_query(), "/W alice@host1@host2");
//! ```
//!
//! ## Пример: тело ответа по строкам
//!
//! ```rust
//! use finger_core::response::FingerResponse;
//!
//! let resp = FingerResponse::new(
//!     "Login: alice\r\nName: Alice Smith\r\n".to_string(),
//!     "example.com".to_string(),
//!     79,
//!     "alice".to_string(),
//! );
//! assert_eq!(resp.lines(), ["Login: alice", "Name: Alice Smith"]);
//! ```
//!
//! ## Дизайн
//!
//! `finger-core` задуман как "нулевая" зависимость для всех частей системы:
//! клиент, утилиты, тесты. Поэтому здесь держим только чистые типы и
//! парсинг/сериализацию, без I/O, без runtime/async и без тяжёлых
//! зависимостей.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Текстовая грамматика запроса (`user@host`, `/W`, цепочки хостов).
pub mod request;

/// Ответ сервера.
pub mod response;

/// Общие константы протокола.
pub mod constants;

/// Ошибки `finger-core`.
pub mod error;

// --- Re-exports (публичный фасад API) ---

pub use crate::constants::{CRLF, DEFAULT_PORT, DEFAULT_TIMEOUT, MAX_RESPONSE_SIZE, VERBOSE_PREFIX};
pub use crate::error::QueryError;
pub use crate::request::{FingerRequest, QueryKind};
pub use crate::response::FingerResponse;
