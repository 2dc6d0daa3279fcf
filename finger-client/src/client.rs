use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use log::{debug, info};
use thiserror::Error;

use finger_core::constants::{DEFAULT_PORT, DEFAULT_TIMEOUT, MAX_RESPONSE_SIZE};
use finger_core::{FingerRequest, FingerResponse, QueryError};

use crate::session::{self, AbortHandle, SessionError};

/// Конфигурация фасада. После создания только читается,
/// последовательные и параллельные запросы делят её как есть.
#[derive(Debug, Clone)]
pub(crate) struct ClientConfig {
    /// Сколько ждём полный ответ (connect + запрос + приём)
    pub(crate) timeout: Duration,
    /// Порт по умолчанию, если вызывающий не передал свой
    pub(crate) default_port: u16,
    /// Лимит размера ответа, дальше сессия обрывает соединение
    pub(crate) max_response_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            default_port: DEFAULT_PORT,
            max_response_size: MAX_RESPONSE_SIZE,
        }
    }
}

/// Ошибки фасада
#[derive(Debug, Error)]
pub(crate) enum ClientError {
    /// Запрос не разбирается по грамматике
    #[error("invalid query: {0}")]
    InvalidQuery(#[from] QueryError),

    /// Некуда подключаться: хоста нет ни в запросе, ни в параметрах
    #[error("no host specified: pass an explicit host or use user@host form")]
    MissingHost,

    /// Ошибка сессии (соединение, лимит размера, декодирование)
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Ответ не пришёл за отведённое время
    #[error("no response within {timeout:?}")]
    Timeout {
        /// окно ожидания, которое истекло
        timeout: Duration,
    },

    /// Фасад уже закрыт
    #[error("client is closed")]
    Closed,
}

/// Фасад клиента: одна точка входа для "запрос строкой -> ответ".
///
/// Каждый запрос — отдельное соединение и отдельная сессия; никакого
/// пула и никакого общего сокета. Фасад владеет только таймаутом и
/// реестром незавершённых сессий, чтобы [`FingerClient::close`] мог
/// оборвать их транспорты.
pub(crate) struct FingerClient {
    config: ClientConfig,
    closed: AtomicBool,
    in_flight: Mutex<HashMap<u64, AbortHandle>>,
    next_id: AtomicU64,
}

impl FingerClient {
    pub(crate) fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    pub(crate) fn with_config(config: ClientConfig) -> Self {
        Self {
            config,
            closed: AtomicBool::new(false),
            in_flight: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Полный цикл: разбор строки запроса -> выбор цели -> сессия -> ответ.
    ///
    /// Явный `host` главнее хоста, зашитого в запрос. Порт и таймаут
    /// по умолчанию берутся из конфигурации фасада.
    pub(crate) fn query(
        &self,
        input: &str,
        host: Option<&str>,
        port: Option<u16>,
        timeout: Option<Duration>,
    ) -> Result<FingerResponse, ClientError> {
        if self.closed.load(Ordering::Relaxed) {
            return Err(ClientError::Closed);
        }

        // ошибки грамматики — до любой попытки подключения
        let request = FingerRequest::parse(input)?;

        let target = host
            .map(str::to_string)
            .or_else(|| request.target_host().map(str::to_string))
            .ok_or(ClientError::MissingHost)?;

        let port = port.unwrap_or(self.config.default_port);
        let timeout = timeout.unwrap_or(self.config.timeout);

        self.finger(request, &target, port, timeout)
    }

    /// Один finger-обмен с уже разобранным запросом.
    pub(crate) fn finger(
        &self,
        request: FingerRequest,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<FingerResponse, ClientError> {
        if self.closed.load(Ordering::Relaxed) {
            return Err(ClientError::Closed);
        }

        debug!(
            "finger {host}:{port}: query={:?}, timeout={timeout:?}",
            request.wire_query()
        );

        let handle = session::start(
            request,
            host.to_string(),
            port,
            self.config.max_response_size,
            timeout,
        );

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock_in_flight().insert(id, handle.abort_handle());

        // close() мог проскочить между стартом сессии и регистрацией
        if self.closed.load(Ordering::Relaxed) {
            handle.abort_handle().abort();
        }

        let outcome = handle.wait(timeout);
        self.lock_in_flight().remove(&id);

        match outcome {
            Some(Ok(response)) => Ok(response),
            Some(Err(e)) => Err(ClientError::from(e)),
            None => Err(ClientError::Timeout { timeout }),
        }
    }

    /// Закрывает фасад: дальнейшие запросы невозможны, транспорты всех
    /// незавершённых сессий обрываются. Идемпотентно; вызывается и из Drop,
    /// так что срабатывает на любом пути выхода.
    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::Relaxed);

        let handles: Vec<AbortHandle> = {
            let mut in_flight = self.lock_in_flight();
            in_flight.drain().map(|(_, handle)| handle).collect()
        };

        for handle in &handles {
            handle.abort();
        }

        if !handles.is_empty() {
            info!("client closed with {} session(s) in flight", handles.len());
        }
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, HashMap<u64, AbortHandle>> {
        match self.in_flight.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(), // продолжаем, несмотря на poison
        }
    }
}

impl Drop for FingerClient {
    fn drop(&mut self) {
        self.close();
    }
}
