use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use log::{debug, warn};
use thiserror::Error;

use finger_core::{FingerRequest, FingerResponse};

const READ_CHUNK: usize = 2048;

/// Ошибки одной finger-сессии
#[derive(Debug, Error)]
pub(crate) enum SessionError {
    /// Соединение не установилось или оборвалось посреди приёма
    #[error("connection failed: {0}")]
    Connection(#[from] std::io::Error),

    /// Сервер прислал больше разрешённого лимита
    #[error("response exceeds maximum size of {limit} bytes")]
    ResponseTooLarge {
        /// лимит, который был превышен
        limit: usize,
    },

    /// Тело ответа не декодируется как текст
    #[error("response is not valid text: {0}")]
    Protocol(#[from] std::string::FromUtf8Error),
}

pub(crate) type SessionResult = Result<FingerResponse, SessionError>;

/// Состояния жизненного цикла сессии. Терминальные — Closed*,
/// из них переходов нет: сессия одноразовая.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Idle,
    Connecting,
    AwaitingResponse,
    ClosedSuccess,
    ClosedFailure,
}

fn transition(state: &mut SessionState, next: SessionState, host: &str, port: u16) {
    debug!("session {host}:{port}: {:?} -> {next:?}", *state);
    *state = next;
}

#[derive(Debug, Default)]
struct AbortState {
    stream: Option<TcpStream>,
    aborted: bool,
}

/// Ручка принудительного закрытия транспорта сессии.
///
/// Сессия "заряжает" ручку клоном своего сокета сразу после connect;
/// [`AbortHandle::abort`] закрывает сокет в обе стороны, и заблокированный
/// read в потоке сессии тут же возвращается. abort до заряда не теряется:
/// флаг остаётся, и свежий транспорт будет закрыт прямо при заряде.
#[derive(Debug, Clone)]
pub(crate) struct AbortHandle {
    state: Arc<Mutex<AbortState>>,
}

impl AbortHandle {
    fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(AbortState::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, AbortState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(), // продолжаем, несмотря на poison
        }
    }

    fn arm(&self, stream: TcpStream) {
        let mut st = self.lock();
        if st.aborted {
            let _ = stream.shutdown(Shutdown::Both);
        }
        st.stream = Some(stream);
    }

    pub(crate) fn abort(&self) {
        let mut st = self.lock();
        st.aborted = true;
        if let Some(stream) = &st.stream {
            let _ = stream.shutdown(Shutdown::Both);
        }
    }
}

/// Запущенная сессия: слот результата + ручка обрыва + поток.
pub(crate) struct SessionHandle {
    rx: Receiver<SessionResult>,
    abort: AbortHandle,
    thread: thread::JoinHandle<()>,
}

impl SessionHandle {
    pub(crate) fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Ждёт терминальный результат сессии, но не дольше `timeout`.
    ///
    /// `None` = таймаут: транспорт принудительно закрыт, поток сессии
    /// отцеплен, его поздний результат (если будет) никому не достанется.
    pub(crate) fn wait(self, timeout: Duration) -> Option<SessionResult> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => {
                let _ = self.thread.join();
                Some(result)
            }
            Err(RecvTimeoutError::Timeout) => {
                self.abort.abort();
                None
            }
            Err(RecvTimeoutError::Disconnected) => {
                // поток сессии умер, не доставив результат — нарушение
                // конечного автомата, такого быть не должно
                unreachable!("session thread exited without delivering a result")
            }
        }
    }
}

/// Запускает одну сессию: поток выполняет полный цикл
/// connect -> write -> accumulate -> close и доставляет ровно один результат.
pub(crate) fn start(
    request: FingerRequest,
    host: String,
    port: u16,
    max_response_size: usize,
    connect_timeout: Duration,
) -> SessionHandle {
    let (tx, rx) = crossbeam_channel::bounded(1);
    let abort = AbortHandle::new();

    let thread = thread::spawn({
        let abort = abort.clone();
        move || {
            let result = run(&request, &host, port, max_response_size, connect_timeout, &abort);
            deliver(&tx, result);
        }
    });

    SessionHandle { rx, abort, thread }
}

fn run(
    request: &FingerRequest,
    host: &str,
    port: u16,
    max_response_size: usize,
    connect_timeout: Duration,
    abort: &AbortHandle,
) -> SessionResult {
    let mut state = SessionState::Idle;

    transition(&mut state, SessionState::Connecting, host, port);
    let mut stream = match connect(host, port, connect_timeout) {
        Ok(stream) => stream,
        Err(e) => {
            transition(&mut state, SessionState::ClosedFailure, host, port);
            return Err(SessionError::Connection(e));
        }
    };

    stream.set_nodelay(true).ok();

    match stream.try_clone() {
        Ok(clone) => abort.arm(clone),
        Err(e) => warn!("session {host}:{port}: try_clone failed, abort unavailable: {e}"),
    }

    // протокол: клиент говорит первым, читать начинаем после полной записи
    if let Err(e) = stream.write_all(&request.to_wire()).and_then(|()| stream.flush()) {
        transition(&mut state, SessionState::ClosedFailure, host, port);
        return Err(SessionError::Connection(e));
    }

    transition(&mut state, SessionState::AwaitingResponse, host, port);

    let mut buffer = Vec::new();
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        match stream.read(&mut chunk) {
            // штатное закрытие со стороны сервера: ответ собран целиком
            Ok(0) => break,
            Ok(n) => {
                buffer.extend_from_slice(&chunk[..n]);
                if buffer.len() > max_response_size {
                    let _ = stream.shutdown(Shutdown::Both);
                    transition(&mut state, SessionState::ClosedFailure, host, port);
                    return Err(SessionError::ResponseTooLarge {
                        limit: max_response_size,
                    });
                }
            }
            Err(e) => {
                // обрыв: частичный буфер отбрасываем — без длины в протоколе
                // обрезанный ответ неотличим от короткого полного
                transition(&mut state, SessionState::ClosedFailure, host, port);
                return Err(SessionError::Connection(e));
            }
        }
    }

    let body = match String::from_utf8(buffer) {
        Ok(body) => body,
        Err(e) => {
            transition(&mut state, SessionState::ClosedFailure, host, port);
            return Err(SessionError::Protocol(e));
        }
    };

    transition(&mut state, SessionState::ClosedSuccess, host, port);
    Ok(FingerResponse::new(
        body,
        host.to_string(),
        port,
        request.wire_query(),
    ))
}

fn connect(host: &str, port: u16, timeout: Duration) -> std::io::Result<TcpStream> {
    let addrs = (host, port).to_socket_addrs()?;

    let mut last_err = None;
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }

    Err(last_err.unwrap_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses resolved")
    }))
}

/// Доставка результата в одноразовый слот.
///
/// Слот принимает ровно одну запись. Повторная доставка означает сломанный
/// конечный автомат — не замалчиваем, а падаем. Disconnected — штатный
/// случай: фасад уже отказался ждать (таймаут), результат отбрасывается.
fn deliver(slot: &Sender<SessionResult>, result: SessionResult) {
    match slot.try_send(result) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => {
            unreachable!("session result delivered twice");
        }
        Err(TrySendError::Disconnected(_)) => {
            debug!("session result discarded: nobody is waiting");
        }
    }
}
