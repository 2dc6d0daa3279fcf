use std::fmt;

/// Ответ finger-сервера.
///
/// Тело хранится ровно в том виде, в котором пришло по сети (после
/// декодирования в текст): ничего не обрезаем и не нормализуем.
/// Хост, порт и запрос — эхо того, что реально отправлялось, чтобы
/// вызывающий код мог сопоставить ответ с запросом.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerResponse {
    body: String,
    host: String,
    port: u16,
    query: String,
}

impl FingerResponse {
    /// Собирает ответ. Конструирование не может не удаться:
    /// валидация происходит раньше, на этапе приёма.
    pub fn new(body: String, host: String, port: u16, query: String) -> Self {
        Self {
            body,
            host,
            port,
            query,
        }
    }

    /// Полное тело ответа.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Хост, к которому реально подключались.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Порт, к которому реально подключались.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Строка запроса, которая реально уходила на сервер (без терминатора).
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Тело ответа, разбитое на строки.
    ///
    /// Серверы шлют что угодно: CRLF, голый LF, иногда голый CR —
    /// разделителем считается любой из них. Терминатор в строки не входит,
    /// хвостовой терминатор не порождает пустую строку в конце.
    /// Чистая функция от `body`: можно вызывать сколько угодно раз.
    pub fn lines(&self) -> Vec<&str> {
        let s = self.body.as_str();
        let bytes = s.as_bytes();

        let mut out = Vec::new();
        let mut start = 0;
        let mut i = 0;

        while i < bytes.len() {
            match bytes[i] {
                b'\n' => {
                    out.push(&s[start..i]);
                    i += 1;
                    start = i;
                }
                b'\r' => {
                    out.push(&s[start..i]);
                    i += if bytes.get(i + 1) == Some(&b'\n') { 2 } else { 1 };
                    start = i;
                }
                _ => i += 1,
            }
        }

        if start < bytes.len() {
            out.push(&s[start..]);
        }

        out
    }
}

impl fmt::Display for FingerResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mk_response(body: &str) -> FingerResponse {
        FingerResponse::new(
            body.to_string(),
            "example.com".to_string(),
            79,
            "alice".to_string(),
        )
    }

    #[test]
    fn metadata_is_echoed() {
        let resp = mk_response("Login: alice\r\n");

        assert_eq!(resp.body(), "Login: alice\r\n");
        assert_eq!(resp.host(), "example.com");
        assert_eq!(resp.port(), 79);
        assert_eq!(resp.query(), "alice");
    }

    #[test]
    fn display_prints_body_verbatim() {
        let resp = mk_response("Login: alice\r\nName: Alice Smith\r\n");
        assert_eq!(resp.to_string(), "Login: alice\r\nName: Alice Smith\r\n");
    }

    #[test]
    fn lines_single_line_without_terminator() {
        assert_eq!(mk_response("Single line").lines(), ["Single line"]);
    }

    #[test]
    fn lines_splits_on_lf() {
        assert_eq!(
            mk_response("Line 1\nLine 2\nLine 3").lines(),
            ["Line 1", "Line 2", "Line 3"]
        );
    }

    #[test]
    fn lines_splits_on_crlf() {
        assert_eq!(
            mk_response("Line 1\r\nLine 2\r\nLine 3").lines(),
            ["Line 1", "Line 2", "Line 3"]
        );
    }

    #[test]
    fn lines_handles_mixed_terminators() {
        let resp = mk_response("Line 1\r\nLine 2\nLine 3\rLine 4");
        let lines = resp.lines();

        assert_eq!(lines, ["Line 1", "Line 2", "Line 3", "Line 4"]);
    }

    #[test]
    fn lines_trailing_terminator_adds_no_empty_line() {
        assert_eq!(mk_response("Line 1\nLine 2\n").lines(), ["Line 1", "Line 2"]);
        assert_eq!(mk_response("Line 1\r\n").lines(), ["Line 1"]);
    }

    #[test]
    fn lines_keeps_blank_lines() {
        assert_eq!(mk_response("\n\n\n").lines(), ["", "", ""]);
    }

    #[test]
    fn lines_empty_body_is_empty() {
        assert!(mk_response("").lines().is_empty());
    }

    #[test]
    fn lines_is_restartable() {
        let resp = mk_response("a\nb");

        assert_eq!(resp.lines(), resp.lines());
    }
}
