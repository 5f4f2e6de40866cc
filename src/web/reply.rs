/// An outgoing response, independent of the HTTP server crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Reply {
    fn with_type(status: u16, content_type: &'static str, body: String) -> Self {
        Self {
            status,
            content_type,
            headers: Vec::new(),
            body,
        }
    }

    pub fn html(body: String) -> Self {
        Self::with_type(200, "text/html; charset=utf-8", body)
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::with_type(status, "text/plain; charset=utf-8", body.into())
    }

    pub fn svg(body: String) -> Self {
        Self::with_type(200, "image/svg+xml", body)
    }

    pub fn csv(filename: &str, body: String) -> Self {
        Self::with_type(200, "text/csv; charset=utf-8", body)
            .header("Content-Disposition", format!("attachment; filename=\"{filename}\""))
    }

    /// 303 so a POST is followed by a GET.
    pub fn redirect(location: &str) -> Self {
        Self::with_type(303, "text/plain; charset=utf-8", String::new()).header("Location", location)
    }

    pub fn not_found() -> Self {
        Self::text(404, "Not found")
    }

    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn set_cookie(self, name: &str, value: &str, attributes: &str) -> Self {
        self.header("Set-Cookie", format!("{name}={value}; {attributes}"))
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn into_tiny(self) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
        let mut response =
            tiny_http::Response::from_data(self.body.into_bytes()).with_status_code(self.status);
        let headers = std::iter::once(("Content-Type".to_string(), self.content_type.to_string()))
            .chain(self.headers);
        for (name, value) in headers {
            match tiny_http::Header::from_bytes(name.as_bytes(), value.as_bytes()) {
                Ok(header) => response.add_header(header),
                Err(()) => tracing::warn!(header = %name, "dropping invalid response header"),
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::Reply;

    #[test]
    fn redirect_and_cookie_headers() {
        let reply = Reply::redirect("/admin").set_cookie("survey_admin", "tok", "Path=/; HttpOnly");
        assert_eq!(reply.status, 303);
        assert_eq!(reply.header_value("location"), Some("/admin"));
        assert_eq!(reply.header_value("Set-Cookie"), Some("survey_admin=tok; Path=/; HttpOnly"));
    }

    #[test]
    fn csv_is_an_attachment() {
        let reply = Reply::csv("survey-responses-2024-01-01.csv", "Submitted".to_string());
        assert_eq!(
            reply.header_value("Content-Disposition"),
            Some("attachment; filename=\"survey-responses-2024-01-01.csv\"")
        );
    }
}
