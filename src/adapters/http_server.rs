//! HTTP server adapter.
//!
//! Implements [`HttpPort`] with a [`StatusMirror`]: the loop pushes each
//! new payload into it, and request handlers read it back.  On ESP-IDF the
//! handlers run on the httpd task, so the mirror is the one place that
//! needs a lock; the scheduling loop never sees it.
//!
//! | Route                 | Handler                                   |
//! |-----------------------|-------------------------------------------|
//! | `GET /`               | control page                              |
//! | `GET /status`         | current payload, `application/json`       |
//! | `GET <update_path>`   | upload form                               |
//! | `POST <update_path>`  | raw image → [`FirmwareUpdater`], reboot   |
//!
//! [`FirmwareUpdater`]: crate::update::FirmwareUpdater

use std::sync::{Arc, Mutex, MutexGuard};

use crate::app::ports::HttpPort;
use crate::http::{self, Method};
use crate::payload::Payload;

/// Shared copy of the last published payload.
#[derive(Clone)]
pub struct StatusMirror {
    current: Arc<Mutex<Payload>>,
    update_path: Arc<str>,
}

impl StatusMirror {
    pub fn new(update_path: &str) -> Self {
        Self {
            current: Arc::new(Mutex::new(Payload::disconnected())),
            update_path: Arc::from(update_path),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Payload> {
        // A panicking handler cannot leave a Payload half-written.
        self.current.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Copy of the payload the next `/status` request will see.
    pub fn snapshot(&self) -> Payload {
        self.lock().clone()
    }

    /// Answer a request that does not carry a firmware image.
    ///
    /// Returns `(status, content type, body)`, or `None` for the upload route.
    pub fn handle(&self, method: Method, path: &str) -> Option<(u16, &'static str, Vec<u8>)> {
        let current = self.snapshot();
        http::respond(method, path, &current, &self.update_path)
            .map(|r| (r.status, r.content_type, r.body.to_vec()))
    }
}

impl HttpPort for StatusMirror {
    fn set_status(&mut self, status: &Payload) {
        *self.lock() = status.clone();
    }

    /// Requests are answered on the server's own task.
    fn service(&mut self) {}
}

// ═══════════════════════════════════════════════════════════════
//  ESP-IDF server
// ═══════════════════════════════════════════════════════════════

#[cfg(target_os = "espidf")]
pub use esp_impl::start_server;

#[cfg(target_os = "espidf")]
mod esp_impl {
    use std::thread;
    use std::time::Duration;

    use anyhow::Context as _;
    use esp_idf_svc::http::Method as EspMethod;
    use esp_idf_svc::http::server::{Configuration, EspHttpConnection, EspHttpServer, Request};
    use esp_idf_svc::http::Headers as _;
    use esp_idf_svc::io::{Read as _, Write as _};
    use log::{info, warn};

    use super::StatusMirror;
    use crate::config::BridgeConfig;
    use crate::http::{CONTENT_JSON, Method};
    use crate::update::{self, FirmwareUpdater};

    const UPLOAD_CHUNK: usize = 4096;

    type Req<'r, 'c> = Request<&'r mut EspHttpConnection<'c>>;

    fn reply(req: Req<'_, '_>, status: u16, content_type: &str, body: &[u8]) -> anyhow::Result<()> {
        req.into_response(status, None, &[("Content-Type", content_type)])?
            .write_all(body)?;
        Ok(())
    }

    fn reply_json(req: Req<'_, '_>, status: u16, value: &serde_json::Value) -> anyhow::Result<()> {
        let body = serde_json::to_vec(value)?;
        reply(req, status, CONTENT_JSON, &body)
    }

    /// Register every route and start listening.
    pub fn start_server(
        mirror: &StatusMirror,
        config: &BridgeConfig,
    ) -> anyhow::Result<EspHttpServer<'static>> {
        let conf = Configuration {
            http_port: config.http_port,
            stack_size: 10 * 1024,
            ..Default::default()
        };
        let mut server = EspHttpServer::new(&conf).context("EspHttpServer::new")?;

        for path in ["/", "/status"] {
            let mirror = mirror.clone();
            server.fn_handler::<anyhow::Error, _>(path, EspMethod::Get, move |req| {
                match mirror.handle(Method::Get, path) {
                    Some((status, ct, body)) => reply(req, status, ct, &body),
                    None => reply(req, 404, "text/plain", b"Not Found"),
                }
            })?;
        }

        {
            let mirror = mirror.clone();
            let path = config.update_path.clone();
            server.fn_handler::<anyhow::Error, _>(&config.update_path, EspMethod::Get, move |req| {
                match mirror.handle(Method::Get, &path) {
                    Some((status, ct, body)) => reply(req, status, ct, &body),
                    None => reply(req, 404, "text/plain", b"Not Found"),
                }
            })?;
        }

        {
            let user = config.update_user.clone();
            let password = config.update_password.clone();
            server.fn_handler::<anyhow::Error, _>(&config.update_path, EspMethod::Post, move |req| {
                upload(req, &user, &password)
            })?;
        }

        info!("HTTP: listening on port {}", config.http_port);
        Ok(server)
    }

    fn upload(mut req: Req<'_, '_>, user: &str, password: &str) -> anyhow::Result<()> {
        if !update::authorize(req.header("Authorization"), user, password) {
            warn!("HTTP: unauthorised firmware upload rejected");
            req.into_response(
                401,
                Some("Unauthorized"),
                &[("WWW-Authenticate", "Basic realm=\"firmware\"")],
            )?
            .write_all(b"Unauthorized")?;
            return Ok(());
        }

        let Some(len) = req.content_len().and_then(|l| u32::try_from(l).ok()) else {
            return reply_json(req, 411, &serde_json::json!({ "error": "content length required" }));
        };

        let mut updater = FirmwareUpdater::new();
        if let Err(e) = updater.begin(len) {
            return reply_json(req, 400, &serde_json::json!({ "error": e.to_string() }));
        }

        let mut buf = [0u8; UPLOAD_CHUNK];
        let mut offset = 0u32;
        loop {
            let n = req.read(&mut buf).map_err(|e| anyhow::anyhow!("{e:?}"))?;
            if n == 0 {
                break;
            }
            match updater.write_chunk(offset, &buf[..n]) {
                Ok(written) => offset = written,
                Err(e) => {
                    updater.abort();
                    return reply_json(req, 400, &serde_json::json!({ "error": e.to_string() }));
                }
            }
        }

        if let Err(e) = updater.finalize() {
            updater.abort();
            return reply_json(req, 500, &serde_json::json!({ "error": e.to_string() }));
        }
        reply_json(req, 200, &serde_json::json!({ "updated": true, "bytes": offset }))?;

        // Reboot after the response has left.
        thread::Builder::new()
            .name("fw-reboot".into())
            .spawn(|| {
                thread::sleep(Duration::from_millis(500));
                update::reboot();
            })
            .context("spawn reboot thread")?;
        Ok(())
    }
}
