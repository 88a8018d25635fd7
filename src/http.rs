//! HTTP responder: route table and response bodies.
//!
//! Platform-free so the routing rules run on the host.  The ESP-IDF
//! server adapter ([`crate::adapters::http_server`]) registers handlers
//! that call into [`respond`] and [`crate::update`].

use crate::payload::Payload;

/// Control page served on `GET /`.  Polls `/status` and renders the fields.
pub const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html><head><meta charset="utf-8"><title>Growatt bridge</title>
<style>body{font-family:sans-serif}td{padding:2px 12px}</style></head>
<body>
<h1>Growatt bridge</h1>
<table id="t"></table>
<script>
function load(){
  fetch('/status').then(function(r){return r.json();}).then(function(j){
    var h='';
    for(var k in j){h+='<tr><td>'+k+'</td><td>'+j[k]+'</td></tr>';}
    document.getElementById('t').innerHTML=h;
  });
}
load();
setInterval(load,5000);
</script>
</body></html>"#;

pub const CONTENT_JSON: &str = "application/json";
pub const CONTENT_HTML: &str = "text/html";
pub const CONTENT_TEXT: &str = "text/plain";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Other,
}

/// Where a request goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Page,
    Status,
    UpdateForm,
    UpdateUpload,
    MethodNotAllowed,
    NotFound,
}

pub fn route(method: Method, path: &str, update_path: &str) -> Route {
    // Query strings do not select routes.
    let path = path.split_once('?').map_or(path, |(p, _)| p);
    match (method, path) {
        (Method::Get, "/") => Route::Page,
        (Method::Get, "/status") => Route::Status,
        (_, "/" | "/status") => Route::MethodNotAllowed,
        (Method::Get, p) if p == update_path => Route::UpdateForm,
        (Method::Post, p) if p == update_path => Route::UpdateUpload,
        (_, p) if p == update_path => Route::MethodNotAllowed,
        _ => Route::NotFound,
    }
}

/// A fully formed response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response<'a> {
    pub status: u16,
    pub content_type: &'static str,
    pub body: &'a [u8],
}

/// The current payload, verbatim.  Always `200`: a disconnected bridge is
/// still a valid answer.
pub fn serve_status(status: &Payload) -> Response<'_> {
    Response {
        status: 200,
        content_type: CONTENT_JSON,
        body: status.as_bytes(),
    }
}

pub fn serve_page() -> Response<'static> {
    Response {
        status: 200,
        content_type: CONTENT_HTML,
        body: INDEX_HTML.as_bytes(),
    }
}

/// Answer every route that does not involve the updater.
///
/// Returns `None` for [`Route::UpdateUpload`], which needs the request
/// body and credentials.
pub fn respond<'a>(
    method: Method,
    path: &str,
    status: &'a Payload,
    update_path: &str,
) -> Option<Response<'a>> {
    let response = match route(method, path, update_path) {
        Route::Page => serve_page(),
        Route::Status => serve_status(status),
        Route::UpdateForm => Response {
            status: 200,
            content_type: CONTENT_HTML,
            body: crate::update::UPDATE_FORM_HTML.as_bytes(),
        },
        Route::UpdateUpload => return None,
        Route::MethodNotAllowed => Response {
            status: 405,
            content_type: CONTENT_TEXT,
            body: b"Method Not Allowed",
        },
        Route::NotFound => Response {
            status: 404,
            content_type: CONTENT_TEXT,
            body: b"Not Found",
        },
    };
    Some(response)
}
