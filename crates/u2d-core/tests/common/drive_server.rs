//! Minimal HTTP/1.1 server for integration tests.
//!
//! Plays both ends of a relay: a file host (static files plus redirects) and
//! the resumable upload API (initiation POST and chunk PUTs). Every request
//! is recorded so tests can assert on exactly what went over the wire.
//! One request per connection; responses carry `Connection: close`.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

pub const UPLOAD_PATH: &str = "/upload/drive/v3/files";
pub const SESSION_PATH: &str = "/session/1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitBehavior {
    Accept,
    Reject(u32),
    NoLocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutBehavior {
    /// 308 with the full received range after each chunk, 201 once complete.
    /// While nothing is stored the 308 carries no `Range` header.
    AckAll,
    /// Like `AckAll`, but the first PUT only keeps its first `keep` bytes.
    PartialFirst { keep: usize },
    /// Like `AckAll`, but PUT number `nth` (1-based) keeps nothing.
    DropNth { nth: u32 },
    /// No PUT keeps anything.
    KeepNothing,
    /// Every PUT answers with this status and no `Range` header.
    Fail(u32),
    /// Close the connection without answering.
    Hangup,
    /// Always 308, even after the last byte.
    NeverFinalize,
}

#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub token: &'static str,
    pub init: InitBehavior,
    pub put: PutBehavior,
    /// path -> body
    pub files: HashMap<String, Vec<u8>>,
    /// path -> redirect target path
    pub redirects: HashMap<String, String>,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            token: "test-token",
            init: InitBehavior::Accept,
            put: PutBehavior::AckAll,
            files: HashMap::new(),
            redirects: HashMap::new(),
        }
    }
}

impl ServerOptions {
    pub fn file(mut self, path: &str, body: Vec<u8>) -> Self {
        self.files.insert(path.to_string(), body);
        self
    }

    pub fn redirect(mut self, from: &str, to: &str) -> Self {
        self.redirects.insert(from.to_string(), to.to_string());
        self
    }

    pub fn put(mut self, put: PutBehavior) -> Self {
        self.put = put;
        self
    }

    pub fn init(mut self, init: InitBehavior) -> Self {
        self.init = init;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    /// Path including query string.
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// (first, last, total) from `Content-Range: bytes first-last/total`.
    pub fn content_range(&self) -> Option<(u64, u64, u64)> {
        let v = self.header("content-range")?.strip_prefix("bytes ")?;
        let (range, total) = v.split_once('/')?;
        let (a, b) = range.split_once('-')?;
        Some((a.parse().ok()?, b.parse().ok()?, total.parse().ok()?))
    }
}

#[derive(Default)]
struct State {
    requests: Vec<Recorded>,
    stored: Vec<u8>,
    puts: u32,
    name: Option<String>,
}

pub struct DriveServer {
    pub base: String,
    opts: ServerOptions,
    state: Arc<Mutex<State>>,
}

impl DriveServer {
    pub fn start(opts: ServerOptions) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let base = format!("http://127.0.0.1:{}", port);
        let state = Arc::new(Mutex::new(State::default()));
        let server = DriveServer {
            base: base.clone(),
            opts: opts.clone(),
            state: Arc::clone(&state),
        };
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let state = Arc::clone(&state);
                let opts = opts.clone();
                let base = base.clone();
                thread::spawn(move || handle(stream, &opts, &state, &base));
            }
        });
        server
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn init_endpoint(&self) -> String {
        self.url(UPLOAD_PATH)
    }

    pub fn token(&self) -> &'static str {
        self.opts.token
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn posts(&self) -> Vec<Recorded> {
        self.by_method("POST")
    }

    pub fn puts(&self) -> Vec<Recorded> {
        self.by_method("PUT")
    }

    fn by_method(&self, method: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method)
            .collect()
    }

    /// Bytes the upload API has accepted so far.
    pub fn stored(&self) -> Vec<u8> {
        self.state.lock().unwrap().stored.clone()
    }
}

fn handle(mut stream: TcpStream, opts: &ServerOptions, state: &Mutex<State>, base: &str) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(5)));
    let Some(req) = read_request(&mut stream) else {
        return;
    };
    state.lock().unwrap().requests.push(req.clone());

    let path = req.target.split('?').next().unwrap_or("").to_string();
    match req.method.as_str() {
        "GET" => {
            if let Some(to) = opts.redirects.get(&path) {
                respond(&mut stream, "302 Found", &[("Location", to.clone())], b"");
            } else if let Some(body) = opts.files.get(&path) {
                respond(&mut stream, "200 OK", &[], body);
            } else {
                respond(&mut stream, "404 Not Found", &[], b"not found");
            }
        }
        "POST" if path == UPLOAD_PATH => handle_init(&mut stream, &req, opts, state, base),
        "PUT" if path == SESSION_PATH => handle_put(&mut stream, &req, opts, state),
        _ => respond(&mut stream, "405 Method Not Allowed", &[], b""),
    }
}

fn handle_init(
    stream: &mut TcpStream,
    req: &Recorded,
    opts: &ServerOptions,
    state: &Mutex<State>,
    base: &str,
) {
    let expected_auth = format!("Bearer {}", opts.token);
    if req.header("authorization") != Some(expected_auth.as_str())
        || !req.target.ends_with("uploadType=resumable")
    {
        respond(stream, "401 Unauthorized", &[], br#"{"error":"invalid_token"}"#);
        return;
    }
    match opts.init {
        InitBehavior::Reject(code) => {
            respond(stream, &format!("{} Rejected", code), &[], br#"{"error":"forbidden"}"#);
        }
        InitBehavior::NoLocation => respond(stream, "200 OK", &[], b""),
        InitBehavior::Accept => {
            let name = init_name(&req.body);
            state.lock().unwrap().name = name;
            let location = format!("{}{}", base, SESSION_PATH);
            respond(stream, "200 OK", &[("Location", location)], b"");
        }
    }
}

fn handle_put(stream: &mut TcpStream, req: &Recorded, opts: &ServerOptions, state: &Mutex<State>) {
    let mut st = state.lock().unwrap();
    st.puts += 1;
    match opts.put {
        PutBehavior::Hangup => return,
        PutBehavior::Fail(code) => {
            drop(st);
            respond(stream, &format!("{} Failed", code), &[], b"");
            return;
        }
        _ => {}
    }

    let Some((first, _last, total)) = req.content_range() else {
        drop(st);
        respond(stream, "400 Bad Request", &[], b"bad Content-Range");
        return;
    };
    if first != st.stored.len() as u64 {
        drop(st);
        respond(stream, "400 Bad Request", &[], b"non-contiguous chunk");
        return;
    }
    let mut chunk = req.body.clone();
    match opts.put {
        PutBehavior::PartialFirst { keep } if st.puts == 1 => chunk.truncate(keep),
        PutBehavior::DropNth { nth } if st.puts == nth => chunk.clear(),
        PutBehavior::KeepNothing => chunk.clear(),
        _ => {}
    }
    st.stored.extend_from_slice(&chunk);

    let received = st.stored.len() as u64;
    if received == total && opts.put != PutBehavior::NeverFinalize {
        let name = st.name.clone().unwrap_or_default();
        drop(st);
        let body = format!(
            r#"{{"kind":"drive#file","id":"file-1","name":"{}","mimeType":"application/octet-stream"}}"#,
            name
        );
        respond(stream, "201 Created", &[], body.as_bytes());
    } else {
        drop(st);
        let headers = if received == 0 {
            Vec::new()
        } else {
            vec![("Range", format!("bytes=0-{}", received - 1))]
        };
        respond(stream, "308 Resume Incomplete", &headers, b"");
    }
}

/// `name` field of the initiation JSON body.
fn init_name(body: &[u8]) -> Option<String> {
    let v: serde_json::Value = serde_json::from_slice(body).ok()?;
    v.get("name")?.as_str().map(str::to_string)
}

fn read_request(stream: &mut TcpStream) -> Option<Recorded> {
    let mut buf = Vec::new();
    let mut tmp = [0u8; 8192];
    let header_end = loop {
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos;
        }
        let n = stream.read(&mut tmp).ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&tmp[..n]);
    };

    let head = std::str::from_utf8(&buf[..header_end]).ok()?;
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let target = request_line.next()?.to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|l| l.split_once(':'))
        .map(|(n, v)| (n.trim().to_string(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);
    let expects_continue = headers
        .iter()
        .any(|(n, v)| n.eq_ignore_ascii_case("expect") && v.eq_ignore_ascii_case("100-continue"));
    if expects_continue {
        let _ = stream.write_all(b"HTTP/1.1 100 Continue\r\n\r\n");
    }

    let mut body = buf[header_end + 4..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut tmp).ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&tmp[..n]);
    }
    body.truncate(content_length);

    Some(Recorded {
        method,
        target,
        headers,
        body,
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn respond(stream: &mut TcpStream, status: &str, headers: &[(&str, String)], body: &[u8]) {
    let mut head = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n",
        status,
        body.len()
    );
    for (k, v) in headers {
        head.push_str(&format!("{}: {}\r\n", k, v));
    }
    head.push_str("\r\n");
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
    let _ = stream.flush();
}
