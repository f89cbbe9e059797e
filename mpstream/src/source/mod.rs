//! Connection setup for `http://` broadcasts.
//!
//! A station URL usually points at a playlist rather than at the audio itself. The
//! resolver fetches it, follows the first `http://` link it contains and returns the open
//! connection to that second server. Requests are raw HTTP/1.0 because Shoutcast-style
//! servers answer with an `ICY 200 OK` status line that HTTP clients reject; the response
//! headers of the stream are therefore part of the byte source.

mod http;
mod playlist;

use std::fmt;
use std::net::TcpStream;

use log::info;
use url::Url;

use crate::utils::errors::ResolveError;

pub use playlist::find_redirect;

/// Upper bound on the playlist response.
pub const PLAYLIST_LIMIT: usize = 1 << 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    /// Path and query, as sent in the request line.
    pub path: String,
}

impl Endpoint {
    pub fn parse(url: &str) -> Result<Self, ResolveError> {
        let parsed = Url::parse(url.trim()).map_err(|source| ResolveError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        if parsed.scheme() != "http" {
            return Err(ResolveError::UnsupportedScheme(parsed.scheme().to_string()));
        }

        let host = parsed
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| ResolveError::MissingHost(url.to_string()))?;

        let mut path = parsed.path().to_string();
        if let Some(query) = parsed.query() {
            path.push('?');
            path.push_str(query);
        }

        Ok(Self {
            host: host.to_string(),
            port: parsed.port_or_known_default().unwrap_or(80),
            path,
        })
    }

    pub fn request(&self) -> String {
        format!(
            "GET {} HTTP/1.0\r\nHost: {}:{}\r\n\r\n",
            self.path, self.host, self.port
        )
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// An open connection to the audio server, request already sent.
#[derive(Debug)]
pub struct ResolvedStream {
    pub stream: TcpStream,
    /// Where the playlist came from; output files are named after this host.
    pub origin: Endpoint,
    pub target: Endpoint,
}

/// Fetches the playlist at `url`, follows its first redirect and requests the stream.
///
/// No retries: any failure means the stream is unavailable.
pub fn resolve(url: &str) -> Result<ResolvedStream, ResolveError> {
    let origin = Endpoint::parse(url)?;
    info!("Fetching playlist {} from {origin}", origin.path);

    let mut conn = http::connect(&origin)?;
    http::send_request(&mut conn, &origin)?;
    let response = http::read_response(&mut conn, &origin, PLAYLIST_LIMIT)?;
    drop(conn);

    let redirect =
        find_redirect(&response).ok_or_else(|| ResolveError::NoRedirect(origin.host.clone()))?;
    let target = Endpoint::parse(&redirect)?;
    info!("Playlist redirects to {redirect}");

    let mut stream = http::connect(&target)?;
    http::send_request(&mut stream, &target)?;

    Ok(ResolvedStream {
        stream,
        origin,
        target,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn parse_endpoint() {
        let endpoint = Endpoint::parse("http://Radio.Example.net:8000/listen.pls?sid=1").unwrap();
        assert_eq!(endpoint.host, "radio.example.net");
        assert_eq!(endpoint.port, 8000);
        assert_eq!(endpoint.path, "/listen.pls?sid=1");
        assert_eq!(
            endpoint.request(),
            "GET /listen.pls?sid=1 HTTP/1.0\r\nHost: radio.example.net:8000\r\n\r\n"
        );

        let endpoint = Endpoint::parse("http://radio.example.net").unwrap();
        assert_eq!(endpoint.port, 80);
        assert_eq!(endpoint.path, "/");
        assert_eq!(endpoint.to_string(), "radio.example.net:80");
    }

    #[test]
    fn reject_bad_urls() {
        assert!(matches!(
            Endpoint::parse("radio.example.net/listen"),
            Err(ResolveError::InvalidUrl { .. })
        ));
        assert!(matches!(
            Endpoint::parse("https://radio.example.net/"),
            Err(ResolveError::UnsupportedScheme(_))
        ));
    }

    fn read_request(stream: &TcpStream) -> String {
        let mut reader = BufReader::new(stream);
        let mut request = String::new();
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                break;
            }
            request.push_str(&line);
        }
        request
    }

    #[test]
    fn resolve_follows_playlist() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = thread::spawn(move || {
            let (mut conn, _) = listener.accept().unwrap();
            let first = read_request(&conn);
            write!(
                conn,
                "HTTP/1.0 200 OK\r\n\r\n[playlist]\r\nFile1=http://127.0.0.1:{port}/live\r\n"
            )
            .unwrap();
            drop(conn);

            let (mut conn, _) = listener.accept().unwrap();
            let second = read_request(&conn);
            conn.write_all(b"ICY 200 OK\r\n\r\naudio").unwrap();
            (first, second)
        });

        let mut resolved = resolve(&format!("http://127.0.0.1:{port}/radio.pls")).unwrap();
        let mut body = Vec::new();
        resolved.stream.read_to_end(&mut body).unwrap();

        let (first, second) = server.join().unwrap();
        assert_eq!(first, format!("GET /radio.pls HTTP/1.0\r\nHost: 127.0.0.1:{port}\r\n"));
        assert_eq!(second, format!("GET /live HTTP/1.0\r\nHost: 127.0.0.1:{port}\r\n"));
        assert_eq!(resolved.origin.path, "/radio.pls");
        assert_eq!(resolved.target.path, "/live");
        assert_eq!(body, b"ICY 200 OK\r\n\r\naudio");
    }

    #[test]
    fn resolve_without_redirect_fails() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = thread::spawn(move || {
            let (mut conn, _) = listener.accept().unwrap();
            read_request(&conn);
            conn.write_all(b"HTTP/1.0 404 Not Found\r\n\r\n").unwrap();
        });

        let result = resolve(&format!("http://127.0.0.1:{port}/missing.pls"));
        server.join().unwrap();
        assert!(matches!(result, Err(ResolveError::NoRedirect(_))));
    }

    #[test]
    fn oversized_playlist_is_rejected() {
        let endpoint = Endpoint::parse("http://radio.example.net/").unwrap();
        let response = vec![b'x'; 64];

        assert!(matches!(
            http::read_response(&response[..], &endpoint, 32),
            Err(ResolveError::PlaylistTooLarge { limit: 32, .. })
        ));
        assert_eq!(
            http::read_response(&response[..], &endpoint, 64).unwrap().len(),
            64
        );
    }
}
