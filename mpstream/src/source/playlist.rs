use memchr::{memchr, memmem};

const REDIRECT_MARKER: &[u8] = b"http://";

/// First `http://` URL in a playlist response, up to the end of its line.
///
/// The response is searched as a whole, headers included, so `.pls` (`File1=http://..`),
/// `.m3u` and plain-text bodies all work.
pub fn find_redirect(response: &[u8]) -> Option<String> {
    let start = memmem::find(response, REDIRECT_MARKER)?;
    let line = &response[start..];
    let line = match memchr(b'\n', line) {
        Some(end) => &line[..end],
        None => line,
    };

    let url = String::from_utf8_lossy(line);
    let url = url.trim_end();
    (url.len() > REDIRECT_MARKER.len()).then(|| url.to_string())
}

#[test]
fn redirect_from_pls() {
    let response = b"HTTP/1.0 200 OK\r\nContent-Type: audio/x-scpls\r\n\r\n\
        [playlist]\r\nNumberOfEntries=2\r\nFile1=http://relay.example.net:8010/stream\r\n\
        File2=http://backup.example.net/\r\n";

    assert_eq!(
        find_redirect(response).as_deref(),
        Some("http://relay.example.net:8010/stream")
    );
}

#[test]
fn redirect_without_trailing_newline() {
    assert_eq!(
        find_redirect(b"#EXTM3U\nhttp://10.0.0.1:8000/live  ").as_deref(),
        Some("http://10.0.0.1:8000/live")
    );
    assert_eq!(find_redirect(b"no link here"), None);
    assert_eq!(find_redirect(b"File1=http://\r\n"), None);
}
