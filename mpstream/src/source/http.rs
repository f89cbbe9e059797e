use std::io::{Read, Write};
use std::net::TcpStream;

use log::debug;

use crate::source::Endpoint;
use crate::utils::errors::ResolveError;

pub fn connect(endpoint: &Endpoint) -> Result<TcpStream, ResolveError> {
    debug!("connecting to {endpoint}");
    TcpStream::connect(endpoint.to_string()).map_err(|source| ResolveError::Connect {
        host: endpoint.host.clone(),
        port: endpoint.port,
        source,
    })
}

pub fn send_request(stream: &mut TcpStream, endpoint: &Endpoint) -> Result<(), ResolveError> {
    debug!("GET {} from {endpoint}", endpoint.path);
    stream
        .write_all(endpoint.request().as_bytes())
        .and_then(|()| stream.flush())
        .map_err(|source| ResolveError::Request {
            host: endpoint.host.clone(),
            source,
        })
}

/// Reads until the server closes the connection, headers included.
pub fn read_response<R: Read>(
    stream: R,
    endpoint: &Endpoint,
    limit: usize,
) -> Result<Vec<u8>, ResolveError> {
    let mut response = Vec::new();
    stream
        .take(limit as u64 + 1)
        .read_to_end(&mut response)
        .map_err(|source| ResolveError::Request {
            host: endpoint.host.clone(),
            source,
        })?;

    if response.len() > limit {
        return Err(ResolveError::PlaylistTooLarge {
            host: endpoint.host.clone(),
            limit,
        });
    }

    debug!("{} bytes of playlist from {endpoint}", response.len());
    Ok(response)
}
