//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener};
use std::path::Path;
use std::thread::JoinHandle;

/// Loopback HTTP server answering a fixed sequence of responses.
///
/// Each accepted connection gets the next response; the raw request heads are
/// returned by [`StubGateway::finish`].
pub struct StubGateway {
    addr: SocketAddr,
    handle: JoinHandle<Vec<String>>,
}

impl StubGateway {
    pub fn serve(responses: Vec<(u16, &str)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let responses: Vec<(u16, String)> =
            responses.into_iter().map(|(status, body)| (status, body.to_string())).collect();

        let handle = std::thread::spawn(move || {
            let mut requests = Vec::new();
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().unwrap();
                requests.push(read_head(&mut BufReader::new(stream.try_clone().unwrap())));
                let reason = if (200..300).contains(&status) { "OK" } else { "Error" };
                write!(
                    stream,
                    "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                )
                .unwrap();
                stream.flush().unwrap();
            }
            requests
        });

        Self { addr, handle }
    }

    /// Gateway host as it appears in `.sdk.json`.
    pub fn gateway(&self) -> String {
        self.addr.to_string()
    }

    /// Wait until every response was served and return the request heads.
    pub fn finish(self) -> Vec<String> {
        self.handle.join().unwrap()
    }
}

fn read_head<R: BufRead>(reader: &mut R) -> String {
    let mut head = String::new();
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
            break;
        }
        head.push_str(&line);
    }
    head
}

pub fn sdk_json(gateway: &str) -> String {
    format!(
        r#"{{"buildType":"DOCKER","projectId":"demo","agentId":"agent-1","secretKey":"s3cr3t",
            "gateway":"{gateway}","buildId":"b-42","vmSeqId":"1","taskId":"e-7"}}"#
    )
}

pub fn write_data_dir(dir: &Path, sdk: Option<&str>, input: Option<&str>) {
    if let Some(sdk) = sdk {
        std::fs::write(dir.join(".sdk.json"), sdk).unwrap();
    }
    if let Some(input) = input {
        std::fs::write(dir.join("input.json"), input).unwrap();
    }
}
