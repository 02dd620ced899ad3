//! Shared fixtures for the integration tests
//!
//! The stub shard behaves like the real storage endpoint: it takes the
//! multipart body apart and answers with `hash;size` for the file bytes it
//! received.

#![allow(dead_code)]

use cloud_upload::{CloudClient, CloudConfig, ShardEndpoint};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const TOKEN: &str = "test-token";
pub const UPLOAD_PATH: &str = "/upload/";
pub const FILE_ADD_PATH: &str = "/api/v2/file/add";

pub fn client_for(server: &MockServer) -> CloudClient {
    let config = CloudConfig::new()
        .api_base_url(format!("{}/api/v2/", server.uri()))
        .timeout_secs(30);
    CloudClient::new(config)
        .expect("valid test config")
        .with_auth_token(TOKEN)
        .with_shard(ShardEndpoint::new(format!("{}{}", server.uri(), UPLOAD_PATH)))
}

pub fn fingerprint(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content))
}

/// Write `len` pseudo-random bytes and return the path and their fingerprint
pub fn write_random_file(dir: &Path, name: &str, len: usize, seed: u64) -> (PathBuf, String) {
    let mut content = vec![0u8; len];
    StdRng::seed_from_u64(seed).fill_bytes(&mut content);
    let file_path = dir.join(name);
    std::fs::write(&file_path, &content).expect("write test file");
    (file_path, fingerprint(&content))
}

pub fn boundary_of(request: &Request) -> Option<String> {
    let content_type = request.headers.get("content-type")?.to_str().ok()?;
    content_type
        .strip_prefix("multipart/form-data; boundary=")
        .map(str::to_string)
}

/// The file bytes of a single-field multipart body
pub fn file_part(request: &Request) -> Option<Vec<u8>> {
    let boundary = boundary_of(request)?;
    let body = &request.body;
    let opening = format!("--{}\r\n", boundary);
    let closing = format!("\r\n--{}--\r\n", boundary);
    if !body.starts_with(opening.as_bytes()) || !body.ends_with(closing.as_bytes()) {
        return None;
    }
    let content_start = body.windows(4).position(|w| w == b"\r\n\r\n")? + 4;
    let content_end = body.len() - closing.len();
    if content_start > content_end {
        return None;
    }
    Some(body[content_start..content_end].to_vec())
}

pub fn content_length_of(request: &Request) -> Option<u64> {
    request
        .headers
        .get("content-length")?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

/// Answers like the storage shard: `<sha256 hex>;<byte count>`
pub struct ShardResponder;

impl Respond for ShardResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        match file_part(request) {
            Some(content) => ResponseTemplate::new(200)
                .set_body_string(format!("{};{}\n", fingerprint(&content), content.len())),
            None => ResponseTemplate::new(400).set_body_string("malformed multipart body"),
        }
    }
}

pub async fn mount_shard(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(UPLOAD_PATH))
        .respond_with(ShardResponder)
        .mount(server)
        .await;
}

pub async fn mount_registration(server: &MockServer, status: u16, body: &str, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path(FILE_ADD_PATH))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .expect(expected_calls)
        .mount(server)
        .await;
}

pub async fn requests_to(server: &MockServer, target: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|request| request.url.path() == target)
        .collect()
}
