// tests/common/mod.rs
// Shared fixtures for integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use quake_feed::bulletin::error::BulletinError;
use quake_feed::bulletin::source::{BulletinSource, StaticBulletinSource};
use quake_feed::{BulletinPipeline, FeedConfig};

pub const FIXTURE_HTML: &str = include_str!("../fixtures/koeri_lst0.html");

/// Fixture as the upstream actually sends it: ISO-8859-9 bytes.
pub fn fixture_bytes() -> Vec<u8> {
    let (bytes, _, unmappable) = encoding_rs::WINDOWS_1254.encode(FIXTURE_HTML);
    assert!(!unmappable, "fixture must be representable in ISO-8859-9");
    bytes.into_owned()
}

pub fn pipeline_with(source: impl BulletinSource + 'static) -> BulletinPipeline {
    BulletinPipeline::new(Arc::new(source), &FeedConfig::default())
}

pub fn fixture_pipeline() -> BulletinPipeline {
    pipeline_with(StaticBulletinSource::new(fixture_bytes()))
}

/// Always fails like an unreachable upstream.
pub struct DownSource;

#[async_trait]
impl BulletinSource for DownSource {
    async fn fetch_raw(&self) -> Result<Vec<u8>, BulletinError> {
        Err(BulletinError::Status(503))
    }

    fn name(&self) -> &str {
        "down"
    }
}

/// Serves a sequence of bodies, repeating the last one.
pub struct SequenceSource {
    bodies: Mutex<Vec<Vec<u8>>>,
}

impl SequenceSource {
    pub fn new(bodies: Vec<Vec<u8>>) -> Self {
        assert!(!bodies.is_empty());
        let mut bodies = bodies;
        bodies.reverse();
        Self {
            bodies: Mutex::new(bodies),
        }
    }
}

#[async_trait]
impl BulletinSource for SequenceSource {
    async fn fetch_raw(&self) -> Result<Vec<u8>, BulletinError> {
        let mut v = self.bodies.lock().unwrap();
        if v.len() > 1 {
            Ok(v.pop().unwrap())
        } else {
            Ok(v[0].clone())
        }
    }

    fn name(&self) -> &str {
        "sequence"
    }
}

/// Plain-text bulletin: six preamble lines followed by `lines`.
pub fn plain_bulletin(lines: &[&str]) -> String {
    let mut s = String::from("h1\nh2\nh3\nh4\nh5\nh6\n");
    for l in lines {
        s.push_str(l);
        s.push('\n');
    }
    s
}
