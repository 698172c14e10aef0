//! Shared fixtures: a deterministic offline provider and PDF generation.

#![allow(dead_code)]

use async_trait::async_trait;
use docqa_core::provider::{ChatRequest, ChatResponse, Message, Provider, ProviderError, Result};
use docqa_core::{Config, RagEngine};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Object, Stream};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

const DIMENSION: usize = 256;

/// Bag-of-words hashing embedder plus an echo "chat model".
///
/// The chat reply is the user prompt itself, so tests can inspect exactly what
/// reached the generator.
#[derive(Default)]
pub struct HashingProvider {
    embed_calls: AtomicU32,
    /// Upcoming embedding calls that fail with HTTP 503
    transient_failures: AtomicU32,
    /// Fail every embedding call with HTTP 400
    permanent_failure: std::sync::atomic::AtomicBool,
    /// Artificial latency per embedding call, in milliseconds
    embed_delay_ms: AtomicU64,
    in_flight: AtomicU32,
    /// Most embedding calls ever running at once
    peak_in_flight: AtomicU32,
}

impl HashingProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn embed_calls(&self) -> u32 {
        self.embed_calls.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> u32 {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn fail_next(&self, times: u32) {
        self.transient_failures.store(times, Ordering::SeqCst);
    }

    pub fn fail_always(&self, fail: bool) {
        self.permanent_failure.store(fail, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        self.embed_delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }
}

pub fn embed_text(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0; DIMENSION];
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2)
    {
        // FNV-1a
        let mut hash: u64 = 0xcbf29ce484222325;
        for byte in word.to_lowercase().bytes() {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(0x100000001b3);
        }
        vector[(hash % DIMENSION as u64) as usize] += 1.0;
    }
    vector
}

#[async_trait]
impl Provider for HashingProvider {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let prompt = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.clone())
            .ok_or_else(|| ProviderError::Other("no user message".into()))?;

        Ok(ChatResponse {
            model: request.model,
            message: Message::assistant(prompt),
        })
    }

    async fn embed_batch(&self, inputs: &[String], _model: &str) -> Result<Vec<Vec<f32>>> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(running, Ordering::SeqCst);

        let delay = self.embed_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.permanent_failure.load(Ordering::SeqCst) {
            return Err(ProviderError::Api { status: 400, body: "bad request".into() });
        }
        let pending = self.transient_failures.load(Ordering::SeqCst);
        if pending > 0 {
            self.transient_failures.store(pending - 1, Ordering::SeqCst);
            return Err(ProviderError::Api { status: 503, body: "overloaded".into() });
        }

        Ok(inputs.iter().map(|text| embed_text(text)).collect())
    }
}

/// Small chunks and millisecond backoff so tests stay fast.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.rag.chunk_size = 200;
    config.rag.chunk_overlap = 20;
    config.rag.top_k = 3;
    config.rag.embed_batch_size = 4;
    config.network.request_timeout_secs = 5;
    config.network.max_retries = 3;
    config.network.initial_backoff_ms = 1;
    config.network.max_backoff_ms = 4;
    config
}

pub fn engine(provider: Arc<HashingProvider>) -> RagEngine {
    RagEngine::new(&test_config(), provider).unwrap()
}

/// Builds a PDF with one page per entry, each page holding the given lines.
pub fn pdf_bytes(pages: &[&[&str]]) -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for lines in pages {
        let mut operations = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), 11.into()]));
            operations.push(Operation::new("Td", vec![50.into(), (780 - 16 * i as i64).into()]));
            operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

pub fn write_pdf(dir: &Path, name: &str, pages: &[&[&str]]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, pdf_bytes(pages)).unwrap();
    path
}

pub const ASTRONOMY: &[&str] = &[
    "The telescope observed distant galaxies and nebulae across the night sky.",
    "Astronomers measure starlight to estimate the distance of each galaxy.",
    "Spectral lines reveal which elements burn inside the observed stars.",
];

pub const VOLCANOES: &[&str] = &[
    "A volcano erupts when molten magma rises through cracks in the crust.",
    "Lava flows from the volcano crater and cools into basalt rock.",
    "Volcanic ash clouds can ground aircraft for days after an eruption.",
];

pub const BAKING: &[&str] = &[
    "Bread dough needs flour, water, yeast and salt before kneading.",
    "The oven bakes the loaf until the crust turns golden brown.",
    "Sourdough starter ferments slowly and gives the bread its sour taste.",
];

pub const OCEANS: &[&str] = &[
    "Coral reefs shelter thousands of fish species in warm shallow seas.",
    "Ocean currents carry heat from the tropics toward the polar regions.",
    "Whales migrate across the ocean following plankton and krill blooms.",
];
