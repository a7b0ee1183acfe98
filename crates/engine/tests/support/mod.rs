#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use wordplay_engine::{
    EngineError, GenerativeBackend, ImageRequest, InlineImage, JsonRequest, Operation, Result,
};
use wordplay_protocol::WordMashupPuzzle;

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub operation: Operation,
    pub model: String,
    pub prompt: String,
    pub has_image: bool,
}

/// In-process backend that answers from per-operation queues and records
/// every call. An empty queue answers with a transport error.
#[derive(Default)]
pub struct ScriptedBackend {
    json: Mutex<HashMap<Operation, VecDeque<Result<String>>>>,
    calls: Mutex<Vec<RecordedCall>>,
    fail_images: AtomicBool,
    delay: Option<Duration>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call sleeps this long before answering.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn push_json(&self, operation: Operation, body: impl Into<String>) {
        self.queue(operation, Ok(body.into()));
    }

    pub fn push_error(&self, operation: Operation, err: EngineError) {
        self.queue(operation, Err(err));
    }

    pub fn fail_images(&self, fail: bool) {
        self.fail_images.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn calls_for(&self, operation: Operation) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.operation == operation)
            .collect()
    }

    pub fn count(&self, operation: Operation) -> usize {
        self.calls_for(operation).len()
    }

    fn queue(&self, operation: Operation, response: Result<String>) {
        self.json
            .lock()
            .expect("json lock")
            .entry(operation)
            .or_default()
            .push_back(response);
    }

    async fn record(&self, operation: Operation, model: &str, prompt: &str, has_image: bool) {
        self.calls.lock().expect("calls lock").push(RecordedCall {
            operation,
            model: model.to_string(),
            prompt: prompt.to_string(),
            has_image,
        });
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn image_result(&self, data: Vec<u8>) -> Result<InlineImage> {
        if self.fail_images.load(Ordering::SeqCst) {
            return Err(EngineError::Transport("image backend unavailable".to_string()));
        }
        Ok(InlineImage::new("image/png", data))
    }
}

#[async_trait]
impl GenerativeBackend for ScriptedBackend {
    async fn generate_json(&self, request: &JsonRequest) -> Result<String> {
        self.record(
            request.operation,
            &request.model,
            &request.prompt,
            request.image.is_some(),
        )
        .await;
        self.json
            .lock()
            .expect("json lock")
            .get_mut(&request.operation)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| {
                Err(EngineError::Transport(format!(
                    "no scripted response for {}",
                    request.operation
                )))
            })
    }

    async fn generate_image(&self, request: &ImageRequest) -> Result<InlineImage> {
        self.record(request.operation, &request.model, &request.prompt, false)
            .await;
        self.image_result(request.prompt.as_bytes().to_vec())
    }

    async fn edit_image(&self, request: &ImageRequest, source: &InlineImage) -> Result<InlineImage> {
        self.record(request.operation, &request.model, &request.prompt, true)
            .await;
        let mut data = source.data.clone();
        data.extend_from_slice(b"+edited");
        self.image_result(data)
    }
}

pub fn goldfish_json() -> String {
    json!({
        "word": "goldfish",
        "deconstructions": [["G", "O", "L", "D", "FISH"]],
        "solutions": [{"part": "FISH", "alternatives": ["FISH", "TUNA"]}]
    })
    .to_string()
}

pub fn keyboard_json() -> String {
    json!({
        "word": "KEYBOARD",
        "deconstructions": [["K", "E", "Y", "BOARD"], ["KEY", "BOARD"]],
        "solutions": [
            {"part": "BOARD", "alternatives": ["BOARD", "PLANK"]},
            {"part": "KEY", "alternatives": ["KEY"]}
        ]
    })
    .to_string()
}

/// Valid for both parts but without a single letter, so Hard rejects it.
pub fn background_whole_words_json() -> String {
    json!({
        "word": "BACKGROUND",
        "deconstructions": [["BACK", "GROUND"]],
        "solutions": [
            {"part": "BACK", "alternatives": ["BACK", "REAR"]},
            {"part": "GROUND", "alternatives": ["GROUND", "EARTH"]}
        ]
    })
    .to_string()
}

pub fn sunflower_json() -> String {
    json!({"word": "Sunflower", "objects": ["sun", "flower"], "starterWord": "sun"}).to_string()
}

pub fn judgment_json(score: Value) -> String {
    json!({
        "score": score,
        "feedback": "The sun blooms beautifully",
        "objectsFound": ["SUN", "FLOWER"],
        "mashupQuality": "high"
    })
    .to_string()
}

pub fn sunflower_puzzle() -> WordMashupPuzzle {
    WordMashupPuzzle {
        word: "SUNFLOWER".to_string(),
        starter_word: "SUN".to_string(),
        starter_image_url: Some(InlineImage::new("image/png", b"sun".to_vec()).to_data_url()),
        objects: vec!["SUN".to_string(), "FLOWER".to_string()],
    }
}
