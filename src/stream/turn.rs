//! One streaming call: provider fragments into the decoder and live view.

use crate::api::{CompletionProvider, ProviderError};
use crate::domain::{FileBlock, Message};
use crate::stream::decoder::{RenderSink, StreamDecoder};
use crate::stream::extractor::{extract, is_mid_file};
use futures_util::StreamExt;
use tracing::{debug, warn};

/// What a turn produced. `text` and `files` are kept even when `error` is set.
#[derive(Debug)]
pub struct StreamOutcome {
    pub text: String,
    pub files: Vec<FileBlock>,
    pub error: Option<ProviderError>,
}

impl StreamOutcome {
    /// The response ended inside a file block.
    pub fn is_truncated(&self) -> bool {
        is_mid_file(&self.text)
    }
}

/// Stream one completion. Mid-stream errors stop consumption but never
/// discard what already arrived; nothing is retried here.
pub async fn run_turn<P, S>(provider: &P, messages: &[Message], sink: &mut S) -> StreamOutcome
where
    P: CompletionProvider + ?Sized,
    S: RenderSink + ?Sized,
{
    let mut decoder = StreamDecoder::new();
    let mut error = None;

    match provider.complete(messages).await {
        Ok(mut fragments) => {
            while let Some(item) = fragments.next().await {
                match item {
                    Ok(fragment) => {
                        for line in decoder.push(&fragment) {
                            sink.render(&line);
                        }
                    }
                    Err(e) => {
                        if decoder.is_mid_file() {
                            warn!("Stream interrupted inside a file block: {}", e);
                        } else {
                            warn!("Stream interrupted: {}", e);
                        }
                        error = Some(e);
                        break;
                    }
                }
            }
        }
        Err(e) => {
            warn!("Completion request failed: {}", e);
            error = Some(e);
        }
    }

    for line in decoder.finish() {
        sink.render(&line);
    }
    sink.finish();

    let text = decoder.into_text();
    let files = extract(&text);
    debug!(
        "Turn finished: {} chars, {} files, error: {}",
        text.len(),
        files.len(),
        error.is_some()
    );

    StreamOutcome { text, files, error }
}

#[cfg(test)]
pub(crate) mod fakes {
    use super::*;
    use crate::api::completion::FragmentStream;
    use async_trait::async_trait;
    use futures_util::stream;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Replays scripted fragments; `Err` entries become stream errors.
    pub struct ScriptedProvider {
        pub script: Vec<Result<String, String>>,
        pub fail_request: Option<String>,
        pub calls: AtomicUsize,
        pub seen: Mutex<Vec<Vec<Message>>>,
    }

    impl ScriptedProvider {
        pub fn new(fragments: &[&str]) -> Self {
            Self {
                script: fragments.iter().map(|f| Ok(f.to_string())).collect(),
                fail_request: None,
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        async fn complete(&self, messages: &[Message]) -> Result<FragmentStream, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(messages.to_vec());
            if let Some(message) = &self.fail_request {
                return Err(ProviderError::Http {
                    status: 401,
                    message: message.clone(),
                });
            }
            let items: Vec<Result<String, ProviderError>> = self
                .script
                .iter()
                .map(|item| item.clone().map_err(ProviderError::Transport))
                .collect();
            Ok(Box::pin(stream::iter(items)))
        }
    }
}
