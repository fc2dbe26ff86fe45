use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    error::{AppError, AppResult},
    models::ChatTurn,
    services::RecommendationService,
};

pub const EXCHANGE_FAILED_MESSAGE: &str = "Failed to get response. Please try again.";

/// State of the current request cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ExchangeState {
    #[default]
    Idle,
    Sending,
    AwaitingNext,
    Failed {
        error: String,
    },
}

#[derive(Debug, Default)]
struct Conversation {
    open: bool,
    turns: Vec<ChatTurn>,
    draft: String,
    state: ExchangeState,
    /// Bumped on close so a reply for a discarded conversation is dropped
    generation: u64,
}

/// Conversational assistant panel
///
/// At most one exchange is in flight. The lock is released while the
/// remote call runs, so the draft stays editable during `Sending`.
pub struct ChatPanel {
    remote: Arc<dyn RecommendationService>,
    conversation: Mutex<Conversation>,
}

impl ChatPanel {
    pub fn new(remote: Arc<dyn RecommendationService>) -> Self {
        Self {
            remote,
            conversation: Mutex::new(Conversation::default()),
        }
    }

    pub async fn open(&self) {
        self.conversation.lock().await.open = true;
    }

    /// Closes the panel and throws the conversation away
    pub async fn close(&self) {
        let mut conversation = self.conversation.lock().await;
        let discarded = conversation.turns.len();
        let generation = conversation.generation + 1;
        *conversation = Conversation {
            generation,
            ..Conversation::default()
        };
        tracing::debug!(discarded, "Chat panel closed");
    }

    pub async fn is_open(&self) -> bool {
        self.conversation.lock().await.open
    }

    pub async fn turns(&self) -> Vec<ChatTurn> {
        self.conversation.lock().await.turns.clone()
    }

    pub async fn state(&self) -> ExchangeState {
        self.conversation.lock().await.state.clone()
    }

    pub async fn set_draft(&self, text: impl Into<String>) {
        self.conversation.lock().await.draft = text.into();
    }

    pub async fn draft(&self) -> String {
        self.conversation.lock().await.draft.clone()
    }

    /// Submits the draft as a new user turn
    ///
    /// Returns the appended assistant turn, or `None` for a blank draft.
    /// Fails with `InFlight` while another exchange is pending, leaving the
    /// draft in place, and with `InvalidState` while the panel is closed.
    pub async fn send(&self) -> AppResult<Option<ChatTurn>> {
        let (text, generation) = {
            let mut conversation = self.conversation.lock().await;
            if !conversation.open {
                return Err(AppError::InvalidState("Chat panel is closed".to_string()));
            }
            if conversation.state == ExchangeState::Sending {
                return Err(AppError::InFlight(
                    "Wait for the current reply before sending".to_string(),
                ));
            }

            let text = conversation.draft.trim().to_string();
            if text.is_empty() {
                return Ok(None);
            }

            conversation.draft.clear();
            conversation.turns.push(ChatTurn::user(text.clone()));
            conversation.state = ExchangeState::Sending;
            (text, conversation.generation)
        };

        self.dispatch(text, generation).await.map(Some)
    }

    /// Resends the most recent user turn after a failure
    ///
    /// The text goes out exactly as it was first sent and no new user turn is
    /// appended.
    pub async fn retry_last(&self) -> AppResult<ChatTurn> {
        let (text, generation) = {
            let mut conversation = self.conversation.lock().await;
            if !conversation.open {
                return Err(AppError::InvalidState("Chat panel is closed".to_string()));
            }
            if !matches!(conversation.state, ExchangeState::Failed { .. }) {
                return Err(AppError::InvalidState(
                    "Nothing to retry".to_string(),
                ));
            }

            let text = conversation
                .turns
                .iter()
                .rev()
                .find(|turn| turn.is_user())
                .map(|turn| turn.text.clone())
                .ok_or_else(|| AppError::InvalidState("No message to retry".to_string()))?;

            conversation.state = ExchangeState::Sending;
            (text, conversation.generation)
        };

        tracing::info!("Retrying last chat message");
        self.dispatch(text, generation).await
    }

    async fn dispatch(&self, text: String, generation: u64) -> AppResult<ChatTurn> {
        let result = self.remote.chat(&text).await;

        let mut conversation = self.conversation.lock().await;
        if conversation.generation != generation {
            tracing::debug!("Dropping reply for a closed conversation");
            return Err(AppError::InvalidState("Conversation was closed".to_string()));
        }

        match result {
            Ok(reply) => {
                let turn = ChatTurn::assistant(sanitize_reply(&reply));
                conversation.turns.push(turn.clone());
                conversation.state = ExchangeState::AwaitingNext;
                tracing::debug!(turns = conversation.turns.len(), "Assistant replied");
                Ok(turn)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Chat exchange failed");
                conversation.state = ExchangeState::Failed {
                    error: EXCHANGE_FAILED_MESSAGE.to_string(),
                };
                Err(AppError::Exchange(EXCHANGE_FAILED_MESSAGE.to_string()))
            }
        }
    }
}

/// Strips markup and control characters from an assistant reply
///
/// Removes markdown emphasis (`* _ ~` and backticks), HTML tags, and control
/// characters other than newline and tab. A `<` only opens a tag when a
/// matching `>` closes it on the same line; otherwise it is kept as text.
pub fn sanitize_reply(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(c) = rest.chars().next() {
        if c == '<' {
            if let Some(len) = tag_len(rest) {
                rest = &rest[len..];
                continue;
            }
        }
        rest = &rest[c.len_utf8()..];

        match c {
            '*' | '_' | '~' | '`' => {}
            '\n' | '\t' => out.push(c),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }

    out.trim().to_string()
}

/// Byte length of an HTML-like tag at the start of `s`, including both brackets
fn tag_len(s: &str) -> Option<usize> {
    let body = s.strip_prefix('<')?;
    let first = body.chars().next()?;
    if !(first.is_ascii_alphabetic() || first == '/' || first == '!') {
        return None;
    }

    let end = body.find(|c: char| c == '>' || c == '<' || c == '\n')?;
    body[end..].starts_with('>').then_some(end + 2)
}
