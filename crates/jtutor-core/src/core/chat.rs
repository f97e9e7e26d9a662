//! Chat assistant state.
//!
//! The message list only grows; the one exception is the streaming reply,
//! whose text is filled in place as fragments arrive. `clear` swaps in a new
//! list and forgets the model-side conversation.

use std::fmt;
use std::sync::Arc;

use crate::core::session::{
    Applied, Generation, StreamingSession, UpdateRx, UpdateTx, create_update_channel,
    spawn_fragment_pump,
};
use crate::providers::{GenerateRequest, GenerativeModel, Turn};
use crate::render::{self, RenderBlock};

pub const WELCOME_MESSAGE: &str = "Hi! I'm **JavaBot**. \n\nI can help you with:\n- Deep dives into Java internals (Stack vs Heap)\n- Debugging your code\n- Explaining complex topics\n\nWhat's on your mind?";

pub const CLEARED_MESSAGE: &str =
    "Chat cleared! Ready for a fresh start. What would you like to learn?";

/// Appended as its own assistant message when a reply fails.
pub const CONNECTION_ERROR_MESSAGE: &str =
    "> **Error**: I couldn't connect to the server. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: String,
    pub role: ChatRole,
    pub text: String,
    pub streaming: bool,
}

impl ChatMessage {
    fn new(role: ChatRole, text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            text: text.into(),
            streaming: false,
        }
    }

    pub fn blocks(&self) -> Vec<RenderBlock> {
        render::render(&self.text)
    }
}

/// Why `send` refused a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendRejected {
    Blank,
    /// A reply is still streaming.
    Busy,
}

impl fmt::Display for SendRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendRejected::Blank => write!(f, "message is empty"),
            SendRejected::Busy => write!(f, "still answering the previous message"),
        }
    }
}

impl std::error::Error for SendRejected {}

pub struct ChatSession<M> {
    model: Arc<M>,
    system: String,
    messages: Vec<ChatMessage>,
    /// Conversation as the model sees it: completed exchanges with a
    /// non-empty reply only.
    history: Vec<Turn>,
    /// User text of the exchange currently streaming.
    pending: Option<String>,
    session: StreamingSession<String>,
    tx: UpdateTx,
    rx: UpdateRx,
}

impl<M: GenerativeModel> ChatSession<M> {
    pub fn new(model: Arc<M>, system: impl Into<String>) -> Self {
        let (tx, rx) = create_update_channel();
        Self {
            model,
            system: system.into(),
            messages: vec![ChatMessage::new(ChatRole::Assistant, WELCOME_MESSAGE)],
            history: Vec::new(),
            pending: None,
            session: StreamingSession::uncached(),
            tx,
            rx,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_streaming(&self) -> bool {
        self.session.is_streaming()
    }

    /// Sends `text` and starts streaming the reply.
    ///
    /// # Errors
    /// Rejects blank input and input while a reply is streaming.
    pub fn send(&mut self, text: &str) -> Result<Generation, SendRejected> {
        if text.trim().is_empty() {
            return Err(SendRejected::Blank);
        }
        if self.session.is_streaming() {
            return Err(SendRejected::Busy);
        }

        let mut placeholder = ChatMessage::new(ChatRole::Assistant, "");
        placeholder.streaming = true;
        let generation = self.session.start_fresh(placeholder.id.clone());
        self.messages.push(ChatMessage::new(ChatRole::User, text));
        self.messages.push(placeholder);

        let mut turns = self.history.clone();
        turns.push(Turn::user(text));
        let request = GenerateRequest {
            system: Some(self.system.clone()),
            turns,
            response_schema: None,
        };

        self.pending = Some(text.to_string());
        tracing::debug!(generation, history = self.history.len(), "chat reply started");
        spawn_fragment_pump(
            Arc::clone(&self.model),
            request,
            generation,
            self.session.watch_generation(),
            self.tx.clone(),
        );
        Ok(generation)
    }

    /// Waits for the next pump update and applies it to the message list.
    pub async fn next_update(&mut self) -> Applied {
        let Some(update) = self.rx.recv().await else {
            return Applied::Stale;
        };
        let applied = self.session.apply(update);

        match &applied {
            Applied::Stale => {}
            Applied::Fragment => {
                let text = self.session.text().to_string();
                if let Some(reply) = self.reply_mut() {
                    reply.text = text;
                }
            }
            Applied::Completed => {
                let text = self.session.text().to_string();
                if let Some(reply) = self.reply_mut() {
                    reply.streaming = false;
                }
                match self.pending.take() {
                    Some(user) if !text.trim().is_empty() => {
                        self.history.push(Turn::user(user));
                        self.history.push(Turn::model(text));
                    }
                    Some(_) => tracing::warn!("chat reply was empty; exchange left out of history"),
                    None => {}
                }
            }
            Applied::Failed(_) => {
                if let Some(reply) = self.reply_mut() {
                    reply.streaming = false;
                }
                self.pending = None;
                self.messages.push(ChatMessage::new(
                    ChatRole::Assistant,
                    CONNECTION_ERROR_MESSAGE,
                ));
            }
        }
        applied
    }

    /// Applies updates until the current reply stops streaming.
    pub async fn wait_idle(&mut self) {
        while self.session.is_streaming() {
            self.next_update().await;
        }
    }

    /// Starts over: a reset notice replaces the messages and the model
    /// context is dropped. Fragments of an in-flight reply are ignored.
    pub fn clear(&mut self) {
        self.session.supersede();
        self.messages = vec![ChatMessage::new(ChatRole::Assistant, CLEARED_MESSAGE)];
        self.history.clear();
        self.pending = None;
        tracing::debug!("chat cleared");
    }

    fn reply_mut(&mut self) -> Option<&mut ChatMessage> {
        let id = self.session.key()?.clone();
        self.messages.iter_mut().rev().find(|message| message.id == id)
    }
}
