//! Linear collection of optional metadata fields before delivery.
//!
//! After a link arrives the user may supply a value for each of a fixed list of
//! fields, skip one, skip the rest, or cancel. [`ConversationStepper`] is the
//! state machine for one chat; [`SessionStore`] keeps one per session id.
//!
//! ```text
//! Idle --url--> AwaitingField(0) --value|skip--> ... --> Complete
//!  ^                  |                                     ^
//!  +------cancel------+-------------skip all----------------+
//! ```

mod store;

pub use store::SessionStore;

use chrono::NaiveDate;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

/// Fields asked for by default, in order.
pub const DEFAULT_FIELDS: [&str; 4] = ["title", "artist", "album", "comment"];

/// Key of the derived date field added on completion.
pub const DATE_FIELD: &str = "date";

/// Stepper state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    /// Waiting for a link.
    Idle,
    /// Waiting for the value of the field at this index.
    AwaitingField(usize),
    /// All fields answered or skipped.
    Complete,
}

/// One user reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepInput {
    /// A link starting a new collection.
    Url(String),
    /// A value for the current field.
    Value(String),
    /// Leave the current field empty.
    Skip,
    /// Leave every remaining field empty.
    SkipAll,
    /// Drop everything collected.
    Cancel,
}

impl StepInput {
    /// Interprets a free-text reply to a field prompt.
    ///
    /// `/skip`, `/pular` and a lone `-` skip; `/skipall` and `/pulartudo` skip
    /// the rest; `/cancel` and `/cancelar` cancel. Anything else is a value.
    #[must_use]
    pub fn from_reply(text: &str) -> Self {
        let trimmed = text.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "/skip" | "/pular" | "-" => Self::Skip,
            "/skipall" | "/pulartudo" => Self::SkipAll,
            "/cancel" | "/cancelar" => Self::Cancel,
            _ => Self::Value(trimmed.to_string()),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Url(_) => "url",
            Self::Value(_) => "value",
            Self::Skip => "skip",
            Self::SkipAll => "skip all",
            Self::Cancel => "cancel",
        }
    }
}

/// Errors raised by the stepper and the session store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
    /// The input is not valid in the current state.
    #[error("unexpected {input} while {state:?}")]
    UnexpectedInput {
        /// State the stepper was in.
        state: StepState,
        /// Kind of input received.
        input: &'static str,
    },

    /// The session has not completed yet.
    #[error("collection not complete ({state:?})")]
    NotComplete {
        /// State the stepper was in.
        state: StepState,
    },

    /// No session exists for the id.
    #[error("no session {id}")]
    NoSession {
        /// The session id.
        id: String,
    },
}

/// Collected fields, ready for the metadata rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedForm {
    /// Link the collection started with.
    pub url: String,
    /// Answered fields in prompt order; skipped fields are absent.
    pub fields: Vec<(String, String)>,
    /// Completion date, `YYYY-MM-DD`.
    pub date: String,
}

impl CompletedForm {
    /// Looks up a field value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    /// The tag mapping: answered fields in order, then the date field.
    #[must_use]
    pub fn tags(&self) -> Map<String, Value> {
        let mut tags: Map<String, Value> = self
            .fields
            .iter()
            .map(|(name, value)| (name.clone(), Value::String(value.clone())))
            .collect();
        tags.insert(DATE_FIELD.to_string(), Value::String(self.date.clone()));
        tags
    }
}

/// State machine for one chat.
#[derive(Debug, Clone)]
pub struct ConversationStepper {
    fields: Vec<String>,
    state: StepState,
    url: Option<String>,
    values: Vec<(String, String)>,
}

impl Default for ConversationStepper {
    fn default() -> Self {
        Self::new(DEFAULT_FIELDS)
    }
}

impl ConversationStepper {
    /// Creates an idle stepper over `fields`.
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            state: StepState::Idle,
            url: None,
            values: Vec::new(),
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> StepState {
        self.state
    }

    /// Link being collected for, if any.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Name of the field awaiting a value.
    #[must_use]
    pub fn current_field(&self) -> Option<&str> {
        match self.state {
            StepState::AwaitingField(index) => self.fields.get(index).map(String::as_str),
            _ => None,
        }
    }

    /// Values collected so far.
    #[must_use]
    pub fn values(&self) -> &[(String, String)] {
        &self.values
    }

    /// Applies one input and returns the new state.
    ///
    /// # Errors
    ///
    /// [`StepError::UnexpectedInput`] when the input does not apply to the
    /// current state; the state is left unchanged.
    pub fn advance(&mut self, input: StepInput) -> Result<StepState, StepError> {
        let next = match (self.state, input) {
            (_, StepInput::Cancel) => {
                self.reset();
                StepState::Idle
            }
            (StepState::Idle, StepInput::Url(url)) => {
                self.url = Some(url);
                self.values.clear();
                self.field_state(0)
            }
            (StepState::AwaitingField(index), StepInput::Value(value)) => {
                let value = value.trim();
                if !value.is_empty()
                    && let Some(name) = self.fields.get(index)
                {
                    self.values.push((name.clone(), value.to_string()));
                }
                self.field_state(index + 1)
            }
            (StepState::AwaitingField(index), StepInput::Skip) => self.field_state(index + 1),
            (StepState::AwaitingField(_), StepInput::SkipAll) => StepState::Complete,
            (state, input) => {
                return Err(StepError::UnexpectedInput {
                    state,
                    input: input.kind(),
                });
            }
        };
        debug!(from = ?self.state, to = ?next, "conversation step");
        self.state = next;
        Ok(next)
    }

    fn field_state(&self, index: usize) -> StepState {
        if index < self.fields.len() {
            StepState::AwaitingField(index)
        } else {
            StepState::Complete
        }
    }

    /// Hands out the collected form dated `date` and returns to `Idle`.
    ///
    /// # Errors
    ///
    /// [`StepError::NotComplete`] unless the stepper is `Complete`.
    pub fn finish(&mut self, date: NaiveDate) -> Result<CompletedForm, StepError> {
        if self.state != StepState::Complete {
            return Err(StepError::NotComplete { state: self.state });
        }
        let form = CompletedForm {
            url: self.url.take().unwrap_or_default(),
            fields: std::mem::take(&mut self.values),
            date: date.format("%Y-%m-%d").to_string(),
        };
        self.reset();
        Ok(form)
    }

    /// [`finish`](Self::finish) with today's local date.
    ///
    /// # Errors
    ///
    /// Same as [`finish`](Self::finish).
    pub fn finish_today(&mut self) -> Result<CompletedForm, StepError> {
        self.finish(chrono::Local::now().date_naive())
    }

    /// Drops everything and returns to `Idle`.
    pub fn reset(&mut self) {
        self.state = StepState::Idle;
        self.url = None;
        self.values.clear();
    }
}
