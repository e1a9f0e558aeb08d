//! Per-session steppers keyed by session id.

use std::fmt::Display;
use std::hash::Hash;

use chrono::NaiveDate;
use dashmap::DashMap;
use tracing::debug;

use super::{CompletedForm, ConversationStepper, StepError, StepInput, StepState};

/// One [`ConversationStepper`] per session, safe to share across tasks.
#[derive(Debug)]
pub struct SessionStore<K: Eq + Hash> {
    fields: Vec<String>,
    sessions: DashMap<K, ConversationStepper>,
}

impl<K> SessionStore<K>
where
    K: Eq + Hash + Clone + Display,
{
    /// Creates an empty store whose sessions ask for `fields`.
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            sessions: DashMap::new(),
        }
    }

    /// Starts (or restarts) the session `id` for `url`.
    ///
    /// # Errors
    ///
    /// Never fails for a fresh stepper; the `Result` mirrors [`advance`](Self::advance).
    pub fn create(&self, id: K, url: impl Into<String>) -> Result<StepState, StepError> {
        let mut stepper = ConversationStepper::new(self.fields.iter().cloned());
        let state = stepper.advance(StepInput::Url(url.into()))?;
        debug!(session = %id, ?state, "session created");
        self.sessions.insert(id, stepper);
        Ok(state)
    }

    /// Applies an input to the session `id`.
    ///
    /// # Errors
    ///
    /// [`StepError::NoSession`] for an unknown id, or the stepper's own error.
    pub fn advance(&self, id: &K, input: StepInput) -> Result<StepState, StepError> {
        let mut stepper = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| StepError::NoSession { id: id.to_string() })?;
        stepper.advance(input)
    }

    /// Current state of the session, if it exists.
    #[must_use]
    pub fn state(&self, id: &K) -> Option<StepState> {
        self.sessions.get(id).map(|stepper| stepper.state())
    }

    /// Field awaiting a value in the session, if any.
    #[must_use]
    pub fn current_field(&self, id: &K) -> Option<String> {
        self.sessions
            .get(id)
            .and_then(|stepper| stepper.current_field().map(ToString::to_string))
    }

    /// Removes the session. Returns whether it existed.
    pub fn clear(&self, id: &K) -> bool {
        self.sessions.remove(id).is_some()
    }

    /// Removes a completed session and returns its form.
    ///
    /// # Errors
    ///
    /// [`StepError::NoSession`] for an unknown id and
    /// [`StepError::NotComplete`] (session kept) when still collecting.
    pub fn take_completed(&self, id: &K, date: NaiveDate) -> Result<CompletedForm, StepError> {
        let form = {
            let mut stepper = self
                .sessions
                .get_mut(id)
                .ok_or_else(|| StepError::NoSession { id: id.to_string() })?;
            stepper.finish(date)?
        };
        self.sessions.remove(id);
        Ok(form)
    }

    /// Number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// True when no session is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn store() -> SessionStore<i64> {
        SessionStore::new(["title", "artist"])
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 2).unwrap()
    }

    #[test]
    fn test_sessions_are_independent() {
        let store = store();
        store.create(1, "https://a").unwrap();
        store.create(2, "https://b").unwrap();

        store.advance(&1, StepInput::Value("One".to_string())).unwrap();
        assert_eq!(store.state(&1), Some(StepState::AwaitingField(1)));
        assert_eq!(store.state(&2), Some(StepState::AwaitingField(0)));
        assert_eq!(store.current_field(&2).as_deref(), Some("title"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_take_completed_removes_session() {
        let store = store();
        store.create(7, "https://pin.it/x").unwrap();
        store.advance(&7, StepInput::Value("T".to_string())).unwrap();
        assert!(matches!(
            store.take_completed(&7, date()),
            Err(StepError::NotComplete { .. })
        ));
        assert_eq!(store.len(), 1, "incomplete session is kept");

        store.advance(&7, StepInput::Skip).unwrap();
        let form = store.take_completed(&7, date()).unwrap();
        assert_eq!(form.url, "https://pin.it/x");
        assert_eq!(form.get("title"), Some("T"));
        assert_eq!(form.date, "2026-01-02");
        assert!(store.is_empty());
    }

    #[test]
    fn test_unknown_session() {
        let store = store();
        assert_eq!(
            store.advance(&9, StepInput::Skip).unwrap_err(),
            StepError::NoSession {
                id: "9".to_string()
            }
        );
        assert!(!store.clear(&9));
    }

    #[test]
    fn test_create_restarts_existing_session() {
        let store = store();
        store.create(1, "https://a").unwrap();
        store.advance(&1, StepInput::Value("old".to_string())).unwrap();
        store.create(1, "https://b").unwrap();
        assert_eq!(store.state(&1), Some(StepState::AwaitingField(0)));
        assert!(store.clear(&1));
    }
}
