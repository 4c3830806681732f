//! State of the sign-up form and the async flows that drive it.
//!
//! `JoinForm` is plain data so every transition can be checked without a browser. The page keeps
//! it in an `RwSignal` and the flows reach it through `FormHandle`, never holding a borrow across
//! an `.await`.

use leptos::logging::{log, warn};
use leptos::prelude::*;

use crate::api::SantaApi;
use crate::error::JoinError;
use crate::model::{JoinResult, Notice};

/// How long a notice stays up before it dismisses itself.
pub const NOTICE_TTL_MS: u32 = 5_000;

const NOTICE_TITLE: &str = "Error";

/// Which card the page shows. Exactly one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Form,
    Assignment,
    Waiting,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JoinForm {
    pub name: String,
    pub loading: bool,
    pub participant_count: u32,
    pub result: Option<JoinResult>,
    pub validation_error: Option<String>,
    pub notice: Option<Notice>,
    next_notice_id: u64,
}

impl JoinForm {
    pub fn screen(&self) -> Screen {
        match &self.result {
            None => Screen::Form,
            Some(r) if r.is_assigned() => Screen::Assignment,
            Some(_) => Screen::Waiting,
        }
    }

    /// Updates the name as the user types. Editing clears a stale validation message.
    pub fn set_name(&mut self, name: String) {
        self.name = name;
        self.validation_error = None;
    }

    /// Starts a submit. Returns the trimmed name to send, or `None` if nothing should be sent:
    /// either a submit is already in flight or the name is blank (which sets the inline message).
    pub fn begin_submit(&mut self) -> Option<String> {
        if self.loading {
            return None;
        }
        let name = self.name.trim();
        if name.is_empty() {
            self.validation_error = Some(JoinError::Validation.to_string());
            return None;
        }
        let name = name.to_string();
        self.validation_error = None;
        self.loading = true;
        Some(name)
    }

    /// Records how a submit ended. `loading` is cleared on every path. Returns true when the join
    /// went through and the count should be refreshed.
    pub fn finish_submit(&mut self, outcome: Result<JoinResult, JoinError>) -> bool {
        self.loading = false;
        match outcome {
            Ok(result) => {
                self.result = Some(result);
                true
            }
            Err(JoinError::Validation) => {
                self.validation_error = Some(JoinError::Validation.to_string());
                false
            }
            Err(e) => {
                self.raise_notice(e.to_string());
                false
            }
        }
    }

    /// Back to an empty form. The count is refreshed separately.
    pub fn reset(&mut self) {
        self.result = None;
        self.name.clear();
        self.validation_error = None;
    }

    pub fn raise_notice(&mut self, message: String) -> u64 {
        self.next_notice_id += 1;
        let id = self.next_notice_id;
        self.notice = Some(Notice {
            id,
            title: NOTICE_TITLE.to_string(),
            message,
        });
        id
    }

    /// Clears the notice if it is still the one with `id`. Returns whether anything was cleared.
    pub fn dismiss_notice(&mut self, id: u64) -> bool {
        match &self.notice {
            Some(n) if n.id == id => {
                self.notice = None;
                true
            }
            _ => false,
        }
    }
}

/// Mutable access to a `JoinForm` that lives somewhere else. Returns `None` if the form is gone
/// (e.g. the page was unmounted while a request was in flight).
pub trait FormHandle {
    fn with_form<R>(&self, f: impl FnOnce(&mut JoinForm) -> R) -> Option<R>;
}

impl FormHandle for RwSignal<JoinForm> {
    fn with_form<R>(&self, f: impl FnOnce(&mut JoinForm) -> R) -> Option<R> {
        self.try_update(f)
    }
}

impl FormHandle for std::cell::RefCell<JoinForm> {
    fn with_form<R>(&self, f: impl FnOnce(&mut JoinForm) -> R) -> Option<R> {
        Some(f(&mut self.borrow_mut()))
    }
}

/// Fetches the participant count. Failures are logged and the last known count stays on screen.
pub async fn refresh_count<A, H>(api: &A, form: &H)
where
    A: SantaApi,
    H: FormHandle,
{
    match api.participant_count().await {
        Ok(count) => {
            form.with_form(|f| f.participant_count = count);
        }
        Err(e) => warn!("Could not refresh participant count: {} ({})", e, e.detail()),
    }
}

/// Submits the current name and, if the service accepted it, refreshes the count.
pub async fn submit<A, H>(api: &A, form: &H)
where
    A: SantaApi,
    H: FormHandle,
{
    let Some(name) = form.with_form(JoinForm::begin_submit).flatten() else {
        return;
    };

    let outcome = api.join(&name).await;
    match &outcome {
        Ok(result) if result.is_assigned() => log!("{} joined and has an assignment", name),
        Ok(_) => log!("{} joined, waiting for more participants", name),
        Err(e) => warn!("Join failed for {}: {}", name, e.detail()),
    }

    let joined = form.with_form(|f| f.finish_submit(outcome)).unwrap_or(false);
    if joined {
        refresh_count(api, form).await;
    }
}

/// Leaves the result card and goes back to an empty form.
pub async fn reset<A, H>(api: &A, form: &H)
where
    A: SantaApi,
    H: FormHandle,
{
    form.with_form(JoinForm::reset);
    refresh_count(api, form).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    /// Scripted service: returns the queued replies and records what it was asked.
    #[derive(Default)]
    struct MockApi {
        count: RefCell<Vec<Result<u32, JoinError>>>,
        join: RefCell<Vec<Result<JoinResult, JoinError>>>,
        count_calls: Cell<usize>,
        joined_names: RefCell<Vec<String>>,
    }

    impl MockApi {
        fn with_counts(self, counts: Vec<Result<u32, JoinError>>) -> Self {
            *self.count.borrow_mut() = counts;
            self
        }

        fn with_join(self, reply: Result<JoinResult, JoinError>) -> Self {
            self.join.borrow_mut().push(reply);
            self
        }
    }

    impl SantaApi for MockApi {
        async fn participant_count(&self) -> Result<u32, JoinError> {
            self.count_calls.set(self.count_calls.get() + 1);
            let mut queue = self.count.borrow_mut();
            if queue.is_empty() {
                return Err(JoinError::network("no scripted count"));
            }
            queue.remove(0)
        }

        async fn join(&self, name: &str) -> Result<JoinResult, JoinError> {
            self.joined_names.borrow_mut().push(name.to_string());
            self.join
                .borrow_mut()
                .pop()
                .unwrap_or_else(|| Err(JoinError::network("no scripted join")))
        }
    }

    fn anna(giver_to: Option<&str>) -> JoinResult {
        JoinResult {
            participant_name: "Anna".to_string(),
            giver_to: giver_to.map(str::to_string),
            participant_id: None,
        }
    }

    fn form_with_name(name: &str) -> RefCell<JoinForm> {
        let mut form = JoinForm::default();
        form.set_name(name.to_string());
        RefCell::new(form)
    }

    #[tokio::test]
    async fn test_blank_name_sends_nothing() {
        for name in ["", "   ", "\t\n"] {
            let api = MockApi::default();
            let form = form_with_name(name);

            submit(&api, &form).await;

            let form = form.borrow();
            assert!(api.joined_names.borrow().is_empty());
            assert_eq!(api.count_calls.get(), 0);
            assert_eq!(
                form.validation_error.as_deref(),
                Some("Please enter your name")
            );
            assert!(!form.loading);
            assert_eq!(form.screen(), Screen::Form);
        }
    }

    #[tokio::test]
    async fn test_join_with_assignment() {
        let api = MockApi::default()
            .with_join(Ok(anna(Some("Boris"))))
            .with_counts(vec![Ok(2)]);
        let form = form_with_name("  Anna ");

        submit(&api, &form).await;

        let form = form.borrow();
        // The name goes out trimmed.
        assert_eq!(*api.joined_names.borrow(), vec!["Anna".to_string()]);
        assert!(!form.loading);
        assert_eq!(form.screen(), Screen::Assignment);
        let result = form.result.as_ref().unwrap();
        assert_eq!(result.participant_name, "Anna");
        assert_eq!(result.giver_to.as_deref(), Some("Boris"));
        // Count re-fetched after the join.
        assert_eq!(api.count_calls.get(), 1);
        assert_eq!(form.participant_count, 2);
        assert!(form.notice.is_none());
    }

    #[tokio::test]
    async fn test_join_while_waiting() {
        let api = MockApi::default()
            .with_join(Ok(anna(None)))
            .with_counts(vec![Ok(1)]);
        let form = form_with_name("Anna");

        submit(&api, &form).await;

        let form = form.borrow();
        assert!(!form.loading);
        assert_eq!(form.screen(), Screen::Waiting);
        assert_eq!(form.participant_count, 1);
    }

    #[tokio::test]
    async fn test_service_error_shows_notice() {
        let api = MockApi::default()
            .with_join(Err(JoinError::Service("Name is required".to_string())));
        let form = form_with_name("Anna");

        submit(&api, &form).await;

        let form = form.borrow();
        assert!(!form.loading);
        assert!(form.result.is_none());
        assert_eq!(form.screen(), Screen::Form);
        assert_eq!(form.notice.as_ref().unwrap().message, "Name is required");
        // The name stays so the user can retry.
        assert_eq!(form.name, "Anna");
        assert_eq!(api.count_calls.get(), 0);
    }

    #[tokio::test]
    async fn test_network_error_shows_generic_notice() {
        let api = MockApi::default().with_join(Err(JoinError::network("fetch failed")));
        let form = form_with_name("Anna");

        submit(&api, &form).await;

        let form = form.borrow();
        assert!(!form.loading);
        assert!(form.result.is_none());
        let notice = form.notice.as_ref().unwrap();
        assert_eq!(notice.title, "Error");
        assert!(notice.message.contains("Could not reach"));
        assert!(!notice.message.contains("fetch failed"));
    }

    #[tokio::test]
    async fn test_no_second_submit_while_loading() {
        let api = MockApi::default().with_join(Ok(anna(None)));
        let form = form_with_name("Anna");
        form.borrow_mut().loading = true;

        submit(&api, &form).await;

        assert!(api.joined_names.borrow().is_empty());
        assert!(form.borrow().loading);
        assert!(form.borrow().validation_error.is_none());
    }

    #[tokio::test]
    async fn test_reset_returns_to_empty_form() {
        let api = MockApi::default()
            .with_join(Ok(anna(Some("Boris"))))
            .with_counts(vec![Ok(2), Ok(3)]);
        let form = form_with_name("Anna");

        submit(&api, &form).await;
        assert_eq!(form.borrow().screen(), Screen::Assignment);

        reset(&api, &form).await;

        let form = form.borrow();
        assert_eq!(form.screen(), Screen::Form);
        assert!(form.name.is_empty());
        assert!(form.result.is_none());
        assert_eq!(form.participant_count, 3);
        assert_eq!(api.count_calls.get(), 2);
    }

    #[tokio::test]
    async fn test_reset_from_plain_form() {
        let api = MockApi::default().with_counts(vec![Ok(4)]);
        let form = form_with_name("half typed");
        form.borrow_mut().validation_error = Some("stale".to_string());

        reset(&api, &form).await;

        let form = form.borrow();
        assert_eq!(form.screen(), Screen::Form);
        assert!(form.name.is_empty());
        assert!(form.validation_error.is_none());
        assert_eq!(form.participant_count, 4);
    }

    #[tokio::test]
    async fn test_refresh_count() {
        let api = MockApi::default().with_counts(vec![
            Ok(3),
            Err(JoinError::network("offline")),
            Err(JoinError::Service("Database connection not configured".to_string())),
        ]);
        let form = RefCell::new(JoinForm::default());

        refresh_count(&api, &form).await;
        assert_eq!(form.borrow().participant_count, 3);
        assert_eq!(form.borrow().participant_count.to_string(), "3");

        // Failures keep the last count and stay silent.
        refresh_count(&api, &form).await;
        refresh_count(&api, &form).await;
        assert_eq!(form.borrow().participant_count, 3);
        assert!(form.borrow().notice.is_none());
    }

    #[test]
    fn test_begin_submit_clears_validation() {
        let mut form = JoinForm::default();
        assert_eq!(form.begin_submit(), None);
        assert!(form.validation_error.is_some());

        // Typing clears the message.
        form.set_name("B".to_string());
        assert!(form.validation_error.is_none());

        form.validation_error = Some("stale".to_string());
        assert_eq!(form.begin_submit(), Some("B".to_string()));
        assert!(form.validation_error.is_none());
        assert!(form.loading);
    }

    #[test]
    fn test_dismiss_notice() {
        let mut form = JoinForm::default();
        let first = form.raise_notice("first".to_string());
        let second = form.raise_notice("second".to_string());
        assert!(second > first);

        // The timer for the first notice fires late and must not clear the second.
        assert!(!form.dismiss_notice(first));
        assert_eq!(form.notice.as_ref().unwrap().message, "second");

        assert!(form.dismiss_notice(second));
        assert!(form.notice.is_none());
        assert!(!form.dismiss_notice(second));
    }
}
