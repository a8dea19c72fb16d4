//! Create-application dialog
//!
//! Headless controller for the "Create New Application" modal:
//! `Closed -> Open -> Submitting -> Closed` on success, back to `Open` on
//! failure. Rendering is left to the caller; this type owns the field values,
//! the guards, and the notifications.

use crate::api::AppsApi;
use crate::error::CoreError;
use crate::models::{App, CreateAppRequest};
use crate::notify::Notifier;
use regex::Regex;
use serde_json::Map;
use std::sync::{Arc, OnceLock};

pub const NAME_REQUIRED: &str = "App name is required";
pub const CREATE_FAILED: &str = "Failed to create app";
pub const NAME_HINT: &str = "Use lowercase letters, numbers, and hyphens only";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogState {
    Closed,
    Open,
    Submitting,
}

/// Why a submit did not start or finish
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitRejected {
    NotOpen,
    AlreadySubmitting,
    EmptyName,
    /// `finish_submit` called with no submit in flight
    NotSubmitting,
}

#[derive(Debug)]
pub enum SubmitOutcome {
    Created(App),
    Rejected(SubmitRejected),
    /// Message already shown to the user
    Failed(String),
}

type CreatedCallback = Box<dyn FnMut(&App) + Send>;

pub struct CreateAppDialog {
    state: DialogState,
    name: String,
    description: String,
    /// Trimmed name of the submit in flight
    pending_name: Option<String>,
    notifier: Arc<dyn Notifier>,
    on_created: Option<CreatedCallback>,
}

impl CreateAppDialog {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        CreateAppDialog {
            state: DialogState::Closed,
            name: String::new(),
            description: String::new(),
            pending_name: None,
            notifier,
            on_created: None,
        }
    }

    /// Invoke `callback` after each successful creation
    pub fn on_app_created(mut self, callback: impl FnMut(&App) + Send + 'static) -> Self {
        self.on_created = Some(Box::new(callback));
        self
    }

    pub fn state(&self) -> DialogState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state != DialogState::Closed
    }

    pub fn is_submitting(&self) -> bool {
        self.state == DialogState::Submitting
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Fields keep whatever a cancelled earlier session left behind
    pub fn open(&mut self) {
        if self.state == DialogState::Closed {
            self.state = DialogState::Open;
        }
    }

    /// Ignored while submitting (inputs disabled)
    pub fn set_name(&mut self, name: impl Into<String>) {
        if !self.is_submitting() {
            self.name = name.into();
        }
    }

    /// Ignored while submitting (inputs disabled)
    pub fn set_description(&mut self, description: impl Into<String>) {
        if !self.is_submitting() {
            self.description = description.into();
        }
    }

    /// Whether the submit control is enabled
    pub fn can_submit(&self) -> bool {
        self.state == DialogState::Open && !self.name.trim().is_empty()
    }

    /// Convention hint for names the server will likely reject
    pub fn name_hint(&self) -> Option<&'static str> {
        let name = self.name.trim();
        if name.is_empty() || name_pattern().is_match(name) {
            None
        } else {
            Some(NAME_HINT)
        }
    }

    /// Validate and enter `Submitting`, yielding the request to send
    pub fn begin_submit(&mut self) -> Result<CreateAppRequest, SubmitRejected> {
        match self.state {
            DialogState::Closed => return Err(SubmitRejected::NotOpen),
            DialogState::Submitting => return Err(SubmitRejected::AlreadySubmitting),
            DialogState::Open => {}
        }

        let name = self.name.trim();
        if name.is_empty() {
            self.notifier.error(NAME_REQUIRED);
            return Err(SubmitRejected::EmptyName);
        }

        let description = self.description.trim();
        let request = CreateAppRequest {
            name: name.to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
            metadata: Some(Map::new()),
        };

        self.pending_name = Some(request.name.clone());
        self.state = DialogState::Submitting;
        Ok(request)
    }

    /// Apply the result of the submit started by `begin_submit`
    ///
    /// Ignored unless a submit is in flight.
    pub fn finish_submit(&mut self, result: Result<App, CoreError>) -> SubmitOutcome {
        if self.state != DialogState::Submitting {
            tracing::debug!("finish_submit without a submit in flight");
            return SubmitOutcome::Rejected(SubmitRejected::NotSubmitting);
        }
        let name = self.pending_name.take().unwrap_or_default();

        match result {
            Ok(app) => {
                self.notifier
                    .success(&format!("App \"{}\" created successfully!", name));
                self.state = DialogState::Closed;
                self.clear_fields();
                if let Some(callback) = self.on_created.as_mut() {
                    callback(&app);
                }
                SubmitOutcome::Created(app)
            }
            Err(e) => {
                let message = e.user_message(CREATE_FAILED);
                self.notifier.error(&message);
                self.state = DialogState::Open;
                SubmitOutcome::Failed(message)
            }
        }
    }

    /// Full submit round trip against the API
    ///
    /// If this future is dropped before it completes the dialog stays in
    /// `Submitting`; the caller must then call `finish_submit` with the
    /// outcome (or an error) to unlock it.
    pub async fn submit(&mut self, api: &AppsApi) -> SubmitOutcome {
        let request = match self.begin_submit() {
            Ok(request) => request,
            Err(rejected) => return SubmitOutcome::Rejected(rejected),
        };
        let result = api.create_app(request).await;
        self.finish_submit(result)
    }

    /// Close via cancel/backdrop; ignored while submitting
    ///
    /// Returns whether the dialog is now closed.
    pub fn request_close(&mut self) -> bool {
        match self.state {
            DialogState::Submitting => false,
            DialogState::Open => {
                self.state = DialogState::Closed;
                self.clear_fields();
                true
            }
            DialogState::Closed => true,
        }
    }

    pub fn cancel(&mut self) -> bool {
        self.request_close()
    }

    fn clear_fields(&mut self) {
        self.name.clear();
        self.description.clear();
    }
}

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z0-9-]+$").expect("valid app name pattern"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::AppsStore;
    use crate::testing::{app_json, apps_page, FakeTransport, RecordingNotifier};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn dialog(notifier: &Arc<RecordingNotifier>) -> CreateAppDialog {
        CreateAppDialog::new(notifier.clone())
    }

    fn created_app(name: &str) -> App {
        serde_json::from_value(app_json("id-1", name)).unwrap()
    }

    #[test]
    fn test_empty_name_is_rejected_without_request() {
        let notifier = RecordingNotifier::new();
        let mut dialog = dialog(&notifier);
        dialog.open();
        dialog.set_name("   ");

        assert!(!dialog.can_submit());
        assert_eq!(dialog.begin_submit(), Err(SubmitRejected::EmptyName));
        assert_eq!(dialog.state(), DialogState::Open);
        assert_eq!(notifier.errors(), vec![NAME_REQUIRED.to_string()]);
    }

    #[test]
    fn test_request_is_trimmed() {
        let notifier = RecordingNotifier::new();
        let mut dialog = dialog(&notifier);
        dialog.open();
        dialog.set_name("  My-App  ");
        dialog.set_description("   ");

        let request = dialog.begin_submit().unwrap();
        assert_eq!(request.name, "My-App");
        assert_eq!(request.description, None);
        assert_eq!(request.metadata, Some(Map::new()));

        dialog.finish_submit(Err(CoreError::Transport("x".to_string())));
        dialog.set_description("  tracks things ");
        let request = dialog.begin_submit().unwrap();
        assert_eq!(request.description.as_deref(), Some("tracks things"));
    }

    #[test]
    fn test_submitting_locks_inputs_and_close() {
        let notifier = RecordingNotifier::new();
        let mut dialog = dialog(&notifier);
        dialog.open();
        dialog.set_name("tool");
        dialog.begin_submit().unwrap();

        assert!(!dialog.can_submit());
        assert_eq!(dialog.begin_submit(), Err(SubmitRejected::AlreadySubmitting));
        dialog.set_name("other");
        assert_eq!(dialog.name(), "tool");
        assert!(!dialog.request_close());
        assert!(!dialog.cancel());
        assert_eq!(dialog.state(), DialogState::Submitting);
    }

    #[test]
    fn test_success_closes_clears_and_calls_back() {
        let notifier = RecordingNotifier::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let mut dialog = dialog(&notifier).on_app_created(move |app| {
            assert_eq!(app.name, "tool");
            seen.fetch_add(1, Ordering::SeqCst);
        });
        dialog.open();
        dialog.set_name(" tool ");
        dialog.set_description("desc");
        dialog.begin_submit().unwrap();

        let outcome = dialog.finish_submit(Ok(created_app("tool")));

        assert!(matches!(outcome, SubmitOutcome::Created(_)));
        assert_eq!(dialog.state(), DialogState::Closed);
        assert_eq!(dialog.name(), "");
        assert_eq!(dialog.description(), "");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            notifier.successes(),
            vec!["App \"tool\" created successfully!".to_string()]
        );
    }

    #[test]
    fn test_failure_stays_open_and_editable() {
        let notifier = RecordingNotifier::new();
        let mut dialog = dialog(&notifier);
        dialog.open();
        dialog.set_name("Bad Name");
        dialog.begin_submit().unwrap();

        let outcome = dialog.finish_submit(Err(CoreError::Server {
            status: 400,
            detail: Some("App name must contain only lowercase letters, numbers, and hyphens".to_string()),
        }));

        assert!(matches!(outcome, SubmitOutcome::Failed(_)));
        assert_eq!(dialog.state(), DialogState::Open);
        assert_eq!(dialog.name(), "Bad Name");
        dialog.set_name("bad-name");
        assert_eq!(dialog.name(), "bad-name");
        assert_eq!(
            notifier.errors(),
            vec!["App name must contain only lowercase letters, numbers, and hyphens".to_string()]
        );
    }

    #[test]
    fn test_failure_without_message_uses_fallback() {
        let notifier = RecordingNotifier::new();
        let mut dialog = dialog(&notifier);
        dialog.open();
        dialog.set_name("x");
        dialog.begin_submit().unwrap();
        dialog.finish_submit(Err(CoreError::Transport(String::new())));
        assert_eq!(notifier.errors(), vec![CREATE_FAILED.to_string()]);
    }

    #[test]
    fn test_close_clears_fields() {
        let notifier = RecordingNotifier::new();
        let mut dialog = dialog(&notifier);
        dialog.set_name("draft");
        dialog.open();
        // Fields set before opening persist
        assert_eq!(dialog.name(), "draft");

        assert!(dialog.request_close());
        assert_eq!(dialog.state(), DialogState::Closed);
        assert_eq!(dialog.name(), "");
        assert_eq!(dialog.begin_submit(), Err(SubmitRejected::NotOpen));
    }

    #[test]
    fn test_stray_result_is_ignored() {
        let notifier = RecordingNotifier::new();
        let mut dialog = dialog(&notifier);

        let outcome = dialog.finish_submit(Err(CoreError::Transport("late".to_string())));
        assert!(matches!(
            outcome,
            SubmitOutcome::Rejected(SubmitRejected::NotSubmitting)
        ));
        assert_eq!(dialog.state(), DialogState::Closed);

        dialog.open();
        dialog.set_name("tool");
        let outcome = dialog.finish_submit(Ok(created_app("tool")));
        assert!(matches!(
            outcome,
            SubmitOutcome::Rejected(SubmitRejected::NotSubmitting)
        ));
        assert_eq!(dialog.state(), DialogState::Open);
        assert_eq!(dialog.name(), "tool");
        assert!(notifier.successes().is_empty());
        assert!(notifier.errors().is_empty());
    }

    #[test]
    fn test_dropped_submit_recovers_through_finish() {
        let notifier = RecordingNotifier::new();
        let mut dialog = dialog(&notifier);
        dialog.open();
        dialog.set_name("tool");
        dialog.begin_submit().unwrap();
        assert!(!dialog.request_close());

        dialog.finish_submit(Err(CoreError::Transport("cancelled".to_string())));
        assert_eq!(dialog.state(), DialogState::Open);
        assert!(dialog.request_close());
    }

    #[test]
    fn test_name_hint() {
        let notifier = RecordingNotifier::new();
        let mut dialog = dialog(&notifier);
        dialog.set_name("my-app-2");
        assert_eq!(dialog.name_hint(), None);
        dialog.set_name("My App");
        assert_eq!(dialog.name_hint(), Some(NAME_HINT));
        dialog.set_name("");
        assert_eq!(dialog.name_hint(), None);
    }

    #[tokio::test]
    async fn test_submit_round_trip_refreshes_list() {
        let notifier = RecordingNotifier::new();
        let fake = FakeTransport::new();
        let store = Arc::new(AppsStore::new());
        let api = AppsApi::new(fake.clone(), store.clone(), "alice");
        fake.reply(app_json("id-9", "My-App"));
        fake.reply(apps_page(vec![app_json("id-9", "My-App")], 1));

        let mut dialog = dialog(&notifier);
        dialog.open();
        dialog.set_name("  My-App  ");

        let outcome = dialog.submit(&api).await;

        assert!(matches!(outcome, SubmitOutcome::Created(ref app) if app.id == "id-9"));
        let requests = fake.requests();
        assert_eq!(requests[0].body, Some(json!({ "name": "My-App", "metadata": {} })));
        assert_eq!(requests.len(), 2);
        assert_eq!(store.snapshot().apps.data.unwrap().len(), 1);
        assert_eq!(dialog.name(), "");
        assert!(!dialog.is_open());
    }

    #[tokio::test]
    async fn test_submit_with_empty_name_sends_nothing() {
        let notifier = RecordingNotifier::new();
        let fake = FakeTransport::new();
        let api = AppsApi::new(fake.clone(), Arc::new(AppsStore::new()), "alice");

        let mut dialog = dialog(&notifier);
        dialog.open();
        let outcome = dialog.submit(&api).await;

        assert!(matches!(
            outcome,
            SubmitOutcome::Rejected(SubmitRejected::EmptyName)
        ));
        assert!(fake.requests().is_empty());
    }
}
