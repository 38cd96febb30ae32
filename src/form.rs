// Registration form controller: one input record per mode, the image
// preview, the error banner and the in-flight flag. All methods take
// `&self` so a form shared between callers still lets only one
// submission through at a time.

use crate::api::Backend;
use crate::models::{
    CompanyRegistration, CompanyRegistrationInput, Field, IndividualRegistration,
    IndividualRegistrationInput, LoginRedirect, Mode,
};
use crate::preview::{ImageFile, ImagePreview};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;

pub const PASSWORD_MISMATCH: &str = "Passwords do not match";
pub const MISSING_REQUIRED: &str = "Please fill in all required fields";
pub const INDIVIDUAL_SUCCESS: &str = "Registration successful! Please log in.";
pub const COMPANY_SUCCESS: &str = "Company workspace created! Please log in as admin.";

/// Rejected field edits. These never touch the banner.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("{} is not part of the {mode:?} form", .field.label())]
    WrongMode { field: Field, mode: Mode },

    #[error(transparent)]
    InvalidOption(#[from] crate::models::UnknownOption),
}

/// How a call to `submit` ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Another submission was still running; nothing happened.
    Busy,
    /// Validation or a backend call failed. The message is also in the banner.
    Failed(String),
    /// The account exists; go to the login view.
    Completed(LoginRedirect),
}

#[derive(Debug, Default)]
struct FormState {
    mode: Mode,
    individual: IndividualRegistrationInput,
    company: CompanyRegistrationInput,
    preview: Option<ImagePreview>,
    error: Option<String>,
}

impl FormState {
    fn active_file(&self) -> Option<&ImageFile> {
        match self.mode {
            Mode::Individual => self.individual.profile_picture.as_ref(),
            Mode::Company => self.company.logo.as_ref(),
        }
    }

    fn active_file_mut(&mut self) -> &mut Option<ImageFile> {
        match self.mode {
            Mode::Individual => &mut self.individual.profile_picture,
            Mode::Company => &mut self.company.logo,
        }
    }
}

// Snapshot of the active record, taken so no lock is held across network calls.
enum Pending {
    Individual(IndividualRegistrationInput),
    Company(CompanyRegistrationInput),
}

// Clears the in-flight flag however the submission ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Debug, Default)]
pub struct RegistrationForm {
    state: Mutex<FormState>,
    in_flight: AtomicBool,
}

impl RegistrationForm {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FormState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn mode(&self) -> Mode {
        self.state().mode
    }

    pub fn error(&self) -> Option<String> {
        self.state().error.clone()
    }

    pub fn preview(&self) -> Option<ImagePreview> {
        self.state().preview.clone()
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn individual(&self) -> IndividualRegistrationInput {
        self.state().individual.clone()
    }

    pub fn company(&self) -> CompanyRegistrationInput {
        self.state().company.clone()
    }

    /// Image in the active record, if one is selected.
    pub fn selected_file(&self) -> Option<ImageFile> {
        self.state().active_file().cloned()
    }

    /// Switch schema. Clears the banner, the preview and the images it
    /// stood for; each mode keeps its own text fields.
    pub fn switch_mode(&self, mode: Mode) {
        let mut state = self.state();
        state.mode = mode;
        state.individual.profile_picture = None;
        state.company.logo = None;
        state.preview = None;
        state.error = None;
    }

    /// Current value of a field of the active record, as text.
    pub fn value(&self, field: Field) -> Option<String> {
        let state = self.state();
        let i = &state.individual;
        let c = &state.company;
        let value = match (state.mode, field) {
            (Mode::Individual, Field::FullName) => i.full_name.clone(),
            (Mode::Individual, Field::Username) => i.username.clone(),
            (Mode::Individual, Field::Email) => i.email.clone(),
            (Mode::Individual, Field::Password) => i.password.clone(),
            (Mode::Individual, Field::ConfirmPassword) => i.confirm_password.clone(),
            (Mode::Individual, Field::JobTitle) => i.job_title.clone(),
            (Mode::Individual, Field::Department) => i.department.clone(),
            (Mode::Individual, Field::Role) => i.role.to_string(),
            (Mode::Company, Field::CompanyName) => c.company_name.clone(),
            (Mode::Company, Field::CompanyEmail) => c.company_email.clone(),
            (Mode::Company, Field::CompanySize) => c.company_size.map(|s| s.to_string()).unwrap_or_default(),
            (Mode::Company, Field::Industry) => c.industry.map(|s| s.to_string()).unwrap_or_default(),
            (Mode::Company, Field::AdminName) => c.admin_name.clone(),
            (Mode::Company, Field::AdminUsername) => c.admin_username.clone(),
            (Mode::Company, Field::AdminEmail) => c.admin_email.clone(),
            (Mode::Company, Field::Password) => c.password.clone(),
            (Mode::Company, Field::ConfirmPassword) => c.confirm_password.clone(),
            _ => return None,
        };
        Some(value)
    }

    /// Update one field of the active record. An empty value clears an
    /// optional enumerated field.
    pub fn set_field(&self, field: Field, value: &str) -> Result<(), FormError> {
        let mut state = self.state();
        let mode = state.mode;
        let value = value.to_string();
        match mode {
            Mode::Individual => {
                let i = &mut state.individual;
                match field {
                    Field::FullName => i.full_name = value,
                    Field::Username => i.username = value,
                    Field::Email => i.email = value,
                    Field::Password => i.password = value,
                    Field::ConfirmPassword => i.confirm_password = value,
                    Field::JobTitle => i.job_title = value,
                    Field::Department => i.department = value,
                    Field::Role => i.role = value.parse()?,
                    _ => return Err(FormError::WrongMode { field, mode }),
                }
            }
            Mode::Company => {
                let c = &mut state.company;
                match field {
                    Field::CompanyName => c.company_name = value,
                    Field::CompanyEmail => c.company_email = value,
                    Field::AdminName => c.admin_name = value,
                    Field::AdminUsername => c.admin_username = value,
                    Field::AdminEmail => c.admin_email = value,
                    Field::Password => c.password = value,
                    Field::ConfirmPassword => c.confirm_password = value,
                    Field::CompanySize if value.trim().is_empty() => c.company_size = None,
                    Field::CompanySize => c.company_size = Some(value.parse()?),
                    Field::Industry if value.trim().is_empty() => c.industry = None,
                    Field::Industry => c.industry = Some(value.parse()?),
                    _ => return Err(FormError::WrongMode { field, mode }),
                }
            }
        }
        Ok(())
    }

    /// Read an image from disk into the active record and render its
    /// preview. On failure the banner explains why and the previous
    /// selection is kept.
    pub fn select_file(&self, path: &Path) -> Option<ImagePreview> {
        match ImageFile::load(path) {
            Ok(file) => Some(self.attach_file(file)),
            Err(e) => {
                log::warn!("could not use {}: {}", path.display(), e);
                self.state().error = Some(e.to_string());
                None
            }
        }
    }

    /// Put an already loaded image into the active record.
    pub fn attach_file(&self, file: ImageFile) -> ImagePreview {
        let preview = file.preview();
        let mut state = self.state();
        *state.active_file_mut() = Some(file);
        state.preview = Some(preview.clone());
        preview
    }

    pub fn clear_file(&self) {
        let mut state = self.state();
        *state.active_file_mut() = None;
        state.preview = None;
    }

    /// Validate, upload the image if any, then register with the backend.
    pub fn submit<B: Backend + ?Sized>(&self, backend: &B) -> SubmitOutcome {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            log::debug!("submit ignored, a submission is already running");
            return SubmitOutcome::Busy;
        }
        let _guard = InFlight(&self.in_flight);

        let pending = {
            let mut state = self.state();
            state.error = None;
            match state.mode {
                Mode::Individual => Pending::Individual(state.individual.clone()),
                Mode::Company => Pending::Company(state.company.clone()),
            }
        };

        let result = match &pending {
            Pending::Individual(input) => submit_individual(backend, input),
            Pending::Company(input) => submit_company(backend, input),
        };

        let mut state = self.state();
        match result {
            Ok(redirect) => {
                match pending {
                    Pending::Individual(_) => state.individual = IndividualRegistrationInput::default(),
                    Pending::Company(_) => state.company = CompanyRegistrationInput::default(),
                }
                state.preview = None;
                SubmitOutcome::Completed(redirect)
            }
            Err(message) => {
                state.error = Some(message.clone());
                SubmitOutcome::Failed(message)
            }
        }
    }
}

fn upload_if_selected<B: Backend + ?Sized>(backend: &B, file: Option<&ImageFile>) -> Result<String, String> {
    match file {
        Some(file) => backend.upload_profile_picture(file).map_err(|e| e.to_string()),
        None => Ok(String::new()),
    }
}

fn submit_individual<B: Backend + ?Sized>(
    backend: &B,
    input: &IndividualRegistrationInput,
) -> Result<LoginRedirect, String> {
    if input.password != input.confirm_password {
        return Err(PASSWORD_MISMATCH.into());
    }
    let url = upload_if_selected(backend, input.profile_picture.as_ref())?;
    let payload = IndividualRegistration::from_input(input, url);
    backend.register_individual(&payload).map_err(|e| e.to_string())?;
    log::info!("registered individual account {}", payload.username);
    Ok(LoginRedirect {
        message: INDIVIDUAL_SUCCESS.into(),
        company_login: false,
    })
}

fn submit_company<B: Backend + ?Sized>(backend: &B, input: &CompanyRegistrationInput) -> Result<LoginRedirect, String> {
    if input.password != input.confirm_password {
        return Err(PASSWORD_MISMATCH.into());
    }
    if !input.has_required_fields() {
        return Err(MISSING_REQUIRED.into());
    }
    let url = upload_if_selected(backend, input.logo.as_ref())?;
    let payload = CompanyRegistration::from_input(input, url);
    backend.register_company(&payload).map_err(|e| e.to_string())?;
    log::info!("registered company {}", payload.company_name);
    Ok(LoginRedirect {
        message: COMPANY_SUCCESS.into(),
        company_login: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::models::{CompanySize, Role};
    use std::sync::mpsc;
    use std::sync::Arc;

    #[derive(Default)]
    struct FakeBackend {
        uploads: Mutex<Vec<String>>,
        individuals: Mutex<Vec<IndividualRegistration>>,
        companies: Mutex<Vec<CompanyRegistration>>,
        upload_reply: Option<String>,
        reject_with: Option<String>,
    }

    impl FakeBackend {
        fn calls(&self) -> usize {
            self.uploads.lock().unwrap().len()
                + self.individuals.lock().unwrap().len()
                + self.companies.lock().unwrap().len()
        }
    }

    impl Backend for FakeBackend {
        fn upload_profile_picture(&self, file: &ImageFile) -> Result<String, ApiError> {
            self.uploads.lock().unwrap().push(file.file_name.clone());
            match &self.upload_reply {
                Some(url) => Ok(url.clone()),
                None => Err(ApiError::MalformedResponse(
                    "Upload succeeded but the server did not return profile_pic_url".into(),
                )),
            }
        }

        fn register_individual(&self, payload: &IndividualRegistration) -> Result<(), ApiError> {
            self.individuals.lock().unwrap().push(payload.clone());
            match &self.reject_with {
                Some(message) => Err(ApiError::Rejected { status: 400, message: message.clone() }),
                None => Ok(()),
            }
        }

        fn register_company(&self, payload: &CompanyRegistration) -> Result<(), ApiError> {
            self.companies.lock().unwrap().push(payload.clone());
            match &self.reject_with {
                Some(message) => Err(ApiError::Rejected { status: 400, message: message.clone() }),
                None => Ok(()),
            }
        }
    }

    fn png() -> ImageFile {
        ImageFile::new("me.png", vec![1, 2, 3]).unwrap()
    }

    fn filled_individual() -> RegistrationForm {
        let form = RegistrationForm::new();
        form.set_field(Field::FullName, "Ada Lovelace").unwrap();
        form.set_field(Field::Username, "ada").unwrap();
        form.set_field(Field::Email, "ada@example.com").unwrap();
        form.set_field(Field::Password, "s3cret").unwrap();
        form.set_field(Field::ConfirmPassword, "s3cret").unwrap();
        form
    }

    fn filled_company() -> RegistrationForm {
        let form = RegistrationForm::new();
        form.switch_mode(Mode::Company);
        form.set_field(Field::CompanyName, "Acme").unwrap();
        form.set_field(Field::CompanyEmail, "hq@acme.test").unwrap();
        form.set_field(Field::AdminName, "Wile E. Coyote").unwrap();
        form.set_field(Field::AdminUsername, "wile").unwrap();
        form.set_field(Field::AdminEmail, "wile@acme.test").unwrap();
        form.set_field(Field::Password, "pw").unwrap();
        form.set_field(Field::ConfirmPassword, "pw").unwrap();
        form
    }

    #[test]
    fn password_mismatch_never_reaches_backend() {
        let backend = FakeBackend::default();
        for form in [filled_individual(), filled_company()] {
            form.attach_file(png());
            form.set_field(Field::ConfirmPassword, "different").unwrap();
            let outcome = form.submit(&backend);
            assert_eq!(outcome, SubmitOutcome::Failed(PASSWORD_MISMATCH.into()));
            assert_eq!(form.error().as_deref(), Some(PASSWORD_MISMATCH));
        }
        assert_eq!(backend.calls(), 0);
    }

    #[test]
    fn company_needs_every_required_field() {
        let required = [
            Field::CompanyName,
            Field::CompanyEmail,
            Field::AdminName,
            Field::AdminUsername,
            Field::AdminEmail,
        ];
        let backend = FakeBackend::default();
        for field in required {
            let form = filled_company();
            form.set_field(field, "").unwrap();
            assert_eq!(form.submit(&backend), SubmitOutcome::Failed(MISSING_REQUIRED.into()));
        }

        let form = filled_company();
        form.set_field(Field::Password, "").unwrap();
        form.set_field(Field::ConfirmPassword, "").unwrap();
        assert_eq!(form.submit(&backend), SubmitOutcome::Failed(MISSING_REQUIRED.into()));

        assert_eq!(backend.calls(), 0);
    }

    #[test]
    fn no_file_means_empty_url_and_no_upload() {
        let backend = FakeBackend::default();
        let outcome = filled_individual().submit(&backend);
        assert_eq!(
            outcome,
            SubmitOutcome::Completed(LoginRedirect {
                message: INDIVIDUAL_SUCCESS.into(),
                company_login: false,
            })
        );
        assert!(backend.uploads.lock().unwrap().is_empty());
        let sent = backend.individuals.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].profile_pic_url, "");
        assert_eq!(sent[0].role, Role::Employee);
        assert_eq!(sent[0].job_title, None);
    }

    #[test]
    fn uploaded_url_is_passed_on_exactly() {
        let backend = FakeBackend {
            upload_reply: Some("https://x/y.png".into()),
            ..Default::default()
        };
        let form = filled_company();
        form.set_field(Field::CompanySize, "11-50").unwrap();
        form.attach_file(png());
        let outcome = form.submit(&backend);
        assert!(matches!(outcome, SubmitOutcome::Completed(LoginRedirect { company_login: true, .. })));
        assert_eq!(*backend.uploads.lock().unwrap(), vec!["me.png".to_string()]);
        let sent = backend.companies.lock().unwrap();
        assert_eq!(sent[0].company_logo_url, "https://x/y.png");
        assert_eq!(sent[0].company_size, Some(CompanySize::Small));
    }

    #[test]
    fn failed_upload_stops_before_registration() {
        let backend = FakeBackend::default();
        let form = filled_individual();
        form.attach_file(png());
        let outcome = form.submit(&backend);
        assert!(matches!(outcome, SubmitOutcome::Failed(ref m) if m.contains("profile_pic_url")));
        assert!(backend.individuals.lock().unwrap().is_empty());
        // Input survives for a retry.
        assert_eq!(form.value(Field::Username).as_deref(), Some("ada"));
        assert!(form.individual().profile_picture.is_some());
        assert!(form.preview().is_some());
    }

    #[test]
    fn backend_detail_is_shown_verbatim() {
        let backend = FakeBackend {
            reject_with: Some("username taken".into()),
            ..Default::default()
        };
        let form = filled_individual();
        assert_eq!(form.submit(&backend), SubmitOutcome::Failed("username taken".into()));
        assert_eq!(form.error().as_deref(), Some("username taken"));
        assert_eq!(form.value(Field::FullName).as_deref(), Some("Ada Lovelace"));
    }

    #[test]
    fn success_resets_the_record() {
        let backend = FakeBackend::default();
        let form = filled_company();
        form.set_field(Field::ConfirmPassword, "nope").unwrap();
        form.submit(&backend);
        assert!(form.error().is_some());

        form.set_field(Field::ConfirmPassword, "pw").unwrap();
        assert!(matches!(form.submit(&backend), SubmitOutcome::Completed(_)));
        assert_eq!(form.error(), None);
        assert_eq!(form.company(), CompanyRegistrationInput::default());
    }

    #[test]
    fn switching_mode_clears_preview_and_banner() {
        let form = filled_individual();
        form.attach_file(png());
        form.set_field(Field::ConfirmPassword, "x").unwrap();
        form.submit(&FakeBackend::default());
        assert!(form.error().is_some());
        assert!(form.preview().is_some());

        form.switch_mode(Mode::Company);
        assert_eq!(form.error(), None);
        assert_eq!(form.preview(), None);
        assert_eq!(form.value(Field::Password).as_deref(), Some(""));
        assert_eq!(form.value(Field::FullName), None);
        assert_eq!(form.company(), CompanyRegistrationInput::default());
    }

    #[test]
    fn edits_only_touch_the_active_mode() {
        let form = RegistrationForm::new();
        assert_eq!(
            form.set_field(Field::CompanyName, "Acme"),
            Err(FormError::WrongMode { field: Field::CompanyName, mode: Mode::Individual })
        );
        form.set_field(Field::Password, "one").unwrap();
        form.switch_mode(Mode::Company);
        form.set_field(Field::Password, "two").unwrap();
        assert_eq!(form.individual().password, "one");
        assert_eq!(form.company().password, "two");
        assert!(matches!(
            form.set_field(Field::Industry, "mining"),
            Err(FormError::InvalidOption(_))
        ));
        form.set_field(Field::Industry, "Finance").unwrap();
        form.set_field(Field::Industry, "").unwrap();
        assert_eq!(form.company().industry, None);
    }

    #[test]
    fn switching_mode_drops_selected_images() {
        let backend = FakeBackend {
            upload_reply: Some("https://x/y.png".into()),
            ..Default::default()
        };
        let form = filled_individual();
        form.attach_file(png());
        assert_eq!(form.selected_file().map(|f| f.file_name), Some("me.png".to_string()));

        form.switch_mode(Mode::Company);
        form.switch_mode(Mode::Individual);
        assert_eq!(form.preview(), None);
        assert_eq!(form.selected_file(), None);

        assert!(matches!(form.submit(&backend), SubmitOutcome::Completed(_)));
        assert!(backend.uploads.lock().unwrap().is_empty());
        assert_eq!(backend.individuals.lock().unwrap()[0].profile_pic_url, "");
    }

    #[test]
    fn bad_file_sets_banner() {
        let form = RegistrationForm::new();
        assert!(form.select_file(Path::new("/nonexistent/avatar.png")).is_none());
        assert!(form.error().is_some());
        assert!(form.individual().profile_picture.is_none());
    }

    #[test]
    fn clear_file_drops_selection() {
        let form = RegistrationForm::new();
        form.attach_file(png());
        form.clear_file();
        assert_eq!(form.preview(), None);
        assert!(form.individual().profile_picture.is_none());
    }

    // Holds registration open until told to finish.
    struct SlowBackend {
        inner: FakeBackend,
        entered: Mutex<mpsc::Sender<()>>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl Backend for SlowBackend {
        fn upload_profile_picture(&self, file: &ImageFile) -> Result<String, ApiError> {
            self.inner.upload_profile_picture(file)
        }

        fn register_individual(&self, payload: &IndividualRegistration) -> Result<(), ApiError> {
            self.entered.lock().unwrap().send(()).unwrap();
            self.release.lock().unwrap().recv().unwrap();
            self.inner.register_individual(payload)
        }

        fn register_company(&self, payload: &CompanyRegistration) -> Result<(), ApiError> {
            self.inner.register_company(payload)
        }
    }

    #[test]
    fn second_submit_while_pending_is_ignored() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let backend = Arc::new(SlowBackend {
            inner: FakeBackend::default(),
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        });
        let form = Arc::new(filled_individual());

        let first = {
            let form = Arc::clone(&form);
            let backend = Arc::clone(&backend);
            std::thread::spawn(move || form.submit(&*backend))
        };

        entered_rx.recv().unwrap();
        assert!(form.is_submitting());
        assert_eq!(form.submit(&*backend), SubmitOutcome::Busy);
        release_tx.send(()).unwrap();

        assert!(matches!(first.join().unwrap(), SubmitOutcome::Completed(_)));
        assert_eq!(backend.inner.individuals.lock().unwrap().len(), 1);
        assert!(!form.is_submitting());
    }
}
