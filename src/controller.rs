//! Screen controller: form state, mode transitions and the session cache.
//!
//! The controller never talks to sqlite directly beyond the `User` repo and
//! never issues two storage calls at once; every operation takes `&mut self`.

use tracing::{info, instrument, warn};

use crate::auth::{
    services::{validate_login, validate_registration},
    Field, NewUser, ProfileForm, User,
};
use crate::db::ensure_schema;
use crate::error::{Alert, AppError};
use crate::session::Restored;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Login screen, or the registration screen when `sign_up` is set.
    Auth { sign_up: bool },
    ProfileView,
    ProfileEdit,
}

impl Mode {
    pub const LOGIN: Mode = Mode::Auth { sign_up: false };
    pub const REGISTER: Mode = Mode::Auth { sign_up: true };
}

pub struct Controller {
    state: AppState,
    mode: Mode,
    form: ProfileForm,
}

impl Controller {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            mode: Mode::LOGIN,
            form: ProfileForm::default(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn form(&self) -> &ProfileForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut ProfileForm {
        &mut self.form
    }

    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        self.form.set(field, value);
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(self.mode, Mode::ProfileView | Mode::ProfileEdit)
    }

    /// Ensures the schema, then restores a cached session if one exists.
    ///
    /// A schema failure is only logged, so a broken database still lets a
    /// cached session come back. Session store failures are returned.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> Result<(), AppError> {
        if let Err(e) = ensure_schema(&self.state.db).await {
            warn!(error = %e, "continuing without schema");
        }

        match self.state.session.restore().await? {
            Restored::LoggedOut => {
                info!("no cached session");
            }
            Restored::LoggedIn(snapshot) => {
                if let Some(form) = snapshot {
                    self.form = form;
                }
                self.mode = Mode::ProfileView;
                info!(username = %self.form.username, "cached session restored");
            }
        }
        Ok(())
    }

    pub fn toggle_auth_mode(&mut self) {
        if let Mode::Auth { sign_up } = self.mode {
            self.mode = Mode::Auth { sign_up: !sign_up };
        }
    }

    /// Login or registration, depending on the current sub-mode.
    pub async fn submit(&mut self) -> Alert {
        match self.try_submit().await {
            Ok(alert) => alert,
            Err(e) => e.alert(),
        }
    }

    #[instrument(skip(self), fields(username = %self.form.username, mode = ?self.mode))]
    async fn try_submit(&mut self) -> Result<Alert, AppError> {
        let Mode::Auth { sign_up } = self.mode else {
            return Err(AppError::WrongMode);
        };

        if sign_up {
            if let Err(e) = validate_registration(&self.form) {
                warn!(error = ?e, "registration form incomplete");
                return Err(e);
            }
            let user = User::create(&self.state.db, &NewUser::from(&self.form))
                .await
                .map_err(|e| {
                    warn!(error = %e, "create user failed");
                    e
                })?;
            info!(user_id = user.id, "user registered");
            self.mode = Mode::LOGIN;
            return Ok(Alert::success("Registration successful"));
        }

        if let Err(e) = validate_login(&self.form) {
            warn!(error = ?e, "login form incomplete");
            return Err(e);
        }
        let ok = User::authenticate(&self.state.db, &self.form.username, &self.form.password)
            .await
            .map_err(|e| {
                warn!(error = %e, "authenticate failed");
                e
            })?;
        if !ok {
            warn!("login invalid credentials");
            return Err(AppError::InvalidCredentials);
        }

        self.state.session.persist_login(&self.form).await?;
        self.mode = Mode::ProfileView;
        info!("user logged in");
        Ok(Alert::success("Logged in successfully"))
    }

    /// Switches between viewing and editing the profile. No data changes.
    pub fn edit_profile(&mut self) {
        self.mode = match self.mode {
            Mode::ProfileView => Mode::ProfileEdit,
            Mode::ProfileEdit => Mode::ProfileView,
            auth => auth,
        };
    }

    /// Writes the form to the cached snapshot only. The users table keeps
    /// whatever was registered.
    pub async fn save_profile(&mut self) -> Alert {
        match self.try_save_profile().await {
            Ok(alert) => alert,
            Err(e) => e.alert(),
        }
    }

    #[instrument(skip(self), fields(username = %self.form.username))]
    async fn try_save_profile(&mut self) -> Result<Alert, AppError> {
        if !self.is_logged_in() {
            return Err(AppError::WrongMode);
        }
        self.state.session.save_snapshot(&self.form).await?;
        self.mode = Mode::ProfileView;
        info!("profile snapshot saved");
        Ok(Alert::success("Profile updated"))
    }

    /// Clears both session keys and resets the form, from any mode.
    #[instrument(skip(self), fields(username = %self.form.username))]
    pub async fn logout(&mut self) -> Result<(), AppError> {
        self.state.session.clear().await?;
        self.form = ProfileForm::default();
        self.mode = Mode::LOGIN;
        info!("logged out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{
        FileSessionStore, MemorySessionStore, SessionError, SessionStore, IS_LOGGED_IN_KEY,
        USER_INFO_KEY,
    };
    use async_trait::async_trait;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    /// Memory store whose `fail_on`-th `set_item` call (1-based) errors.
    struct FailingStore {
        inner: MemorySessionStore,
        writes: AtomicUsize,
        fail_on: usize,
    }

    #[async_trait]
    impl SessionStore for FailingStore {
        async fn get_item(&self, key: &str) -> Result<Option<String>, SessionError> {
            self.inner.get_item(key).await
        }

        async fn set_item(&self, key: &str, value: &str) -> Result<(), SessionError> {
            if self.writes.fetch_add(1, Ordering::SeqCst) + 1 == self.fail_on {
                return Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full").into());
            }
            self.inner.set_item(key, value).await
        }

        async fn remove_item(&self, key: &str) -> Result<(), SessionError> {
            self.inner.remove_item(key).await
        }
    }

    async fn with_store(store: Arc<dyn SessionStore>) -> Controller {
        let fake = AppState::fake().await.expect("fake state");
        let state = AppState::from_parts(fake.db, fake.config, store);
        let mut c = Controller::new(state);
        c.start().await.expect("start");
        c
    }

    async fn started() -> Controller {
        let mut c = Controller::new(AppState::fake().await.expect("fake state"));
        c.start().await.expect("start");
        c
    }

    fn fill_registration(c: &mut Controller) {
        c.set_field(Field::Username, "alice");
        c.set_field(Field::Password, "pw123");
        c.set_field(Field::FirstName, "Alice");
        c.set_field(Field::LastName, "Liddell");
        c.set_field(Field::Email, "alice@example.com");
        c.set_field(Field::ContactNumber, "555-0100");
        c.set_field(Field::Address, "1 Rabbit Hole");
    }

    async fn registered_and_logged_in() -> Controller {
        let mut c = started().await;
        c.toggle_auth_mode();
        fill_registration(&mut c);
        assert!(c.submit().await.is_success());
        assert!(c.submit().await.is_success());
        assert_eq!(c.mode(), Mode::ProfileView);
        c
    }

    #[tokio::test]
    async fn starts_in_login_mode() {
        let c = started().await;
        assert_eq!(c.mode(), Mode::LOGIN);
        assert!(!c.is_logged_in());
        assert_eq!(c.form(), &ProfileForm::default());
    }

    #[tokio::test]
    async fn toggle_switches_sub_mode_only_in_auth() {
        let mut c = started().await;
        c.toggle_auth_mode();
        assert_eq!(c.mode(), Mode::REGISTER);
        c.toggle_auth_mode();
        assert_eq!(c.mode(), Mode::LOGIN);

        let mut c = registered_and_logged_in().await;
        c.toggle_auth_mode();
        assert_eq!(c.mode(), Mode::ProfileView);
    }

    #[tokio::test]
    async fn registration_returns_to_login_without_logging_in() {
        let mut c = started().await;
        c.toggle_auth_mode();
        fill_registration(&mut c);

        let alert = c.submit().await;
        assert_eq!(alert, Alert::success("Registration successful"));
        assert_eq!(c.mode(), Mode::LOGIN);
        assert_eq!(c.form().username, "alice");

        let store = c.state().session.store();
        assert!(store.get_item(IS_LOGGED_IN_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn incomplete_registration_is_rejected() {
        let mut c = started().await;
        c.toggle_auth_mode();
        fill_registration(&mut c);
        c.set_field(Field::Address, "");

        let alert = c.submit().await;
        assert_eq!(alert, Alert::error("Please fill in all required fields"));
        assert_eq!(c.mode(), Mode::REGISTER);
        let rows = User::find_by_username(&c.state().db, "alice").await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn validation_never_reaches_storage() {
        // no start(): the table does not exist, so any query would fail loudly
        let mut c = Controller::new(AppState::fake().await.unwrap());
        c.set_field(Field::Username, "alice");

        let alert = c.submit().await;
        assert_eq!(alert.message, "Please fill in all required fields");
    }

    #[tokio::test]
    async fn wrong_password_keeps_mode() {
        let mut c = started().await;
        c.toggle_auth_mode();
        fill_registration(&mut c);
        c.submit().await;

        c.set_field(Field::Password, "wrongpw");
        let alert = c.submit().await;
        assert_eq!(alert, Alert::error("Invalid credentials"));
        assert_eq!(c.mode(), Mode::LOGIN);
    }

    #[tokio::test]
    async fn login_writes_session_cache() {
        let c = registered_and_logged_in().await;
        let session = &c.state().session;
        assert_eq!(
            session.store().get_item(IS_LOGGED_IN_KEY).await.unwrap().as_deref(),
            Some("true")
        );
        let snapshot = session.snapshot().await.unwrap().expect("snapshot");
        assert_eq!(&snapshot, c.form());
        assert_eq!(snapshot.first_name, "Alice");
    }

    #[tokio::test]
    async fn storage_failure_surfaces_raw_message_and_keeps_state() {
        let mut c = started().await;
        sqlx::query("DROP TABLE users")
            .execute(&c.state().db)
            .await
            .unwrap();
        c.set_field(Field::Username, "alice");
        c.set_field(Field::Password, "pw123");

        let alert = c.submit().await;
        assert!(!alert.is_success());
        assert!(alert.message.contains("no such table"));
        assert_eq!(c.mode(), Mode::LOGIN);
    }

    #[tokio::test]
    async fn failed_registration_write_keeps_register_mode() {
        let mut c = started().await;
        c.toggle_auth_mode();
        fill_registration(&mut c);
        sqlx::query("DROP TABLE users")
            .execute(&c.state().db)
            .await
            .unwrap();

        let alert = c.submit().await;
        assert!(!alert.is_success());
        assert!(alert.message.contains("no such table"));
        assert_eq!(c.mode(), Mode::REGISTER);
    }

    #[tokio::test]
    async fn failed_session_write_on_login_leaves_no_flag() {
        for fail_on in [1, 2] {
            let store = Arc::new(FailingStore {
                inner: MemorySessionStore::new(),
                writes: AtomicUsize::new(0),
                fail_on,
            });
            let mut c = with_store(store.clone()).await;
            c.toggle_auth_mode();
            fill_registration(&mut c);
            assert!(c.submit().await.is_success());

            let alert = c.submit().await;
            assert_eq!(alert, Alert::error("disk full"), "fail_on = {fail_on}");
            assert_eq!(c.mode(), Mode::LOGIN);
            assert!(store.get_item(IS_LOGGED_IN_KEY).await.unwrap().is_none());

            // a restart must not skip the login screen
            let mut restarted = Controller::new(c.state().clone());
            restarted.start().await.expect("restart");
            assert_eq!(restarted.mode(), Mode::LOGIN);
        }
    }

    #[tokio::test]
    async fn garbage_session_file_does_not_block_login_or_logout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, br#"{"isLoggedIn": tr"#).unwrap();
        let store = Arc::new(FileSessionStore::new(&path)) as Arc<dyn SessionStore>;

        let fake = AppState::fake().await.expect("fake state");
        let mut c = Controller::new(AppState::from_parts(fake.db, fake.config, store));
        // reads still report the damage
        assert!(c.start().await.is_err());
        crate::db::ensure_schema(&c.state().db).await.unwrap();

        c.logout().await.expect("logout over garbage");
        std::fs::write(&path, b"garbage").unwrap();

        c.toggle_auth_mode();
        fill_registration(&mut c);
        assert!(c.submit().await.is_success());
        assert_eq!(c.submit().await, Alert::success("Logged in successfully"));
        assert_eq!(c.mode(), Mode::ProfileView);

        let mut restarted = Controller::new(c.state().clone());
        restarted.start().await.expect("restart");
        assert_eq!(restarted.mode(), Mode::ProfileView);
        assert_eq!(restarted.form().username, "alice");
    }

    #[tokio::test]
    async fn edit_and_save_updates_cache_but_not_table() {
        let mut c = registered_and_logged_in().await;

        c.edit_profile();
        assert_eq!(c.mode(), Mode::ProfileEdit);
        c.set_field(Field::Email, "new@example.com");
        c.form_mut().profile_picture = "https://example.com/a.png".into();

        let alert = c.save_profile().await;
        assert_eq!(alert, Alert::success("Profile updated"));
        assert_eq!(c.mode(), Mode::ProfileView);

        let snapshot = c.state().session.snapshot().await.unwrap().unwrap();
        assert_eq!(snapshot.email, "new@example.com");

        let rows = User::find_by_username(&c.state().db, "alice").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].email.as_deref(), Some("alice@example.com"));
        assert_eq!(rows[0].profile_picture.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn edit_toggle_back_without_save() {
        let mut c = registered_and_logged_in().await;
        c.edit_profile();
        c.edit_profile();
        assert_eq!(c.mode(), Mode::ProfileView);
    }

    #[tokio::test]
    async fn save_profile_requires_login() {
        let mut c = started().await;
        let alert = c.save_profile().await;
        assert!(!alert.is_success());
        assert_eq!(c.mode(), Mode::LOGIN);
        assert!(c.state().session.snapshot().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn logout_clears_cache_and_form_from_edit_mode() {
        let mut c = registered_and_logged_in().await;
        c.edit_profile();

        c.logout().await.expect("logout");
        assert_eq!(c.mode(), Mode::LOGIN);
        assert_eq!(c.form(), &ProfileForm::default());

        let store = c.state().session.store();
        assert!(store.get_item(IS_LOGGED_IN_KEY).await.unwrap().is_none());
        assert!(store.get_item(USER_INFO_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn logout_when_logged_out_still_clears() {
        let mut c = started().await;
        let store = c.state().session.store().clone();
        store.set_item(USER_INFO_KEY, "stale").await.unwrap();

        c.logout().await.expect("logout");
        assert!(store.get_item(USER_INFO_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn start_restores_cached_session() {
        let state = AppState::fake().await.unwrap();
        let cached = ProfileForm {
            username: "alice".into(),
            first_name: "Alice".into(),
            ..Default::default()
        };
        state.session.persist_login(&cached).await.unwrap();

        let mut c = Controller::new(state);
        c.start().await.unwrap();
        assert_eq!(c.mode(), Mode::ProfileView);
        assert_eq!(c.form(), &cached);
    }

    #[tokio::test]
    async fn start_with_flag_only_shows_empty_profile() {
        let state = AppState::fake().await.unwrap();
        state
            .session
            .store()
            .set_item(IS_LOGGED_IN_KEY, "true")
            .await
            .unwrap();

        let mut c = Controller::new(state);
        c.start().await.unwrap();
        assert_eq!(c.mode(), Mode::ProfileView);
        assert_eq!(c.form(), &ProfileForm::default());
    }
}
