//! Local account service.
//!
//! Registration and login against the `users` collection, plus the
//! remember-me record in the preferences file. Passwords are stored and
//! compared in plaintext; this login is a convenience gate on a single
//! machine, not a security boundary.

use std::sync::Arc;

use banter_core::error::{BanterError, Result};
use banter_core::ids;
use banter_core::repository::UserRepository;
use banter_core::user::{AuthRecord, UserRecord};
use banter_infrastructure::prefs::PrefsFile;

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    prefs: PrefsFile,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, prefs: PrefsFile) -> Self {
        Self { users, prefs }
    }

    /// Creates a new account.
    ///
    /// # Errors
    ///
    /// Rejects blank fields and usernames that are already taken.
    pub async fn register(&self, username: &str, password: &str) -> Result<UserRecord> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(BanterError::precondition(
                "username and password are required",
            ));
        }
        if self.users.find(username).await?.is_some() {
            return Err(BanterError::precondition("username already exists"));
        }

        let user = UserRecord {
            username: username.to_string(),
            password: password.to_string(),
            created_at: ids::now_millis(),
        };
        self.users.create(&user).await?;
        Ok(user)
    }

    /// Checks credentials by exact equality.
    ///
    /// An unknown username and a wrong password produce the same error so the
    /// login form cannot be used to probe for accounts. With `remember` set,
    /// a successful login writes the remember-me record; a failure to write
    /// it is logged but does not fail the login.
    pub async fn login(&self, username: &str, password: &str, remember: bool) -> Result<UserRecord> {
        let user = match self.users.find(username.trim()).await? {
            Some(user) if user.password == password => user,
            _ => return Err(BanterError::precondition("invalid username or password")),
        };

        if remember {
            let auth = AuthRecord {
                username: user.username.clone(),
                logged_in: true,
            };
            if let Err(err) = self.prefs.save_auth(&auth).await {
                tracing::warn!("failed to write remember-me record: {err}");
            }
        }
        Ok(user)
    }

    /// Returns the remembered username, if a valid record exists.
    pub async fn remembered_user(&self) -> Option<String> {
        match self.prefs.load_auth().await {
            Ok(Some(auth)) if auth.logged_in => Some(auth.username),
            Ok(_) => None,
            Err(err) => {
                tracing::warn!("failed to read remember-me record: {err}");
                None
            }
        }
    }

    /// Clears the remembered login.
    pub async fn logout(&self) -> Result<()> {
        self.prefs.clear_auth().await
    }
}
