//! Identity binding: turns identity changes and auth failures into actions.

use std::sync::Arc;

use serde_json::{Value as Json, json};
use tracing::{debug, info, warn};

use super::{Client, ClientError};
use crate::{
    Result,
    event::EventKind,
    remote::{AuthMethod, Identity, IdentityCallback, IdentityCallbackFuture, Query, Snapshot},
    state::{Action, AuthFailure},
    watcher::Listener,
};

impl Client {
    /// Starts following the remote store's signed-in identity.
    ///
    /// Dispatches `AuthenticationInitStarted`, registers an identity
    /// listener, then dispatches `AuthenticationInitFinished`. From then on
    /// a sign-out dispatches `Logout`; a sign-in records the uid, re-watches
    /// the user's profile and dispatches `Login`. Calling this again replaces
    /// the previous listener.
    pub async fn init_auth(&self) -> Result<()> {
        self.dispatch(Action::AuthenticationInitStarted);

        let weak = self.downgrade();
        let callback: IdentityCallback =
            Arc::new(move |identity: Option<Identity>| -> IdentityCallbackFuture {
                let weak = weak.clone();
                Box::pin(async move {
                    if let Some(client) = weak.upgrade() {
                        client.on_identity(identity).await;
                    }
                })
            });
        let handle = self.inner.remote.on_identity_change(callback).await?;
        let previous = self.inner.auth.lock().unwrap().identity_handle.replace(handle);
        if let Some(previous) = previous {
            self.inner.remote.off_identity_change(previous);
        }

        self.dispatch(Action::AuthenticationInitFinished);
        Ok(())
    }

    async fn on_identity(&self, identity: Option<Identity>) {
        let Some(identity) = identity else {
            debug!("identity cleared");
            self.dispatch(Action::Logout);
            return;
        };

        info!(uid = %identity.uid, "identity changed");
        self.inner.auth.lock().unwrap().uid = Some(identity.uid.clone());
        if let Err(err) = self.watch_user_profile(&identity.uid).await {
            warn!(uid = %identity.uid, error = %err, "failed to watch user profile");
        }
        self.dispatch(Action::Login { auth: identity });
    }

    /// Replaces the profile listener with one for `uid`'s profile.
    async fn watch_user_profile(&self, uid: &str) -> Result<()> {
        self.unwatch_user_profile();
        let Some(path) = self.inner.config.profile_path(uid) else {
            return Ok(());
        };

        let sink = self.sink();
        let handle = self
            .inner
            .remote
            .subscribe(
                &Query::new(path.as_str()),
                EventKind::Value,
                Arc::new(move |snapshot: Snapshot| {
                    sink.send(Action::SetProfile {
                        profile: Some(snapshot.value),
                    })
                }),
            )
            .await?;

        let listener = Listener {
            path,
            event: EventKind::Value,
            handle,
        };
        let previous = self.inner.auth.lock().unwrap().profile_listener.replace(listener);
        if let Some(previous) = previous {
            self.inner
                .remote
                .unsubscribe(&previous.path, previous.event, previous.handle);
        }
        Ok(())
    }

    fn unwatch_user_profile(&self) {
        let listener = self.inner.auth.lock().unwrap().profile_listener.take();
        if let Some(listener) = listener {
            self.inner
                .remote
                .unsubscribe(&listener.path, listener.event, listener.handle);
        }
    }

    /// Signs in.
    ///
    /// Any previous auth error is cleared first. On failure a `LoginError`
    /// carrying the failure is dispatched and the error returned. Signing in
    /// through a third-party provider also writes the identity's email and
    /// provider into the user's profile.
    pub async fn login(&self, method: &AuthMethod) -> Result<Identity> {
        self.dispatch(Action::LoginError { auth_error: None });

        let result = self.sign_in(method).await;
        if let Err(err) = &result {
            warn!(method = method.name(), error = %err, "login failed");
            self.dispatch(Action::LoginError {
                auth_error: Some(AuthFailure::from(err)),
            });
        }
        result
    }

    async fn sign_in(&self, method: &AuthMethod) -> Result<Identity> {
        let identity = self.inner.remote.authenticate(method).await?;
        info!(uid = %identity.uid, method = method.name(), "signed in");

        if let AuthMethod::Credential { provider, .. }
        | AuthMethod::Popup { provider }
        | AuthMethod::Redirect { provider } = method
        {
            let profile = json!({ "email": identity.email, "providerId": provider });
            self.create_user_profile(&identity.uid, profile).await?;
        }
        Ok(identity)
    }

    /// Merges `profile` into the profile of `uid`.
    ///
    /// Returns `None` without touching the store when no profile root is
    /// configured. A failed read or write dispatches `UnauthorizedError`
    /// and returns the error.
    pub async fn create_user_profile(&self, uid: &str, profile: Json) -> Result<Option<Json>> {
        let Some(path) = self.inner.config.profile_path(uid) else {
            return Ok(None);
        };

        let result = self.merge_profile(&path, &profile).await;
        match result {
            Ok(()) => Ok(Some(profile)),
            Err(err) => {
                warn!(%path, error = %err, "failed to write user profile");
                self.dispatch(Action::UnauthorizedError {
                    auth_error: AuthFailure::from(&err),
                });
                Err(err)
            }
        }
    }

    async fn merge_profile(&self, path: &str, profile: &Json) -> Result<()> {
        self.inner.remote.read(path).await?;
        let Json::Object(partial) = profile.clone() else {
            return Err(ClientError::NotAnObject {
                path: path.to_string(),
            }
            .into());
        };
        self.inner.remote.merge(path, partial).await
    }

    /// Signs out.
    ///
    /// Local teardown always runs: `Logout` is dispatched, the profile
    /// listener detached and the uid forgotten. A failure to sign out at
    /// the remote store is logged and then returned.
    pub async fn logout(&self) -> Result<()> {
        let result = self.inner.remote.deauthenticate().await;

        self.dispatch(Action::Logout);
        self.unwatch_user_profile();
        self.inner.auth.lock().unwrap().uid = None;

        match &result {
            Ok(()) => info!("signed out"),
            Err(err) => warn!(error = %err, "remote sign-out failed"),
        }
        result
    }
}
