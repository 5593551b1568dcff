//! Signed-in identity, composed from two live sources: the auth provider's
//! current user and that user's store-side profile document. The profile
//! carries the role, which is the sole authorization signal in the system.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::join::ProfileSource;
use crate::model::{AuthUser, DocumentId, Role, UserProfile};
use crate::store::DocSlot;

/// Who is signed in, and what the store knows about them.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub user: Option<AuthUser>,
    pub profile: DocSlot<UserProfile>,
}

impl Identity {
    pub fn signed_out() -> Self {
        Self {
            user: None,
            profile: DocSlot::Missing,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.profile
            .as_present()
            .is_some_and(|p| p.role == Role::Admin)
    }

    pub fn uid(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.uid.as_str())
    }

    /// Profile display name first, auth display name as fallback.
    pub fn display_name(&self) -> Option<&str> {
        self.profile
            .as_present()
            .map(|p| p.display_name.as_str())
            .or_else(|| self.user.as_ref().and_then(|u| u.display_name.as_deref()))
    }
}

/// Live identity subscription.
///
/// Re-emits when the auth state changes (sign-in/out) or when the
/// signed-in user's profile document changes.
pub struct IdentityStream {
    output: watch::Receiver<Identity>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl IdentityStream {
    pub fn spawn(
        auth_rx: watch::Receiver<Option<AuthUser>>,
        profiles: Arc<dyn ProfileSource>,
        cancel: CancellationToken,
    ) -> Self {
        let mut auth_rx = auth_rx;
        let user = auth_rx.borrow_and_update().clone();
        let mut sub = subscribe_for(&profiles, user.as_ref());
        let initial = identity_of(user, sub.as_mut());
        let (out_tx, output) = watch::channel(initial);

        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            identity_loop(auth_rx, profiles, sub, out_tx, task_cancel).await;
        });

        Self {
            output,
            cancel,
            task: Some(task),
        }
    }

    pub fn current(&self) -> Identity {
        self.output.borrow().clone()
    }

    /// Wait for the next identity change.
    /// Returns `None` once the stream has shut down.
    pub async fn changed(&mut self) -> Option<Identity> {
        self.output.changed().await.ok()?;
        Some(self.output.borrow_and_update().clone())
    }

    pub fn watch(&self) -> watch::Receiver<Identity> {
        self.output.clone()
    }

    /// Cancel the stream and wait for its task to finish.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for IdentityStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn subscribe_for(
    profiles: &Arc<dyn ProfileSource>,
    user: Option<&AuthUser>,
) -> Option<watch::Receiver<DocSlot<UserProfile>>> {
    user.map(|u| profiles.subscribe_profile(&DocumentId::from(u.uid.as_str())))
}

fn identity_of(
    user: Option<AuthUser>,
    sub: Option<&mut watch::Receiver<DocSlot<UserProfile>>>,
) -> Identity {
    let profile = match sub {
        Some(rx) => rx.borrow_and_update().clone(),
        None => DocSlot::Missing,
    };
    Identity { user, profile }
}

enum Wake {
    Cancelled,
    Auth(bool),
    Profile(bool),
}

async fn identity_loop(
    mut auth_rx: watch::Receiver<Option<AuthUser>>,
    profiles: Arc<dyn ProfileSource>,
    mut sub: Option<watch::Receiver<DocSlot<UserProfile>>>,
    out_tx: watch::Sender<Identity>,
    cancel: CancellationToken,
) {
    loop {
        let wake = {
            let profile_changed = async {
                match sub.as_mut() {
                    Some(rx) => rx.changed().await.is_ok(),
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                biased;
                () = cancel.cancelled() => Wake::Cancelled,
                res = auth_rx.changed() => Wake::Auth(res.is_ok()),
                ok = profile_changed => Wake::Profile(ok),
            }
        };

        match wake {
            Wake::Cancelled | Wake::Auth(false) => break,
            Wake::Auth(true) => {
                let user = auth_rx.borrow_and_update().clone();
                sub = subscribe_for(&profiles, user.as_ref());
                out_tx.send_replace(identity_of(user, sub.as_mut()));
            }
            Wake::Profile(ok) => {
                if !ok {
                    // Profile source went away; treat as absent.
                    sub = None;
                }
                let user = auth_rx.borrow().clone();
                out_tx.send_replace(identity_of(user, sub.as_mut()));
            }
        }
    }

    debug!("identity stream shut down");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::CatalogStore;
    use serde_json::json;
    use showroom_api::RawDocument;

    fn admin_profile(id: &str, name: &str) -> RawDocument {
        RawDocument {
            id: id.into(),
            data: json!({ "displayName": name, "email": format!("{id}@x"), "role": "admin" }),
        }
    }

    fn auth_user(uid: &str) -> AuthUser {
        AuthUser {
            uid: uid.into(),
            email: format!("{uid}@x"),
            display_name: None,
        }
    }

    #[tokio::test]
    async fn signed_out_identity_has_no_profile() {
        let store = Arc::new(CatalogStore::new());
        store.sync_profiles(&[]);
        let (_auth_tx, auth_rx) = watch::channel(None);

        let profiles: Arc<dyn ProfileSource> = store.clone();
        let stream = IdentityStream::spawn(auth_rx, profiles, CancellationToken::new());

        let identity = stream.current();
        assert!(!identity.is_signed_in());
        assert!(!identity.is_admin());
        stream.shutdown().await;
    }

    #[tokio::test]
    async fn sign_in_resolves_profile_and_role() {
        let store = Arc::new(CatalogStore::new());
        store.sync_profiles(&[admin_profile("u1", "Alice")]);
        let (auth_tx, auth_rx) = watch::channel(None);

        let profiles: Arc<dyn ProfileSource> = store.clone();
        let mut stream = IdentityStream::spawn(auth_rx, profiles, CancellationToken::new());

        auth_tx.send_replace(Some(auth_user("u1")));
        let identity = stream.changed().await.unwrap();

        assert!(identity.is_signed_in());
        assert!(identity.is_admin());
        assert_eq!(identity.display_name(), Some("Alice"));
        stream.shutdown().await;
    }

    #[tokio::test]
    async fn profile_edit_reemits_identity() {
        let store = Arc::new(CatalogStore::new());
        store.sync_profiles(&[admin_profile("u1", "Alice")]);
        let (auth_tx, auth_rx) = watch::channel(Some(auth_user("u1")));
        let _ = &auth_tx;

        let profiles: Arc<dyn ProfileSource> = store.clone();
        let mut stream = IdentityStream::spawn(auth_rx, profiles, CancellationToken::new());
        assert_eq!(stream.current().display_name(), Some("Alice"));

        let demoted = UserProfile {
            id: DocumentId::from("u1"),
            display_name: "Alice".into(),
            email: "u1@x".into(),
            role: Role::User,
        };
        store.upsert_profile(demoted);

        let identity = stream.changed().await.unwrap();
        assert!(!identity.is_admin());
        stream.shutdown().await;
    }

    #[tokio::test]
    async fn sign_out_clears_profile() {
        let store = Arc::new(CatalogStore::new());
        store.sync_profiles(&[admin_profile("u1", "Alice")]);
        let (auth_tx, auth_rx) = watch::channel(Some(auth_user("u1")));

        let profiles: Arc<dyn ProfileSource> = store.clone();
        let mut stream = IdentityStream::spawn(auth_rx, profiles, CancellationToken::new());
        assert!(stream.current().is_admin());

        auth_tx.send_replace(None);
        let identity = stream.changed().await.unwrap();
        assert!(!identity.is_signed_in());
        assert!(matches!(identity.profile, DocSlot::Missing));
        stream.shutdown().await;
    }
}
