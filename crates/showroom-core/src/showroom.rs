// ── Showroom facade ──
//
// Full lifecycle management for a showcase backend session. Handles the
// initial catalogue fetch, the live change feed, periodic refresh, command
// routing, auth state, and reactive data streaming through the
// CatalogStore. All client handles are injected explicitly -- there are no
// process-wide singletons.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use tokio::sync::{broadcast, mpsc, oneshot, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use showroom_api::{
    AuthClient, ChangeEvent, ChangeFeedHandle, DocumentQuery, ReconnectConfig, StorageClient,
    StoreClient, TokenStore, TransportConfig,
};

use crate::command::{Command, CommandEnvelope, CommandResult};
use crate::config::BackendConfig;
use crate::error::CoreError;
use crate::identity::IdentityStream;
use crate::join::{ProfileSource, ReviewBoard};
use crate::model::{collections, AuthUser, Car, DocumentId, Rating, Review, UserProfile};
use crate::store::CatalogStore;
use crate::stream::{LiveQuery, ReviewFilter, ReviewSort};

const COMMAND_CHANNEL_SIZE: usize = 64;

// ── ConnectionState ──────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

// ── Showroom ─────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ShowroomInner>`. Manages the full session
/// lifecycle: initial fetch, live feed, command routing, and auth state.
#[derive(Clone)]
pub struct Showroom {
    inner: Arc<ShowroomInner>,
}

struct ShowroomInner {
    config: BackendConfig,
    store: Arc<CatalogStore>,
    tokens: TokenStore,
    connection_state: watch::Sender<ConnectionState>,
    auth_user: watch::Sender<Option<AuthUser>>,
    command_tx: Mutex<mpsc::Sender<CommandEnvelope>>,
    command_rx: Mutex<Option<mpsc::Receiver<CommandEnvelope>>>,
    cancel: CancellationToken,
    /// Child token for the current session -- cancelled on disconnect,
    /// replaced on reconnect (avoids permanent cancellation).
    cancel_child: Mutex<CancellationToken>,
    store_client: Mutex<Option<Arc<StoreClient>>>,
    auth_client: Mutex<Option<Arc<AuthClient>>>,
    storage_client: Mutex<Option<Arc<StorageClient>>>,
    feed_handle: Mutex<Option<ChangeFeedHandle>>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
    /// Warnings accumulated during connect (e.g. a non-fatal fetch failure).
    warnings: Mutex<Vec<String>>,
}

impl Showroom {
    /// Create a new Showroom from configuration. Does NOT connect --
    /// call [`connect()`](Self::connect) to fetch data and start tasks.
    pub fn new(config: BackendConfig) -> Self {
        let store = Arc::new(CatalogStore::new());
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);
        let (auth_user, _) = watch::channel(None);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        let cancel = CancellationToken::new();
        let cancel_child = cancel.child_token();

        Self {
            inner: Arc::new(ShowroomInner {
                config,
                store,
                tokens: TokenStore::new(),
                connection_state,
                auth_user,
                command_tx: Mutex::new(command_tx),
                command_rx: Mutex::new(Some(command_rx)),
                cancel,
                cancel_child: Mutex::new(cancel_child),
                store_client: Mutex::new(None),
                auth_client: Mutex::new(None),
                storage_client: Mutex::new(None),
                feed_handle: Mutex::new(None),
                task_handles: Mutex::new(Vec::new()),
                warnings: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Access the configuration.
    pub fn config(&self) -> &BackendConfig {
        &self.inner.config
    }

    /// Access the underlying CatalogStore.
    pub fn store(&self) -> &Arc<CatalogStore> {
        &self.inner.store
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Connect to the backend.
    ///
    /// Builds the HTTP clients, optionally signs in with configured
    /// credentials, performs an initial catalogue fetch, and spawns
    /// background tasks (change feed, periodic refresh, command
    /// processor).
    pub async fn connect(&self) -> Result<(), CoreError> {
        let _ = self
            .inner
            .connection_state
            .send(ConnectionState::Connecting);

        // Fresh child token for this session (supports reconnect).
        let child = self.inner.cancel.child_token();
        *self.inner.cancel_child.lock().await = child.clone();

        let config = &self.inner.config;
        let transport = TransportConfig {
            tls: config.tls.to_tls_mode(),
            timeout: config.timeout,
        };

        let result: Result<(), CoreError> = async {
            let store_client = Arc::new(StoreClient::new(
                config.url.clone(),
                &transport,
                self.inner.tokens.clone(),
            )?);
            let auth_client = Arc::new(AuthClient::new(
                config.url.clone(),
                &transport,
                self.inner.tokens.clone(),
            )?);
            let storage_client = Arc::new(StorageClient::new(
                config.url.clone(),
                &transport,
                self.inner.tokens.clone(),
            )?);

            *self.inner.store_client.lock().await = Some(store_client);
            *self.inner.auth_client.lock().await = Some(auth_client);
            *self.inner.storage_client.lock().await = Some(storage_client);

            // Config-profile driven sessions sign in up front; interactive
            // sessions browse anonymously until the login screen acts.
            if let Some(ref credentials) = config.credentials {
                self.login(&credentials.email, credentials.password.clone())
                    .await?;
            }

            self.full_refresh().await?;
            Ok(())
        }
        .await;

        if let Err(e) = result {
            let _ = self.inner.connection_state.send(ConnectionState::Failed);
            return Err(e);
        }

        // Spawn background tasks
        let mut handles = self.inner.task_handles.lock().await;

        if let Some(rx) = self.inner.command_rx.lock().await.take() {
            let facade = self.clone();
            let cancel = child.clone();
            handles.push(tokio::spawn(command_processor_task(facade, rx, cancel)));
        }

        if !config.refresh_interval.is_zero() {
            let facade = self.clone();
            let cancel = child.clone();
            let interval = config.refresh_interval;
            handles.push(tokio::spawn(refresh_task(facade, interval, cancel)));
        }

        if config.feed_enabled {
            self.spawn_feed(&child, &mut handles).await;
        }

        let _ = self.inner.connection_state.send(ConnectionState::Connected);
        info!("connected to backend");
        Ok(())
    }

    /// Spawn the change feed and a bridge task applying its events to the
    /// store. Non-fatal on failure -- periodic refresh still runs.
    async fn spawn_feed(&self, cancel: &CancellationToken, handles: &mut Vec<JoinHandle<()>>) {
        let mut ws_url = self.inner.config.url.clone();
        let scheme = if ws_url.scheme() == "https" { "wss" } else { "ws" };
        if ws_url.set_scheme(scheme).is_err() {
            warn!(url = %ws_url, "cannot derive feed URL");
            return;
        }
        ws_url.set_path("/v1/changes");

        let feed_cancel = cancel.child_token();
        let handle = match ChangeFeedHandle::connect(
            ws_url,
            ReconnectConfig::default(),
            feed_cancel.clone(),
            self.inner.tokens.current(),
        ) {
            Ok(h) => h,
            Err(e) => {
                warn!(error = %e, "change feed unavailable (non-fatal)");
                return;
            }
        };

        let rx = handle.subscribe();
        let store = Arc::clone(&self.inner.store);
        handles.push(tokio::spawn(feed_bridge_task(store, rx, feed_cancel)));

        // Stash the handle so disconnect() can shut it down.
        *self.inner.feed_handle.lock().await = Some(handle);
        info!("change feed spawned");
    }

    /// Disconnect from the backend.
    ///
    /// Cancels background tasks, signs out if a session is active, and
    /// resets the connection state.
    pub async fn disconnect(&self) {
        // Cancel the child token (not the parent -- allows reconnect).
        self.inner.cancel_child.lock().await.cancel();

        // Join all background tasks
        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }

        // Shut down the feed if active
        if let Some(handle) = self.inner.feed_handle.lock().await.take() {
            handle.shutdown();
        }

        // Sign out if a session is active
        if self.inner.tokens.is_set() {
            if let Some(ref client) = *self.inner.auth_client.lock().await {
                if let Err(e) = client.sign_out().await {
                    warn!(error = %e, "sign-out failed (non-fatal)");
                }
            }
        }
        let _ = self.inner.auth_user.send(None);

        *self.inner.store_client.lock().await = None;
        *self.inner.auth_client.lock().await = None;
        *self.inner.storage_client.lock().await = None;

        // Recreate the command channel so reconnects can spawn a fresh
        // receiver. The previous receiver is consumed by the processor task.
        {
            let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
            *self.inner.command_tx.lock().await = tx;
            *self.inner.command_rx.lock().await = Some(rx);
        }

        let _ = self
            .inner
            .connection_state
            .send(ConnectionState::Disconnected);
        debug!("disconnected");
    }

    /// Fetch all collections and update the CatalogStore.
    ///
    /// The car catalogue is the core dataset -- its failure is fatal.
    /// Review and profile fetches degrade gracefully: a failure leaves
    /// that collection un-synced (documents stay `Pending`, not falsely
    /// `Missing`) and records a warning.
    pub async fn full_refresh(&self) -> Result<(), CoreError> {
        let client = self.store_client().await?;
        let store = &self.inner.store;

        let query = DocumentQuery::new();
        let (cars_res, reviews_res, profiles_res) = tokio::join!(
            client.list(collections::CARS, &query),
            client.list(collections::REVIEWS, &query),
            client.list(collections::PROFILES, &query),
        );

        let cars = cars_res?;
        store.sync_cars(&cars);

        match reviews_res {
            Ok(docs) => store.sync_reviews(&docs),
            Err(e) => {
                warn!(error = %e, "review fetch failed");
                self.inner
                    .warnings
                    .lock()
                    .await
                    .push(format!("Reviews unavailable: {e}"));
            }
        }

        match profiles_res {
            Ok(docs) => store.sync_profiles(&docs),
            Err(e) => {
                warn!(error = %e, "profile fetch failed");
                self.inner
                    .warnings
                    .lock()
                    .await
                    .push(format!("Profiles unavailable: {e}"));
            }
        }

        store.mark_full_sync();
        debug!(
            cars = store.car_count(),
            reviews = store.review_count(),
            profiles = store.profile_count(),
            "full refresh applied"
        );
        Ok(())
    }

    /// Drain warnings accumulated since the last call.
    pub async fn take_warnings(&self) -> Vec<String> {
        std::mem::take(&mut *self.inner.warnings.lock().await)
    }

    // ── Auth ─────────────────────────────────────────────────────

    /// Sign in. On success the auth-user watch updates and the catalogue
    /// is refreshed (some collections may be gated behind a session).
    pub async fn login(&self, email: &str, password: SecretString) -> Result<AuthUser, CoreError> {
        let client = self.auth_client().await?;
        let session = client.sign_in(email, &password).await?;
        let user = session.user.clone();
        let _ = self.inner.auth_user.send(Some(user.clone()));

        if let Err(e) = self.full_refresh().await {
            warn!(error = %e, "post-login refresh failed");
        }
        Ok(user)
    }

    /// Create an account and seed its store profile with the default
    /// `user` role.
    pub async fn signup(
        &self,
        email: &str,
        password: SecretString,
        display_name: &str,
    ) -> Result<AuthUser, CoreError> {
        let client = self.auth_client().await?;
        let session = client.sign_up(email, &password, display_name).await?;
        let user = session.user.clone();

        let profile = UserProfile {
            id: DocumentId::from(user.uid.as_str()),
            display_name: display_name.to_owned(),
            email: email.to_owned(),
            role: crate::model::Role::User,
        };
        self.put_profile(&profile).await?;

        let _ = self.inner.auth_user.send(Some(user.clone()));
        Ok(user)
    }

    /// Sign out. The local session is cleared even if the backend call
    /// fails.
    pub async fn logout(&self) -> Result<(), CoreError> {
        let client = self.auth_client().await?;
        let result = client.sign_out().await;
        let _ = self.inner.auth_user.send(None);
        result.map_err(CoreError::from)
    }

    /// The live auth-user watch.
    pub fn auth_user(&self) -> watch::Receiver<Option<AuthUser>> {
        self.inner.auth_user.subscribe()
    }

    /// Whether a session token is currently installed.
    pub fn is_signed_in(&self) -> bool {
        self.inner.tokens.is_set()
    }

    // ── Subscriptions ────────────────────────────────────────────

    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    pub fn cars(&self) -> LiveQuery<Car> {
        self.inner.store.subscribe_cars()
    }

    pub fn reviews(&self) -> LiveQuery<Review> {
        self.inner.store.subscribe_reviews()
    }

    pub fn profiles(&self) -> LiveQuery<UserProfile> {
        self.inner.store.subscribe_profiles()
    }

    /// A review/author join over all reviews (admin view) or one car's.
    ///
    /// The board's lifetime belongs to the caller: cancel/drop it on
    /// unmount -- the `cancel` token passed here is its teardown handle.
    pub fn review_board(
        &self,
        car: Option<DocumentId>,
        sort: ReviewSort,
        cancel: CancellationToken,
    ) -> ReviewBoard {
        let mut query = self.reviews().with_sort(sort);
        if let Some(car_id) = car {
            query = query.with_filter(ReviewFilter::ByCar(car_id));
        }
        let profiles: Arc<dyn ProfileSource> = self.inner.store.clone();
        ReviewBoard::spawn(query, profiles, cancel)
    }

    /// Live identity (auth user joined with their profile document).
    pub fn identity(&self, cancel: CancellationToken) -> IdentityStream {
        let profiles: Arc<dyn ProfileSource> = self.inner.store.clone();
        IdentityStream::spawn(self.inner.auth_user.subscribe(), profiles, cancel)
    }

    // ── Commands ─────────────────────────────────────────────────

    /// Submit a command through the processor and wait for its result.
    pub async fn submit(&self, command: Command) -> Result<CommandResult, CoreError> {
        command.validate()?;

        let (response_tx, response_rx) = oneshot::channel();
        let envelope = CommandEnvelope {
            command,
            response_tx,
        };

        self.inner
            .command_tx
            .lock()
            .await
            .send(envelope)
            .await
            .map_err(|_| CoreError::NotConnected)?;

        response_rx
            .await
            .map_err(|_| CoreError::Internal("command processor dropped response".into()))?
    }

    // ── Assets ───────────────────────────────────────────────────

    /// Public URL for a car's model file, if it has one.
    pub async fn model_url(&self, car: &Car) -> Result<Option<String>, CoreError> {
        let Some(ref path) = car.model_file else {
            return Ok(None);
        };
        let client = self.storage_client().await?;
        Ok(Some(client.download_url(path)))
    }

    /// Download a model asset, reporting progress per chunk.
    pub async fn fetch_model(
        &self,
        url: &str,
        on_progress: impl FnMut(u64, Option<u64>),
    ) -> Result<Vec<u8>, CoreError> {
        let client = self.storage_client().await?;
        Ok(client.fetch_asset(url, on_progress).await?)
    }

    // ── Command execution (processor side) ───────────────────────

    async fn execute(&self, command: Command) -> Result<CommandResult, CoreError> {
        match command {
            Command::SaveCar { id, request } => {
                let store = &self.inner.store;
                let (id, created_at) = match id {
                    Some(id) => {
                        let existing = store.car(id.as_str());
                        let created =
                            existing.map_or_else(chrono::Utc::now, |c| c.created_at);
                        (id, created)
                    }
                    None => (DocumentId::generate(), chrono::Utc::now()),
                };

                let owner_id = self
                    .inner
                    .auth_user
                    .borrow()
                    .as_ref()
                    .map(|u| DocumentId::from(u.uid.as_str()));

                let car = Car {
                    id: id.clone(),
                    name: request.name.trim().to_owned(),
                    manufacturer: request.manufacturer.trim().to_owned(),
                    year: request.year,
                    colour: request.colour(),
                    model_file: request.model_file.clone(),
                    owner_id,
                    approved: request.approved,
                    created_at,
                };

                let client = self.store_client().await?;
                let saved = client
                    .put(collections::CARS, id.as_str(), &car.to_body())
                    .await?;
                let car = Car::from_document(&saved)?;
                store.upsert_car(car.clone());
                Ok(CommandResult::Car(car))
            }

            Command::ApproveCar { id } => {
                let store = &self.inner.store;
                let mut car = store
                    .car(id.as_str())
                    .map(|c| (*c).clone())
                    .ok_or_else(|| CoreError::NotFound {
                        entity: "car".into(),
                        identifier: id.to_string(),
                    })?;
                car.approved = true;

                let client = self.store_client().await?;
                let saved = client
                    .put(collections::CARS, id.as_str(), &car.to_body())
                    .await?;
                let car = Car::from_document(&saved)?;
                store.upsert_car(car.clone());
                Ok(CommandResult::Car(car))
            }

            Command::DeleteCar { id } => {
                let client = self.store_client().await?;
                client.delete(collections::CARS, id.as_str()).await?;
                self.inner.store.remove_car(id.as_str());
                Ok(CommandResult::Ok)
            }

            Command::SubmitReview(request) => {
                let user = self
                    .inner
                    .auth_user
                    .borrow()
                    .clone()
                    .ok_or(CoreError::NotSignedIn)?;

                // Prefer the live profile's display name; fall back to the
                // auth identity, then to an explicit placeholder.
                let author_name = self
                    .inner
                    .store
                    .profile(&user.uid)
                    .map(|p| p.display_name.clone())
                    .or_else(|| user.display_name.clone())
                    .unwrap_or_else(|| "Anonymous".into());

                let rating = Rating::new(request.rating)
                    .map_err(|message| CoreError::ValidationFailed { message })?;

                let review = Review {
                    id: DocumentId::generate(),
                    car_id: request.car_id,
                    author_id: DocumentId::from(user.uid.as_str()),
                    author_name,
                    rating,
                    comment: request.comment.trim().to_owned(),
                    created_at: chrono::Utc::now(),
                };

                let client = self.store_client().await?;
                let saved = client
                    .put(collections::REVIEWS, review.id.as_str(), &review.to_body())
                    .await?;
                let review = Review::from_document(&saved)?;
                self.inner.store.upsert_review(review.clone());
                Ok(CommandResult::Review(review))
            }

            Command::DeleteReview { id } => {
                let client = self.store_client().await?;
                client.delete(collections::REVIEWS, id.as_str()).await?;
                self.inner.store.remove_review(id.as_str());
                Ok(CommandResult::Ok)
            }

            Command::SaveProfile { id, request } => {
                let profile = UserProfile {
                    id,
                    display_name: request.display_name.trim().to_owned(),
                    email: request.email.trim().to_owned(),
                    role: request.role,
                };
                let profile = self.put_profile(&profile).await?;
                Ok(CommandResult::Profile(profile))
            }

            Command::DeleteUser { id } => {
                let client = self.store_client().await?;
                client.delete(collections::PROFILES, id.as_str()).await?;
                self.inner.store.remove_profile(id.as_str());
                Ok(CommandResult::Ok)
            }

            Command::UploadModel(request) => {
                let user = self
                    .inner
                    .auth_user
                    .borrow()
                    .clone()
                    .ok_or(CoreError::NotSignedIn)?;

                let path = format!(
                    "car-models/{}_{}_{}",
                    user.uid,
                    chrono::Utc::now().timestamp_millis(),
                    request.file_name
                );
                let client = self.storage_client().await?;
                let content_type = request.content_type();
                let url = client.upload(&path, request.bytes, content_type).await?;
                Ok(CommandResult::ModelUploaded { path, url })
            }
        }
    }

    async fn put_profile(&self, profile: &UserProfile) -> Result<UserProfile, CoreError> {
        let client = self.store_client().await?;
        let saved = client
            .put(collections::PROFILES, profile.id.as_str(), &profile.to_body())
            .await?;
        let profile = UserProfile::from_document(&saved)?;
        self.inner.store.upsert_profile(profile.clone());
        Ok(profile)
    }

    // ── Client handles ───────────────────────────────────────────

    async fn store_client(&self) -> Result<Arc<StoreClient>, CoreError> {
        self.inner
            .store_client
            .lock()
            .await
            .clone()
            .ok_or(CoreError::NotConnected)
    }

    async fn auth_client(&self) -> Result<Arc<AuthClient>, CoreError> {
        self.inner
            .auth_client
            .lock()
            .await
            .clone()
            .ok_or(CoreError::NotConnected)
    }

    async fn storage_client(&self) -> Result<Arc<StorageClient>, CoreError> {
        self.inner
            .storage_client
            .lock()
            .await
            .clone()
            .ok_or(CoreError::NotConnected)
    }
}

// ── Background tasks ─────────────────────────────────────────────────

/// Apply change-feed events to the store until cancelled.
async fn feed_bridge_task(
    store: Arc<CatalogStore>,
    mut rx: broadcast::Receiver<Arc<ChangeEvent>>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = rx.recv() => {
                match result {
                    Ok(event) => store.apply_change(&event),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "feed bridge: receiver lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }
    debug!("feed bridge shut down");
}

/// Periodic full refresh until cancelled.
async fn refresh_task(facade: Showroom, interval: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // The first tick fires immediately; connect() already refreshed.
    ticker.tick().await;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {
                if let Err(e) = facade.full_refresh().await {
                    warn!(error = %e, "periodic refresh failed");
                }
            }
        }
    }
    debug!("refresh task shut down");
}

/// Execute commands from the channel until it closes or we're cancelled.
async fn command_processor_task(
    facade: Showroom,
    mut rx: mpsc::Receiver<CommandEnvelope>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            envelope = rx.recv() => {
                let Some(envelope) = envelope else { break };
                let result = facade.execute(envelope.command).await;
                if let Err(ref e) = result {
                    warn!(error = %e, "command failed");
                }
                // Receiver may have given up waiting; that's fine.
                let _ = envelope.response_tx.send(result);
            }
        }
    }
    debug!("command processor shut down");
}
