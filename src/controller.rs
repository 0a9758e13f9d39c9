use super::network::{GatewayError, RemoteDataGateway};
use super::post::{newest_first, PostId};
use super::view::{ControlState, Renderer, Surface};
use ethers::types::Address;
use futures::{
    future::{self, BoxFuture},
    stream::FuturesUnordered,
    FutureExt, StreamExt,
};
use log::{debug, error, info, warn};
use std::sync::{Arc, Mutex};
use tokio::{
    select,
    sync::{mpsc, watch},
};

pub const NO_PROVIDER_MESSAGE: &str = "No web3 provider detected. Please install MetaMask.";
pub const USER_REJECTED_MESSAGE: &str = "Please connect to MetaMask.";

/// User intents produced by the surface
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Connect,
    SubmitPost(String),
    LikePost { author: Address, id: PostId },
    /// Re-runs the connected render without a mutation
    Refresh,
}

/// Local session state. `active_account` is set by a successful connect
/// and never cleared.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Session {
    active_account: Option<Address>,
}

impl Session {
    pub fn active_account(&self) -> Option<Address> {
        self.active_account
    }
}

/// Everything a running command needs, cheap to clone into concurrently
/// running futures
struct Cycle<G> {
    gateway: Arc<G>,
    renderer: Arc<Renderer>,
    surface: Arc<watch::Sender<Surface>>,
    session: Arc<Mutex<Session>>,
}

impl<G> Clone for Cycle<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            renderer: self.renderer.clone(),
            surface: self.surface.clone(),
            session: self.session.clone(),
        }
    }
}

impl<G: RemoteDataGateway + 'static> Cycle<G> {
    fn active_account(&self) -> Option<Address> {
        self.session.lock().unwrap().active_account()
    }

    /// Future running `command` to completion. Mutations and refreshes
    /// arriving before a connect are logged and dropped.
    fn execute(self, command: Command) -> BoxFuture<'static, ()> {
        match (command, self.active_account()) {
            (Command::Connect, _) => async move {
                let _ = self.connect().await;
            }
            .boxed(),
            (Command::Refresh, Some(account)) => async move {
                if let Err(e) = self.refresh(account).await {
                    error!("Error loading posts: {}", e);
                }
            }
            .boxed(),
            (Command::SubmitPost(content), Some(account)) => self.submit(account, content).boxed(),
            (Command::LikePost { author, id }, Some(account)) => {
                self.like(account, author, id).boxed()
            }
            (command, None) => {
                warn!("(sync) ignoring {:?} while disconnected", command);
                future::ready(()).boxed()
            }
        }
    }

    /// Requests the wallet identity. On success the session becomes
    /// connected and the account's posts are rendered; on failure the
    /// session is left untouched and the connect message says why.
    async fn connect(self) -> Result<Address, GatewayError> {
        let account = match self.gateway.request_identity().await {
            Ok(account) => account,
            Err(e) => {
                let message = match &e {
                    GatewayError::NoProvider => {
                        error!("No web3 provider detected");
                        NO_PROVIDER_MESSAGE.to_owned()
                    }
                    GatewayError::UserRejected => {
                        warn!("Please connect to MetaMask.");
                        USER_REJECTED_MESSAGE.to_owned()
                    }
                    other => {
                        error!("Error connecting wallet: {}", other);
                        format!("Could not connect wallet: {}", other)
                    }
                };
                self.surface
                    .send_modify(|surface| surface.connect_message = Some(message));
                return Err(e);
            }
        };

        info!("(sync) connected as {:?}", account);
        self.session.lock().unwrap().active_account = Some(account);
        self.surface
            .send_modify(|surface| self.renderer.show_connected(&account, surface));

        if let Err(e) = self.refresh(account).await {
            error!("Error loading posts: {}", e);
        }
        Ok(account)
    }

    /// Fetches the posts of `account`, newest first, and replaces the feed
    async fn refresh(&self, account: Address) -> Result<(), GatewayError> {
        let mut posts = self.gateway.list_posts(account).await?;
        newest_first(&mut posts);
        debug!("(sync) rendering {} posts", posts.len());
        self.surface
            .send_modify(|surface| self.renderer.render(&posts, surface));
        Ok(())
    }

    async fn submit(self, account: Address, content: String) {
        self.surface
            .send_modify(|surface| surface.submit.state = ControlState::Busy);

        match self.gateway.create_post(account, &content).await {
            Ok(()) => {
                info!("(sync) post created");
                if let Err(e) = self.refresh(account).await {
                    error!("Error loading posts: {}", e);
                }
            }
            Err(e) => error!("Error creating post: {}", e),
        }

        self.surface
            .send_modify(|surface| surface.submit.state = ControlState::Idle);
    }

    /// A failed like leaves its control busy; only a later render replaces it
    async fn like(self, account: Address, author: Address, id: PostId) {
        self.surface.send_modify(|surface| {
            if let Some(control) = surface.like_control_mut(author, id) {
                control.state = ControlState::Busy;
            }
        });

        if let Err(e) = self.gateway.like_post(author, id).await {
            error!("Error liking post {} of {:?}: {}", id, author, e);
            return;
        }
        info!("(sync) liked post {} of {:?}", id, author);

        if let Err(e) = self.refresh(account).await {
            error!("Error loading posts: {}", e);
        }
    }
}

/// Drives connect, render and the mutate then re-render cycles.
///
/// The surface lives in a `watch` channel; every render replaces the feed,
/// so when several cycles overlap the last one to finish wins.
pub struct SyncController<G> {
    cycle: Cycle<G>,
}

impl<G: RemoteDataGateway + 'static> SyncController<G> {
    pub fn new(gateway: Arc<G>, renderer: Renderer) -> Self {
        let (surface, _) = watch::channel(Surface::default());
        Self {
            cycle: Cycle {
                gateway,
                renderer: Arc::new(renderer),
                surface: Arc::new(surface),
                session: Arc::new(Mutex::new(Session::default())),
            },
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Surface> {
        self.cycle.surface.subscribe()
    }

    #[cfg(test)]
    pub fn session(&self) -> Session {
        self.cycle.session.lock().unwrap().clone()
    }

    #[cfg(test)]
    pub fn surface(&self) -> Surface {
        self.cycle.surface.borrow().clone()
    }

    #[cfg(test)]
    pub async fn connect(&self) -> Result<Address, GatewayError> {
        self.cycle.clone().connect().await
    }

    /// Future handling `command`. It owns what it needs, so several can be
    /// in flight at once.
    pub fn dispatch(&self, command: Command) -> BoxFuture<'static, ()> {
        self.cycle.clone().execute(command)
    }

    /// Consumes commands until the sender side is dropped.
    ///
    /// Every command runs concurrently with the ones still in flight, each
    /// racing to re-render; the loop waits for them before returning.
    pub async fn run(self, mut commands: mpsc::Receiver<Command>) {
        let mut in_flight = FuturesUnordered::new();
        loop {
            select! {
                command = commands.recv() => {
                    match command {
                        Some(command) => in_flight.push(self.dispatch(command)),
                        None => break,
                    }
                }
                Some(()) = in_flight.next(), if !in_flight.is_empty() => {
                    debug!("(sync) {} commands still in flight", in_flight.len());
                }
            }
        }

        while in_flight.next().await.is_some() {}
        debug!("(sync) command channel closed");
    }
}
