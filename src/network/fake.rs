//! In-memory gateway for controller tests. Behaves like the deployed
//! contract: new posts start at zero likes, a like adds exactly one.

use super::{GatewayError, RemoteDataGateway};
use crate::post::{Post, PostId};
use async_trait::async_trait;
use ethers::types::{Address, U256};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};
use tokio::sync::Notify;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Identity,
    List,
    Create,
    Like,
}

struct State {
    identity: Result<Address, GatewayError>,
    posts: Vec<Post>,
    clock: u64,
    failures: HashMap<Op, GatewayError>,
    gates: HashMap<Op, Arc<Notify>>,
    calls: Vec<Op>,
}

pub struct FakeGateway {
    state: Mutex<State>,
}

impl FakeGateway {
    pub fn new(identity: Result<Address, GatewayError>) -> Self {
        Self {
            state: Mutex::new(State {
                identity,
                posts: Vec::new(),
                clock: 1_000,
                failures: HashMap::new(),
                gates: HashMap::new(),
                calls: Vec::new(),
            }),
        }
    }

    pub fn with_post(self, post: Post) -> Self {
        self.state.lock().unwrap().posts.push(post);
        self
    }

    /// Makes the next call of `op` fail with `err`
    pub fn fail_next(&self, op: Op, err: GatewayError) {
        self.state.lock().unwrap().failures.insert(op, err);
    }

    /// Makes the next call of `op` wait until the returned handle is notified
    pub fn hold_next(&self, op: Op) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state.lock().unwrap().gates.insert(op, gate.clone());
        gate
    }

    pub fn calls(&self, op: Op) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| **c == op)
            .count()
    }

    async fn pass_gate(&self, op: Op) {
        let gate = self.state.lock().unwrap().gates.remove(&op);
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }

    fn enter(&self, op: Op) -> Result<std::sync::MutexGuard<'_, State>, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(op);
        match state.failures.remove(&op) {
            Some(err) => Err(err),
            None => Ok(state),
        }
    }
}

#[async_trait]
impl RemoteDataGateway for FakeGateway {
    async fn request_identity(&self) -> Result<Address, GatewayError> {
        self.pass_gate(Op::Identity).await;
        self.enter(Op::Identity)?.identity.clone()
    }

    async fn list_posts(&self, author: Address) -> Result<Vec<Post>, GatewayError> {
        self.pass_gate(Op::List).await;
        let state = self.enter(Op::List)?;
        Ok(state
            .posts
            .iter()
            .filter(|p| p.author == author)
            .cloned()
            .collect())
    }

    async fn create_post(&self, author: Address, content: &str) -> Result<(), GatewayError> {
        self.pass_gate(Op::Create).await;
        let mut state = self.enter(Op::Create)?;
        let id = state.posts.iter().filter(|p| p.author == author).count();
        state.clock += 10;
        let timestamp = state.clock;
        state.posts.push(Post {
            id: (id as u64).into(),
            author,
            content: content.to_owned(),
            timestamp: timestamp.into(),
            likes: U256::zero(),
        });
        Ok(())
    }

    async fn like_post(&self, author: Address, id: PostId) -> Result<(), GatewayError> {
        self.pass_gate(Op::Like).await;
        let mut state = self.enter(Op::Like)?;
        match state
            .posts
            .iter_mut()
            .find(|p| p.author == author && p.id == id)
        {
            Some(post) => {
                post.likes += U256::one();
                Ok(())
            }
            None => Err(GatewayError::Call("execution reverted: tweet does not exist".to_owned())),
        }
    }
}
