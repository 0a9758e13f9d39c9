use ethers::types::{Address, U256};

pub type PostId = U256;

/// A post as the contract returns it. Never mutated after a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: PostId,
    pub author: Address,
    /// Author supplied, unsanitized
    pub content: String,
    /// Block time in seconds, kept at the contract's full width
    pub timestamp: U256,
    pub likes: U256,
}

/// Raw `(id, author, content, timestamp, likes)` tuple of the contract's
/// `Tweet` struct
pub type RawPost = (U256, Address, String, U256, U256);

impl From<RawPost> for Post {
    fn from((id, author, content, timestamp, likes): RawPost) -> Self {
        Self {
            id,
            author,
            content,
            timestamp,
            likes,
        }
    }
}

/// Orders posts newest first.
///
/// The sort is stable, so posts sharing a timestamp keep the order the
/// contract returned them in.
pub fn newest_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}
