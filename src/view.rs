use super::address::{display_address, short_address};
use super::controller::Command;
use super::post::{Post, PostId};
use ethers::types::{Address, U256};
use std::fmt;

pub const DEFAULT_AVATAR_BASE: &str = "https://avatars.dicebear.com/api/human";
pub const CONNECT_PROMPT: &str = "Connect your wallet to start posting.";
pub const SUBMIT_LABEL: &str = "Tweet";

/// Busy controls are disabled and show a spinner instead of their label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlState {
    Idle,
    Busy,
}

impl ControlState {
    pub fn is_busy(&self) -> bool {
        *self == ControlState::Busy
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LikeControl {
    pub author: Address,
    pub id: PostId,
    pub likes: U256,
    pub state: ControlState,
}

impl LikeControl {
    /// Command dispatched when the control is activated
    pub fn command(&self) -> Command {
        Command::LikePost {
            author: self.author,
            id: self.id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostBlock {
    pub avatar_url: String,
    pub author_label: String,
    pub content: String,
    pub like: LikeControl,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmitControl {
    /// The form stays hidden until an account is connected
    pub visible: bool,
    pub state: ControlState,
}

/// Everything the client shows: status line, post form and the feed.
///
/// Rendering never patches the feed, it is replaced as a whole.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    /// Shown while disconnected; `None` hides the message
    pub connect_message: Option<String>,
    pub account_label: Option<String>,
    pub submit: SubmitControl,
    pub feed: Vec<PostBlock>,
}

impl Default for Surface {
    fn default() -> Self {
        Self {
            connect_message: Some(CONNECT_PROMPT.to_owned()),
            account_label: None,
            submit: SubmitControl {
                visible: false,
                state: ControlState::Idle,
            },
            feed: Vec::new(),
        }
    }
}

impl Surface {
    #[cfg(test)]
    pub fn like_control(&self, author: Address, id: PostId) -> Option<&LikeControl> {
        self.feed
            .iter()
            .map(|block| &block.like)
            .find(|like| like.author == author && like.id == id)
    }

    pub fn like_control_mut(&mut self, author: Address, id: PostId) -> Option<&mut LikeControl> {
        self.feed
            .iter_mut()
            .map(|block| &mut block.like)
            .find(|like| like.author == author && like.id == id)
    }

    pub fn to_html(&self) -> String {
        let mut html = String::new();

        html.push_str("<div id=\"userAddress\">");
        if let Some(label) = &self.account_label {
            html.push_str(&escape(label));
        }
        html.push_str("</div>\n");

        if let Some(message) = &self.connect_message {
            html.push_str(&format!(
                "<div id=\"connectMessage\">{}</div>\n",
                escape(message)
            ));
        }

        if self.submit.visible {
            let button = match self.submit.state {
                ControlState::Idle => {
                    format!("<button id=\"tweetSubmitBtn\">{}</button>", SUBMIT_LABEL)
                }
                ControlState::Busy => {
                    "<button id=\"tweetSubmitBtn\" disabled><div class=\"spinner\"></div></button>"
                        .to_owned()
                }
            };
            html.push_str(&format!(
                "<form id=\"tweetForm\"><textarea id=\"tweetContent\"></textarea>{}</form>\n",
                button
            ));
        }

        html.push_str("<div id=\"tweetsContainer\">\n");
        for block in &self.feed {
            let like = &block.like;
            let inner = match like.state {
                ControlState::Idle => format!(
                    "<i class=\"far fa-heart\"></i><span class=\"likes-count\">{}</span>",
                    like.likes
                ),
                ControlState::Busy => "<div class=\"spinner\"></div>".to_owned(),
            };
            html.push_str(&format!(
                concat!(
                    "<div class=\"tweet\">",
                    "<img class=\"user-icon\" src=\"{}\" alt=\"User Icon\">",
                    "<div class=\"tweet-inner\">",
                    "<div class=\"author\">{}</div>",
                    "<div class=\"content\">{}</div>",
                    "<button class=\"like-button\" data-id=\"{}\" data-author=\"{}\"{}>{}</button>",
                    "</div></div>\n"
                ),
                escape(&block.avatar_url),
                escape(&block.author_label),
                escape(&block.content),
                like.id,
                display_address(&like.author),
                if like.state.is_busy() { " disabled" } else { "" },
                inner,
            ));
        }
        html.push_str("</div>\n");
        html
    }
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(label) = &self.account_label {
            writeln!(f, "{}", label)?;
        }
        if let Some(message) = &self.connect_message {
            writeln!(f, "{}", message)?;
        }
        if self.submit.visible && self.submit.state.is_busy() {
            writeln!(f, "[posting...]")?;
        }
        for block in &self.feed {
            let like = &block.like;
            let likes = match like.state {
                ControlState::Idle => format!("<3 {}", like.likes),
                ControlState::Busy => "<3 ...".to_owned(),
            };
            writeln!(
                f,
                "#{} {}: {}  [{}]",
                like.id, block.author_label, block.content, likes
            )?;
        }
        Ok(())
    }
}

/// Projects posts onto a `Surface`
#[derive(Debug, Clone)]
pub struct Renderer {
    avatar_base: String,
    short_start: usize,
    short_end: usize,
}

impl Renderer {
    pub fn new(avatar_base: impl Into<String>, short_start: usize, short_end: usize) -> Self {
        Self {
            avatar_base: avatar_base.into(),
            short_start,
            short_end,
        }
    }

    pub fn label(&self, address: &Address) -> String {
        short_address(&display_address(address), self.short_start, self.short_end)
    }

    pub fn avatar_url(&self, author: &Address) -> String {
        format!(
            "{}/{}.svg",
            self.avatar_base.trim_end_matches('/'),
            display_address(author)
        )
    }

    /// Replaces the feed with one block per post, in the given order
    pub fn render(&self, posts: &[Post], surface: &mut Surface) {
        surface.feed = posts
            .iter()
            .map(|post| PostBlock {
                avatar_url: self.avatar_url(&post.author),
                author_label: self.label(&post.author),
                content: post.content.clone(),
                like: LikeControl {
                    author: post.author,
                    id: post.id,
                    likes: post.likes,
                    state: ControlState::Idle,
                },
            })
            .collect();
    }

    pub fn show_connected(&self, account: &Address, surface: &mut Surface) {
        surface.account_label = Some(format!("Connected: {}", self.label(account)));
        surface.connect_message = None;
        surface.submit.visible = true;
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(
            DEFAULT_AVATAR_BASE,
            super::address::DEFAULT_START,
            super::address::DEFAULT_END,
        )
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
