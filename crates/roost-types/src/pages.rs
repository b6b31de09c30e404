use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::{
    MessageView, MutualFollower, NotificationView, PostView, ReplyView, UserProfile,
    UserReplyView, UserSummary, WalletSummary,
};

/// Every screen the client can navigate to, with its own parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    Home,
    Explore,
    Notifications,
    Messages { with: Option<String> },
    Bookmarks,
    Wallet,
    Profile { username: String, tab: ProfileTab },
    Followers { username: String },
    Following { username: String },
    Reply { post_id: i64 },
    CreatePost,
    EditProfile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileTab {
    #[default]
    Posts,
    Replies,
    Likes,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PageError {
    #[error("unknown page: {0}")]
    Unknown(String),
    #[error("invalid post id: {0}")]
    InvalidPostId(String),
}

impl FromStr for Page {
    type Err = PageError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let page = match segments.as_slice() {
            [] | ["home"] => Page::Home,
            ["explore"] => Page::Explore,
            ["notifications"] => Page::Notifications,
            ["messages"] => Page::Messages { with: None },
            ["messages", username] => Page::Messages {
                with: Some(username.to_string()),
            },
            ["bookmarks"] => Page::Bookmarks,
            ["wallet"] => Page::Wallet,
            ["compose"] => Page::CreatePost,
            ["settings", "profile"] => Page::EditProfile,
            ["profile", username] => Page::Profile {
                username: username.to_string(),
                tab: ProfileTab::Posts,
            },
            ["profile", username, "replies"] => Page::Profile {
                username: username.to_string(),
                tab: ProfileTab::Replies,
            },
            ["profile", username, "likes"] => Page::Profile {
                username: username.to_string(),
                tab: ProfileTab::Likes,
            },
            ["profile", username, "followers"] => Page::Followers {
                username: username.to_string(),
            },
            ["profile", username, "following"] => Page::Following {
                username: username.to_string(),
            },
            ["reply", id] => Page::Reply {
                post_id: id
                    .parse()
                    .map_err(|_| PageError::InvalidPostId(id.to_string()))?,
            },
            _ => return Err(PageError::Unknown(path.to_string())),
        };

        Ok(page)
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Page::Home => write!(f, "/home"),
            Page::Explore => write!(f, "/explore"),
            Page::Notifications => write!(f, "/notifications"),
            Page::Messages { with: None } => write!(f, "/messages"),
            Page::Messages { with: Some(u) } => write!(f, "/messages/{}", u),
            Page::Bookmarks => write!(f, "/bookmarks"),
            Page::Wallet => write!(f, "/wallet"),
            Page::Profile { username, tab } => match tab {
                ProfileTab::Posts => write!(f, "/profile/{}", username),
                ProfileTab::Replies => write!(f, "/profile/{}/replies", username),
                ProfileTab::Likes => write!(f, "/profile/{}/likes", username),
            },
            Page::Followers { username } => write!(f, "/profile/{}/followers", username),
            Page::Following { username } => write!(f, "/profile/{}/following", username),
            Page::Reply { post_id } => write!(f, "/reply/{}", post_id),
            Page::CreatePost => write!(f, "/compose"),
            Page::EditProfile => write!(f, "/settings/profile"),
        }
    }
}

/// Header block shown on top of every profile tab.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileHeader {
    pub user: UserProfile,
    pub follower_count: i64,
    pub following_count: i64,
    pub is_me: bool,
    pub is_following: bool,
    pub mutual_followers: Vec<MutualFollower>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "tab", content = "items", rename_all = "snake_case")]
pub enum ProfileContent {
    Posts(Vec<PostView>),
    Replies(Vec<UserReplyView>),
    Likes(Vec<PostView>),
}

/// The data behind one page, fetched in a single request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "page", content = "data", rename_all = "snake_case")]
pub enum PageView {
    Home {
        posts: Vec<PostView>,
    },
    Explore {
        posts: Vec<PostView>,
    },
    Notifications {
        notifications: Vec<NotificationView>,
    },
    Messages {
        partners: Vec<UserSummary>,
        with: Option<UserSummary>,
        messages: Vec<MessageView>,
    },
    Bookmarks {
        posts: Vec<PostView>,
    },
    Wallet(WalletSummary),
    Profile {
        header: ProfileHeader,
        content: ProfileContent,
    },
    Followers {
        username: String,
        users: Vec<UserSummary>,
    },
    Following {
        username: String,
        users: Vec<UserSummary>,
    },
    Reply {
        post: PostView,
        replies: Vec<ReplyView>,
    },
    CreatePost,
    EditProfile {
        user: UserProfile,
    },
}
