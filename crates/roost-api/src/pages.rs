use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};

use roost_db::{FEED_LIMIT, Session};
use roost_types::pages::{Page, PageError, PageView, ProfileContent, ProfileHeader, ProfileTab};

use crate::convert::{
    message_view, mutual_follower, post_view, post_views, reply_view, user_profile,
    user_reply_view, user_row_summary, user_summaries,
};
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::notifications::view_notifications;
use crate::users::resolve_user;
use crate::wallet::wallet_summary;
use crate::{AppState, blocking};

/// GET /pages: the home feed.
pub async fn home(
    state: State<AppState>,
    me: Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    render(state, me, Page::Home).await
}

/// GET /pages/{*path}: everything one screen needs, in one response.
pub async fn view(
    state: State<AppState>,
    me: Extension<CurrentUser>,
    Path(path): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let page: Page = path
        .parse()
        .map_err(|e: PageError| ApiError::NotFound(page_kind(&e)))?;
    render(state, me, page).await
}

fn page_kind(err: &PageError) -> &'static str {
    match err {
        PageError::Unknown(_) => "page",
        PageError::InvalidPostId(_) => "post",
    }
}

/// A page is either fully loaded from the database or still needs
/// the wallet collaborator.
enum Loaded {
    Ready(PageView),
    Wallet { address: String },
}

async fn render(
    State(state): State<AppState>,
    Extension(me): Extension<CurrentUser>,
    page: Page,
) -> Result<Json<PageView>, ApiError> {
    let view = match blocking(&state, move |s| load(s, me.id, page)).await? {
        Loaded::Ready(view) => view,
        Loaded::Wallet { address } => PageView::Wallet(wallet_summary(&state, address).await),
    };
    Ok(Json(view))
}

fn load(s: &Session<'_>, me: i64, page: Page) -> Result<Loaded, ApiError> {
    let view = match page {
        Page::Home => PageView::Home {
            posts: post_views(s.feed(me, FEED_LIMIT)?),
        },
        Page::Explore => PageView::Explore {
            posts: post_views(s.recent_posts(Some(me), FEED_LIMIT)?),
        },
        Page::Notifications => PageView::Notifications {
            notifications: view_notifications(s, me)?,
        },
        Page::Messages { with } => {
            let partners = user_summaries(s.chat_partners(me)?);
            let (with, messages) = match with {
                Some(username) => {
                    let other = resolve_user(s, &username)?;
                    let messages = s
                        .messages_between(me, other.id)?
                        .into_iter()
                        .map(message_view)
                        .collect();
                    (Some(user_row_summary(other)), messages)
                }
                None => (None, vec![]),
            };
            PageView::Messages {
                partners,
                with,
                messages,
            }
        }
        Page::Bookmarks => PageView::Bookmarks {
            posts: post_views(s.bookmarked_posts(me)?),
        },
        Page::Wallet => {
            let user = s.get_user_by_id(me)?.ok_or(ApiError::NotFound("user"))?;
            return Ok(Loaded::Wallet {
                address: user.wallet_address,
            });
        }
        Page::Profile { username, tab } => {
            let user = resolve_user(s, &username)?;
            let content = match tab {
                ProfileTab::Posts => ProfileContent::Posts(post_views(
                    s.posts_for_user(user.id, Some(me), FEED_LIMIT)?,
                )),
                ProfileTab::Replies => ProfileContent::Replies(
                    s.replies_for_user(user.id)?
                        .into_iter()
                        .map(user_reply_view)
                        .collect(),
                ),
                ProfileTab::Likes => {
                    ProfileContent::Likes(post_views(s.liked_posts(user.id, Some(me))?))
                }
            };
            let header = ProfileHeader {
                follower_count: s.follower_count(user.id)?,
                following_count: s.following_count(user.id)?,
                is_me: user.id == me,
                is_following: s.is_following(me, user.id)?,
                mutual_followers: s
                    .common_followers(me, user.id)?
                    .into_iter()
                    .map(mutual_follower)
                    .collect(),
                user: user_profile(user),
            };
            PageView::Profile { header, content }
        }
        Page::Followers { username } => {
            let user = resolve_user(s, &username)?;
            PageView::Followers {
                users: user_summaries(s.followers(user.id)?),
                username: user.username,
            }
        }
        Page::Following { username } => {
            let user = resolve_user(s, &username)?;
            PageView::Following {
                users: user_summaries(s.following(user.id)?),
                username: user.username,
            }
        }
        Page::Reply { post_id } => {
            let post = s
                .get_post(post_id, Some(me))?
                .ok_or(ApiError::NotFound("post"))?;
            PageView::Reply {
                post: post_view(post),
                replies: s
                    .replies_for_post(post_id)?
                    .into_iter()
                    .map(reply_view)
                    .collect(),
            }
        }
        Page::CreatePost => PageView::CreatePost,
        Page::EditProfile => {
            let user = s.get_user_by_id(me)?.ok_or(ApiError::NotFound("user"))?;
            PageView::EditProfile {
                user: user_profile(user),
            }
        }
    };
    Ok(Loaded::Ready(view))
}
