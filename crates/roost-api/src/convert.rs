//! Row → API model mapping.

use chrono::{DateTime, Utc};
use tracing::warn;

use roost_db::models::{
    MessageRow, MutualFollowerRow, NotificationRow, PostRow, ReplyRow, UserReplyRow, UserRow,
    UserSummaryRow,
};
use roost_types::models::{
    MessageView, MutualFollower, NotificationView, PostView, ReplyView, UserProfile,
    UserReplyView, UserSummary,
};

/// Epoch seconds (as stored) to a UTC timestamp.
pub fn timestamp(secs: f64) -> DateTime<Utc> {
    DateTime::from_timestamp_micros((secs * 1_000_000.0).round() as i64).unwrap_or_else(|| {
        warn!("Corrupt timestamp {}", secs);
        DateTime::default()
    })
}

pub fn user_profile(row: UserRow) -> UserProfile {
    UserProfile {
        id: row.id,
        username: row.username,
        display_name: row.display_name,
        bio: row.bio,
        profile_pic_path: row.profile_pic_path,
        wallet_address: row.wallet_address,
        created_at: timestamp(row.created_at),
    }
}

pub fn user_summary(row: UserSummaryRow) -> UserSummary {
    UserSummary {
        id: row.id,
        username: row.username,
        display_name: row.display_name,
        bio: row.bio,
        profile_pic_path: row.profile_pic_path,
    }
}

/// The summary card for a full user row.
pub fn user_row_summary(row: UserRow) -> UserSummary {
    UserSummary {
        id: row.id,
        username: row.username,
        display_name: row.display_name,
        bio: row.bio,
        profile_pic_path: row.profile_pic_path,
    }
}

pub fn user_summaries(rows: Vec<UserSummaryRow>) -> Vec<UserSummary> {
    rows.into_iter().map(user_summary).collect()
}

pub fn mutual_follower(row: MutualFollowerRow) -> MutualFollower {
    MutualFollower {
        username: row.username,
        profile_pic_path: row.profile_pic_path,
    }
}

pub fn post_view(row: PostRow) -> PostView {
    PostView {
        id: row.id,
        user_id: row.user_id,
        username: row.username,
        display_name: row.display_name,
        profile_pic_path: row.profile_pic_path,
        text: row.text,
        image_path: row.image_path,
        orig_post_id: row.orig_post_id,
        created_at: timestamp(row.created_at),
        like_count: row.like_count,
        reply_count: row.reply_count,
        liked_by_me: row.liked_by_me,
        bookmarked_by_me: row.bookmarked_by_me,
    }
}

pub fn post_views(rows: Vec<PostRow>) -> Vec<PostView> {
    rows.into_iter().map(post_view).collect()
}

pub fn reply_view(row: ReplyRow) -> ReplyView {
    ReplyView {
        id: row.id,
        post_id: row.post_id,
        user_id: row.user_id,
        username: row.username,
        display_name: row.display_name,
        text: row.text,
        created_at: timestamp(row.created_at),
    }
}

pub fn user_reply_view(row: UserReplyRow) -> UserReplyView {
    UserReplyView {
        reply_id: row.reply_id,
        reply_text: row.reply_text,
        reply_created_at: timestamp(row.reply_created_at),
        orig_post_id: row.orig_post_id,
        orig_text: row.orig_text,
        orig_image_path: row.orig_image_path,
        orig_created_at: timestamp(row.orig_created_at),
        orig_username: row.orig_username,
        orig_display_name: row.orig_display_name,
        orig_profile_pic_path: row.orig_profile_pic_path,
    }
}

pub fn message_view(row: MessageRow) -> MessageView {
    MessageView {
        id: row.id,
        sender_id: row.sender_id,
        receiver_id: row.receiver_id,
        sender_username: row.sender_username,
        receiver_username: row.receiver_username,
        text: row.text,
        created_at: timestamp(row.created_at),
    }
}

pub fn notification_view(row: NotificationRow) -> NotificationView {
    NotificationView {
        id: row.id,
        text: row.text,
        seen: row.seen,
        created_at: timestamp(row.created_at),
    }
}
