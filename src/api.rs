//! Server endpoints and wire types.
//!
//! The backend is server-rendered and same-origin; every path here is
//! relative to the page origin. All mutating endpoints expect the
//! anti-forgery token in the `X-CSRFToken` header.

use serde::{Deserialize, Serialize};

use crate::{CommentId, ImageId, PostId, Username};

#[must_use]
pub fn like_path(post_id: PostId) -> String {
    format!("/post/{post_id}/like/")
}

#[must_use]
pub fn follow_path(username: &Username) -> String {
    format!("/profile/{username}/follow/")
}

#[must_use]
pub fn add_comment_path(post_id: PostId) -> String {
    format!("/post/{post_id}/comment/")
}

#[must_use]
pub fn delete_comment_path(post_id: PostId, comment_id: CommentId) -> String {
    format!("/post/{post_id}/comment/{comment_id}/delete/")
}

#[must_use]
pub fn edit_comment_path(post_id: PostId, comment_id: CommentId) -> String {
    format!("/post/{post_id}/comment/{comment_id}/edit/")
}

#[must_use]
pub fn reorder_images_path(post_id: PostId) -> String {
    format!("/post/{post_id}/reorder-images/")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentRequest {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderImagesRequest {
    pub order: Vec<ImageId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeToggleResponse {
    pub liked: bool,
    pub likes_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowToggleResponse {
    pub is_following: bool,
    pub followers_count: u32,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentPayload {
    pub id: CommentId,
    pub author: Username,
    #[serde(default)]
    pub author_avatar: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddCommentResponse {
    pub success: bool,
    pub comment: CommentPayload,
    pub comments_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteCommentResponse {
    pub success: bool,
    pub comments_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditCommentResponse {
    pub success: bool,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_match_server_routes() {
        assert_eq!(like_path(PostId::new(7)), "/post/7/like/");
        assert_eq!(
            follow_path(&Username::new("alice")),
            "/profile/alice/follow/"
        );
        assert_eq!(add_comment_path(PostId::new(7)), "/post/7/comment/");
        assert_eq!(
            delete_comment_path(PostId::new(7), CommentId::new(42)),
            "/post/7/comment/42/delete/"
        );
        assert_eq!(
            edit_comment_path(PostId::new(7), CommentId::new(42)),
            "/post/7/comment/42/edit/"
        );
        assert_eq!(
            reorder_images_path(PostId::new(7)),
            "/post/7/reorder-images/"
        );
    }

    #[test]
    fn add_comment_response_parses_without_avatar() {
        let body = br#"{
            "success": true,
            "comment": {"id": 42, "author": "alice", "text": "hi"},
            "comments_count": 3
        }"#;
        let parsed: AddCommentResponse = serde_json::from_slice(body).unwrap();
        assert!(parsed.success);
        assert_eq!(parsed.comment.id, CommentId::new(42));
        assert_eq!(parsed.comment.author.as_str(), "alice");
        assert!(parsed.comment.author_avatar.is_none());
        assert_eq!(parsed.comments_count, 3);
    }

    #[test]
    fn follow_response_carries_optional_error() {
        let body = br#"{"is_following": false, "followers_count": 10, "error": "nope"}"#;
        let parsed: FollowToggleResponse = serde_json::from_slice(body).unwrap();
        assert_eq!(parsed.error.as_deref(), Some("nope"));

        let body = br#"{"is_following": true, "followers_count": 11}"#;
        let parsed: FollowToggleResponse = serde_json::from_slice(body).unwrap();
        assert!(parsed.error.is_none());
    }

    #[test]
    fn reorder_request_serializes_order_array() {
        let req = ReorderImagesRequest {
            order: vec![ImageId::new(3), ImageId::new(1), ImageId::new(2)],
        };
        assert_eq!(
            serde_json::to_string(&req).unwrap(),
            r#"{"order":[3,1,2]}"#
        );
    }
}
