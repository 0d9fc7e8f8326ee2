//! Everything that can happen: user gestures from the shell and capability
//! results coming back. Large payloads are boxed to keep the enum small.

use serde::{Deserialize, Serialize};

use crate::capabilities::{HttpResult, KvResult};
use crate::{CommentId, ImageId, PostId, Username};

/// Server-rendered state the shell scrapes out of the page at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LikeSeed {
    pub post_id: PostId,
    pub liked: bool,
    pub likes_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentSeed {
    pub id: CommentId,
    pub author: Username,
    #[serde(default)]
    pub author_avatar: Option<String>,
    pub text: String,
    pub created_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "page", rename_all = "snake_case")]
pub enum PageSeed {
    Feed {
        posts: Vec<LikeSeed>,
    },
    PostDetail {
        post_id: PostId,
        like: LikeSeed,
        images_count: usize,
        comments: Vec<CommentSeed>,
        comments_count: u32,
    },
    Profile {
        username: Username,
        is_following: bool,
        followers_count: u32,
    },
    PostForm {
        post_id: PostId,
        image_ids: Vec<ImageId>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageContext {
    /// Anti-forgery token scraped from page markup; mutations are refused
    /// locally when it is absent.
    pub csrf_token: Option<String>,
    /// System color-scheme preference, used when no stored flag exists.
    pub prefers_dark: bool,
    pub seed: PageSeed,
}

#[derive(Debug, Clone)]
pub enum Event {
    // Lifecycle
    PageLoaded(Box<PageContext>),

    // Likes (feed and post detail)
    LikeToggled {
        post_id: PostId,
    },
    LikeResponse {
        post_id: PostId,
        result: Box<HttpResult>,
    },

    // Follow (profile)
    FollowToggled {
        username: Username,
    },
    FollowResponse {
        username: Username,
        result: Box<HttpResult>,
    },

    // Comment composer
    CommentInputChanged {
        text: String,
    },
    CommentSubmitted,
    AddCommentResponse {
        result: Box<HttpResult>,
    },

    // Existing comments
    CommentDeleteRequested {
        comment_id: CommentId,
    },
    DeleteCommentResponse {
        comment_id: CommentId,
        result: Box<HttpResult>,
    },
    CommentEditStarted {
        comment_id: CommentId,
    },
    CommentEditInputChanged {
        comment_id: CommentId,
        text: String,
    },
    CommentEditSubmitted {
        comment_id: CommentId,
    },
    CommentEditCancelled {
        comment_id: CommentId,
    },
    EditCommentResponse {
        comment_id: CommentId,
        result: Box<HttpResult>,
    },

    // Carousel and post menu
    CarouselNext,
    CarouselPrev,
    CarouselSelected {
        index: usize,
    },
    MenuToggled,
    MenuDismissed,

    // Image management on the post form
    ImageMoved {
        from: usize,
        to: usize,
    },
    ImageDeleteToggled {
        image_id: ImageId,
    },
    ImageOrderCommitted,
    ReorderImagesResponse {
        result: Box<HttpResult>,
    },

    // Theme
    ThemeToggled,
    ThemeLoaded {
        result: Box<KvResult>,
    },
    ThemeStored {
        result: Box<KvResult>,
    },

    // Notices
    NoticeDismissed,
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::PageLoaded(_) => "page_loaded",
            Self::LikeToggled { .. } => "like_toggled",
            Self::LikeResponse { .. } => "like_response",
            Self::FollowToggled { .. } => "follow_toggled",
            Self::FollowResponse { .. } => "follow_response",
            Self::CommentInputChanged { .. } => "comment_input_changed",
            Self::CommentSubmitted => "comment_submitted",
            Self::AddCommentResponse { .. } => "add_comment_response",
            Self::CommentDeleteRequested { .. } => "comment_delete_requested",
            Self::DeleteCommentResponse { .. } => "delete_comment_response",
            Self::CommentEditStarted { .. } => "comment_edit_started",
            Self::CommentEditInputChanged { .. } => "comment_edit_input_changed",
            Self::CommentEditSubmitted { .. } => "comment_edit_submitted",
            Self::CommentEditCancelled { .. } => "comment_edit_cancelled",
            Self::EditCommentResponse { .. } => "edit_comment_response",
            Self::CarouselNext => "carousel_next",
            Self::CarouselPrev => "carousel_prev",
            Self::CarouselSelected { .. } => "carousel_selected",
            Self::MenuToggled => "menu_toggled",
            Self::MenuDismissed => "menu_dismissed",
            Self::ImageMoved { .. } => "image_moved",
            Self::ImageDeleteToggled { .. } => "image_delete_toggled",
            Self::ImageOrderCommitted => "image_order_committed",
            Self::ReorderImagesResponse { .. } => "reorder_images_response",
            Self::ThemeToggled => "theme_toggled",
            Self::ThemeLoaded { .. } => "theme_loaded",
            Self::ThemeStored { .. } => "theme_stored",
            Self::NoticeDismissed => "notice_dismissed",
        }
    }

    /// Whether the event originates from a user gesture rather than a
    /// capability result.
    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        !matches!(
            self,
            Self::PageLoaded(_)
                | Self::LikeResponse { .. }
                | Self::FollowResponse { .. }
                | Self::AddCommentResponse { .. }
                | Self::DeleteCommentResponse { .. }
                | Self::EditCommentResponse { .. }
                | Self::ReorderImagesResponse { .. }
                | Self::ThemeLoaded { .. }
                | Self::ThemeStored { .. }
        )
    }
}
