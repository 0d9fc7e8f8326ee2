//! View models: everything the shell needs to render, derived fresh from
//! the model on every render effect. Visual attributes (label text, count
//! visibility, placeholder) are computed here so shells stay dumb.

use serde::{Deserialize, Serialize};

use crate::html;
use crate::model::{
    Carousel, CommentEntry, CommentThread, EntryState, FollowControl, ImageEditor, LikeControl,
    Model, Page, Theme,
};
use crate::{AppError, CommentId, ImageId, PostId};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct NoticeView {
    pub message: String,
    pub code: String,
}

impl From<&AppError> for NoticeView {
    fn from(e: &AppError) -> Self {
        Self {
            message: e.user_facing_message(),
            code: e.code().to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LikeButtonView {
    pub post_id: PostId,
    pub liked: bool,
    pub likes_count: u32,
    pub count_visible: bool,
    pub busy: bool,
}

impl From<&LikeControl> for LikeButtonView {
    fn from(like: &LikeControl) -> Self {
        Self {
            post_id: like.post_id,
            liked: like.liked,
            likes_count: like.likes_count,
            count_visible: like.likes_count > 0,
            busy: like.busy,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FollowButtonView {
    pub username: String,
    pub is_following: bool,
    pub label: String,
    pub followers_count: u32,
    pub busy: bool,
}

impl From<&FollowControl> for FollowButtonView {
    fn from(follow: &FollowControl) -> Self {
        let label = if follow.busy {
            "...".to_string()
        } else if follow.is_following {
            "Unfollow".to_string()
        } else {
            "Follow".to_string()
        };
        Self {
            username: follow.username.as_str().to_string(),
            is_following: follow.is_following,
            label,
            followers_count: follow.followers_count,
            busy: follow.busy,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComposerView {
    pub text: String,
    pub can_submit: bool,
    pub submit_label: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommentItemView {
    pub id: CommentId,
    pub author: String,
    pub profile_href: String,
    pub author_avatar: Option<String>,
    pub text: String,
    pub created_label: String,
    /// Draft text while the entry is in its inline-edit state.
    pub editing_draft: Option<String>,
    pub busy: bool,
}

impl From<&CommentEntry> for CommentItemView {
    fn from(entry: &CommentEntry) -> Self {
        Self {
            id: entry.id,
            author: entry.author.as_str().to_string(),
            profile_href: html::profile_href(entry.author.as_str()),
            author_avatar: entry.author_avatar.clone(),
            text: entry.text.clone(),
            created_label: entry.created_label.clone(),
            editing_draft: match &entry.state {
                EntryState::Display => None,
                EntryState::Editing { draft } => Some(draft.clone()),
            },
            busy: entry.busy,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommentsView {
    pub items: Vec<CommentItemView>,
    pub count: u32,
    pub count_visible: bool,
    pub show_empty_placeholder: bool,
    pub composer: ComposerView,
}

impl From<&CommentThread> for CommentsView {
    fn from(thread: &CommentThread) -> Self {
        let trimmed = thread.composer.text.trim();
        let in_flight = thread.composer.guard.is_in_flight();
        Self {
            items: thread.comments.iter().map(CommentItemView::from).collect(),
            count: thread.comments_count,
            count_visible: thread.comments_count > 0,
            show_empty_placeholder: thread.comments.is_empty(),
            composer: ComposerView {
                text: thread.composer.text.clone(),
                can_submit: !trimmed.is_empty() && !in_flight,
                submit_label: if in_flight { "Posting..." } else { "Post" }.to_string(),
            },
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CarouselView {
    pub current: usize,
    pub images_count: usize,
    /// 1-based position for the "n / m" indicator.
    pub position: usize,
}

impl From<&Carousel> for CarouselView {
    fn from(carousel: &Carousel) -> Self {
        Self {
            current: carousel.current,
            images_count: carousel.images_count,
            position: carousel.current + 1,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageTileView {
    pub id: ImageId,
    pub marked_for_delete: bool,
    pub is_cover: bool,
    pub delete_label: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageEditorView {
    pub tiles: Vec<ImageTileView>,
    pub saving: bool,
}

impl From<&ImageEditor> for ImageEditorView {
    fn from(editor: &ImageEditor) -> Self {
        Self {
            tiles: editor
                .tiles
                .iter()
                .enumerate()
                .map(|(i, tile)| ImageTileView {
                    id: tile.id,
                    marked_for_delete: tile.marked_for_delete,
                    is_cover: i == 0,
                    delete_label: if tile.marked_for_delete {
                        "Restore".to_string()
                    } else {
                        "Delete".to_string()
                    },
                })
                .collect(),
            saving: editor.busy,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageView {
    Blank,
    Feed {
        likes: Vec<LikeButtonView>,
    },
    PostDetail {
        post_id: PostId,
        like: LikeButtonView,
        carousel: Option<CarouselView>,
        menu_open: bool,
        comments: CommentsView,
    },
    Profile {
        follow: FollowButtonView,
    },
    PostForm {
        editor: ImageEditorView,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViewModel {
    pub theme: Theme,
    pub dark: bool,
    pub notice: Option<NoticeView>,
    pub page: PageView,
}

impl From<&Model> for ViewModel {
    fn from(model: &Model) -> Self {
        let page = match &model.page {
            Page::Blank => PageView::Blank,
            Page::Feed { likes } => PageView::Feed {
                likes: likes.iter().map(LikeButtonView::from).collect(),
            },
            Page::PostDetail(detail) => PageView::PostDetail {
                post_id: detail.post_id,
                like: LikeButtonView::from(&detail.like),
                carousel: detail.carousel.as_ref().map(CarouselView::from),
                menu_open: detail.menu_open,
                comments: CommentsView::from(&detail.thread),
            },
            Page::Profile { follow } => PageView::Profile {
                follow: FollowButtonView::from(follow),
            },
            Page::PostForm { editor } => PageView::PostForm {
                editor: ImageEditorView::from(editor),
            },
        };

        Self {
            theme: model.theme,
            dark: model.theme == Theme::Dark,
            notice: model.active_notice.as_ref().map(NoticeView::from),
            page,
        }
    }
}
