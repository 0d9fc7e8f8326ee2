//! Core state. One `Model` per page view; navigation replaces the page
//! state wholesale, which is what scopes the dedup set and all guards to
//! the lifetime of the view.

use serde::{Deserialize, Serialize};

use crate::dedup::RenderedIds;
use crate::event::{CommentSeed, LikeSeed, PageSeed};
use crate::guard::SubmissionGuard;
use crate::{AppError, CommentId, ImageId, PostId, Username};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

/// Like button for one post. Toggling flips the state optimistically and
/// keeps a snapshot of the last server-confirmed values for rollback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeControl {
    pub post_id: PostId,
    pub liked: bool,
    pub likes_count: u32,
    pub busy: bool,
    snapshot: Option<(bool, u32)>,
}

impl LikeControl {
    #[must_use]
    pub fn new(seed: &LikeSeed) -> Self {
        Self {
            post_id: seed.post_id,
            liked: seed.liked,
            likes_count: seed.likes_count,
            busy: false,
            snapshot: None,
        }
    }

    /// Apply the optimistic flip. Returns `false` when a toggle is already
    /// outstanding for this control.
    pub fn begin_toggle(&mut self) -> bool {
        if self.busy {
            return false;
        }
        self.busy = true;
        self.snapshot = Some((self.liked, self.likes_count));
        self.liked = !self.liked;
        self.likes_count = if self.liked {
            self.likes_count.saturating_add(1)
        } else {
            self.likes_count.saturating_sub(1)
        };
        true
    }

    /// Adopt the server-confirmed state.
    pub fn commit(&mut self, liked: bool, likes_count: u32) {
        self.busy = false;
        self.snapshot = None;
        self.liked = liked;
        self.likes_count = likes_count;
    }

    /// Restore the pre-toggle state.
    pub fn rollback(&mut self) {
        self.busy = false;
        if let Some((liked, likes_count)) = self.snapshot.take() {
            self.liked = liked;
            self.likes_count = likes_count;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowControl {
    pub username: Username,
    pub is_following: bool,
    pub followers_count: u32,
    pub busy: bool,
    snapshot: Option<(bool, u32)>,
}

impl FollowControl {
    #[must_use]
    pub fn new(username: Username, is_following: bool, followers_count: u32) -> Self {
        Self {
            username,
            is_following,
            followers_count,
            busy: false,
            snapshot: None,
        }
    }

    pub fn begin_toggle(&mut self) -> bool {
        if self.busy {
            return false;
        }
        self.busy = true;
        self.snapshot = Some((self.is_following, self.followers_count));
        self.is_following = !self.is_following;
        self.followers_count = if self.is_following {
            self.followers_count.saturating_add(1)
        } else {
            self.followers_count.saturating_sub(1)
        };
        true
    }

    pub fn commit(&mut self, is_following: bool, followers_count: u32) {
        self.busy = false;
        self.snapshot = None;
        self.is_following = is_following;
        self.followers_count = followers_count;
    }

    pub fn rollback(&mut self) {
        self.busy = false;
        if let Some((is_following, followers_count)) = self.snapshot.take() {
            self.is_following = is_following;
            self.followers_count = followers_count;
        }
    }
}

/// Per-comment display/editing state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum EntryState {
    #[default]
    Display,
    Editing {
        draft: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentEntry {
    pub id: CommentId,
    pub author: Username,
    pub author_avatar: Option<String>,
    pub text: String,
    pub created_label: String,
    pub state: EntryState,
    /// A delete or edit-save request for this entry is outstanding.
    pub busy: bool,
}

impl CommentEntry {
    #[must_use]
    pub fn from_seed(seed: &CommentSeed) -> Self {
        Self {
            id: seed.id,
            author: seed.author.clone(),
            author_avatar: seed.author_avatar.clone(),
            text: seed.text.clone(),
            created_label: seed.created_label.clone(),
            state: EntryState::Display,
            busy: false,
        }
    }

    #[must_use]
    pub const fn is_editing(&self) -> bool {
        matches!(self.state, EntryState::Editing { .. })
    }

    pub fn begin_edit(&mut self) {
        if !self.busy {
            self.state = EntryState::Editing {
                draft: self.text.clone(),
            };
        }
    }

    pub fn cancel_edit(&mut self) {
        self.state = EntryState::Display;
    }

    pub fn apply_saved(&mut self, text: String) {
        self.text = text;
        self.state = EntryState::Display;
        self.busy = false;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Composer {
    pub text: String,
    pub guard: SubmissionGuard,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentThread {
    pub comments: Vec<CommentEntry>,
    pub comments_count: u32,
    pub rendered: RenderedIds,
    pub composer: Composer,
}

impl CommentThread {
    #[must_use]
    pub fn from_seeds(seeds: &[CommentSeed], comments_count: u32) -> Self {
        Self {
            comments: seeds.iter().map(CommentEntry::from_seed).collect(),
            comments_count,
            rendered: RenderedIds::seeded(seeds.iter().map(|s| s.id)),
            composer: Composer::default(),
        }
    }

    #[must_use]
    pub fn entry_mut(&mut self, id: CommentId) -> Option<&mut CommentEntry> {
        self.comments.iter_mut().find(|c| c.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: CommentId) -> bool {
        self.comments.iter().any(|c| c.id == id)
    }

    pub fn remove(&mut self, id: CommentId) {
        self.comments.retain(|c| c.id != id);
    }
}

/// Image position indicator for posts with more than one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Carousel {
    pub images_count: usize,
    pub current: usize,
}

impl Carousel {
    #[must_use]
    pub const fn new(images_count: usize) -> Self {
        Self {
            images_count,
            current: 0,
        }
    }

    pub fn next(&mut self) {
        if self.images_count > 0 {
            self.current = (self.current + 1) % self.images_count;
        }
    }

    pub fn prev(&mut self) {
        if self.images_count > 0 {
            self.current = (self.current + self.images_count - 1) % self.images_count;
        }
    }

    pub fn select(&mut self, index: usize) {
        if index < self.images_count {
            self.current = index;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDetail {
    pub post_id: PostId,
    pub like: LikeControl,
    pub carousel: Option<Carousel>,
    pub menu_open: bool,
    pub thread: CommentThread,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageTile {
    pub id: ImageId,
    pub marked_for_delete: bool,
}

/// Existing-image management on the post form: order, delete marks, and
/// the last server-confirmed order used to roll a failed reorder back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageEditor {
    pub post_id: PostId,
    pub tiles: Vec<ImageTile>,
    pub busy: bool,
    confirmed_order: Vec<ImageId>,
}

impl ImageEditor {
    #[must_use]
    pub fn new(post_id: PostId, image_ids: &[ImageId]) -> Self {
        Self {
            post_id,
            tiles: image_ids
                .iter()
                .map(|&id| ImageTile {
                    id,
                    marked_for_delete: false,
                })
                .collect(),
            busy: false,
            confirmed_order: image_ids.to_vec(),
        }
    }

    pub fn move_tile(&mut self, from: usize, to: usize) {
        if from < self.tiles.len() && to < self.tiles.len() && from != to {
            let tile = self.tiles.remove(from);
            self.tiles.insert(to, tile);
        }
    }

    pub fn toggle_delete_mark(&mut self, id: ImageId) {
        if let Some(tile) = self.tiles.iter_mut().find(|t| t.id == id) {
            tile.marked_for_delete = !tile.marked_for_delete;
        }
    }

    #[must_use]
    pub fn order(&self) -> Vec<ImageId> {
        self.tiles.iter().map(|t| t.id).collect()
    }

    pub fn begin_commit(&mut self) -> bool {
        if self.busy {
            return false;
        }
        self.busy = true;
        true
    }

    /// The server accepted the current order.
    pub fn commit(&mut self) {
        self.busy = false;
        self.confirmed_order = self.order();
    }

    /// Restore the last server-confirmed order. Delete marks are local
    /// form state and survive the rollback.
    pub fn rollback(&mut self) {
        self.busy = false;
        let mut restored = Vec::with_capacity(self.tiles.len());
        for id in &self.confirmed_order {
            if let Some(pos) = self.tiles.iter().position(|t| t.id == *id) {
                restored.push(self.tiles.remove(pos));
            }
        }
        restored.append(&mut self.tiles);
        self.tiles = restored;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Page {
    #[default]
    Blank,
    Feed {
        likes: Vec<LikeControl>,
    },
    PostDetail(PostDetail),
    Profile {
        follow: FollowControl,
    },
    PostForm {
        editor: ImageEditor,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Model {
    pub csrf_token: Option<String>,
    pub theme: Theme,
    pub prefers_dark: bool,
    pub page: Page,
    pub active_notice: Option<AppError>,
}

impl Model {
    /// Replace the page state for a fresh page view. Everything scoped to
    /// the previous view (guards, dedup set, snapshots) is dropped here.
    pub fn load_page(&mut self, csrf_token: Option<String>, prefers_dark: bool, seed: &PageSeed) {
        self.csrf_token = csrf_token;
        self.prefers_dark = prefers_dark;
        self.active_notice = None;
        if self.theme == Theme::Light && prefers_dark {
            self.theme = Theme::Dark;
        }

        self.page = match seed {
            PageSeed::Feed { posts } => Page::Feed {
                likes: posts.iter().map(LikeControl::new).collect(),
            },
            PageSeed::PostDetail {
                post_id,
                like,
                images_count,
                comments,
                comments_count,
            } => Page::PostDetail(PostDetail {
                post_id: *post_id,
                like: LikeControl::new(like),
                carousel: (*images_count > 1).then(|| Carousel::new(*images_count)),
                menu_open: false,
                thread: CommentThread::from_seeds(comments, *comments_count),
            }),
            PageSeed::Profile {
                username,
                is_following,
                followers_count,
            } => Page::Profile {
                follow: FollowControl::new(username.clone(), *is_following, *followers_count),
            },
            PageSeed::PostForm { post_id, image_ids } => Page::PostForm {
                editor: ImageEditor::new(*post_id, image_ids),
            },
        };
    }

    pub fn set_notice(&mut self, error: AppError) {
        self.active_notice = Some(error);
    }

    pub fn clear_notice(&mut self) {
        self.active_notice = None;
    }

    /// Like controls can live on the feed or the detail page.
    #[must_use]
    pub fn like_control_mut(&mut self, post_id: PostId) -> Option<&mut LikeControl> {
        match &mut self.page {
            Page::Feed { likes } => likes.iter_mut().find(|l| l.post_id == post_id),
            Page::PostDetail(detail) if detail.post_id == post_id => Some(&mut detail.like),
            _ => None,
        }
    }

    #[must_use]
    pub fn detail_mut(&mut self) -> Option<&mut PostDetail> {
        match &mut self.page {
            Page::PostDetail(detail) => Some(detail),
            _ => None,
        }
    }

    #[must_use]
    pub fn follow_mut(&mut self, username: &Username) -> Option<&mut FollowControl> {
        match &mut self.page {
            Page::Profile { follow } if &follow.username == username => Some(follow),
            _ => None,
        }
    }

    #[must_use]
    pub fn editor_mut(&mut self) -> Option<&mut ImageEditor> {
        match &mut self.page {
            Page::PostForm { editor } => Some(editor),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn like_seed() -> LikeSeed {
        LikeSeed {
            post_id: PostId::new(1),
            liked: false,
            likes_count: 2,
        }
    }

    #[test]
    fn like_toggle_is_optimistic_and_rolls_back() {
        let mut like = LikeControl::new(&like_seed());
        assert!(like.begin_toggle());
        assert!(like.liked);
        assert_eq!(like.likes_count, 3);

        like.rollback();
        assert!(!like.liked);
        assert_eq!(like.likes_count, 2);
        assert!(!like.busy);
    }

    #[test]
    fn like_toggle_rejects_while_busy() {
        let mut like = LikeControl::new(&like_seed());
        assert!(like.begin_toggle());
        assert!(!like.begin_toggle());
    }

    #[test]
    fn like_commit_adopts_server_values() {
        let mut like = LikeControl::new(&like_seed());
        like.begin_toggle();
        like.commit(true, 7);
        assert!(like.liked);
        assert_eq!(like.likes_count, 7);
        assert!(!like.busy);
    }

    #[test]
    fn unlike_does_not_underflow_count() {
        let mut like = LikeControl::new(&LikeSeed {
            post_id: PostId::new(1),
            liked: true,
            likes_count: 0,
        });
        like.begin_toggle();
        assert_eq!(like.likes_count, 0);
    }

    #[test]
    fn entry_edit_cancel_restores_text() {
        let mut entry = CommentEntry::from_seed(&CommentSeed {
            id: CommentId::new(1),
            author: Username::new("alice"),
            author_avatar: None,
            text: "original".into(),
            created_label: "2h ago".into(),
        });

        entry.begin_edit();
        assert!(entry.is_editing());
        entry.cancel_edit();
        assert_eq!(entry.text, "original");
        assert!(!entry.is_editing());
    }

    #[test]
    fn entry_edit_blocked_while_busy() {
        let mut entry = CommentEntry::from_seed(&CommentSeed {
            id: CommentId::new(1),
            author: Username::new("alice"),
            author_avatar: None,
            text: "original".into(),
            created_label: "2h ago".into(),
        });
        entry.busy = true;
        entry.begin_edit();
        assert!(!entry.is_editing());
    }

    #[test]
    fn carousel_wraps_both_directions() {
        let mut carousel = Carousel::new(3);
        carousel.prev();
        assert_eq!(carousel.current, 2);
        carousel.next();
        assert_eq!(carousel.current, 0);
        carousel.select(1);
        assert_eq!(carousel.current, 1);
        carousel.select(9);
        assert_eq!(carousel.current, 1);
    }

    #[test]
    fn image_editor_rolls_back_to_confirmed_order() {
        let ids = [ImageId::new(1), ImageId::new(2), ImageId::new(3)];
        let mut editor = ImageEditor::new(PostId::new(1), &ids);

        editor.move_tile(0, 2);
        assert_eq!(
            editor.order(),
            vec![ImageId::new(2), ImageId::new(3), ImageId::new(1)]
        );

        // Failed commit: back to the seeded order.
        assert!(editor.begin_commit());
        editor.rollback();
        assert_eq!(editor.order(), ids.to_vec());

        // Successful commit makes the new order the rollback target.
        editor.move_tile(0, 1);
        assert!(editor.begin_commit());
        editor.commit();
        editor.move_tile(1, 0);
        editor.begin_commit();
        editor.rollback();
        assert_eq!(
            editor.order(),
            vec![ImageId::new(2), ImageId::new(1), ImageId::new(3)]
        );
    }

    #[test]
    fn image_editor_rollback_preserves_delete_marks() {
        let ids = [ImageId::new(1), ImageId::new(2)];
        let mut editor = ImageEditor::new(PostId::new(1), &ids);

        editor.toggle_delete_mark(ImageId::new(2));
        editor.move_tile(0, 1);
        editor.begin_commit();
        editor.rollback();

        assert_eq!(editor.order(), ids.to_vec());
        assert!(editor.tiles[1].marked_for_delete);
    }

    #[test]
    fn load_page_drops_previous_view_state() {
        let mut model = Model::default();
        model.load_page(
            Some("token".into()),
            false,
            &PageSeed::PostDetail {
                post_id: PostId::new(1),
                like: like_seed(),
                images_count: 1,
                comments: vec![],
                comments_count: 0,
            },
        );
        model.set_notice(AppError::new(crate::ErrorKind::Network, "x"));

        model.load_page(Some("token".into()), false, &PageSeed::Feed { posts: vec![] });
        assert!(model.active_notice.is_none());
        assert!(matches!(model.page, Page::Feed { .. }));
    }
}
