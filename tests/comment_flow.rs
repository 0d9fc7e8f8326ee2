use crux_core::testing::AppTester;

use picstream_shared::api::{AddCommentResponse, CommentPayload, DeleteCommentResponse, EditCommentResponse};
use picstream_shared::capabilities::{HttpError, HttpResponse};
use picstream_shared::event::{CommentSeed, PageContext, PageSeed, LikeSeed};
use picstream_shared::model::Page;
use picstream_shared::view::PageView;
use picstream_shared::{html, App, CommentId, Effect, Event, Model, PostId, Username, ViewModel};

const POST: PostId = PostId::new(7);

fn detail_page(
    csrf_token: Option<&str>,
    comments: Vec<CommentSeed>,
    comments_count: u32,
) -> Event {
    Event::PageLoaded(Box::new(PageContext {
        csrf_token: csrf_token.map(String::from),
        prefers_dark: false,
        seed: PageSeed::PostDetail {
            post_id: POST,
            like: LikeSeed {
                post_id: POST,
                liked: false,
                likes_count: 0,
            },
            images_count: 1,
            comments,
            comments_count,
        },
    }))
}

fn seed_comment(id: u64, author: &str, text: &str) -> CommentSeed {
    CommentSeed {
        id: CommentId::new(id),
        author: Username::new(author),
        author_avatar: None,
        text: text.into(),
        created_label: "2h ago".into(),
    }
}

fn added_comment_response(id: u64, author: &str, text: &str, comments_count: u32) -> Event {
    let body = AddCommentResponse {
        success: true,
        comment: CommentPayload {
            id: CommentId::new(id),
            author: Username::new(author),
            author_avatar: None,
            text: text.into(),
        },
        comments_count,
    };
    Event::AddCommentResponse {
        result: Box::new(Ok(HttpResponse::ok_json(&body))),
    }
}

fn http_count(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|e| matches!(e, Effect::Http(_)))
        .count()
}

fn comments_view(model: &Model) -> picstream_shared::view::CommentsView {
    match ViewModel::from(model).page {
        PageView::PostDetail { comments, .. } => comments,
        other => panic!("expected post detail page, got {other:?}"),
    }
}

#[test]
fn rapid_resubmits_issue_exactly_one_request() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    app.update(detail_page(Some("token"), vec![], 0), &mut model);
    app.update(
        Event::CommentInputChanged {
            text: "First post!".into(),
        },
        &mut model,
    );

    let mut requests = 0;
    for _ in 0..5 {
        let update = app.update(Event::CommentSubmitted, &mut model);
        requests += http_count(&update.effects);
    }

    assert_eq!(requests, 1, "double submits must be swallowed by the guard");
}

#[test]
fn add_comment_renders_item_and_updates_count() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    app.update(detail_page(Some("token"), vec![], 0), &mut model);
    app.update(
        Event::CommentInputChanged { text: "hi".into() },
        &mut model,
    );
    app.update(Event::CommentSubmitted, &mut model);
    app.update(added_comment_response(42, "alice", "hi", 1), &mut model);

    let view = comments_view(&model);
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.items[0].id, CommentId::new(42));
    assert_eq!(view.items[0].text, "hi");
    assert_eq!(view.items[0].author, "alice");
    assert_eq!(view.items[0].profile_href, "/profile/alice/");
    assert_eq!(view.items[0].created_label, "Just now");
    assert_eq!(view.count, 1);
    assert!(view.count_visible);
    assert!(!view.show_empty_placeholder);
    // Composer is cleared and re-enabled for the next comment.
    assert_eq!(view.composer.text, "");
    assert_eq!(view.composer.submit_label, "Post");
}

#[test]
fn added_comment_fragment_is_addressable() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    app.update(detail_page(Some("token"), vec![], 0), &mut model);
    app.update(
        Event::CommentInputChanged { text: "hi".into() },
        &mut model,
    );
    app.update(Event::CommentSubmitted, &mut model);
    app.update(added_comment_response(42, "alice", "hi", 1), &mut model);

    let Page::PostDetail(detail) = &model.page else {
        panic!("expected post detail page");
    };
    let fragment = html::comment_fragment(&detail.thread.comments[0]);
    assert!(fragment.contains(r#"data-comment-id="42""#));
    assert!(fragment.contains(r#"href="/profile/alice/""#));
    assert!(fragment.contains(">hi</span>"));
}

#[test]
fn duplicate_response_delivery_renders_exactly_one_item() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    app.update(detail_page(Some("token"), vec![], 0), &mut model);
    app.update(
        Event::CommentInputChanged { text: "hi".into() },
        &mut model,
    );
    app.update(Event::CommentSubmitted, &mut model);

    app.update(added_comment_response(42, "alice", "hi", 1), &mut model);
    app.update(added_comment_response(42, "alice", "hi", 1), &mut model);

    let view = comments_view(&model);
    assert_eq!(view.items.len(), 1);
    assert_eq!(
        view.items
            .iter()
            .filter(|i| i.id == CommentId::new(42))
            .count(),
        1
    );
}

#[test]
fn server_rendered_comments_are_never_readded() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    app.update(
        detail_page(Some("token"), vec![seed_comment(42, "alice", "hi")], 1),
        &mut model,
    );

    // A stray redelivery for a comment the server already rendered.
    app.update(added_comment_response(42, "alice", "hi", 1), &mut model);

    let view = comments_view(&model);
    assert_eq!(view.items.len(), 1);
}

#[test]
fn failed_add_comment_raises_notice_and_allows_immediate_retry() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    app.update(detail_page(Some("token"), vec![], 0), &mut model);
    app.update(
        Event::CommentInputChanged { text: "hi".into() },
        &mut model,
    );
    app.update(Event::CommentSubmitted, &mut model);

    app.update(
        Event::AddCommentResponse {
            result: Box::new(Ok(HttpResponse::new(500, b"{}".to_vec()))),
        },
        &mut model,
    );

    let view = ViewModel::from(&model);
    assert!(view.notice.is_some(), "failure must surface a notice");

    let comments = comments_view(&model);
    assert_eq!(comments.items.len(), 0, "failure must not mutate the list");
    assert!(
        comments.composer.can_submit,
        "composer must be re-enabled after failure"
    );

    // Same text, immediately: the duplicate window was forgotten.
    let update = app.update(Event::CommentSubmitted, &mut model);
    assert_eq!(http_count(&update.effects), 1);
}

#[test]
fn transport_failure_releases_guard() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    app.update(detail_page(Some("token"), vec![], 0), &mut model);
    app.update(
        Event::CommentInputChanged { text: "hi".into() },
        &mut model,
    );
    app.update(Event::CommentSubmitted, &mut model);

    app.update(
        Event::AddCommentResponse {
            result: Box::new(Err(HttpError::Network {
                message: "connection reset".into(),
            })),
        },
        &mut model,
    );

    let view = comments_view(&model);
    assert!(view.composer.can_submit);
    assert!(ViewModel::from(&model).notice.is_some());
}

#[test]
fn missing_csrf_token_refuses_submission() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    app.update(detail_page(None, vec![], 0), &mut model);
    app.update(
        Event::CommentInputChanged { text: "hi".into() },
        &mut model,
    );
    let update = app.update(Event::CommentSubmitted, &mut model);

    assert_eq!(http_count(&update.effects), 0);
}

#[test]
fn blank_comment_is_refused_locally() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    app.update(detail_page(Some("token"), vec![], 0), &mut model);
    app.update(
        Event::CommentInputChanged { text: "   ".into() },
        &mut model,
    );
    let update = app.update(Event::CommentSubmitted, &mut model);

    assert_eq!(http_count(&update.effects), 0);
}

#[test]
fn deleting_last_comment_shows_empty_state() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    app.update(
        detail_page(Some("token"), vec![seed_comment(42, "alice", "hi")], 1),
        &mut model,
    );

    let update = app.update(
        Event::CommentDeleteRequested {
            comment_id: CommentId::new(42),
        },
        &mut model,
    );
    assert_eq!(http_count(&update.effects), 1);

    let body = DeleteCommentResponse {
        success: true,
        comments_count: 0,
    };
    app.update(
        Event::DeleteCommentResponse {
            comment_id: CommentId::new(42),
            result: Box::new(Ok(HttpResponse::ok_json(&body))),
        },
        &mut model,
    );

    let view = comments_view(&model);
    assert_eq!(view.items.len(), 0);
    assert_eq!(view.count, 0);
    assert!(!view.count_visible);
    assert!(view.show_empty_placeholder);
}

#[test]
fn delete_failure_keeps_entry_and_raises_notice() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    app.update(
        detail_page(Some("token"), vec![seed_comment(42, "alice", "hi")], 1),
        &mut model,
    );
    app.update(
        Event::CommentDeleteRequested {
            comment_id: CommentId::new(42),
        },
        &mut model,
    );
    app.update(
        Event::DeleteCommentResponse {
            comment_id: CommentId::new(42),
            result: Box::new(Ok(HttpResponse::new(403, b"{}".to_vec()))),
        },
        &mut model,
    );

    let view = comments_view(&model);
    assert_eq!(view.items.len(), 1);
    assert!(!view.items[0].busy);
    assert!(ViewModel::from(&model).notice.is_some());
}

#[test]
fn edit_cancel_restores_original_text() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    app.update(
        detail_page(Some("token"), vec![seed_comment(42, "alice", "original")], 1),
        &mut model,
    );

    app.update(
        Event::CommentEditStarted {
            comment_id: CommentId::new(42),
        },
        &mut model,
    );
    app.update(
        Event::CommentEditInputChanged {
            comment_id: CommentId::new(42),
            text: "changed".into(),
        },
        &mut model,
    );
    app.update(
        Event::CommentEditCancelled {
            comment_id: CommentId::new(42),
        },
        &mut model,
    );

    let view = comments_view(&model);
    assert_eq!(view.items[0].text, "original");
    assert!(view.items[0].editing_draft.is_none());
}

#[test]
fn edit_save_adopts_server_normalized_text() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    app.update(
        detail_page(Some("token"), vec![seed_comment(42, "alice", "original")], 1),
        &mut model,
    );

    app.update(
        Event::CommentEditStarted {
            comment_id: CommentId::new(42),
        },
        &mut model,
    );
    app.update(
        Event::CommentEditInputChanged {
            comment_id: CommentId::new(42),
            text: "  updated  ".into(),
        },
        &mut model,
    );
    let update = app.update(
        Event::CommentEditSubmitted {
            comment_id: CommentId::new(42),
        },
        &mut model,
    );
    assert_eq!(http_count(&update.effects), 1);

    let body = EditCommentResponse {
        success: true,
        text: "updated".into(),
    };
    app.update(
        Event::EditCommentResponse {
            comment_id: CommentId::new(42),
            result: Box::new(Ok(HttpResponse::ok_json(&body))),
        },
        &mut model,
    );

    let view = comments_view(&model);
    assert_eq!(view.items[0].text, "updated");
    assert!(view.items[0].editing_draft.is_none());
    assert!(!view.items[0].busy);
}

#[test]
fn edit_failure_stays_in_editing_state() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    app.update(
        detail_page(Some("token"), vec![seed_comment(42, "alice", "original")], 1),
        &mut model,
    );
    app.update(
        Event::CommentEditStarted {
            comment_id: CommentId::new(42),
        },
        &mut model,
    );
    app.update(
        Event::CommentEditSubmitted {
            comment_id: CommentId::new(42),
        },
        &mut model,
    );
    app.update(
        Event::EditCommentResponse {
            comment_id: CommentId::new(42),
            result: Box::new(Err(HttpError::Timeout { timeout_ms: 30_000 })),
        },
        &mut model,
    );

    let view = comments_view(&model);
    assert_eq!(view.items[0].text, "original");
    assert!(view.items[0].editing_draft.is_some());
    assert!(ViewModel::from(&model).notice.is_some());
}
