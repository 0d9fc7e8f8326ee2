//! The app core: a pure update loop over [`Event`]s.
//!
//! Every mutating flow has the same shape: a guard admits the gesture, a
//! request goes out through the HTTP capability, and the response event
//! either commits server-confirmed state or rolls back to the last
//! confirmed value and raises a notice. Guards are released on every
//! response path, before any branching.

use crate::api;
use crate::capabilities::{Capabilities, HttpError, HttpResult, KvOutput, KvResult};
use crate::event::Event;
use crate::model::{CommentEntry, EntryState, Model, Theme};
use crate::view::ViewModel;
use crate::{
    AppError, CommentId, ErrorKind, PostId, UnixTimeMs, Username, CSRF_HEADER,
    DEFAULT_REQUEST_TIMEOUT, MAX_COMMENT_LENGTH, THEME_STORAGE_KEY,
};

#[derive(Default)]
pub struct App;

impl App {
    /// Mutations are refused locally when the page carried no anti-forgery
    /// token; the server would reject them anyway.
    fn csrf_token(model: &Model) -> Option<String> {
        let token = model.csrf_token.clone();
        if token.is_none() {
            tracing::warn!("csrf token not found; mutation refused");
        }
        token
    }

    fn transport_error(error: &HttpError) -> AppError {
        match error {
            HttpError::Timeout { .. } => AppError::new(ErrorKind::Timeout, "Request timed out"),
            HttpError::Network { message } => AppError::new(ErrorKind::Network, message.clone()),
            other => AppError::new(ErrorKind::Unknown, other.to_string()),
        }
    }

    // --- Request senders ---

    fn send_like_request(post_id: PostId, token: &str, caps: &Capabilities) {
        caps.http()
            .post(&api::like_path(post_id))
            .header(CSRF_HEADER, token)
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .send(move |result| Event::LikeResponse {
                post_id,
                result: Box::new(result),
            });
    }

    fn send_follow_request(username: &Username, token: &str, caps: &Capabilities) {
        let username_for_event = username.clone();
        caps.http()
            .post(&api::follow_path(username))
            .header(CSRF_HEADER, token)
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .send(move |result| Event::FollowResponse {
                username: username_for_event,
                result: Box::new(result),
            });
    }

    fn send_add_comment(post_id: PostId, text: &str, token: &str, caps: &Capabilities) {
        caps.http()
            .post(&api::add_comment_path(post_id))
            .header(CSRF_HEADER, token)
            .json(&api::CommentRequest {
                text: text.to_owned(),
            })
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .send(move |result| Event::AddCommentResponse {
                result: Box::new(result),
            });
    }

    fn send_delete_comment(
        post_id: PostId,
        comment_id: CommentId,
        token: &str,
        caps: &Capabilities,
    ) {
        caps.http()
            .post(&api::delete_comment_path(post_id, comment_id))
            .header(CSRF_HEADER, token)
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .send(move |result| Event::DeleteCommentResponse {
                comment_id,
                result: Box::new(result),
            });
    }

    fn send_edit_comment(
        post_id: PostId,
        comment_id: CommentId,
        text: &str,
        token: &str,
        caps: &Capabilities,
    ) {
        caps.http()
            .post(&api::edit_comment_path(post_id, comment_id))
            .header(CSRF_HEADER, token)
            .json(&api::CommentRequest {
                text: text.to_owned(),
            })
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .send(move |result| Event::EditCommentResponse {
                comment_id,
                result: Box::new(result),
            });
    }

    fn send_reorder_images(
        post_id: PostId,
        order: Vec<crate::ImageId>,
        token: &str,
        caps: &Capabilities,
    ) {
        caps.http()
            .post(&api::reorder_images_path(post_id))
            .header(CSRF_HEADER, token)
            .json(&api::ReorderImagesRequest { order })
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .send(move |result| Event::ReorderImagesResponse {
                result: Box::new(result),
            });
    }

    // --- Response handlers ---

    fn fail_like(model: &mut Model, post_id: PostId, error: AppError) {
        if let Some(like) = model.like_control_mut(post_id) {
            like.rollback();
        }
        tracing::warn!(%post_id, code = error.code(), "like toggle failed");
        model.set_notice(error);
    }

    fn handle_like_response(post_id: PostId, result: &HttpResult, model: &mut Model) {
        match result {
            Ok(resp) if resp.is_success() => match resp.json::<api::LikeToggleResponse>() {
                Ok(body) => {
                    if let Some(like) = model.like_control_mut(post_id) {
                        like.commit(body.liked, body.likes_count);
                    }
                }
                Err(e) => Self::fail_like(
                    model,
                    post_id,
                    AppError::new(ErrorKind::Deserialization, e.to_string()),
                ),
            },
            Ok(resp) => Self::fail_like(
                model,
                post_id,
                AppError::from_http_status(resp.status(), Some(resp.body())),
            ),
            Err(e) => Self::fail_like(model, post_id, Self::transport_error(e)),
        }
    }

    fn fail_follow(model: &mut Model, username: &Username, error: AppError) {
        if let Some(follow) = model.follow_mut(username) {
            follow.rollback();
        }
        tracing::warn!(%username, code = error.code(), "follow toggle failed");
        model.set_notice(error);
    }

    fn handle_follow_response(username: &Username, result: &HttpResult, model: &mut Model) {
        match result {
            Ok(resp) if resp.is_success() => match resp.json::<api::FollowToggleResponse>() {
                Ok(body) => {
                    // The server reports some rejections (e.g. following
                    // yourself) as an error field on a 2xx body.
                    if let Some(message) = body.error {
                        Self::fail_follow(
                            model,
                            username,
                            AppError::new(ErrorKind::Validation, message),
                        );
                    } else if let Some(follow) = model.follow_mut(username) {
                        follow.commit(body.is_following, body.followers_count);
                    }
                }
                Err(e) => Self::fail_follow(
                    model,
                    username,
                    AppError::new(ErrorKind::Deserialization, e.to_string()),
                ),
            },
            Ok(resp) => Self::fail_follow(
                model,
                username,
                AppError::from_http_status(resp.status(), Some(resp.body())),
            ),
            Err(e) => Self::fail_follow(model, username, Self::transport_error(e)),
        }
    }

    fn handle_add_comment_response(result: &HttpResult, model: &mut Model) {
        let Some(detail) = model.detail_mut() else {
            return;
        };
        // Released before branching: no response path may leave the
        // composer stuck disabled.
        detail.thread.composer.guard.release();

        match result {
            Ok(resp) if resp.is_success() => {
                let body = match resp.json::<api::AddCommentResponse>() {
                    Ok(body) => body,
                    Err(e) => {
                        detail.thread.composer.guard.release_and_forget();
                        model.set_notice(AppError::new(ErrorKind::Deserialization, e.to_string()));
                        return;
                    }
                };

                if !body.success {
                    tracing::warn!("add comment reported failure");
                    return;
                }

                let id = body.comment.id;

                // Insert into the rendered set before touching the list;
                // a redelivered response must not produce a second item.
                if !detail.thread.rendered.try_mark(id) {
                    tracing::warn!(comment_id = %id, "duplicate add-comment delivery ignored");
                    detail.thread.composer.text.clear();
                    return;
                }

                // The set already claims the id, but verify the list too.
                if detail.thread.contains(id) {
                    tracing::warn!(comment_id = %id, "comment already present in list");
                    detail.thread.composer.text.clear();
                    return;
                }

                detail.thread.comments.push(CommentEntry {
                    id,
                    author: body.comment.author,
                    author_avatar: body.comment.author_avatar,
                    text: body.comment.text,
                    created_label: "Just now".to_string(),
                    state: EntryState::Display,
                    busy: false,
                });
                detail.thread.comments_count = body.comments_count;
                detail.thread.composer.text.clear();
            }
            Ok(resp) => {
                detail.thread.composer.guard.release_and_forget();
                let error = AppError::from_http_status(resp.status(), Some(resp.body()));
                model.set_notice(error);
            }
            Err(e) => {
                detail.thread.composer.guard.release_and_forget();
                let error = Self::transport_error(e);
                model.set_notice(error);
            }
        }
    }

    fn handle_delete_comment_response(
        comment_id: CommentId,
        result: &HttpResult,
        model: &mut Model,
    ) {
        let Some(detail) = model.detail_mut() else {
            return;
        };
        if let Some(entry) = detail.thread.entry_mut(comment_id) {
            entry.busy = false;
        }

        match result {
            Ok(resp) if resp.is_success() => match resp.json::<api::DeleteCommentResponse>() {
                Ok(body) if body.success => {
                    detail.thread.remove(comment_id);
                    detail.thread.comments_count = body.comments_count;
                }
                Ok(_) => {
                    tracing::warn!(%comment_id, "delete comment reported failure");
                }
                Err(e) => {
                    model.set_notice(AppError::new(ErrorKind::Deserialization, e.to_string()));
                }
            },
            Ok(resp) => {
                let error = AppError::from_http_status(resp.status(), Some(resp.body()));
                model.set_notice(error);
            }
            Err(e) => {
                let error = Self::transport_error(e);
                model.set_notice(error);
            }
        }
    }

    fn handle_edit_comment_response(
        comment_id: CommentId,
        result: &HttpResult,
        model: &mut Model,
    ) {
        let Some(detail) = model.detail_mut() else {
            return;
        };
        if let Some(entry) = detail.thread.entry_mut(comment_id) {
            entry.busy = false;
        }

        match result {
            Ok(resp) if resp.is_success() => match resp.json::<api::EditCommentResponse>() {
                Ok(body) if body.success => {
                    if let Some(entry) = detail.thread.entry_mut(comment_id) {
                        // Server text is authoritative (it trims).
                        entry.apply_saved(body.text);
                    }
                }
                Ok(_) => {
                    tracing::warn!(%comment_id, "edit comment reported failure");
                }
                Err(e) => {
                    model.set_notice(AppError::new(ErrorKind::Deserialization, e.to_string()));
                }
            },
            Ok(resp) => {
                let error = AppError::from_http_status(resp.status(), Some(resp.body()));
                model.set_notice(error);
            }
            Err(e) => {
                let error = Self::transport_error(e);
                model.set_notice(error);
            }
        }
    }

    fn handle_reorder_response(result: &HttpResult, model: &mut Model) {
        let Some(editor) = model.editor_mut() else {
            return;
        };

        match result {
            Ok(resp) if resp.is_success() => {
                editor.commit();
            }
            Ok(resp) => {
                editor.rollback();
                let error = AppError::from_http_status(resp.status(), Some(resp.body()));
                model.set_notice(error);
            }
            Err(e) => {
                editor.rollback();
                let error = Self::transport_error(e);
                model.set_notice(error);
            }
        }
    }

    fn handle_theme_loaded(result: &KvResult, model: &mut Model) {
        match result {
            Ok(KvOutput::Value(Some(stored))) => {
                if let Some(theme) = Theme::from_str(stored) {
                    model.theme = theme;
                } else {
                    tracing::warn!(%stored, "unrecognized stored theme flag");
                }
            }
            Ok(KvOutput::Value(None)) => {
                model.theme = if model.prefers_dark {
                    Theme::Dark
                } else {
                    Theme::Light
                };
            }
            Ok(KvOutput::Done) => {}
            Err(e) => {
                tracing::warn!(error = %e, "failed to load theme flag");
            }
        }
    }
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        tracing::debug!(event = event.name(), "update");

        match event {
            Event::PageLoaded(ctx) => {
                let crate::event::PageContext {
                    csrf_token,
                    prefers_dark,
                    seed,
                } = *ctx;
                model.load_page(csrf_token, prefers_dark, &seed);
                caps.kv().get(THEME_STORAGE_KEY, |result| Event::ThemeLoaded {
                    result: Box::new(result),
                });
                caps.render().render();
            }

            Event::LikeToggled { post_id } => {
                let Some(token) = Self::csrf_token(model) else {
                    return;
                };
                let Some(like) = model.like_control_mut(post_id) else {
                    tracing::warn!(%post_id, "no like control for post");
                    return;
                };
                if !like.begin_toggle() {
                    tracing::debug!(%post_id, "like toggle ignored; request outstanding");
                    return;
                }
                Self::send_like_request(post_id, &token, caps);
                caps.render().render();
            }

            Event::LikeResponse { post_id, result } => {
                Self::handle_like_response(post_id, &result, model);
                caps.render().render();
            }

            Event::FollowToggled { username } => {
                let Some(token) = Self::csrf_token(model) else {
                    return;
                };
                let Some(follow) = model.follow_mut(&username) else {
                    tracing::warn!(%username, "no follow control for user");
                    return;
                };
                if !follow.begin_toggle() {
                    tracing::debug!(%username, "follow toggle ignored; request outstanding");
                    return;
                }
                Self::send_follow_request(&username, &token, caps);
                caps.render().render();
            }

            Event::FollowResponse { username, result } => {
                Self::handle_follow_response(&username, &result, model);
                caps.render().render();
            }

            Event::CommentInputChanged { text } => {
                if let Some(detail) = model.detail_mut() {
                    detail.thread.composer.text = text;
                    caps.render().render();
                }
            }

            Event::CommentSubmitted => {
                let Some(token) = Self::csrf_token(model) else {
                    return;
                };
                let Some(detail) = model.detail_mut() else {
                    return;
                };

                let text = detail.thread.composer.text.trim().to_string();
                if text.is_empty() {
                    return;
                }
                if text.chars().count() > MAX_COMMENT_LENGTH {
                    tracing::warn!("comment exceeds maximum length; refused");
                    return;
                }

                match detail
                    .thread
                    .composer
                    .guard
                    .try_acquire(&text, UnixTimeMs::now())
                {
                    Ok(()) => {
                        let post_id = detail.post_id;
                        Self::send_add_comment(post_id, &text, &token, caps);
                        caps.render().render();
                    }
                    Err(rejection) => {
                        tracing::debug!(?rejection, "comment submit rejected");
                    }
                }
            }

            Event::AddCommentResponse { result } => {
                Self::handle_add_comment_response(&result, model);
                caps.render().render();
            }

            Event::CommentDeleteRequested { comment_id } => {
                let Some(token) = Self::csrf_token(model) else {
                    return;
                };
                let Some(detail) = model.detail_mut() else {
                    return;
                };
                let post_id = detail.post_id;
                let Some(entry) = detail.thread.entry_mut(comment_id) else {
                    return;
                };
                if entry.busy {
                    tracing::debug!(%comment_id, "delete ignored; request outstanding");
                    return;
                }
                entry.busy = true;
                Self::send_delete_comment(post_id, comment_id, &token, caps);
                caps.render().render();
            }

            Event::DeleteCommentResponse { comment_id, result } => {
                Self::handle_delete_comment_response(comment_id, &result, model);
                caps.render().render();
            }

            Event::CommentEditStarted { comment_id } => {
                if let Some(detail) = model.detail_mut() {
                    if let Some(entry) = detail.thread.entry_mut(comment_id) {
                        entry.begin_edit();
                        caps.render().render();
                    }
                }
            }

            Event::CommentEditInputChanged { comment_id, text } => {
                if let Some(detail) = model.detail_mut() {
                    if let Some(entry) = detail.thread.entry_mut(comment_id) {
                        if let EntryState::Editing { draft } = &mut entry.state {
                            *draft = text;
                            caps.render().render();
                        }
                    }
                }
            }

            Event::CommentEditSubmitted { comment_id } => {
                let Some(token) = Self::csrf_token(model) else {
                    return;
                };
                let Some(detail) = model.detail_mut() else {
                    return;
                };
                let post_id = detail.post_id;
                let Some(entry) = detail.thread.entry_mut(comment_id) else {
                    return;
                };

                let EntryState::Editing { draft } = &entry.state else {
                    return;
                };
                let text = draft.trim().to_string();
                if text.is_empty() || entry.busy {
                    return;
                }
                if text.chars().count() > MAX_COMMENT_LENGTH {
                    tracing::warn!("comment edit exceeds maximum length; refused");
                    return;
                }

                entry.busy = true;
                Self::send_edit_comment(post_id, comment_id, &text, &token, caps);
                caps.render().render();
            }

            Event::CommentEditCancelled { comment_id } => {
                if let Some(detail) = model.detail_mut() {
                    if let Some(entry) = detail.thread.entry_mut(comment_id) {
                        entry.cancel_edit();
                        caps.render().render();
                    }
                }
            }

            Event::EditCommentResponse { comment_id, result } => {
                Self::handle_edit_comment_response(comment_id, &result, model);
                caps.render().render();
            }

            Event::CarouselNext => {
                if let Some(detail) = model.detail_mut() {
                    if let Some(carousel) = detail.carousel.as_mut() {
                        carousel.next();
                        caps.render().render();
                    }
                }
            }

            Event::CarouselPrev => {
                if let Some(detail) = model.detail_mut() {
                    if let Some(carousel) = detail.carousel.as_mut() {
                        carousel.prev();
                        caps.render().render();
                    }
                }
            }

            Event::CarouselSelected { index } => {
                if let Some(detail) = model.detail_mut() {
                    if let Some(carousel) = detail.carousel.as_mut() {
                        carousel.select(index);
                        caps.render().render();
                    }
                }
            }

            Event::MenuToggled => {
                if let Some(detail) = model.detail_mut() {
                    detail.menu_open = !detail.menu_open;
                    caps.render().render();
                }
            }

            Event::MenuDismissed => {
                if let Some(detail) = model.detail_mut() {
                    if detail.menu_open {
                        detail.menu_open = false;
                        caps.render().render();
                    }
                }
            }

            Event::ImageMoved { from, to } => {
                if let Some(editor) = model.editor_mut() {
                    editor.move_tile(from, to);
                    caps.render().render();
                }
            }

            Event::ImageDeleteToggled { image_id } => {
                if let Some(editor) = model.editor_mut() {
                    editor.toggle_delete_mark(image_id);
                    caps.render().render();
                }
            }

            Event::ImageOrderCommitted => {
                let Some(token) = Self::csrf_token(model) else {
                    return;
                };
                let Some(editor) = model.editor_mut() else {
                    return;
                };
                if !editor.begin_commit() {
                    tracing::debug!("reorder ignored; request outstanding");
                    return;
                }
                let post_id = editor.post_id;
                let order = editor.order();
                Self::send_reorder_images(post_id, order, &token, caps);
                caps.render().render();
            }

            Event::ReorderImagesResponse { result } => {
                Self::handle_reorder_response(&result, model);
                caps.render().render();
            }

            Event::ThemeToggled => {
                model.theme = model.theme.toggled();
                caps.kv().set(
                    THEME_STORAGE_KEY,
                    model.theme.as_str(),
                    |result| Event::ThemeStored {
                        result: Box::new(result),
                    },
                );
                caps.render().render();
            }

            Event::ThemeLoaded { result } => {
                Self::handle_theme_loaded(&result, model);
                caps.render().render();
            }

            Event::ThemeStored { result } => {
                if let Err(e) = result.as_ref() {
                    // The in-memory theme stays; only persistence failed.
                    tracing::warn!(error = %e, "failed to store theme flag");
                }
            }

            Event::NoticeDismissed => {
                model.clear_notice();
                caps.render().render();
            }
        }
    }

    fn view(&self, model: &Model) -> ViewModel {
        ViewModel::from(model)
    }
}
