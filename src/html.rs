//! HTML fragments for shells that splice into server-rendered markup.
//!
//! Every interpolated value goes through [`escape`]; author names, avatar
//! URLs and comment text are all user-controlled.

use crate::model::CommentEntry;

/// Escape a string for interpolation into HTML text or a double-quoted
/// attribute value.
#[must_use]
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

#[must_use]
pub fn profile_href(author: &str) -> String {
    format!("/profile/{}/", escape(author))
}

fn avatar_fragment(author: &str, avatar_url: Option<&str>) -> String {
    match avatar_url {
        Some(url) => format!(
            r#"<img src="{}" alt="{}" class="w-8 h-8 rounded-full object-cover">"#,
            escape(url),
            escape(author)
        ),
        None => {
            let initial: String = author
                .chars()
                .next()
                .map(|c| c.to_uppercase().collect())
                .unwrap_or_else(|| "?".to_string());
            format!(
                r#"<div class="w-8 h-8 rounded-full bg-gradient-to-br from-primary to-secondary flex items-center justify-center text-white text-xs font-semibold">{}</div>"#,
                escape(&initial)
            )
        }
    }
}

/// One comment list item, addressable via `data-comment-id`.
#[must_use]
pub fn comment_fragment(entry: &CommentEntry) -> String {
    let id = entry.id;
    let author = entry.author.as_str();
    let href = profile_href(author);
    let avatar = avatar_fragment(author, entry.author_avatar.as_deref());

    format!(
        r#"<div class="flex space-x-3 mb-4 comment-item" data-comment-id="{id}">
    <a href="{href}">{avatar}</a>
    <div class="flex-1">
        <p class="comment-text text-gray-800 dark:text-gray-200 text-sm">
            <a href="{href}" class="font-semibold mr-1">{author}</a>
            <span class="comment-text-content">{text}</span>
        </p>
        <div class="flex items-center space-x-3 mt-1">
            <span class="text-gray-400 dark:text-gray-500 text-xs">{label}</span>
            <button class="edit-comment-btn text-gray-400 dark:text-gray-500 hover:text-primary text-xs" data-comment-id="{id}">Edit</button>
            <button class="delete-comment-btn text-gray-400 dark:text-gray-500 hover:text-red-500 text-xs" data-comment-id="{id}">Delete</button>
        </div>
    </div>
</div>"#,
        id = id,
        href = href,
        avatar = avatar,
        author = escape(author),
        text = escape(&entry.text),
        label = escape(&entry.created_label),
    )
}

/// Placeholder shown when the last comment is removed.
#[must_use]
pub fn empty_state_fragment() -> String {
    r#"<p class="text-gray-400 text-sm text-center py-4" id="no-comments">No comments yet</p>"#
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntryState;
    use crate::{CommentId, Username};

    fn entry(author: &str, text: &str) -> CommentEntry {
        CommentEntry {
            id: CommentId::new(42),
            author: Username::new(author),
            author_avatar: None,
            text: text.into(),
            created_label: "Just now".into(),
            state: EntryState::Display,
            busy: false,
        }
    }

    #[test]
    fn escape_covers_html_metacharacters() {
        assert_eq!(
            escape(r#"<a href="x">&'"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#x27;"
        );
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn fragment_is_addressable_and_links_author() {
        let html = comment_fragment(&entry("alice", "hi"));
        assert!(html.contains(r#"data-comment-id="42""#));
        assert!(html.contains(r#"href="/profile/alice/""#));
        assert!(html.contains(r#"<span class="comment-text-content">hi</span>"#));
    }

    #[test]
    fn fragment_escapes_hostile_text() {
        let html = comment_fragment(&entry("alice", "<script>alert(1)</script>"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    }

    #[test]
    fn fragment_escapes_hostile_author() {
        let html = comment_fragment(&entry(r#""><img src=x onerror=alert(1)>"#, "hi"));
        assert!(!html.contains("<img src=x"));
    }

    #[test]
    fn avatar_uses_image_when_present() {
        let mut e = entry("alice", "hi");
        e.author_avatar = Some("https://cdn.example/a.webp".into());
        let html = comment_fragment(&e);
        assert!(html.contains(r#"<img src="https://cdn.example/a.webp""#));
    }

    #[test]
    fn avatar_falls_back_to_uppercase_initial() {
        let html = comment_fragment(&entry("bob", "hi"));
        assert!(html.contains(">B</div>"));
    }
}
