//! Comment list fragment, shared by the game page and the feed socket.

use leptos::prelude::*;

use super::{format_timestamp, render};
use crate::backend::Comment;

/// First letter of the joined username, or `?` when no profile came back.
fn avatar_initial(comment: &Comment) -> String {
    comment
        .profiles
        .as_ref()
        .and_then(|p| p.username.as_deref())
        .and_then(|name| name.chars().next())
        .map_or_else(|| "?".to_owned(), |c| c.to_uppercase().collect())
}

#[component]
pub fn CommentList(comments: Vec<Comment>, error: Option<String>) -> impl IntoView {
    let empty = comments.is_empty() && error.is_none();
    let error = error.map(|msg| view! { <p class="form-error">{msg}</p> });
    let items = comments
        .into_iter()
        .map(|comment| {
            let initial = avatar_initial(&comment);
            let username = comment.username().to_owned();
            let when = format_timestamp(comment.created_at);
            view! {
                <li class="comment" data-comment-id=comment.id.to_string()>
                    <span class="comment__avatar" aria-hidden="true">{initial}</span>
                    <div class="comment__body">
                        <p class="comment__author">{username}</p>
                        <p class="comment__content">{comment.content}</p>
                        <p class="comment__time">{when}</p>
                    </div>
                </li>
            }
        })
        .collect_view();

    view! {
        {error}
        <ul class="comment-list__items">{items}</ul>
        {empty.then(|| view! { <p class="comment-list__empty">"No comments yet. Be the first!"</p> })}
    }
}

/// The list as a standalone HTML fragment.
#[must_use]
pub fn render_comment_list(comments: &[Comment], error: Option<&str>) -> String {
    let comments = comments.to_vec();
    let error = error.map(str::to_owned);
    render(move || view! { <CommentList comments=comments error=error/> })
}

#[cfg(test)]
#[path = "comments_test.rs"]
mod tests;
