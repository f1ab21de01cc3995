use crate::smoothie::OrderBy;
use crate::views::card::SmoothieCard;
use crate::views::form::{Field, SmoothieForm};
use crate::views::list::{ListState, ListView};

static SPECIAL_CHARACTERS: [char; 19] = [
    '\\', '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.',
    '!',
];

pub fn escape_markdown(str: &str) -> String {
    let mut new_str = String::with_capacity(str.len());
    for c in str.chars() {
        if SPECIAL_CHARACTERS.contains(&c) {
            new_str.push('\\');
        }
        new_str.push(c)
    }
    new_str
}

fn order_bar(current: OrderBy) -> String {
    let labels = OrderBy::ALL
        .iter()
        .map(|key| {
            if *key == current {
                format!("*{}*", escape_markdown(key.label()))
            } else {
                escape_markdown(key.label())
            }
        })
        .collect::<Vec<_>>()
        .join(" \\| ");
    format!(
        "Order by: {}\n{}",
        labels,
        escape_markdown("Change with /order created, /order title or /order rating")
    )
}

/// Longest message Telegram accepts, in UTF-16 code units.
pub const MESSAGE_LIMIT: usize = 4096;

fn message_len(s: &str) -> usize {
    s.encode_utf16().count()
}

/// MarkdownV2 messages for the list page, each within [`MESSAGE_LIMIT`].
pub fn render_list(view: &ListView) -> Vec<String> {
    let mut parts = Vec::new();
    if let Some(notice) = view.notice() {
        parts.push(format!("_{}_", escape_markdown(notice)));
    }
    match view.state() {
        ListState::Idle | ListState::Loading => parts.push(escape_markdown("Loading...")),
        ListState::Errored(message) => parts.push(escape_markdown(message)),
        ListState::Loaded(smoothies) => {
            parts.push(order_bar(view.order_by()));
            if smoothies.is_empty() {
                parts.push(escape_markdown("No smoothies yet, add one with /new"));
            }
            parts.extend(smoothies.iter().map(|s| SmoothieCard::new(s).render()));
        }
    }
    chunk_messages(parts, MESSAGE_LIMIT)
}

/// Packs parts into messages of at most `limit`, breaking between parts.
///
/// A part too long on its own is cut at line breaks where possible.
pub fn chunk_messages(parts: Vec<String>, limit: usize) -> Vec<String> {
    let mut messages = Vec::new();
    let mut current = String::new();
    for part in parts.into_iter().flat_map(|p| split_oversized(p, limit)) {
        if !current.is_empty() && message_len(&current) + 2 + message_len(&part) > limit {
            messages.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push_str("\n\n");
        }
        current.push_str(&part);
    }
    if !current.is_empty() {
        messages.push(current);
    }
    messages
}

fn split_oversized(part: String, limit: usize) -> Vec<String> {
    if message_len(&part) <= limit {
        return vec![part];
    }
    let mut pieces = Vec::new();
    let mut rest = part.as_str();
    while message_len(rest) > limit {
        let mut units = 0;
        let mut end = 0;
        for (i, c) in rest.char_indices() {
            if units + c.len_utf16() > limit {
                break;
            }
            units += c.len_utf16();
            end = i + c.len_utf8();
        }
        let mut cut = rest[..end].rfind('\n').filter(|&i| i > 0).unwrap_or(end);
        // An escape must stay with the character it escapes.
        let trailing = rest[..cut].chars().rev().take_while(|&c| c == '\\').count();
        if trailing % 2 == 1 {
            cut -= 1;
        }
        pieces.push(rest[..cut].to_string());
        rest = &rest[cut..];
        rest = rest.strip_prefix('\n').unwrap_or(rest);
    }
    if !rest.is_empty() {
        pieces.push(rest.to_string());
    }
    pieces
}

/// Plain-text prompt for one step of a form.
pub fn render_prompt(form: &SmoothieForm, field: Field) -> String {
    let what = match field {
        Field::Rating => "rating, a whole number".to_string(),
        other => other.to_string(),
    };
    let current = form.get(field);
    if current.is_empty() {
        format!("Send the {}:", what)
    } else {
        format!("Send the {} (or - to keep \"{}\"):", what, current)
    }
}
