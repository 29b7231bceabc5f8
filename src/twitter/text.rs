//! Tweet length calculation.

/// Maximum weighted length of a status
pub const MAX_TWEET_LENGTH: usize = 280;

/// Length every link is counted as, whatever its real length
pub const SHORT_URL_LENGTH: usize = 23;

/// Weighted length of `text`: one per character, links count as
/// [`SHORT_URL_LENGTH`].
pub fn tweet_length(text: &str) -> usize {
    let mut length = 0;
    let mut rest = text;

    while let Some(start) = find_url(rest) {
        length += rest[..start].chars().count();
        let url_len = rest[start..]
            .find(char::is_whitespace)
            .unwrap_or(rest.len() - start);
        length += SHORT_URL_LENGTH;
        rest = &rest[start + url_len..];
    }

    length + rest.chars().count()
}

pub fn is_valid_length(text: &str) -> bool {
    let length = tweet_length(text);
    length > 0 && length <= MAX_TWEET_LENGTH
}

/// Byte offset of the next `http://` or `https://` that starts a word
fn find_url(text: &str) -> Option<usize> {
    text.char_indices()
        .filter(|(i, _)| {
            *i == 0
                || text[..*i]
                    .chars()
                    .next_back()
                    .is_some_and(char::is_whitespace)
        })
        .map(|(i, _)| i)
        .find(|i| {
            let word = &text[*i..];
            word.starts_with("http://") || word.starts_with("https://")
        })
}
