pub(crate) fn shorten_content(content: &str) -> String {
    let max_length = 72;
    if content.chars().count() <= max_length {
        content.to_owned()
    } else {
        content.chars().take(max_length).collect::<String>() + "…"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_content_is_untouched() {
        assert_eq!(shorten_content("/request alice"), "/request alice");
    }

    #[test]
    fn long_content_is_cut_on_char_boundaries() {
        let content = "é".repeat(100);
        let shortened = shorten_content(&content);

        assert_eq!(shortened.chars().count(), 73);
        assert!(shortened.ends_with('…'));
    }
}
