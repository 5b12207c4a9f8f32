use std::fmt::Write;

enum Style {
    Bold,
    Code,
}

impl Style {
    fn delimiter(&self) -> &'static str {
        match self {
            Self::Bold => "**",
            Self::Code => "`",
        }
    }
}

/// Builds the markdown body of a GitHub comment.
#[derive(Default)]
pub struct MessageBuilder {
    markdown: String,
    style_stack: Vec<Style>,
}

impl MessageBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn build(mut self) -> String {
        self.close_styles();
        self.markdown
    }

    pub fn bold(&mut self) {
        self.open(Style::Bold);
    }

    pub fn code(&mut self) {
        self.open(Style::Code);
    }

    fn open(&mut self, style: Style) {
        self.markdown.push_str(style.delimiter());
        self.style_stack.push(style);
    }

    /// Writes `command` as inline code, with its leading slash.
    pub fn command(&mut self, command: &str) {
        self.code();
        write!(self, "/{}", command).unwrap();
        self.close_last();
    }

    /// Starts a new list item. Open styles are closed first, they can't span list items.
    pub fn item(&mut self) {
        self.close_styles();
        self.markdown.push_str("\n- ");
    }

    pub fn close_last(&mut self) {
        if let Some(style) = self.style_stack.pop() {
            self.markdown.push_str(style.delimiter());
        }
    }

    pub fn close_styles(&mut self) {
        while !self.style_stack.is_empty() {
            self.close_last();
        }
    }
}

impl std::fmt::Write for MessageBuilder {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        self.markdown.push_str(s);
        Ok(())
    }
}
