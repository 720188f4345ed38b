//! Terminal rendering for the markdown the model answers in.

use pulldown_cmark::{Event, Parser, Tag};

const BOLD: &str = "\x1b[1m";
const BOLD_UNDERLINE: &str = "\x1b[1;4m";
const ITALIC: &str = "\x1b[3m";
const CODE: &str = "\x1b[36m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

/// Render `markdown` for a terminal. With `styled` off the output is plain
/// text (no escape codes), which is what pipes and tests get.
pub fn render(markdown: &str, styled: bool) -> String {
    let mut renderer = Renderer {
        out: String::new(),
        styled,
        lists: Vec::new(),
        in_code_block: false,
        links: Vec::new(),
    };
    for event in Parser::new(markdown) {
        renderer.event(event);
    }
    let mut out = renderer.out.trim_end().to_string();
    out.push('\n');
    out
}

struct Renderer {
    out: String,
    styled: bool,
    /// One entry per open list: the next number for ordered lists.
    lists: Vec<Option<u64>>,
    in_code_block: bool,
    links: Vec<String>,
}

impl Renderer {
    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(Tag::Heading(level, ..)) => {
                self.blank_line();
                let style = if (level as usize) <= 2 { BOLD_UNDERLINE } else { BOLD };
                self.style(style);
            }
            Event::End(Tag::Heading(..)) => {
                self.style(RESET);
                self.out.push('\n');
            }
            Event::Start(Tag::Paragraph) => {
                if self.lists.is_empty() {
                    self.blank_line();
                }
            }
            Event::End(Tag::Paragraph) => self.out.push('\n'),
            Event::Start(Tag::List(start)) => {
                if self.lists.is_empty() {
                    self.blank_line();
                } else {
                    self.newline();
                }
                self.lists.push(start);
            }
            Event::End(Tag::List(_)) => {
                self.lists.pop();
                self.newline();
            }
            Event::Start(Tag::Item) => {
                self.newline();
                let depth = self.lists.len().saturating_sub(1);
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{n}. ");
                        *n += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                self.out.push_str(&"  ".repeat(depth));
                self.out.push_str(&marker);
            }
            Event::End(Tag::Item) => self.newline(),
            Event::Start(Tag::CodeBlock(_)) => {
                self.blank_line();
                self.in_code_block = true;
            }
            Event::End(Tag::CodeBlock(_)) => {
                self.in_code_block = false;
                self.newline();
            }
            Event::Start(Tag::Strong) => self.style(BOLD),
            Event::Start(Tag::Emphasis) => self.style(ITALIC),
            Event::End(Tag::Strong) | Event::End(Tag::Emphasis) => self.style(RESET),
            Event::Start(Tag::Link(_, url, _)) => self.links.push(url.to_string()),
            Event::End(Tag::Link(..)) => {
                if let Some(url) = self.links.pop() {
                    self.out.push_str(&format!(" ({url})"));
                }
            }
            Event::Text(text) => {
                if self.in_code_block {
                    for line in text.split_inclusive('\n') {
                        self.out.push_str("    ");
                        self.styled_text(DIM, line);
                    }
                } else {
                    self.out.push_str(&text);
                }
            }
            Event::Code(code) => {
                if self.styled {
                    self.styled_text(CODE, &code);
                } else {
                    self.out.push('`');
                    self.out.push_str(&code);
                    self.out.push('`');
                }
            }
            Event::Html(html) => self.out.push_str(&html),
            Event::SoftBreak => self.out.push(' '),
            Event::HardBreak => self.out.push('\n'),
            Event::Rule => {
                self.blank_line();
                self.out.push_str("────────────────────────────────\n");
            }
            _ => {}
        }
    }

    fn style(&mut self, code: &str) {
        if self.styled {
            self.out.push_str(code);
        }
    }

    fn styled_text(&mut self, code: &str, text: &str) {
        // Keep the newline outside the escape so resets don't bleed.
        let (body, newline) = match text.strip_suffix('\n') {
            Some(body) => (body, "\n"),
            None => (text, ""),
        };
        self.style(code);
        self.out.push_str(body);
        self.style(RESET);
        self.out.push_str(newline);
    }

    fn newline(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
    }

    fn blank_line(&mut self) {
        if self.out.is_empty() {
            return;
        }
        while !self.out.ends_with("\n\n") {
            self.out.push('\n');
        }
    }
}
