//! Turning model replies into the HTML the tutoring front end renders.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::prompts::EducationLevel;

static BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n").unwrap());
static BETWEEN_TAGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r">\s+<").unwrap());
static HEADER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^(#{1,6})[ \t]*(.*?)$").unwrap());
static BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());
static ITALIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*(\S(?:.*?\S)?)\*").unwrap());
static BULLET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*[-*]\s+(.*)$").unwrap());
static NUMBERED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*\d+\.\s+(.*)$").unwrap());
static CODE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(\w+)?\n(.*?)```").unwrap());
static EXCESS_NEWLINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());
static INLINE_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`]+)`").unwrap());
static DISPLAY_HEADER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(#+)\s").unwrap());
static DISPLAY_BULLET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-*]\s").unwrap());
static MATH_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(Basic|Advanced|O-Level)").unwrap());

/// Labelled sections a reply may open with `Label:`.
const SECTIONS: [(&str, &str, &str); 3] = [
    ("Example", "example", "Example"),
    ("Solution", "solution", "Solution"),
    ("Tip", "tip", "Helpful Tip"),
];

/// Convert markdown-style model output to tutoring HTML.
///
/// Input that already contains `</div>` is treated as HTML and only has its
/// whitespace normalised. Output is always wrapped in `<div class="response">`.
pub fn format_markdown(content: &str) -> String {
    if content.contains("</div>") {
        let collapsed = BLANK_LINES.replace_all(content, "\n");
        let spaced = BETWEEN_TAGS.replace_all(&collapsed, ">\n<");
        return spaced.trim().to_string();
    }

    let mut html = HEADER
        .replace_all(content, |caps: &Captures| {
            let level = caps[1].len();
            format!("<h{level}>{}</h{level}>", &caps[2])
        })
        .into_owned();
    html = BOLD.replace_all(&html, "<strong>$1</strong>").into_owned();
    html = wrap_lists(&html);
    html = ITALIC.replace_all(&html, "<em>$1</em>").into_owned();
    for (label, class, heading) in SECTIONS {
        html = wrap_section(&html, label, class, heading);
    }
    html = CODE_BLOCK
        .replace_all(&html, r#"<pre><code class="language-${1}">${2}</code></pre>"#)
        .into_owned();
    html = wrap_paragraphs(&html);
    html = EXCESS_NEWLINES.replace_all(&html, "\n\n").trim().to_string();

    if html.starts_with(r#"<div class="response">"#) {
        html
    } else {
        format!(r#"<div class="response">{html}</div>"#)
    }
}

/// Group consecutive bullet lines into `<ul>` and numbered lines into `<ol>`.
fn wrap_lists(text: &str) -> String {
    #[derive(PartialEq, Clone, Copy)]
    enum List {
        Bullet,
        Numbered,
    }

    let mut out: Vec<String> = Vec::new();
    let mut open: Option<List> = None;
    let mut in_code = false;

    let close = |open: &mut Option<List>, out: &mut Vec<String>| {
        if let Some(kind) = open.take() {
            if let Some(last) = out.last_mut() {
                last.push_str(if kind == List::Bullet { "</ul>" } else { "</ol>" });
            }
        }
    };

    for line in text.lines() {
        if line.trim_start().starts_with("```") {
            in_code = !in_code;
        }
        let item = if in_code {
            None
        } else if let Some(caps) = BULLET.captures(line) {
            Some((List::Bullet, caps[1].to_string()))
        } else {
            NUMBERED
                .captures(line)
                .map(|caps| (List::Numbered, caps[1].to_string()))
        };

        match item {
            Some((kind, body)) => {
                let mut rendered = String::new();
                if open != Some(kind) {
                    close(&mut open, &mut out);
                    rendered.push_str(if kind == List::Bullet { "<ul>" } else { "<ol>" });
                    open = Some(kind);
                }
                rendered.push_str(&format!("<li>{body}</li>"));
                out.push(rendered);
            }
            None => {
                close(&mut open, &mut out);
                out.push(line.to_string());
            }
        }
    }
    close(&mut open, &mut out);
    out.join("\n")
}

/// Wrap `Label: ...` up to the next blank line (or the end) in a section div.
fn wrap_section(text: &str, label: &str, class: &str, heading: &str) -> String {
    let pattern = format!(r"(?s){}:(.*?)(\n\n|\z)", regex::escape(label));
    let Ok(re) = Regex::new(&pattern) else {
        return text.to_string();
    };
    re.replace_all(text, |caps: &Captures| {
        format!(
            "<div class=\"{class}\">\n<h4>{heading}</h4>\n{}\n</div>{}",
            &caps[1], &caps[2]
        )
    })
    .into_owned()
}

/// Wrap every bare text line in `<p>`, leaving block elements and code alone.
fn wrap_paragraphs(text: &str) -> String {
    const BLOCK_PREFIXES: [&str; 7] = ["<h", "<ol", "<ul", "<li", "<div", "<pre", "</"];
    let mut in_pre = false;

    text.lines()
        .map(|line| {
            let trimmed = line.trim_start();
            if in_pre {
                if line.contains("</pre>") {
                    in_pre = false;
                }
                return line.to_string();
            }
            if trimmed.starts_with("<pre") {
                in_pre = !line.contains("</pre>");
                return line.to_string();
            }
            if trimmed.is_empty() || BLOCK_PREFIXES.iter().any(|p| trimmed.starts_with(p)) {
                line.to_string()
            } else {
                format!("<p>{line}</p>")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Wrap a reply in the standard tutoring layout, then normalise it.
///
/// Sections: thinking, main content, example and solution (only when the
/// reply mentions them and has none of its own), study tips, verification.
pub fn format_tutor_response(content: &str, level: EducationLevel, subject: &str) -> String {
    let level = level.as_str();
    let mut html = String::from(r#"<div class="response">"#);

    html.push_str(&format!(
        r#"
  <div class="thinking">
    <h3>Analyzing the {subject} Question</h3>
    <p>Let's approach this {level} {subject} problem systematically...</p>
  </div>"#
    ));

    let body = if content.contains('<') {
        content.to_string()
    } else {
        content
            .split("\n\n")
            .map(|paragraph| format!("<p>{paragraph}</p>"))
            .collect::<Vec<_>>()
            .join("\n")
    };
    html.push_str(&format!("\n<div class=\"main-content\">{body}</div>"));

    let lower = body.to_lowercase();
    if !body.contains(r#"<div class="example">"#) && lower.contains("example") {
        html.push_str(
            r#"
    <div class="example">
      <h4>Example Application</h4>
      <p>Here's a similar example to practice with...</p>
    </div>"#,
        );
    }
    if !body.contains(r#"<div class="solution">"#) && lower.contains("solution") {
        html.push_str(
            r#"
    <div class="solution">
      <h4>Step-by-Step Solution</h4>
      <ol>
        <li>First, identify the key components...</li>
        <li>Then, apply the relevant concepts...</li>
        <li>Finally, verify your answer...</li>
      </ol>
    </div>"#,
        );
    }

    html.push_str(
        r#"
  <div class="tip">
    <h4>Study Tips</h4>
    <ul>
      <li>Practice similar questions regularly</li>
      <li>Focus on understanding the concepts</li>
      <li>Review your work carefully</li>
    </ul>
  </div>"#,
    );

    html.push_str(&format!(
        r#"
  <div class="verification">
    <h3>Solution Verification</h3>
    <ol>
      <li>{subject} content accuracy checked ✓</li>
      <li>{level} format verified ✓</li>
      <li>Clear explanation provided ✓</li>
      <li>Aligned with MOE requirements ✓</li>
    </ol>
  </div>"#
    ));

    html.push_str("</div>");
    format_markdown(&html)
}

/// Render a reply for display, choosing the worked-answer layout when it has
/// `Calculation:` or `Answer:` lines.
pub fn format_display(content: &str) -> String {
    if content.contains("Calculation:") || content.contains("Answer:") {
        format_math(content)
    } else {
        format_general(content)
    }
}

#[derive(Debug, Default)]
struct MathSections {
    title: String,
    explanation: String,
    calculation: String,
    answer: String,
    note: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum MathSection {
    Calculation,
    Answer,
    Note,
}

/// Worked-answer layout: title, explanation, calculation, answer, note.
pub fn format_math(content: &str) -> String {
    let cleaned = content.replace("```html", "").replace("```", "");
    let mut sections = MathSections::default();
    let mut current: Option<MathSection> = None;

    for line in cleaned.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if MATH_TITLE.is_match(line) {
            sections.title = line.to_string();
        } else if let Some(rest) = line.strip_prefix("Calculation:") {
            current = Some(MathSection::Calculation);
            sections.calculation = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("Answer:") {
            current = Some(MathSection::Answer);
            sections.answer = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("Note:") {
            current = Some(MathSection::Note);
            sections.note = rest.trim().to_string();
        } else if sections.explanation.is_empty() && current.is_none() {
            sections.explanation.push(' ');
            sections.explanation.push_str(line);
        } else if current == Some(MathSection::Note) {
            sections.note.push(' ');
            sections.note.push_str(line);
        }
    }

    let mut html = String::from(r#"<div class="math-response">"#);
    if !sections.title.is_empty() {
        html.push_str(&format!(
            r#"<h2 class="text-lg font-semibold mb-3">{}</h2>"#,
            sections.title
        ));
    }
    if !sections.explanation.is_empty() {
        html.push_str(&format!(
            r#"<p class="mb-4">{}</p>"#,
            sections.explanation.trim()
        ));
    }
    if !sections.calculation.is_empty() {
        html.push_str(&format!(
            r#"
        <div class="calculation-block bg-blue-50 dark:bg-blue-900/20 p-3 rounded-lg mb-4">
          <div class="font-semibold mb-1">Calculation:</div>
          <code class="text-lg">{}</code>
        </div>"#,
            sections.calculation
        ));
    }
    if !sections.answer.is_empty() {
        html.push_str(&format!(
            r#"
        <div class="answer-block bg-green-50 dark:bg-green-900/20 p-3 rounded-lg mb-4">
          <div class="font-semibold mb-1">Answer:</div>
          <code class="text-lg">{}</code>
        </div>"#,
            sections.answer
        ));
    }
    if !sections.note.is_empty() {
        html.push_str(&format!(
            r#"
        <div class="note-block bg-yellow-50 dark:bg-yellow-900/20 p-3 rounded-lg mt-4">
          <div class="font-semibold mb-1">Note:</div>
          <p>{}</p>
        </div>"#,
            sections.note
        ));
    }
    html.push_str("</div>");
    html
}

/// Line-by-line layout for everything that is not a worked answer.
pub fn format_general(content: &str) -> String {
    let body: String = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            if let Some(caps) = DISPLAY_HEADER.captures(line) {
                let level = caps[1].len();
                let text = &line[caps[0].len()..];
                return format!(
                    r#"<h{level} class="font-semibold text-lg mb-3">{text}</h{level}>"#
                );
            }
            if let Some(marker) = DISPLAY_BULLET.find(line) {
                return format!(r#"<li class="ml-4">{}</li>"#, &line[marker.end()..]);
            }
            let line = INLINE_CODE.replace_all(
                line,
                r#"<code class="bg-gray-100 dark:bg-gray-800 px-1 rounded">$1</code>"#,
            );
            format!(r#"<p class="mb-3">{line}</p>"#)
        })
        .collect();

    format!("<div class=\"general-response\">\n      {body}\n    </div>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_and_emphasis() {
        let html = format_markdown("## Summary Writing\nUse **key points** and *your own words*.");
        assert_eq!(
            html,
            "<div class=\"response\"><h2>Summary Writing</h2>\n<p>Use <strong>key points</strong> and <em>your own words</em>.</p></div>"
        );
    }

    #[test]
    fn test_lists_are_grouped_by_kind() {
        let html = format_markdown("Steps:\n1. Read\n2. Plan\n- tip one\n- tip two");
        assert!(html.contains("<ol><li>Read</li>\n<li>Plan</li></ol>"));
        assert!(html.contains("<ul><li>tip one</li>\n<li>tip two</li></ul>"));
        assert!(!html.contains("<ol><ul>"));
    }

    #[test]
    fn test_labelled_sections() {
        let html = format_markdown("Example: The cat sat.\n\nTip: Read twice.");
        assert!(html.contains("<div class=\"example\">\n<h4>Example</h4>\n<p> The cat sat.</p>\n</div>"));
        assert!(html.contains("<div class=\"tip\">\n<h4>Helpful Tip</h4>\n<p> Read twice.</p>\n</div>"));
    }

    #[test]
    fn test_code_block_left_unwrapped() {
        let html = format_markdown("```python\nx = 1\ny = 2\n```");
        assert_eq!(
            html,
            "<div class=\"response\"><pre><code class=\"language-python\">x = 1\ny = 2\n</code></pre></div>"
        );
    }

    #[test]
    fn test_existing_html_only_normalised() {
        let html = format_markdown("  <div class=\"response\">\n\n   <p>Hi</p>   \n</div>  ");
        assert_eq!(html, "<div class=\"response\">\n<p>Hi</p>\n</div>");
    }

    #[test]
    fn test_tutor_response_layout() {
        let html = format_tutor_response(
            "For example, a topic sentence.\n\nKeep it short.",
            EducationLevel::OLevel,
            "English Language",
        );
        assert!(html.starts_with("<div class=\"response\">"));
        assert!(html.contains("<h3>Analyzing the English Language Question</h3>"));
        assert!(html.contains("<div class=\"main-content\"><p>For example, a topic sentence.</p>\n<p>Keep it short.</p></div>"));
        assert!(html.contains("<h4>Example Application</h4>"));
        assert!(!html.contains("Step-by-Step Solution"));
        assert!(html.contains("<li>OLEVEL format verified ✓</li>"));
        assert!(!html.contains("\n\n"));
    }

    #[test]
    fn test_display_math_layout() {
        let html = format_display(
            "O-Level Percentage\nFind 20% of S$50.\nCalculation: 0.2 x 50\nAnswer: S$10\nNote: Convert\npercent first.",
        );
        assert!(html.starts_with("<div class=\"math-response\">"));
        assert!(html.contains(">O-Level Percentage</h2>"));
        assert!(html.contains("<p class=\"mb-4\">Find 20% of S$50.</p>"));
        assert!(html.contains("<code class=\"text-lg\">0.2 x 50</code>"));
        assert!(html.contains("<code class=\"text-lg\">S$10</code>"));
        assert!(html.contains("<p>Convert percent first.</p>"));
    }

    #[test]
    fn test_display_general_layout() {
        let html = format_display("# Tenses\n- past\nUse `was` here.");
        assert!(html.contains("<h1 class=\"font-semibold text-lg mb-3\">Tenses</h1>"));
        assert!(html.contains("<li class=\"ml-4\">past</li>"));
        assert!(html.contains("<code class=\"bg-gray-100 dark:bg-gray-800 px-1 rounded\">was</code>"));
    }

    #[test]
    fn test_display_markers_followed_by_wide_spaces() {
        let html = format_general("-\u{a0}item\n*\u{3000}other\n#\u{a0}Heading");
        assert!(html.contains("<li class=\"ml-4\">item</li>"));
        assert!(html.contains("<li class=\"ml-4\">other</li>"));
        assert!(html.contains(">Heading</h1>"));
    }
}
