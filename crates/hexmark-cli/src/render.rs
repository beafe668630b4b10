use std::ops::Range;

use hexmark_engine::{HighlightTag, TagSpan};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

/// A run of line text sharing the same highlight and caret state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub tag: Option<HighlightTag>,
    pub caret: bool,
}

/// Split a rendered hex line into styled runs.
pub fn segments(text: &str, tags: &[TagSpan], caret: Option<&Range<usize>>) -> Vec<Segment> {
    let mut out: Vec<Segment> = Vec::new();
    for (i, ch) in text.char_indices() {
        let tag = tags
            .iter()
            .find(|t| t.cell_span.contains(&i))
            .map(|t| t.tag);
        let on_caret = caret.is_some_and(|c| c.contains(&i));
        match out.last_mut() {
            Some(last) if last.tag == tag && last.caret == on_caret => last.text.push(ch),
            _ => out.push(Segment {
                text: ch.to_string(),
                tag,
                caret: on_caret,
            }),
        }
    }
    out
}

fn tag_style(tag: HighlightTag) -> Style {
    match tag {
        HighlightTag::ValueCell => Style::default().bg(Color::Yellow).fg(Color::Black),
        HighlightTag::TextCell => Style::default().bg(Color::Cyan).fg(Color::Black),
    }
}

pub fn to_line(segments: Vec<Segment>) -> Line<'static> {
    let spans: Vec<Span<'static>> = segments
        .into_iter()
        .map(|segment| {
            let mut style = segment.tag.map(tag_style).unwrap_or_default();
            if segment.caret {
                style = style.add_modifier(Modifier::REVERSED);
            }
            Span::styled(segment.text, style)
        })
        .collect();
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexmark_engine::highlight::{self, ValueTracker};
    use hexmark_engine::{ByteBuffer, HexView, HighlightOptions, LayoutOptions, MemoryView};
    use pretty_assertions::assert_eq;

    fn markup(segments: &[Segment]) -> String {
        segments
            .iter()
            .map(|s| {
                let mut text = s.text.clone();
                if s.tag.is_some() {
                    text = format!("[{text}]");
                }
                if s.caret {
                    text = format!("<{text}>");
                }
                text
            })
            .collect()
    }

    #[test]
    fn test_segments_mark_tags_and_caret() {
        let view = MemoryView::new(
            ByteBuffer::from_bytes(b"AABA".to_vec()),
            LayoutOptions {
                bytes_per_line: 4,
                ..LayoutOptions::default()
            },
            HighlightOptions::default(),
            1,
        )
        .unwrap();
        let (sender, _requests) = highlight::request_channel();
        let tracker = ValueTracker::new(&view, sender);
        let line = &view.lines()[0];
        let tags: Vec<_> = highlight::get_tags(&tracker, line).collect();
        let caret = line
            .cells(view.caret().column)
            .get_cell(view.caret().offset)
            .map(|cell| cell.cell_span.clone());

        let rendered = markup(&segments(&line.text, &tags, caret.as_ref()));

        insta::assert_snapshot!(rendered, @"00000000  <[41]> [41] 42 [41]  AABA");
    }

    #[test]
    fn test_each_tag_class_gets_its_own_background() {
        let value = tag_style(HighlightTag::ValueCell);
        let text = tag_style(HighlightTag::TextCell);

        assert_eq!(value.bg, Some(Color::Yellow));
        assert_eq!(text.bg, Some(Color::Cyan));
    }

    #[test]
    fn test_plain_text_is_a_single_segment() {
        let result = segments("abc", &[], None);

        assert_eq!(
            result,
            vec![Segment {
                text: "abc".to_string(),
                tag: None,
                caret: false,
            }]
        );
    }
}
