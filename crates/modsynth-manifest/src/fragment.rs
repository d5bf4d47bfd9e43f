//! Fragment text with capture placeholders.
//!
//! Only three forms are recognized: `{name}` for the generated name,
//! `{N}` for capture `N` (from 1), and `{{` / `}}` for literal braces.
//! Anything else inside braces is rejected when the manifest loads.

use modsynth_kernel::GenerationContext;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FragmentError {
    #[error("unterminated `{{` at byte {offset} in `{text}`")]
    Unterminated { text: String, offset: usize },

    #[error("unmatched `}}` at byte {offset} in `{text}`")]
    UnmatchedClose { text: String, offset: usize },

    #[error("unknown placeholder `{{{placeholder}}}` in `{text}`")]
    UnknownPlaceholder { text: String, placeholder: String },

    #[error("placeholder `{{{index}}}` exceeds the {available} capture(s) of `{pattern}`")]
    CaptureOutOfRange {
        index: usize,
        available: usize,
        pattern: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Text(String),
    Name,
    Capture(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentTemplate {
    pieces: Vec<Piece>,
}

impl FragmentTemplate {
    pub fn parse(text: &str) -> Result<Self, FragmentError> {
        let mut pieces = Vec::new();
        let mut literal = String::new();
        let mut chars = text.char_indices().peekable();

        while let Some((offset, ch)) = chars.next() {
            match ch {
                '{' if chars.peek().is_some_and(|(_, next)| *next == '{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek().is_some_and(|(_, next)| *next == '}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let body_start = offset + 1;
                    let Some(len) = text[body_start..].find('}') else {
                        return Err(FragmentError::Unterminated {
                            text: text.to_string(),
                            offset,
                        });
                    };
                    let placeholder = &text[body_start..body_start + len];
                    let piece = match placeholder {
                        "name" => Piece::Name,
                        digits => match digits.parse::<usize>() {
                            Ok(index) if index > 0 => Piece::Capture(index),
                            _ => {
                                return Err(FragmentError::UnknownPlaceholder {
                                    text: text.to_string(),
                                    placeholder: placeholder.to_string(),
                                });
                            }
                        },
                    };
                    if !literal.is_empty() {
                        pieces.push(Piece::Text(std::mem::take(&mut literal)));
                    }
                    pieces.push(piece);
                    while chars.next_if(|(idx, _)| *idx <= body_start + len).is_some() {}
                }
                '}' => {
                    return Err(FragmentError::UnmatchedClose {
                        text: text.to_string(),
                        offset,
                    });
                }
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            pieces.push(Piece::Text(literal));
        }
        Ok(Self { pieces })
    }

    /// Highest capture index referenced, or 0.
    pub fn max_capture(&self) -> usize {
        self.pieces
            .iter()
            .filter_map(|piece| match piece {
                Piece::Capture(index) => Some(*index),
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }

    pub fn render(&self, ctx: &GenerationContext) -> String {
        let mut out = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Text(text) => out.push_str(text),
                Piece::Name => out.push_str(ctx.name()),
                Piece::Capture(index) => out.push_str(ctx.capture(*index).unwrap_or_default()),
            }
        }
        out
    }
}
