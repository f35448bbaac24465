use crate::core::CommitNode;
use unicode_segmentation::UnicodeSegmentation;

pub const HEAD_LABEL: &str = "HEAD";

/// Text shown on and around a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoration {
    /// Drawn under the node: HEAD marker and tag
    pub label: String,
    /// Shown on hover
    pub hovertext: String,
}

#[derive(Debug, Clone)]
pub struct RefDecorator {
    max_message_graphemes: usize,
}

impl Default for RefDecorator {
    fn default() -> Self {
        Self {
            max_message_graphemes: 60,
        }
    }
}

impl RefDecorator {
    pub fn new(max_message_graphemes: usize) -> Self {
        Self {
            max_message_graphemes,
        }
    }

    pub fn decorate(&self, commit: &CommitNode) -> Decoration {
        let mut label_parts = Vec::with_capacity(2);
        if commit.is_head {
            label_parts.push(HEAD_LABEL);
        }
        if let Some(tag) = &commit.tag {
            label_parts.push(tag.as_str());
        }

        let hovertext = format!(
            "{} {}<br>Branch: {}<br>Tag: {}",
            commit.short_id(),
            self.truncate(&commit.message),
            commit.branch,
            commit.tag.as_deref().unwrap_or("-"),
        );

        Decoration {
            label: label_parts.join(", "),
            hovertext,
        }
    }

    fn truncate(&self, message: &str) -> String {
        let graphemes: Vec<&str> = message.graphemes(true).collect();
        if graphemes.len() <= self.max_message_graphemes {
            return message.to_string();
        }
        let mut short: String = graphemes[..self.max_message_graphemes].concat();
        short.push('…');
        short
    }
}
