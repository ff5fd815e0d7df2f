use serde::{Deserialize, Serialize};

/// User interaction recorded against a retrieved chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
	Click,
	Insert,
	ThumbsUp,
	ThumbsDown,
	Dismiss,
}
impl FeedbackKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Click => "click",
			Self::Insert => "insert",
			Self::ThumbsUp => "thumbs_up",
			Self::ThumbsDown => "thumbs_down",
			Self::Dismiss => "dismiss",
		}
	}

	/// Amount added to a chunk's feedback score.
	pub fn delta(self) -> f32 {
		match self {
			Self::Click => 0.1,
			Self::Insert => 0.5,
			Self::ThumbsUp => 1.0,
			Self::ThumbsDown => -1.0,
			Self::Dismiss => -0.5,
		}
	}
}
