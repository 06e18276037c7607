use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A post as listed by the feed source, before any filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedItem {
    pub id: String,
    pub title: String,
    pub score: i64,
    pub url: Option<String>,
    pub num_comments: u64,
    pub upvote_ratio: Option<f64>,
}

/// A feed item that passed the known-id and extension filters.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub post_id: String,
    pub title: String,
    pub score: i64,
    pub url: String,
    pub num_comments: u64,
    pub upvote_ratio: f64,
}

impl Candidate {
    /// Builds a candidate from a feed item. Items without a URL yield `None`.
    pub fn from_feed_item(item: FeedItem) -> Option<Self> {
        let url = item.url?;
        Some(Self {
            post_id: item.id,
            title: item.title,
            score: item.score,
            url,
            num_comments: item.num_comments,
            upvote_ratio: item.upvote_ratio.unwrap_or(0.0),
        })
    }

    pub fn retrieved(self, image: Vec<u8>, image_path: Option<PathBuf>) -> Retrieved {
        Retrieved {
            candidate: self,
            image,
            image_path,
        }
    }
}

/// A candidate whose image was downloaded.
#[derive(Debug, Clone)]
pub struct Retrieved {
    pub candidate: Candidate,
    pub image: Vec<u8>,
    pub image_path: Option<PathBuf>,
}

impl Retrieved {
    pub fn post_id(&self) -> &str {
        &self.candidate.post_id
    }

    /// Drops the image bytes and attaches the extracted text.
    pub fn extracted(self, text: String) -> Extracted {
        Extracted {
            candidate: self.candidate,
            image_path: self.image_path,
            text,
        }
    }
}

/// A retrieved candidate with its normalized OCR text.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub candidate: Candidate,
    pub image_path: Option<PathBuf>,
    pub text: String,
}

impl Extracted {
    pub fn post_id(&self) -> &str {
        &self.candidate.post_id
    }
}

/// The document shape written to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub post_id: String,
    pub title: String,
    pub score: i64,
    pub url: String,
    pub num_comments: u64,
    pub upvote_ratio: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    pub text: String,
}

impl From<Extracted> for PostRecord {
    fn from(extracted: Extracted) -> Self {
        let Extracted {
            candidate,
            image_path,
            text,
        } = extracted;
        Self {
            post_id: candidate.post_id,
            title: candidate.title,
            score: candidate.score,
            url: candidate.url,
            num_comments: candidate.num_comments,
            upvote_ratio: candidate.upvote_ratio,
            image_path: image_path.map(|p| p.to_string_lossy().into_owned()),
            text,
        }
    }
}
