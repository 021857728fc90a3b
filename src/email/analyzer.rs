//! Email analysis and mailbox synchronization seams.
//!
//! Both services are traits injected through `AppState`. The default
//! analyzer is a deterministic keyword model; the default mailbox reads
//! JSON drops from a configured directory and consumes them, or reports a
//! configuration error when no directory is set.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailAnalysis {
    pub sentiment: String,
    pub sentiment_score: f64,
    pub key_phrases: Vec<String>,
    pub intent: Option<String>,
}

pub trait EmailAnalyzer: Send + Sync {
    fn analyze(&self, content: &str) -> EmailAnalysis;
}

const POSITIVE_WORDS: &[&str] = &[
    "great", "excellent", "interested", "perfect", "love", "thanks", "thank",
    "excited", "impressed", "yes",
];

const NEGATIVE_WORDS: &[&str] = &[
    "cancel", "refund", "disappointed", "unhappy", "frustrated", "problem",
    "issue", "delay", "no", "unsubscribe",
];

#[derive(Debug, Default)]
pub struct KeywordEmailAnalyzer;

impl EmailAnalyzer for KeywordEmailAnalyzer {
    fn analyze(&self, content: &str) -> EmailAnalysis {
        let lowered = content.to_lowercase();
        let words: Vec<&str> = lowered
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        let mut key_phrases = Vec::new();
        let mut positive = 0i32;
        let mut negative = 0i32;
        for word in &words {
            if POSITIVE_WORDS.contains(word) {
                positive += 1;
                push_unique(&mut key_phrases, word);
            } else if NEGATIVE_WORDS.contains(word) {
                negative += 1;
                push_unique(&mut key_phrases, word);
            }
        }

        let total = positive + negative;
        let sentiment_score = if total == 0 {
            0.0
        } else {
            f64::from(positive - negative) / f64::from(total)
        };
        let sentiment = if sentiment_score > 0.0 {
            "positive"
        } else if sentiment_score < 0.0 {
            "negative"
        } else {
            "neutral"
        };

        EmailAnalysis {
            sentiment: sentiment.to_string(),
            sentiment_score,
            key_phrases,
            intent: detect_intent(&lowered),
        }
    }
}

fn push_unique(phrases: &mut Vec<String>, word: &str) {
    if !phrases.iter().any(|p| p == word) {
        phrases.push(word.to_string());
    }
}

fn detect_intent(lowered: &str) -> Option<String> {
    if ["cancel", "refund", "unsubscribe"]
        .iter()
        .any(|w| lowered.contains(w))
    {
        Some("churn_risk".to_string())
    } else if ["price", "pricing", "quote", "cost"]
        .iter()
        .any(|w| lowered.contains(w))
    {
        Some("pricing_inquiry".to_string())
    } else if ["meeting", "call", "schedule", "demo"]
        .iter()
        .any(|w| lowered.contains(w))
    {
        Some("meeting_request".to_string())
    } else if lowered.contains('?') {
        Some("question".to_string())
    } else {
        None
    }
}

/// A message fetched from the external mailbox, not yet persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingEmail {
    pub sender: String,
    pub subject: String,
    pub content: String,
    pub received_date: DateTime<Utc>,
}

pub trait Mailbox: Send + Sync {
    /// Fetches and consumes new messages for the user. Single attempt, no
    /// retries; errors surface to the caller.
    fn fetch_new(&self, user_id: Uuid) -> Result<Vec<IncomingEmail>>;
}

/// Default mailbox when no drop directory is configured.
#[derive(Debug, Default)]
pub struct UnconfiguredMailbox;

impl Mailbox for UnconfiguredMailbox {
    fn fetch_new(&self, _user_id: Uuid) -> Result<Vec<IncomingEmail>> {
        bail!("mail server is not configured")
    }
}

/// Filesystem mailbox: `<root>/<user_id>/*.json`, one `IncomingEmail` per
/// file. Files are deleted once read so a second sync starts empty.
#[derive(Debug)]
pub struct JsonDropMailbox {
    root: PathBuf,
}

impl JsonDropMailbox {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

impl Mailbox for JsonDropMailbox {
    fn fetch_new(&self, user_id: Uuid) -> Result<Vec<IncomingEmail>> {
        let dir = self.root.join(user_id.to_string());
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut paths: Vec<PathBuf> = fs::read_dir(&dir)
            .with_context(|| format!("reading mail drop {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut fetched = Vec::with_capacity(paths.len());
        for path in &paths {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let email: IncomingEmail = serde_json::from_str(&raw)
                .with_context(|| format!("parsing {}", path.display()))?;
            fetched.push(email);
        }

        // Drops are only consumed once the whole batch has parsed; a bad
        // file leaves every message in place for the next attempt.
        for path in &paths {
            fs::remove_file(path).with_context(|| format!("consuming {}", path.display()))?;
        }

        Ok(fetched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_content_scores_positive() {
        let analysis = KeywordEmailAnalyzer.analyze("Thanks, the demo was great, very excited!");
        assert_eq!(analysis.sentiment, "positive");
        assert!(analysis.sentiment_score > 0.0);
        assert!(analysis.key_phrases.contains(&"great".to_string()));
    }

    #[test]
    fn churn_words_dominate_intent_detection() {
        let analysis =
            KeywordEmailAnalyzer.analyze("I want to cancel my subscription and get a refund.");
        assert_eq!(analysis.sentiment, "negative");
        assert_eq!(analysis.intent.as_deref(), Some("churn_risk"));
    }

    #[test]
    fn neutral_content_is_neutral_with_no_intent() {
        let analysis = KeywordEmailAnalyzer.analyze("See the attached document.");
        assert_eq!(analysis.sentiment, "neutral");
        assert_eq!(analysis.sentiment_score, 0.0);
        assert!(analysis.intent.is_none());
    }

    #[test]
    fn analysis_is_deterministic() {
        let content = "Can we schedule a call to discuss pricing?";
        assert_eq!(
            KeywordEmailAnalyzer.analyze(content),
            KeywordEmailAnalyzer.analyze(content)
        );
    }

    #[test]
    fn unconfigured_mailbox_reports_an_error() {
        let err = UnconfiguredMailbox
            .fetch_new(Uuid::new_v4())
            .expect_err("must fail");
        assert!(err.to_string().contains("not configured"));
    }

    #[test]
    fn json_drop_mailbox_consumes_messages() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let user_id = Uuid::new_v4();
        let user_dir = tmp.path().join(user_id.to_string());
        fs::create_dir_all(&user_dir).expect("mkdir");

        let email = IncomingEmail {
            sender: "ada@acme.com".to_string(),
            subject: "Pricing".to_string(),
            content: "What does the enterprise plan cost?".to_string(),
            received_date: Utc::now(),
        };
        fs::write(
            user_dir.join("0001.json"),
            serde_json::to_string(&email).expect("json"),
        )
        .expect("write");

        let mailbox = JsonDropMailbox::new(tmp.path().to_path_buf());
        let fetched = mailbox.fetch_new(user_id).expect("fetch");
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].subject, "Pricing");

        // Second sync starts from an empty drop.
        assert!(mailbox.fetch_new(user_id).expect("refetch").is_empty());
    }

    #[test]
    fn a_bad_drop_file_leaves_the_whole_batch_in_place() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let user_id = Uuid::new_v4();
        let user_dir = tmp.path().join(user_id.to_string());
        fs::create_dir_all(&user_dir).expect("mkdir");

        let email = IncomingEmail {
            sender: "ada@acme.com".to_string(),
            subject: "Renewal".to_string(),
            content: "Happy to renew.".to_string(),
            received_date: Utc::now(),
        };
        fs::write(
            user_dir.join("0001.json"),
            serde_json::to_string(&email).expect("json"),
        )
        .expect("write");
        fs::write(user_dir.join("0002.json"), "{not json").expect("write");

        let mailbox = JsonDropMailbox::new(tmp.path().to_path_buf());
        assert!(mailbox.fetch_new(user_id).is_err());

        // The failed batch consumed nothing, so the good message is still
        // there once the bad file is cleared.
        assert!(user_dir.join("0001.json").exists());
        fs::remove_file(user_dir.join("0002.json")).expect("rm");
        let fetched = mailbox.fetch_new(user_id).expect("fetch");
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].subject, "Renewal");
    }

    #[test]
    fn json_drop_mailbox_is_empty_for_unknown_user() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mailbox = JsonDropMailbox::new(tmp.path().to_path_buf());
        assert!(mailbox.fetch_new(Uuid::new_v4()).expect("fetch").is_empty());
    }
}
