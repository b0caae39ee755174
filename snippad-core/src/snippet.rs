//! Snippet records and the bookkeeping operations over a user's collection:
//! save, delete, listing, search, and tag/date filtering.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::account::{AccountService, User};
use crate::sandbox::SourceSet;
use crate::store::StoreError;

/// One saved playground snippet: metadata plus the source triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Comma-joined tag text, as typed. Use [`Snippet::tags`] for the parsed form.
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub markup: String,
    #[serde(default)]
    pub style: String,
    #[serde(default)]
    pub script: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Snippet {
    /// Parsed tags: split on commas, trimmed, de-duplicated, insertion order.
    pub fn tags(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for tag in self.tags.split(',') {
            let tag = tag.trim();
            if !tag.is_empty() && !seen.iter().any(|t| t == tag) {
                seen.push(tag.to_string());
            }
        }
        seen
    }

    /// The timestamp shown and filtered on: last update, falling back to
    /// creation for never-updated records.
    pub fn last_touched(&self) -> DateTime<Utc> {
        self.updated_at.max(self.created_at)
    }

    fn matches_query(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.title.to_lowercase().contains(&query)
            || self.description.to_lowercase().contains(&query)
            || self.tags.to_lowercase().contains(&query)
            || self.markup.to_lowercase().contains(&query)
            || self.style.to_lowercase().contains(&query)
            || self.script.to_lowercase().contains(&query)
    }
}

/// Metadata entered in the save dialog. `id` is set when re-saving an
/// existing snippet.
#[derive(Debug, Clone, Default)]
pub struct SnippetDraft {
    pub id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub tags: String,
}

/// Dashboard date filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFilter {
    All,
    Today,
    PastWeek,
    PastMonth,
}

impl DateFilter {
    fn admits(&self, at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            DateFilter::All => true,
            DateFilter::Today => at.date_naive() == now.date_naive(),
            DateFilter::PastWeek => at >= now - Duration::days(7),
            DateFilter::PastMonth => at >= now - Duration::days(30),
        }
    }
}

/// Snippet operations over a user's collection. Mutations go through
/// [`AccountService::persist`] so the stored user stays current.
#[derive(Clone)]
pub struct SnippetService {
    accounts: AccountService,
}

impl SnippetService {
    pub fn new(accounts: AccountService) -> Self {
        Self { accounts }
    }

    /// Creates or updates a snippet from the draft and the editor's current
    /// sources. An existing id updates in place and keeps `created_at`; a
    /// missing or unknown id creates a new record.
    pub fn save(
        &self,
        user: &mut User,
        draft: SnippetDraft,
        sources: &SourceSet,
    ) -> Result<Snippet, StoreError> {
        let now = Utc::now();
        let title = if draft.title.trim().is_empty() {
            "Untitled Snippet".to_string()
        } else {
            draft.title.trim().to_string()
        };

        let existing = draft
            .id
            .and_then(|id| user.snippets.iter_mut().find(|s| s.id == id));

        let snippet = match existing {
            Some(slot) => {
                slot.title = title;
                slot.description = draft.description;
                slot.tags = draft.tags;
                slot.markup = sources.markup.clone();
                slot.style = sources.style.clone();
                slot.script = sources.script.clone();
                slot.updated_at = now;
                slot.clone()
            }
            None => {
                let snippet = Snippet {
                    id: draft.id.unwrap_or_else(Uuid::new_v4),
                    title,
                    description: draft.description,
                    tags: draft.tags,
                    markup: sources.markup.clone(),
                    style: sources.style.clone(),
                    script: sources.script.clone(),
                    created_at: now,
                    updated_at: now,
                };
                user.snippets.push(snippet.clone());
                snippet
            }
        };

        self.accounts.persist(user)?;
        tracing::debug!(snippet = %snippet.id, user = %user.id, "snippet saved");
        Ok(snippet)
    }

    /// Deletes by id. A missing id is a no-op; returns whether anything was
    /// removed.
    pub fn delete(&self, user: &mut User, id: Uuid) -> Result<bool, StoreError> {
        let before = user.snippets.len();
        user.snippets.retain(|s| s.id != id);
        if user.snippets.len() == before {
            return Ok(false);
        }
        self.accounts.persist(user)?;
        Ok(true)
    }

    /// All snippets, most recently touched first.
    pub fn list<'a>(&self, user: &'a User) -> Vec<&'a Snippet> {
        let mut snippets: Vec<&Snippet> = user.snippets.iter().collect();
        snippets.sort_by_key(|s| std::cmp::Reverse(s.last_touched()));
        snippets
    }

    /// Case-insensitive search over title, description, tags, and sources.
    pub fn search<'a>(&self, user: &'a User, query: &str) -> Vec<&'a Snippet> {
        self.list(user)
            .into_iter()
            .filter(|s| s.matches_query(query))
            .collect()
    }

    pub fn filter_by_tag<'a>(&self, user: &'a User, tag: &str) -> Vec<&'a Snippet> {
        self.list(user)
            .into_iter()
            .filter(|s| s.tags().iter().any(|t| t == tag))
            .collect()
    }

    pub fn filter_by_date<'a>(&self, user: &'a User, filter: DateFilter) -> Vec<&'a Snippet> {
        let now = Utc::now();
        self.list(user)
            .into_iter()
            .filter(|s| filter.admits(s.last_touched(), now))
            .collect()
    }

    /// Every tag in use, unique, in first-seen order.
    pub fn all_tags(&self, user: &User) -> Vec<String> {
        let mut tags = Vec::new();
        for snippet in self.list(user) {
            for tag in snippet.tags() {
                if !tags.contains(&tag) {
                    tags.push(tag);
                }
            }
        }
        tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::NewAccount;
    use crate::session::SessionContext;
    use crate::store::RecordStore;
    use pretty_assertions::assert_eq;

    fn service_and_user() -> (SnippetService, User) {
        let accounts = AccountService::new(RecordStore::in_memory().into_shared());
        let mut session = SessionContext::default();
        let user = accounts
            .register(
                &mut session,
                NewAccount {
                    username: "ada".into(),
                    email: "ada@example.com".into(),
                    password: "hunter22".into(),
                    confirm_password: "hunter22".into(),
                },
            )
            .unwrap();
        (SnippetService::new(accounts), user)
    }

    fn sources(markup: &str) -> SourceSet {
        SourceSet::new(markup, "", "")
    }

    fn draft(title: &str, tags: &str) -> SnippetDraft {
        SnippetDraft {
            id: None,
            title: title.into(),
            description: String::new(),
            tags: tags.into(),
        }
    }

    #[test]
    fn save_creates_then_updates_in_place() {
        let (snippets, mut user) = service_and_user();

        let first = snippets
            .save(&mut user, draft("demo", "a, b"), &sources("<p>1</p>"))
            .unwrap();
        assert_eq!(user.snippets.len(), 1);

        let second = snippets
            .save(
                &mut user,
                SnippetDraft {
                    id: Some(first.id),
                    title: "demo2".into(),
                    ..Default::default()
                },
                &sources("<p>2</p>"),
            )
            .unwrap();

        assert_eq!(user.snippets.len(), 1);
        assert_eq!(second.id, first.id);
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at >= first.updated_at);
        assert_eq!(user.snippets[0].markup, "<p>2</p>");
    }

    #[test]
    fn untitled_fallback_applies() {
        let (snippets, mut user) = service_and_user();
        let saved = snippets
            .save(&mut user, draft("   ", ""), &sources(""))
            .unwrap();
        assert_eq!(saved.title, "Untitled Snippet");
    }

    #[test]
    fn delete_missing_is_noop() {
        let (snippets, mut user) = service_and_user();
        snippets
            .save(&mut user, draft("keep", ""), &sources(""))
            .unwrap();

        assert!(!snippets.delete(&mut user, Uuid::new_v4()).unwrap());
        assert_eq!(user.snippets.len(), 1);

        let id = user.snippets[0].id;
        assert!(snippets.delete(&mut user, id).unwrap());
        assert!(user.snippets.is_empty());
    }

    #[test]
    fn search_covers_sources_and_metadata() {
        let (snippets, mut user) = service_and_user();
        snippets
            .save(&mut user, draft("Blinky", "leds"), &sources("<p>strobe</p>"))
            .unwrap();
        snippets
            .save(&mut user, draft("Other", ""), &sources("<p>dull</p>"))
            .unwrap();

        assert_eq!(snippets.search(&user, "STROBE").len(), 1);
        assert_eq!(snippets.search(&user, "leds").len(), 1);
        assert_eq!(snippets.search(&user, "blinky").len(), 1);
        assert_eq!(snippets.search(&user, "nowhere").len(), 0);
    }

    #[test]
    fn tags_parse_trimmed_and_deduped() {
        let snippet = Snippet {
            id: Uuid::new_v4(),
            title: "t".into(),
            description: String::new(),
            tags: " css,  demo , css,,".into(),
            markup: String::new(),
            style: String::new(),
            script: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(snippet.tags(), vec!["css", "demo"]);
    }

    #[test]
    fn date_filter_windows() {
        let now = Utc::now();
        assert!(DateFilter::Today.admits(now, now));
        assert!(!DateFilter::Today.admits(now - Duration::days(2), now));
        assert!(DateFilter::PastWeek.admits(now - Duration::days(6), now));
        assert!(!DateFilter::PastWeek.admits(now - Duration::days(8), now));
        assert!(DateFilter::PastMonth.admits(now - Duration::days(29), now));
        assert!(!DateFilter::PastMonth.admits(now - Duration::days(31), now));
    }

    #[test]
    fn list_orders_most_recent_first() {
        let (snippets, mut user) = service_and_user();
        snippets
            .save(&mut user, draft("old", ""), &sources(""))
            .unwrap();
        snippets
            .save(&mut user, draft("new", ""), &sources(""))
            .unwrap();
        user.snippets[0].created_at = Utc::now() - Duration::days(3);
        user.snippets[0].updated_at = user.snippets[0].created_at;

        let listed = snippets.list(&user);
        assert_eq!(listed[0].title, "new");
        assert_eq!(listed[1].title, "old");
    }

    #[test]
    fn snippet_json_uses_camel_case_keys() {
        let (snippets, mut user) = service_and_user();
        let saved = snippets
            .save(&mut user, draft("t", ""), &sources(""))
            .unwrap();
        let json = serde_json::to_value(&saved).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
    }
}
