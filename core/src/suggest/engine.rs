//! Command suggestion engine

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use super::index::DocumentTreeIndex;
use super::path::{join_path, parse_path_fragment, shell_quote, PathFragment};
use super::scoring::{MatchQuality, ScoringConfig};
use super::{CommandSuggestion, CommandSuggestionContext, SnippetSource, SuggestionSource};
use crate::{CommandRunner, HostCredential, HostKey};

/// Suggestions returned per request
pub const MAX_SUGGESTIONS: usize = 3;

const INDEX_LIMIT: usize = 8;
/// Fewer cached children than this triggers a live listing
const LIVE_LISTING_THRESHOLD: usize = 3;
const LIVE_LISTING_LIMIT: usize = 10;
const LIVE_LISTING_SCAN_LINES: usize = 500;
const HISTORY_LIMIT: usize = 6;
const SNIPPET_LIMIT: usize = 6;

/// Ranks completions for a partially typed command line
pub struct CommandSuggestionEngine {
    index: DocumentTreeIndex,
    runner: Arc<dyn CommandRunner>,
    snippets: Arc<dyn SnippetSource>,
    scoring: ScoringConfig,
}

impl CommandSuggestionEngine {
    pub fn new(
        index: DocumentTreeIndex,
        runner: Arc<dyn CommandRunner>,
        snippets: Arc<dyn SnippetSource>,
    ) -> Self {
        Self {
            index,
            runner,
            snippets,
            scoring: ScoringConfig::default(),
        }
    }

    pub fn with_scoring(mut self, scoring: ScoringConfig) -> Self {
        self.scoring = scoring;
        self
    }

    pub fn index(&self) -> &DocumentTreeIndex {
        &self.index
    }

    /// Up to [`MAX_SUGGESTIONS`] completions for `input`, best first
    ///
    /// Never fails: every unavailable source just contributes nothing.
    #[instrument(skip(self, context), fields(host = %context.host.key()))]
    pub async fn suggest(
        &self,
        input: &str,
        context: &CommandSuggestionContext,
    ) -> Vec<CommandSuggestion> {
        if input.trim().is_empty() {
            return Vec::new();
        }

        let host_key = context.host.key();
        let mut candidates = Vec::new();

        if let Some(fragment) = parse_path_fragment(input, &context.current_directory) {
            candidates.extend(self.path_candidates(&fragment, context, &host_key).await);
        }
        candidates.extend(self.history_candidates(input, &context.history));
        candidates.extend(self.snippet_candidates(input, &host_key).await);

        let ranked = rank(candidates);
        debug!(count = ranked.len(), "Ranked suggestions");
        ranked
    }

    async fn path_candidates(
        &self,
        fragment: &PathFragment,
        context: &CommandSuggestionContext,
        host_key: &HostKey,
    ) -> Vec<CommandSuggestion> {
        if let Err(e) = self
            .index
            .bootstrap(host_key, &context.current_directory)
            .await
        {
            warn!(error = %e, "Path index unavailable");
        }

        let cached = self
            .index
            .suggest_children(host_key, &fragment.directory, &fragment.prefix, INDEX_LIMIT)
            .await
            .unwrap_or_default();

        let mut out: Vec<CommandSuggestion> = cached
            .iter()
            .map(|child| self.path_suggestion(fragment, child, SuggestionSource::DocumentTree))
            .collect();

        if cached.len() < LIVE_LISTING_THRESHOLD {
            let live = self.live_children(&context.host, host_key, fragment).await;
            out.extend(
                live.iter()
                    .map(|child| self.path_suggestion(fragment, child, SuggestionSource::LiveListing)),
            );
        }

        out
    }

    /// List the fragment's directory over the session and feed every entry
    /// back into the index; returns the entries matching the prefix
    async fn live_children(
        &self,
        host: &HostCredential,
        host_key: &HostKey,
        fragment: &PathFragment,
    ) -> Vec<String> {
        let command = format!(
            "cd {} && ls -1Ap 2>/dev/null | head -n {}",
            shell_quote(&fragment.directory),
            LIVE_LISTING_SCAN_LINES
        );

        let output = match self.runner.execute(host, &command).await {
            Ok(output) => output,
            Err(e) => {
                debug!(directory = %fragment.directory, error = %e, "Live listing failed");
                return Vec::new();
            }
        };

        let mut matches = Vec::new();
        for line in output.lines() {
            let entry = line.trim_end_matches('\r');
            let (name, is_directory) = match entry.strip_suffix('/') {
                Some(name) => (name, true),
                None => (entry, false),
            };
            if name.is_empty() || name == "." || name == ".." || name.contains('/') {
                continue;
            }

            let path = join_path(&fragment.directory, name);
            if let Err(e) = self.index.upsert(host_key, &path, is_directory).await {
                debug!(path = %path, error = %e, "Could not record listed path");
            }

            if name.starts_with(fragment.prefix.as_str()) && matches.len() < LIVE_LISTING_LIMIT {
                matches.push(entry.to_string());
            }
        }

        debug!(directory = %fragment.directory, matches = matches.len(), "Live listing complete");
        matches
    }

    fn path_suggestion(
        &self,
        fragment: &PathFragment,
        child: &str,
        source: SuggestionSource,
    ) -> CommandSuggestion {
        let name = child.trim_end_matches('/');
        let quality = MatchQuality::classify(name, &fragment.prefix);
        self.suggestion(fragment.complete(child), source, quality)
    }

    fn history_candidates(&self, input: &str, history: &[String]) -> Vec<CommandSuggestion> {
        let typed = input.trim_start();
        let mut seen = HashSet::new();

        history
            .iter()
            .rev()
            .filter(|entry| !entry.trim().is_empty() && entry.starts_with(typed))
            .filter(|entry| seen.insert(entry.as_str()))
            .take(HISTORY_LIMIT)
            .map(|entry| {
                let quality = MatchQuality::classify(entry, typed);
                self.suggestion(entry.clone(), SuggestionSource::History, quality)
            })
            .collect()
    }

    async fn snippet_candidates(&self, input: &str, host_key: &HostKey) -> Vec<CommandSuggestion> {
        let typed = input.trim_start();
        let commands = match self.snippets.snippet_commands(host_key).await {
            Ok(commands) => commands,
            Err(e) => {
                debug!(error = %e, "Snippet lookup failed");
                return Vec::new();
            }
        };

        commands
            .into_iter()
            .filter(|command| !command.trim().is_empty() && command.starts_with(typed))
            .take(SNIPPET_LIMIT)
            .map(|command| {
                let quality = MatchQuality::classify(&command, typed);
                self.suggestion(command, SuggestionSource::Snippet, quality)
            })
            .collect()
    }

    fn suggestion(
        &self,
        text: String,
        source: SuggestionSource,
        quality: MatchQuality,
    ) -> CommandSuggestion {
        let score = self.scoring.score(source, quality, &text);
        CommandSuggestion {
            text,
            source,
            score,
        }
    }
}

/// Best first, one entry per text, at most [`MAX_SUGGESTIONS`]
fn rank(mut candidates: Vec<CommandSuggestion>) -> Vec<CommandSuggestion> {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut seen = HashSet::new();
    candidates.retain(|c| seen.insert(c.text.clone()));
    candidates.truncate(MAX_SUGGESTIONS);
    candidates
}
