//! Interactive tag collection and the JSON sidecar written next to the media.

use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use mediagrab_core::conversation::DEFAULT_FIELDS;
use mediagrab_core::{CompletedForm, ConversationStepper, MediaKind, StepInput, StepState};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

/// Asks for each field on `prompt` and reads answers from `replies`.
///
/// Returns `None` when the user cancels. End of input skips the remaining
/// fields.
pub(crate) fn collect<R, W>(url: &str, replies: R, mut prompt: W) -> Result<Option<CompletedForm>>
where
    R: BufRead,
    W: Write,
{
    let mut stepper = ConversationStepper::new(DEFAULT_FIELDS);
    let mut state = stepper.advance(StepInput::Url(url.to_string()))?;
    writeln!(
        prompt,
        "Tags for {url} (/skip or - to skip a field, /skipall for the rest, /cancel to abort)"
    )?;

    let mut lines = replies.lines();
    while let StepState::AwaitingField(_) = state {
        let field = stepper.current_field().unwrap_or_default().to_string();
        write!(prompt, "{field}: ")?;
        prompt.flush()?;
        let input = match lines.next() {
            Some(line) => StepInput::from_reply(&line.context("cannot read tag reply")?),
            None => StepInput::SkipAll,
        };
        state = stepper.advance(input)?;
    }

    if state == StepState::Idle {
        info!("tag collection cancelled");
        return Ok(None);
    }
    Ok(Some(stepper.finish_today()?))
}

/// Sidecar path for a media file: `media.mp4` -> `media.mp4.json`.
pub(crate) fn sidecar_path(media_path: &Path) -> PathBuf {
    let mut name = media_path.as_os_str().to_owned();
    name.push(".json");
    PathBuf::from(name)
}

/// The sidecar document written next to a media file.
#[derive(Debug, Serialize)]
pub(crate) struct Sidecar<'a> {
    /// The link the user shared.
    url: &'a str,
    /// Where the media bytes actually came from.
    source: &'a str,
    kind: &'static str,
    tags: Map<String, Value>,
}

impl<'a> Sidecar<'a> {
    pub(crate) fn new(form: &'a CompletedForm, kind: MediaKind, final_url: &'a str) -> Self {
        Self {
            url: &form.url,
            source: final_url,
            kind: match kind {
                MediaKind::Video => "video",
                MediaKind::Image => "image",
            },
            tags: form.tags(),
        }
    }
}

/// Writes the sidecar and returns its path.
pub(crate) fn write_sidecar(
    media_path: &Path,
    form: &CompletedForm,
    kind: MediaKind,
    final_url: &str,
) -> Result<PathBuf> {
    let path = sidecar_path(media_path);
    let body = serde_json::to_string_pretty(&Sidecar::new(form, kind, final_url))?;
    fs::write(&path, body + "\n")
        .with_context(|| format!("cannot write sidecar {}", path.display()))?;
    debug!(path = %path.display(), "sidecar written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_collect_reads_values_and_skips() {
        let replies = Cursor::new("Song\n/skip\n  Album  \n-\n");
        let mut prompts = Vec::new();
        let form = collect("https://pin.it/x", replies, &mut prompts)
            .unwrap()
            .unwrap();

        assert_eq!(form.get("title"), Some("Song"));
        assert_eq!(form.get("artist"), None);
        assert_eq!(form.get("album"), Some("Album"));
        assert_eq!(form.get("comment"), None);
        let shown = String::from_utf8(prompts).unwrap();
        assert!(shown.contains("title: "));
        assert!(shown.contains("comment: "));
    }

    #[test]
    fn test_collect_end_of_input_skips_rest() {
        let form = collect("https://a", Cursor::new("Only title\n"), Vec::new())
            .unwrap()
            .unwrap();
        assert_eq!(form.fields.len(), 1);
        assert!(!form.date.is_empty());
    }

    #[test]
    fn test_collect_cancel_returns_none() {
        let form = collect("https://a", Cursor::new("T\n/cancelar\n"), Vec::new()).unwrap();
        assert!(form.is_none());
    }

    #[test]
    fn test_sidecar_written_next_to_media() {
        let dir = tempfile::tempdir().unwrap();
        let media = dir.path().join("media.mp4");
        let form = collect("https://pin.it/x", Cursor::new("T\n/skipall\n"), Vec::new())
            .unwrap()
            .unwrap();

        let path = write_sidecar(&media, &form, MediaKind::Video, "https://cdn/x.mp4").unwrap();
        assert_eq!(path, dir.path().join("media.mp4.json"));

        let doc: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["url"], "https://pin.it/x");
        assert_eq!(doc["kind"], "video");
        assert_eq!(doc["tags"]["title"], "T");
        assert!(doc["tags"]["date"].is_string());
    }

    #[test]
    fn test_sidecar_serialises_fields_in_order() {
        let form = collect("https://pin.it/y", Cursor::new("/skipall\n"), Vec::new())
            .unwrap()
            .unwrap();
        let sidecar = Sidecar::new(&form, MediaKind::Image, "https://i.pinimg.com/y.jpg");

        let doc = serde_json::to_value(&sidecar).unwrap();
        let keys: Vec<&str> = doc.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, ["url", "source", "kind", "tags"]);
        assert_eq!(doc["source"], "https://i.pinimg.com/y.jpg");
        assert_eq!(doc["kind"], "image");
    }
}
