//! Write-side descriptor rewriter
//!
//! Streams each pom.xml event-by-event and rewrites three things:
//!
//! 1. the module's own `/project/version` (inserted before `</project>`
//!    when the descriptor declares none),
//! 2. the `<version>` of any `<dependency>` or `<parent>` element whose
//!    groupId/artifactId match an artifact in the propagation batch,
//! 3. text nodes carrying a `{name}-${project.version}` placeholder for a
//!    batch artifact, which take that artifact's literal version.
//!
//! `<dependency>`/`<parent>` subtrees are buffered whole so the rewrite
//! does not depend on field order inside them. Everything else passes
//! through byte-for-byte, which is what makes a second propagation run
//! produce identical output.

use crate::artifact::Artifact;
use crate::error::{KilnError, KilnResult};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

type XmlWriter = Writer<Cursor<Vec<u8>>>;

/// Rewrite every descriptor in the batch. A module without a descriptor on
/// disk is skipped; virtual modules are legal.
pub async fn propagate_versions(root: &Path, artifacts: &[Artifact]) -> KilnResult<()> {
    for artifact in artifacts {
        let Some(dir) = artifact.source_dir() else {
            continue;
        };
        let pom_path = root.join(dir).join("pom.xml");
        if !pom_path.exists() {
            debug!("No descriptor for {}, skipping", artifact);
            continue;
        }

        let content = tokio::fs::read_to_string(&pom_path)
            .await
            .map_err(|e| KilnError::io(format!("reading {}", pom_path.display()), e))?;

        let rewritten = rewrite_pom(&content, artifact, artifacts)
            .map_err(|reason| KilnError::descriptor_rewrite(&pom_path, reason))?;

        if rewritten != content {
            debug!("{}: descriptor updated", artifact);
            tokio::fs::write(&pom_path, rewritten)
                .await
                .map_err(|e| KilnError::io(format!("writing {}", pom_path.display()), e))?;
        }
    }
    Ok(())
}

fn write(writer: &mut XmlWriter, event: Event<'_>) -> Result<(), String> {
    writer.write_event(event).map_err(|e| e.to_string())
}

/// Write a text node, substituting version placeholders when one matches
fn write_text(
    writer: &mut XmlWriter,
    text: BytesText<'_>,
    batch: &[Artifact],
) -> Result<(), String> {
    let content = text.unescape().map_err(|e| e.to_string())?;
    match substitute_placeholders(&content, batch) {
        Some(replaced) => write(writer, Event::Text(BytesText::new(&replaced))),
        None => write(writer, Event::Text(text)),
    }
}

/// A text node containing `{name}-${project.version}` for a batch artifact
/// takes that artifact's version for every `${project.version}` occurrence.
/// The first matching artifact in batch order wins.
fn substitute_placeholders(text: &str, batch: &[Artifact]) -> Option<String> {
    for artifact in batch {
        let pattern = format!("{}-${{project.version}}", artifact.id.name);
        if text.contains(&pattern) {
            return Some(text.replace("${project.version}", &artifact.version));
        }
    }
    None
}

/// A buffered `<dependency>` or `<parent>` subtree, collected until its
/// closing tag so groupId/artifactId can be matched regardless of the order
/// the fields appear in.
struct Subtree {
    events: Vec<Event<'static>>,
    depth: usize,
    child: Option<Vec<u8>>,
    group: Option<String>,
    name: Option<String>,
    version_start: Option<usize>,
    version_text: Option<usize>,
    version_empty: Option<usize>,
}

impl Subtree {
    fn begin(start: Event<'static>) -> Self {
        Self {
            events: vec![start],
            depth: 1,
            child: None,
            group: None,
            name: None,
            version_start: None,
            version_text: None,
            version_empty: None,
        }
    }

    /// Feed the next event; true once the closing tag has been consumed
    fn push(&mut self, event: Event<'static>) -> Result<bool, String> {
        match &event {
            Event::Start(e) => {
                if self.depth == 1 {
                    let name = e.name().as_ref().to_vec();
                    if name == b"version" && self.version_start.is_none() {
                        self.version_start = Some(self.events.len());
                    }
                    self.child = Some(name);
                }
                self.depth += 1;
            }
            Event::Empty(e) => {
                if self.depth == 1
                    && e.name().as_ref() == b"version"
                    && self.version_start.is_none()
                    && self.version_empty.is_none()
                {
                    self.version_empty = Some(self.events.len());
                }
            }
            Event::Text(e) => {
                if self.depth == 2 {
                    if let Some(child) = &self.child {
                        let value = e.unescape().map_err(|e| e.to_string())?.to_string();
                        match child.as_slice() {
                            b"groupId" if self.group.is_none() => self.group = Some(value),
                            b"artifactId" if self.name.is_none() => self.name = Some(value),
                            b"version" if self.version_text.is_none() => {
                                self.version_text = Some(self.events.len());
                            }
                            _ => {}
                        }
                    }
                }
            }
            Event::End(_) => {
                self.depth -= 1;
                if self.depth == 1 {
                    self.child = None;
                }
            }
            _ => {}
        }
        self.events.push(event);
        Ok(self.depth == 0)
    }

    /// Emit the buffered subtree, rewriting the version text when the
    /// identity matches a batch artifact and a version element is declared
    fn flush(self, batch: &[Artifact], writer: &mut XmlWriter) -> Result<(), String> {
        let matched = match (&self.group, &self.name) {
            (Some(group), Some(name)) => batch
                .iter()
                .find(|a| a.id.group == *group && a.id.name == *name),
            _ => None,
        };
        let declares_version = self.version_start.is_some() || self.version_empty.is_some();
        let replacement = match matched {
            Some(artifact) if declares_version => Some(artifact.version.clone()),
            _ => None,
        };

        let version_start = self.version_start;
        let version_text = self.version_text;
        let version_empty = self.version_empty;

        for (idx, event) in self.events.into_iter().enumerate() {
            if let Some(version) = &replacement {
                if Some(idx) == version_text {
                    write(writer, Event::Text(BytesText::new(version)))?;
                    continue;
                }
                if Some(idx) == version_empty {
                    write(writer, Event::Start(BytesStart::new("version")))?;
                    write(writer, Event::Text(BytesText::new(version)))?;
                    write(writer, Event::End(BytesEnd::new("version")))?;
                    continue;
                }
            }

            // a <version></version> with no text node gets the value
            // injected right after its opening tag
            let inject_after = replacement.is_some()
                && version_text.is_none()
                && version_empty.is_none()
                && Some(idx) == version_start;

            match event {
                Event::Text(text) => write_text(writer, text, batch)?,
                other => write(writer, other)?,
            }

            if inject_after {
                if let Some(version) = &replacement {
                    write(writer, Event::Text(BytesText::new(version)))?;
                }
            }
        }
        Ok(())
    }
}

/// Single streaming pass over one descriptor
fn rewrite_pom(content: &str, own: &Artifact, batch: &[Artifact]) -> Result<String, String> {
    let mut reader = Reader::from_str(content);
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    let mut buf = Vec::new();

    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut subtree: Option<Subtree> = None;
    let mut in_project_version = false;
    let mut version_written = false;
    let mut saw_project_version = false;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| format!("parse error at byte {}: {}", reader.buffer_position(), e))?;

        if let Some(tree) = subtree.as_mut() {
            if matches!(event, Event::Eof) {
                return Err("unclosed dependency or parent element".to_string());
            }
            if tree.push(event.into_owned())? {
                if let Some(finished) = subtree.take() {
                    finished.flush(batch, &mut writer)?;
                }
            }
            buf.clear();
            continue;
        }

        match event {
            Event::Start(e) => {
                let name = e.name().as_ref().to_vec();
                if name == b"dependency" || name == b"parent" {
                    subtree = Some(Subtree::begin(Event::Start(e.into_owned())));
                } else {
                    if stack.len() == 1 && stack[0] == b"project" && name == b"version" {
                        in_project_version = true;
                        version_written = false;
                        saw_project_version = true;
                    }
                    stack.push(name);
                    write(&mut writer, Event::Start(e))?;
                }
            }
            Event::Empty(e) => {
                if stack.len() == 1 && stack[0] == b"project" && e.name().as_ref() == b"version" {
                    saw_project_version = true;
                    write(&mut writer, Event::Start(BytesStart::new("version")))?;
                    write(&mut writer, Event::Text(BytesText::new(&own.version)))?;
                    write(&mut writer, Event::End(BytesEnd::new("version")))?;
                } else {
                    write(&mut writer, Event::Empty(e))?;
                }
            }
            Event::Text(e) => {
                if in_project_version {
                    write(&mut writer, Event::Text(BytesText::new(&own.version)))?;
                    version_written = true;
                } else {
                    write_text(&mut writer, e, batch)?;
                }
            }
            Event::End(e) => {
                let name = e.name().as_ref().to_vec();
                if in_project_version && name == b"version" {
                    if !version_written {
                        write(&mut writer, Event::Text(BytesText::new(&own.version)))?;
                    }
                    in_project_version = false;
                }
                if name == b"project" && stack.len() == 1 && !saw_project_version {
                    write(&mut writer, Event::Text(BytesText::new("\n  ")))?;
                    write(&mut writer, Event::Start(BytesStart::new("version")))?;
                    write(&mut writer, Event::Text(BytesText::new(&own.version)))?;
                    write(&mut writer, Event::End(BytesEnd::new("version")))?;
                    write(&mut writer, Event::Text(BytesText::new("\n")))?;
                    saw_project_version = true;
                }
                stack.pop();
                write(&mut writer, Event::End(e))?;
            }
            Event::Eof => break,
            other => write(&mut writer, other)?,
        }
        buf.clear();
    }

    String::from_utf8(writer.into_inner().into_inner()).map_err(|e| e.to_string())
}
