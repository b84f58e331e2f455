use anyhow::{anyhow, bail, Context as AnyhowContext, Result};
use lens_engine::{
    DirectoryFetcher, Engine, EngineConfig, LensSession, LockMode, PanelTab,
};
use lens_page::{Document, ElementId, PageDocument};
use serde::Serialize;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// One line of a replay script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayStep {
    Hover(String),
    Leave(String),
    Key(String),
    Select(String),
    Expand(String),
    Focus(Option<String>),
    Remove(String),
    Disable,
    Enable,
    Message(String),
    Navigate,
    Refresh,
    Search(String),
    Next,
    Previous,
    Click(u32),
    ClearSearch,
    Tab(PanelTab),
    Wait(u64),
}

impl FromStr for ReplayStep {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };
        let arg = |name: &str| -> Result<String> {
            if rest.is_empty() {
                bail!("'{verb}' needs {name}");
            }
            Ok(rest.to_string())
        };

        let step = match verb {
            "hover" => Self::Hover(arg("an element id")?),
            "leave" => Self::Leave(arg("an element id")?),
            "key" => Self::Key(arg("a key")?),
            "select" => Self::Select(arg("a file path")?),
            "expand" => Self::Expand(arg("a directory path")?),
            "focus" => match rest {
                "" | "none" => Self::Focus(None),
                name => Self::Focus(Some(name.to_string())),
            },
            "remove" => Self::Remove(arg("an element id")?),
            "disable" => Self::Disable,
            "enable" => Self::Enable,
            "message" => Self::Message(arg("a JSON message")?),
            "navigate" => Self::Navigate,
            "refresh" => Self::Refresh,
            "search" => Self::Search(arg("a term")?),
            "next" => Self::Next,
            "previous" | "prev" => Self::Previous,
            "click" => Self::Click(
                arg("a line number")?
                    .parse()
                    .with_context(|| format!("invalid line number {rest:?}"))?,
            ),
            "clear-search" => Self::ClearSearch,
            "tab" => Self::Tab(match rest {
                "source" => PanelTab::Source,
                "chat" => PanelTab::Chat,
                other => bail!("unknown tab {other:?}"),
            }),
            "wait" => Self::Wait(
                arg("milliseconds")?
                    .parse()
                    .with_context(|| format!("invalid duration {rest:?}"))?,
            ),
            other => bail!("unknown step {other:?}"),
        };
        Ok(step)
    }
}

/// Parse a script; blank lines and `#` comments are skipped.
pub fn parse_script(script: &str) -> Result<Vec<ReplayStep>> {
    script
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(idx, line)| {
            line.parse()
                .with_context(|| format!("script line {}", idx + 1))
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct HighlightSummary {
    pub hover: Vec<String>,
    pub locked: Vec<String>,
    pub file_match: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DisplayedSummary {
    pub path: String,
    pub focus_line: Option<u32>,
    pub lines: usize,
}

/// Final engine state after a replay.
#[derive(Debug, Clone, Serialize)]
pub struct ReplaySummary {
    pub enabled: bool,
    pub lock: String,
    pub hovered: Option<String>,
    pub files: usize,
    pub rebuild_count: u64,
    pub highlights: HighlightSummary,
    pub displayed: Option<DisplayedSummary>,
    pub panel: lens_engine::PanelStatus,
    pub search_counter: String,
    pub active_tab: PanelTab,
    pub tree: String,
}

pub async fn run(
    doc: PageDocument,
    config: EngineConfig,
    sources: &Path,
    steps: &[ReplayStep],
) -> Result<ReplaySummary> {
    let engine = Engine::new(doc, config)?;
    let session = LensSession::start(engine, Arc::new(DirectoryFetcher::new(sources)));
    session.initialize().await?;

    for step in steps {
        log::debug!("Replay step {step:?}");
        apply(&session, step).await?;
    }

    let engine = session.engine();
    let engine = engine.lock().await;
    Ok(summarize(&engine))
}

async fn element(session: &LensSession<PageDocument>, name: &str) -> Result<ElementId> {
    session
        .engine()
        .lock()
        .await
        .document()
        .element_by_id(name)
        .ok_or_else(|| anyhow!("no element with id {name:?}"))
}

async fn apply(session: &LensSession<PageDocument>, step: &ReplayStep) -> Result<()> {
    let engine = session.engine();
    match step {
        ReplayStep::Hover(name) => {
            let id = element(session, name).await?;
            session.hover(id).await;
        }
        ReplayStep::Leave(name) => {
            let id = element(session, name).await?;
            engine.lock().await.leave(id);
        }
        ReplayStep::Key(key) => {
            engine.lock().await.press_key(key);
        }
        ReplayStep::Select(path) => {
            session.select_file(path).await;
        }
        ReplayStep::Expand(path) => {
            engine.lock().await.toggle_directory(path);
        }
        ReplayStep::Focus(name) => {
            let id = match name {
                Some(name) => Some(element(session, name).await?),
                None => None,
            };
            engine.lock().await.document_mut().focus(id);
        }
        ReplayStep::Remove(name) => {
            let id = element(session, name).await?;
            engine.lock().await.document_mut().detach(id)?;
        }
        ReplayStep::Disable => {
            session
                .handle_message(r#"{"action":"toggle","checked":false}"#)
                .await?;
        }
        ReplayStep::Enable => {
            session
                .handle_message(r#"{"action":"toggle","checked":true}"#)
                .await?;
        }
        ReplayStep::Message(raw) => {
            session.handle_message(raw).await?;
        }
        ReplayStep::Navigate => session.navigated().await?,
        ReplayStep::Refresh => {
            engine.lock().await.refresh();
        }
        ReplayStep::Search(term) => {
            engine.lock().await.set_search_term(term)?;
        }
        ReplayStep::Next => {
            engine.lock().await.search_next();
        }
        ReplayStep::Previous => {
            engine.lock().await.search_previous();
        }
        ReplayStep::Click(line) => engine.lock().await.click_source_line(*line),
        ReplayStep::ClearSearch => engine.lock().await.clear_search(),
        ReplayStep::Tab(tab) => engine.lock().await.set_active_tab(*tab),
        ReplayStep::Wait(ms) => tokio::time::sleep(Duration::from_millis(*ms)).await,
    }
    Ok(())
}

fn element_name(doc: &PageDocument, id: ElementId) -> String {
    doc.attribute(id, "id")
        .map_or_else(|| id.to_string(), str::to_string)
}

fn summarize(engine: &Engine<PageDocument>) -> ReplaySummary {
    let doc = engine.document();
    let ctx = engine.context();
    let classes = &engine.config().classes;
    let names = |class: &str| -> Vec<String> {
        doc.elements_with_class(class)
            .into_iter()
            .map(|id| element_name(doc, id))
            .collect()
    };

    let lock = match &ctx.lock {
        LockMode::Idle => "idle".to_string(),
        LockMode::ElementLocked(id) => format!("element {}", element_name(doc, *id)),
        LockMode::FileLocked(path) => format!("file {path}"),
    };

    ReplaySummary {
        enabled: ctx.enabled,
        lock,
        hovered: ctx.hovered.map(|id| element_name(doc, id)),
        files: ctx.file_tree.file_count(),
        rebuild_count: ctx.rebuild_count,
        highlights: HighlightSummary {
            hover: names(&classes.hover),
            locked: names(&classes.element_lock),
            file_match: names(&classes.file_match),
        },
        displayed: ctx.displayed.as_ref().map(|displayed| DisplayedSummary {
            path: displayed.path.clone(),
            focus_line: displayed.focus_line,
            lines: ctx.search.text().line_count(),
        }),
        panel: engine.panel().status().clone(),
        search_counter: ctx.search.counter(),
        active_tab: ctx.active_tab,
        tree: lens_tree::render_tree(&ctx.file_tree),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_steps_and_skips_comments() {
        let steps = parse_script(
            "# warm up\nhover save\n\nkey l\nselect src/App.tsx\nfocus none\nclick 12\nwait 50\n",
        )
        .unwrap();
        assert_eq!(
            steps,
            vec![
                ReplayStep::Hover("save".to_string()),
                ReplayStep::Key("l".to_string()),
                ReplayStep::Select("src/App.tsx".to_string()),
                ReplayStep::Focus(None),
                ReplayStep::Click(12),
                ReplayStep::Wait(50),
            ]
        );
    }

    #[test]
    fn reports_the_failing_line() {
        let err = parse_script("hover a\nfly away\n").unwrap_err();
        assert_eq!(err.to_string(), "script line 2");
        assert!(format!("{err:#}").contains("unknown step \"fly\""));

        assert!(parse_script("hover").is_err());
        assert!(parse_script("click twelve").is_err());
    }
}
