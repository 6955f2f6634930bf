use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::StreamExt;
use inkling_core::{
    CompletionRequest, CompletionSource, Editor, EditorRuntime, HttpCompletionSource,
    InteractionEvent, InteractionMode, Key, Point, PointerInfo, RequestContext, Settings, Snapshot,
    StreamEvent, UiEvent, VirtualDocument,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::commands::{help_text, parse_command, Command};

// ── Single prediction ───────────────────────────────────────────────────

pub async fn run_predict(settings: &Settings, context: RequestContext, text: &str) -> Result<()> {
    let source = HttpCompletionSource::from_settings(settings)?;
    let tail = inkling_core::context::tail_chars(text, settings.prediction.context_chars);
    let request = CompletionRequest::new(tail, context);

    let mut rx = source.stream(&request).await?;
    while let Some(event) = rx.next().await {
        match event {
            StreamEvent::TextDelta(delta) => {
                print!("{delta}");
                std::io::stdout().flush()?;
            }
            StreamEvent::Done => {
                println!();
                break;
            }
            StreamEvent::Error(e) => anyhow::bail!("prediction failed: {e}"),
        }
    }
    Ok(())
}

// ── Interactive session ─────────────────────────────────────────────────

pub async fn run_session(
    settings: Settings,
    context: RequestContext,
    file: Option<String>,
) -> Result<()> {
    let source = Arc::new(HttpCompletionSource::from_settings(&settings)?);
    let doc = VirtualDocument::new(settings.layout.clone());
    let editor = Editor::new(doc, &settings);

    let (ui_tx, ui_rx) = mpsc::unbounded_channel::<UiEvent>();
    let (snap_tx, mut snap_rx) = mpsc::unbounded_channel::<Snapshot>();
    let runtime = EditorRuntime::new(editor, source, &settings)
        .with_context(context)
        .with_observer(snap_tx);
    let runtime_handle = tokio::spawn(runtime.run(ui_rx));

    if let Some(ref path) = file {
        let text = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
        let _ = ui_tx.send(UiEvent::Load(text));
    }

    eprintln!("inkling session, endpoint {}. :help for commands", settings.endpoint.url);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut latest: Option<Snapshot> = None;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let command = parse_command(&line);
                if command == Command::Quit {
                    break;
                }
                if let Err(e) = dispatch(command, &ui_tx, latest.as_ref()) {
                    eprintln!("{e:#}");
                }
            }
            Some(snapshot) = snap_rx.recv() => {
                if let Some(ref prev) = latest {
                    // Announce a prediction once it has fully arrived.
                    if prev.streaming && !snapshot.streaming && !snapshot.prediction.is_empty() {
                        println!("{}", render_line(&snapshot));
                    }
                }
                latest = Some(snapshot);
            }
        }
    }

    let _ = ui_tx.send(UiEvent::Shutdown);
    let editor = runtime_handle.await?;
    tracing::debug!(chars = editor.serialize().chars().count(), "Session closed");
    Ok(())
}

fn dispatch(
    command: Command,
    ui_tx: &mpsc::UnboundedSender<UiEvent>,
    latest: Option<&Snapshot>,
) -> Result<()> {
    let send = |event: UiEvent| {
        ui_tx
            .send(event)
            .map_err(|_| anyhow::anyhow!("editor task has stopped"))
    };
    let interact = |event: InteractionEvent| send(UiEvent::Interaction(event));
    let point = |offset: usize| -> Result<Point> {
        latest
            .and_then(|s| point_for_offset(s, offset))
            .with_context(|| format!("no prediction char at offset {offset}"))
    };

    match command {
        Command::Type(text) => send(UiEvent::Type(text))?,
        Command::Hover(n) => interact(InteractionEvent::PointerMove(PointerInfo::mouse(point(n)?)))?,
        Command::Click(n) => {
            let p = PointerInfo::mouse(point(n)?);
            interact(InteractionEvent::PointerDown(p))?;
            interact(InteractionEvent::PointerUp(p))?;
        }
        Command::Tap(n) => {
            let p = PointerInfo::touch(point(n)?);
            interact(InteractionEvent::PointerDown(p))?;
            interact(InteractionEvent::PointerUp(p))?;
        }
        Command::Drag(a, b) => {
            let from = PointerInfo::touch(point(a)?);
            let to = PointerInfo::touch(point(b)?);
            interact(InteractionEvent::PointerDown(from))?;
            interact(InteractionEvent::PointerMove(to))?;
            interact(InteractionEvent::PointerUp(to))?;
        }
        Command::Tab => interact(InteractionEvent::Key(Key::Tab))?,
        Command::Right => interact(InteractionEvent::Key(Key::ArrowRight))?,
        Command::Escape => interact(InteractionEvent::Key(Key::Escape))?,
        Command::Select => interact(InteractionEvent::ToggleSelectMode)?,
        Command::Confirm => interact(InteractionEvent::Confirm)?,
        Command::Show => match latest {
            Some(snapshot) => println!("{}", render_line(snapshot)),
            None => println!("(empty)"),
        },
        Command::Load(path) => {
            let text =
                std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
            send(UiEvent::Load(text))?;
        }
        Command::Save(path) => {
            let text = latest.map(|s| s.document.clone()).unwrap_or_default();
            std::fs::write(&path, text).with_context(|| format!("writing {path}"))?;
            eprintln!("saved {path}");
        }
        Command::Help => println!("{}", help_text()),
        Command::Invalid(msg) => eprintln!("{msg}"),
        Command::Quit => {}
    }
    Ok(())
}

/// A point that resolves to prediction offset `offset`: the caret lands
/// after the nearest glyph once the pointer is past its center.
fn point_for_offset(snapshot: &Snapshot, offset: usize) -> Option<Point> {
    match offset {
        0 => snapshot
            .glyph_centers
            .first()
            .map(|c| Point::new(c.x - 1.0, c.y)),
        n => snapshot.glyph_centers.get(n - 1).copied(),
    }
}

/// The document followed by its ghost text: `[pre]`, `{accept}`, plain
/// remainder.
fn render_line(snapshot: &Snapshot) -> String {
    let text = &snapshot.prediction;
    let mut out = snapshot.document.clone();
    if text.is_empty() {
        return out;
    }
    let len = text.chars().count();
    let seg = inkling_core::render::segments(len, snapshot.highlight);
    let slice = |r: std::ops::Range<usize>| inkling_core::segment::char_slice(text, r.start, r.end);

    if !out.is_empty() && !out.ends_with(char::is_whitespace) {
        out.push(' ');
    }
    out.push('\u{2591}');
    if !seg.pre.is_empty() {
        out.push_str(&format!("[{}]", slice(seg.pre)));
    }
    if !seg.accept.is_empty() {
        out.push_str(&format!("{{{}}}", slice(seg.accept)));
    }
    out.push_str(slice(seg.remain));
    if snapshot.mode == InteractionMode::Select {
        let confirm = if snapshot.confirm_enabled { "ready" } else { "pending" };
        out.push_str(&format!("  (select: {confirm})"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(prediction: &str, highlight: Option<(usize, usize)>) -> Snapshot {
        Snapshot {
            document: "The sun ".into(),
            prediction: prediction.into(),
            streaming: false,
            mode: InteractionMode::Normal,
            highlight,
            confirm_enabled: false,
            runs: Vec::new(),
            glyph_centers: (0..prediction.chars().count())
                .map(|i| Point::new(68.0 + 8.0 * i as f64, 9.0))
                .collect(),
        }
    }

    #[test]
    fn test_render_line_marks_segments() {
        let s = snapshot("Golden light poured", Some((7, 12)));
        assert_eq!(render_line(&s), "The sun \u{2591}[Golden ]{light} poured");
    }

    #[test]
    fn test_render_line_separates_unspaced_document() {
        let mut s = snapshot("light", None);
        s.document = "The sun".into();
        assert_eq!(render_line(&s), "The sun \u{2591}light");
    }

    #[test]
    fn test_point_for_offset_uses_previous_glyph() {
        let s = snapshot("Golden", None);
        assert_eq!(point_for_offset(&s, 1), Some(Point::new(68.0, 9.0)));
        assert_eq!(point_for_offset(&s, 0), Some(Point::new(67.0, 9.0)));
        assert_eq!(point_for_offset(&s, 7), None);
    }
}
